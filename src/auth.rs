use crate::error::{AppError, AppResult};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use data_encoding::BASE32_NOPAD;
use sha2::{Digest, Sha256, Sha512_256};

/// Length of a textual Algorand address
pub const ALGORAND_ADDRESS_LEN: usize = 58;

const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
/// Validate an Algorand wallet address
///
/// An address is the base32 encoding of a 32 byte public key followed by the
/// last 4 bytes of its SHA-512/256 digest.
///
/// # Returns
/// * `Ok(())` if the address is well formed and the checksum matches
/// * `Err(AppError::Validation)` otherwise
pub fn validate_algorand_address(address: &str) -> AppResult<()> {
    let invalid = |reason: &str| AppError::Validation(format!("Invalid wallet address: {}", reason));

    if address.len() != ALGORAND_ADDRESS_LEN {
        return Err(invalid("expected 58 characters"));
    }

    let bytes = BASE32_NOPAD
        .decode(address.as_bytes())
        .map_err(|_| invalid("not base32"))?;
    if bytes.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(invalid("wrong length"));
    }

    let (public_key, checksum) = bytes.split_at(PUBLIC_KEY_LEN);
    let digest = Sha512_256::digest(public_key);
    if &digest[digest.len() - CHECKSUM_LEN..] != checksum {
        return Err(invalid("checksum mismatch"));
    }

    Ok(())
}

/// Token from an `Authorization: Bearer <token>` header, if present
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    parts.next().map(str::to_string)
}

/// Compare two tokens without leaking the position of the first mismatch
fn tokens_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Authorize an admin request
///
/// The token may arrive as a bearer header or as the `admin_token` body
/// field; the header wins when both are present. Without a configured token
/// every admin request is refused.
///
/// # Arguments
/// * `expected` - Configured admin token
/// * `headers` - Request headers
/// * `body_token` - `admin_token` field of the request body
pub fn authorize_admin(
    expected: Option<&str>,
    headers: &HeaderMap,
    body_token: Option<&str>,
) -> AppResult<()> {
    let Some(expected) = expected else {
        return Err(AppError::Unauthorized(
            "Admin access is not configured".to_string(),
        ));
    };

    let provided = bearer_token(headers).or_else(|| body_token.map(|t| t.trim().to_string()));

    match provided {
        Some(token) if tokens_match(&token, expected) => Ok(()),
        Some(_) => Err(AppError::Unauthorized("Invalid admin token".to_string())),
        None => Err(AppError::Unauthorized("Admin token required".to_string())),
    }
}
