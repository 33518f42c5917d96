use crate::auth::validate_algorand_address;
use crate::config::AlgorandConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use data_encoding::BASE32_NOPAD;
use rand::Rng;
use sha2::{Digest, Sha512_256};
use tracing::{info, warn};

/// Words in an Algorand account mnemonic
const MNEMONIC_WORDS: usize = 25;

/// Verifies incoming bet payments and sends winnings from the hot wallet
#[async_trait]
pub trait PayoutClient: Send + Sync {
    /// Check that `tx_id` is a confirmed payment of `amount_algos` from `sender`
    async fn verify_bet_transaction(
        &self,
        tx_id: &str,
        sender: &str,
        amount_algos: f64,
    ) -> AppResult<bool>;

    /// Send `amount_microalgos` to `receiver`; returns the transaction id
    async fn submit_payout(
        &self,
        receiver: &str,
        amount_microalgos: i64,
        note: &str,
    ) -> AppResult<String>;
}

/// Client that validates transfers but never touches the network.
///
/// Transaction ids are shaped like real ones (52 base32 characters).
pub struct SimulatedAlgorandClient {
    algod_node: String,
    token_configured: bool,
}

impl SimulatedAlgorandClient {
    /// Build the client; the hot wallet mnemonic must be 25 words
    pub fn new(config: &AlgorandConfig) -> AppResult<Self> {
        let mnemonic = config
            .hot_wallet_mnemonic
            .as_deref()
            .ok_or_else(|| AppError::Config("HOT_WALLET_MNEMONIC is not configured".to_string()))?;

        if mnemonic.split_whitespace().count() != MNEMONIC_WORDS {
            return Err(AppError::Config(format!(
                "HOT_WALLET_MNEMONIC must contain {} words",
                MNEMONIC_WORDS
            )));
        }

        let token_configured = !config.algod_token.is_empty();
        if !token_configured {
            warn!(node = %config.algod_node, "ALGOD_TOKEN is empty, node requests would be unauthenticated");
        }
        info!(node = %config.algod_node, token_configured, "simulated Algorand client ready");

        Ok(Self {
            algod_node: config.algod_node.clone(),
            token_configured,
        })
    }

    fn transaction_id(receiver: &str, amount_microalgos: i64, note: &str) -> String {
        let nonce: u64 = rand::thread_rng().gen();
        let mut hasher = Sha512_256::new();
        hasher.update(receiver.as_bytes());
        hasher.update(amount_microalgos.to_be_bytes());
        hasher.update(note.as_bytes());
        hasher.update(nonce.to_be_bytes());
        BASE32_NOPAD.encode(&hasher.finalize())
    }
}

#[async_trait]
impl PayoutClient for SimulatedAlgorandClient {
    async fn verify_bet_transaction(
        &self,
        tx_id: &str,
        sender: &str,
        amount_algos: f64,
    ) -> AppResult<bool> {
        if tx_id.trim().is_empty() || amount_algos <= 0.0 {
            warn!(tx_id, sender, amount_algos, "rejecting bet transaction with invalid parameters");
            return Ok(false);
        }
        if validate_algorand_address(sender).is_err() {
            warn!(tx_id, sender, "rejecting bet transaction from invalid sender");
            return Ok(false);
        }

        info!(
            tx_id,
            sender,
            amount_algos,
            node = %self.algod_node,
            token_configured = self.token_configured,
            "bet transaction verified (simulated)"
        );
        Ok(true)
    }

    async fn submit_payout(
        &self,
        receiver: &str,
        amount_microalgos: i64,
        note: &str,
    ) -> AppResult<String> {
        validate_algorand_address(receiver)?;
        if amount_microalgos <= 0 {
            return Err(AppError::Validation(format!(
                "Payout amount must be positive, got {}",
                amount_microalgos
            )));
        }

        let tx_id = Self::transaction_id(receiver, amount_microalgos, note);
        info!(receiver, amount_microalgos, tx_id = %tx_id, "payout submitted (simulated)");
        Ok(tx_id)
    }
}
