use super::bet::Bet;
use super::round::{Round, MOMENTUM_MAX, MOMENTUM_MIN, MOMENTUM_NEUTRAL};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_momentum() -> i32 {
    MOMENTUM_NEUTRAL
}

fn validate_momentum(momentum: i32) -> Result<(), String> {
    if !(MOMENTUM_MIN..=MOMENTUM_MAX).contains(&momentum) {
        return Err(format!(
            "initial_momentum must be between {} and {}",
            MOMENTUM_MIN, MOMENTUM_MAX
        ));
    }
    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(())
}

/// Body of `POST /admin/reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminResetRequest {
    pub left_avatar_url: String,
    pub right_avatar_url: String,
    #[serde(default = "default_momentum")]
    pub initial_momentum: i32,
    /// Accepted for clients that cannot send an Authorization header
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl AdminResetRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("left_avatar_url", &self.left_avatar_url)?;
        require_non_empty("right_avatar_url", &self.right_avatar_url)?;
        validate_momentum(self.initial_momentum)
    }
}

/// Body of `POST /admin/start_game`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartGameRequest {
    pub left_player_handle: String,
    pub left_player_avatar_url: String,
    #[serde(default)]
    pub left_player_display_name: Option<String>,
    pub right_player_handle: String,
    pub right_player_avatar_url: String,
    #[serde(default)]
    pub right_player_display_name: Option<String>,
    #[serde(default = "default_momentum")]
    pub initial_momentum: i32,
    #[serde(default)]
    pub initial_spell_prompt: Option<String>,
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl StartGameRequest {
    pub fn validate(&self) -> Result<(), String> {
        require_non_empty("left_player_handle", &self.left_player_handle)?;
        require_non_empty("left_player_avatar_url", &self.left_player_avatar_url)?;
        require_non_empty("right_player_handle", &self.right_player_handle)?;
        require_non_empty("right_player_avatar_url", &self.right_player_avatar_url)?;
        validate_momentum(self.initial_momentum)
    }
}

/// Snapshot returned by `GET /state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub round: Round,
    pub recent_bets: Vec<Bet>,
    pub total_bets_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub left_side_bets_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub right_side_bets_amount: Decimal,
}

/// Response of `POST /bet`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetReceipt {
    pub success: bool,
    pub bet: Bet,
    pub impact: f64,
    pub new_momentum: i32,
    pub new_deadline: DateTime<Utc>,
    pub message: String,
}

/// Response of `POST /admin/reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub success: bool,
    pub round: Round,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_defaults_to_neutral_momentum() {
        let req: AdminResetRequest = serde_json::from_value(serde_json::json!({
            "left_avatar_url": "http://example.com/l.png",
            "right_avatar_url": "http://example.com/r.png"
        }))
        .unwrap();
        assert_eq!(req.initial_momentum, 50);
        assert!(req.admin_token.is_none());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_momentum_range() {
        let mut req: AdminResetRequest = serde_json::from_value(serde_json::json!({
            "left_avatar_url": "l",
            "right_avatar_url": "r",
            "initial_momentum": 101
        }))
        .unwrap();
        assert!(req.validate().is_err());
        req.initial_momentum = -1;
        assert!(req.validate().is_err());
        req.initial_momentum = 0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_start_game_requires_handles() {
        let req: StartGameRequest = serde_json::from_value(serde_json::json!({
            "left_player_handle": " ",
            "left_player_avatar_url": "l",
            "right_player_handle": "right",
            "right_player_avatar_url": "r"
        }))
        .unwrap();
        assert!(req.validate().unwrap_err().contains("left_player_handle"));
    }
}
