use super::round::Side;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum number of words a spell may contain
pub const MAX_SPELL_WORDS: usize = 10;

/// Decimal places kept for ALGO amounts (one microAlgo)
pub const MAX_AMOUNT_SCALE: u32 = 6;

/// Largest amount a `NUMERIC(20, 6)` column holds: 99,999,999,999,999.999999
pub const MAX_BET_AMOUNT: Decimal =
    Decimal::from_parts(1_661_992_959, 1_808_227_885, 5, false, MAX_AMOUNT_SCALE);

/// A bet placed on a round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: i64,
    pub round_id: i64,
    pub side: Side,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub spell: String,
    pub wallet_address: String,
    pub timestamp: DateTime<Utc>,
    pub processed: bool,
    pub tx_id: Option<String>,
    /// Momentum impact computed when the bet was accepted
    pub impact: f64,
}

/// Incoming bet as submitted by a player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub round_id: i64,
    pub side: Side,
    pub amount: Decimal,
    pub spell: String,
    pub wallet_address: String,
    /// Payment transaction the player sent to the treasury, if any
    #[serde(default)]
    pub tx_id: Option<String>,
}

impl BetRequest {
    /// Number of whitespace separated words in the spell
    pub fn spell_word_count(&self) -> usize {
        self.spell.split_whitespace().count()
    }

    /// Field-level validation; wallet checks live in `auth`
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err("Bet amount must be greater than zero".to_string());
        }
        if self.amount > MAX_BET_AMOUNT {
            return Err(format!("Bet amount must not exceed {}", MAX_BET_AMOUNT));
        }
        if self.amount.normalize().scale() > MAX_AMOUNT_SCALE {
            return Err(format!(
                "Bet amount supports at most {} decimal places",
                MAX_AMOUNT_SCALE
            ));
        }
        if self.spell_word_count() > MAX_SPELL_WORDS {
            return Err(format!("Spell must be {} words or less", MAX_SPELL_WORDS));
        }
        if self.wallet_address.trim().is_empty() {
            return Err("Wallet address is required".to_string());
        }
        if matches!(&self.tx_id, Some(tx) if tx.trim().is_empty()) {
            return Err("Transaction id must not be blank".to_string());
        }
        Ok(())
    }
}

/// Values for inserting a new bet
#[derive(Debug, Clone)]
pub struct NewBet {
    pub round_id: i64,
    pub side: Side,
    pub amount: Decimal,
    pub spell: String,
    pub wallet_address: String,
    pub impact: f64,
    pub processed: bool,
    pub tx_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Change a bet applies to its round
#[derive(Debug, Clone, Copy)]
pub struct BetEffect {
    /// Signed momentum change; negative moves toward the left side
    pub momentum_delta: i32,
    pub deadline_extension: chrono::Duration,
    /// Bets are refused when the round deadline is not after this instant
    pub placed_at: DateTime<Utc>,
}

/// Aggregates over all bets of a round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BetTotals {
    pub count: i64,
    pub left_amount: Decimal,
    pub right_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(amount: Decimal, spell: &str) -> BetRequest {
        BetRequest {
            round_id: 1,
            side: Side::Left,
            amount,
            spell: spell.to_string(),
            wallet_address: "WALLET".to_string(),
            tx_id: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request(Decimal::new(5, 1), "fireball to the face").validate().is_ok());
    }

    #[test]
    fn test_amount_must_be_positive() {
        let err = request(Decimal::ZERO, "spell").validate().unwrap_err();
        assert!(err.contains("greater than zero"));
        assert!(request(Decimal::new(-1, 0), "spell").validate().is_err());
    }

    #[test]
    fn test_amount_upper_bound() {
        assert_eq!(MAX_BET_AMOUNT, Decimal::from_str("99999999999999.999999").unwrap());
        assert!(request(MAX_BET_AMOUNT, "spell").validate().is_ok());

        let err = request(Decimal::from_str("100000000000000").unwrap(), "spell")
            .validate()
            .unwrap_err();
        assert!(err.contains("must not exceed"));
        assert!(request(Decimal::from_str("40000000000000000000000000000").unwrap(), "spell")
            .validate()
            .is_err());
    }

    #[test]
    fn test_amount_precision() {
        assert!(request(Decimal::from_str("0.000001").unwrap(), "spell").validate().is_ok());
        assert!(request(Decimal::from_str("1.500000000").unwrap(), "spell").validate().is_ok());

        let err = request(Decimal::from_str("0.0000001").unwrap(), "spell")
            .validate()
            .unwrap_err();
        assert!(err.contains("6 decimal places"));
    }

    #[test]
    fn test_spell_word_limit() {
        assert!(request(Decimal::ONE, "1 2 3 4 5 6 7 8 9 10").validate().is_ok());
        let err = request(Decimal::ONE, "1 2 3 4 5 6 7 8 9 10 11").validate().unwrap_err();
        assert!(err.contains("10 words"));
    }

    #[test]
    fn test_word_count_ignores_extra_whitespace() {
        assert_eq!(request(Decimal::ONE, "  two   words ").spell_word_count(), 2);
        assert_eq!(request(Decimal::ONE, "").spell_word_count(), 0);
    }

    #[test]
    fn test_amount_accepts_json_number() {
        let parsed: BetRequest = serde_json::from_value(serde_json::json!({
            "round_id": 7,
            "side": "right",
            "amount": 2.5,
            "spell": "go",
            "wallet_address": "W"
        }))
        .unwrap();
        assert_eq!(parsed.amount, Decimal::new(25, 1));
        assert_eq!(parsed.side, Side::Right);
        assert!(parsed.tx_id.is_none());
    }
}
