use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Number of microAlgos in one ALGO
pub const MICROALGOS_PER_ALGO: i64 = 1_000_000;

/// A winnings transfer made for one winning bet
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payout {
    pub id: i64,
    pub round_id: i64,
    pub bet_id: i64,
    pub wallet_address: String,
    pub amount_microalgos: i64,
    pub tx_id: String,
    pub created_at: DateTime<Utc>,
}

/// Values for recording a sent payout
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub round_id: i64,
    pub bet_id: i64,
    pub wallet_address: String,
    pub amount_microalgos: i64,
    pub tx_id: String,
}
