use crate::error::RepoResult;
use crate::models::{NewPayout, Payout};
use sqlx::PgPool;

const PAYOUT_COLUMNS: &str = "id, round_id, bet_id, wallet_address, amount_microalgos, tx_id, created_at";

/// Repository for payout records
pub struct PayoutRepository {
    pool: PgPool,
}

impl PayoutRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a sent payout. A second payout for the same bet is a duplicate.
    pub async fn create(&self, payout: &NewPayout) -> RepoResult<Payout> {
        let sql = format!(
            r#"
            INSERT INTO payouts (round_id, bet_id, wallet_address, amount_microalgos, tx_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            PAYOUT_COLUMNS
        );

        let row = sqlx::query_as::<_, Payout>(&sql)
            .bind(payout.round_id)
            .bind(payout.bet_id)
            .bind(&payout.wallet_address)
            .bind(payout.amount_microalgos)
            .bind(&payout.tx_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// All payouts of a round
    pub async fn find_by_round(&self, round_id: i64) -> RepoResult<Vec<Payout>> {
        let sql = format!(
            "SELECT {} FROM payouts WHERE round_id = $1 ORDER BY id",
            PAYOUT_COLUMNS
        );
        let rows = sqlx::query_as::<_, Payout>(&sql)
            .bind(round_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
