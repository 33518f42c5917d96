use crate::error::{RepoResult, RepositoryError};
use crate::models::{Bet, BetTotals, NewBet, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

const BET_COLUMNS: &str =
    "id, round_id, side, amount, spell, wallet_address, impact, processed, tx_id, timestamp";

#[derive(Debug, FromRow)]
struct BetRow {
    id: i64,
    round_id: i64,
    side: String,
    amount: Decimal,
    spell: String,
    wallet_address: String,
    impact: f64,
    processed: bool,
    tx_id: Option<String>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<BetRow> for Bet {
    type Error = RepositoryError;

    fn try_from(row: BetRow) -> Result<Self, Self::Error> {
        Ok(Bet {
            id: row.id,
            round_id: row.round_id,
            side: row.side.parse::<Side>().map_err(RepositoryError::InvalidData)?,
            amount: row.amount,
            spell: row.spell,
            wallet_address: row.wallet_address,
            timestamp: row.timestamp,
            processed: row.processed,
            tx_id: row.tx_id,
            impact: row.impact,
        })
    }
}

/// Insert a bet on an open connection (used inside the bet transaction)
pub(crate) async fn insert_bet(conn: &mut PgConnection, bet: &NewBet) -> RepoResult<Bet> {
    let sql = format!(
        r#"
        INSERT INTO bets (round_id, side, amount, spell, wallet_address, impact, processed, tx_id, timestamp)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        BET_COLUMNS
    );

    sqlx::query_as::<_, BetRow>(&sql)
        .bind(bet.round_id)
        .bind(bet.side.as_str())
        .bind(bet.amount)
        .bind(&bet.spell)
        .bind(&bet.wallet_address)
        .bind(bet.impact)
        .bind(bet.processed)
        .bind(&bet.tx_id)
        .bind(bet.timestamp)
        .fetch_one(conn)
        .await?
        .try_into()
}

/// Repository for bet data access
pub struct BetRepository {
    pool: PgPool,
}

impl BetRepository {
    /// Create a new BetRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find bets for a round, newest first
    pub async fn find_by_round(
        &self,
        round_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<Vec<Bet>> {
        // LIMIT NULL means no limit in PostgreSQL
        let sql = format!(
            r#"
            SELECT {}
            FROM bets
            WHERE round_id = $1
            ORDER BY timestamp DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            BET_COLUMNS
        );

        sqlx::query_as::<_, BetRow>(&sql)
            .bind(round_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Bet::try_from)
            .collect()
    }

    /// Count and per-side sums of a round's bets
    pub async fn totals(&self, round_id: i64) -> RepoResult<BetTotals> {
        let (count, left_amount, right_amount): (i64, Decimal, Decimal) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(amount) FILTER (WHERE side = 'left'), 0),
                COALESCE(SUM(amount) FILTER (WHERE side = 'right'), 0)
            FROM bets
            WHERE round_id = $1
            "#,
        )
        .bind(round_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BetTotals {
            count,
            left_amount,
            right_amount,
        })
    }
}
