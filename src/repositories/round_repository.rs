use crate::error::{RepoResult, RepositoryError};
use crate::models::{NewRound, Round, TwitterUser, Winner};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};

pub(crate) const ROUND_COLUMNS: &str = r#"
    id, left_handle, left_avatar_url, left_display_name,
    right_handle, right_avatar_url, right_display_name,
    momentum, pot_amount, start_time, current_deadline, max_deadline,
    active, winner, end_reason, ended_at, battle_image_url, paid
"#;

/// Flat `rounds` row
#[derive(Debug, FromRow)]
pub(crate) struct RoundRow {
    id: i64,
    left_handle: String,
    left_avatar_url: String,
    left_display_name: Option<String>,
    right_handle: String,
    right_avatar_url: String,
    right_display_name: Option<String>,
    momentum: i32,
    pot_amount: Decimal,
    start_time: DateTime<Utc>,
    current_deadline: DateTime<Utc>,
    max_deadline: DateTime<Utc>,
    active: bool,
    winner: Option<String>,
    end_reason: Option<String>,
    ended_at: Option<DateTime<Utc>>,
    battle_image_url: Option<String>,
    paid: bool,
}

impl TryFrom<RoundRow> for Round {
    type Error = RepositoryError;

    fn try_from(row: RoundRow) -> Result<Self, Self::Error> {
        let winner = row
            .winner
            .as_deref()
            .map(str::parse::<Winner>)
            .transpose()
            .map_err(RepositoryError::InvalidData)?;

        Ok(Round {
            id: row.id,
            left_user: TwitterUser::new(row.left_handle, row.left_avatar_url, row.left_display_name),
            right_user: TwitterUser::new(row.right_handle, row.right_avatar_url, row.right_display_name),
            momentum: row.momentum,
            pot_amount: row.pot_amount,
            start_time: row.start_time,
            current_deadline: row.current_deadline,
            max_deadline: row.max_deadline,
            active: row.active,
            winner,
            battle_image_url: row.battle_image_url,
            end_reason: row.end_reason,
            ended_at: row.ended_at,
            paid: row.paid,
        })
    }
}

fn into_rounds(rows: Vec<RoundRow>) -> RepoResult<Vec<Round>> {
    rows.into_iter().map(Round::try_from).collect()
}

/// Lock a round row for the rest of the transaction
pub(crate) async fn lock_round(conn: &mut PgConnection, round_id: i64) -> RepoResult<Option<Round>> {
    let sql = format!("SELECT {} FROM rounds WHERE id = $1 FOR UPDATE", ROUND_COLUMNS);
    sqlx::query_as::<_, RoundRow>(&sql)
        .bind(round_id)
        .fetch_optional(conn)
        .await?
        .map(Round::try_from)
        .transpose()
}

/// Write momentum, pot and deadline of a locked round
pub(crate) async fn update_round_progress(conn: &mut PgConnection, round: &Round) -> RepoResult<()> {
    sqlx::query(
        r#"
        UPDATE rounds
        SET momentum = $2, pot_amount = $3, current_deadline = $4
        WHERE id = $1
        "#,
    )
    .bind(round.id)
    .bind(round.momentum)
    .bind(round.pot_amount)
    .bind(round.current_deadline)
    .execute(conn)
    .await?;
    Ok(())
}

/// Repository for round data access
pub struct RoundRepository {
    pool: PgPool,
}

impl RoundRepository {
    /// Create a new RoundRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new active round
    pub async fn create(&self, round: &NewRound) -> RepoResult<Round> {
        let sql = format!(
            r#"
            INSERT INTO rounds (
                left_handle, left_avatar_url, left_display_name,
                right_handle, right_avatar_url, right_display_name,
                momentum, pot_amount, start_time, current_deadline, max_deadline, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, $10, TRUE)
            RETURNING {}
            "#,
            ROUND_COLUMNS
        );

        let row = sqlx::query_as::<_, RoundRow>(&sql)
            .bind(&round.left_user.handle)
            .bind(&round.left_user.avatar_url)
            .bind(&round.left_user.display_name)
            .bind(&round.right_user.handle)
            .bind(&round.right_user.avatar_url)
            .bind(&round.right_user.display_name)
            .bind(round.momentum)
            .bind(round.start_time)
            .bind(round.current_deadline)
            .bind(round.max_deadline)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    /// Deactivate all active rounds without declaring a winner
    pub async fn deactivate_active(&self, at: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE rounds
            SET active = FALSE, ended_at = $1
            WHERE active = TRUE
            "#,
        )
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Find the most recently started active round
    pub async fn find_active(&self) -> RepoResult<Option<Round>> {
        let sql = format!(
            "SELECT {} FROM rounds WHERE active = TRUE ORDER BY start_time DESC, id DESC LIMIT 1",
            ROUND_COLUMNS
        );
        sqlx::query_as::<_, RoundRow>(&sql)
            .fetch_optional(&self.pool)
            .await?
            .map(Round::try_from)
            .transpose()
    }

    /// Find a round by id
    pub async fn find_by_id(&self, round_id: i64) -> RepoResult<Option<Round>> {
        let sql = format!("SELECT {} FROM rounds WHERE id = $1", ROUND_COLUMNS);
        sqlx::query_as::<_, RoundRow>(&sql)
            .bind(round_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Round::try_from)
            .transpose()
    }

    /// Finished rounds, newest first
    pub async fn find_past(&self, limit: i64, offset: i64) -> RepoResult<Vec<Round>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM rounds
            WHERE active = FALSE
            ORDER BY start_time DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
            ROUND_COLUMNS
        );
        let rows = sqlx::query_as::<_, RoundRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        into_rounds(rows)
    }

    /// Close an active round with its result
    pub async fn end(
        &self,
        round_id: i64,
        winner: Winner,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Round>> {
        let sql = format!(
            r#"
            UPDATE rounds
            SET active = FALSE, winner = $2, end_reason = $3, ended_at = $4
            WHERE id = $1 AND active = TRUE
            RETURNING {}
            "#,
            ROUND_COLUMNS
        );
        sqlx::query_as::<_, RoundRow>(&sql)
            .bind(round_id)
            .bind(winner.as_str())
            .bind(reason)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?
            .map(Round::try_from)
            .transpose()
    }

    /// Set the battle image URL
    pub async fn set_battle_image(&self, round_id: i64, url: &str) -> RepoResult<bool> {
        let result = sqlx::query("UPDATE rounds SET battle_image_url = $2 WHERE id = $1")
            .bind(round_id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Ended rounds that have not been paid out, oldest first
    pub async fn find_ended_unpaid(&self, limit: i64) -> RepoResult<Vec<Round>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM rounds
            WHERE active = FALSE AND paid = FALSE
            ORDER BY ended_at ASC NULLS FIRST, id ASC
            LIMIT $1
            "#,
            ROUND_COLUMNS
        );
        let rows = sqlx::query_as::<_, RoundRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        into_rounds(rows)
    }

    /// Mark a round as paid out
    pub async fn mark_paid(&self, round_id: i64) -> RepoResult<()> {
        let result = sqlx::query("UPDATE rounds SET paid = TRUE WHERE id = $1")
            .bind(round_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("Round {} not found", round_id)));
        }
        Ok(())
    }
}
