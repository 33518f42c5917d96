use crate::error::RepoResult;
use crate::models::User;
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, telegram_id, username, first_name, last_name, created_at, updated_at";

/// Repository for user data access
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by Telegram id
    pub async fn find_by_telegram_id(&self, telegram_id: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE telegram_id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Find or create a user by Telegram id (upsert pattern)
    /// Returns the user whether it was created or already existed
    pub async fn find_or_create(&self, telegram_id: &str) -> RepoResult<User> {
        // The no-op update makes RETURNING yield the existing row on conflict
        let sql = format!(
            r#"
            INSERT INTO users (telegram_id)
            VALUES ($1)
            ON CONFLICT (telegram_id) DO UPDATE SET telegram_id = EXCLUDED.telegram_id
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(telegram_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}
