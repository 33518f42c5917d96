use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Telegram user who owns published apps
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub telegram_id: String,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User known only by Telegram id
    pub fn new(telegram_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            telegram_id,
            username: None,
            first_name: None,
            last_name: None,
            created_at: now,
            updated_at: now,
        }
    }
}
