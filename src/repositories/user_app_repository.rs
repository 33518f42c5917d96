use crate::error::RepoResult;
use crate::models::user_app::EnvVarSpec;
use crate::models::{NewUserApp, User, UserApp, UserAppFilter, UserAppUpdate};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// `user_apps` row joined with the owner's Telegram id
#[derive(Debug, FromRow)]
struct UserAppRow {
    id: Uuid,
    name: String,
    url: String,
    description: String,
    required_env_vars: Json<Vec<EnvVarSpec>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    owner_telegram_id: String,
}

impl From<UserAppRow> for UserApp {
    fn from(row: UserAppRow) -> Self {
        UserApp {
            id: row.id,
            name: row.name,
            url: row.url,
            description: row.description,
            required_env_vars: row.required_env_vars.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            owner_telegram_id: row.owner_telegram_id,
        }
    }
}

const APP_SELECT: &str = r#"
    SELECT a.id, a.name, a.url, a.description, a.required_env_vars, a.is_active,
           a.created_at, a.updated_at, u.telegram_id AS owner_telegram_id
    FROM user_apps a
    JOIN users u ON u.id = a.owner_id
"#;

/// Repository for published user apps
pub struct UserAppRepository {
    pool: PgPool,
}

impl UserAppRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an app owned by `owner`
    pub async fn create(&self, owner: &User, app: &NewUserApp) -> RepoResult<UserApp> {
        let row = sqlx::query_as::<_, UserAppRow>(
            r#"
            WITH inserted AS (
                INSERT INTO user_apps (owner_id, name, url, description, required_env_vars)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT i.id, i.name, i.url, i.description, i.required_env_vars, i.is_active,
                   i.created_at, i.updated_at, u.telegram_id AS owner_telegram_id
            FROM inserted i
            JOIN users u ON u.id = i.owner_id
            "#,
        )
        .bind(owner.id)
        .bind(&app.name)
        .bind(&app.url)
        .bind(&app.description)
        .bind(Json(&app.required_env_vars))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    /// Find an app by id
    pub async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<UserApp>> {
        let sql = format!("{} WHERE a.id = $1", APP_SELECT);
        let row = sqlx::query_as::<_, UserAppRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserApp::from))
    }

    /// Apps matching a filter, newest first
    pub async fn query(&self, filter: &UserAppFilter) -> RepoResult<Vec<UserApp>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(APP_SELECT);
        builder.push(" WHERE TRUE");

        if let Some(telegram_id) = &filter.telegram_id {
            builder.push(" AND u.telegram_id = ").push_bind(telegram_id.clone());
        }
        if let Some(is_active) = filter.is_active {
            builder.push(" AND a.is_active = ").push_bind(is_active);
        }
        if let Some(needle) = &filter.name_contains {
            builder
                .push(" AND a.name ILIKE ")
                .push_bind(format!("%{}%", escape_like(needle)));
        }

        builder
            .push(" ORDER BY a.created_at DESC, a.id DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let rows = builder
            .build_query_as::<UserAppRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(UserApp::from).collect())
    }

    /// Apply a partial update; `None` when the app does not exist
    pub async fn update(&self, id: Uuid, update: &UserAppUpdate) -> RepoResult<Option<UserApp>> {
        let row = sqlx::query_as::<_, UserAppRow>(
            r#"
            WITH updated AS (
                UPDATE user_apps
                SET name = COALESCE($2, name),
                    url = COALESCE($3, url),
                    description = COALESCE($4, description),
                    required_env_vars = COALESCE($5, required_env_vars),
                    is_active = COALESCE($6, is_active),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT d.id, d.name, d.url, d.description, d.required_env_vars, d.is_active,
                   d.created_at, d.updated_at, u.telegram_id AS owner_telegram_id
            FROM updated d
            JOIN users u ON u.id = d.owner_id
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(&update.url)
        .bind(&update.description)
        .bind(update.required_env_vars.as_ref().map(Json))
        .bind(update.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserApp::from))
    }

    /// Delete an app; false when it did not exist
    pub async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM user_apps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE wildcards so names are matched literally
fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}
