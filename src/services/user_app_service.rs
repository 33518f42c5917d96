use crate::error::{option_to_result, AppError, AppResult};
use crate::models::{UserApp, UserAppCreate, UserAppFilter, UserAppUpdate};
use crate::store::AppStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Publishing and querying of user apps
pub struct UserAppService {
    store: Arc<dyn AppStore>,
}

impl UserAppService {
    pub fn new(store: Arc<dyn AppStore>) -> Self {
        Self { store }
    }

    /// Create an app, registering its owner on first use
    pub async fn create(&self, request: UserAppCreate) -> AppResult<UserApp> {
        let (telegram_id, new_app) = request.into_new_app().map_err(AppError::Validation)?;

        let owner = self.store.find_or_create_user(&telegram_id).await?;
        let app = self.store.create_user_app(&owner, &new_app).await?;

        info!(app_id = %app.id, owner = %telegram_id, name = %app.name, "user app created");
        Ok(app)
    }

    pub async fn query(&self, filter: UserAppFilter) -> AppResult<Vec<UserApp>> {
        filter.validate().map_err(AppError::Validation)?;
        Ok(self.store.query_user_apps(&filter).await?)
    }

    /// All apps of one owner, newest first. Unknown owners have no apps.
    pub async fn list_for_owner(&self, telegram_id: &str) -> AppResult<Vec<UserApp>> {
        if self.store.find_user(telegram_id).await?.is_none() {
            return Ok(Vec::new());
        }

        let mut apps = Vec::new();
        let mut filter = UserAppFilter {
            telegram_id: Some(telegram_id.to_string()),
            limit: crate::models::user_app::MAX_APP_LIMIT,
            ..Default::default()
        };
        loop {
            let page = self.store.query_user_apps(&filter).await?;
            let done = (page.len() as i64) < filter.limit;
            apps.extend(page);
            if done {
                return Ok(apps);
            }
            filter.skip += filter.limit;
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<UserApp> {
        option_to_result(self.store.get_user_app(id).await?, "App not found")
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, update: UserAppUpdate) -> AppResult<UserApp> {
        let update = update.validated().map_err(AppError::Validation)?;
        if update.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }

        let app = self
            .store
            .update_user_app(id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound("App not found".to_string()))?;

        info!(app_id = %app.id, "user app updated");
        Ok(app)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.delete_user_app(id).await? {
            return Err(AppError::NotFound("App not found".to_string()));
        }
        info!(app_id = %id, "user app deleted");
        Ok(())
    }
}
