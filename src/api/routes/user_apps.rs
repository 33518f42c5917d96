use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::AppResult;
use crate::models::{UserApp, UserAppCreate, UserAppFilter, UserAppUpdate};
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

pub async fn create_user_app(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<UserAppCreate>,
) -> AppResult<Json<UserApp>> {
    Ok(Json(state.user_apps.create(request).await?))
}

pub async fn query_user_apps(
    State(state): State<Arc<AppState>>,
    ApiQuery(filter): ApiQuery<UserAppFilter>,
) -> AppResult<Json<Vec<UserApp>>> {
    Ok(Json(state.user_apps.query(filter).await?))
}

pub async fn list_user_apps_by_owner(
    State(state): State<Arc<AppState>>,
    ApiPath(telegram_id): ApiPath<String>,
) -> AppResult<Json<Vec<UserApp>>> {
    Ok(Json(state.user_apps.list_for_owner(&telegram_id).await?))
}

pub async fn get_user_app(
    State(state): State<Arc<AppState>>,
    ApiPath(app_id): ApiPath<Uuid>,
) -> AppResult<Json<UserApp>> {
    Ok(Json(state.user_apps.get(app_id).await?))
}

pub async fn update_user_app(
    State(state): State<Arc<AppState>>,
    ApiPath(app_id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UserAppUpdate>,
) -> AppResult<Json<UserApp>> {
    Ok(Json(state.user_apps.update(app_id, update).await?))
}

pub async fn delete_user_app(
    State(state): State<Arc<AppState>>,
    ApiPath(app_id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state.user_apps.delete(app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
