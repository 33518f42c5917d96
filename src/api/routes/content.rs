use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::error::{AppError, AppResult};
use crate::models::{ContentKind, ContentListing, ContentRequest, SavedContent};
use crate::services::content_service::DEFAULT_LIST_LIMIT;
use crate::AppState;
use axum::{extract::State, response::Html, Json};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub content_type: Option<String>,
    pub limit: Option<usize>,
}

fn parse_kind(raw: &str) -> AppResult<ContentKind> {
    raw.parse::<ContentKind>().map_err(AppError::NotFound)
}

pub async fn save_content(
    State(state): State<Arc<AppState>>,
    ApiPath(kind): ApiPath<String>,
    ApiJson(request): ApiJson<ContentRequest>,
) -> AppResult<Json<SavedContent>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(state.content.save(kind, request).await?))
}

pub async fn get_content(
    State(state): State<Arc<AppState>>,
    ApiPath((kind, content_id)): ApiPath<(String, String)>,
) -> AppResult<Html<String>> {
    let kind = parse_kind(&kind)?;
    Ok(Html(state.content.read(kind, &content_id).await?))
}

pub async fn list_content(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> AppResult<Json<ContentListing>> {
    let kind = params
        .content_type
        .as_deref()
        .map(|raw| raw.parse::<ContentKind>().map_err(AppError::Validation))
        .transpose()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.content.list(kind, limit).await?))
}
