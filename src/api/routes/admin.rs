use crate::api::extract::ApiJson;
use crate::auth::authorize_admin;
use crate::error::AppResult;
use crate::models::{AdminResetRequest, ResetResponse, Round, StartGameRequest};
use crate::AppState;
use axum::{extract::State, http::HeaderMap, Json};
use std::sync::Arc;
use tracing::{info, warn};

fn check_admin(state: &AppState, headers: &HeaderMap, body_token: Option<&str>) -> AppResult<()> {
    authorize_admin(state.config.game.admin_token.as_deref(), headers, body_token).map_err(|e| {
        warn!("rejected admin request: {}", e);
        e
    })
}

pub async fn reset_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<AdminResetRequest>,
) -> AppResult<Json<ResetResponse>> {
    check_admin(&state, &headers, request.admin_token.as_deref())?;
    info!(initial_momentum = request.initial_momentum, "admin reset requested");
    Ok(Json(state.game.reset(request).await?))
}

pub async fn start_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<StartGameRequest>,
) -> AppResult<Json<Round>> {
    check_admin(&state, &headers, request.admin_token.as_deref())?;
    info!(
        left = %request.left_player_handle,
        right = %request.right_player_handle,
        "admin start game requested"
    );
    Ok(Json(state.game.start_game(request).await?))
}
