use crate::api::extract::ApiJson;
use crate::error::AppResult;
use crate::models::{BetReceipt, BetRequest, GameState};
use crate::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// Current round, recent bets and per-side totals
pub async fn get_state(State(state): State<Arc<AppState>>) -> AppResult<Json<GameState>> {
    Ok(Json(state.game.current_state().await?))
}

pub async fn place_bet(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<BetRequest>,
) -> AppResult<Json<BetReceipt>> {
    Ok(Json(state.game.place_bet(request).await?))
}
