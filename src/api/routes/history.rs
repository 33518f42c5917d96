use crate::api::extract::{ApiPath, ApiQuery};
use crate::error::{AppError, AppResult};
use crate::models::{Bet, Round};
use crate::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

const MAX_PAGE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

impl Page {
    /// `(limit, offset)` after defaults and bounds
    fn resolve(&self, default_limit: i64) -> AppResult<(i64, i64)> {
        let limit = self.limit.unwrap_or(default_limit);
        if !(1..=MAX_PAGE).contains(&limit) {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {}",
                MAX_PAGE
            )));
        }
        if self.offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }
        Ok((limit, self.offset))
    }
}

/// Finished rounds, newest first
pub async fn past_rounds(
    State(state): State<Arc<AppState>>,
    ApiQuery(page): ApiQuery<Page>,
) -> AppResult<Json<Vec<Round>>> {
    let (limit, offset) = page.resolve(10)?;
    Ok(Json(state.game.past_rounds(limit, offset).await?))
}

/// Bets of one round, newest first
pub async fn round_bets(
    State(state): State<Arc<AppState>>,
    ApiPath(round_id): ApiPath<i64>,
    ApiQuery(page): ApiQuery<Page>,
) -> AppResult<Json<Vec<Bet>>> {
    let (limit, offset) = page.resolve(50)?;
    Ok(Json(state.game.round_bets(round_id, limit, offset).await?))
}
