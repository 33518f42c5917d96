pub mod extract;
pub mod routes;

use crate::AppState;
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        // Game routes
        .route("/state", get(routes::game::get_state))
        .route("/bet", post(routes::game::place_bet))
        .route("/admin/reset", post(routes::admin::reset_game))
        .route("/admin/start_game", post(routes::admin::start_game))
        .route("/history/rounds", get(routes::history::past_rounds))
        .route("/history/bets/:round_id", get(routes::history::round_bets))
        // User app routes
        .route(
            "/api/v1/user-apps",
            post(routes::user_apps::create_user_app).get(routes::user_apps::query_user_apps),
        )
        .route(
            "/api/v1/user-apps/user/:telegram_id",
            get(routes::user_apps::list_user_apps_by_owner),
        )
        .route(
            "/api/v1/user-apps/:app_id",
            get(routes::user_apps::get_user_app)
                .patch(routes::user_apps::update_user_app)
                .delete(routes::user_apps::delete_user_app),
        )
        // Generated content routes
        .route("/api/v1/content/list", get(routes::content::list_content))
        .route("/api/v1/content/:kind", post(routes::content::save_content))
        .route("/api/v1/content/:kind/:content_id", get(routes::content::get_content))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
