#![allow(dead_code)]

use algofomo_backend::api::build_router;
use algofomo_backend::config::{AppConfig, ContentConfig, GameConfig, StorageBackend};
use algofomo_backend::models::{AdminResetRequest, BetRequest, Round, Side};
use algofomo_backend::services::GameService;
use algofomo_backend::store::{GameStore, MemoryStore, PgStore};
use algofomo_backend::AppState;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Well formed Algorand addresses for bets and payouts
pub const WALLET_A: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";
pub const WALLET_B: &str = "AEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEA5RCDXMI";
pub const WALLET_C: &str = "AIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBAEAQCAIBMXPWWNQ";
pub const WALLET_D: &str = "AMBQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMBQGAYDAMB5DBBASI";

/// Ten words, so the spell multiplier is exactly 1
pub const TEN_WORD_SPELL: &str = "may the winds of fortune carry my bet all the way";

pub fn test_game_config() -> GameConfig {
    GameConfig {
        admin_token: Some(ADMIN_TOKEN.to_string()),
        ..GameConfig::default()
    }
}

/// Game service over an in-memory store with a deterministic impact factor
pub fn test_game_service(store: Arc<MemoryStore>) -> GameService {
    GameService::new(store, test_game_config()).with_fixed_impact_factor(1.0)
}

pub fn reset_request(initial_momentum: i32) -> AdminResetRequest {
    AdminResetRequest {
        left_avatar_url: "https://img.example.com/left.png".to_string(),
        right_avatar_url: "https://img.example.com/right.png".to_string(),
        initial_momentum,
        admin_token: None,
    }
}

pub fn bet_request(round_id: i64, side: Side, amount: i64, wallet: &str) -> BetRequest {
    BetRequest {
        round_id,
        side,
        amount: Decimal::new(amount, 0),
        spell: TEN_WORD_SPELL.to_string(),
        wallet_address: wallet.to_string(),
        tx_id: None,
    }
}

/// Full HTTP application over an in-memory store
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    _content_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let content_dir = TempDir::new().expect("Failed to create content dir");
        let config = AppConfig {
            storage: StorageBackend::Memory,
            game: test_game_config(),
            content: ContentConfig {
                base_dir: content_dir.path().to_string_lossy().into_owned(),
                public_base_url: "https://content.example.com".to_string(),
            },
            ..AppConfig::default()
        };

        let store = Arc::new(MemoryStore::new());
        let game = test_game_service(store.clone());
        let state = Arc::new(AppState::new(config, game, store.clone()));

        Self {
            state,
            store,
            _content_dir: content_dir,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(request).await;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };
        (status, body)
    }

    pub async fn send_raw(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("Router failed to respond");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, &body, None)).await
    }

    pub async fn post_as_admin(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::POST, uri, &body, Some(ADMIN_TOKEN)))
            .await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request(Method::PATCH, uri, &body, None)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::delete(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Open a round through the admin endpoint and return it
    pub async fn start_round(&self) -> Round {
        let (status, body) = self
            .post_as_admin(
                "/admin/reset",
                serde_json::json!({
                    "left_avatar_url": "https://img.example.com/left.png",
                    "right_avatar_url": "https://img.example.com/right.png"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "reset failed: {}", body);
        serde_json::from_value(body["round"].clone()).expect("Invalid round in reset response")
    }
}

pub fn json_request(method: Method, uri: &str, body: &Value, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Store and round helpers for the PostgreSQL tests
pub struct TestDatabase {
    pub pool: PgPool,
    pub store: Arc<PgStore>,
}

impl TestDatabase {
    /// Create TestDatabase from an existing pool (useful with sqlx::test)
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            store: Arc::new(PgStore::new(pool.clone())),
            pool,
        }
    }

    pub fn game_service(&self) -> GameService {
        GameService::new(self.store.clone(), test_game_config()).with_fixed_impact_factor(1.0)
    }

    pub async fn active_round(&self) -> Option<Round> {
        self.store
            .active_round()
            .await
            .expect("Failed to load active round")
    }
}
