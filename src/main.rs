//! AlgoFOMO Backend Service
//!
//! Main entry point for the AlgoFOMO backend.
//! This service provides:
//! - HTTP API for the momentum game, user app publishing and generated content
//! - Background jobs that end rounds and pay out winners

use algofomo_backend::api::build_router;
use algofomo_backend::clients::image::image_generator_from_config;
use algofomo_backend::clients::{PayoutClient, SimulatedAlgorandClient};
use algofomo_backend::config::{AppConfig, StorageBackend};
use algofomo_backend::database::Database;
use algofomo_backend::error::{AppError, AppResult};
use algofomo_backend::services::{GameService, ImageRenderer, PayoutService, RoundEnder};
use algofomo_backend::store::{AppStore, GameStore, MemoryStore, PgStore};
use algofomo_backend::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "algofomo_backend={},sqlx=warn,tower_http=info",
            config.log_level
        )
        .into()
    });

    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        AppError::Config(e)
    })?;

    init_tracing(&config);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           AlgoFOMO Backend Service Starting              ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);

    // =========================================================================
    // STORAGE
    // =========================================================================
    let (game_store, app_store): (Arc<dyn GameStore>, Arc<dyn AppStore>) = match config.storage {
        StorageBackend::Postgres => {
            info!("Connecting to database...");
            let database = Database::connect_and_migrate(&config.database).await?;
            info!("✓ Database connected and migrations applied");
            let store = Arc::new(PgStore::new(database.into_pool()));
            (store.clone() as Arc<dyn GameStore>, store as Arc<dyn AppStore>)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage - data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn GameStore>, store as Arc<dyn AppStore>)
        }
    };

    // =========================================================================
    // CLIENTS & SERVICES
    // =========================================================================
    let generator = image_generator_from_config(&config.openai)?;
    let renderer = Arc::new(ImageRenderer::new(game_store.clone(), generator));
    info!("✓ Battle image renderer initialized");

    let payout_client: Option<Arc<dyn PayoutClient>> = match config.algorand.hot_wallet_mnemonic {
        Some(_) => {
            let client = SimulatedAlgorandClient::new(&config.algorand)?;
            info!("✓ Algorand client initialized ({})", config.algorand.algod_node);
            Some(Arc::new(client) as Arc<dyn PayoutClient>)
        }
        None => {
            warn!("HOT_WALLET_MNEMONIC not set - bet transactions are not verified");
            None
        }
    };

    let mut game = GameService::new(game_store.clone(), config.game.clone()).with_renderer(renderer);
    if let Some(client) = &payout_client {
        game = game.with_payment_verifier(client.clone());
    }

    let state = Arc::new(AppState::new(config.clone(), game, app_store));
    state.content.ensure_dirs().await?;
    info!("✓ Content directories ready under {}", config.content.base_dir);

    // =========================================================================
    // BACKGROUND TASKS
    // =========================================================================
    if config.jobs.enabled {
        info!("Starting background tasks...");

        let ender = RoundEnder::new(game_store.clone()).with_interval(config.jobs.end_round_interval());
        tokio::spawn(async move {
            ender.start().await;
        });
        info!(
            "✓ Round ender started ({}s interval)",
            config.jobs.end_round_interval_secs
        );

        match &payout_client {
            Some(client) => {
                let payouts = PayoutService::new(game_store.clone(), client.clone())
                    .with_interval(config.jobs.payout_interval())
                    .with_batch_size(config.jobs.payout_batch_size)
                    .with_house_cut_percent(config.jobs.house_cut_percent);
                tokio::spawn(async move {
                    payouts.start().await;
                });
                info!(
                    "✓ Payout job started ({}s interval, {}% house cut)",
                    config.jobs.payout_interval_secs, config.jobs.house_cut_percent
                );
            }
            None => warn!("HOT_WALLET_MNEMONIC not set - payout job not started"),
        }
    } else {
        warn!("Background jobs disabled (ENABLE_BACKGROUND_JOBS=false)");
    }

    // =========================================================================
    // START SERVER
    // =========================================================================
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid HTTP address: {}", e)))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Message(format!("Failed to bind HTTP server: {}", e)))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           AlgoFOMO Backend Service Ready!                ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     {}", addr);
    info!("║  Environment:  {}", config.environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    let app = build_router(state);
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("HTTP server error: {}", e);
        return Err(AppError::Io(e));
    }

    info!("AlgoFOMO backend service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, shutting down gracefully...");
}
