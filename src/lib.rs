//! AlgoFOMO Backend Library
//!
//! This module exposes the backend components for use by tests and the binary.

pub mod api;
pub mod auth;
pub mod clients;
pub mod config;
pub mod database;
pub mod error;
pub mod game_logic;
pub mod models;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use services::{ContentService, GameService, UserAppService};
use std::sync::Arc;
use store::AppStore;

/// Shared state handed to every HTTP handler
pub struct AppState {
    pub config: AppConfig,
    pub game: GameService,
    pub user_apps: UserAppService,
    pub content: ContentService,
}

impl AppState {
    /// Assemble the state from an already configured game service
    pub fn new(config: AppConfig, game: GameService, apps: Arc<dyn AppStore>) -> Self {
        let content = ContentService::new(&config.content);
        Self {
            game,
            user_apps: UserAppService::new(apps),
            content,
            config,
        }
    }
}
