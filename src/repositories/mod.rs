//! PostgreSQL repositories backing `store::PgStore`.

pub mod bet_repository;
pub mod payout_repository;
pub mod round_repository;
pub mod user_app_repository;
pub mod user_repository;

// Re-export all repositories for convenient access
pub use bet_repository::BetRepository;
pub use payout_repository::PayoutRepository;
pub use round_repository::RoundRepository;
pub use user_app_repository::UserAppRepository;
pub use user_repository::UserRepository;
