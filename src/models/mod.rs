//! Domain models for the AlgoFOMO backend.
//!
//! Game rounds, bets and payouts, plus the user app and generated content
//! records of the publishing API.

pub mod bet;
pub mod content;
pub mod game;
pub mod payout;
pub mod round;
pub mod user;
pub mod user_app;

// Re-export all models for convenient access
pub use bet::{
    Bet, BetEffect, BetRequest, BetTotals, NewBet, MAX_AMOUNT_SCALE, MAX_BET_AMOUNT, MAX_SPELL_WORDS,
};
pub use content::{ContentItem, ContentKind, ContentListing, ContentRequest, SavedContent};
pub use game::{AdminResetRequest, BetReceipt, GameState, ResetResponse, StartGameRequest};
pub use payout::{NewPayout, Payout, MICROALGOS_PER_ALGO};
pub use round::{
    NewRound, Round, Side, TwitterUser, Winner, MOMENTUM_MAX, MOMENTUM_MIN, MOMENTUM_NEUTRAL,
};
pub use user::User;
pub use user_app::{NewUserApp, UserApp, UserAppCreate, UserAppFilter, UserAppUpdate};
