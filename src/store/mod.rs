//! Storage seam for rounds, bets, payouts and user apps.
//!
//! Services only see these traits. `PgStore` backs them with PostgreSQL and
//! `MemoryStore` keeps everything in process for tests and local runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::RepoResult;
use crate::models::{
    Bet, BetEffect, BetTotals, NewBet, NewPayout, NewRound, NewUserApp, Payout, Round, User,
    UserApp, UserAppFilter, UserAppUpdate, Winner,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_round(&self, round: &NewRound) -> RepoResult<Round>;

    /// Mark every active round inactive; returns how many were touched
    async fn deactivate_active_rounds(&self, at: DateTime<Utc>) -> RepoResult<u64>;

    /// Most recently started active round
    async fn active_round(&self) -> RepoResult<Option<Round>>;

    async fn round_by_id(&self, round_id: i64) -> RepoResult<Option<Round>>;

    /// Inactive rounds, newest first
    async fn past_rounds(&self, limit: i64, offset: i64) -> RepoResult<Vec<Round>>;

    /// Insert a bet and apply its effect to the round in one step.
    ///
    /// Fails with `RepositoryError::BusinessRule` when the round is no longer
    /// active or its deadline is not after `effect.placed_at`.
    async fn record_bet(&self, bet: &NewBet, effect: &BetEffect) -> RepoResult<(Bet, Round)>;

    /// Bets of a round, newest first; `None` returns all of them
    async fn bets_for_round(
        &self,
        round_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<Vec<Bet>>;

    async fn bet_totals(&self, round_id: i64) -> RepoResult<BetTotals>;

    /// Close a round with a result. Returns `None` if it was already closed.
    async fn end_round(
        &self,
        round_id: i64,
        winner: Winner,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Round>>;

    /// Store the battle image; returns false if the round does not exist
    async fn set_battle_image(&self, round_id: i64, url: &str) -> RepoResult<bool>;

    /// Ended rounds still awaiting payout, oldest first
    async fn ended_unpaid_rounds(&self, limit: i64) -> RepoResult<Vec<Round>>;

    async fn mark_round_paid(&self, round_id: i64) -> RepoResult<()>;

    async fn record_payout(&self, payout: &NewPayout) -> RepoResult<Payout>;

    async fn payouts_for_round(&self, round_id: i64) -> RepoResult<Vec<Payout>>;
}

#[async_trait]
pub trait AppStore: Send + Sync {
    async fn find_or_create_user(&self, telegram_id: &str) -> RepoResult<User>;

    async fn find_user(&self, telegram_id: &str) -> RepoResult<Option<User>>;

    async fn create_user_app(&self, owner: &User, app: &NewUserApp) -> RepoResult<UserApp>;

    async fn get_user_app(&self, id: Uuid) -> RepoResult<Option<UserApp>>;

    /// Apps matching the filter, newest first
    async fn query_user_apps(&self, filter: &UserAppFilter) -> RepoResult<Vec<UserApp>>;

    /// Returns `None` when no app has this id
    async fn update_user_app(&self, id: Uuid, update: &UserAppUpdate) -> RepoResult<Option<UserApp>>;

    /// Returns false when no app has this id
    async fn delete_user_app(&self, id: Uuid) -> RepoResult<bool>;
}
