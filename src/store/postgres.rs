use super::{AppStore, GameStore};
use crate::error::{RepoResult, RepositoryError};
use crate::game_logic::apply_effect;
use crate::models::{
    Bet, BetEffect, BetTotals, NewBet, NewPayout, NewRound, NewUserApp, Payout, Round, User,
    UserApp, UserAppFilter, UserAppUpdate, Winner,
};
use crate::repositories::bet_repository::insert_bet;
use crate::repositories::round_repository::{lock_round, update_round_progress};
use crate::repositories::{
    BetRepository, PayoutRepository, RoundRepository, UserAppRepository, UserRepository,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL-backed store delegating to the repositories
pub struct PgStore {
    pool: PgPool,
    rounds: RoundRepository,
    bets: BetRepository,
    payouts: PayoutRepository,
    users: UserRepository,
    apps: UserAppRepository,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            rounds: RoundRepository::new(pool.clone()),
            bets: BetRepository::new(pool.clone()),
            payouts: PayoutRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            apps: UserAppRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn create_round(&self, round: &NewRound) -> RepoResult<Round> {
        self.rounds.create(round).await
    }

    async fn deactivate_active_rounds(&self, at: DateTime<Utc>) -> RepoResult<u64> {
        self.rounds.deactivate_active(at).await
    }

    async fn active_round(&self) -> RepoResult<Option<Round>> {
        self.rounds.find_active().await
    }

    async fn round_by_id(&self, round_id: i64) -> RepoResult<Option<Round>> {
        self.rounds.find_by_id(round_id).await
    }

    async fn past_rounds(&self, limit: i64, offset: i64) -> RepoResult<Vec<Round>> {
        self.rounds.find_past(limit, offset).await
    }

    async fn record_bet(&self, bet: &NewBet, effect: &BetEffect) -> RepoResult<(Bet, Round)> {
        let mut tx = self.pool.begin().await?;

        let mut round = lock_round(&mut tx, bet.round_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("Round {} not found", bet.round_id)))?;

        if !round.active {
            return Err(RepositoryError::BusinessRule(format!(
                "Round {} is not active",
                round.id
            )));
        }
        if round.current_deadline <= effect.placed_at {
            return Err(RepositoryError::BusinessRule(format!(
                "Round {} deadline has passed",
                round.id
            )));
        }

        apply_effect(&mut round, bet.amount, effect).map_err(RepositoryError::InvalidInput)?;
        update_round_progress(&mut tx, &round).await?;
        let stored = insert_bet(&mut tx, bet).await?;

        tx.commit().await?;
        debug!(round_id = round.id, bet_id = stored.id, momentum = round.momentum, "bet recorded");
        Ok((stored, round))
    }

    async fn bets_for_round(
        &self,
        round_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<Vec<Bet>> {
        self.bets.find_by_round(round_id, limit, offset).await
    }

    async fn bet_totals(&self, round_id: i64) -> RepoResult<BetTotals> {
        self.bets.totals(round_id).await
    }

    async fn end_round(
        &self,
        round_id: i64,
        winner: Winner,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Round>> {
        self.rounds.end(round_id, winner, reason, at).await
    }

    async fn set_battle_image(&self, round_id: i64, url: &str) -> RepoResult<bool> {
        self.rounds.set_battle_image(round_id, url).await
    }

    async fn ended_unpaid_rounds(&self, limit: i64) -> RepoResult<Vec<Round>> {
        self.rounds.find_ended_unpaid(limit).await
    }

    async fn mark_round_paid(&self, round_id: i64) -> RepoResult<()> {
        self.rounds.mark_paid(round_id).await
    }

    async fn record_payout(&self, payout: &NewPayout) -> RepoResult<Payout> {
        self.payouts.create(payout).await
    }

    async fn payouts_for_round(&self, round_id: i64) -> RepoResult<Vec<Payout>> {
        self.payouts.find_by_round(round_id).await
    }
}

#[async_trait]
impl AppStore for PgStore {
    async fn find_or_create_user(&self, telegram_id: &str) -> RepoResult<User> {
        self.users.find_or_create(telegram_id).await
    }

    async fn find_user(&self, telegram_id: &str) -> RepoResult<Option<User>> {
        self.users.find_by_telegram_id(telegram_id).await
    }

    async fn create_user_app(&self, owner: &User, app: &NewUserApp) -> RepoResult<UserApp> {
        self.apps.create(owner, app).await
    }

    async fn get_user_app(&self, id: Uuid) -> RepoResult<Option<UserApp>> {
        self.apps.find_by_id(id).await
    }

    async fn query_user_apps(&self, filter: &UserAppFilter) -> RepoResult<Vec<UserApp>> {
        self.apps.query(filter).await
    }

    async fn update_user_app(&self, id: Uuid, update: &UserAppUpdate) -> RepoResult<Option<UserApp>> {
        self.apps.update(id, update).await
    }

    async fn delete_user_app(&self, id: Uuid) -> RepoResult<bool> {
        self.apps.delete(id).await
    }
}
