use super::{AppStore, GameStore};
use crate::error::{RepoResult, RepositoryError};
use crate::game_logic::apply_effect;
use crate::models::{
    Bet, BetEffect, BetTotals, NewBet, NewPayout, NewRound, NewUserApp, Payout, Round, Side, User,
    UserApp, UserAppFilter, UserAppUpdate, Winner,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct GameTables {
    rounds: Vec<Round>,
    bets: Vec<Bet>,
    payouts: Vec<Payout>,
    next_round_id: i64,
    next_bet_id: i64,
    next_payout_id: i64,
}

impl GameTables {
    fn round_mut(&mut self, round_id: i64) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.id == round_id)
    }
}

#[derive(Default)]
struct AppTables {
    users: HashMap<String, User>,
    apps: Vec<UserApp>,
}

/// In-process store for tests and single-node development
#[derive(Default)]
pub struct MemoryStore {
    game: RwLock<GameTables>,
    apps: RwLock<AppTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T: Clone>(items: impl Iterator<Item = T>, limit: Option<i64>, offset: i64) -> Vec<T> {
    let skipped = items.skip(offset.max(0) as usize);
    match limit {
        Some(limit) => skipped.take(limit.max(0) as usize).collect(),
        None => skipped.collect(),
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_round(&self, round: &NewRound) -> RepoResult<Round> {
        let mut tables = self.game.write().await;
        tables.next_round_id += 1;

        let created = Round {
            id: tables.next_round_id,
            left_user: round.left_user.clone(),
            right_user: round.right_user.clone(),
            momentum: round.momentum,
            pot_amount: Decimal::ZERO,
            start_time: round.start_time,
            current_deadline: round.current_deadline,
            max_deadline: round.max_deadline,
            active: true,
            winner: None,
            battle_image_url: None,
            end_reason: None,
            ended_at: None,
            paid: false,
        };
        tables.rounds.push(created.clone());
        Ok(created)
    }

    async fn deactivate_active_rounds(&self, at: DateTime<Utc>) -> RepoResult<u64> {
        let mut tables = self.game.write().await;
        let mut touched = 0;
        for round in tables.rounds.iter_mut().filter(|r| r.active) {
            round.active = false;
            round.ended_at = Some(at);
            touched += 1;
        }
        Ok(touched)
    }

    async fn active_round(&self) -> RepoResult<Option<Round>> {
        let tables = self.game.read().await;
        Ok(tables
            .rounds
            .iter()
            .filter(|r| r.active)
            .max_by_key(|r| (r.start_time, r.id))
            .cloned())
    }

    async fn round_by_id(&self, round_id: i64) -> RepoResult<Option<Round>> {
        let tables = self.game.read().await;
        Ok(tables.rounds.iter().find(|r| r.id == round_id).cloned())
    }

    async fn past_rounds(&self, limit: i64, offset: i64) -> RepoResult<Vec<Round>> {
        let tables = self.game.read().await;
        let mut past: Vec<&Round> = tables.rounds.iter().filter(|r| !r.active).collect();
        past.sort_by(|a, b| (b.start_time, b.id).cmp(&(a.start_time, a.id)));
        Ok(paginate(past.into_iter().cloned(), Some(limit), offset))
    }

    async fn record_bet(&self, bet: &NewBet, effect: &BetEffect) -> RepoResult<(Bet, Round)> {
        let mut tables = self.game.write().await;

        let round = tables
            .round_mut(bet.round_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Round {} not found", bet.round_id)))?;
        if !round.active {
            return Err(RepositoryError::BusinessRule(format!("Round {} is not active", round.id)));
        }
        if round.current_deadline <= effect.placed_at {
            return Err(RepositoryError::BusinessRule(format!(
                "Round {} deadline has passed",
                round.id
            )));
        }
        apply_effect(round, bet.amount, effect).map_err(RepositoryError::InvalidInput)?;
        let updated = round.clone();

        tables.next_bet_id += 1;
        let stored = Bet {
            id: tables.next_bet_id,
            round_id: bet.round_id,
            side: bet.side,
            amount: bet.amount,
            spell: bet.spell.clone(),
            wallet_address: bet.wallet_address.clone(),
            timestamp: bet.timestamp,
            processed: bet.processed,
            tx_id: bet.tx_id.clone(),
            impact: bet.impact,
        };
        tables.bets.push(stored.clone());

        Ok((stored, updated))
    }

    async fn bets_for_round(
        &self,
        round_id: i64,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<Vec<Bet>> {
        let tables = self.game.read().await;
        let mut bets: Vec<&Bet> = tables.bets.iter().filter(|b| b.round_id == round_id).collect();
        bets.sort_by(|a, b| (b.timestamp, b.id).cmp(&(a.timestamp, a.id)));
        Ok(paginate(bets.into_iter().cloned(), limit, offset))
    }

    async fn bet_totals(&self, round_id: i64) -> RepoResult<BetTotals> {
        let tables = self.game.read().await;
        let totals = tables
            .bets
            .iter()
            .filter(|b| b.round_id == round_id)
            .fold(BetTotals::default(), |mut acc, bet| {
                acc.count += 1;
                match bet.side {
                    Side::Left => acc.left_amount += bet.amount,
                    Side::Right => acc.right_amount += bet.amount,
                }
                acc
            });
        Ok(totals)
    }

    async fn end_round(
        &self,
        round_id: i64,
        winner: Winner,
        reason: &str,
        at: DateTime<Utc>,
    ) -> RepoResult<Option<Round>> {
        let mut tables = self.game.write().await;
        match tables.round_mut(round_id) {
            Some(round) if round.active => {
                round.active = false;
                round.winner = Some(winner);
                round.end_reason = Some(reason.to_string());
                round.ended_at = Some(at);
                Ok(Some(round.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_battle_image(&self, round_id: i64, url: &str) -> RepoResult<bool> {
        let mut tables = self.game.write().await;
        match tables.round_mut(round_id) {
            Some(round) => {
                round.battle_image_url = Some(url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ended_unpaid_rounds(&self, limit: i64) -> RepoResult<Vec<Round>> {
        let tables = self.game.read().await;
        let mut unpaid: Vec<&Round> = tables.rounds.iter().filter(|r| !r.active && !r.paid).collect();
        unpaid.sort_by_key(|r| (r.ended_at, r.id));
        Ok(paginate(unpaid.into_iter().cloned(), Some(limit), 0))
    }

    async fn mark_round_paid(&self, round_id: i64) -> RepoResult<()> {
        let mut tables = self.game.write().await;
        let round = tables
            .round_mut(round_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("Round {} not found", round_id)))?;
        round.paid = true;
        Ok(())
    }

    async fn record_payout(&self, payout: &NewPayout) -> RepoResult<Payout> {
        let mut tables = self.game.write().await;
        if tables.payouts.iter().any(|p| p.bet_id == payout.bet_id) {
            return Err(RepositoryError::Duplicate(format!(
                "Payout for bet {} already recorded",
                payout.bet_id
            )));
        }

        tables.next_payout_id += 1;
        let stored = Payout {
            id: tables.next_payout_id,
            round_id: payout.round_id,
            bet_id: payout.bet_id,
            wallet_address: payout.wallet_address.clone(),
            amount_microalgos: payout.amount_microalgos,
            tx_id: payout.tx_id.clone(),
            created_at: Utc::now(),
        };
        tables.payouts.push(stored.clone());
        Ok(stored)
    }

    async fn payouts_for_round(&self, round_id: i64) -> RepoResult<Vec<Payout>> {
        let tables = self.game.read().await;
        Ok(tables
            .payouts
            .iter()
            .filter(|p| p.round_id == round_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AppStore for MemoryStore {
    async fn find_or_create_user(&self, telegram_id: &str) -> RepoResult<User> {
        let mut tables = self.apps.write().await;
        let user = tables
            .users
            .entry(telegram_id.to_string())
            .or_insert_with(|| User::new(telegram_id.to_string()));
        Ok(user.clone())
    }

    async fn find_user(&self, telegram_id: &str) -> RepoResult<Option<User>> {
        let tables = self.apps.read().await;
        Ok(tables.users.get(telegram_id).cloned())
    }

    async fn create_user_app(&self, owner: &User, app: &NewUserApp) -> RepoResult<UserApp> {
        let mut tables = self.apps.write().await;
        if !tables.users.contains_key(&owner.telegram_id) {
            return Err(RepositoryError::ConstraintViolation(format!(
                "Unknown owner {}",
                owner.telegram_id
            )));
        }

        let now = Utc::now();
        let created = UserApp {
            id: Uuid::new_v4(),
            name: app.name.clone(),
            url: app.url.clone(),
            description: app.description.clone(),
            required_env_vars: app.required_env_vars.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
            owner_telegram_id: owner.telegram_id.clone(),
        };
        tables.apps.push(created.clone());
        Ok(created)
    }

    async fn get_user_app(&self, id: Uuid) -> RepoResult<Option<UserApp>> {
        let tables = self.apps.read().await;
        Ok(tables.apps.iter().find(|a| a.id == id).cloned())
    }

    async fn query_user_apps(&self, filter: &UserAppFilter) -> RepoResult<Vec<UserApp>> {
        let tables = self.apps.read().await;
        let mut matching: Vec<&UserApp> = tables
            .apps
            .iter()
            .filter(|a| {
                filter
                    .telegram_id
                    .as_deref()
                    .map_or(true, |t| a.owner_telegram_id == t)
            })
            .filter(|a| filter.is_active.map_or(true, |active| a.is_active == active))
            .filter(|a| filter.name_matches(&a.name))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(paginate(matching.into_iter().cloned(), Some(filter.limit), filter.skip))
    }

    async fn update_user_app(&self, id: Uuid, update: &UserAppUpdate) -> RepoResult<Option<UserApp>> {
        let mut tables = self.apps.write().await;
        match tables.apps.iter_mut().find(|a| a.id == id) {
            Some(app) => {
                update.apply_to(app, Utc::now());
                Ok(Some(app.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_user_app(&self, id: Uuid) -> RepoResult<bool> {
        let mut tables = self.apps.write().await;
        let before = tables.apps.len();
        tables.apps.retain(|a| a.id != id);
        Ok(tables.apps.len() < before)
    }
}
