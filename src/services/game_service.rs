use crate::auth::validate_algorand_address;
use crate::clients::PayoutClient;
use crate::config::GameConfig;
use crate::error::{AppError, AppResult};
use crate::game_logic::{bet_effect, bet_impact, calculate_bet_impact, initial_deadlines};
use crate::models::{
    AdminResetRequest, Bet, BetReceipt, BetRequest, GameState, NewBet, NewRound, ResetResponse,
    Round, StartGameRequest, TwitterUser,
};
use crate::services::image_renderer::{opening_prompt, ImageRenderer, DEFAULT_SPELL};
use crate::store::GameStore;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::{info, warn};

/// Round and bet operations behind the game endpoints
pub struct GameService {
    store: Arc<dyn GameStore>,
    config: GameConfig,
    payment_verifier: Option<Arc<dyn PayoutClient>>,
    renderer: Option<Arc<ImageRenderer>>,
    /// Replaces the random impact factor when set
    fixed_impact_factor: Option<f64>,
}

impl GameService {
    pub fn new(store: Arc<dyn GameStore>, config: GameConfig) -> Self {
        Self {
            store,
            config,
            payment_verifier: None,
            renderer: None,
            fixed_impact_factor: None,
        }
    }

    /// Verify bet payment transactions with this client
    pub fn with_payment_verifier(mut self, client: Arc<dyn PayoutClient>) -> Self {
        self.payment_verifier = Some(client);
        self
    }

    /// Re-render the battle image after bets and new games
    pub fn with_renderer(mut self, renderer: Arc<ImageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Use a fixed impact factor instead of a random one
    pub fn with_fixed_impact_factor(mut self, factor: f64) -> Self {
        self.fixed_impact_factor = Some(factor);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    async fn require_active_round(&self) -> AppResult<Round> {
        self.store
            .active_round()
            .await?
            .ok_or_else(|| AppError::NotFound("No active round found".to_string()))
    }

    /// Active round with recent bets and per-side totals
    pub async fn current_state(&self) -> AppResult<GameState> {
        let round = self.require_active_round().await?;
        let recent_bets = self
            .store
            .bets_for_round(round.id, Some(self.config.recent_bets_limit as i64), 0)
            .await?;
        let totals = self.store.bet_totals(round.id).await?;

        Ok(GameState {
            round,
            recent_bets,
            total_bets_count: totals.count,
            left_side_bets_amount: totals.left_amount,
            right_side_bets_amount: totals.right_amount,
        })
    }

    /// Place a bet on the active round
    pub async fn place_bet(&self, request: BetRequest) -> AppResult<BetReceipt> {
        request.validate().map_err(AppError::Validation)?;
        validate_algorand_address(&request.wallet_address)?;

        let round = self.require_active_round().await?;
        if round.id != request.round_id {
            return Err(AppError::BusinessLogic(format!(
                "Bet is for round {} but the active round is {}",
                request.round_id, round.id
            )));
        }

        let now = Utc::now();
        if round.is_decided() {
            return Err(AppError::BusinessLogic(
                "Round is already decided, waiting for it to end".to_string(),
            ));
        }
        if !round.accepts_bets_at(now) {
            return Err(AppError::BusinessLogic("Round deadline has passed".to_string()));
        }

        let processed = self.verify_payment(&request).await?;

        let impact = match self.fixed_impact_factor {
            Some(factor) => bet_impact(request.amount, &request.spell, factor),
            None => calculate_bet_impact(request.amount, &request.spell, &mut rand::thread_rng()),
        };
        let effect = bet_effect(request.side, impact, self.config.bet_time_extension(), now);

        let new_bet = NewBet {
            round_id: round.id,
            side: request.side,
            amount: request.amount,
            spell: request.spell.trim().to_string(),
            wallet_address: request.wallet_address.trim().to_string(),
            impact,
            processed,
            tx_id: request.tx_id.clone(),
            timestamp: now,
        };

        let (bet, updated) = self.store.record_bet(&new_bet, &effect).await?;

        info!(
            round_id = updated.id,
            bet_id = bet.id,
            side = %bet.side,
            impact,
            momentum = updated.momentum,
            "bet placed"
        );

        if let Some(renderer) = &self.renderer {
            renderer.spawn_render(updated.id, None);
        }

        Ok(BetReceipt {
            success: true,
            bet,
            impact,
            new_momentum: updated.momentum,
            new_deadline: updated.current_deadline,
            message: "Bet placed successfully!".to_string(),
        })
    }

    /// `true` when the bet's payment transaction was verified
    async fn verify_payment(&self, request: &BetRequest) -> AppResult<bool> {
        let (Some(tx_id), Some(verifier)) = (&request.tx_id, &self.payment_verifier) else {
            return Ok(false);
        };

        let amount = request.amount.to_f64().unwrap_or(0.0);
        if verifier
            .verify_bet_transaction(tx_id, &request.wallet_address, amount)
            .await?
        {
            Ok(true)
        } else {
            warn!(tx_id = %tx_id, wallet = %request.wallet_address, "bet transaction failed verification");
            Err(AppError::Validation(format!(
                "Transaction {} could not be verified",
                tx_id
            )))
        }
    }

    async fn open_round(&self, left_user: TwitterUser, right_user: TwitterUser, momentum: i32) -> AppResult<Round> {
        let now = Utc::now();
        let deactivated = self.store.deactivate_active_rounds(now).await?;
        if deactivated > 0 {
            info!(deactivated, "deactivated previous active rounds");
        }

        let (current_deadline, max_deadline) =
            initial_deadlines(now, self.config.inactivity_timeout(), self.config.max_round_duration());

        let round = self
            .store
            .create_round(&NewRound {
                left_user,
                right_user,
                momentum,
                start_time: now,
                current_deadline,
                max_deadline,
            })
            .await?;

        info!(round_id = round.id, momentum = round.momentum, "new round started");
        Ok(round)
    }

    /// Replace the active round with a fresh one between generic players
    pub async fn reset(&self, request: AdminResetRequest) -> AppResult<ResetResponse> {
        request.validate().map_err(AppError::Validation)?;

        let round = self
            .open_round(
                TwitterUser::new("Left Player", request.left_avatar_url, None),
                TwitterUser::new("Right Player", request.right_avatar_url, None),
                request.initial_momentum,
            )
            .await?;

        Ok(ResetResponse {
            success: true,
            round,
            message: "New round started successfully!".to_string(),
        })
    }

    /// Start a game between two named players and render its opening image
    pub async fn start_game(&self, request: StartGameRequest) -> AppResult<Round> {
        request.validate().map_err(AppError::Validation)?;

        let round = self
            .open_round(
                TwitterUser::new(
                    request.left_player_handle.trim(),
                    request.left_player_avatar_url,
                    request.left_player_display_name,
                ),
                TwitterUser::new(
                    request.right_player_handle.trim(),
                    request.right_player_avatar_url,
                    request.right_player_display_name,
                ),
                request.initial_momentum,
            )
            .await?;

        if let Some(renderer) = &self.renderer {
            let spell = request
                .initial_spell_prompt
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_SPELL);
            renderer.spawn_render(round.id, Some(opening_prompt(&round, spell)));
        }

        Ok(round)
    }

    /// Finished rounds, newest first
    pub async fn past_rounds(&self, limit: i64, offset: i64) -> AppResult<Vec<Round>> {
        Ok(self.store.past_rounds(limit, offset).await?)
    }

    /// Bets of a round, newest first
    pub async fn round_bets(&self, round_id: i64, limit: i64, offset: i64) -> AppResult<Vec<Bet>> {
        if self.store.round_by_id(round_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Round {} not found", round_id)));
        }
        Ok(self.store.bets_for_round(round_id, Some(limit), offset).await?)
    }
}
