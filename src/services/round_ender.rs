use crate::error::AppResult;
use crate::game_logic::evaluate_round_end;
use crate::models::Round;
use crate::store::GameStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

/// Periodically closes the active round once an end condition holds
pub struct RoundEnder {
    store: Arc<dyn GameStore>,
    interval: Duration,
}

impl RoundEnder {
    /// Create a new round ender
    ///
    /// # Arguments
    /// * `store` - Game storage
    /// * `interval` - How often to check (default: 60 seconds)
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            interval: Duration::from_secs(60),
        }
    }

    /// Set check interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run forever; errors are logged and the next tick tries again
    pub async fn start(self) {
        let mut interval = time::interval(self.interval);
        info!("Round ender started, checking every {:?}", self.interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.run_once().await {
                error!("Error in round ender: {}", e);
            }
        }
    }

    /// Check the active round now
    pub async fn run_once(&self) -> AppResult<Option<Round>> {
        self.run_at(Utc::now()).await
    }

    /// Check the active round as of `now`; returns the round if it was ended
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<Option<Round>> {
        let Some(round) = self.store.active_round().await? else {
            debug!("no active round to check");
            return Ok(None);
        };

        let Some(outcome) = evaluate_round_end(&round, now) else {
            debug!(round_id = round.id, momentum = round.momentum, "round still running");
            return Ok(None);
        };

        match self
            .store
            .end_round(round.id, outcome.winner, outcome.reason, now)
            .await?
        {
            Some(ended) => {
                info!(
                    round_id = ended.id,
                    winner = %outcome.winner,
                    reason = outcome.reason,
                    momentum = ended.momentum,
                    "round ended"
                );
                Ok(Some(ended))
            }
            None => {
                // Closed concurrently, e.g. by an admin reset
                debug!(round_id = round.id, "round was already closed");
                Ok(None)
            }
        }
    }
}
