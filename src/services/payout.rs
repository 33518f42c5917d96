use crate::clients::PayoutClient;
use crate::error::AppResult;
use crate::game_logic::compute_payouts;
use crate::models::{NewPayout, Round};
use crate::store::GameStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info, warn};

/// What one payout pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PayoutRunSummary {
    /// Rounds marked paid, with or without transfers
    pub rounds_settled: usize,
    /// Rounds left unpaid after a failed transfer
    pub rounds_deferred: usize,
    pub transfers: usize,
}

/// Pays the winners of ended rounds from the hot wallet
pub struct PayoutService {
    store: Arc<dyn GameStore>,
    client: Arc<dyn PayoutClient>,
    interval: Duration,
    batch_size: i64,
    house_cut_percent: u32,
}

impl PayoutService {
    pub fn new(store: Arc<dyn GameStore>, client: Arc<dyn PayoutClient>) -> Self {
        Self {
            store,
            client,
            interval: Duration::from_secs(300),
            batch_size: 5,
            house_cut_percent: 10,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_house_cut_percent(mut self, percent: u32) -> Self {
        self.house_cut_percent = percent;
        self
    }

    /// Run forever; errors are logged and the next tick tries again
    pub async fn start(self) {
        let mut interval = time::interval(self.interval);
        info!("Payout job started, running every {:?}", self.interval);

        loop {
            interval.tick().await;

            match self.run_once().await {
                Ok(summary) if summary != PayoutRunSummary::default() => {
                    info!(?summary, "payout pass finished");
                }
                Ok(_) => {}
                Err(e) => error!("Error in payout job: {}", e),
            }
        }
    }

    /// Process one batch of ended, unpaid rounds
    pub async fn run_once(&self) -> AppResult<PayoutRunSummary> {
        let rounds = self.store.ended_unpaid_rounds(self.batch_size).await?;
        let mut summary = PayoutRunSummary::default();

        for round in rounds {
            match self.settle_round(&round).await? {
                Some(transfers) => {
                    self.store.mark_round_paid(round.id).await?;
                    summary.rounds_settled += 1;
                    summary.transfers += transfers;
                }
                None => summary.rounds_deferred += 1,
            }
        }

        Ok(summary)
    }

    /// Send every transfer still owed for a round.
    ///
    /// Returns the number of transfers sent, or `None` when one failed and
    /// the round must stay unpaid for the next pass.
    async fn settle_round(&self, round: &Round) -> AppResult<Option<usize>> {
        let bets = self.store.bets_for_round(round.id, None, 0).await?;
        let shares = compute_payouts(round.pot_amount, round.winner, &bets, self.house_cut_percent);

        if shares.is_empty() {
            warn!(
                round_id = round.id,
                winner = ?round.winner,
                bets = bets.len(),
                "no payouts owed for round, marking as paid"
            );
            return Ok(Some(0));
        }

        let already_paid: HashSet<i64> = self
            .store
            .payouts_for_round(round.id)
            .await?
            .into_iter()
            .map(|p| p.bet_id)
            .collect();

        let mut sent = 0;
        for share in shares {
            if already_paid.contains(&share.bet_id) {
                continue;
            }

            let note = format!("AlgoFOMO Round {} Payout - Bet {}", round.id, share.bet_id);
            let tx_id = match self
                .client
                .submit_payout(&share.wallet_address, share.amount_microalgos, &note)
                .await
            {
                Ok(tx_id) => tx_id,
                Err(e) => {
                    error!(
                        round_id = round.id,
                        bet_id = share.bet_id,
                        "payout failed, round will be retried: {}",
                        e
                    );
                    return Ok(None);
                }
            };

            self.store
                .record_payout(&NewPayout {
                    round_id: round.id,
                    bet_id: share.bet_id,
                    wallet_address: share.wallet_address.clone(),
                    amount_microalgos: share.amount_microalgos,
                    tx_id: tx_id.clone(),
                })
                .await?;

            info!(
                round_id = round.id,
                bet_id = share.bet_id,
                wallet = %share.wallet_address,
                amount_microalgos = share.amount_microalgos,
                tx_id = %tx_id,
                "payout sent"
            );
            sent += 1;
        }

        Ok(Some(sent))
    }
}
