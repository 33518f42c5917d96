//! Pure round rules: bet impact, momentum, deadlines, round end and payouts.
//!
//! Nothing here touches storage or the clock; callers pass `now` explicitly.

use crate::models::{
    Bet, BetEffect, Round, Side, Winner, MAX_BET_AMOUNT, MOMENTUM_MAX, MOMENTUM_MIN, MOMENTUM_NEUTRAL,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

/// Bounds of the random per-bet impact factor
pub const IMPACT_FACTOR_MIN: f64 = 0.8;
pub const IMPACT_FACTOR_MAX: f64 = 1.2;

/// Upper bound of a single bet's impact
pub const MAX_IMPACT: f64 = 10.0;

pub const END_REASON_MOMENTUM: &str = "momentum";
pub const END_REASON_MAX_DURATION: &str = "max_duration";
pub const END_REASON_INACTIVITY: &str = "inactivity";

/// Impact of a bet for a given random factor.
///
/// `log10(max(1, amount)) * clamp(words / 10, 0.5, 1.5) * factor`, clamped to
/// `[0, 10]` and rounded to four decimals. Non-positive amounts have no impact.
pub fn bet_impact(amount: Decimal, spell: &str, factor: f64) -> f64 {
    if amount <= Decimal::ZERO {
        return 0.0;
    }

    let amount = amount.to_f64().unwrap_or(0.0).max(1.0);
    let words = spell.split_whitespace().count() as f64;
    let spell_multiplier = (words / 10.0).clamp(0.5, 1.5);

    let impact = (amount.log10() * spell_multiplier * factor).clamp(0.0, MAX_IMPACT);
    (impact * 10_000.0).round() / 10_000.0
}

/// Impact with a factor drawn uniformly from `[0.8, 1.2]`
pub fn calculate_bet_impact<R: Rng + ?Sized>(amount: Decimal, spell: &str, rng: &mut R) -> f64 {
    let factor = rng.gen_range(IMPACT_FACTOR_MIN..=IMPACT_FACTOR_MAX);
    bet_impact(amount, spell, factor)
}

/// Whole momentum points an impact is worth, rounded half away from zero
pub fn momentum_shift(impact: f64) -> i32 {
    impact.round() as i32
}

/// Signed momentum change; left bets pull toward 0
fn signed_shift(side: Side, impact: f64) -> i32 {
    match side {
        Side::Left => -momentum_shift(impact),
        Side::Right => momentum_shift(impact),
    }
}

/// Momentum after a bet, clamped to `[0, 100]`
pub fn apply_bet(momentum: i32, side: Side, impact: f64) -> i32 {
    (momentum + signed_shift(side, impact)).clamp(MOMENTUM_MIN, MOMENTUM_MAX)
}

/// Push the inactivity deadline out, never past the hard limit
pub fn extend_deadline(
    current_deadline: DateTime<Utc>,
    max_deadline: DateTime<Utc>,
    extension: Duration,
) -> DateTime<Utc> {
    (current_deadline + extension).min(max_deadline)
}

/// Deadlines for a round starting at `now`: `(current_deadline, max_deadline)`
pub fn initial_deadlines(
    now: DateTime<Utc>,
    inactivity_timeout: Duration,
    max_duration: Duration,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let max_deadline = now + max_duration;
    ((now + inactivity_timeout).min(max_deadline), max_deadline)
}

/// Effect a bet will have on its round
pub fn bet_effect(side: Side, impact: f64, extension: Duration, placed_at: DateTime<Utc>) -> BetEffect {
    BetEffect {
        momentum_delta: signed_shift(side, impact),
        deadline_extension: extension,
        placed_at,
    }
}

/// Apply a recorded bet to a round: momentum, pot and deadline.
///
/// The pot shares the bet amount's upper bound; a bet that would push it
/// past that leaves the round untouched.
pub fn apply_effect(round: &mut Round, amount: Decimal, effect: &BetEffect) -> Result<(), String> {
    let pot_amount = round
        .pot_amount
        .checked_add(amount)
        .filter(|pot| *pot <= MAX_BET_AMOUNT)
        .ok_or_else(|| format!("Round {} pot cannot exceed {}", round.id, MAX_BET_AMOUNT))?;

    round.momentum = (round.momentum + effect.momentum_delta).clamp(MOMENTUM_MIN, MOMENTUM_MAX);
    round.pot_amount = pot_amount;
    round.current_deadline = extend_deadline(round.current_deadline, round.max_deadline, effect.deadline_extension);
    Ok(())
}

/// Why and how a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub winner: Winner,
    pub reason: &'static str,
}

/// Winner by distance from the neutral point
fn proximity_winner(momentum: i32) -> Winner {
    match momentum.cmp(&MOMENTUM_NEUTRAL) {
        std::cmp::Ordering::Less => Winner::Left,
        std::cmp::Ordering::Greater => Winner::Right,
        std::cmp::Ordering::Equal => Winner::Draw,
    }
}

/// Decide whether a round has ended at `now`.
///
/// Momentum at an edge wins outright; otherwise the hard limit is checked
/// before the inactivity deadline.
pub fn evaluate_round_end(round: &Round, now: DateTime<Utc>) -> Option<RoundOutcome> {
    if round.momentum <= MOMENTUM_MIN {
        return Some(RoundOutcome {
            winner: Winner::Left,
            reason: END_REASON_MOMENTUM,
        });
    }
    if round.momentum >= MOMENTUM_MAX {
        return Some(RoundOutcome {
            winner: Winner::Right,
            reason: END_REASON_MOMENTUM,
        });
    }
    if now >= round.max_deadline {
        return Some(RoundOutcome {
            winner: proximity_winner(round.momentum),
            reason: END_REASON_MAX_DURATION,
        });
    }
    if now >= round.current_deadline {
        return Some(RoundOutcome {
            winner: proximity_winner(round.momentum),
            reason: END_REASON_INACTIVITY,
        });
    }
    None
}

/// One transfer owed to a winning bet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutShare {
    pub bet_id: i64,
    pub wallet_address: String,
    pub amount_microalgos: i64,
}

/// Convert ALGO to microAlgos, rounding half up; 0 when out of range
pub fn to_microalgos(algos: Decimal) -> i64 {
    algos
        .checked_mul(Decimal::from(crate::models::MICROALGOS_PER_ALGO))
        .and_then(|micro| {
            micro
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
        })
        .unwrap_or(0)
}

/// `winners_pot * stake / total_winning`, dividing first when the product overflows
fn proportional_share(winners_pot: Decimal, stake: Decimal, total_winning: Decimal) -> Option<Decimal> {
    winners_pot
        .checked_mul(stake)
        .and_then(|product| product.checked_div(total_winning))
        .or_else(|| {
            stake
                .checked_div(total_winning)
                .and_then(|ratio| ratio.checked_mul(winners_pot))
        })
}

/// Split the pot among bets on the winning side in proportion to their stake.
///
/// The house keeps `house_cut_percent` of the pot. Draws, rounds without a
/// winner, rounds without winning bets and shares that round to zero yield
/// no transfers.
pub fn compute_payouts(
    pot: Decimal,
    winner: Option<Winner>,
    bets: &[Bet],
    house_cut_percent: u32,
) -> Vec<PayoutShare> {
    let Some(winning_side) = winner.and_then(|w| w.side()) else {
        return Vec::new();
    };

    let winning_bets: Vec<&Bet> = bets.iter().filter(|b| b.side == winning_side).collect();
    let Some(total_winning) = winning_bets
        .iter()
        .try_fold(Decimal::ZERO, |total, bet| total.checked_add(bet.amount))
    else {
        warn!(bets = winning_bets.len(), "winning stakes overflow, no payouts computed");
        return Vec::new();
    };
    if winning_bets.is_empty() || total_winning <= Decimal::ZERO {
        return Vec::new();
    }

    let keep = Decimal::ONE - Decimal::from(house_cut_percent.min(100)) / Decimal::ONE_HUNDRED;
    let winners_pot = pot * keep;

    winning_bets
        .into_iter()
        .filter_map(|bet| {
            let Some(share) = proportional_share(winners_pot, bet.amount, total_winning) else {
                warn!(bet_id = bet.id, amount = %bet.amount, "payout share overflows, skipping");
                return None;
            };
            let amount_microalgos = to_microalgos(share);
            (amount_microalgos > 0).then(|| PayoutShare {
                bet_id: bet.id,
                wallet_address: bet.wallet_address.clone(),
                amount_microalgos,
            })
        })
        .collect()
}
