//! Running bankroll series for charting.
//!
//! `build_series` does not sort. Input must already be ordered by
//! `created_at` ascending; out-of-order input yields a misleading curve, not
//! an error. Callers that cannot guarantee order use `sort_chronologically`
//! first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::data::models::BetRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub index: usize,
    /// RFC 3339 timestamp, or the bet id for undated records.
    pub label: String,
    pub bankroll: Decimal,
    pub cumulative_profit: Decimal,
    /// Running ROI over settled stake so far; `None` until a bet settles.
    pub roi: Option<Decimal>,
    /// Percent below the running bankroll peak (starting bankroll included).
    pub drawdown_pct: Decimal,
}

/// One point per bet: `previous + (actual_profit ?? 0)`, seeded with
/// `starting_bankroll`. Arithmetic saturates at `Decimal`'s bounds rather
/// than panicking.
pub fn build_series(bets: &[BetRecord], starting_bankroll: Decimal) -> Vec<TimeSeriesPoint> {
    let mut bankroll = starting_bankroll;
    let mut peak = starting_bankroll;
    let mut settled_stake = Decimal::ZERO;
    let mut settled_profit = Decimal::ZERO;

    bets.iter()
        .enumerate()
        .map(|(index, bet)| {
            let profit = bet.actual_profit.unwrap_or(Decimal::ZERO);
            bankroll = bankroll.saturating_add(profit);
            if bet.is_settled() {
                settled_stake = settled_stake.saturating_add(bet.stake);
                settled_profit = settled_profit.saturating_add(bet.realized_profit());
            }
            peak = peak.max(bankroll);

            let drawdown_pct = if peak > Decimal::ZERO {
                // Only a bankroll far below zero can push this out of range.
                peak.saturating_sub(bankroll)
                    .checked_div(peak)
                    .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
                    .unwrap_or(Decimal::MAX)
            } else {
                Decimal::ZERO
            };
            let roi = settled_profit
                .checked_div(settled_stake)
                .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED));

            TimeSeriesPoint {
                index,
                label: label(bet),
                bankroll,
                cumulative_profit: bankroll.saturating_sub(starting_bankroll),
                roi,
                drawdown_pct,
            }
        })
        .collect()
}

/// Largest drawdown seen anywhere in the series, in percent.
pub fn max_drawdown_pct(series: &[TimeSeriesPoint]) -> Decimal {
    series
        .iter()
        .map(|p| p.drawdown_pct)
        .max()
        .unwrap_or(Decimal::ZERO)
}

/// Stable chronological order; undated bets keep their relative order at the end.
pub fn sort_chronologically(bets: &[BetRecord]) -> Vec<BetRecord> {
    let mut sorted = bets.to_vec();
    sorted.sort_by_key(|b| (b.created_at.is_none(), b.created_at));
    sorted
}

fn label(bet: &BetRecord) -> String {
    bet.created_at
        .map(|t: DateTime<Utc>| t.to_rfc3339())
        .unwrap_or_else(|| bet.id.clone())
}
