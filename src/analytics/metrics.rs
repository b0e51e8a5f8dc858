//! Aggregate performance statistics over normalized bets.
//!
//! Rates are `None` when their denominator is zero. A 0% win rate means
//! "every settled bet lost", which is a different statement from "nothing
//! has settled yet", so the two are never conflated.
//!
//! All sums are exact decimal additions, so the result does not depend on
//! input order. Normalized records are bounded by `MAX_MAGNITUDE`, which
//! keeps the sums exact; records built by hand beyond that saturate instead
//! of overflowing.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytics::edge::{classify_clv, ClvBand};
use crate::data::models::BetRecord;

/// CLV percent at which a bet counts as `Positive` when no threshold is given.
pub const DEFAULT_CLV_POSITIVE_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Immutable summary of a bet collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total: usize,
    pub settled: usize,
    pub pending: usize,
    pub wins: usize,
    pub losses: usize,
    /// wins / settled * 100.
    pub win_rate: Option<Decimal>,
    /// Stake over settled bets (the ROI denominator).
    pub total_stake: Decimal,
    pub total_profit: Decimal,
    /// total_profit / total_stake * 100.
    pub roi: Option<Decimal>,
    /// Stake still at risk on unsettled bets.
    pub pending_stake: Decimal,
    pub avg_odds: Option<Decimal>,
    pub avg_clv: Option<Decimal>,
    /// Share of bets with CLV data whose CLV is above zero, in percent.
    pub positive_clv_rate: Option<Decimal>,
    /// Share of bets with CLV data in the `Positive` band, in percent.
    pub strong_clv_rate: Option<Decimal>,
    pub best_win: Option<Decimal>,
    pub worst_loss: Option<Decimal>,
}

impl AggregateStats {
    pub fn empty() -> Self {
        Self {
            total: 0,
            settled: 0,
            pending: 0,
            wins: 0,
            losses: 0,
            win_rate: None,
            total_stake: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            roi: None,
            pending_stake: Decimal::ZERO,
            avg_odds: None,
            avg_clv: None,
            positive_clv_rate: None,
            strong_clv_rate: None,
            best_win: None,
            worst_loss: None,
        }
    }
}

/// Compute summary statistics for a set of bets, banding CLV with the
/// default threshold.
pub fn aggregate(bets: &[BetRecord]) -> AggregateStats {
    aggregate_with(bets, DEFAULT_CLV_POSITIVE_THRESHOLD)
}

/// Compute summary statistics; `clv_positive_threshold` sets the lower bound
/// of the `Positive` CLV band used for `strong_clv_rate`.
pub fn aggregate_with(bets: &[BetRecord], clv_positive_threshold: Decimal) -> AggregateStats {
    let mut stats = AggregateStats::empty();
    stats.total = bets.len();

    let mut settled_odds = Decimal::ZERO;
    let mut clv_sum = Decimal::ZERO;
    let mut clv_count = 0usize;
    let mut clv_positive = 0usize;
    let mut clv_strong = 0usize;

    for bet in bets {
        if let Some(clv) = bet.clv_pct {
            clv_sum = clv_sum.saturating_add(clv);
            clv_count += 1;
            if clv > Decimal::ZERO {
                clv_positive += 1;
            }
            if classify_clv(clv, clv_positive_threshold) == ClvBand::Positive {
                clv_strong += 1;
            }
        }

        if !bet.is_settled() {
            stats.pending += 1;
            stats.pending_stake = stats.pending_stake.saturating_add(bet.stake);
            continue;
        }

        let profit = bet.realized_profit();
        stats.settled += 1;
        stats.total_stake = stats.total_stake.saturating_add(bet.stake);
        stats.total_profit = stats.total_profit.saturating_add(profit);
        settled_odds = settled_odds.saturating_add(bet.odds);

        if bet.is_won() {
            stats.wins += 1;
            stats.best_win = Some(stats.best_win.map_or(profit, |b| b.max(profit)));
        } else {
            stats.losses += 1;
            stats.worst_loss = Some(stats.worst_loss.map_or(profit, |w| w.min(profit)));
        }
    }

    stats.win_rate = percentage(Decimal::from(stats.wins), Decimal::from(stats.settled));
    stats.roi = percentage(stats.total_profit, stats.total_stake);
    stats.avg_odds = ratio(settled_odds, Decimal::from(stats.settled));
    stats.avg_clv = ratio(clv_sum, Decimal::from(clv_count));
    stats.positive_clv_rate = percentage(Decimal::from(clv_positive), Decimal::from(clv_count));
    stats.strong_clv_rate = percentage(Decimal::from(clv_strong), Decimal::from(clv_count));
    stats
}

/// Aggregate per group, e.g. per bookmaker or per bet category.
///
/// Bets for which `key` returns `None` are left out.
pub fn aggregate_by<F>(bets: &[BetRecord], key: F) -> BTreeMap<String, AggregateStats>
where
    F: Fn(&BetRecord) -> Option<String>,
{
    aggregate_by_with(bets, DEFAULT_CLV_POSITIVE_THRESHOLD, key)
}

pub fn aggregate_by_with<F>(
    bets: &[BetRecord],
    clv_positive_threshold: Decimal,
    key: F,
) -> BTreeMap<String, AggregateStats>
where
    F: Fn(&BetRecord) -> Option<String>,
{
    let mut groups: BTreeMap<String, Vec<BetRecord>> = BTreeMap::new();
    for bet in bets {
        if let Some(k) = key(bet) {
            groups.entry(k).or_default().push(bet.clone());
        }
    }
    groups
        .into_iter()
        .map(|(k, group)| (k, aggregate_with(&group, clv_positive_threshold)))
        .collect()
}

/// `None` for a zero denominator or a quotient outside `Decimal`'s range.
fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

fn percentage(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    ratio(numerator, denominator)?.checked_mul(Decimal::ONE_HUNDRED)
}
