//! Dashboard engine: turns one fetched snapshot into every derived view.
//!
//! Flow per refresh: normalize → filter/sort → {aggregate, classify, series}.
//! Each refresh recomputes from scratch; the engine keeps no derived state
//! between calls, so widgets sharing a snapshot can call it concurrently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::info;

use crate::analytics::edge::{
    classify_bet, classify_opportunity, ClassifiedBet, ClassifiedOpportunity, EdgeTier,
};
use crate::analytics::metrics::{aggregate_by_with, aggregate_with, AggregateStats};
use crate::analytics::series::{build_series, max_drawdown_pct, sort_chronologically, TimeSeriesPoint};
use crate::config::AnalyticsConfig;
use crate::data::normalizer::{normalize_bets, normalize_opportunities};
use crate::errors::AnalyticsError;
use crate::query::apply;
use crate::query::filter::FilterCriteria;
use crate::query::sort::SortState;
use crate::risk::stake_advisor::StakeAdvisor;

/// Raw payload as fetched from the upstream service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub bets: Vec<Value>,
    #[serde(default)]
    pub opportunities: Vec<Value>,
}

/// User selections that shape the derived views.
///
/// One criteria set drives both tables; criteria a record type has no
/// attribute for are skipped for that table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardQuery {
    pub criteria: FilterCriteria,
    pub bet_sort: Option<SortState>,
    pub opportunity_sort: Option<SortState>,
}

/// Everything the rendering layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub stats: AggregateStats,
    pub by_bookmaker: BTreeMap<String, AggregateStats>,
    pub by_category: BTreeMap<String, AggregateStats>,
    pub bets: Vec<ClassifiedBet>,
    pub opportunities: Vec<ClassifiedOpportunity>,
    pub series: Vec<TimeSeriesPoint>,
    pub max_drawdown_pct: Decimal,
    pub anomalous_opportunities: usize,
    pub skipped_bets: usize,
    pub skipped_opportunities: usize,
}

pub struct DashboardEngine {
    config: AnalyticsConfig,
    advisor: StakeAdvisor,
}

impl DashboardEngine {
    pub fn new(config: AnalyticsConfig) -> Result<Self, AnalyticsError> {
        config.edge_thresholds.validate()?;
        let advisor = StakeAdvisor::new(config.kelly_fraction_multiplier, config.max_stake_pct)?;
        Ok(Self { config, advisor })
    }

    pub fn compute_snapshot(&self, snapshot: &Snapshot, query: &DashboardQuery) -> DashboardView {
        self.compute(&snapshot.bets, &snapshot.opportunities, query)
    }

    pub fn compute(&self, raw_bets: &[Value], raw_opportunities: &[Value], query: &DashboardQuery) -> DashboardView {
        let bet_batch = normalize_bets(raw_bets);
        let opportunity_batch = normalize_opportunities(raw_opportunities);

        let bets = apply(&bet_batch.records, &query.criteria, query.bet_sort);

        let clv_threshold = self.config.clv_positive_threshold;
        let stats = aggregate_with(&bets, clv_threshold);
        let by_bookmaker = aggregate_by_with(&bets, clv_threshold, |b| b.bookmaker.clone());
        let by_category = aggregate_by_with(&bets, clv_threshold, |b| b.category.clone());

        let series = build_series(&sort_chronologically(&bets), self.config.starting_bankroll);
        let max_drawdown = max_drawdown_pct(&series);

        let classified: Vec<ClassifiedOpportunity> = opportunity_batch
            .records
            .iter()
            .map(|o| {
                classify_opportunity(
                    o,
                    &self.config.edge_thresholds,
                    self.config.spread_anomaly_threshold,
                    &self.advisor,
                    self.config.starting_bankroll,
                )
            })
            .collect();
        let opportunities = apply(&classified, &query.criteria, query.opportunity_sort);
        let anomalous = opportunities.iter().filter(|o| o.anomalous).count();
        let classified_bets: Vec<ClassifiedBet> =
            bets.iter().map(|b| classify_bet(b, clv_threshold)).collect();

        info!(
            bets = bets.len(),
            settled = stats.settled,
            win_rate = ?stats.win_rate,
            roi = ?stats.roi,
            total_profit = %stats.total_profit,
            opportunities = opportunities.len(),
            high_edge = opportunities.iter().filter(|o| o.tier == EdgeTier::High).count(),
            anomalous,
            skipped_bets = bet_batch.skipped,
            skipped_opportunities = opportunity_batch.skipped,
            "Dashboard recomputed"
        );

        DashboardView {
            stats,
            by_bookmaker,
            by_category,
            bets: classified_bets,
            opportunities,
            series,
            max_drawdown_pct: max_drawdown,
            anomalous_opportunities: anomalous,
            skipped_bets: bet_batch.skipped,
            skipped_opportunities: opportunity_batch.skipped,
        }
    }
}
