//! Edge tiers, CLV bands and cross-bookmaker spread flags.
//!
//! Breakpoints are configuration, not constants: dashboard views disagree on
//! them (10/15, 10/20, ...) so every classifier takes its thresholds from the
//! caller. All boundaries are inclusive on the lower bound.
//!
//! `is_anomalous` is a plain threshold test on the spread percentage. It is
//! not a statistical outlier model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::models::{BetRecord, BookmakerQuote, OpportunityRecord};
use crate::errors::AnalyticsError;
use crate::risk::stake_advisor::{implied_probability, StakeAdvisor};

/// Default spread (percent) above which quotes are flagged.
pub const DEFAULT_SPREAD_THRESHOLD: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeTier {
    Low,
    Medium,
    High,
}

impl fmt::Display for EdgeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Edge breakpoints in percent: `< low` is LOW, `[low, high)` MEDIUM,
/// `>= high` HIGH.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeThresholds {
    pub low: Decimal,
    pub high: Decimal,
}

impl EdgeThresholds {
    pub fn new(low: Decimal, high: Decimal) -> Result<Self, AnalyticsError> {
        let thresholds = Self { low, high };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.low > self.high {
            return Err(AnalyticsError::InvalidThresholds {
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }

    pub fn classify(&self, edge_pct: Decimal) -> EdgeTier {
        if edge_pct >= self.high {
            EdgeTier::High
        } else if edge_pct >= self.low {
            EdgeTier::Medium
        } else {
            EdgeTier::Low
        }
    }
}

impl Default for EdgeThresholds {
    fn default() -> Self {
        Self {
            low: Decimal::new(10, 0),
            high: Decimal::new(15, 0),
        }
    }
}

/// Classify an edge percentage with the default 10/15 breakpoints.
pub fn classify(edge_pct: Decimal) -> EdgeTier {
    EdgeThresholds::default().classify(edge_pct)
}

/// Threshold test on a cross-bookmaker spread percentage.
pub fn is_anomalous(spread_pct: Decimal, threshold: Decimal) -> bool {
    spread_pct >= threshold
}

/// Percentage spread between the best and worst quote: (max - min) / min * 100.
///
/// Only quotes above 1.0 are usable, the same rule as for `best_odds`.
/// `None` with fewer than two usable quotes, or when the ratio does not fit
/// in a `Decimal`.
pub fn spread_pct(quotes: &[BookmakerQuote]) -> Option<Decimal> {
    let odds: Vec<Decimal> = quotes
        .iter()
        .map(|q| q.odds)
        .filter(|o| *o > Decimal::ONE)
        .collect();
    if odds.len() < 2 {
        return None;
    }
    let min = odds.iter().copied().min()?;
    let max = odds.iter().copied().max()?;
    max.checked_sub(min)?
        .checked_div(min)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

// =============================================================================
// CLV bands
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClvBand {
    Negative,
    Neutral,
    Positive,
}

/// Band a CLV percentage: below 0 is negative, at or above
/// `positive_threshold` is positive, anything between is neutral.
pub fn classify_clv(clv_pct: Decimal, positive_threshold: Decimal) -> ClvBand {
    if clv_pct < Decimal::ZERO {
        ClvBand::Negative
    } else if clv_pct >= positive_threshold {
        ClvBand::Positive
    } else {
        ClvBand::Neutral
    }
}

/// A bet row annotated with its CLV band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedBet {
    pub record: BetRecord,
    /// `None` when the bet carries no CLV.
    pub clv_band: Option<ClvBand>,
}

pub fn classify_bet(bet: &BetRecord, positive_threshold: Decimal) -> ClassifiedBet {
    ClassifiedBet {
        record: bet.clone(),
        clv_band: bet.clv_pct.map(|clv| classify_clv(clv, positive_threshold)),
    }
}

// =============================================================================
// Opportunity annotation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedOpportunity {
    pub record: OpportunityRecord,
    pub tier: EdgeTier,
    pub spread_pct: Option<Decimal>,
    pub anomalous: bool,
    /// Fractional-Kelly stake as percent of bankroll; `None` when the
    /// opportunity's odds cannot be sized.
    pub recommended_stake_pct: Option<Decimal>,
    /// The same stake in currency for the given bankroll.
    pub recommended_amount: Option<Decimal>,
}

/// Tier, spread-check and size one opportunity against `bankroll`.
pub fn classify_opportunity(
    opportunity: &OpportunityRecord,
    thresholds: &EdgeThresholds,
    spread_threshold: Decimal,
    advisor: &StakeAdvisor,
    bankroll: Decimal,
) -> ClassifiedOpportunity {
    let spread = spread_pct(&opportunity.quotes);
    let advice = implied_probability(opportunity.edge_pct, opportunity.best_odds)
        .and_then(|p| advisor.advise(p, opportunity.best_odds, bankroll))
        .ok();

    ClassifiedOpportunity {
        record: opportunity.clone(),
        tier: thresholds.classify(opportunity.edge_pct),
        spread_pct: spread,
        anomalous: spread.map_or(false, |s| is_anomalous(s, spread_threshold)),
        recommended_stake_pct: advice.as_ref().map(|a| a.recommended_pct),
        recommended_amount: advice.map(|a| a.recommended_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(bookmaker: &str, odds: Decimal) -> BookmakerQuote {
        BookmakerQuote {
            bookmaker: bookmaker.to_string(),
            odds,
        }
    }

    #[test]
    fn test_default_breakpoints_are_lower_inclusive() {
        assert_eq!(classify(Decimal::new(99, 1)), EdgeTier::Low);
        assert_eq!(classify(Decimal::new(100, 1)), EdgeTier::Medium);
        assert_eq!(classify(Decimal::new(1499, 2)), EdgeTier::Medium);
        assert_eq!(classify(Decimal::new(15, 0)), EdgeTier::High);
        assert_eq!(classify(Decimal::new(-3, 0)), EdgeTier::Low);
    }

    #[test]
    fn test_thresholds_are_overridable() {
        let wide = EdgeThresholds::new(Decimal::new(10, 0), Decimal::new(20, 0)).unwrap();
        assert_eq!(wide.classify(Decimal::new(17, 0)), EdgeTier::Medium);
        assert_eq!(wide.classify(Decimal::new(20, 0)), EdgeTier::High);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let err = EdgeThresholds::new(Decimal::new(20, 0), Decimal::new(10, 0)).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidThresholds { .. }));
    }

    #[test]
    fn test_spread_needs_two_quotes() {
        assert_eq!(spread_pct(&[]), None);
        assert_eq!(spread_pct(&[quote("a", Decimal::new(2, 0))]), None);
        // (2.20 - 2.00) / 2.00 * 100 = 10
        let spread = spread_pct(&[
            quote("a", Decimal::new(200, 2)),
            quote("b", Decimal::new(220, 2)),
            quote("c", Decimal::new(210, 2)),
        ]);
        assert_eq!(spread, Some(Decimal::new(10, 0)));
        assert!(is_anomalous(spread.unwrap(), DEFAULT_SPREAD_THRESHOLD));
        assert!(!is_anomalous(Decimal::new(999, 2), DEFAULT_SPREAD_THRESHOLD));
    }

    #[test]
    fn test_spread_ignores_quotes_at_or_below_even() {
        // A near-zero quote used to overflow the percentage multiply.
        let tiny = Decimal::from_parts(1, 0, 0, false, 28);
        assert_eq!(spread_pct(&[quote("x", tiny), quote("y", Decimal::new(2, 0))]), None);
        assert_eq!(
            spread_pct(&[quote("x", Decimal::ONE), quote("y", Decimal::new(2, 0))]),
            None
        );
    }

    #[test]
    fn test_spread_overflow_is_none() {
        // 1.0000000000000000000000000001 vs Decimal::MAX: the ratio alone
        // exceeds the representable range.
        let barely = Decimal::from_parts(1, 0, 0, false, 28) + Decimal::ONE;
        assert_eq!(
            spread_pct(&[quote("x", barely), quote("y", Decimal::MAX)]),
            None
        );
    }

    #[test]
    fn test_clv_bands() {
        let two = Decimal::new(2, 0);
        assert_eq!(classify_clv(Decimal::new(-1, 1), two), ClvBand::Negative);
        assert_eq!(classify_clv(Decimal::ZERO, two), ClvBand::Neutral);
        assert_eq!(classify_clv(two, two), ClvBand::Positive);
    }

    #[test]
    fn test_bet_band_uses_configured_threshold() {
        let bet = BetRecord {
            id: "b1".to_string(),
            match_name: "A vs B".to_string(),
            sport: None,
            bookmaker: None,
            outcome: None,
            odds: Decimal::new(2, 0),
            stake: Decimal::new(10, 0),
            category: None,
            result: None,
            actual_profit: None,
            clv_pct: Some(Decimal::new(15, 1)),
            created_at: None,
        };
        assert_eq!(classify_bet(&bet, Decimal::new(2, 0)).clv_band, Some(ClvBand::Neutral));
        assert_eq!(classify_bet(&bet, Decimal::ONE).clv_band, Some(ClvBand::Positive));

        let no_clv = BetRecord { clv_pct: None, ..bet };
        assert_eq!(classify_bet(&no_clv, Decimal::ONE).clv_band, None);
    }
}
