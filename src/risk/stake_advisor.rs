//! Kelly Criterion stake sizing for decimal-odds bets.
//!
//! For decimal odds O, a winning unit stake returns O, so the net-odds ratio is:
//!     b = O - 1
//!
//! Full Kelly fraction:
//!     f* = (p*b - q) / b,  q = 1 - p
//!
//! We apply:
//! - Fractional Kelly (e.g., 0.25 for quarter Kelly)
//! - Clamp at 0 (a negative edge never produces a negative stake)
//! - Optional cap at max_stake_pct of bankroll

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::errors::AnalyticsError;

/// Quarter Kelly.
pub const DEFAULT_KELLY_FRACTION: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Recommended stake as a percentage of bankroll.
///
/// `edge_probability` is the estimated true win probability in [0, 1] and
/// `kelly_fraction` must be in (0, 1]. Odds at or below 1 are a caller bug and
/// return `InvalidOdds` instead of dividing by zero.
pub fn recommended_stake(
    edge_probability: Decimal,
    decimal_odds: Decimal,
    kelly_fraction: Decimal,
) -> Result<Decimal, AnalyticsError> {
    let kelly_full = full_kelly(edge_probability, decimal_odds)?;
    check_fraction(kelly_fraction)?;
    Ok((kelly_full * kelly_fraction).max(Decimal::ZERO) * Decimal::ONE_HUNDRED)
}

/// Unscaled Kelly fraction (may be negative).
pub fn full_kelly(edge_probability: Decimal, decimal_odds: Decimal) -> Result<Decimal, AnalyticsError> {
    if decimal_odds <= Decimal::ONE {
        return Err(AnalyticsError::InvalidOdds { odds: decimal_odds });
    }
    if edge_probability < Decimal::ZERO || edge_probability > Decimal::ONE {
        return Err(AnalyticsError::InvalidProbability {
            probability: edge_probability,
        });
    }

    let p = edge_probability;
    let q = Decimal::ONE - p;
    let b = decimal_odds - Decimal::ONE;

    Ok((p * b - q) / b)
}

/// Win probability implied by an edge over fair odds.
///
/// edge = odds / fair_odds - 1, so p = 1 / fair_odds = (1 + edge) / odds.
/// Clamped to [0, 1].
pub fn implied_probability(edge_pct: Decimal, decimal_odds: Decimal) -> Result<Decimal, AnalyticsError> {
    if decimal_odds <= Decimal::ONE {
        return Err(AnalyticsError::InvalidOdds { odds: decimal_odds });
    }
    let p = (Decimal::ONE + edge_pct / Decimal::ONE_HUNDRED) / decimal_odds;
    Ok(p.max(Decimal::ZERO).min(Decimal::ONE))
}

fn check_fraction(kelly_fraction: Decimal) -> Result<(), AnalyticsError> {
    if kelly_fraction <= Decimal::ZERO || kelly_fraction > Decimal::ONE {
        return Err(AnalyticsError::InvalidKellyFraction {
            fraction: kelly_fraction,
        });
    }
    Ok(())
}

/// Result of a sizing calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StakeAdvice {
    /// Expected value per unit staked: p * odds - 1.
    pub edge: Decimal,
    /// Full Kelly fraction before scaling.
    pub kelly_full: Decimal,
    /// Percentage of bankroll after fractional Kelly and the cap.
    pub recommended_pct: Decimal,
    /// Currency amount to stake.
    pub recommended_amount: Decimal,
}

/// Fractional Kelly stake advisor with a per-bet cap.
#[derive(Debug, Clone)]
pub struct StakeAdvisor {
    kelly_fraction: Decimal,
    /// Cap as a percentage of bankroll (5 means 5%).
    max_stake_pct: Decimal,
}

impl StakeAdvisor {
    pub fn new(kelly_fraction: Decimal, max_stake_pct: Decimal) -> Result<Self, AnalyticsError> {
        check_fraction(kelly_fraction)?;
        Ok(Self {
            kelly_fraction,
            max_stake_pct: max_stake_pct.max(Decimal::ZERO),
        })
    }

    /// Size a bet against the given bankroll.
    pub fn advise(
        &self,
        edge_probability: Decimal,
        decimal_odds: Decimal,
        bankroll: Decimal,
    ) -> Result<StakeAdvice, AnalyticsError> {
        let kelly_full = full_kelly(edge_probability, decimal_odds)?;
        let uncapped = recommended_stake(edge_probability, decimal_odds, self.kelly_fraction)?;
        let recommended_pct = uncapped.min(self.max_stake_pct);

        if recommended_pct < uncapped {
            debug!(
                uncapped = %uncapped,
                cap = %self.max_stake_pct,
                "Stake capped at max_stake_pct"
            );
        }

        let recommended_amount = if bankroll > Decimal::ZERO {
            // recommended_pct <= 100, so the amount never exceeds the bankroll.
            bankroll * (recommended_pct / Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };

        Ok(StakeAdvice {
            edge: edge_probability * decimal_odds - Decimal::ONE,
            kelly_full,
            recommended_pct,
            recommended_amount,
        })
    }
}
