//! Canonical record shapes produced by the normalizer.
//!
//! These are read-only views built fresh from each fetched snapshot. Every
//! analytics pass consumes them by reference and never mutates them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::MalformedRecord;

/// Largest magnitude accepted for stakes, odds, profits and percentages
/// (10^15). Sums over any realistic batch stay far inside `Decimal`'s range.
pub const MAX_MAGNITUDE: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

fn check_magnitude(field: &'static str, value: Decimal) -> Result<(), MalformedRecord> {
    if value.abs() > MAX_MAGNITUDE {
        return Err(MalformedRecord::OutOfRange { field, value });
    }
    Ok(())
}

// =============================================================================
// Enums
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetResult {
    Won,
    Lost,
    Pending,
}

impl BetResult {
    /// Parse a result string as the upstream service writes it.
    ///
    /// Unknown values yield `None` so the bet is treated as unsettled.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "won" | "win" => Some(Self::Won),
            "lost" | "loss" | "lose" => Some(Self::Lost),
            "pending" | "open" => Some(Self::Pending),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for BetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won => write!(f, "won"),
            Self::Lost => write!(f, "lost"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

// =============================================================================
// Bet Records
// =============================================================================

/// A placed bet, settled or not.
///
/// `id` and `match_name` are empty strings when the raw payload lacked them;
/// `validate` reports that so the batch caller can drop the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: String,
    pub match_name: String,
    pub sport: Option<String>,
    pub bookmaker: Option<String>,
    pub outcome: Option<String>,
    pub odds: Decimal,
    pub stake: Decimal,
    pub category: Option<String>,
    pub result: Option<BetResult>,
    pub actual_profit: Option<Decimal>,
    pub clv_pct: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
}

impl BetRecord {
    /// Whether the outcome is known (`won` or `lost`).
    pub fn is_settled(&self) -> bool {
        self.result.map(|r| r.is_settled()).unwrap_or(false)
    }

    pub fn is_won(&self) -> bool {
        self.result == Some(BetResult::Won)
    }

    pub fn is_lost(&self) -> bool {
        self.result == Some(BetResult::Lost)
    }

    /// Profit this bet contributes to realized totals.
    ///
    /// A lost bet is always exactly `-stake`; a win contributes its reported
    /// profit (missing counts as zero); unsettled bets contribute nothing.
    pub fn realized_profit(&self) -> Decimal {
        match self.result {
            Some(BetResult::Won) => self.actual_profit.unwrap_or(Decimal::ZERO),
            Some(BetResult::Lost) => -self.stake,
            _ => Decimal::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), MalformedRecord> {
        if self.id.is_empty() {
            return Err(MalformedRecord::MissingIdentity("id"));
        }
        if self.match_name.is_empty() {
            return Err(MalformedRecord::MissingIdentity("match"));
        }
        if self.stake <= Decimal::ZERO {
            return Err(MalformedRecord::NonPositiveStake(self.stake));
        }
        if self.odds <= Decimal::ONE {
            return Err(MalformedRecord::OddsNotAboveOne(self.odds));
        }
        check_magnitude("stake", self.stake)?;
        check_magnitude("odds", self.odds)?;
        if let Some(profit) = self.actual_profit {
            check_magnitude("actual_profit", profit)?;
        }
        if let Some(clv) = self.clv_pct {
            check_magnitude("clv_pct", clv)?;
        }
        Ok(())
    }
}

// =============================================================================
// Opportunity Records
// =============================================================================

/// Odds quoted by a single bookmaker for the opportunity's outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmakerQuote {
    pub bookmaker: String,
    pub odds: Decimal,
}

/// A candidate bet surfaced by the upstream edge scanner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub match_name: String,
    pub sport: Option<String>,
    pub outcome: Option<String>,
    pub best_odds: Decimal,
    pub bookmaker: Option<String>,
    /// Edge as a percentage (5.0 means 5%), not a probability.
    pub edge_pct: Decimal,
    pub bookmaker_count: u32,
    #[serde(default)]
    pub quotes: Vec<BookmakerQuote>,
    pub created_at: Option<DateTime<Utc>>,
}

impl OpportunityRecord {
    pub fn validate(&self) -> Result<(), MalformedRecord> {
        if self.match_name.is_empty() {
            return Err(MalformedRecord::MissingIdentity("match"));
        }
        if self.best_odds <= Decimal::ONE {
            return Err(MalformedRecord::OddsNotAboveOne(self.best_odds));
        }
        check_magnitude("best_odds", self.best_odds)?;
        check_magnitude("edge_pct", self.edge_pct)?;
        Ok(())
    }
}

// =============================================================================
// Normalized union
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizedRecord {
    Bet(BetRecord),
    Opportunity(OpportunityRecord),
}

/// Outcome of normalizing a batch: the valid records plus a tally of drops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}
