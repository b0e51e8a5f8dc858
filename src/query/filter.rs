//! Filter predicates over bet and opportunity collections.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::sort::{SortKey, SortValue};
use crate::analytics::edge::ClassifiedOpportunity;
use crate::data::models::{BetRecord, OpportunityRecord};

/// Attribute access shared by every record type the query engine handles.
pub trait Queryable: Clone {
    /// Whether records of this type have an edge at all. `min_edge` is
    /// ignored for types that don't.
    const HAS_EDGE: bool = true;
    /// Whether records of this type have a bet category. `bet_category` is
    /// ignored for types that don't.
    const HAS_CATEGORY: bool = true;

    fn sport(&self) -> Option<&str>;
    fn bookmaker(&self) -> Option<&str>;
    fn category(&self) -> Option<&str>;
    fn edge_pct(&self) -> Option<Decimal>;
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn sort_value(&self, key: SortKey) -> SortValue;
}

/// User-selected filters. Every field is optional; `None` matches all.
///
/// Criteria combine with AND. A criterion on an attribute the record type
/// never has (edge on bets, category on opportunities) is skipped, so one
/// criteria set can drive both tables. A record whose type has the attribute
/// but whose value is missing does not match. The date range is inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterCriteria {
    pub sport: Option<String>,
    pub bookmaker: Option<String>,
    #[serde(alias = "category")]
    pub bet_category: Option<String>,
    pub min_edge: Option<Decimal>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches<T: Queryable>(&self, record: &T) -> bool {
        text_matches(self.sport.as_deref(), record.sport())
            && text_matches(self.bookmaker.as_deref(), record.bookmaker())
            && (!T::HAS_CATEGORY || text_matches(self.bet_category.as_deref(), record.category()))
            && (!T::HAS_EDGE
                || self
                    .min_edge
                    .map_or(true, |min| record.edge_pct().map_or(false, |e| e >= min)))
            && self
                .start
                .map_or(true, |start| record.created_at().map_or(false, |t| t >= start))
            && self
                .end
                .map_or(true, |end| record.created_at().map_or(false, |t| t <= end))
    }
}

fn text_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(w) => actual.map_or(false, |a| a.eq_ignore_ascii_case(w)),
    }
}

// =============================================================================
// Queryable impls
// =============================================================================

impl Queryable for BetRecord {
    const HAS_EDGE: bool = false;

    fn sport(&self) -> Option<&str> {
        self.sport.as_deref()
    }

    fn bookmaker(&self) -> Option<&str> {
        self.bookmaker.as_deref()
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    fn edge_pct(&self) -> Option<Decimal> {
        None
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::CreatedAt => self.created_at.into(),
            SortKey::Odds => SortValue::Number(self.odds),
            SortKey::Stake => SortValue::Number(self.stake),
            SortKey::Profit => self.actual_profit.into(),
            SortKey::Clv => self.clv_pct.into(),
            SortKey::Bookmaker => self.bookmaker.clone().into(),
            SortKey::Match => SortValue::Text(self.match_name.clone()),
            SortKey::Edge | SortKey::BookmakerCount => SortValue::Missing,
        }
    }
}

impl Queryable for OpportunityRecord {
    const HAS_CATEGORY: bool = false;

    fn sport(&self) -> Option<&str> {
        self.sport.as_deref()
    }

    fn bookmaker(&self) -> Option<&str> {
        self.bookmaker.as_deref()
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn edge_pct(&self) -> Option<Decimal> {
        Some(self.edge_pct)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::CreatedAt => self.created_at.into(),
            SortKey::Odds => SortValue::Number(self.best_odds),
            SortKey::Edge => SortValue::Number(self.edge_pct),
            SortKey::BookmakerCount => SortValue::Number(Decimal::from(self.bookmaker_count)),
            SortKey::Bookmaker => self.bookmaker.clone().into(),
            SortKey::Match => SortValue::Text(self.match_name.clone()),
            SortKey::Stake | SortKey::Profit | SortKey::Clv => SortValue::Missing,
        }
    }
}

impl Queryable for ClassifiedOpportunity {
    const HAS_CATEGORY: bool = false;

    fn sport(&self) -> Option<&str> {
        self.record.sport()
    }

    fn bookmaker(&self) -> Option<&str> {
        Queryable::bookmaker(&self.record)
    }

    fn category(&self) -> Option<&str> {
        None
    }

    fn edge_pct(&self) -> Option<Decimal> {
        Some(self.record.edge_pct)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.record.created_at
    }

    fn sort_value(&self, key: SortKey) -> SortValue {
        match key {
            SortKey::Stake => self.recommended_stake_pct.into(),
            _ => self.record.sort_value(key),
        }
    }
}
