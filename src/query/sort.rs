//! Single-key stable sorting and the column-toggle state machine.
//!
//! Toggle rule (the table header UI depends on it): clicking the active key
//! flips direction; clicking a different key selects it with that key's
//! default direction (descending for numeric and time keys, ascending for
//! text keys).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::filter::Queryable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    Odds,
    Stake,
    Profit,
    Edge,
    Clv,
    BookmakerCount,
    Bookmaker,
    Match,
}

impl SortKey {
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Bookmaker | Self::Match)
    }

    pub fn default_direction(&self) -> SortDirection {
        if self.is_text() {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(&self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            direction: key.default_direction(),
        }
    }

    /// State after the user selects `key`.
    pub fn toggle(self, key: SortKey) -> Self {
        if key == self.key {
            Self {
                key,
                direction: self.direction.flipped(),
            }
        } else {
            Self::new(key)
        }
    }
}

/// A record's value for one sort key.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Number(Decimal),
    Time(DateTime<Utc>),
    Text(String),
    Missing,
}

impl From<Option<Decimal>> for SortValue {
    fn from(v: Option<Decimal>) -> Self {
        v.map_or(Self::Missing, Self::Number)
    }
}

impl From<Option<DateTime<Utc>>> for SortValue {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        v.map_or(Self::Missing, Self::Time)
    }
}

impl From<Option<String>> for SortValue {
    fn from(v: Option<String>) -> Self {
        v.map_or(Self::Missing, Self::Text)
    }
}

/// Missing values sort last in both directions.
fn compare(a: &SortValue, b: &SortValue, direction: SortDirection) -> Ordering {
    let ordering = match (a, b) {
        (SortValue::Missing, SortValue::Missing) => return Ordering::Equal,
        (SortValue::Missing, _) => return Ordering::Greater,
        (_, SortValue::Missing) => return Ordering::Less,
        (SortValue::Number(x), SortValue::Number(y)) => x.cmp(y),
        (SortValue::Time(x), SortValue::Time(y)) => x.cmp(y),
        (SortValue::Text(x), SortValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => Ordering::Equal,
    };
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Stable in-place sort; ties keep their original relative order.
pub fn sort_records<T: Queryable>(records: &mut [T], state: SortState) {
    records.sort_by(|a, b| {
        compare(&a.sort_value(state.key), &b.sort_value(state.key), state.direction)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_same_key_flips() {
        let state = SortState::new(SortKey::Edge);
        assert_eq!(state.direction, SortDirection::Descending);
        let flipped = state.toggle(SortKey::Edge);
        assert_eq!(flipped.direction, SortDirection::Ascending);
        assert_eq!(flipped.toggle(SortKey::Edge).direction, SortDirection::Descending);
    }

    #[test]
    fn test_toggle_new_key_resets_direction() {
        let state = SortState::new(SortKey::Edge).toggle(SortKey::Edge);
        assert_eq!(state.direction, SortDirection::Ascending);
        let next = state.toggle(SortKey::Odds);
        assert_eq!(next.key, SortKey::Odds);
        assert_eq!(next.direction, SortDirection::Descending);
        assert_eq!(
            next.toggle(SortKey::Match).direction,
            SortDirection::Ascending
        );
    }

    #[test]
    fn test_missing_sorts_last_both_ways() {
        let one = SortValue::Number(Decimal::ONE);
        let none = SortValue::Missing;
        assert_eq!(compare(&none, &one, SortDirection::Ascending), Ordering::Greater);
        assert_eq!(compare(&none, &one, SortDirection::Descending), Ordering::Greater);
        assert_eq!(compare(&one, &none, SortDirection::Descending), Ordering::Less);
    }
}
