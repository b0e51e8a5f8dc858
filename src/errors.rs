//! Error types for the analytics core.
//!
//! Two families, handled differently:
//! - `AnalyticsError`: a caller broke an input contract. Returned as `Err`
//!   and never swallowed.
//! - `MalformedRecord`: a raw record failed data-quality checks. Batch
//!   normalization drops the record and counts it; the batch continues.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Invalid decimal odds {odds}: must be greater than 1")]
    InvalidOdds { odds: Decimal },

    #[error("Invalid probability {probability}: must be in [0, 1]")]
    InvalidProbability { probability: Decimal },

    #[error("Invalid Kelly fraction {fraction}: must be in (0, 1]")]
    InvalidKellyFraction { fraction: Decimal },

    #[error("Invalid edge thresholds: low {low} > high {high}")]
    InvalidThresholds { low: Decimal, high: Decimal },

    #[error("Invalid page size: per_page must be at least 1")]
    InvalidPage,
}

/// Why a raw record was dropped during batch normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("missing identity field `{0}`")]
    MissingIdentity(&'static str),

    #[error("stake {0} is not positive")]
    NonPositiveStake(Decimal),

    #[error("odds {0} are not above 1")]
    OddsNotAboveOne(Decimal),

    #[error("`{field}` magnitude {value} exceeds the supported range")]
    OutOfRange { field: &'static str, value: Decimal },
}
