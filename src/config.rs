//! Configuration management.
//!
//! `AnalyticsConfig` is what the dashboard settings store hands the engine.
//! `Settings` wraps it with process-level options and loads everything from
//! environment variables and a .env file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::analytics::edge::{EdgeThresholds, DEFAULT_SPREAD_THRESHOLD};
use crate::analytics::metrics::DEFAULT_CLV_POSITIVE_THRESHOLD;
use crate::data::models::MAX_MAGNITUDE;
use crate::risk::stake_advisor::DEFAULT_KELLY_FRACTION;

/// Engine parameters, in the settings store's camelCase shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyticsConfig {
    pub starting_bankroll: Decimal,
    pub kelly_fraction_multiplier: Decimal,
    /// Per-bet stake cap, percent of bankroll.
    pub max_stake_pct: Decimal,
    pub edge_thresholds: EdgeThresholds,
    pub spread_anomaly_threshold: Decimal,
    /// CLV percent at which a bet enters the `Positive` band.
    pub clv_positive_threshold: Decimal,
    pub refresh_interval_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            starting_bankroll: Decimal::new(1000, 0),
            kelly_fraction_multiplier: DEFAULT_KELLY_FRACTION,
            max_stake_pct: Decimal::new(5, 0),
            edge_thresholds: EdgeThresholds::default(),
            spread_anomaly_threshold: DEFAULT_SPREAD_THRESHOLD,
            clv_positive_threshold: DEFAULT_CLV_POSITIVE_THRESHOLD,
            refresh_interval_ms: 30_000,
        }
    }
}

impl AnalyticsConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Validate configuration for critical requirements.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.starting_bankroll <= Decimal::ZERO || self.starting_bankroll > MAX_MAGNITUDE {
            errors.push(format!("STARTING_BANKROLL must be in (0, {}]", MAX_MAGNITUDE));
        }

        if self.kelly_fraction_multiplier <= Decimal::ZERO
            || self.kelly_fraction_multiplier > Decimal::ONE
        {
            errors.push("KELLY_FRACTION_MULTIPLIER must be in (0, 1]".to_string());
        }

        if self.max_stake_pct <= Decimal::ZERO || self.max_stake_pct > Decimal::ONE_HUNDRED {
            errors.push("MAX_STAKE_PCT must be in (0, 100]".to_string());
        }

        if self.edge_thresholds.validate().is_err() {
            errors.push("EDGE_THRESHOLD_LOW must not exceed EDGE_THRESHOLD_HIGH".to_string());
        }

        if self.refresh_interval_ms == 0 {
            errors.push("REFRESH_INTERVAL_MS must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Process configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub analytics: AnalyticsConfig,

    // Snapshot source
    pub snapshot_path: String,

    // Logging
    pub log_level: String,
    pub log_json: bool,
}

impl Settings {
    /// Load settings from environment variables (and .env file).
    pub fn from_env() -> Self {
        // Try to load .env file (ignore if not found).
        let _ = dotenvy::dotenv();

        let defaults = AnalyticsConfig::default();

        Self {
            analytics: AnalyticsConfig {
                starting_bankroll: env_decimal("STARTING_BANKROLL", defaults.starting_bankroll),
                kelly_fraction_multiplier: env_decimal(
                    "KELLY_FRACTION_MULTIPLIER",
                    defaults.kelly_fraction_multiplier,
                ),
                max_stake_pct: env_decimal("MAX_STAKE_PCT", defaults.max_stake_pct),
                edge_thresholds: EdgeThresholds {
                    low: env_decimal("EDGE_THRESHOLD_LOW", defaults.edge_thresholds.low),
                    high: env_decimal("EDGE_THRESHOLD_HIGH", defaults.edge_thresholds.high),
                },
                spread_anomaly_threshold: env_decimal(
                    "SPREAD_ANOMALY_THRESHOLD",
                    defaults.spread_anomaly_threshold,
                ),
                clv_positive_threshold: env_decimal(
                    "CLV_POSITIVE_THRESHOLD",
                    defaults.clv_positive_threshold,
                ),
                refresh_interval_ms: env_u64("REFRESH_INTERVAL_MS", defaults.refresh_interval_ms),
            },

            snapshot_path: env_str("SNAPSHOT_PATH", "snapshot.json"),

            log_level: env_str("LOG_LEVEL", "info"),
            log_json: env_bool("LOG_JSON", false),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = self.analytics.validate().err().unwrap_or_default();
        if self.snapshot_path.trim().is_empty() {
            errors.push("SNAPSHOT_PATH is required".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

// =============================================================================
// Environment helpers
// =============================================================================

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_decimal(key: &str, default: Decimal) -> Decimal {
    std::env::var(key)
        .ok()
        .and_then(|v| Decimal::from_str(v.trim()).ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(AnalyticsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_settings_store_shape() {
        let config = AnalyticsConfig::from_json(
            r#"{
                "startingBankroll": 2500,
                "kellyFractionMultiplier": "0.5",
                "edgeThresholds": {"low": 10, "high": 20},
                "refreshIntervalMs": 60000
            }"#,
        )
        .unwrap();
        assert_eq!(config.starting_bankroll, Decimal::new(2500, 0));
        assert_eq!(config.kelly_fraction_multiplier, Decimal::new(5, 1));
        assert_eq!(config.edge_thresholds.high, Decimal::new(20, 0));
        assert_eq!(config.refresh_interval_ms, 60_000);
        // Unspecified keys keep their defaults.
        assert_eq!(config.max_stake_pct, Decimal::new(5, 0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_collects_every_error() {
        let config = AnalyticsConfig {
            starting_bankroll: Decimal::ZERO,
            kelly_fraction_multiplier: Decimal::new(15, 1),
            refresh_interval_ms: 0,
            ..AnalyticsConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_inverted_thresholds_from_store_fail_validation() {
        let config = AnalyticsConfig::from_json(r#"{"edgeThresholds": {"low": 20, "high": 10}}"#).unwrap();
        assert!(config.validate().is_err());
    }
}
