//! Library entrypoint for betting-analytics.
//!
//! Exposes all modules so integration tests can import them.

pub mod analytics;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod errors;
pub mod query;
pub mod risk;
