//! Betting analytics refresh driver.
//!
//! Stands in for the dashboard's polling loop: on every refresh tick it
//! re-reads the snapshot file written by the fetch layer, recomputes all
//! derived views from scratch, and logs the headline numbers.
//!
//! Architecture:
//! - Tokio runtime for the refresh timer and shutdown signal
//! - Pure, synchronous analytics core (normalize, aggregate, classify, series)
//! - A newer snapshot always replaces the previous view wholesale

use std::path::Path;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use betting_analytics::config::Settings;
use betting_analytics::dashboard::engine::{DashboardEngine, DashboardQuery, Snapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration.
    let settings = Settings::from_env();

    // Initialize logging.
    init_logging(&settings);

    info!("=== Betting Analytics ===");
    info!(
        snapshot_path = %settings.snapshot_path,
        starting_bankroll = %settings.analytics.starting_bankroll,
        kelly_fraction = %settings.analytics.kelly_fraction_multiplier,
        edge_low = %settings.analytics.edge_thresholds.low,
        edge_high = %settings.analytics.edge_thresholds.high,
        refresh_interval_ms = settings.analytics.refresh_interval_ms,
        "Configuration loaded"
    );

    // Validate settings.
    if let Err(errors) = settings.validate() {
        for e in &errors {
            error!(error = %e, "Configuration error");
        }
        anyhow::bail!("Configuration validation failed");
    }

    let engine = DashboardEngine::new(settings.analytics.clone())?;
    let query = DashboardQuery::default();
    let refresh = Duration::from_millis(settings.analytics.refresh_interval_ms);
    let mut refresh_count: u64 = 0;

    loop {
        refresh_count += 1;
        match load_snapshot(Path::new(&settings.snapshot_path)).await {
            Ok(snapshot) => {
                let view = engine.compute_snapshot(&snapshot, &query);
                info!(
                    refresh = refresh_count,
                    total = view.stats.total,
                    pending = view.stats.pending,
                    pending_stake = %view.stats.pending_stake,
                    avg_clv = ?view.stats.avg_clv,
                    bankroll = ?view.series.last().map(|p| p.bankroll),
                    max_drawdown_pct = %view.max_drawdown_pct,
                    "Refresh complete"
                );
            }
            Err(e) => {
                // Keep the previous view; the next tick retries.
                warn!(error = %e, path = %settings.snapshot_path, "Snapshot unavailable");
            }
        }

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = tokio::time::sleep(refresh) => {}
        }
    }

    info!(refreshes = refresh_count, "Shutdown complete.");
    Ok(())
}

async fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = tokio::fs::read_to_string(path).await?;
    let snapshot = serde_json::from_str(&raw)?;
    Ok(snapshot)
}

fn init_logging(settings: &Settings) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    if settings.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}
