//! trackpipe - a buffered event tracking and delivery pipeline
//!
//! This binary boots the pipeline from environment configuration, records
//! a startup page view, and keeps flushing queued events to the collector
//! until it receives a shutdown signal.

use trackpipe::{logging, Config, Result, Tracker};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let config = Config::from_env()?;

    // Validate configuration
    config.validate()?;

    // Initialize logging/tracing
    logging::init_tracing(&config.runtime.log_level, &config.runtime.environment)?;

    // Log configuration (with sensitive data masked)
    config.log_config();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting trackpipe");

    let tracker = Tracker::new(&config)?;
    tracker.track_page_view();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    let stats = tracker.shutdown().await;
    tracing::info!(
        queued = stats.queued,
        delivered = stats.delivered,
        dropped = stats.dropped,
        "trackpipe shutdown complete"
    );
    Ok(())
}
