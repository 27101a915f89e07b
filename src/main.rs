//! Popchart Dashboard Server
//!
//! Run with: cargo run --bin popchart
//!
//! # Configuration
//!
//! Reads `config.toml` from the usual locations (or `--config`), then
//! applies environment overrides:
//! - `POPCHART_SOURCE_URL`: Result document to poll
//! - `POPCHART_POLL_INTERVAL_SECS`: Seconds between fetches (default: 10)
//! - `POPCHART_API_HOST` / `POPCHART_API_PORT`: Bind address (default: 127.0.0.1:8090)
//! - `POPCHART_LOG_LEVEL` / `POPCHART_LOG_FORMAT`: Logging
//! - `RUST_LOG`: Full filter, overrides the log level

use clap::Parser;
use popchart::api::{serve, AppState};
use popchart::chart::ChartOptions;
use popchart::config::Config;
use popchart::poller::Poller;
use popchart::source::source_from_config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "popchart")]
#[command(author, version, about = "Population chart dashboard server")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    popchart::logging::init(&config.logging);

    tracing::info!("Starting popchart v{}", env!("CARGO_PKG_VERSION"));

    let source = source_from_config(&config.source)?;
    let source_label = source.describe();
    tracing::info!(source = %source_label, "Result source configured");

    let handle = Poller::new(source, config.poller.clone()).mount();

    let state = AppState::new(
        handle.client(),
        source_label,
        config.poller.interval().as_secs(),
        ChartOptions::from(&config.chart),
        &config.api,
    );

    let result = serve(state, &config.api).await;

    tracing::info!("Stopping poller...");
    handle.shutdown().await;

    result?;
    tracing::info!("popchart stopped");
    Ok(())
}
