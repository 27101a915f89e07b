//! Popchart CLI
//!
//! Command-line interface for one-off work against a result document:
//! - Fetch and print the series
//! - Render the chart to an SVG file
//! - Watch the document and log every change
//! - Query a running dashboard
//! - Generate a config file

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use popchart::chart::{render_svg, ChartOptions};
use popchart::config::Config;
use popchart::poller::{PollSnapshot, Poller};
use popchart::series::{encode_payload, Series};
use popchart::source::source_from_config;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "popchart-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch, render and watch population results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Result document URL or path, overrides the config
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the result document once and print it
    Fetch,

    /// Fetch once and write the chart as SVG
    Render {
        /// Output file
        #[arg(short, long, default_value = "chart.svg")]
        output: PathBuf,
        /// Surface width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Surface height in pixels
        #[arg(long)]
        height: Option<u32>,
    },

    /// Poll the result document and log each change until Ctrl+C
    Watch {
        /// Seconds between fetches (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Show the status of a running dashboard
    Status {
        /// Dashboard URL
        #[arg(long, default_value = "http://127.0.0.1:8090")]
        api_url: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(source) = &cli.source {
        config.source.url = source.clone();
    }
    popchart::logging::init_stderr(&config.logging);

    match cli.command {
        Commands::Fetch => {
            let series = fetch_once(&config).await?;
            match cli.format.as_str() {
                "json" => print_json(&series)?,
                "csv" => print_csv(&series)?,
                _ => print_table(&series),
            }
        }

        Commands::Render {
            output,
            width,
            height,
        } => {
            let series = fetch_once(&config).await?;

            let mut options = ChartOptions::from(&config.chart);
            options.width = width.unwrap_or(options.width);
            options.height = height.unwrap_or(options.height);

            let svg = render_svg(series.samples(), &options)?;
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(&output, svg)
                .with_context(|| format!("Failed to write {:?}", output))?;

            println!(
                "Chart with {} samples written to {:?}",
                series.len(),
                output
            );
        }

        Commands::Watch { interval } => {
            if let Some(secs) = interval {
                config.poller.interval_secs = secs;
            }
            watch(&config).await?;
        }

        Commands::Status { api_url } => {
            let url = format!("{}/api/v1/status", api_url.trim_end_matches('/'));
            let response = reqwest::get(&url)
                .await
                .with_context(|| format!("Cannot connect to dashboard at {}", api_url))?;

            if !response.status().is_success() {
                bail!("Dashboard returned error: {}", response.status());
            }
            let status: serde_json::Value = response.json().await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }

        Commands::Config { output } => {
            let config = popchart::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path).context("Failed to load config"),
        None => Ok(Config::load_default()),
    }
}

async fn fetch_once(config: &Config) -> anyhow::Result<Series> {
    let source = source_from_config(&config.source)?;
    let series = source
        .fetch()
        .await
        .with_context(|| format!("Failed to fetch {}", source.describe()))?;

    if let Err(e) = series.check_order() {
        tracing::warn!(error = %e, "Series is not in year order");
    }
    Ok(series)
}

async fn watch(config: &Config) -> anyhow::Result<()> {
    let source = source_from_config(&config.source)?;
    println!(
        "Watching {} every {}s (Ctrl+C to stop)",
        source.describe(),
        config.poller.interval().as_secs()
    );

    let handle = Poller::new(source, config.poller.clone()).mount();
    let mut updates = handle.subscribe();
    let mut tracker = ChangeTracker::default();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                for line in tracker.observe(&snapshot) {
                    println!("{}", line);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

/// Remembers what `watch` already printed
///
/// The poller state also changes when a tick merely starts, so only a newly
/// shown series or a newly recorded failure produces output.
#[derive(Debug, Default)]
struct ChangeTracker {
    last_applied: Option<u64>,
    last_failure: Option<u64>,
}

impl ChangeTracker {
    fn observe(&mut self, snapshot: &PollSnapshot) -> Vec<String> {
        let mut lines = Vec::new();

        let failure_tick = snapshot.last_failure.as_ref().map(|f| f.tick);
        if failure_tick != self.last_failure {
            if let Some(failure) = &snapshot.last_failure {
                lines.push(format!(
                    "[tick {}] fetch failed ({}): {}",
                    failure.tick, failure.kind, failure.message
                ));
            }
            self.last_failure = failure_tick;
        }

        if snapshot.applied_tick != self.last_applied {
            if let Some(tick) = snapshot.applied_tick {
                lines.push(format!("[tick {}] {}", tick, snapshot.series.summary()));
            }
            self.last_applied = snapshot.applied_tick;
        }

        lines
    }
}

fn print_table(series: &Series) {
    if series.is_empty() {
        println!("No samples");
        return;
    }

    println!("{:<8} | {:<12} | {:<12}", "Year", "Herbivores", "Carnivores");
    println!("{}", "-".repeat(38));

    for sample in series.samples() {
        println!(
            "{:<8} | {:<12} | {:<12}",
            sample.year, sample.num_herbs, sample.num_carns
        );
    }

    println!();
    println!("{}", series.summary());
}

fn print_json(series: &Series) -> anyhow::Result<()> {
    let bytes = encode_payload(series)?;
    let value: serde_json::Value = serde_json::from_slice(&bytes)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_csv(series: &Series) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    for sample in series.samples() {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_status(status: &serde_json::Value) {
    let field = |key: &str| match &status[key] {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    println!("Status:      {}", field("status"));
    println!("Source:      {}", field("source"));
    println!("Interval:    {}s", field("interval_secs"));
    println!("Samples:     {}", field("samples"));
    println!("Shown tick:  {}", field("applied_tick"));
    println!("Ticks:       {}", field("ticks_started"));
    println!("Last update: {}", field("last_success_at"));

    if let Some(failure) = status["last_failure"].as_object() {
        println!();
        println!(
            "Last failure (tick {}): {}",
            failure.get("tick").map(|t| t.to_string()).unwrap_or_default(),
            failure
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use popchart::config::UpdateMode;
    use popchart::poller::PollFailure;
    use popchart::series::AnimalCount;
    use popchart::source::FetchError;

    fn series() -> Series {
        Series::new(vec![AnimalCount::new(2020, 10, 2)])
    }

    #[test]
    fn test_change_tracker_ignores_tick_starts() {
        let mut tracker = ChangeTracker::default();
        let mut snapshot = PollSnapshot::default();
        assert!(tracker.observe(&snapshot).is_empty());

        snapshot.ticks_started = 1;
        assert!(tracker.observe(&snapshot).is_empty());

        snapshot.apply_success(1, series(), UpdateMode::Replace);
        let lines = tracker.observe(&snapshot);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[tick 1] "));

        snapshot.ticks_started = 2;
        assert!(tracker.observe(&snapshot).is_empty());

        snapshot.apply_failure(PollFailure::from_error(2, &FetchError::Status { status: 500 }));
        let lines = tracker.observe(&snapshot);
        assert_eq!(lines, vec!["[tick 2] fetch failed (status): Unexpected status 500"]);

        snapshot.ticks_started = 3;
        assert!(tracker.observe(&snapshot).is_empty());

        // Clears the failure; only the new data is reported
        snapshot.apply_success(3, series(), UpdateMode::Replace);
        let lines = tracker.observe(&snapshot);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("[tick 3] "));

        assert!(tracker.observe(&snapshot).is_empty());
    }
}
