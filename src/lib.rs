//! # Popchart
//!
//! Live population chart for a predator/prey simulation. A poller fetches the
//! simulation's result document on a fixed interval and the dashboard draws
//! herbivore and carnivore counts per year as two lines.
//!
//! ## Modules
//!
//! - [`series`]: The result document and the decoded series
//! - [`source`]: Where result documents are fetched from (HTTP or file)
//! - [`poller`]: Repeating fetch timer with ordered, cancellable updates
//! - [`chart`]: SVG line chart of a series, drawn with plotters
//! - [`api`]: Dashboard server with Axum
//! - [`websocket`]: Push updates to open dashboards
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use popchart::chart::{render_svg, ChartOptions};
//! use popchart::config::PollerConfig;
//! use popchart::poller::Poller;
//! use popchart::source::HttpSource;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = HttpSource::new("http://127.0.0.1:3000/result.json", 5000)?;
//!     let handle = Poller::new(Arc::new(source), PollerConfig::default()).mount();
//!
//!     let mut updates = handle.subscribe();
//!     updates.changed().await?;
//!
//!     let snapshot = updates.borrow().clone();
//!     let svg = render_svg(snapshot.series.samples(), &ChartOptions::default())?;
//!     println!("{}", svg);
//!
//!     // Stops the timer and any fetch still in flight
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chart;
pub mod config;
pub mod logging;
pub mod poller;
pub mod series;
pub mod source;
pub mod websocket;

// Re-export top-level types for convenience
pub use series::{decode_payload, AnimalCount, ResultPayload, Series, SeriesError, SeriesSummary};

pub use source::{DataSource, FailureKind, FetchError, FileSource, HttpSource};

pub use poller::{Poller, PollerClient, PollerError, PollerHandle, PollSnapshot, PollStatus};

pub use chart::{render_svg, ChartOptions};

pub use api::{build_router, serve, ApiError, AppState};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent};

pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, PollerConfig, SourceConfig};
