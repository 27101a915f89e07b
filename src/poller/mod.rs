//! Poller
//!
//! The root view of the dashboard: owns the charted series and keeps it fresh.
//!
//! ## Architecture
//!
//! - **Poller / PollerHandle**: Mounts a repeating timer; dropping the handle unmounts it
//! - **PollSnapshot**: Series plus status, published through a `watch` channel
//!
//! Every tick gets a number from a monotonically increasing counter. Fetches run
//! concurrently, and a result is applied only if its tick is newer than the data
//! already shown, so a slow response can never roll the chart back.
//!
//! ## Example
//!
//! ```rust,no_run
//! use popchart::config::Config;
//! use popchart::poller::Poller;
//! use popchart::source::source_from_config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let source = source_from_config(&config.source)?;
//!
//!     let handle = Poller::new(source, config.poller.clone()).mount();
//!     let mut updates = handle.subscribe();
//!     updates.changed().await?;
//!     println!("{}", updates.borrow().series.summary());
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

mod scheduler;
mod state;

pub use scheduler::{Poller, PollerClient, PollerError, PollerHandle};
pub use state::{ApplyOutcome, PollFailure, PollSnapshot, PollStatus};
