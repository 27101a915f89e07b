//! Result Sources
//!
//! Where the poller reads the simulation's result document from:
//! - HTTP(S) URL (the dashboard's normal mode, e.g. `/result.json` on a static server)
//! - Local file (the path the simulation writes to)

mod file;
mod http;

pub use file::FileSource;
pub use http::HttpSource;

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SourceConfig;
use crate::series::{Series, SeriesError};

/// Common trait for all result sources
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable location, used in logs and status
    fn describe(&self) -> String;

    /// Fetch and decode the current result document
    async fn fetch(&self) -> Result<Series, FetchError>;
}

/// Coarse classification of a failed fetch
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connection, timeout or read failure
    Transport,
    /// The server answered with a non-2xx status
    Status,
    /// The body was not a valid result document
    Malformed,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Status => write!(f, "status"),
            FailureKind::Malformed => write!(f, "malformed"),
        }
    }
}

/// Errors that can occur while fetching a result document
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {status}")]
    Status { status: u16 },

    #[error("IO error reading {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error(transparent)]
    Decode(#[from] SeriesError),
}

impl FetchError {
    /// Classify this error
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout | FetchError::Request(_) | FetchError::Io { .. } => {
                FailureKind::Transport
            }
            FetchError::Status { .. } => FailureKind::Status,
            FetchError::Decode(_) => FailureKind::Malformed,
        }
    }
}

/// Build a source from configuration
///
/// `http://` and `https://` URLs are fetched over HTTP; `file://` URLs and
/// bare paths are read from disk.
pub fn source_from_config(config: &SourceConfig) -> Result<Arc<dyn DataSource>, FetchError> {
    let location = config.url.trim();

    if location.starts_with("http://") || location.starts_with("https://") {
        let source = HttpSource::new(location, config.request_timeout_ms)?;
        return Ok(Arc::new(source));
    }

    let path = location.strip_prefix("file://").unwrap_or(location);
    Ok(Arc::new(FileSource::new(path)))
}
