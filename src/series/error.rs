//! Series error types

use thiserror::Error;

/// Errors raised while decoding or validating a series
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    /// Payload was not a `{ "res": [...] }` document of valid samples
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// The same year appears more than once
    #[error("Duplicate year in series: {0}")]
    DuplicateYear(u32),

    /// Years are not ascending
    #[error("Years out of order: {next} follows {previous}")]
    OutOfOrder { previous: u32, next: u32 },
}

impl From<serde_json::Error> for SeriesError {
    fn from(err: serde_json::Error) -> Self {
        SeriesError::Malformed(err.to_string())
    }
}

/// Result type alias for series operations
pub type SeriesResult<T> = Result<T, SeriesError>;
