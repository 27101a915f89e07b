//! Population series
//!
//! This module provides the data model shared by every other layer:
//!
//! - **types**: `AnimalCount`, `Series`, the `ResultPayload` wire document
//! - **decode**: Bytes to `Series` and back
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust
//! use popchart::series::decode_payload;
//!
//! let body = br#"{"res":[{"year":2020,"num_herbs":10,"num_carns":2}]}"#;
//! let series = decode_payload(body).unwrap();
//! assert_eq!(series.len(), 1);
//! ```

pub mod decode;
pub mod error;
pub mod types;

pub use decode::{decode_payload, encode_payload};
pub use error::{SeriesError, SeriesResult};
pub use types::{AnimalCount, Peak, ResultPayload, Series, SeriesSummary};
