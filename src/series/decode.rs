//! Payload decoding
//!
//! Turns the raw bytes of a result file into a [`Series`]. Order and values
//! are preserved exactly; ordering problems are reported by the caller.

use super::error::SeriesResult;
use super::types::{ResultPayload, Series};

/// Decode a `{ "res": [...] }` document
pub fn decode_payload(bytes: &[u8]) -> SeriesResult<Series> {
    let payload: ResultPayload = serde_json::from_slice(bytes)?;
    Ok(Series::from(payload))
}

/// Encode a series back into the wire format
pub fn encode_payload(series: &Series) -> SeriesResult<Vec<u8>> {
    let payload = ResultPayload {
        res: series.samples().to_vec(),
    };
    Ok(serde_json::to_vec(&payload)?)
}
