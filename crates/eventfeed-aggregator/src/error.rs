//! Aggregation-level errors.
//!
//! These never cross the public boundary as `Err`: the aggregator turns
//! them into [`AggregateResult::failed`](crate::AggregateResult::failed).
//! Per-source failures are not errors at this level at all.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that abort a whole aggregation cycle.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The requested window ends before it starts.
    #[error("invalid date range: {start} is after {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A cached value could not be read back as events.
    #[error("cached events for '{key}' are unreadable: {source}")]
    CacheDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AggregateError {
    /// Creates an invalid window error.
    pub fn invalid_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::InvalidWindow { start, end }
    }

    /// Creates a cache decode error.
    pub fn cache_decode(key: impl Into<String>, source: serde_json::Error) -> Self {
        Self::CacheDecode {
            key: key.into(),
            source,
        }
    }
}
