//! Multi-source event aggregation.
//!
//! One aggregation cycle fans out to every enabled source concurrently,
//! normalizes and expands what comes back, then merges everything into a
//! single chronologically ordered list without duplicate ids:
//!
//! - [`Aggregator`] - fan-out, merge, dedup and caching for one cycle
//! - [`CacheStore`] - pluggable TTL cache, with [`MemoryCache`] in-process
//! - [`EventFeed`] - reloadable state for consumers, with stale-cycle protection
//!
//! A source that fails is logged and contributes nothing; the cycle still
//! succeeds with what the other sources returned.

pub mod aggregator;
pub mod cache;
pub mod config;
pub mod error;
pub mod feed;

pub use aggregator::{AggregateResult, Aggregator, SourceOutcome, merge_events};
pub use cache::{CacheEntry, CacheStore, MemoryCache};
pub use config::AggregatorConfig;
pub use error::AggregateError;
pub use feed::{EventFeed, FeedState, FeedStatus};
