//! Source fetchers and record normalization.
//!
//! This crate sits between the upstreams and the aggregator:
//!
//! - [`SourceFetcher`] - pulls raw records for one kind of source
//! - [`RawRecord`] - list-item or calendar-API record, as returned upstream
//! - [`normalize_record`] - turns a record into a [`CanonicalEvent`]
//! - [`parse_recurrence`] - reads an upstream recurrence object
//! - [`ProviderError`] - error types for fetch operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐
//! │ SharePoint list │    │ Graph calendars  │
//! └────────┬────────┘    └────────┬─────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌──────────────────┐   ┌─────────────────┐
//! │SharePointFetcher │   │  GraphFetcher   │
//! └────────┬─────────┘   └────────┬────────┘
//!          │                      │
//!          │    SourceFetcher     │
//!          └──────────┬───────────┘
//!                     │
//!                     ▼
//!              ┌─────────────┐
//!              │  RawRecord  │
//!              └──────┬──────┘
//!                     │
//!                     ▼ normalize_record()
//!              ┌──────────────────┐
//!              │  CanonicalEvent  │
//!              └──────────────────┘
//! ```
//!
//! [`CanonicalEvent`]: eventfeed_core::CanonicalEvent

mod datetime;
pub mod error;
#[cfg(feature = "graph")]
pub mod graph;
#[cfg(any(feature = "sharepoint", feature = "graph"))]
mod http;
pub mod normalize;
pub mod provider;
pub mod raw_record;
pub mod rule_parser;
#[cfg(feature = "sharepoint")]
pub mod sharepoint;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{normalize_record, normalize_records, strip_html};
pub use provider::{
    AccessTokenProvider, BoxFuture, ErrorFetcher, FetcherRegistry, SourceFetcher, StaticToken,
};
pub use raw_record::{CalendarApiRecord, ListRecord, NativeId, RawRecord};
pub use rule_parser::parse_recurrence;
