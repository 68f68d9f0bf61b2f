//! Multi-source aggregation.
//!
//! One call to [`Aggregator::fetch_events`] runs a whole cycle:
//!
//! 1. keep enabled sources, look the request up in the cache;
//! 2. fetch every source concurrently, containing failures per source;
//! 3. normalize records and expand recurring events against the window;
//! 4. merge in source order, drop duplicate ids (first wins), sort by start;
//! 5. cache the final list.
//!
//! Suspension only happens while fetching or talking to the cache; the
//! pure steps run to completion, so output order depends only on input.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use eventfeed_core::{CanonicalEvent, EventSource, TimeWindow, expand, get_enabled_sources};
use eventfeed_providers::{FetcherRegistry, ProviderError, normalize_records};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheStore;
use crate::config::AggregatorConfig;
use crate::error::AggregateError;

/// What one aggregation cycle produced.
///
/// `error` is set only for aggregation-level failures, in which case
/// `events` is empty. A failing source never sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub events: Vec<CanonicalEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AggregateResult {
    /// A successful result.
    pub fn ok(events: Vec<CanonicalEvent>) -> Self {
        Self {
            events,
            error: None,
        }
    }

    /// A failed cycle: no events, an error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Returns true if the cycle failed.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The result of fetching one source.
#[derive(Debug)]
pub enum SourceOutcome {
    /// Normalized and expanded events.
    Fetched(Vec<CanonicalEvent>),
    /// The fetch failed; the source contributes nothing.
    Failed(ProviderError),
}

impl SourceOutcome {
    /// Returns the events, empty for a failed source.
    pub fn into_events(self) -> Vec<CanonicalEvent> {
        match self {
            Self::Fetched(events) => events,
            Self::Failed(_) => Vec::new(),
        }
    }
}

/// Fans a request out to the registered fetchers and merges the results.
pub struct Aggregator {
    registry: FetcherRegistry,
    cache: Arc<dyn CacheStore>,
    config: AggregatorConfig,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator with the default configuration.
    pub fn new(registry: FetcherRegistry, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            registry,
            cache,
            config: AggregatorConfig::default(),
        }
    }

    /// Builder: set the configuration.
    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Runs one cycle with the configured cache TTL.
    pub async fn aggregate(&self, sources: &[EventSource], window: TimeWindow) -> AggregateResult {
        self.fetch_events(sources, window.start, window.end, self.config.cache_ttl)
            .await
    }

    /// Runs one cycle. A zero `cache_ttl` bypasses the cache entirely.
    ///
    /// Never fails: aggregation-level errors come back as
    /// [`AggregateResult::failed`].
    #[instrument(skip(self, sources), fields(sources = sources.len()))]
    pub async fn fetch_events(
        &self,
        sources: &[EventSource],
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        cache_ttl: Duration,
    ) -> AggregateResult {
        match self.try_fetch_events(sources, range_start, range_end, cache_ttl).await {
            Ok(events) => AggregateResult::ok(events),
            Err(err) => {
                warn!(error = %err, "aggregation failed");
                AggregateResult::failed(err.to_string())
            }
        }
    }

    async fn try_fetch_events(
        &self,
        sources: &[EventSource],
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
        cache_ttl: Duration,
    ) -> Result<Vec<CanonicalEvent>, AggregateError> {
        let window = TimeWindow::try_new(range_start, range_end)
            .ok_or_else(|| AggregateError::invalid_window(range_start, range_end))?;
        let enabled = get_enabled_sources(sources);
        let use_cache = !cache_ttl.is_zero();
        let key = self.cache_key(&enabled, window);

        if use_cache {
            let cached = self
                .cache
                .get_typed::<Vec<CanonicalEvent>>(&key)
                .await
                .map_err(|e| AggregateError::cache_decode(&key, e))?;
            if let Some(events) = cached {
                debug!(key = %key, count = events.len(), "cache hit");
                return Ok(events);
            }
        }

        let outcomes = join_all(enabled.iter().map(|source| self.fetch_source(source, window))).await;
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, SourceOutcome::Failed(_)))
            .count();
        let events = merge_events(outcomes.into_iter().map(SourceOutcome::into_events));

        info!(
            sources = enabled.len(),
            failed,
            events = events.len(),
            "aggregated events"
        );

        if use_cache {
            self.cache.set_typed(&key, &events, cache_ttl).await;
        }
        Ok(events)
    }

    async fn fetch_source(&self, source: &EventSource, window: TimeWindow) -> SourceOutcome {
        match self.registry.fetch(source, window).await {
            Ok(records) => {
                let events: Vec<_> = normalize_records(&records, &source.id, &source.color)
                    .iter()
                    .flat_map(|event| expand(event, window.start, window.end))
                    .collect();
                debug!(
                    source = %source.id,
                    records = records.len(),
                    events = events.len(),
                    "source fetched"
                );
                SourceOutcome::Fetched(events)
            }
            Err(err) => {
                warn!(
                    source = %source.id,
                    code = %err.code(),
                    retryable = err.is_retryable(),
                    error = %err,
                    "source fetch failed"
                );
                SourceOutcome::Failed(err)
            }
        }
    }

    /// Drops the cached result for a request, so the next call refetches.
    pub async fn invalidate(&self, sources: &[EventSource], window: TimeWindow) {
        let key = self.cache_key(&get_enabled_sources(sources), window);
        debug!(key = %key, "invalidating cached events");
        self.cache.remove(&key).await;
    }

    /// Builds the cache key for a set of enabled sources and a window.
    ///
    /// The key is `<namespace>:<sha256 hex>` over the source ids in order
    /// and the RFC 3339 window bounds, sub-second precision included.
    pub fn cache_key(&self, enabled: &[&EventSource], window: TimeWindow) -> String {
        let mut hasher = Sha256::new();
        for source in enabled {
            hasher.update(source.id.as_bytes());
            hasher.update([0u8]);
        }
        hasher.update(window.start.to_rfc3339_opts(SecondsFormat::AutoSi, true).as_bytes());
        hasher.update(b"/");
        hasher.update(window.end.to_rfc3339_opts(SecondsFormat::AutoSi, true).as_bytes());
        format!("{}:{}", self.config.cache_namespace, hex::encode(hasher.finalize()))
    }
}

/// Concatenates per-source lists in order, keeps the first event for each
/// id, then sorts by start. The sort is stable, so ties keep merge order.
pub fn merge_events<I>(lists: I) -> Vec<CanonicalEvent>
where
    I: IntoIterator<Item = Vec<CanonicalEvent>>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<CanonicalEvent> = lists
        .into_iter()
        .flatten()
        .filter(|event| seen.insert(event.id.clone()))
        .collect();
    merged.sort_by_key(|event| event.start);
    merged
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes
            .as_ref()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
