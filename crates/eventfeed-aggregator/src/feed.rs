//! The consumer-facing event feed.
//!
//! An [`EventFeed`] wraps an [`Aggregator`] with the state a view binds to:
//! the current events, whether a cycle is in flight, and the last
//! aggregation error. Every [`load`](EventFeed::load) starts a new cycle
//! tagged with a monotonically increasing token; when a cycle finishes
//! after a newer one has started, its result is discarded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eventfeed_core::{CanonicalEvent, EventSource, TimeWindow};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::aggregator::Aggregator;

/// Snapshot of a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedState {
    /// Events of the last settled cycle.
    pub events: Vec<CanonicalEvent>,
    /// True while a cycle is in flight.
    pub loading: bool,
    /// Aggregation error of the last settled cycle.
    pub error: Option<String>,
}

/// The one state a consumer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedStatus {
    Loading,
    Failed(String),
    Settled,
}

impl FeedState {
    /// Collapses the flags into a single status. Loading wins.
    pub fn status(&self) -> FeedStatus {
        match (&self.error, self.loading) {
            (_, true) => FeedStatus::Loading,
            (Some(error), false) => FeedStatus::Failed(error.clone()),
            (None, false) => FeedStatus::Settled,
        }
    }
}

#[derive(Debug, Clone)]
struct Request {
    sources: Vec<EventSource>,
    window: TimeWindow,
}

/// A reloadable view over an aggregator.
#[derive(Debug)]
pub struct EventFeed {
    aggregator: Arc<Aggregator>,
    state: RwLock<FeedState>,
    last_request: RwLock<Option<Request>>,
    cycle: AtomicU64,
}

impl EventFeed {
    /// Creates an idle feed with no events.
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        Self {
            aggregator,
            state: RwLock::new(FeedState::default()),
            last_request: RwLock::new(None),
            cycle: AtomicU64::new(0),
        }
    }

    /// Runs a cycle for `sources` over `window`.
    ///
    /// Returns false if a newer cycle started meanwhile, in which case this
    /// cycle's result was dropped.
    pub async fn load(&self, sources: Vec<EventSource>, window: TimeWindow) -> bool {
        let token = self.cycle.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_request.write().await = Some(Request {
            sources: sources.clone(),
            window,
        });
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }
        trace!(cycle = token, "cycle started");

        let result = self.aggregator.aggregate(&sources, window).await;

        let mut state = self.state.write().await;
        if self.cycle.load(Ordering::SeqCst) != token {
            debug!(cycle = token, "discarding superseded cycle");
            return false;
        }
        state.events = result.events;
        state.error = result.error;
        state.loading = false;
        trace!(cycle = token, events = state.events.len(), "cycle settled");
        true
    }

    /// Drops the cached result of the last request and runs it again.
    ///
    /// Returns false if nothing was loaded yet or the cycle was superseded.
    pub async fn refetch(&self) -> bool {
        let Some(request) = self.last_request.read().await.clone() else {
            debug!("refetch before any load");
            return false;
        };
        self.aggregator
            .invalidate(&request.sources, request.window)
            .await;
        self.load(request.sources, request.window).await
    }

    /// Returns a copy of the current state.
    pub async fn snapshot(&self) -> FeedState {
        self.state.read().await.clone()
    }

    /// Returns the current status.
    pub async fn status(&self) -> FeedStatus {
        self.state.read().await.status()
    }

    /// Returns the token of the most recent cycle, 0 before the first load.
    pub fn current_cycle(&self) -> u64 {
        self.cycle.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use chrono::{TimeZone, Utc};
    use eventfeed_core::SourceKind;
    use eventfeed_providers::{
        BoxFuture, FetcherRegistry, ListRecord, ProviderResult, RawRecord, SourceFetcher,
    };
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Returns one event per source; the source named "slow" takes a while.
    #[derive(Default)]
    struct PacedFetcher {
        calls: AtomicUsize,
    }

    impl SourceFetcher for PacedFetcher {
        fn name(&self) -> &str {
            "paced"
        }

        fn fetch<'a>(
            &'a self,
            source: &'a EventSource,
            _window: TimeWindow,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if source.id == "slow" {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok(vec![RawRecord::from(ListRecord::new(
                    1,
                    "2024-01-02T09:00:00Z",
                    "2024-01-02T10:00:00Z",
                ))])
            })
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap(),
        )
    }

    fn feed(fetcher: Arc<PacedFetcher>) -> EventFeed {
        let registry = FetcherRegistry::new().with(SourceKind::List, fetcher);
        EventFeed::new(Arc::new(Aggregator::new(
            registry,
            Arc::new(MemoryCache::new()),
        )))
    }

    #[test]
    fn status_is_exclusive() {
        let mut state = FeedState::default();
        assert_eq!(state.status(), FeedStatus::Settled);

        state.error = Some("boom".into());
        assert_eq!(state.status(), FeedStatus::Failed("boom".into()));

        state.loading = true;
        assert_eq!(state.status(), FeedStatus::Loading);
    }

    #[tokio::test]
    async fn load_settles_with_events() {
        let feed = feed(Arc::new(PacedFetcher::default()));
        assert_eq!(feed.current_cycle(), 0);

        assert!(feed.load(vec![EventSource::list("fast", "Fast", "Fast")], window()).await);

        let state = feed.snapshot().await;
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.events[0].id, "fast:1");
        assert!(!state.loading);
        assert_eq!(feed.status().await, FeedStatus::Settled);
        assert_eq!(feed.current_cycle(), 1);
    }

    #[tokio::test]
    async fn failed_cycle_reports_error() {
        let feed = feed(Arc::new(PacedFetcher::default()));
        let window = window();
        let inverted = TimeWindow {
            start: window.end,
            end: window.start,
        };

        feed.load(vec![EventSource::list("fast", "Fast", "Fast")], inverted).await;

        let state = feed.snapshot().await;
        assert!(state.events.is_empty());
        assert!(matches!(feed.status().await, FeedStatus::Failed(msg) if msg.starts_with("invalid date range")));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_cycle_is_discarded() {
        let feed = feed(Arc::new(PacedFetcher::default()));

        let (slow_applied, fast_applied) = tokio::join!(
            feed.load(vec![EventSource::list("slow", "Slow", "Slow")], window()),
            feed.load(vec![EventSource::list("fast", "Fast", "Fast")], window()),
        );

        assert!(!slow_applied);
        assert!(fast_applied);
        let state = feed.snapshot().await;
        assert_eq!(state.events.len(), 1);
        assert_eq!(state.events[0].source_id, "fast");
        assert_eq!(feed.status().await, FeedStatus::Settled);
    }

    #[tokio::test]
    async fn refetch_bypasses_cache() {
        let fetcher = Arc::new(PacedFetcher::default());
        let feed = feed(fetcher.clone());

        assert!(!feed.refetch().await);

        let sources = vec![EventSource::list("fast", "Fast", "Fast")];
        feed.load(sources.clone(), window()).await;
        feed.load(sources, window()).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        assert!(feed.refetch().await);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(feed.snapshot().await.events.len(), 1);
    }
}
