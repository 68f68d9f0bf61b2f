//! SourceFetcher trait definition.
//!
//! A [`SourceFetcher`] knows how to pull raw records for one kind of
//! [`EventSource`]. The aggregator looks fetchers up by [`SourceKind`] in a
//! [`FetcherRegistry`], so a host can wire the SharePoint and Graph fetchers
//! shipped here or its own implementations (tests use in-memory fakes).
//!
//! Fetchers only talk to the upstream. Normalization, recurrence expansion
//! and merging happen afterwards, on the aggregator side.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use eventfeed_core::{EventSource, SourceKind, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_record::RawRecord;

/// A boxed future for async trait methods.
///
/// Keeps [`SourceFetcher`] and [`AccessTokenProvider`] object-safe so they
/// can live behind `Arc<dyn _>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetches the raw records of a source that intersect a window.
///
/// # Example Implementation
///
/// ```ignore
/// struct FixtureFetcher(Vec<RawRecord>);
///
/// impl SourceFetcher for FixtureFetcher {
///     fn name(&self) -> &str { "fixture" }
///
///     fn fetch<'a>(&'a self, _source: &'a EventSource, _window: TimeWindow)
///         -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>>
///     {
///         Box::pin(async move { Ok(self.0.clone()) })
///     }
/// }
/// ```
pub trait SourceFetcher: Send + Sync {
    /// Returns a short name for logs (e.g. "sharepoint", "graph").
    fn name(&self) -> &str;

    /// Fetches every record of `source` that may intersect `window`.
    ///
    /// Implementations handle paging internally and may return records
    /// outside the window; the aggregator filters after expansion.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network, authentication or decoding
    /// failures. The aggregator contains the error to this source.
    fn fetch<'a>(
        &'a self,
        source: &'a EventSource,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>>;
}

/// Supplies bearer tokens for upstream requests.
///
/// Token acquisition (MSAL, device code, managed identity) belongs to the
/// host; fetchers only ask for a token per resource.
pub trait AccessTokenProvider: Send + Sync {
    /// Returns a token valid for `resource`, the upstream origin
    /// (e.g. `https://contoso.sharepoint.com` or `https://graph.microsoft.com`).
    fn access_token<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, ProviderResult<String>>;
}

/// A fixed token, for scripts and tests.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Wraps a token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(<redacted>)")
    }
}

impl AccessTokenProvider for StaticToken {
    fn access_token<'a>(&'a self, _resource: &'a str) -> BoxFuture<'a, ProviderResult<String>> {
        let token = self.0.clone();
        Box::pin(async move {
            if token.trim().is_empty() {
                Err(ProviderError::authentication("no access token configured"))
            } else {
                Ok(token)
            }
        })
    }
}

/// Maps each source kind to the fetcher serving it.
#[derive(Clone, Default)]
pub struct FetcherRegistry {
    fetchers: HashMap<SourceKind, Arc<dyn SourceFetcher>>,
}

impl FetcherRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `fetcher` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: SourceKind, fetcher: Arc<dyn SourceFetcher>) {
        self.fetchers.insert(kind, fetcher);
    }

    /// Builder method to register a fetcher.
    pub fn with(mut self, kind: SourceKind, fetcher: Arc<dyn SourceFetcher>) -> Self {
        self.register(kind, fetcher);
        self
    }

    /// Returns the fetcher for `kind`, if any.
    pub fn get(&self, kind: SourceKind) -> Option<&Arc<dyn SourceFetcher>> {
        self.fetchers.get(&kind)
    }

    /// Returns true if no fetcher is registered.
    pub fn is_empty(&self) -> bool {
        self.fetchers.is_empty()
    }

    /// Fetches `source` with the fetcher registered for its kind.
    ///
    /// A missing fetcher is reported as [`ProviderErrorCode::UnsupportedSource`].
    /// Errors are tagged with the source id.
    ///
    /// [`ProviderErrorCode::UnsupportedSource`]: crate::error::ProviderErrorCode::UnsupportedSource
    pub async fn fetch(
        &self,
        source: &EventSource,
        window: TimeWindow,
    ) -> ProviderResult<Vec<RawRecord>> {
        let kind = source.kind();
        let Some(fetcher) = self.get(kind) else {
            return Err(
                ProviderError::unsupported(format!("no fetcher registered for {kind} sources"))
                    .with_source_id(&source.id),
            );
        };
        fetcher
            .fetch(source, window)
            .await
            .map_err(|err| match err.source_id() {
                Some(_) => err,
                None => err.with_source_id(&source.id),
            })
    }
}

impl fmt::Debug for FetcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.fetchers.keys().map(SourceKind::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("FetcherRegistry").field("kinds", &kinds).finish()
    }
}

/// A fetcher that always fails.
///
/// Registered in place of a fetcher that could not be built, so sources of
/// that kind degrade individually instead of aborting startup.
#[derive(Debug)]
pub struct ErrorFetcher {
    name: String,
    error: ProviderError,
}

impl ErrorFetcher {
    /// Creates a new error fetcher.
    pub fn new(name: impl Into<String>, error: ProviderError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl SourceFetcher for ErrorFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch<'a>(
        &'a self,
        source: &'a EventSource,
        _window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>> {
        let error = ProviderError::new(self.error.code(), self.error.message())
            .with_source_id(&source.id);
        Box::pin(async move { Err(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::raw_record::ListRecord;
    use chrono::{Duration, TimeZone, Utc};

    struct FixtureFetcher(Vec<RawRecord>);

    impl SourceFetcher for FixtureFetcher {
        fn name(&self) -> &str {
            "fixture"
        }

        fn fetch<'a>(
            &'a self,
            _source: &'a EventSource,
            _window: TimeWindow,
        ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>> {
            Box::pin(async move { Ok(self.0.clone()) })
        }
    }

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TimeWindow::new(start, start + Duration::days(7))
    }

    #[tokio::test]
    async fn registry_dispatches_by_kind() {
        let record = RawRecord::from(ListRecord::new(1, "2024-01-02T10:00:00Z", "2024-01-02T11:00:00Z"));
        let registry = FetcherRegistry::new()
            .with(SourceKind::List, Arc::new(FixtureFetcher(vec![record.clone()])));

        let source = EventSource::list("events", "Events", "Events");
        let records = registry.fetch(&source, window()).await.unwrap();
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn missing_fetcher_is_unsupported() {
        let registry = FetcherRegistry::new();
        let source = EventSource::group("team", "Team", "g-1");

        let err = registry.fetch(&source, window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::UnsupportedSource);
        assert_eq!(err.source_id(), Some("team"));
    }

    #[tokio::test]
    async fn error_fetcher_returns_error() {
        let fetcher = ErrorFetcher::new("graph", ProviderError::configuration("no token"));
        let registry = FetcherRegistry::new().with(SourceKind::MailboxCalendar, Arc::new(fetcher));
        let source = EventSource::mailbox("me", "Me", "me@contoso.com");

        let err = registry.fetch(&source, window()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
        assert_eq!(err.message(), "no token");
        assert_eq!(err.source_id(), Some("me"));
    }

    #[tokio::test]
    async fn static_token() {
        let token = StaticToken::new("abc");
        assert_eq!(token.access_token("https://graph.microsoft.com").await.unwrap(), "abc");
        assert_eq!(format!("{token:?}"), "StaticToken(<redacted>)");

        let empty = StaticToken::new("");
        let err = empty.access_token("x").await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
    }

    #[test]
    fn registry_debug_lists_kinds() {
        let registry = FetcherRegistry::new()
            .with(SourceKind::List, Arc::new(FixtureFetcher(vec![])))
            .with(SourceKind::GroupCalendar, Arc::new(FixtureFetcher(vec![])));
        assert_eq!(format!("{registry:?}"), r#"FetcherRegistry { kinds: ["group", "list"] }"#);
        assert!(!registry.is_empty());
    }
}
