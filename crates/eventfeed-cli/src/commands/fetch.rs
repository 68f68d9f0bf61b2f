//! `eventfeed fetch`.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use eventfeed_aggregator::{Aggregator, AggregatorConfig, EventFeed, FeedStatus, MemoryCache};
use eventfeed_core::{
    CanonicalEvent, EventSource, SourceKind, TimeWindow, apply_source_colors, describe_recurrence,
    filter_by_visible_sources,
};
use eventfeed_providers::{
    AccessTokenProvider, ErrorFetcher, FetcherRegistry, ProviderError, StaticToken,
};
use tracing::{debug, warn};

use crate::cli::FetchArgs;
use crate::config::EventfeedConfig;
use crate::error::{CliError, CliResult};

/// Window length when only `--start` is given.
const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Runs one aggregation cycle and prints the result.
pub async fn run(args: FetchArgs, config: &EventfeedConfig) -> CliResult<()> {
    let window = resolve_window(args.start.as_deref(), args.end.as_deref(), Utc::now())?;
    let sources = config.resolved_sources();

    let mut aggregator_config = AggregatorConfig::new().with_cache_ttl(config.cache.ttl());
    if args.no_cache {
        aggregator_config = aggregator_config.without_cache();
    }
    let aggregator = Aggregator::new(build_registry(config)?, Arc::new(MemoryCache::new()))
        .with_config(aggregator_config);
    let feed = EventFeed::new(Arc::new(aggregator));

    let events = collect(&feed, &sources, window, &args.visible).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
    } else if events.is_empty() {
        println!("No events.");
    } else {
        for event in &events {
            println!("{}", format_event(event));
        }
    }
    Ok(())
}

/// Loads `sources` into `feed`, then applies source colors and visibility.
pub async fn collect(
    feed: &EventFeed,
    sources: &[EventSource],
    window: TimeWindow,
    visible: &[String],
) -> CliResult<Vec<CanonicalEvent>> {
    feed.load(sources.to_vec(), window).await;
    let state = feed.snapshot().await;
    if let FeedStatus::Failed(message) = state.status() {
        return Err(CliError::Aggregate(message));
    }

    let colored = apply_source_colors(&state.events, sources);
    Ok(filter_by_visible_sources(colored, visible)
        .into_iter()
        .map(Cow::into_owned)
        .collect())
}

/// Registers a fetcher for every source kind this build supports.
///
/// A fetcher that cannot be built is replaced by an [`ErrorFetcher`], so
/// only its sources fail.
pub fn build_registry(config: &EventfeedConfig) -> CliResult<FetcherRegistry> {
    let token = config.resolve_token()?.unwrap_or_default();
    if token.is_empty() {
        warn!("no access token configured, remote sources will fail to authenticate");
    }
    let tokens: Arc<dyn AccessTokenProvider> = Arc::new(StaticToken::new(token));
    let mut registry = FetcherRegistry::new();

    #[cfg(feature = "sharepoint")]
    {
        use eventfeed_providers::sharepoint::{SharePointConfig, SharePointFetcher};

        let mut sp_config = SharePointConfig::new();
        if let Some(site) = &config.sharepoint.site_url {
            sp_config = sp_config
                .with_default_site(site)
                .map_err(|e| CliError::config(format!("invalid sharepoint.site_url: {e}")))?;
        }
        if config.sharepoint.extended_columns {
            sp_config = sp_config.with_extended_columns();
        }
        match SharePointFetcher::new(sp_config, tokens.clone()) {
            Ok(fetcher) => registry.register(SourceKind::List, Arc::new(fetcher)),
            Err(e) => registry.register(SourceKind::List, Arc::new(ErrorFetcher::new("sharepoint", e))),
        }
    }

    #[cfg(feature = "graph")]
    {
        use eventfeed_providers::graph::{GraphConfig, GraphFetcher};

        let mut graph_config = GraphConfig::new();
        if let Some(base_url) = &config.graph.base_url {
            graph_config = graph_config
                .with_base_url(base_url)
                .map_err(|e| CliError::config(format!("invalid graph.base_url: {e}")))?;
        }
        match GraphFetcher::new(graph_config, tokens) {
            Ok(fetcher) => {
                let fetcher = Arc::new(fetcher);
                registry.register(SourceKind::MailboxCalendar, fetcher.clone());
                registry.register(SourceKind::GroupCalendar, fetcher);
            }
            Err(e) => {
                for kind in [SourceKind::MailboxCalendar, SourceKind::GroupCalendar] {
                    let error = ProviderError::new(e.code(), e.message());
                    registry.register(kind, Arc::new(ErrorFetcher::new("graph", error)));
                }
            }
        }
    }

    debug!(?registry, "fetchers registered");
    Ok(registry)
}

/// Resolves `--start`/`--end`. Dates mean midnight UTC.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> CliResult<TimeWindow> {
    let start = match start {
        Some(value) => parse_instant(value)?,
        None => now.date_naive().and_hms_opt(0, 0, 0).map_or(now, |dt| dt.and_utc()),
    };
    let window = match end {
        Some(value) => TimeWindow::try_new(start, parse_instant(value)?),
        None => TimeWindow::starting_at(start, Duration::days(DEFAULT_WINDOW_DAYS)),
    };
    window.ok_or(CliError::InvalidWindow)
}

fn parse_instant(value: &str) -> CliResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| CliError::InvalidDate(value.to_string()))
}

/// One line per event, plus indented detail lines.
pub fn format_event(event: &CanonicalEvent) -> String {
    let when = if event.is_all_day {
        format!("{}  all day    ", event.start.format("%Y-%m-%d"))
    } else {
        format!(
            "{} {}-{}",
            event.start.format("%Y-%m-%d"),
            event.start.format("%H:%M"),
            event.end.format("%H:%M")
        )
    };

    let mut out = format!("{when}  {}  [{}]", event.title, event.source_id);
    if let Some(location) = &event.location {
        out.push_str(&format!("\n    at {location}"));
    }
    if let Some(rule) = &event.recurrence {
        out.push_str(&format!("\n    {}", describe_recurrence(rule)));
    } else if event.is_recurring {
        out.push_str("\n    recurring");
    }
    if let Some(url) = &event.join_url {
        out.push_str(&format!("\n    join: {url}"));
    }
    out
}
