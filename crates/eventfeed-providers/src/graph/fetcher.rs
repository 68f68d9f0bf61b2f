//! Microsoft Graph calendar fetcher.

use std::sync::Arc;

use eventfeed_core::{EventSource, SourceConnection, TimeWindow};
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::{AccessTokenProvider, BoxFuture, SourceFetcher};
use crate::raw_record::{CalendarApiRecord, RawRecord};

use super::config::{DEFAULT_SELECT, GraphConfig};

const ACCEPT_JSON: &str = "application/json";

/// Fetches mailbox and group calendar events from Microsoft Graph.
///
/// Series masters are returned with their recurrence object rather than
/// as expanded instances; expansion happens downstream.
pub struct GraphFetcher {
    config: GraphConfig,
    http_client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl std::fmt::Debug for GraphFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GraphFetcher {
    /// Creates a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: GraphConfig, tokens: Arc<dyn AccessTokenProvider>) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            config,
            http_client,
            tokens,
        })
    }

    /// Builds the first page url for a calendar source.
    pub fn events_url(&self, source: &EventSource, window: TimeWindow) -> ProviderResult<Url> {
        let path = match &source.connection {
            SourceConnection::MailboxCalendar { mailbox } => {
                format!("users/{}/calendar/events", urlencoding::encode(mailbox.trim()))
            }
            SourceConnection::GroupCalendar { group_id } => {
                format!("groups/{}/calendar/events", urlencoding::encode(group_id.trim()))
            }
            SourceConnection::List { .. } => {
                return Err(ProviderError::configuration(format!(
                    "graph fetcher cannot serve {} sources",
                    source.kind()
                )));
            }
        };

        let mut url = Url::parse(&format!("{}/{}", self.config.base_url, path)).map_err(|e| {
            ProviderError::configuration(format!("invalid graph url: {e}")).with_cause(e)
        })?;
        let query = http::encode_query(&[
            ("$select", DEFAULT_SELECT.join(",")),
            ("$filter", window_filter(window)),
            ("$top", self.config.page_size.to_string()),
        ]);
        url.set_query(Some(&query));
        Ok(url)
    }

    #[instrument(skip(self, source), fields(source = %source.id))]
    async fn fetch_calendar(
        &self,
        source: &EventSource,
        window: TimeWindow,
    ) -> ProviderResult<Vec<RawRecord>> {
        let mut url = self.events_url(source, window)?;
        let token = self.tokens.access_token(&http::origin(&url)).await?;

        let mut headers = HeaderMap::new();
        headers.insert("prefer", HeaderValue::from_static("outlook.timezone=\"UTC\""));

        let mut records = Vec::new();
        let mut fetched = 0;
        loop {
            let page =
                http::get_page(&self.http_client, &url, &token, headers.clone(), ACCEPT_JSON).await?;
            records.extend(
                http::decode_values::<CalendarApiRecord>(page.value, &source.id)
                    .into_iter()
                    .map(RawRecord::CalendarApi),
            );
            fetched += 1;
            match http::next_page(&url, page.next_link, fetched, &source.id)? {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = records.len(), "fetched calendar events");
        Ok(records)
    }
}

/// Events starting before the window ends and ending after it starts.
/// Series masters only carry their first occurrence, so they are kept
/// regardless of their end and expanded downstream.
fn window_filter(window: TimeWindow) -> String {
    format!(
        "start/dateTime le '{}' and (type eq 'seriesMaster' or end/dateTime ge '{}')",
        window.end.format("%Y-%m-%dT%H:%M:%S"),
        window.start.format("%Y-%m-%dT%H:%M:%S"),
    )
}

impl SourceFetcher for GraphFetcher {
    fn name(&self) -> &str {
        "graph"
    }

    fn fetch<'a>(
        &'a self,
        source: &'a EventSource,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>> {
        Box::pin(self.fetch_calendar(source, window))
    }
}
