//! SharePoint list fetcher.

use std::sync::Arc;

use eventfeed_core::{EventSource, SourceConnection, TimeWindow};
use reqwest::header::HeaderMap;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::{AccessTokenProvider, BoxFuture, SourceFetcher};
use crate::raw_record::{ListRecord, RawRecord};

use super::config::SharePointConfig;

const ACCEPT_NOMETADATA: &str = "application/json;odata=nometadata";

/// Fetches items from SharePoint events lists through the REST API.
pub struct SharePointFetcher {
    config: SharePointConfig,
    http_client: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl std::fmt::Debug for SharePointFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharePointFetcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SharePointFetcher {
    /// Creates a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: SharePointConfig,
        tokens: Arc<dyn AccessTokenProvider>,
    ) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout, &config.user_agent)?;
        Ok(Self {
            config,
            http_client,
            tokens,
        })
    }

    /// Builds the first page url for a list source.
    pub fn items_url(&self, source: &EventSource, window: TimeWindow) -> ProviderResult<Url> {
        let SourceConnection::List {
            list_title,
            site_url,
        } = &source.connection
        else {
            return Err(ProviderError::configuration(format!(
                "sharepoint fetcher cannot serve {} sources",
                source.kind()
            )));
        };

        let site = match site_url {
            Some(site) => Url::parse(site.trim_end_matches('/')).map_err(|e| {
                ProviderError::configuration(format!("invalid site url '{site}': {e}"))
            })?,
            None => self.config.default_site.clone().ok_or_else(|| {
                ProviderError::configuration("no site url for list source and no default site")
            })?,
        };

        // Single quotes inside an OData string literal are doubled.
        let title = urlencoding::encode(&list_title.replace('\'', "''")).into_owned();
        let base = format!(
            "{}/_api/web/lists/getbytitle('{}')/items",
            site.as_str().trim_end_matches('/'),
            title
        );
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::configuration(format!("invalid list url: {e}")))?;

        let query = http::encode_query(&[
            ("$select", self.config.select.join(",")),
            ("$expand", "Author".to_string()),
            ("$filter", window_filter(window)),
            ("$top", self.config.page_size.to_string()),
        ]);
        url.set_query(Some(&query));
        Ok(url)
    }

    #[instrument(skip(self, source), fields(source = %source.id))]
    async fn fetch_list(
        &self,
        source: &EventSource,
        window: TimeWindow,
    ) -> ProviderResult<Vec<RawRecord>> {
        let mut url = self.items_url(source, window)?;
        let token = self.tokens.access_token(&http::origin(&url)).await?;

        let mut records = Vec::new();
        let mut fetched = 0;
        loop {
            let page =
                http::get_page(&self.http_client, &url, &token, HeaderMap::new(), ACCEPT_NOMETADATA)
                    .await?;
            records.extend(
                http::decode_values::<ListRecord>(page.value, &source.id)
                    .into_iter()
                    .map(RawRecord::List),
            );
            fetched += 1;
            match http::next_page(&url, page.next_link, fetched, &source.id)? {
                Some(next) => url = next,
                None => break,
            }
        }

        debug!(count = records.len(), "fetched list items");
        Ok(records)
    }
}

/// Items overlapping the window: starting before its end and ending after
/// its start. Recurring items span their whole series, so they match too.
fn window_filter(window: TimeWindow) -> String {
    format!(
        "EventDate le datetime'{}' and EndDate ge datetime'{}'",
        window.end.format("%Y-%m-%dT%H:%M:%SZ"),
        window.start.format("%Y-%m-%dT%H:%M:%SZ"),
    )
}

impl SourceFetcher for SharePointFetcher {
    fn name(&self) -> &str {
        "sharepoint"
    }

    fn fetch<'a>(
        &'a self,
        source: &'a EventSource,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawRecord>>> {
        Box::pin(self.fetch_list(source, window))
    }
}
