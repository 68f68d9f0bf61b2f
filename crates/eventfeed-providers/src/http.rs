//! HTTP plumbing shared by the SharePoint and Graph fetchers.
//!
//! Both upstreams speak OData: a page is `{ "value": [...] }` plus an
//! optional next link, and errors are plain HTTP statuses.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};

/// Upper bound on followed next links per fetch.
pub(crate) const MAX_PAGES: usize = 50;

/// One OData page. SharePoint (`odata=nometadata`) and Graph name the next
/// link differently.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ODataPage {
    #[serde(default)]
    pub value: Vec<Value>,
    #[serde(rename = "@odata.nextLink", alias = "odata.nextLink", default)]
    pub next_link: Option<String>,
}

pub(crate) fn build_client(timeout: Duration, user_agent: &str) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {e}")).with_cause(e))
}

/// Builds an OData query string. Option names (`$filter`, `$top`) are
/// kept literal; values are percent-encoded with spaces as `%20`, never `+`.
pub(crate) fn encode_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn send_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    };
    ProviderError::network(message).with_cause(e)
}

/// Maps a non-success status to the provider error taxonomy.
pub(crate) fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication("access token expired or invalid"),
        StatusCode::FORBIDDEN => ProviderError::authorization("access denied"),
        StatusCode::NOT_FOUND => ProviderError::not_found(format!("resource not found: {}", snippet(body))),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {s} seconds"))
                .unwrap_or_default()
        )),
        _ => ProviderError::server(format!("API error ({status}): {}", snippet(body))),
    }
}

fn snippet(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// GETs one page and decodes it.
pub(crate) async fn get_page(
    client: &reqwest::Client,
    url: &Url,
    token: &str,
    headers: HeaderMap,
    accept: &'static str,
) -> ProviderResult<ODataPage> {
    debug!(url = %url, "requesting page");
    let response = client
        .get(url.clone())
        .bearer_auth(token)
        .header(ACCEPT, accept)
        .headers(headers)
        .send()
        .await
        .map_err(send_error)?;

    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, retry_after, &body));
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::network(format!("failed to read response: {e}")).with_cause(e))?;
    parse_page(&body)
}

pub(crate) fn parse_page(body: &str) -> ProviderResult<ODataPage> {
    serde_json::from_str(body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {e}")).with_cause(e)
    })
}

/// Decodes page values one by one, skipping values that do not fit `T`.
pub(crate) fn decode_values<T: DeserializeOwned>(values: Vec<Value>, source_id: &str) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(source = source_id, error = %e, "skipping malformed record");
                None
            }
        })
        .collect()
}

/// Parses a next link, rejecting links that leave the original host.
pub(crate) fn next_url(current: &Url, next_link: Option<String>) -> ProviderResult<Option<Url>> {
    let Some(link) = next_link.filter(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let next = current
        .join(&link)
        .map_err(|e| ProviderError::invalid_response(format!("invalid next link: {e}")).with_cause(e))?;
    if next.host_str() != current.host_str() {
        return Err(ProviderError::invalid_response(format!(
            "next link points to another host: {}",
            next.host_str().unwrap_or_default()
        )));
    }
    Ok(Some(next))
}

/// Like [`next_url`], but stops once `fetched` pages reached [`MAX_PAGES`].
/// Stopping with a next link still pending drops the remaining pages, which
/// is logged.
pub(crate) fn next_page(
    current: &Url,
    next_link: Option<String>,
    fetched: usize,
    source_id: &str,
) -> ProviderResult<Option<Url>> {
    let Some(next) = next_url(current, next_link)? else {
        return Ok(None);
    };
    if fetched >= MAX_PAGES {
        warn!(source = source_id, pages = fetched, "page limit reached, results truncated");
        return Ok(None);
    }
    Ok(Some(next))
}

/// Returns the `scheme://host[:port]` of a url, used as token resource.
pub(crate) fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}
