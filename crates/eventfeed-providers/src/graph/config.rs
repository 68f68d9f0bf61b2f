//! Microsoft Graph fetcher configuration.

use std::time::Duration;
use url::Url;

/// Graph v1.0 endpoint.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Event properties requested through `$select`.
pub const DEFAULT_SELECT: &[&str] = &[
    "id",
    "subject",
    "bodyPreview",
    "start",
    "end",
    "isAllDay",
    "location",
    "organizer",
    "attendees",
    "recurrence",
    "seriesMasterId",
    "onlineMeeting",
    "webLink",
    "categories",
    "responseRequested",
    "isCancelled",
];

/// Configuration for the Graph calendar fetcher.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    /// API root, without a trailing slash.
    pub base_url: String,

    /// Page size passed as `$top`.
    pub page_size: u32,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_BASE_URL.to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("eventfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GraphConfig {
    /// Default `$top`. Graph caps calendar pages well below SharePoint.
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Points the fetcher at another API root (national clouds, proxies).
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        let url = Url::parse(url.as_ref().trim_end_matches('/'))?;
        self.base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Sets the page size; zero is ignored.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
