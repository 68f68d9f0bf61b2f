//! SharePoint fetcher configuration.

use std::time::Duration;
use url::Url;

/// Columns requested from an events list.
pub const DEFAULT_SELECT: &[&str] = &[
    "Id",
    "Title",
    "Description",
    "EventDate",
    "EndDate",
    "Location",
    "Category",
    "fAllDayEvent",
    "fRecurrence",
    "Author/Title",
    "Author/EMail",
];

/// Custom columns found on event lists provisioned by the intranet
/// templates. Added with [`SharePointConfig::with_extended_columns`].
pub const EXTENDED_SELECT: &[&str] = &[
    "CategoryColor",
    "BannerUrl",
    "EnableRegistration",
    "EnableRsvp",
];

/// Configuration for the SharePoint list fetcher.
#[derive(Debug, Clone)]
pub struct SharePointConfig {
    /// Site used by list sources that do not name their own.
    pub default_site: Option<Url>,

    /// Columns passed as `$select`.
    pub select: Vec<String>,

    /// Page size passed as `$top`.
    pub page_size: u32,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl Default for SharePointConfig {
    fn default() -> Self {
        Self {
            default_site: None,
            select: DEFAULT_SELECT.iter().map(|c| c.to_string()).collect(),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("eventfeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SharePointConfig {
    /// Default `$top`.
    pub const DEFAULT_PAGE_SIZE: u32 = 500;

    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration without a default site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default site.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn with_default_site(mut self, url: impl AsRef<str>) -> Result<Self, url::ParseError> {
        self.default_site = Some(Url::parse(url.as_ref().trim_end_matches('/'))?);
        Ok(self)
    }

    /// Also selects the [`EXTENDED_SELECT`] columns.
    pub fn with_extended_columns(mut self) -> Self {
        for column in EXTENDED_SELECT {
            if !self.select.iter().any(|c| c == column) {
                self.select.push(column.to_string());
            }
        }
        self
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
