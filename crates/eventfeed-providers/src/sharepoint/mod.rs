//! SharePoint events list fetcher.
//!
//! Reads list items through the SharePoint REST API:
//!
//! ```text
//! GET {site}/_api/web/lists/getbytitle('{list}')/items
//!     ?$select=...&$expand=Author&$filter=<window>&$top=500
//! Accept: application/json;odata=nometadata
//! ```
//!
//! Pages are followed through `odata.nextLink`. Items come back as
//! [`RawRecord::List`](crate::RawRecord::List).
//!
//! # Example
//!
//! ```ignore
//! use eventfeed_providers::sharepoint::{SharePointConfig, SharePointFetcher};
//! use eventfeed_providers::StaticToken;
//!
//! let config = SharePointConfig::new()
//!     .with_default_site("https://contoso.sharepoint.com/sites/intranet")?;
//! let fetcher = SharePointFetcher::new(config, Arc::new(StaticToken::new(token)))?;
//! ```

mod config;
mod fetcher;

pub use config::{DEFAULT_SELECT, EXTENDED_SELECT, SharePointConfig};
pub use fetcher::SharePointFetcher;
