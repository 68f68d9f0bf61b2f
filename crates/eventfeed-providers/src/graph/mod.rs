//! Microsoft Graph calendar fetcher.
//!
//! Serves mailbox and group calendar sources:
//!
//! ```text
//! GET /users/{mailbox}/calendar/events?$filter=start/dateTime le '{end}'
//! GET /groups/{groupId}/calendar/events?$filter=start/dateTime le '{end}'
//! Prefer: outlook.timezone="UTC"
//! ```
//!
//! Pages are followed through `@odata.nextLink`. Events come back as
//! [`RawRecord::CalendarApi`](crate::RawRecord::CalendarApi).

mod config;
mod fetcher;

pub use config::{DEFAULT_SELECT, GRAPH_BASE_URL, GraphConfig};
pub use fetcher::GraphFetcher;
