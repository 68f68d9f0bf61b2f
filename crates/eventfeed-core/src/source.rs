//! Configured upstream calendar sources.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Id of the source used when no configuration is available.
pub const DEFAULT_SOURCE_ID: &str = "default";

/// Color given to sources that do not configure one.
pub const DEFAULT_SOURCE_COLOR: &str = "#0078d4";

/// The kind of upstream a source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A SharePoint events list.
    List,
    /// A user's mailbox calendar.
    MailboxCalendar,
    /// A Microsoft 365 group calendar.
    GroupCalendar,
}

impl SourceKind {
    /// Returns a short name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::MailboxCalendar => "mailbox",
            Self::GroupCalendar => "group",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How to reach a source. The variant is the source type and carries the one
/// connection parameter that type needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceConnection {
    /// A list on a SharePoint site.
    #[serde(rename_all = "camelCase")]
    List {
        list_title: String,
        /// Site hosting the list. The fetcher's default site when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        site_url: Option<String>,
    },
    /// The calendar of a mailbox (user principal name or email).
    #[serde(rename = "mailbox", rename_all = "camelCase")]
    MailboxCalendar { mailbox: String },
    /// The calendar of a group.
    #[serde(rename = "group", rename_all = "camelCase")]
    GroupCalendar { group_id: String },
}

impl SourceConnection {
    /// Returns the kind of this connection.
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::List { .. } => SourceKind::List,
            Self::MailboxCalendar { .. } => SourceKind::MailboxCalendar,
            Self::GroupCalendar { .. } => SourceKind::GroupCalendar,
        }
    }
}

/// A configured upstream calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    /// Unique, stable identifier. Prefixes the ids of every event it yields.
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub connection: SourceConnection,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_color() -> String {
    DEFAULT_SOURCE_COLOR.to_string()
}

fn default_enabled() -> bool {
    true
}

impl EventSource {
    /// Creates an enabled source with the default color.
    pub fn new(id: impl Into<String>, name: impl Into<String>, connection: SourceConnection) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            connection,
            color: default_color(),
            enabled: true,
        }
    }

    /// Creates a source backed by a SharePoint list.
    pub fn list(id: impl Into<String>, name: impl Into<String>, list_title: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            SourceConnection::List {
                list_title: list_title.into(),
                site_url: None,
            },
        )
    }

    /// Creates a source backed by a mailbox calendar.
    pub fn mailbox(id: impl Into<String>, name: impl Into<String>, mailbox: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            SourceConnection::MailboxCalendar {
                mailbox: mailbox.into(),
            },
        )
    }

    /// Creates a source backed by a group calendar.
    pub fn group(id: impl Into<String>, name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self::new(
            id,
            name,
            SourceConnection::GroupCalendar {
                group_id: group_id.into(),
            },
        )
    }

    /// Builder method to set the color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Builder method to enable or disable the source.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Returns the kind of upstream.
    pub fn kind(&self) -> SourceKind {
        self.connection.kind()
    }
}

/// The built-in source: the site's `Events` list.
pub fn default_source() -> EventSource {
    EventSource::list(DEFAULT_SOURCE_ID, "Events", "Events")
}

/// Parses the JSON-serialized source list.
///
/// Empty input, invalid JSON and an empty array all yield the single
/// [`default_source`].
pub fn parse_sources(json: &str) -> Vec<EventSource> {
    if json.trim().is_empty() {
        return vec![default_source()];
    }
    match serde_json::from_str::<Vec<EventSource>>(json) {
        Ok(sources) if !sources.is_empty() => sources,
        Ok(_) => vec![default_source()],
        Err(e) => {
            warn!(error = %e, "unparseable source configuration, using built-in source");
            vec![default_source()]
        }
    }
}

/// Returns the enabled sources, in configuration order.
pub fn get_enabled_sources(sources: &[EventSource]) -> Vec<&EventSource> {
    sources.iter().filter(|s| s.enabled).collect()
}
