//! CLI configuration.
//!
//! Settings live in a single `config.toml`, at
//! `~/.config/eventfeed/config.toml` by default:
//!
//! ```toml
//! sources = '[{"id": "news", "name": "News", "type": "list", "listTitle": "Events"}]'
//!
//! [auth]
//! token = "env::EVENTFEED_TOKEN"
//!
//! [sharepoint]
//! site_url = "https://contoso.sharepoint.com/sites/intranet"
//!
//! [cache]
//! ttl_secs = 300
//! ```
//!
//! `sources` is either the JSON string a host stores, or `[[sources]]`
//! tables. When it is missing, empty or unparseable the built-in source is
//! used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use eventfeed_core::{EventSource, default_source, parse_sources};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Configuration for the eventfeed CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventfeedConfig {
    /// Configured sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourcesSetting>,

    pub auth: AuthSettings,

    pub sharepoint: SharePointSettings,

    pub graph: GraphSettings,

    pub cache: CacheSettings,
}

/// The two accepted shapes of `sources`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourcesSetting {
    /// JSON-serialized source array.
    Json(String),
    /// `[[sources]]` tables.
    Tables(Vec<EventSource>),
}

/// Credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Bearer token, or an `env::VAR` reference to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// SharePoint list settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharePointSettings {
    /// Site used by list sources that do not name their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Also select banner, category color and registration columns.
    pub extended_columns: bool,
}

/// Microsoft Graph settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Alternative Graph endpoint, e.g. a national cloud.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Result lifetime in seconds. 0 disables caching.
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheSettings {
    /// Returns the TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl EventfeedConfig {
    /// Loads the configuration from the default path, or defaults if the
    /// file does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads the configuration from a specific path.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| CliError::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventfeed")
            .join("config.toml")
    }

    /// Returns the sources to aggregate. Never empty.
    pub fn resolved_sources(&self) -> Vec<EventSource> {
        match &self.sources {
            None => vec![default_source()],
            Some(SourcesSetting::Json(json)) => parse_sources(json),
            Some(SourcesSetting::Tables(tables)) if tables.is_empty() => vec![default_source()],
            Some(SourcesSetting::Tables(tables)) => tables.clone(),
        }
    }

    /// Returns the bearer token with `env::` references expanded.
    pub fn resolve_token(&self) -> CliResult<Option<String>> {
        self.auth.token.as_deref().map(resolve_secret).transpose()
    }
}

/// Expands an `env::VAR` reference; anything else is returned as-is.
pub fn resolve_secret(value: &str) -> CliResult<String> {
    match value.strip_prefix("env::") {
        Some(var) => std::env::var(var)
            .map_err(|_| CliError::config(format!("environment variable `{var}` is not set"))),
        None => Ok(value.to_string()),
    }
}
