//! CLI error types.

use std::path::PathBuf;

use eventfeed_providers::ProviderError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`crate::config::EventfeedConfig`].
    #[error("failed to parse {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A date argument could not be parsed.
    #[error("invalid date '{0}', expected YYYY-MM-DD or an RFC 3339 timestamp")]
    InvalidDate(String),

    /// The requested window ends before it starts.
    #[error("--start must not be after --end")]
    InvalidWindow,

    /// A fetcher could not be set up.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The aggregation cycle failed.
    #[error("aggregation failed: {0}")]
    Aggregate(String),

    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to serialize config: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
