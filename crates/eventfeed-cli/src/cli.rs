//! Command-line interface definition.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use eventfeed_core::TracingConfig;

/// eventfeed - events from every configured calendar, in one list
#[derive(Debug, Parser)]
#[command(name = "eventfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "EVENTFEED_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log JSON lines with span timings to stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Returns the logging setup selected by `--log-json` and `-v`.
    pub fn tracing_config(&self) -> TracingConfig {
        if self.log_json {
            TracingConfig::host()
        } else {
            TracingConfig::from_verbosity(self.verbose)
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch, merge and print events
    Fetch(FetchArgs),

    /// List configured sources
    Sources {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `eventfeed fetch`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FetchArgs {
    /// Window start, YYYY-MM-DD or RFC 3339 (default: today)
    #[arg(long)]
    pub start: Option<String>,

    /// Window end, YYYY-MM-DD or RFC 3339 (default: 30 days after start)
    #[arg(long)]
    pub end: Option<String>,

    /// Only show events of this source (can be repeated)
    #[arg(long = "visible", value_name = "ID", action = ArgAction::Append)]
    pub visible: Vec<String>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Bypass the result cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
