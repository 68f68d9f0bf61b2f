//! The `eventfeed` command-line interface.
//!
//! Reads sources and credentials from `config.toml`, runs one aggregation
//! cycle over the requested window and prints the merged events.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use error::{CliError, CliResult};
