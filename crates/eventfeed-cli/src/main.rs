//! eventfeed CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use eventfeed_core::init_tracing;
use tracing::debug;

use eventfeed_cli::cli::{Cli, Command, ConfigAction};
use eventfeed_cli::commands;
use eventfeed_cli::config::EventfeedConfig;
use eventfeed_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("warning: logging disabled: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(EventfeedConfig::default_path);
    let config = match &cli.config {
        Some(path) => EventfeedConfig::load_from(path)?,
        None => EventfeedConfig::load()?,
    };
    debug!(path = %config_path.display(), "configuration loaded");

    match cli.command {
        Command::Fetch(args) => commands::fetch::run(args, &config).await,
        Command::Sources { json } => commands::sources::run(&config, json),
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
