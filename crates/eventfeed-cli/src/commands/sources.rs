//! `eventfeed sources`.

use eventfeed_core::{EventSource, SourceConnection};

use crate::config::EventfeedConfig;
use crate::error::CliResult;

/// Prints the configured sources.
pub fn run(config: &EventfeedConfig, json: bool) -> CliResult<()> {
    let sources = config.resolved_sources();
    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }
    for source in &sources {
        println!("{}", format_source(source));
    }
    Ok(())
}

/// One line per source: state, id, kind, color, name and target.
pub fn format_source(source: &EventSource) -> String {
    let state = if source.enabled { "on " } else { "off" };
    let target = match &source.connection {
        SourceConnection::List {
            list_title,
            site_url: Some(site),
        } => format!("{list_title} @ {site}"),
        SourceConnection::List { list_title, .. } => list_title.clone(),
        SourceConnection::MailboxCalendar { mailbox } => mailbox.clone(),
        SourceConnection::GroupCalendar { group_id } => group_id.clone(),
    };
    format!(
        "[{state}] {:<12} {:<8} {}  {} ({target})",
        source.id,
        source.kind().as_str(),
        source.color,
        source.name
    )
}
