//! Configuration commands.

use std::path::Path;

use tracing::debug;
use url::Url;

use crate::config::EventfeedConfig;
use crate::error::{CliError, CliResult};

/// Dumps the effective configuration to stdout.
pub fn dump(config: &EventfeedConfig, path: &Path) -> CliResult<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("# config.toml ({})", path.display());
    println!("{toml_str}");
    Ok(())
}

/// Validates the configuration.
pub fn validate(config: &EventfeedConfig) -> CliResult<()> {
    check(config)?;
    println!("Configuration is valid.");
    Ok(())
}

/// Shows the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

/// Checks everything `fetch` would need, without network access.
pub fn check(config: &EventfeedConfig) -> CliResult<()> {
    config.resolve_token()?;

    if let Some(site) = &config.sharepoint.site_url {
        url_like(site).map_err(|e| CliError::config(format!("invalid sharepoint.site_url: {e}")))?;
    }
    if let Some(base) = &config.graph.base_url {
        url_like(base).map_err(|e| CliError::config(format!("invalid graph.base_url: {e}")))?;
    }

    let sources = config.resolved_sources();
    let mut seen = std::collections::HashSet::new();
    for source in &sources {
        if source.id.trim().is_empty() {
            return Err(CliError::config(format!("source '{}' has an empty id", source.name)));
        }
        if !seen.insert(source.id.as_str()) {
            return Err(CliError::config(format!("duplicate source id '{}'", source.id)));
        }
    }
    debug!(sources = sources.len(), "configuration checked");
    Ok(())
}

fn url_like(value: &str) -> Result<(), String> {
    let url = Url::parse(value).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourcesSetting;
    use eventfeed_core::EventSource;

    #[test]
    fn default_config_is_valid() {
        assert!(check(&EventfeedConfig::default()).is_ok());
    }

    #[test]
    fn rejects_duplicate_source_ids() {
        let config = EventfeedConfig {
            sources: Some(SourcesSetting::Tables(vec![
                EventSource::list("a", "A", "A"),
                EventSource::mailbox("a", "Also A", "a@contoso.com"),
            ])),
            ..Default::default()
        };
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate source id 'a'"));
    }

    #[test]
    fn rejects_bad_urls() {
        let mut config = EventfeedConfig::default();
        config.sharepoint.site_url = Some("contoso.sharepoint.com".into());
        assert!(check(&config).is_err());

        config.sharepoint.site_url = Some("https://contoso.sharepoint.com/sites/a".into());
        config.graph.base_url = Some("ftp://graph".into());
        assert!(check(&config).is_err());
    }
}
