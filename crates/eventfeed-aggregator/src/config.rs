//! Aggregator configuration.

use std::time::Duration;

/// Configuration for an [`Aggregator`](crate::Aggregator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// How long an aggregated result stays cached. Zero disables the cache.
    pub cache_ttl: Duration,

    /// Prefix for cache keys, so several feeds can share one store.
    pub cache_namespace: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(Self::DEFAULT_CACHE_TTL_SECS),
            cache_namespace: Self::DEFAULT_NAMESPACE.to_string(),
        }
    }
}

impl AggregatorConfig {
    /// Default cache TTL in seconds.
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

    /// Default cache key prefix.
    pub const DEFAULT_NAMESPACE: &'static str = "events";

    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Builder: disable caching.
    pub fn without_cache(self) -> Self {
        self.with_cache_ttl(Duration::ZERO)
    }

    /// Builder: set the cache key prefix.
    pub fn with_cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.cache_namespace = namespace.into();
        self
    }

    /// Returns true if results are cached.
    pub fn caching_enabled(&self) -> bool {
        !self.cache_ttl.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AggregatorConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_namespace, "events");
        assert!(config.caching_enabled());
    }

    #[test]
    fn builder() {
        let config = AggregatorConfig::new()
            .with_cache_ttl(Duration::from_secs(60))
            .with_cache_namespace("intranet");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_namespace, "intranet");
        assert!(!config.without_cache().caching_enabled());
    }
}
