//! Configuration types
//!
//! Typed configuration with development defaults. Loading from the environment
//! happens in the API crate; this module only holds the shapes, defaults and
//! semantic validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::ConfigError;

/// Browser user agents rotated by the direct Skinport fetcher.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/121.0",
];

// ============================================================================
// FETCHER
// ============================================================================

/// Retry and timeout settings for upstream requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Total attempts per logical request (not additional retries).
    pub max_retries: u32,
    /// Base delay; the wait after failed attempt `n` is `retry_delay * n`.
    pub retry_delay: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl FetcherConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Cache key, retention and freshness settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Physical retention; `None` keeps the entry until overwritten.
    pub ttl: Option<Duration>,
    pub key_prefix: String,
    /// Age under which cached data counts as fresh for the freshness query.
    pub freshness_threshold: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Some(Duration::from_secs(600)),
            key_prefix: "skinport:items".to_string(),
            freshness_threshold: Duration::from_secs(5 * 60),
        }
    }
}

impl CacheSettings {
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_freshness_threshold(mut self, threshold: Duration) -> Self {
        self.freshness_threshold = threshold;
        self
    }

    /// The aggregate cache key for this deployment.
    pub fn cache_key(&self) -> String {
        crate::processed_cache_key(&self.key_prefix)
    }
}

// ============================================================================
// UPSTREAM
// ============================================================================

/// Which upstream strategy supplies raw items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Direct call to the Skinport items API.
    Skinport,
    /// A preloaded JSON snapshot of the items list.
    Preloaded,
    /// The Skinport API reached through the ScraperAPI proxy.
    ScraperApi,
}

impl FetcherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skinport => "skinport",
            Self::Preloaded => "preloaded",
            Self::ScraperApi => "scraperapi",
        }
    }
}

impl std::str::FromStr for FetcherKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "skinport" | "direct" => Ok(Self::Skinport),
            "preloaded" | "snapshot" => Ok(Self::Preloaded),
            "scraperapi" | "scraper" => Ok(Self::ScraperApi),
            other => Err(ConfigError::InvalidValue {
                field: "SKINPORT_FETCHER".to_string(),
                value: other.to_string(),
                reason: "expected one of skinport, preloaded, scraperapi".to_string(),
            }),
        }
    }
}

/// Upstream endpoints and request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub skinport_base_url: String,
    pub app_id: u32,
    pub currency: String,
    pub preloaded_url: String,
    pub scraper_base_url: String,
    pub scraper_api_key: Option<String>,
    pub user_agents: Vec<String>,
    /// Extra headers sent by the direct fetcher.
    pub skinport_headers: BTreeMap<String, String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let skinport_headers = [
            ("Accept", "application/json"),
            ("Accept-Language", "en-US,en;q=0.9"),
            ("Cache-Control", "no-cache"),
            ("Referer", "https://skinport.com/"),
            ("Origin", "https://skinport.com"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            skinport_base_url: "https://api.skinport.com/v1/items".to_string(),
            app_id: 730,
            currency: "EUR".to_string(),
            preloaded_url: "https://www.dropbox.com/scl/fi/ryb5m9zhyvmox4uh8n1rz/items.json?rlkey=mhf3pguuw1rdy0a3s78f6ij34&st=yo5nlph5&dl=1".to_string(),
            scraper_base_url: "http://api.scraperapi.com".to_string(),
            scraper_api_key: None,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
            skinport_headers,
        }
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Master configuration for the price cache service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub bind_host: String,
    pub port: u16,
    pub redis_url: String,
    /// Bound on establishing the cache store connection.
    pub redis_connect_timeout: Duration,
    /// Background refresh cadence.
    pub update_interval: Duration,
    pub fetcher_kind: FetcherKind,
    pub fetcher: FetcherConfig,
    pub cache: CacheSettings,
    pub upstream: UpstreamConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 7777,
            redis_url: "redis://localhost:6379".to_string(),
            redis_connect_timeout: Duration::from_secs(2),
            update_interval: Duration::from_secs(5 * 60),
            fetcher_kind: FetcherKind::Preloaded,
            fetcher: FetcherConfig::default(),
            cache: CacheSettings::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Check semantic constraints between settings. A TTL, when set, must be
    /// at least the refresh interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "update_interval".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(ttl) = self.cache.ttl {
            if ttl < self.update_interval {
                return Err(ConfigError::IncompatibleOptions {
                    option_a: format!("cache.ttl ({}s)", ttl.as_secs()),
                    option_b: format!("update_interval ({}s)", self.update_interval.as_secs()),
                });
            }
        }

        if self.cache.key_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "cache.key_prefix".to_string(),
            });
        }

        if self.upstream.currency.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "upstream.currency".to_string(),
            });
        }

        if self.fetcher_kind == FetcherKind::ScraperApi
            && self
                .upstream
                .scraper_api_key
                .as_deref()
                .map_or(true, |key| key.trim().is_empty())
        {
            return Err(ConfigError::MissingRequired {
                field: "SCRAPERAPI_KEY".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.port, 7777);
        assert_eq!(config.cache.cache_key(), "skinport:items:processed");
        assert_eq!(config.fetcher.max_retries, 3);
        assert_eq!(config.fetcher.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_ttl_shorter_than_interval_is_rejected() {
        let config = ServiceConfig {
            cache: CacheSettings::default().with_ttl(Some(Duration::from_secs(60))),
            update_interval: Duration::from_secs(300),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompatibleOptions { .. })
        ));
    }

    #[test]
    fn test_no_ttl_is_accepted() {
        let config = ServiceConfig {
            cache: CacheSettings::default().with_ttl(None),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let config = ServiceConfig {
            update_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_scraper_requires_api_key() {
        let mut config = ServiceConfig {
            fetcher_kind: FetcherKind::ScraperApi,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));

        config.upstream.scraper_api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fetcher_kind_parsing() {
        assert_eq!("skinport".parse::<FetcherKind>().unwrap(), FetcherKind::Skinport);
        assert_eq!(" Preloaded ".parse::<FetcherKind>().unwrap(), FetcherKind::Preloaded);
        assert_eq!("scraperapi".parse::<FetcherKind>().unwrap(), FetcherKind::ScraperApi);
        assert!("carrier-pigeon".parse::<FetcherKind>().is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ttl_validation_follows_interval(interval_secs in 1u64..86_400, ttl_secs in 0u64..172_800) {
                let config = ServiceConfig {
                    cache: CacheSettings::default().with_ttl(Some(Duration::from_secs(ttl_secs))),
                    update_interval: Duration::from_secs(interval_secs),
                    ..Default::default()
                };
                prop_assert_eq!(config.validate().is_ok(), ttl_secs >= interval_secs);
            }

            #[test]
            fn fetcher_kind_names_round_trip(kind in prop_oneof![
                Just(FetcherKind::Skinport),
                Just(FetcherKind::Preloaded),
                Just(FetcherKind::ScraperApi),
            ]) {
                prop_assert_eq!(kind.as_str().parse::<FetcherKind>().unwrap(), kind);
            }
        }
    }
}
