//! Coordinator configuration.

use std::time::Duration;

use skinport_core::{processed_cache_key, ConfigError, ServiceConfig};
use skinport_storage::Freshness;

/// Configuration for [`crate::RefreshCoordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Prefix of the single aggregate cache key (`<prefix>:processed`).
    pub key_prefix: String,

    /// Retention set on every write (default: 10 minutes)
    pub ttl: Option<Duration>,

    /// Background refresh cadence (default: 5 minutes)
    pub update_interval: Duration,

    /// Read-path policy for cache hits (default: any hit is fresh)
    pub freshness: Freshness,

    /// Default threshold for `is_data_fresh` (default: 5 minutes)
    pub freshness_threshold: Duration,

    /// Currency stamped on every response built from upstream data
    pub currency: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::from_service_config(&ServiceConfig::default())
    }
}

impl CoordinatorConfig {
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        Self {
            key_prefix: config.cache.key_prefix.clone(),
            ttl: config.cache.ttl,
            update_interval: config.update_interval,
            freshness: Freshness::Presence,
            freshness_threshold: config.cache.freshness_threshold,
            currency: config.upstream.currency.clone(),
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_freshness(mut self, freshness: Freshness) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_freshness_threshold(mut self, threshold: Duration) -> Self {
        self.freshness_threshold = threshold;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn cache_key(&self) -> String {
        processed_cache_key(&self.key_prefix)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "update_interval".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if let Some(ttl) = self.ttl {
            if ttl < self.update_interval {
                return Err(ConfigError::IncompatibleOptions {
                    option_a: format!("ttl ({}s)", ttl.as_secs()),
                    option_b: format!("update_interval ({}s)", self.update_interval.as_secs()),
                });
            }
        }

        if self.key_prefix.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "key_prefix".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_defaults() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.cache_key(), "skinport:items:processed");
        assert_eq!(config.ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert_eq!(config.freshness, Freshness::Presence);
        assert_eq!(config.currency, "EUR");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_must_cover_interval() {
        let config = CoordinatorConfig::default()
            .with_update_interval(Duration::from_secs(120))
            .with_ttl(Some(Duration::from_secs(60)));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompatibleOptions { .. })
        ));
    }

    #[test]
    fn test_blank_prefix_is_rejected() {
        let config = CoordinatorConfig::default().with_key_prefix("  ");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired { .. })
        ));
    }
}
