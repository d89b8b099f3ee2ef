//! API Configuration Module
//!
//! Loads the service configuration from environment variables on top of the
//! typed defaults in `skinport-core`. Unparseable numbers fall back to the
//! default with a warning; semantic problems surface as [`ConfigError`]s.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use skinport_core::{ConfigError, FetcherKind, ServiceConfig};

/// Default cap on concurrently handled HTTP requests.
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 1024;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub service: ServiceConfig,
    pub max_concurrent_requests: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: HTTP port (default: 7777)
    /// - `SKINPORT_BIND`: bind host (default: 0.0.0.0)
    /// - `REDIS_URL`: cache store url (default: redis://localhost:6379)
    /// - `REDIS_CONNECT_TIMEOUT_MS`: store connect bound (default: 2000)
    /// - `UPDATE_INTERVAL_MIN`: background refresh cadence in minutes (default: 5)
    /// - `SKINPORT_FETCHER`: `skinport`, `preloaded` or `scraperapi` (default: preloaded)
    /// - `SCRAPERAPI_KEY`: required by the `scraperapi` fetcher
    /// - `SKINPORT_CURRENCY`: price currency (default: EUR)
    /// - `SKINPORT_APP_ID`: Steam app id (default: 730)
    /// - `SKINPORT_PRELOADED_URL`: snapshot url for the `preloaded` fetcher
    /// - `CACHE_TTL_SECS`: entry lifetime, 0 disables expiry (default: 600)
    /// - `CACHE_KEY_PREFIX`: cache key prefix (default: skinport:items)
    /// - `CACHE_FRESHNESS_MIN`: threshold for freshness checks (default: 5)
    /// - `FETCH_TIMEOUT_MS`: per-request timeout (default: 30000)
    /// - `FETCH_MAX_RETRIES`: attempts per upstream request (default: 3)
    /// - `FETCH_RETRY_DELAY_MS`: linear backoff unit (default: 2000)
    /// - `SKINPORT_MAX_CONCURRENT_REQUESTS`: HTTP concurrency cap (default: 1024)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };
        let defaults = ApiConfig::default();
        let mut service = defaults.service;

        service.port = env.parse_or("PORT", service.port);
        if let Some(host) = env.non_empty("SKINPORT_BIND") {
            service.bind_host = host;
        }
        if let Some(url) = env.non_empty("REDIS_URL") {
            service.redis_url = url;
        }
        service.redis_connect_timeout =
            env.millis_or("REDIS_CONNECT_TIMEOUT_MS", service.redis_connect_timeout);
        service.update_interval = env.minutes_or("UPDATE_INTERVAL_MIN", service.update_interval);

        if let Some(kind) = env.non_empty("SKINPORT_FETCHER") {
            service.fetcher_kind = FetcherKind::from_str(&kind)?;
        }
        service.upstream.scraper_api_key = env.non_empty("SCRAPERAPI_KEY");
        if let Some(currency) = env.non_empty("SKINPORT_CURRENCY") {
            service.upstream.currency = currency;
        }
        service.upstream.app_id = env.parse_or("SKINPORT_APP_ID", service.upstream.app_id);
        if let Some(url) = env.non_empty("SKINPORT_PRELOADED_URL") {
            service.upstream.preloaded_url = url;
        }

        let default_ttl_secs = service.cache.ttl.map(|ttl| ttl.as_secs()).unwrap_or(0);
        service.cache.ttl = match env.parse_or("CACHE_TTL_SECS", default_ttl_secs) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        if let Some(prefix) = env.non_empty("CACHE_KEY_PREFIX") {
            service.cache.key_prefix = prefix;
        }
        service.cache.freshness_threshold =
            env.minutes_or("CACHE_FRESHNESS_MIN", service.cache.freshness_threshold);

        service.fetcher.timeout = env.millis_or("FETCH_TIMEOUT_MS", service.fetcher.timeout);
        service.fetcher.max_retries = env.parse_or("FETCH_MAX_RETRIES", service.fetcher.max_retries);
        service.fetcher.retry_delay =
            env.millis_or("FETCH_RETRY_DELAY_MS", service.fetcher.retry_delay);

        let max_concurrent_requests = env
            .parse_or("SKINPORT_MAX_CONCURRENT_REQUESTS", defaults.max_concurrent_requests)
            .max(1);

        service.validate()?;

        Ok(Self {
            service,
            max_concurrent_requests,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.service.bind_host, self.service.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                field: "SKINPORT_BIND".to_string(),
                value: addr.clone(),
                reason: e.to_string(),
            })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn non_empty(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        match self.non_empty(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
                default
            }),
            None => default,
        }
    }

    fn millis_or(&self, key: &str, default: Duration) -> Duration {
        let millis = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.parse_or(key, millis))
    }

    fn minutes_or(&self, key: &str, default: Duration) -> Duration {
        Duration::from_secs(self.parse_or(key, default.as_secs() / 60).saturating_mul(60))
    }
}
