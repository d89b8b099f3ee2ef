//! Concrete upstream strategies.

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::IndexedRandom;
use serde_json::Value;

use skinport_core::{FetchError, FetcherConfig, RawItem, UpstreamConfig, DEFAULT_USER_AGENTS};

use crate::client::{RequestSpec, ResilientClient};
use crate::fetcher::{items_from_value, FetchResult, ItemsFetcher};

// ============================================================================
// DIRECT
// ============================================================================

/// Calls the Skinport items API directly with browser-like headers.
///
/// The public endpoint sits behind bot protection, so this strategy may be
/// rejected in some environments; [`PreloadedFetcher`] is the default.
#[derive(Debug, Clone)]
pub struct SkinportFetcher {
    client: ResilientClient,
    base_url: String,
    app_id: u32,
    currency: String,
    headers: Vec<(String, String)>,
}

impl SkinportFetcher {
    pub fn new(upstream: &UpstreamConfig, fetcher: &FetcherConfig) -> FetchResult<Self> {
        let user_agent = pick_user_agent(&upstream.user_agents);
        let mut headers: Vec<(String, String)> = upstream
            .skinport_headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        headers.push(("User-Agent".to_string(), user_agent));

        Ok(Self {
            client: ResilientClient::new(fetcher)?,
            base_url: upstream.skinport_base_url.clone(),
            app_id: upstream.app_id,
            currency: upstream.currency.clone(),
            headers,
        })
    }

    /// The request for one fetch. `_t` defeats intermediary caches.
    pub fn request_spec(&self) -> RequestSpec {
        let spec = RequestSpec::get(&self.base_url)
            .with_query("app_id", self.app_id)
            .with_query("currency", &self.currency)
            .with_query("_t", Utc::now().timestamp_millis());

        self.headers
            .iter()
            .fold(spec, |spec, (name, value)| spec.with_header(name, value))
    }
}

#[async_trait]
impl ItemsFetcher for SkinportFetcher {
    async fn fetch_items(&self) -> FetchResult<Vec<RawItem>> {
        let body: Value = self.client.request(&self.request_spec()).await?;
        items_from_value(self.name(), body)
    }

    fn name(&self) -> &str {
        "skinport"
    }
}

fn pick_user_agent(candidates: &[String]) -> String {
    let mut rng = rand::rng();
    candidates
        .choose(&mut rng)
        .cloned()
        .or_else(|| DEFAULT_USER_AGENTS.choose(&mut rng).map(|ua| ua.to_string()))
        .unwrap_or_default()
}

// ============================================================================
// PRELOADED
// ============================================================================

/// Reads a preloaded JSON snapshot of the Skinport items list.
#[derive(Debug, Clone)]
pub struct PreloadedFetcher {
    client: ResilientClient,
    url: String,
}

impl PreloadedFetcher {
    pub fn new(upstream: &UpstreamConfig, fetcher: &FetcherConfig) -> FetchResult<Self> {
        Ok(Self {
            client: ResilientClient::new(fetcher)?,
            url: upstream.preloaded_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ItemsFetcher for PreloadedFetcher {
    async fn fetch_items(&self) -> FetchResult<Vec<RawItem>> {
        let body: Value = self.client.get(&self.url, &[]).await?;
        items_from_value(self.name(), body)
    }

    fn name(&self) -> &str {
        "preloaded"
    }
}

// ============================================================================
// SCRAPER PROXY
// ============================================================================

/// Fetches the Skinport API through the ScraperAPI proxy.
#[derive(Debug, Clone)]
pub struct ScraperApiFetcher {
    client: ResilientClient,
    api_key: Option<String>,
    target_url: String,
    app_id: u32,
    currency: String,
}

impl ScraperApiFetcher {
    pub fn new(upstream: &UpstreamConfig, fetcher: &FetcherConfig) -> FetchResult<Self> {
        Ok(Self {
            client: ResilientClient::new(fetcher)?.with_base_url(&upstream.scraper_base_url),
            api_key: upstream
                .scraper_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            target_url: upstream.skinport_base_url.clone(),
            app_id: upstream.app_id,
            currency: upstream.currency.clone(),
        })
    }

    /// The proxied request, or [`FetchError::NotConfigured`] without an API key.
    pub fn request_spec(&self) -> FetchResult<RequestSpec> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FetchError::NotConfigured {
                field: "SCRAPERAPI_KEY".to_string(),
            })?;

        Ok(RequestSpec::get("")
            .with_query("api_key", api_key)
            .with_query("url", &self.target_url)
            .with_query("app_id", self.app_id)
            .with_query("currency", &self.currency))
    }
}

#[async_trait]
impl ItemsFetcher for ScraperApiFetcher {
    async fn fetch_items(&self) -> FetchResult<Vec<RawItem>> {
        let spec = self.request_spec()?;
        let body: Value = self.client.request(&spec).await?;
        items_from_value(self.name(), body)
    }

    fn name(&self) -> &str {
        "scraperapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skinport_request_carries_query_and_headers() {
        let fetcher =
            SkinportFetcher::new(&UpstreamConfig::default(), &FetcherConfig::default()).unwrap();
        let spec = fetcher.request_spec();

        assert_eq!(spec.url, "https://api.skinport.com/v1/items");
        let keys: Vec<&str> = spec.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["app_id", "currency", "_t"]);
        assert!(spec.query.contains(&("currency".to_string(), "EUR".to_string())));

        let user_agent = spec
            .headers
            .iter()
            .find(|(k, _)| k == "User-Agent")
            .map(|(_, v)| v.as_str())
            .unwrap();
        assert!(DEFAULT_USER_AGENTS.contains(&user_agent));
        assert!(spec.headers.iter().any(|(k, v)| k == "Origin" && v == "https://skinport.com"));
    }

    #[test]
    fn test_pick_user_agent_falls_back_to_defaults() {
        let ua = pick_user_agent(&[]);
        assert!(DEFAULT_USER_AGENTS.contains(&ua.as_str()));
        assert_eq!(pick_user_agent(&["only".to_string()]), "only");
    }

    #[tokio::test]
    async fn test_scraper_without_key_fails_before_network() {
        let fetcher =
            ScraperApiFetcher::new(&UpstreamConfig::default(), &FetcherConfig::default()).unwrap();
        let err = fetcher.fetch_items().await.unwrap_err();
        assert_eq!(
            err,
            FetchError::NotConfigured {
                field: "SCRAPERAPI_KEY".to_string()
            }
        );
        assert_eq!(err.attempts(), 0);
    }

    #[test]
    fn test_scraper_request_targets_skinport() {
        let upstream = UpstreamConfig {
            scraper_api_key: Some("secret".to_string()),
            ..Default::default()
        };
        let fetcher = ScraperApiFetcher::new(&upstream, &FetcherConfig::default()).unwrap();
        let spec = fetcher.request_spec().unwrap();

        assert_eq!(spec.url, "");
        assert!(spec.query.contains(&("api_key".to_string(), "secret".to_string())));
        assert!(spec.query.contains(&(
            "url".to_string(),
            "https://api.skinport.com/v1/items".to_string()
        )));
    }
}
