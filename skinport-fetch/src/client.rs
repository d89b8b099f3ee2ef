//! HTTP client with per-attempt timeouts and retries.

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::time::Duration;

use skinport_core::{FetchError, FetcherConfig};

use crate::retry::{with_retry, RetryPolicy};

/// Maximum number of response body characters kept in an error message.
const ERROR_BODY_LIMIT: usize = 200;

/// A logical request; replayed as-is on every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Upstream HTTP client: bounded attempts, linear backoff, JSON bodies.
///
/// Non-2xx statuses, transport errors, timeouts and undecodable bodies all
/// count as failed attempts.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    http: Client,
    base_url: Option<String>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl ResilientClient {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Failed {
                context: "HTTP client construction".to_string(),
                attempts: 0,
                last_error: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: None,
            policy: RetryPolicy::from(config),
            timeout: config.timeout,
        })
    }

    /// Resolve relative request URLs against `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URLs pass through; anything else is joined onto the base URL.
    /// An empty path addresses the base URL itself.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        match self.base_url.as_deref() {
            Some(base) if url.is_empty() => base.to_string(),
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }

    /// Send `spec`, retrying per the policy, and decode the JSON body.
    pub async fn request<T: DeserializeOwned>(&self, spec: &RequestSpec) -> Result<T, FetchError> {
        let url = self.resolve_url(&spec.url);
        let context = format!("HTTP Request to {}", url);
        let url = url.as_str();

        with_retry(&self.policy, &context, move |_attempt| self.attempt(spec, url)).await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let spec = query
            .iter()
            .fold(RequestSpec::get(url), |spec, (k, v)| spec.with_query(*k, v));
        self.request(&spec).await
    }

    async fn attempt<T: DeserializeOwned>(&self, spec: &RequestSpec, url: &str) -> Result<T, String> {
        let mut builder = self.http.request(spec.method.clone(), url);
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        for (name, value) in &spec.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(format!("HTTP {}: {}", status, snippet));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?;

        serde_json::from_slice(&bytes).map_err(|e| format!("invalid JSON response: {}", e))
    }
}
