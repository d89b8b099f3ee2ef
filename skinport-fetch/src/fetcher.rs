//! The upstream fetch strategy seam.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use skinport_core::{FetchError, FetcherConfig, FetcherKind, RawItem, UpstreamConfig};

use crate::strategies::{PreloadedFetcher, ScraperApiFetcher, SkinportFetcher};

/// Result type for upstream fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// A source of raw upstream items.
///
/// Implementations perform their own transport-level retries; a returned
/// error means the source is unavailable for this refresh.
#[async_trait]
pub trait ItemsFetcher: Send + Sync {
    async fn fetch_items(&self) -> FetchResult<Vec<RawItem>>;

    /// Strategy name used in logs.
    fn name(&self) -> &str;
}

/// Interpret an upstream body as a list of raw items.
pub fn items_from_value(source: &str, body: Value) -> FetchResult<Vec<RawItem>> {
    match body {
        Value::Array(items) => Ok(items.into_iter().map(RawItem::new).collect()),
        other => Err(FetchError::InvalidResponse {
            source_name: source.to_string(),
            reason: format!("expected an array of items, got {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Build the configured upstream strategy.
pub fn build_fetcher(
    kind: FetcherKind,
    upstream: &UpstreamConfig,
    fetcher: &FetcherConfig,
) -> FetchResult<Arc<dyn ItemsFetcher>> {
    let built: Arc<dyn ItemsFetcher> = match kind {
        FetcherKind::Skinport => Arc::new(SkinportFetcher::new(upstream, fetcher)?),
        FetcherKind::Preloaded => Arc::new(PreloadedFetcher::new(upstream, fetcher)?),
        FetcherKind::ScraperApi => Arc::new(ScraperApiFetcher::new(upstream, fetcher)?),
    };

    tracing::info!(fetcher = built.name(), "Upstream fetcher configured");
    Ok(built)
}
