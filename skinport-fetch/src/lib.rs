//! Skinport Fetch - Upstream Access
//!
//! A resilient HTTP client with bounded retries and linear backoff, the
//! [`ItemsFetcher`] strategy trait consumed by the refresh coordinator, and
//! the concrete upstream strategies:
//!
//! - [`SkinportFetcher`]: the Skinport items API, called directly
//! - [`PreloadedFetcher`]: a preloaded JSON snapshot of the items list
//! - [`ScraperApiFetcher`]: the Skinport API through the ScraperAPI proxy

pub mod client;
pub mod fetcher;
pub mod retry;
pub mod strategies;

pub use client::{RequestSpec, ResilientClient};
pub use fetcher::{build_fetcher, items_from_value, FetchResult, ItemsFetcher};
pub use retry::{with_retry, RetryPolicy};
pub use strategies::{PreloadedFetcher, ScraperApiFetcher, SkinportFetcher};
