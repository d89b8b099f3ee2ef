//! Skinport Core - Domain Types
//!
//! Pure data structures shared by every crate in the workspace: upstream and
//! processed items, the cached service response, the error taxonomy,
//! configuration types and health reporting. No I/O lives here.

use chrono::{DateTime, Utc};

pub mod config;
pub mod error;
pub mod health;
pub mod item;
pub mod response;

pub use config::{
    CacheSettings, FetcherConfig, FetcherKind, ServiceConfig, UpstreamConfig,
    DEFAULT_USER_AGENTS,
};
pub use error::{
    ConfigError, EnvelopeError, FetchError, ItemError, RefreshError, SkinportError,
    SkinportResult, StoreError,
};
pub use health::{HealthCheck, HealthStatus};
pub use item::{ProcessedItem, RawItem};
pub use response::{CacheStatus, ServiceResponse};

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Build the single aggregate cache key for a deployment prefix.
///
/// The coordinator manages exactly one cached aggregate, stored under
/// `"<prefix>:processed"`.
pub fn processed_cache_key(prefix: &str) -> String {
    format!("{}:processed", prefix)
}
