//! Error types for Skinport cache operations
//!
//! Failures are absorbed at the lowest layer that can provide a safe default.
//! Only [`RefreshError::NoDataAvailable`] crosses the coordinator boundary.

use thiserror::Error;

/// Cache store errors. Absorbed by the tolerant store adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cache store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Cache store operation {operation} timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Invalid cache store url: {reason}")]
    InvalidUrl { reason: String },
}

/// Cache envelope codec errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// Malformed envelope. Callers treat this exactly like a cache miss.
    #[error("Envelope parse error: {reason}")]
    Parse { reason: String },

    #[error("Envelope serialization failed: {reason}")]
    Serialize { reason: String },
}

/// Upstream fetch errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("{context} failed after {attempts} attempts: {last_error}")]
    Failed {
        context: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Fetcher not configured: {field} is required")]
    NotConfigured { field: String },

    #[error("Invalid response from {source_name}: {reason}")]
    InvalidResponse { source_name: String, reason: String },
}

impl FetchError {
    /// Number of attempts made before giving up, if any were made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Failed { attempts, .. } => *attempts,
            Self::NotConfigured { .. } => 0,
            Self::InvalidResponse { .. } => 1,
        }
    }
}

/// A single malformed raw item. Dropped and logged, never aborts a batch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    #[error("Raw item is not a JSON object")]
    NotAnObject,

    #[error("Raw item has no identifying name")]
    MissingName,

    #[error("Raw item has an unusable name: {reason}")]
    InvalidName { reason: String },
}

/// Errors surfaced by the refresh coordinator's read path.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The upstream fetch failed and there is no cached aggregate to fall back to.
    #[error("Failed to fetch data and no cache available: {reason}")]
    NoDataAvailable { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Incompatible options: {option_a} and {option_b}")]
    IncompatibleOptions { option_a: String, option_b: String },
}

/// Master error type for all Skinport service errors.
#[derive(Debug, Clone, Error)]
pub enum SkinportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Item error: {0}")]
    Item(#[from] ItemError),

    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Skinport operations.
pub type SkinportResult<T> = Result<T, SkinportError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_failed_display() {
        let err = FetchError::Failed {
            context: "HTTP Request to https://api.skinport.com/v1/items".to_string(),
            attempts: 3,
            last_error: "connection reset".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("failed after 3 attempts"));
        assert!(msg.contains("connection reset"));
        assert_eq!(err.attempts(), 3);
    }

    #[test]
    fn test_no_data_available_display() {
        let err = RefreshError::NoDataAvailable {
            reason: "upstream down".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("no cache available"));
        assert!(msg.contains("upstream down"));
    }

    #[test]
    fn test_not_configured_makes_no_attempts() {
        let err = FetchError::NotConfigured {
            field: "SCRAPERAPI_KEY".to_string(),
        };
        assert_eq!(err.attempts(), 0);
        assert!(format!("{}", err).contains("SCRAPERAPI_KEY"));
    }

    #[test]
    fn test_skinport_error_from_variants() {
        let store = SkinportError::from(StoreError::Unavailable {
            reason: "refused".to_string(),
        });
        assert!(matches!(store, SkinportError::Store(_)));

        let envelope = SkinportError::from(EnvelopeError::Parse {
            reason: "eof".to_string(),
        });
        assert!(matches!(envelope, SkinportError::Envelope(_)));

        let item = SkinportError::from(ItemError::MissingName);
        assert!(matches!(item, SkinportError::Item(_)));

        let refresh = SkinportError::from(RefreshError::NoDataAvailable {
            reason: "x".to_string(),
        });
        assert!(matches!(refresh, SkinportError::Refresh(_)));

        let config = SkinportError::from(ConfigError::MissingRequired {
            field: "REDIS_URL".to_string(),
        });
        assert!(matches!(config, SkinportError::Config(_)));
    }
}
