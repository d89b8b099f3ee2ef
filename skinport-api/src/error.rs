//! Error Types for the Skinport API
//!
//! `ApiError` carries an [`ErrorCode`] that decides the HTTP status and a
//! human-readable detail. Responses use the body shape the purchase service
//! already understands:
//!
//! ```json
//! { "success": false, "message": "Service unavailable", "error": "<detail>" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use skinport_core::{ConfigError, RefreshError, SkinportError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Configuration could not be loaded or validated
    InvalidConfig,

    /// No data could be produced for the request
    ServiceUnavailable,

    /// Startup or serving failed for an internal reason
    InternalError,
}

impl ErrorCode {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidConfig | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "Invalid configuration",
            ErrorCode::ServiceUnavailable => "Service unavailable",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

/// Wire form of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub error: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfig, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            message: self.code.default_message().to_string(),
            error: self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        ApiError::service_unavailable(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::invalid_config(err.to_string())
    }
}

impl From<SkinportError> for ApiError {
    fn from(err: SkinportError) -> Self {
        match err {
            SkinportError::Config(e) => e.into(),
            SkinportError::Refresh(e) => e.into(),
            SkinportError::Store(e) => {
                ApiError::internal_error(format!("Cache store setup failed: {}", e))
            }
            SkinportError::Fetch(e) => {
                ApiError::internal_error(format!("Upstream fetcher setup failed: {}", e))
            }
            other => ApiError::internal_error(other.to_string()),
        }
    }
}
