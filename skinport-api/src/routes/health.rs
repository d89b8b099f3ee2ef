//! Health Check Endpoints
//!
//! - /health - Cache store connectivity, version and uptime
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//!
//! The service keeps answering without its cache, so a failing store reports
//! `degraded` with HTTP 200. Coordinator state is never consulted.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use skinport_core::{HealthCheck, HealthStatus};

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub store: ComponentHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<HealthCheck> for ComponentHealth {
    fn from(check: HealthCheck) -> Self {
        Self {
            status: check.status,
            latency_ms: check.response_time_ms,
            error: check.message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: HealthStatus,
    pub message: String,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live
pub async fn liveness() -> impl IntoResponse {
    let response = LivenessResponse {
        status: HealthStatus::Healthy,
        message: "Process is alive".to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = ComponentHealth::from(state.store.health().await);

    let status = if store.status == HealthStatus::Healthy {
        HealthStatus::Healthy
    } else {
        tracing::warn!(error = ?store.error, "Cache store unhealthy");
        HealthStatus::Degraded
    };

    let response = HealthResponse {
        status,
        store,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    (StatusCode::OK, Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .with_state(state)
}
