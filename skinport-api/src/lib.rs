//! Skinport API
//!
//! HTTP surface of the price cache service: `GET /items` backed by the
//! refresh coordinator, health endpoints, environment configuration and
//! tracing setup. The `skinport-api` binary wires these together.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
