//! HTTP routes.

pub mod health;
pub mod items;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;

use crate::config::ApiConfig;
use crate::state::AppState;

/// Build the full service router.
pub fn create_api_router(state: Arc<AppState>, config: &ApiConfig) -> Router {
    Router::new()
        .route("/items", get(items::get_items))
        .with_state(state.clone())
        .nest("/health", health::create_router(state))
        .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
}
