//! Item price endpoint.

use axum::{extract::State, Json};
use std::sync::Arc;

use skinport_core::ServiceResponse;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /items
///
/// 200 with the current [`ServiceResponse`] (fresh or stale), 503 when no
/// data exists at all.
pub async fn get_items(State(state): State<Arc<AppState>>) -> ApiResult<Json<ServiceResponse>> {
    match state.coordinator.get_items().await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::error!(error = %e, "Items request failed");
            Err(ApiError::from(e))
        }
    }
}
