use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the transfer store answers.
    pub transfer_store_healthy: bool,
    pub openai_configured: bool,
    pub replicate_configured: bool,
}

/// GET /health -- returns service health and which providers are configured.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let transfer_store_healthy = state.transfer.has_transferred_shots("").is_ok();

    let status = if transfer_store_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        transfer_store_healthy,
        openai_configured: state.openai.is_some(),
        replicate_configured: state.replicate.is_some(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
