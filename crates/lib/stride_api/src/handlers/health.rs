//! Health endpoint.

use axum::Json;

use crate::models::HealthResponse;

/// `GET /api/health`: liveness probe, no auth.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: stride_core::version().into(),
    })
}
