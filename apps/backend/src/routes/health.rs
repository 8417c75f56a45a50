//! Liveness endpoint

use axum::{http::StatusCode, http::Uri, Json};
use chrono::Utc;
use phrase_core::time;

use crate::error::ErrorResponse;
use crate::models::HealthResponse;

/// GET /health and GET /api/health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: time::to_iso(Utc::now()),
        message: "German Practice API is running".to_string(),
    })
}

/// Fallback for unmatched routes
pub async fn not_found(uri: Uri) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not_found".to_string(),
            message: format!("Route {} not found", uri.path()),
            raw: None,
        }),
    )
}
