//! Error detail middleware
//!
//! Storage and internal failures leave the handler with a generic message and
//! the full text stashed in an [`ErrorDetail`] extension. In development the
//! detailed body replaces the generic one.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::ErrorDetail;
use crate::AppState;

pub async fn expose_error_detail(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;

    if !state.environment.is_development() {
        return response;
    }

    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => (response.status(), Json(detail)).into_response(),
        None => response,
    }
}
