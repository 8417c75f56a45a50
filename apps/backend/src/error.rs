//! Error handling for the backend API

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::generation::GenerationError;

/// Message shown instead of storage and internal failures outside development.
pub const GENERIC_MESSAGE: &str = "Something went wrong";

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Full error text attached to responses whose body was made generic.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub ErrorResponse);

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::InvalidBody(rejection) => (rejection.status(), "invalid_body"),
            ApiError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            ApiError::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Generation(GenerationError::NotConfigured) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_unavailable")
            }
            ApiError::Generation(GenerationError::Parse { .. }) => {
                (StatusCode::BAD_GATEWAY, "generation_parse_error")
            }
            ApiError::Generation(GenerationError::Provider(_)) => {
                (StatusCode::BAD_GATEWAY, "generation_error")
            }
        }
    }

    /// Storage and internal failures hide their text from clients.
    fn is_opaque(&self) -> bool {
        matches!(
            self,
            ApiError::Database(_)
                | ApiError::Migration(_)
                | ApiError::Storage(_)
                | ApiError::Internal(_)
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_kind();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let raw = match &self {
            ApiError::Generation(GenerationError::Parse { raw, .. }) => Some(raw.clone()),
            _ => None,
        };

        let detailed = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
            raw,
        };

        if !self.is_opaque() {
            return (status, Json(detailed)).into_response();
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: GENERIC_MESSAGE.to_string(),
            raw: None,
        };
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ErrorDetail(detailed));
        response
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
