//! Error types for phrase-core.

use thiserror::Error;

/// Result type alias using PhraseError.
pub type Result<T> = std::result::Result<T, PhraseError>;

/// Errors raised while building, converting or parsing phrases.
#[derive(Debug, Error)]
pub enum PhraseError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("timestamp out of range: {0}")]
    TimestampOutOfRange(i64),

    #[error("{field} must not be negative, got {value}")]
    NegativeCounter { field: &'static str, value: i64 },

    #[error("failed to parse generated phrases: {reason}")]
    MalformedResponse { reason: String, raw: String },
}
