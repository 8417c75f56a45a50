//! Millisecond-epoch timestamp helpers.
//!
//! Clients exchange timestamps as milliseconds since the Unix epoch; storage
//! keeps them as UTC timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{PhraseError, Result};

pub fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or(PhraseError::TimestampOutOfRange(millis))
}

pub fn from_optional_millis(millis: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    millis.map(from_millis).transpose()
}

pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn to_iso(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
