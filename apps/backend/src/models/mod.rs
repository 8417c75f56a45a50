//! Database rows and API types
//!
//! Two boundaries meet here. `DbPhrase`/`DbNewPhrase` carry the lowercase
//! storage columns, `PhraseResponse`/`PhraseInput`/`UpdatePhraseRequest` carry
//! the camelCase JSON shape. Both convert to and from the canonical
//! `phrase_core::Phrase`; nothing else touches either naming convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::services::generation::Level;

// Re-export shared types from phrase-core
pub use phrase_core::types::{Category, NewPhrase, Phrase, PhrasePatch, ReviewOutcome};
use phrase_core::{time, PhraseError};

// === Database Entity Types ===

/// Phrase stored in the `phrases` table
#[derive(Debug, Clone, FromRow)]
pub struct DbPhrase {
    pub id: Uuid,
    pub russian: String,
    pub german: String,
    pub transcription: Option<String>,
    pub context: Option<String>,
    pub category: String,
    #[sqlx(rename = "masterylevel")]
    pub mastery_level: i32,
    #[sqlx(rename = "lastreviewedat")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[sqlx(rename = "nextreviewat")]
    pub next_review_at: DateTime<Utc>,
    #[sqlx(rename = "knowcount")]
    pub know_count: i32,
    #[sqlx(rename = "knowstreak")]
    pub know_streak: i32,
    #[sqlx(rename = "ismastered")]
    pub is_mastered: bool,
}

impl DbPhrase {
    /// Convert to the canonical phrase.
    ///
    /// A row that violates the schema (unknown category, negative counter)
    /// is an internal error, not a client one.
    pub fn into_phrase(self) -> Result<Phrase> {
        let id = self.id;
        self.try_into_phrase()
            .map_err(|e| ApiError::Internal(format!("Corrupt phrase row {}: {}", id, e)))
    }

    fn try_into_phrase(self) -> std::result::Result<Phrase, PhraseError> {
        Ok(Phrase {
            id: self.id,
            category: self.category.parse()?,
            mastery_level: from_column("masterylevel", self.mastery_level)?,
            know_count: from_column("knowcount", self.know_count)?,
            know_streak: from_column("knowstreak", self.know_streak)?,
            russian: self.russian,
            german: self.german,
            transcription: self.transcription,
            context: self.context,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
            is_mastered: self.is_mastered,
        })
    }
}

/// Column values for inserting a phrase
#[derive(Debug, Clone)]
pub struct DbNewPhrase {
    pub russian: String,
    pub german: String,
    pub transcription: Option<String>,
    pub context: Option<String>,
    pub category: &'static str,
    pub mastery_level: i32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub know_count: i32,
    pub know_streak: i32,
    pub is_mastered: bool,
}

impl DbNewPhrase {
    /// Map every field to its column. Nothing is left out: absent optionals
    /// become NULL.
    pub fn from_new(phrase: &NewPhrase) -> Result<Self> {
        Ok(Self {
            russian: phrase.russian.clone(),
            german: phrase.german.clone(),
            transcription: phrase.transcription.clone(),
            context: phrase.context.clone(),
            category: phrase.category.as_str(),
            mastery_level: to_column("masteryLevel", phrase.mastery_level)?,
            last_reviewed_at: phrase.last_reviewed_at,
            next_review_at: phrase.next_review_at,
            know_count: to_column("knowCount", phrase.know_count)?,
            know_streak: to_column("knowStreak", phrase.know_streak)?,
            is_mastered: phrase.is_mastered(),
        })
    }
}

/// Counters are unsigned in the domain and INTEGER in storage.
pub fn to_column(field: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| ApiError::BadRequest(format!("{} is too large: {}", field, value)))
}

fn from_column(field: &'static str, value: i32) -> std::result::Result<u32, PhraseError> {
    u32::try_from(value).map_err(|_| PhraseError::NegativeCounter {
        field,
        value: i64::from(value),
    })
}

// === API Request/Response Types ===

/// Phrase as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseResponse {
    pub id: Uuid,
    pub russian: String,
    pub german: String,
    pub transcription: Option<String>,
    pub context: Option<String>,
    pub category: Category,
    pub mastery_level: u32,
    pub last_reviewed_at: Option<i64>,
    pub next_review_at: i64,
    pub know_count: u32,
    pub know_streak: u32,
    pub is_mastered: bool,
}

impl From<Phrase> for PhraseResponse {
    fn from(phrase: Phrase) -> Self {
        Self {
            id: phrase.id,
            russian: phrase.russian,
            german: phrase.german,
            transcription: phrase.transcription,
            context: phrase.context,
            category: phrase.category,
            mastery_level: phrase.mastery_level,
            last_reviewed_at: phrase.last_reviewed_at.map(time::to_millis),
            next_review_at: time::to_millis(phrase.next_review_at),
            know_count: phrase.know_count,
            know_streak: phrase.know_streak,
            is_mastered: phrase.is_mastered,
        }
    }
}

/// Body of `POST /api/phrases`, and one entry of a seed file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseInput {
    pub russian: String,
    pub german: String,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub mastery_level: Option<u32>,
    #[serde(default)]
    pub last_reviewed_at: Option<i64>,
    #[serde(default)]
    pub next_review_at: Option<i64>,
    #[serde(default)]
    pub know_count: Option<u32>,
    #[serde(default)]
    pub know_streak: Option<u32>,
    /// Accepted for compatibility; the stored flag is always derived.
    #[serde(default)]
    pub is_mastered: Option<bool>,
}

impl PhraseInput {
    /// Fill defaults: counters start at 0 and the phrase is due at `now`.
    pub fn into_new_phrase(self, now: DateTime<Utc>) -> std::result::Result<NewPhrase, PhraseError> {
        let next_review_at = time::from_optional_millis(self.next_review_at)?.unwrap_or(now);
        let mut phrase = NewPhrase::new(self.german, self.russian, self.category, next_review_at)
            .with_transcription(self.transcription)
            .with_context(self.context);

        phrase.mastery_level = self.mastery_level.unwrap_or(0);
        phrase.last_reviewed_at = time::from_optional_millis(self.last_reviewed_at)?;
        phrase.know_count = self.know_count.unwrap_or(0);
        phrase.know_streak = self.know_streak.unwrap_or(0);

        if let Some(claimed) = self.is_mastered {
            if claimed != phrase.is_mastered() {
                tracing::debug!(
                    german = %phrase.german,
                    claimed,
                    "Ignoring isMastered that disagrees with the counters"
                );
            }
        }

        phrase.validate()?;
        Ok(phrase)
    }
}

/// Body of `PUT /api/phrases/{id}`
///
/// For nullable fields an explicit `null` clears the value while a missing key
/// leaves it alone.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhraseRequest {
    pub russian: Option<String>,
    pub german: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub transcription: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub context: Option<Option<String>>,
    pub category: Option<Category>,
    pub mastery_level: Option<u32>,
    #[serde(default, deserialize_with = "present")]
    pub last_reviewed_at: Option<Option<i64>>,
    pub next_review_at: Option<i64>,
    pub know_count: Option<u32>,
    pub know_streak: Option<u32>,
    /// Ignored; the stored flag is always derived.
    pub is_mastered: Option<bool>,
}

impl UpdatePhraseRequest {
    pub fn into_patch(self) -> std::result::Result<PhrasePatch, PhraseError> {
        let last_reviewed_at = match self.last_reviewed_at {
            Some(millis) => Some(time::from_optional_millis(millis)?),
            None => None,
        };
        let next_review_at = time::from_optional_millis(self.next_review_at)?;

        let patch = PhrasePatch {
            russian: self.russian,
            german: self.german,
            transcription: self.transcription,
            context: self.context,
            category: self.category,
            mastery_level: self.mastery_level,
            last_reviewed_at,
            next_review_at,
            know_count: self.know_count,
            know_streak: self.know_streak,
        };
        patch.validate()?;
        Ok(patch)
    }
}

/// Wraps any present value, including `null`, in `Some`.
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Body of `POST /api/phrases/{id}/review`
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub outcome: ReviewOutcome,
}

/// Body of `POST /api/phrases/generate`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub count: Option<u32>,
    pub level: Option<Level>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub message: String,
}
