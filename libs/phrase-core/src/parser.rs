//! Parser for phrase batches returned by a text generation provider.
//!
//! # Format
//! The provider is asked for a bare JSON array:
//! ```json
//! [
//!   {"german": "Guten Morgen", "russian": "Доброе утро", "transcription": "[гутен морген]",
//!    "context": "Утреннее приветствие", "category": "general"}
//! ]
//! ```
//! Responses often arrive wrapped in a markdown code fence, so everything
//! outside the outermost `[` … `]` is discarded before parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PhraseError, Result};
use crate::types::{Category, NewPhrase};

/// One phrase as produced by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPhrase {
    pub german: String,
    pub russian: String,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    pub category: Category,
}

impl GeneratedPhrase {
    /// Turn into an unreviewed phrase due at `now`.
    pub fn into_new_phrase(self, now: DateTime<Utc>) -> NewPhrase {
        NewPhrase::new(self.german, self.russian, self.category, now)
            .with_transcription(self.transcription)
            .with_context(self.context)
    }
}

/// Parse a raw provider response into phrases.
///
/// The whole batch is rejected on any error; the raw response is kept in the
/// error for diagnosis.
pub fn parse_generated(raw: &str) -> Result<Vec<GeneratedPhrase>> {
    let json = extract_array(raw);

    let phrases: Vec<GeneratedPhrase> =
        serde_json::from_str(json).map_err(|e| PhraseError::MalformedResponse {
            reason: e.to_string(),
            raw: raw.to_string(),
        })?;

    for phrase in &phrases {
        if phrase.german.trim().is_empty() || phrase.russian.trim().is_empty() {
            return Err(PhraseError::MalformedResponse {
                reason: "phrase with empty german or russian text".to_string(),
                raw: raw.to_string(),
            });
        }
    }

    Ok(phrases)
}

/// Slice from the first `[` to the last `]`, or return the trimmed input when
/// there is no such span.
fn extract_array(raw: &str) -> &str {
    let trimmed = raw.trim();
    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
