//! Core types for the phrase trainer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PhraseError, Result};
use crate::mastery;

/// Topic a phrase belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    General,
    WFragen,
    Pronouns,
    Numbers,
    Time,
    Money,
    Calendar,
    Holidays,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 8] = [
        Self::General,
        Self::WFragen,
        Self::Pronouns,
        Self::Numbers,
        Self::Time,
        Self::Money,
        Self::Calendar,
        Self::Holidays,
    ];

    /// Wire and column name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::WFragen => "w-fragen",
            Self::Pronouns => "pronouns",
            Self::Numbers => "numbers",
            Self::Time => "time",
            Self::Money => "money",
            Self::Calendar => "calendar",
            Self::Holidays => "holidays",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = PhraseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| PhraseError::UnknownCategory(s.to_string()))
    }
}

/// Answer the learner gave when a phrase was shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Known,
    Unknown,
}

/// A stored phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    pub id: Uuid,
    pub russian: String,
    pub german: String,
    pub transcription: Option<String>,
    pub context: Option<String>,
    pub category: Category,
    pub mastery_level: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub know_count: u32,
    pub know_streak: u32,
    pub is_mastered: bool,
}

impl Phrase {
    /// Apply a partial update. Fields absent from the patch keep their values;
    /// `is_mastered` is recomputed afterwards.
    pub fn apply_patch(&mut self, patch: &PhrasePatch) {
        if let Some(russian) = &patch.russian {
            self.russian = russian.clone();
        }
        if let Some(german) = &patch.german {
            self.german = german.clone();
        }
        if let Some(transcription) = &patch.transcription {
            self.transcription = normalize_optional(transcription.clone());
        }
        if let Some(context) = &patch.context {
            self.context = normalize_optional(context.clone());
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(level) = patch.mastery_level {
            self.mastery_level = level;
        }
        if let Some(last_reviewed_at) = patch.last_reviewed_at {
            self.last_reviewed_at = last_reviewed_at;
        }
        if let Some(next_review_at) = patch.next_review_at {
            self.next_review_at = next_review_at;
        }
        if let Some(count) = patch.know_count {
            self.know_count = count;
        }
        if let Some(streak) = patch.know_streak {
            self.know_streak = streak;
        }
        self.is_mastered = mastery::is_mastered(self.know_count, self.know_streak);
    }
}

/// A phrase that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhrase {
    pub russian: String,
    pub german: String,
    pub transcription: Option<String>,
    pub context: Option<String>,
    pub category: Category,
    pub mastery_level: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
    pub know_count: u32,
    pub know_streak: u32,
}

impl NewPhrase {
    /// Create an unreviewed phrase due at `now`.
    pub fn new(
        german: impl Into<String>,
        russian: impl Into<String>,
        category: Category,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            russian: russian.into(),
            german: german.into(),
            transcription: None,
            context: None,
            category,
            mastery_level: 0,
            last_reviewed_at: None,
            next_review_at: now,
            know_count: 0,
            know_streak: 0,
        }
    }

    pub fn with_transcription(mut self, transcription: Option<String>) -> Self {
        self.transcription = normalize_optional(transcription);
        self
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = normalize_optional(context);
        self
    }

    /// Mastery flag derived from the counters.
    pub fn is_mastered(&self) -> bool {
        mastery::is_mastered(self.know_count, self.know_streak)
    }

    /// Check the text fields storage requires.
    pub fn validate(&self) -> Result<()> {
        require_text("german", &self.german)?;
        require_text("russian", &self.russian)
    }

    /// Attach the id assigned by storage.
    pub fn into_phrase(self, id: Uuid) -> Phrase {
        let is_mastered = self.is_mastered();
        Phrase {
            id,
            russian: self.russian,
            german: self.german,
            transcription: self.transcription,
            context: self.context,
            category: self.category,
            mastery_level: self.mastery_level,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
            know_count: self.know_count,
            know_streak: self.know_streak,
            is_mastered,
        }
    }
}

/// Partial update of a stored phrase.
///
/// Nullable fields are doubly optional: `None` leaves the stored value alone,
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhrasePatch {
    pub russian: Option<String>,
    pub german: Option<String>,
    pub transcription: Option<Option<String>>,
    pub context: Option<Option<String>>,
    pub category: Option<Category>,
    pub mastery_level: Option<u32>,
    pub last_reviewed_at: Option<Option<DateTime<Utc>>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub know_count: Option<u32>,
    pub know_streak: Option<u32>,
}

impl PhrasePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Text fields present in the patch must not be blank.
    pub fn validate(&self) -> Result<()> {
        if let Some(german) = &self.german {
            require_text("german", german)?;
        }
        if let Some(russian) = &self.russian {
            require_text("russian", russian)?;
        }
        Ok(())
    }
}

/// Empty optional text is stored as absent rather than as "".
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PhraseError::EmptyField { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Phrase {
        NewPhrase::new("Wie geht's?", "Как дела?", Category::WFragen, Utc::now())
            .with_transcription(Some("[ви гетс]".to_string()))
            .into_phrase(Uuid::new_v4())
    }

    #[test]
    fn category_round_trips_through_wire_name() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
    }

    #[test]
    fn category_serde_uses_kebab_case() {
        let json = serde_json::to_string(&Category::WFragen).unwrap();
        assert_eq!(json, "\"w-fragen\"");
        let parsed: Category = serde_json::from_str("\"holidays\"").unwrap();
        assert_eq!(parsed, Category::Holidays);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let err = "verbs".parse::<Category>().unwrap_err();
        assert!(matches!(err, PhraseError::UnknownCategory(ref c) if c == "verbs"));
        assert!(serde_json::from_str::<Category>("\"verbs\"").is_err());
    }

    #[test]
    fn new_phrase_normalizes_missing_optionals() {
        let phrase = NewPhrase::new("Danke", "Спасибо", Category::General, Utc::now())
            .with_transcription(None)
            .with_context(Some("   ".to_string()));
        assert_eq!(phrase.transcription, None);
        assert_eq!(phrase.context, None);
    }

    #[test]
    fn new_phrase_starts_unreviewed() {
        let now = Utc::now();
        let phrase = NewPhrase::new("Hallo", "Привет", Category::General, now);
        assert_eq!(phrase.mastery_level, 0);
        assert_eq!(phrase.know_count, 0);
        assert_eq!(phrase.know_streak, 0);
        assert_eq!(phrase.last_reviewed_at, None);
        assert_eq!(phrase.next_review_at, now);
        assert!(!phrase.is_mastered());
    }

    #[test]
    fn validate_rejects_blank_text() {
        let phrase = NewPhrase::new(" ", "Привет", Category::General, Utc::now());
        assert!(matches!(
            phrase.validate(),
            Err(PhraseError::EmptyField { field: "german" })
        ));
    }

    #[test]
    fn into_phrase_derives_mastery() {
        let mut phrase = NewPhrase::new("Bitte", "Пожалуйста", Category::General, Utc::now());
        phrase.know_count = 3;
        let stored = phrase.into_phrase(Uuid::new_v4());
        assert!(stored.is_mastered);
    }

    #[test]
    fn apply_patch_changes_only_supplied_fields() {
        let mut phrase = sample();
        let before = phrase.clone();

        phrase.apply_patch(&PhrasePatch {
            context: Some(Some("Вопрос о самочувствии".to_string())),
            mastery_level: Some(4),
            ..Default::default()
        });

        assert_eq!(phrase.context.as_deref(), Some("Вопрос о самочувствии"));
        assert_eq!(phrase.mastery_level, 4);
        assert_eq!(phrase.german, before.german);
        assert_eq!(phrase.transcription, before.transcription);
        assert_eq!(phrase.next_review_at, before.next_review_at);
        assert_eq!(phrase.know_count, before.know_count);
    }

    #[test]
    fn apply_patch_clears_nullable_fields() {
        let mut phrase = sample();
        phrase.last_reviewed_at = Some(Utc::now());

        phrase.apply_patch(&PhrasePatch {
            transcription: Some(None),
            last_reviewed_at: Some(None),
            ..Default::default()
        });

        assert_eq!(phrase.transcription, None);
        assert_eq!(phrase.last_reviewed_at, None);
    }

    #[test]
    fn apply_patch_recomputes_mastery() {
        let mut phrase = sample();
        phrase.apply_patch(&PhrasePatch {
            know_streak: Some(2),
            ..Default::default()
        });
        assert!(phrase.is_mastered);

        phrase.apply_patch(&PhrasePatch {
            know_streak: Some(0),
            ..Default::default()
        });
        assert!(!phrase.is_mastered);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(PhrasePatch::default().is_empty());
        let patch = PhrasePatch {
            know_count: Some(1),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_validate_checks_present_text() {
        let patch = PhrasePatch {
            russian: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
        assert!(PhrasePatch::default().validate().is_ok());
    }
}
