//! Test fixtures and factory functions for creating test data.

use chrono::Utc;
use serde_json::{json, Value};

use phrase_trainer_backend::models::{Category, NewPhrase};

/// Create body with only the required fields.
pub fn minimal_phrase(german: &str, russian: &str) -> Value {
    json!({
        "german": german,
        "russian": russian,
        "category": "general"
    })
}

/// Create body with every optional field filled.
pub fn full_phrase() -> Value {
    json!({
        "german": "Wo ist der Bahnhof?",
        "russian": "Где вокзал?",
        "transcription": "[во ист дер банхоф]",
        "context": "Вопрос о дороге",
        "category": "w-fragen",
        "masteryLevel": 1,
        "lastReviewedAt": 1_678_886_400_000_i64,
        "nextReviewAt": 1_678_915_200_000_i64,
        "knowCount": 1,
        "knowStreak": 1
    })
}

/// Unreviewed phrase due now, for seeding a store directly.
pub fn new_phrase(german: &str, russian: &str, category: Category) -> NewPhrase {
    NewPhrase::new(german, russian, category, Utc::now())
}

/// Generation reply wrapped in a markdown fence.
pub fn fenced_reply() -> String {
    format!("```json\n{}\n```", bare_reply())
}

/// Generation reply as a bare JSON array of three phrases.
pub fn bare_reply() -> String {
    json!([
        {
            "german": "Guten Abend",
            "russian": "Добрый вечер",
            "transcription": "[гутен абент]",
            "context": "Вечернее приветствие",
            "category": "general"
        },
        {
            "german": "Wie spät ist es?",
            "russian": "Который час?",
            "transcription": "[ви шпэт ист эс]",
            "context": "Вопрос о времени",
            "category": "time"
        },
        {
            "german": "Das kostet zehn Euro",
            "russian": "Это стоит десять евро",
            "category": "money"
        }
    ])
    .to_string()
}
