//! Phrase generation through a text provider.
//!
//! A [`PhraseGenerator`] builds the prompt, asks its [`TextProvider`] once and
//! parses the reply with [`phrase_core::parse_generated`]. There is no retry
//! and no partial acceptance: a reply that does not parse fails the batch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use phrase_core::{parse_generated, GeneratedPhrase, NewPhrase, Phrase, PhraseError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::PhraseStore;

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_GENERATE_COUNT: u32 = 10;
pub const MAX_GENERATE_COUNT: u32 = 50;

const CATEGORY_LIST: &str = "general, w-fragen, pronouns, numbers, time, money, calendar, holidays";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Gemini API key not configured")]
    NotConfigured,

    #[error("Gemini generation failed: {0}")]
    Provider(String),

    #[error("Failed to parse AI response as JSON: {reason}")]
    Parse { reason: String, raw: String },
}

impl From<PhraseError> for GenerationError {
    fn from(err: PhraseError) -> Self {
        match err {
            PhraseError::MalformedResponse { reason, raw } => Self::Parse { reason, raw },
            other => Self::Parse {
                reason: other.to_string(),
                raw: String::new(),
            },
        }
    }
}

/// Learner level the phrases are aimed at.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

/// Default for a missing count, clamped to `1..=MAX_GENERATE_COUNT`.
pub fn clamp_count(count: Option<u32>) -> u32 {
    count
        .unwrap_or(DEFAULT_GENERATE_COUNT)
        .clamp(1, MAX_GENERATE_COUNT)
}

/// Something that turns a prompt into text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

// Gemini `generateContent` wire types

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Result<String, GenerationError> {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| GenerationError::Provider("response has no candidates".to_string()))?;

        Ok(content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect())
    }
}

/// Google Gemini over its REST API.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Provider(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        body.into_text()
    }
}

/// Prompt asking for `count` phrases at `level` as a bare JSON array.
pub fn build_prompt(count: u32, level: Level) -> String {
    format!(
        r#"Generate {count} German phrases suitable for {level} level learners along with their Russian translations, Russian transcriptions, and context descriptions.

Requirements:
1. Each phrase should be a complete sentence or common expression
2. Include the Russian translation for each German phrase
3. Include a Russian transcription (phonetic representation) of how to pronounce the German phrase
4. Include a context description in Russian explaining when or where this phrase is typically used
5. Assign each phrase to an appropriate category from this list: {categories}
6. Format the response as a JSON array with objects containing: german, russian, transcription, context, category
7. Do not include any additional text, just the JSON array

Example format:
[
  {{"german": "Guten Morgen", "russian": "Доброе утро", "transcription": "[гутен морген]", "context": "Используется утром при встрече с кем-либо", "category": "general"}},
  {{"german": "Wie geht es dir?", "russian": "Как дела?", "transcription": "[ви гет эс дир]", "context": "Спрашивают о самочувствии человека", "category": "w-fragen"}}
]"#,
        count = count,
        level = level.as_str(),
        categories = CATEGORY_LIST,
    )
}

/// Generates phrases, or reports [`GenerationError::NotConfigured`] when no
/// provider was supplied.
#[derive(Clone, Default)]
pub struct PhraseGenerator {
    provider: Option<Arc<dyn TextProvider>>,
}

impl PhraseGenerator {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Ask the provider for `count` phrases and parse the reply.
    pub async fn generate(
        &self,
        count: u32,
        level: Level,
    ) -> Result<Vec<GeneratedPhrase>, GenerationError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(GenerationError::NotConfigured)?;

        tracing::info!(
            provider = provider.name(),
            count,
            level = level.as_str(),
            "Generating phrases"
        );

        let raw = provider.generate(&build_prompt(count, level)).await?;

        let phrases = parse_generated(&raw).map_err(|e| {
            tracing::warn!(error = %e, raw = %raw, "Generated response did not parse");
            GenerationError::from(e)
        })?;

        tracing::info!(generated = phrases.len(), "Generated phrases");
        Ok(phrases)
    }

    /// Generate and store a batch. Generated phrases are not deduplicated; a
    /// pair that already exists fails the whole insert.
    pub async fn generate_and_save(
        &self,
        store: &dyn PhraseStore,
        count: u32,
        level: Level,
    ) -> crate::error::Result<Vec<Phrase>> {
        let generated = self.generate(count, level).await?;

        let now = Utc::now();
        let phrases: Vec<NewPhrase> = generated
            .into_iter()
            .map(|p| p.into_new_phrase(now))
            .collect();

        let saved = store.insert_many(&phrases).await?;
        tracing::info!(saved = saved.len(), "Saved generated phrases");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use phrase_core::Category;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::MemoryStore;
    use crate::error::ApiError;

    struct FakeProvider {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    const TWO_PHRASES: &str = r#"[
        {"german": "Guten Abend", "russian": "Добрый вечер", "transcription": "[гутен абент]", "context": "Вечернее приветствие", "category": "general"},
        {"german": "Wie viel Uhr ist es?", "russian": "Который час?", "category": "time"}
    ]"#;

    #[test]
    fn count_is_defaulted_and_clamped() {
        assert_eq!(clamp_count(None), 10);
        assert_eq!(clamp_count(Some(0)), 1);
        assert_eq!(clamp_count(Some(7)), 7);
        assert_eq!(clamp_count(Some(500)), MAX_GENERATE_COUNT);
    }

    #[test]
    fn prompt_names_count_level_and_categories() {
        let prompt = build_prompt(5, Level::Intermediate);
        assert!(prompt.starts_with("Generate 5 German phrases suitable for intermediate level"));
        assert!(prompt.contains(CATEGORY_LIST));
        assert!(prompt.contains(r#"{"german": "Guten Morgen""#));
    }

    #[test]
    fn level_parses_from_json() {
        let level: Level = serde_json::from_str("\"advanced\"").unwrap();
        assert_eq!(level, Level::Advanced);
        assert_eq!(Level::default(), Level::Beginner);
    }

    #[test]
    fn gemini_reply_text_is_joined() {
        let body: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "```json\n["}, {"text": "]\n```"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(body.into_text().unwrap(), "```json\n[]\n```");
    }

    #[test]
    fn gemini_reply_without_candidates_is_provider_error() {
        let body: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(body.into_text(), Err(GenerationError::Provider(_))));
    }

    #[test]
    fn gemini_endpoint_uses_model() {
        let provider = GeminiProvider::new("key", "gemini-2.0-flash")
            .unwrap()
            .with_base_url("http://localhost:9999/");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn disabled_generator_is_not_configured() {
        let err = PhraseGenerator::disabled()
            .generate(3, Level::Beginner)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured));
    }

    #[tokio::test]
    async fn generate_sends_one_prompt_and_parses() {
        let provider = FakeProvider::new(TWO_PHRASES);
        let generator = PhraseGenerator::new(provider.clone());

        let phrases = generator.generate(2, Level::Beginner).await.unwrap();

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[1].category, Category::Time);
        assert_eq!(phrases[1].transcription, None);
        assert_eq!(provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unparseable_reply_keeps_raw_text() {
        let generator = PhraseGenerator::new(FakeProvider::new("Sorry, I cannot help."));

        let err = generator.generate(2, Level::Beginner).await.unwrap_err();

        match err {
            GenerationError::Parse { raw, .. } => assert_eq!(raw, "Sorry, I cannot help."),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_and_save_stores_fresh_phrases() {
        let store = MemoryStore::new();
        let generator = PhraseGenerator::new(FakeProvider::new(TWO_PHRASES));

        let saved = generator
            .generate_and_save(&store, 2, Level::Beginner)
            .await
            .unwrap();

        assert_eq!(saved.len(), 2);
        assert!(saved.iter().all(|p| p.know_count == 0 && !p.is_mastered));
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn generate_and_save_inserts_nothing_on_parse_failure() {
        let store = MemoryStore::new();
        let generator = PhraseGenerator::new(FakeProvider::new("not json"));

        let err = generator
            .generate_and_save(&store, 2, Level::Beginner)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Generation(GenerationError::Parse { .. })));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn generated_duplicate_fails_whole_batch() {
        let store = MemoryStore::new();
        let generator = PhraseGenerator::new(FakeProvider::new(TWO_PHRASES));
        generator
            .generate_and_save(&store, 2, Level::Beginner)
            .await
            .unwrap();

        assert!(generator
            .generate_and_save(&store, 2, Level::Beginner)
            .await
            .is_err());
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
