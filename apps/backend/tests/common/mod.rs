//! Common test utilities and fixtures for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - TestContext wiring the router to an in-memory store
//! - A canned text provider standing in for Gemini
//! - A PostgreSQL context for tests marked `requires database`

#![allow(dead_code)]

pub mod fixtures;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use phrase_trainer_backend::config::Environment;
use phrase_trainer_backend::db::{Database, MemoryStore, PhraseStore};
use phrase_trainer_backend::services::generation::{
    GenerationError, PhraseGenerator, TextProvider,
};
use phrase_trainer_backend::{router, AppState};

/// Text provider returning a fixed reply and recording the prompts it saw.
pub struct FakeProvider {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(GenerationError::Provider)
    }
}

/// Test context holding the store behind the router.
pub struct TestContext {
    pub store: Arc<dyn PhraseStore>,
    app: Router,
}

impl TestContext {
    /// In-memory store, no generation provider, development environment.
    pub fn new() -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            PhraseGenerator::disabled(),
            Environment::Development,
        )
    }

    /// In-memory store in the given environment.
    pub fn with_environment(environment: Environment) -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            PhraseGenerator::disabled(),
            environment,
        )
    }

    /// In-memory store with `provider` answering generation prompts.
    pub fn with_provider(provider: Arc<FakeProvider>) -> Self {
        Self::build(
            Arc::new(MemoryStore::new()),
            PhraseGenerator::new(provider),
            Environment::Development,
        )
    }

    /// PostgreSQL store from DATABASE_URL, with the phrases table emptied.
    ///
    /// # Panics
    /// Panics if DATABASE_URL is not set or database connection fails.
    pub async fn postgres() -> Self {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");

        let db = Database::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        db.run_migrations()
            .await
            .expect("Failed to run migrations");

        sqlx::query("DELETE FROM phrases")
            .execute(db.pool())
            .await
            .expect("Failed to clear phrases");

        Self::build(
            Arc::new(db),
            PhraseGenerator::disabled(),
            Environment::Development,
        )
    }

    fn build(
        store: Arc<dyn PhraseStore>,
        generator: PhraseGenerator,
        environment: Environment,
    ) -> Self {
        let state = AppState {
            store: store.clone(),
            generator: Arc::new(generator),
            environment,
        };

        Self {
            store,
            app: router(state),
        }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }
}
