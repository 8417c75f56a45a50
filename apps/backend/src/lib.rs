pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Environment};
use crate::db::{Database, MemoryStore, PhraseStore};
use crate::models::Phrase;
use crate::services::generation::{GeminiProvider, GenerationError, Level, PhraseGenerator};
use crate::services::import::{self, ImportReport};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PhraseStore>,
    pub generator: Arc<PhraseGenerator>,
    pub environment: Environment,
}

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise an in-memory store.
pub async fn connect_store(config: &Config) -> anyhow::Result<Arc<dyn PhraseStore>> {
    if config.database_url.is_none() {
        tracing::warn!("DATABASE_URL not set, phrases are kept in memory only");
        return Ok(Arc::new(MemoryStore::new()));
    }

    Ok(Arc::new(connect_database(config).await?))
}

/// Connect to PostgreSQL and migrate. Fails when `DATABASE_URL` is unset.
pub async fn connect_database(config: &Config) -> anyhow::Result<Database> {
    let database_url = config.require_database_url()?;

    tracing::info!("Connecting to database...");
    let db = Database::connect(database_url).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    Ok(db)
}

/// Gemini-backed generator when an API key is configured.
pub fn build_generator(config: &Config) -> anyhow::Result<PhraseGenerator> {
    match &config.gemini_api_key {
        Some(api_key) => {
            tracing::info!(model = %config.gemini_model, "Phrase generation enabled");
            let provider = GeminiProvider::new(api_key.as_str(), config.gemini_model.as_str())?;
            Ok(PhraseGenerator::new(Arc::new(provider)))
        }
        None => {
            tracing::info!("GEMINI_API_KEY not set, phrase generation disabled");
            Ok(PhraseGenerator::disabled())
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    Ok(AppState {
        store: connect_store(config).await?,
        generator: Arc::new(build_generator(config)?),
        environment: config.environment,
    })
}

/// All routes with error detail, CORS and request tracing layers.
pub fn router(state: AppState) -> Router {
    let phrase_routes = Router::new()
        .route(
            "/api/phrases",
            get(routes::phrases::list).post(routes::phrases::create),
        )
        .route("/api/phrases/generate", post(routes::phrases::generate))
        .route(
            "/api/phrases/{id}",
            get(routes::phrases::get)
                .put(routes::phrases::update)
                .delete(routes::phrases::delete),
        )
        .route("/api/phrases/{id}/review", post(routes::phrases::review));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/health", get(routes::health::health_check))
        .merge(phrase_routes)
        .fallback(routes::health::not_found)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::expose_error_detail,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until it fails.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    state.store.ping().await?;

    if config.import_on_startup {
        match import::import_bundled(state.store.as_ref()).await {
            Ok(report) => tracing::info!(
                imported = report.imported.len(),
                skipped = report.skipped,
                "Startup import finished"
            ),
            Err(e) => tracing::error!(error = %e, "Startup import failed"),
        }
    }

    let app = router(state);
    let addr = config.bind_addr();

    tracing::info!(environment = %config.environment, "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Import the bundled seed set, or `file` when given.
pub async fn run_import(config: &Config, file: Option<&Path>) -> anyhow::Result<ImportReport> {
    let store = connect_database(config).await?;

    let entries = match file {
        Some(path) => import::load_seed_file(path).await?,
        None => import::bundled_seed()?,
    };
    let phrases = import::seed_phrases(entries, chrono::Utc::now())?;

    Ok(import::smart_import(&store, phrases).await?)
}

/// Generate `count` phrases at `level` and store them.
pub async fn run_generate(config: &Config, count: u32, level: Level) -> anyhow::Result<Vec<Phrase>> {
    let generator = build_generator(config)?;
    if !generator.is_configured() {
        return Err(GenerationError::NotConfigured.into());
    }
    let store = connect_database(config).await?;

    Ok(generator.generate_and_save(&store, count, level).await?)
}
