//! Operator command tests that need no database.

use phrase_trainer_backend::config::{Config, ConfigError};
use phrase_trainer_backend::services::generation::{GenerationError, Level};
use phrase_trainer_backend::{run_generate, run_import};

fn config(vars: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

/// Test import refuses to run without a database instead of importing into memory.
#[tokio::test]
async fn test_import_requires_database_url() {
    let err = run_import(&config(&[]), None).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Missing { key: "DATABASE_URL" })
    ));
    assert_eq!(err.to_string(), "DATABASE_URL must be set");
}

/// Test a second attempt fails the same way.
#[tokio::test]
async fn test_import_without_database_never_reports_success() {
    let config = config(&[]);

    assert!(run_import(&config, None).await.is_err());
    assert!(run_import(&config, None).await.is_err());
}

/// Test generate without a database fails before contacting Gemini.
#[tokio::test]
async fn test_generate_requires_database_url() {
    let config = config(&[("GEMINI_API_KEY", "key")]);

    let err = run_generate(&config, 3, Level::Beginner).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::Missing { key: "DATABASE_URL" })
    ));
}

/// Test generate without an API key fails before connecting anywhere.
#[tokio::test]
async fn test_generate_requires_api_key() {
    let config = config(&[("DATABASE_URL", "postgres://127.0.0.1:1/unreachable")]);

    let err = run_generate(&config, 3, Level::Beginner).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<GenerationError>(),
        Some(GenerationError::NotConfigured)
    ));
}
