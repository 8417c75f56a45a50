//! Service configuration loaded from environment variables.
//!
//! Recognized variables:
//! - DATABASE_URL: PostgreSQL connection string (unset: in-memory store for
//!   `serve`, an error for the import and generate commands)
//! - HOST / PORT: listen address (default 0.0.0.0:5000)
//! - APP_ENV: "development" or "production" (default development)
//! - GEMINI_API_KEY: enables phrase generation
//! - GEMINI_MODEL: model name (default gemini-2.0-flash)
//! - IMPORT_ON_STARTUP: seed import at startup (default: on outside production)

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be set")]
    Missing { key: &'static str },
}

/// Deployment environment. Controls error detail and startup import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub import_on_startup: bool,
}

impl Config {
    /// Load from the process environment (after `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let environment = match get("APP_ENV") {
            Some(value) => value.parse::<Environment>().map_err(|_| ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => Environment::Development,
        };

        let port = match get("PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let import_on_startup = match get("IMPORT_ON_STARTUP") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                key: "IMPORT_ON_STARTUP",
                value,
            })?,
            None => environment.is_development(),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            environment,
            gemini_api_key: get("GEMINI_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            import_on_startup,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Database URL for commands that must persist. Only `serve` may fall
    /// back to the in-memory store.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing { key: "DATABASE_URL" })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
