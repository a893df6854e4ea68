//! Configuration for the producer service.

use complaints_redpanda::KafkaSettings;
use std::env;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("Invalid value {value:?} for {key}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Producer service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Broker and topic to publish to.
    pub kafka: KafkaSettings,
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the database settings are missing or
    /// `PORT` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => {
                let user = get("POSTGRES_USER").ok_or(ConfigError::Missing("POSTGRES_USER"))?;
                let password =
                    get("POSTGRES_PASSWORD").ok_or(ConfigError::Missing("POSTGRES_PASSWORD"))?;
                let db = get("POSTGRES_DB").ok_or(ConfigError::Missing("POSTGRES_DB"))?;
                let host = get("POSTGRES_HOST").unwrap_or_else(|| "postgres".to_string());
                let port = get("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());
                format!("postgresql://{user}:{password}@{host}:{port}/{db}")
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => 8000,
        };

        Ok(Self {
            kafka: KafkaSettings::new(
                get("KAFKA_BROKER").unwrap_or_else(|| "kafka:9092".to_string()),
                get("KAFKA_TOPIC").unwrap_or_else(|| "complaints.v1".to_string()),
            ),
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
        })
    }
}
