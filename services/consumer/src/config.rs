//! Configuration for the consumer service.
//!
//! Everything is read once from the environment at startup and then passed
//! into the components that need it.

use complaints_email::SmtpSettings;
use complaints_redpanda::{KafkaSettings, SaslSettings};
use complaints_runtime::{BackoffPolicy, LoopSettings, SupervisorSettings};
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Literal echoed by the debug endpoint for unset variables.
pub const NOT_SET: &str = "not set";

/// Configuration errors. Startup aborts on any of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is absent or blank.
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        /// Variable name
        key: &'static str,
        /// Raw value
        value: String,
        /// Parser message
        reason: String,
    },
}

/// How acknowledgement emails leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTransport {
    /// Deliver over SMTP.
    Smtp,
    /// Print to stdout.
    Console,
}

/// Consumer service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Broker connection settings.
    pub kafka: KafkaSettings,
    /// Broker variables exactly as found in the environment.
    pub kafka_env: KafkaEnvEcho,
    /// How long to wait for the broker before the first connect.
    pub broker_wait: Duration,
    /// Ceiling for the reconnect backoff.
    pub max_backoff: Duration,
    /// Startup delay and shutdown timeout.
    pub supervisor: SupervisorSettings,
    /// `PostgreSQL` connection URL.
    pub database_url: String,
    /// Selected email transport.
    pub email_transport: EmailTransport,
    /// SMTP settings (ignored by the console transport).
    pub smtp: SmtpSettings,
    /// HTTP bind host.
    pub host: String,
    /// HTTP bind port.
    pub port: u16,
    /// Prometheus listener port, if enabled.
    pub metrics_port: Option<u16>,
}

/// Raw broker variables, echoed by `GET /debug/env`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KafkaEnvEcho {
    /// `KAFKA_BROKER`
    #[serde(rename = "KAFKA_BROKER")]
    pub broker: String,
    /// `KAFKA_TOPIC`
    #[serde(rename = "KAFKA_TOPIC")]
    pub topic: String,
    /// `KAFKA_GROUP`
    #[serde(rename = "KAFKA_GROUP")]
    pub group: String,
    /// `KAFKA_OFFSET`
    #[serde(rename = "KAFKA_OFFSET")]
    pub offset: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// cannot be parsed.
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

        let kafka_env = KafkaEnvEcho {
            broker: get("KAFKA_BROKER").unwrap_or_else(|| NOT_SET.to_string()),
            topic: get("KAFKA_TOPIC").unwrap_or_else(|| NOT_SET.to_string()),
            group: lookup("KAFKA_GROUP").unwrap_or_else(|| NOT_SET.to_string()),
            offset: get("KAFKA_OFFSET").unwrap_or_else(|| NOT_SET.to_string()),
        };

        // A blank KAFKA_GROUP is passed through; the broker layer swaps in the default.
        let mut kafka = KafkaSettings::new(
            get("KAFKA_BROKER").unwrap_or_else(|| "kafka:9092".to_string()),
            get("KAFKA_TOPIC").unwrap_or_else(|| "complaints.v1".to_string()),
        )
        .with_offset_reset(get("KAFKA_OFFSET").unwrap_or_else(|| "latest".to_string()))
        .with_security_protocol(
            get("KAFKA_SECURITY_PROTOCOL").unwrap_or_else(|| "PLAINTEXT".to_string()),
        );
        if let Some(group) = lookup("KAFKA_GROUP") {
            kafka = kafka.with_group_id(group);
        }
        if let Some(mechanism) = get("KAFKA_SASL_MECHANISM") {
            kafka = kafka.with_sasl(SaslSettings {
                mechanism,
                username: get("KAFKA_SASL_USERNAME"),
                password: get("KAFKA_SASL_PASSWORD"),
            });
        }

        let email_transport = match get("EMAIL_TRANSPORT").as_deref().map(str::to_lowercase) {
            None => EmailTransport::Smtp,
            Some(t) if t == "smtp" => EmailTransport::Smtp,
            Some(t) if t == "console" => EmailTransport::Console,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "EMAIL_TRANSPORT",
                    value: other,
                    reason: "expected smtp or console".to_string(),
                });
            }
        };

        let from = match (email_transport, get("SMTP_EMAIL")) {
            (_, Some(from)) => from,
            (EmailTransport::Smtp, None) => return Err(ConfigError::Missing("SMTP_EMAIL")),
            (EmailTransport::Console, None) => "support@localhost".to_string(),
        };
        let mut smtp = SmtpSettings::new(from);
        if let Some(host) = get("SMTP_HOST") {
            smtp.host = host;
        }
        smtp.port = parse_or(&get, "SMTP_PORT", 1025)?;
        smtp.username = get("SMTP_USERNAME");
        smtp.password = get("SMTP_PASSWORD");
        smtp.starttls = get("SMTP_STARTTLS").is_some_and(|v| is_truthy(&v));
        smtp.timeout = seconds(&get, "SMTP_TIMEOUT", 10.0)?;

        Ok(Self {
            kafka,
            kafka_env,
            broker_wait: Duration::from_secs(parse_or(&get, "KAFKA_WAIT_SECONDS", 120)?),
            max_backoff: nonzero_secs(&get, "CONSUMER_MAX_BACKOFF_SECONDS", 60)?,
            supervisor: SupervisorSettings {
                startup_delay: Duration::from_secs(parse_or(
                    &get,
                    "CONSUMER_STARTUP_DELAY_SECONDS",
                    10,
                )?),
                shutdown_timeout: Duration::from_secs(parse_or(
                    &get,
                    "CONSUMER_SHUTDOWN_TIMEOUT_SECONDS",
                    10,
                )?),
            },
            database_url: database_url(&get)?,
            email_transport,
            smtp,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8001)?,
            metrics_port: get("METRICS_PORT")
                .map(|raw| parse("METRICS_PORT", &raw))
                .transpose()?,
        })
    }

    /// Settings for the subscription loop.
    #[must_use]
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            broker_wait: self.broker_wait,
            backoff: BackoffPolicy::builder().ceiling(self.max_backoff).build(),
            ..LoopSettings::default()
        }
    }
}

/// `DATABASE_URL`, or a URL composed from the `POSTGRES_*` variables.
fn database_url(get: &impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    if let Some(url) = get("DATABASE_URL") {
        return Ok(url);
    }
    let user = get("POSTGRES_USER").ok_or(ConfigError::Missing("POSTGRES_USER"))?;
    let password = get("POSTGRES_PASSWORD").ok_or(ConfigError::Missing("POSTGRES_PASSWORD"))?;
    let db = get("POSTGRES_DB").ok_or(ConfigError::Missing("POSTGRES_DB"))?;
    let host = get("POSTGRES_HOST").unwrap_or_else(|| "postgres".to_string());
    let port = get("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());
    Ok(format!("postgresql://{user}:{password}@{host}:{port}/{db}"))
}

/// Fractional seconds, e.g. `SMTP_TIMEOUT=2.5`.
fn seconds(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: f64,
) -> Result<Duration, ConfigError> {
    let raw = get(key);
    let secs = raw.as_deref().map_or(Ok(default), |raw| parse(key, raw))?;
    Duration::try_from_secs_f64(secs).map_err(|e| ConfigError::Invalid {
        key,
        value: raw.unwrap_or_default(),
        reason: e.to_string(),
    })
}

/// Whole seconds that must be at least one.
fn nonzero_secs(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: u64,
) -> Result<Duration, ConfigError> {
    match parse_or(get, key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key).map_or(Ok(default), |raw| parse(key, &raw))
}
