//! Connection settings and the librdkafka configuration derived from them.

use rdkafka::config::ClientConfig;
use std::fmt;

/// Consumer group used when none (or a blank one) is configured.
pub const DEFAULT_GROUP_ID: &str = "emailer-group";

/// SASL credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SaslSettings {
    /// Mechanism, e.g. `PLAIN` or `SCRAM-SHA-256`.
    pub mechanism: String,
    /// Username, if the mechanism needs one.
    pub username: Option<String>,
    /// Password, if the mechanism needs one.
    pub password: Option<String>,
}

impl fmt::Debug for SaslSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslSettings")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where and how to consume.
///
/// # Default Values
///
/// - `group_id`: `emailer-group`
/// - `offset_reset`: `latest`
/// - `security_protocol`: `PLAINTEXT`
/// - `sasl`: none
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaSettings {
    /// Bootstrap servers, comma separated.
    pub brokers: String,
    /// Topic to subscribe to.
    pub topic: String,
    /// Consumer group id.
    pub group_id: String,
    /// Where a new group starts reading (`latest` or `earliest`).
    pub offset_reset: String,
    /// `PLAINTEXT`, `SSL`, `SASL_PLAINTEXT` or `SASL_SSL`.
    pub security_protocol: String,
    /// SASL credentials, applied only when present.
    pub sasl: Option<SaslSettings>,
}

impl KafkaSettings {
    /// Settings for `topic` on `brokers`, everything else defaulted.
    #[must_use]
    pub fn new(brokers: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers: brokers.into(),
            topic: topic.into(),
            group_id: DEFAULT_GROUP_ID.to_string(),
            offset_reset: "latest".to_string(),
            security_protocol: "PLAINTEXT".to_string(),
            sasl: None,
        }
    }

    /// Set the consumer group id.
    #[must_use]
    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = group_id.into();
        self
    }

    /// Set the offset reset policy.
    #[must_use]
    pub fn with_offset_reset(mut self, offset_reset: impl Into<String>) -> Self {
        self.offset_reset = offset_reset.into();
        self
    }

    /// Set the security protocol.
    #[must_use]
    pub fn with_security_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.security_protocol = protocol.into();
        self
    }

    /// Set SASL credentials.
    #[must_use]
    pub fn with_sasl(mut self, sasl: SaslSettings) -> Self {
        self.sasl = Some(sasl);
        self
    }
}

/// Effective group id: `configured`, or [`DEFAULT_GROUP_ID`] when blank.
#[must_use]
pub fn resolve_group_id(configured: &str) -> &str {
    let trimmed = configured.trim();
    if trimmed.is_empty() {
        tracing::warn!(
            default = DEFAULT_GROUP_ID,
            "Consumer group id is empty, using default"
        );
        DEFAULT_GROUP_ID
    } else {
        trimmed
    }
}

/// librdkafka configuration for a long-lived group consumer.
///
/// Offsets are auto-committed every 5 seconds. The fetch wait is capped at
/// 5 seconds to match the subscription loop's poll timeout.
#[must_use]
pub fn consumer_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.brokers)
        .set("group.id", resolve_group_id(&settings.group_id))
        .set("auto.offset.reset", &settings.offset_reset)
        .set("enable.auto.commit", "true")
        .set("auto.commit.interval.ms", "5000")
        .set("session.timeout.ms", "30000")
        .set("heartbeat.interval.ms", "10000")
        .set("max.poll.interval.ms", "300000")
        .set("socket.timeout.ms", "40000")
        .set("connections.max.idle.ms", "540000")
        .set("retry.backoff.ms", "1000")
        .set("fetch.min.bytes", "1")
        .set("fetch.wait.max.ms", "5000")
        .set("max.partition.fetch.bytes", "1048576")
        .set("enable.partition.eof", "false");
    apply_security(&mut config, settings);
    config
}

/// librdkafka configuration for the producer side.
#[must_use]
pub fn producer_config(settings: &KafkaSettings) -> ClientConfig {
    let mut config = ClientConfig::new();
    config
        .set("bootstrap.servers", &settings.brokers)
        .set("message.timeout.ms", "5000")
        .set("acks", "1");
    apply_security(&mut config, settings);
    config
}

fn apply_security(config: &mut ClientConfig, settings: &KafkaSettings) {
    config.set("security.protocol", &settings.security_protocol);
    if let Some(sasl) = &settings.sasl {
        config.set("sasl.mechanism", &sasl.mechanism);
        if let Some(username) = &sasl.username {
            config.set("sasl.username", username);
        }
        if let Some(password) = &sasl.password {
            config.set("sasl.password", password);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_group_id_falls_back_to_default() {
        assert_eq!(resolve_group_id(""), DEFAULT_GROUP_ID);
        assert_eq!(resolve_group_id("   "), DEFAULT_GROUP_ID);
        assert_eq!(resolve_group_id(" billing "), "billing");
    }

    #[test]
    fn consumer_config_uses_long_lived_consumer_tuning() {
        let settings = KafkaSettings::new("kafka:9092", "complaints.v1");
        let config = consumer_config(&settings);

        assert_eq!(config.get("bootstrap.servers"), Some("kafka:9092"));
        assert_eq!(config.get("group.id"), Some("emailer-group"));
        assert_eq!(config.get("auto.offset.reset"), Some("latest"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("auto.commit.interval.ms"), Some("5000"));
        assert_eq!(config.get("session.timeout.ms"), Some("30000"));
        assert_eq!(config.get("heartbeat.interval.ms"), Some("10000"));
        assert_eq!(config.get("max.poll.interval.ms"), Some("300000"));
        assert_eq!(config.get("fetch.wait.max.ms"), Some("5000"));
        assert_eq!(config.get("security.protocol"), Some("PLAINTEXT"));
        assert_eq!(config.get("sasl.mechanism"), None);
    }

    #[test]
    fn blank_group_in_settings_is_replaced() {
        let settings = KafkaSettings::new("kafka:9092", "t").with_group_id("");
        assert_eq!(consumer_config(&settings).get("group.id"), Some(DEFAULT_GROUP_ID));
    }

    #[test]
    fn sasl_is_applied_only_when_configured() {
        let settings = KafkaSettings::new("broker:9093", "t")
            .with_security_protocol("SASL_SSL")
            .with_sasl(SaslSettings {
                mechanism: "PLAIN".to_string(),
                username: Some("svc".to_string()),
                password: Some("secret".to_string()),
            });
        let config = consumer_config(&settings);

        assert_eq!(config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(config.get("sasl.mechanism"), Some("PLAIN"));
        assert_eq!(config.get("sasl.username"), Some("svc"));
        assert_eq!(config.get("sasl.password"), Some("secret"));
    }

    #[test]
    fn sasl_password_is_redacted_in_debug_output() {
        let sasl = SaslSettings {
            mechanism: "PLAIN".to_string(),
            username: Some("svc".to_string()),
            password: Some("hunter2".to_string()),
        };
        let rendered = format!("{sasl:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn producer_config_targets_same_cluster() {
        let settings = KafkaSettings::new("kafka:9092", "complaints.v1");
        let config = producer_config(&settings);
        assert_eq!(config.get("bootstrap.servers"), Some("kafka:9092"));
        assert_eq!(config.get("acks"), Some("1"));
        assert_eq!(config.get("group.id"), None);
    }
}
