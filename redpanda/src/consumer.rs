//! Group consumer built on rdkafka's [`StreamConsumer`].

use crate::error::classify;
use crate::settings::{KafkaSettings, consumer_config};
use complaints_core::{
    BrokerConnection, BrokerConnector, BrokerError, BrokerRecord, TopicPartition,
};
use complaints_runtime::{PROBE_INTERVAL, wait_until_reachable};
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::future::Future;
use std::time::Duration;

/// How long a single metadata probe may block.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a consumer subscribed to `settings.topic`.
///
/// # Errors
///
/// Returns [`BrokerError`] if librdkafka rejects the configuration or the
/// subscription.
pub fn create_consumer(settings: &KafkaSettings) -> Result<StreamConsumer, BrokerError> {
    let consumer: StreamConsumer = consumer_config(settings)
        .create()
        .map_err(|e| classify(&e))?;
    consumer
        .subscribe(&[settings.topic.as_str()])
        .map_err(|e| classify(&e))?;

    tracing::info!(
        brokers = %settings.brokers,
        topic = %settings.topic,
        group_id = %settings.group_id,
        offset_reset = %settings.offset_reset,
        "Kafka consumer subscribed"
    );
    Ok(consumer)
}

/// Probe `settings.brokers` every 2 seconds until one metadata request
/// succeeds or `max_wait` elapses.
pub async fn wait_for_broker(settings: &KafkaSettings, max_wait: Duration) -> bool {
    let connector = KafkaConnector::new(settings.clone());
    wait_until_reachable(&connector, max_wait, PROBE_INTERVAL).await
}

/// [`BrokerConnector`] producing Kafka group consumers.
#[derive(Debug, Clone)]
pub struct KafkaConnector {
    settings: KafkaSettings,
}

impl KafkaConnector {
    /// Create a connector for `settings`.
    #[must_use]
    pub const fn new(settings: KafkaSettings) -> Self {
        Self { settings }
    }

    /// The settings in use.
    #[must_use]
    pub const fn settings(&self) -> &KafkaSettings {
        &self.settings
    }
}

impl BrokerConnector for KafkaConnector {
    type Connection = KafkaConnection;

    fn probe(&self) -> impl Future<Output = Result<(), BrokerError>> + Send {
        let config = consumer_config(&self.settings);
        async move {
            // Metadata fetches block the calling thread.
            tokio::task::spawn_blocking(move || {
                let consumer: BaseConsumer = config.create().map_err(|e| classify(&e))?;
                consumer
                    .fetch_metadata(None, PROBE_TIMEOUT)
                    .map(|_| ())
                    .map_err(|e| classify(&e))
            })
            .await
            .map_err(|e| BrokerError::Transport(format!("probe task failed: {e}")))?
        }
    }

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, BrokerError>> + Send {
        let result = create_consumer(&self.settings);
        async move { result.map(|consumer| KafkaConnection { consumer }) }
    }
}

/// Subscribed consumer owned by the subscription loop.
pub struct KafkaConnection {
    consumer: StreamConsumer,
}

impl BrokerConnection for KafkaConnection {
    fn assignment(&self) -> Result<Vec<TopicPartition>, BrokerError> {
        let assignment = self.consumer.assignment().map_err(|e| classify(&e))?;
        Ok(assignment
            .elements()
            .iter()
            .map(|element| TopicPartition {
                topic: element.topic().to_string(),
                partition: element.partition(),
            })
            .collect())
    }

    fn poll(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<BrokerRecord>, BrokerError>> + Send {
        async move {
            match tokio::time::timeout(timeout, self.consumer.recv()).await {
                Err(_elapsed) => Ok(Vec::new()),
                Ok(Err(e)) => Err(classify(&e)),
                Ok(Ok(message)) => Ok(vec![BrokerRecord {
                    topic: message.topic().to_string(),
                    partition: message.partition(),
                    offset: message.offset(),
                    key: message.key().map(<[u8]>::to_vec),
                    payload: message.payload().map(<[u8]>::to_vec),
                }]),
            }
        }
    }

    fn close(self) -> impl Future<Output = Result<(), BrokerError>> + Send {
        async move {
            self.consumer.unsubscribe();
            // Dropping leaves the group, which waits on the broker.
            tokio::task::spawn_blocking(move || drop(self.consumer))
                .await
                .map_err(|e| BrokerError::Transport(format!("close task failed: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connector_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KafkaConnector>();
    }

    #[tokio::test]
    async fn connect_subscribes_without_contacting_broker() {
        // librdkafka connects lazily, so creating a consumer for an
        // unreachable address still succeeds.
        let connector = KafkaConnector::new(KafkaSettings::new("127.0.0.1:1", "complaints.v1"));
        let connection = connector.connect().await;
        assert!(connection.is_ok());
    }

    #[tokio::test]
    async fn probe_of_unreachable_broker_fails() {
        let connector = KafkaConnector::new(KafkaSettings::new("127.0.0.1:1", "complaints.v1"));
        assert!(connector.probe().await.is_err());
    }
}
