//! Producer side: publish complaint references keyed by record id.

use crate::settings::{KafkaSettings, producer_config};
use complaints_core::{ComplaintMessage, ComplaintPublisher, PublishError};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// [`ComplaintPublisher`] backed by an rdkafka [`FutureProducer`].
///
/// Messages are keyed by record id, so redeliveries of the same record land
/// on the same partition.
pub struct KafkaPublisher {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaPublisher {
    /// Create a publisher for `settings.topic`.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Delivery`] if the producer cannot be created.
    pub fn new(settings: &KafkaSettings) -> Result<Self, PublishError> {
        let producer: FutureProducer =
            producer_config(settings)
                .create()
                .map_err(|e| PublishError::Delivery {
                    topic: settings.topic.clone(),
                    reason: format!("Failed to create producer: {e}"),
                })?;

        tracing::info!(
            brokers = %settings.brokers,
            topic = %settings.topic,
            "Kafka publisher created"
        );

        Ok(Self {
            producer,
            topic: settings.topic.clone(),
            timeout: Duration::from_secs(5),
        })
    }

    /// Override the delivery timeout (default 5 seconds).
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Destination topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl ComplaintPublisher for KafkaPublisher {
    fn publish<'a>(
        &'a self,
        message: &'a ComplaintMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + 'a>> {
        Box::pin(async move {
            let payload = message
                .encode()
                .map_err(|e| PublishError::Serialization(e.to_string()))?;
            let key = message.id.as_deref().unwrap_or_default();

            let record = FutureRecord::to(&self.topic).payload(&payload).key(key);

            match self
                .producer
                .send(record, Timeout::After(self.timeout))
                .await
            {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %self.topic,
                        partition,
                        offset,
                        id = key,
                        "Complaint published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(
                        topic = %self.topic,
                        error = %kafka_error,
                        id = key,
                        "Failed to publish complaint"
                    );
                    Err(PublishError::Delivery {
                        topic: self.topic.clone(),
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }
}
