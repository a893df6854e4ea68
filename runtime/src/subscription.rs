//! The subscription loop: connect, consume, reconnect.
//!
//! ```text
//!        ┌──────────── running == false ─────────────┐
//!        ▼                                           │
//!   ┌─────────┐ connect ok  ┌───────────┐  fault  ┌──┴──────┐
//!   │ CONNECT │────────────►│ CONSUMING │────────►│ BACKOFF │
//!   └────┬────┘  live=true  └─────┬─────┘  close  └────┬────┘
//!        │ fault                  │ stop      live=false │
//!        └────────────────────────┼──────────────────────┘
//!                                 ▼
//!                              STOPPED
//! ```
//!
//! Only connectivity faults move the loop out of `CONSUMING`. A record that
//! cannot be decoded, or a handler that fails or panics, is logged and
//! skipped; the loop keeps its connection and its error streak is untouched.
//! There is no dead-letter destination: skipped records are lost.
//!
//! Delivery is at-least-once. Offsets are committed by the broker client in
//! the background, so a record delivered just before a crash may be seen
//! again after a restart.

use crate::backoff::{BackoffPolicy, ReconnectBackoff};
use crate::metrics::ConsumerMetrics;
use crate::probe::{PROBE_INTERVAL, wait_until_reachable};
use crate::state::ConsumerState;
use complaints_core::{
    BrokerConnection, BrokerConnector, BrokerError, BrokerRecord, ComplaintMessage, MessageHandler,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

/// Tuning knobs for [`SubscriptionLoop`].
///
/// # Default Values
///
/// - `poll_timeout`: 5 seconds
/// - `broker_wait`: 120 seconds
/// - `probe_interval`: 2 seconds
/// - `backoff`: [`BackoffPolicy::default`]
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Upper bound for a single poll; also bounds how long a stop request
    /// can go unnoticed while the topic is idle.
    pub poll_timeout: Duration,
    /// How long the initial reachability probe may take.
    pub broker_wait: Duration,
    /// Pause between probe attempts.
    pub probe_interval: Duration,
    /// Reconnect backoff.
    pub backoff: BackoffPolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(5),
            broker_wait: Duration::from_secs(120),
            probe_interval: PROBE_INTERVAL,
            backoff: BackoffPolicy::default(),
        }
    }
}

enum SessionEnd {
    Stopped,
    Fault(BrokerError),
}

/// Long-running consumer of one topic.
///
/// Owns its connector and shares [`ConsumerState`] with whoever supervises
/// it. Records from one partition are handed to the handler sequentially,
/// in offset order.
pub struct SubscriptionLoop<C, H: ?Sized> {
    connector: C,
    handler: Arc<H>,
    state: ConsumerState,
    settings: LoopSettings,
}

impl<C, H> SubscriptionLoop<C, H>
where
    C: BrokerConnector + 'static,
    H: MessageHandler + ?Sized,
{
    /// Create a loop with default settings.
    #[must_use]
    pub fn new(connector: C, handler: Arc<H>, state: ConsumerState) -> Self {
        Self {
            connector,
            handler,
            state,
            settings: LoopSettings::default(),
        }
    }

    /// Override the default settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The shared run/liveness state.
    #[must_use]
    pub const fn state(&self) -> &ConsumerState {
        &self.state
    }

    /// Run until the run flag is cleared.
    ///
    /// Never fails: every fault is logged and retried. On return the
    /// liveness flag is `false` and no connection is held.
    pub async fn run(self) {
        tracing::info!("Subscription loop started");

        let reachable = tokio::select! {
            reachable = wait_until_reachable(
                &self.connector,
                self.settings.broker_wait,
                self.settings.probe_interval,
            ) => reachable,
            () = self.state.stopped() => {
                tracing::info!("Stop requested while waiting for broker");
                self.state.set_live(false);
                return;
            }
        };
        if !reachable {
            tracing::error!(
                max_wait_secs = self.settings.broker_wait.as_secs(),
                "Broker not reachable, continuing with reconnect attempts"
            );
        }

        let mut backoff = ReconnectBackoff::new(self.settings.backoff);

        while self.state.is_running() {
            if let SessionEnd::Fault(error) = self.run_session(&mut backoff).await {
                let streak = backoff.record_fault();
                ConsumerMetrics::record_connection_fault(error.category());
                tracing::error!(
                    category = error.category(),
                    error = %error,
                    consecutive_errors = streak,
                    backoff_secs = backoff.delay().as_secs_f64(),
                    "Broker connection fault"
                );
                if backoff.is_widening() {
                    tracing::warn!(
                        consecutive_errors = streak,
                        backoff_secs = backoff.delay().as_secs_f64(),
                        "Repeated broker faults, widening reconnect backoff"
                    );
                }
            }

            if !self.state.is_running() {
                break;
            }

            if let Some(delay) = backoff.next_sleep() {
                ConsumerMetrics::record_backoff(delay);
                tracing::info!(
                    backoff_secs = delay.as_secs_f64(),
                    consecutive_errors = backoff.streak(),
                    "Waiting before reconnecting"
                );
                tokio::select! {
                    () = tokio::time::sleep(delay) => {}
                    () = self.state.stopped() => {}
                }
            }
        }

        self.state.set_live(false);
        tracing::info!("Subscription loop stopped");
    }

    /// One connection lifetime: connect, consume until stop or fault, close.
    async fn run_session(&self, backoff: &mut ReconnectBackoff) -> SessionEnd {
        tracing::info!(consecutive_errors = backoff.streak(), "Connecting to broker");

        let mut connection = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(error) => {
                self.state.set_live(false);
                return SessionEnd::Fault(error);
            }
        };

        match connection.assignment() {
            Ok(partitions) if !partitions.is_empty() => {
                let partitions: Vec<String> = partitions.iter().map(ToString::to_string).collect();
                tracing::info!(?partitions, "Consumer assigned to partitions");
            }
            Ok(_) => tracing::info!("Partition assignment pending"),
            Err(e) => tracing::warn!(error = %e, "Could not read partition assignment"),
        }

        self.state.set_live(true);
        backoff.reset();
        ConsumerMetrics::record_backoff(Duration::ZERO);
        tracing::info!("Connected to broker, consuming messages");

        let outcome = self.consume(&mut connection).await;

        if let Err(e) = connection.close().await {
            tracing::warn!(error = %e, "Error closing broker connection");
        }
        self.state.set_live(false);
        outcome
    }

    async fn consume(&self, connection: &mut C::Connection) -> SessionEnd {
        while self.state.is_running() {
            match connection.poll(self.settings.poll_timeout).await {
                Ok(records) => {
                    for record in records {
                        self.dispatch(record).await;
                    }
                }
                Err(error) => return SessionEnd::Fault(error),
            }
        }
        SessionEnd::Stopped
    }

    async fn dispatch(&self, record: BrokerRecord) {
        let payload = match record.payload.as_deref() {
            Some(payload) if !payload.is_empty() => payload,
            _ => {
                tracing::warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    "Received record without payload, skipping"
                );
                ConsumerMetrics::record_skipped("empty_payload");
                return;
            }
        };

        let message = match ComplaintMessage::decode(payload) {
            Ok(Some(message)) => message,
            Ok(None) => {
                tracing::warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    "Received null message, skipping"
                );
                ConsumerMetrics::record_skipped("null_payload");
                return;
            }
            Err(e) => {
                tracing::error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    raw = %record.payload_preview(),
                    "Failed to decode message, skipping"
                );
                ConsumerMetrics::record_skipped("malformed");
                return;
            }
        };

        tracing::debug!(
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            id = message.id.as_deref().unwrap_or("<missing>"),
            "Processing message"
        );

        match AssertUnwindSafe(self.handler.handle(message))
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => ConsumerMetrics::record_processed(),
            Ok(Err(e)) => {
                tracing::error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "Message handler failed"
                );
                ConsumerMetrics::record_handler_failure();
            }
            Err(panic) => {
                tracing::error!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    panic = %panic_message(panic.as_ref()),
                    "Message handler panicked"
                );
                ConsumerMetrics::record_handler_failure();
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
