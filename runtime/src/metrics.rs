//! Prometheus metrics for the consumer.
//!
//! # Example
//!
//! ```rust,no_run
//! use complaints_runtime::metrics::MetricsServer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus scrape endpoint.
pub struct MetricsServer {
    addr: SocketAddr,
    started: bool,
}

impl MetricsServer {
    /// Create a server for `addr` (e.g. `0.0.0.0:9090`).
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            started: false,
        }
    }

    /// Register metric descriptions and start the HTTP listener.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if the listener cannot be bound or
    /// a different recorder is already installed.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        if self.started {
            return Ok(());
        }

        PrometheusBuilder::new()
            .with_http_listener(self.addr)
            .install()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();
        self.started = true;
        tracing::info!(
            addr = %self.addr,
            "Metrics server started - available at http://{}/metrics",
            self.addr
        );
        Ok(())
    }

    /// Address the listener binds to.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }
}

fn register_metrics() {
    describe_counter!(
        "consumer_messages_processed_total",
        "Messages the handler returned Ok for; handlers may absorb their own failures"
    );
    describe_counter!(
        "consumer_messages_skipped_total",
        "Records skipped before reaching the handler, by reason"
    );
    describe_counter!(
        "consumer_handler_failures_total",
        "Handler invocations that returned an error or panicked"
    );
    describe_counter!(
        "consumer_connection_faults_total",
        "Broker connectivity faults, by category"
    );
    describe_gauge!(
        "consumer_live",
        "1 while a broker connection is established, 0 otherwise"
    );
    describe_gauge!(
        "consumer_backoff_seconds",
        "Delay applied before the next reconnect attempt"
    );
}

/// Subscription loop metrics recorder.
pub struct ConsumerMetrics;

impl ConsumerMetrics {
    /// The handler returned `Ok`. This says nothing about the outcome of a
    /// handler that absorbs its own failures.
    pub fn record_processed() {
        counter!("consumer_messages_processed_total").increment(1);
    }

    /// A record was skipped before reaching the handler.
    pub fn record_skipped(reason: &'static str) {
        counter!("consumer_messages_skipped_total", "reason" => reason).increment(1);
    }

    /// The handler returned an error or panicked.
    pub fn record_handler_failure() {
        counter!("consumer_handler_failures_total").increment(1);
    }

    /// A connectivity fault occurred.
    pub fn record_connection_fault(category: &'static str) {
        counter!("consumer_connection_faults_total", "category" => category).increment(1);
    }

    /// Liveness flag changed.
    pub fn record_live(live: bool) {
        gauge!("consumer_live").set(if live { 1.0 } else { 0.0 });
    }

    /// Delay before the next reconnect attempt.
    pub fn record_backoff(delay: Duration) {
        gauge!("consumer_backoff_seconds").set(delay.as_secs_f64());
    }
}
