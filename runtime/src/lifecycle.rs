//! Start/stop supervision of the consumer task.
//!
//! The subscription loop runs as a single background task. Startup is
//! non-blocking: the HTTP surface can serve (and report `live == false`)
//! while the task waits out the stabilization delay and connects.
//! Shutdown clears the run flag and waits a bounded time for the task; a
//! task that does not finish in time is abandoned, never forcibly killed
//! mid-handler.

use crate::state::ConsumerState;
use crate::subscription::SubscriptionLoop;
use complaints_core::{BrokerConnector, MessageHandler};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timing for [`ConsumerSupervisor`].
///
/// # Default Values
///
/// - `startup_delay`: 10 seconds
/// - `shutdown_timeout`: 10 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Delay before the first connect, giving the broker's group
    /// coordinator time to settle after a cold start.
    pub startup_delay: Duration,
    /// How long [`ConsumerSupervisor::shutdown`] waits for the task.
    pub shutdown_timeout: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(10),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// How [`ConsumerSupervisor::shutdown`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The task finished within the timeout.
    Completed,
    /// The task ended abnormally.
    Failed,
    /// The task did not finish in time and was abandoned.
    TimedOut,
}

/// Owner of the running consumer task.
pub struct ConsumerSupervisor {
    state: ConsumerState,
    handle: JoinHandle<()>,
    shutdown_timeout: Duration,
}

impl ConsumerSupervisor {
    /// Mark the consumer as running and launch it in the background.
    ///
    /// Returns immediately. Must be called from within a tokio runtime.
    #[must_use = "dropping the supervisor detaches the consumer task"]
    pub fn start<C, H>(subscription: SubscriptionLoop<C, H>, settings: SupervisorSettings) -> Self
    where
        C: BrokerConnector + 'static,
        H: MessageHandler + ?Sized,
    {
        let state = subscription.state().clone();
        state.set_running(true);

        let task_state = state.clone();
        let startup_delay = settings.startup_delay;
        let handle = tokio::spawn(async move {
            if !startup_delay.is_zero() {
                tracing::info!(
                    delay_secs = startup_delay.as_secs(),
                    "Waiting for broker coordination to stabilize"
                );
                tokio::select! {
                    () = tokio::time::sleep(startup_delay) => {}
                    () = task_state.stopped() => {
                        tracing::info!("Stop requested during startup delay");
                        return;
                    }
                }
            }
            subscription.run().await;
        });

        tracing::info!("Consumer task started");
        Self {
            state,
            handle,
            shutdown_timeout: settings.shutdown_timeout,
        }
    }

    /// The shared run/liveness state.
    #[must_use]
    pub const fn state(&self) -> &ConsumerState {
        &self.state
    }

    /// Whether the consumer task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Request a stop and wait up to the shutdown timeout for the task.
    ///
    /// Liveness is `false` when this returns, whatever the outcome.
    pub async fn shutdown(self) -> ShutdownOutcome {
        tracing::info!("Stopping consumer");
        self.state.set_running(false);

        let outcome = match tokio::time::timeout(self.shutdown_timeout, self.handle).await {
            Ok(Ok(())) => {
                tracing::info!("Consumer stopped");
                ShutdownOutcome::Completed
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Consumer task ended abnormally");
                ShutdownOutcome::Failed
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.shutdown_timeout.as_secs(),
                    "Consumer did not stop in time, abandoning task"
                );
                ShutdownOutcome::TimedOut
            }
        };

        self.state.set_live(false);
        outcome
    }
}
