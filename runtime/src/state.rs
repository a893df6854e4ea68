//! Shared run/liveness flags for the consumer task.
//!
//! `running` is the stop signal: written by the lifecycle supervisor, read by
//! the subscription loop on every iteration. `live` reports whether a broker
//! connection is currently established; it is written by the loop and read by
//! the HTTP readiness endpoints.
//!
//! Both flags are single-writer, multi-reader booleans. Lost-update races are
//! not a concern, so plain atomics are enough. A [`Notify`] lets sleeping
//! tasks wake up as soon as a stop is requested.

use crate::metrics::ConsumerMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Flags {
    running: AtomicBool,
    live: AtomicBool,
    stop: Notify,
}

/// Cloneable handle to the consumer's run and liveness flags.
#[derive(Debug, Clone, Default)]
pub struct ConsumerState {
    flags: Arc<Flags>,
}

/// Point-in-time copy of [`ConsumerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumerStatus {
    /// Whether the consumer has been asked to keep running.
    pub running: bool,
    /// Whether a broker connection is established.
    pub live: bool,
}

impl ConsumerState {
    /// Both flags start out `false`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the run flag. Clearing it wakes every task waiting in
    /// [`stopped`](Self::stopped).
    pub fn set_running(&self, running: bool) {
        let previous = self.flags.running.swap(running, Ordering::SeqCst);
        if previous != running {
            tracing::debug!(running, "Consumer run flag changed");
        }
        if !running {
            self.flags.stop.notify_waiters();
        }
    }

    /// Whether the consumer should keep running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.flags.running.load(Ordering::SeqCst)
    }

    /// Set the liveness flag.
    pub fn set_live(&self, live: bool) {
        let previous = self.flags.live.swap(live, Ordering::SeqCst);
        if previous != live {
            tracing::info!(live, "Consumer liveness changed");
            ConsumerMetrics::record_live(live);
        }
    }

    /// Whether a broker connection is currently established.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.flags.live.load(Ordering::SeqCst)
    }

    /// Snapshot both flags.
    #[must_use]
    pub fn status(&self) -> ConsumerStatus {
        ConsumerStatus {
            running: self.is_running(),
            live: self.is_live(),
        }
    }

    /// Resolves once the run flag is `false`.
    ///
    /// Returns immediately if it already is.
    pub async fn stopped(&self) {
        loop {
            let notified = self.flags.stop.notified();
            tokio::pin!(notified);
            // Register before checking the flag so a concurrent
            // `set_running(false)` cannot slip between the two.
            notified.as_mut().enable();
            if !self.is_running() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flags_start_cleared() {
        let state = ConsumerState::new();
        assert_eq!(
            state.status(),
            ConsumerStatus {
                running: false,
                live: false
            }
        );
    }

    #[test]
    fn clones_share_flags() {
        let state = ConsumerState::new();
        let observer = state.clone();

        state.set_running(true);
        state.set_live(true);

        assert!(observer.is_running());
        assert!(observer.is_live());
    }

    #[tokio::test]
    async fn stopped_returns_immediately_when_not_running() {
        let state = ConsumerState::new();
        tokio::time::timeout(Duration::from_millis(100), state.stopped())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn stopped_wakes_on_stop_request() {
        let state = ConsumerState::new();
        state.set_running(true);

        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.stopped().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        state.set_running(false);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
