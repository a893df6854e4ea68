//! Broker reachability probe.

use complaints_core::BrokerConnector;
use std::time::Duration;
use tokio::time::Instant;

/// Interval between probe attempts.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(2);

/// Probe the broker until it answers or `max_wait` elapses.
///
/// Each attempt uses the connector's throwaway probe client. Returns `true`
/// as soon as one attempt succeeds, `false` if the deadline passes first.
/// Never fails. A `max_wait` too large to represent as a deadline means
/// waiting until the broker answers.
pub async fn wait_until_reachable<C>(connector: &C, max_wait: Duration, interval: Duration) -> bool
where
    C: BrokerConnector + ?Sized,
{
    let deadline = Instant::now().checked_add(max_wait);
    let mut attempt: u32 = 0;

    tracing::info!(max_wait_secs = max_wait.as_secs(), "Waiting for broker to become reachable");

    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        attempt = attempt.saturating_add(1);
        match connector.probe().await {
            Ok(()) => {
                tracing::info!(attempt, "Broker is reachable");
                return true;
            }
            Err(e) => {
                tracing::debug!(
                    attempt,
                    category = e.category(),
                    error = %e,
                    "Broker not reachable yet"
                );
            }
        }
        tokio::time::sleep(interval).await;
    }

    tracing::warn!(
        attempts = attempt,
        max_wait_secs = max_wait.as_secs(),
        "Broker still unreachable after waiting"
    );
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use complaints_testing::ScriptedConnector;

    #[tokio::test(start_paused = true)]
    async fn returns_true_once_probe_succeeds() {
        let connector = ScriptedConnector::new().unreachable_for(3);

        let reachable =
            wait_until_reachable(&connector, Duration::from_secs(120), PROBE_INTERVAL).await;

        assert!(reachable);
        assert_eq!(connector.probe_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_deadline() {
        let connector = ScriptedConnector::new().unreachable_for(u32::MAX);

        let started = Instant::now();
        let reachable =
            wait_until_reachable(&connector, Duration::from_secs(10), PROBE_INTERVAL).await;

        assert!(!reachable);
        assert_eq!(connector.probe_count(), 5);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }
    #[tokio::test(start_paused = true)]
    async fn unrepresentable_wait_means_no_deadline() {
        let connector = ScriptedConnector::new().unreachable_for(2);

        let reachable = wait_until_reachable(&connector, Duration::MAX, PROBE_INTERVAL).await;

        assert!(reachable);
        assert_eq!(connector.probe_count(), 3);
    }
}
