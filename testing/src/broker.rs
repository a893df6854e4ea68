//! Scripted broker for exercising the subscription loop.
//!
//! Each call to `connect` consumes the next entry of the script: either a
//! connect failure or a session, which is itself a list of poll results.
//! Once a session runs out of steps every poll idles for the full timeout.
//! Once the script runs out every connect fails with
//! [`BrokerError::NoBrokersAvailable`].

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)]

use complaints_core::{
    BrokerConnection, BrokerConnector, BrokerError, BrokerRecord, TopicPartition,
};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Topic used by scripted records.
pub const SCRIPTED_TOPIC: &str = "complaints.v1";

/// One poll result within a scripted session.
#[derive(Debug, Clone)]
pub enum SessionStep {
    /// Return these records.
    Deliver(Vec<BrokerRecord>),
    /// Fail the poll.
    Fault(BrokerError),
    /// Wait for the full poll timeout and return nothing.
    Idle,
}

impl SessionStep {
    /// Deliver one record per payload, with consecutive offsets from 0.
    #[must_use]
    pub fn payloads<'a>(payloads: impl IntoIterator<Item = &'a [u8]>) -> Self {
        Self::Deliver(
            payloads
                .into_iter()
                .zip(0_i64..)
                .map(|(payload, offset)| {
                    BrokerRecord::new(SCRIPTED_TOPIC, 0, offset, Some(payload.to_vec()))
                })
                .collect(),
        )
    }
}

#[derive(Debug)]
enum ConnectOutcome {
    Fail(BrokerError),
    Session(Vec<SessionStep>),
}

#[derive(Debug, Default)]
struct Shared {
    unreachable_probes: u32,
    probes: u32,
    script: VecDeque<ConnectOutcome>,
    connects: Vec<Instant>,
    closes: u32,
}

type ConnectHook = Arc<dyn Fn(u32) + Send + Sync>;

/// Deterministic [`BrokerConnector`].
///
/// Clones share the script and the call counters, so a test can keep one
/// clone for assertions while the subscription loop owns another.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    shared: Arc<Mutex<Shared>>,
    on_connect: Option<ConnectHook>,
}

impl ScriptedConnector {
    /// A reachable broker with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `probes` reachability probes.
    #[must_use]
    pub fn unreachable_for(self, probes: u32) -> Self {
        self.shared.lock().unwrap().unreachable_probes = probes;
        self
    }

    /// Append a failed connect attempt.
    #[must_use]
    pub fn fail_connect(self, error: BrokerError) -> Self {
        self.shared
            .lock()
            .unwrap()
            .script
            .push_back(ConnectOutcome::Fail(error));
        self
    }

    /// Append a successful connect followed by `steps`.
    #[must_use]
    pub fn session(self, steps: impl IntoIterator<Item = SessionStep>) -> Self {
        self.shared
            .lock()
            .unwrap()
            .script
            .push_back(ConnectOutcome::Session(steps.into_iter().collect()));
        self
    }

    /// Call `hook` with the 1-based attempt number on every connect.
    #[must_use]
    pub fn on_connect(mut self, hook: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(hook));
        self
    }

    /// Probe attempts so far.
    #[must_use]
    pub fn probe_count(&self) -> u32 {
        self.shared.lock().unwrap().probes
    }

    /// Connect attempts so far, successful or not.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.shared.lock().unwrap().connects.len()
    }

    /// Instants at which connect was attempted.
    #[must_use]
    pub fn connect_times(&self) -> Vec<Instant> {
        self.shared.lock().unwrap().connects.clone()
    }

    /// Gaps between consecutive connect attempts.
    #[must_use]
    pub fn connect_gaps(&self) -> Vec<Duration> {
        self.connect_times()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    /// Connections closed so far.
    #[must_use]
    pub fn close_count(&self) -> u32 {
        self.shared.lock().unwrap().closes
    }
}

impl BrokerConnector for ScriptedConnector {
    type Connection = ScriptedConnection;

    fn probe(&self) -> impl Future<Output = Result<(), BrokerError>> + Send {
        let result = {
            let mut shared = self.shared.lock().unwrap();
            shared.probes += 1;
            if shared.probes <= shared.unreachable_probes {
                Err(BrokerError::NoBrokersAvailable(format!(
                    "probe {} refused",
                    shared.probes
                )))
            } else {
                Ok(())
            }
        };
        async move { result }
    }

    fn connect(&self) -> impl Future<Output = Result<Self::Connection, BrokerError>> + Send {
        let (attempt, outcome) = {
            let mut shared = self.shared.lock().unwrap();
            shared.connects.push(Instant::now());
            let attempt = u32::try_from(shared.connects.len()).unwrap_or(u32::MAX);
            (attempt, shared.script.pop_front())
        };
        let hook = self.on_connect.clone();
        let shared = Arc::clone(&self.shared);

        async move {
            if let Some(hook) = hook {
                hook(attempt);
            }
            match outcome {
                Some(ConnectOutcome::Session(steps)) => Ok(ScriptedConnection {
                    steps: steps.into(),
                    shared,
                }),
                Some(ConnectOutcome::Fail(error)) => Err(error),
                None => Err(BrokerError::NoBrokersAvailable(
                    "scripted broker has no more sessions".to_string(),
                )),
            }
        }
    }
}

/// Connection handed out by [`ScriptedConnector`].
#[derive(Debug)]
pub struct ScriptedConnection {
    steps: VecDeque<SessionStep>,
    shared: Arc<Mutex<Shared>>,
}

impl BrokerConnection for ScriptedConnection {
    fn assignment(&self) -> Result<Vec<TopicPartition>, BrokerError> {
        Ok(vec![TopicPartition {
            topic: SCRIPTED_TOPIC.to_string(),
            partition: 0,
        }])
    }

    fn poll(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<BrokerRecord>, BrokerError>> + Send {
        let step = self.steps.pop_front();
        async move {
            match step {
                Some(SessionStep::Deliver(records)) => Ok(records),
                Some(SessionStep::Fault(error)) => Err(error),
                Some(SessionStep::Idle) | None => {
                    tokio::time::sleep(timeout).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    fn close(self) -> impl Future<Output = Result<(), BrokerError>> + Send {
        self.shared.lock().unwrap().closes += 1;
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sessions_play_back_in_order() {
        let connector = ScriptedConnector::new()
            .fail_connect(BrokerError::Transport("refused".to_string()))
            .session([SessionStep::payloads([b"{}".as_slice()])]);

        assert!(connector.connect().await.is_err());

        let mut connection = connector.connect().await.unwrap();
        let records = connection.poll(Duration::from_secs(5)).await.unwrap();
        assert_eq!(records.len(), 1);

        let started = Instant::now();
        let idle = connection.poll(Duration::from_secs(5)).await.unwrap();
        assert!(idle.is_empty());
        assert_eq!(started.elapsed(), Duration::from_secs(5));

        connection.close().await.unwrap();
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(connector.close_count(), 1);
    }

    #[tokio::test]
    async fn exhausted_script_reports_no_brokers() {
        let connector = ScriptedConnector::new();
        let result = connector.connect().await;
        assert!(matches!(result, Err(BrokerError::NoBrokersAvailable(_))));
    }

    #[tokio::test]
    async fn probe_failures_are_counted() {
        let connector = ScriptedConnector::new().unreachable_for(2);
        assert!(connector.probe().await.is_err());
        assert!(connector.probe().await.is_err());
        assert!(connector.probe().await.is_ok());
        assert_eq!(connector.probe_count(), 3);
    }
}
