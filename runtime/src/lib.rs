//! # Complaints Runtime
//!
//! The consumption engine behind the acknowledgement service. It keeps one
//! subscription to the complaints topic alive for the lifetime of the
//! process, hands each decoded message to a
//! [`MessageHandler`](complaints_core::MessageHandler), and publishes a
//! liveness flag for readiness checks.
//!
//! ## Components
//!
//! - [`ConsumerState`] - shared run and liveness flags
//! - [`ReconnectBackoff`] - error streak and reconnect delay
//! - [`wait_until_reachable`] - bounded broker reachability probe
//! - [`SubscriptionLoop`] - connect/consume/reconnect state machine
//! - [`ConsumerSupervisor`] - background task start and bounded shutdown
//!
//! ## Example
//!
//! ```rust,ignore
//! let state = ConsumerState::new();
//! let subscription = SubscriptionLoop::new(connector, handler, state.clone());
//! let supervisor = ConsumerSupervisor::start(subscription, SupervisorSettings::default());
//!
//! // ... serve HTTP, reading `state.is_live()` for readiness ...
//!
//! supervisor.shutdown().await;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backoff;
pub mod lifecycle;
pub mod metrics;
pub mod probe;
pub mod state;
pub mod subscription;

pub use backoff::{BackoffPolicy, ReconnectBackoff};
pub use lifecycle::{ConsumerSupervisor, ShutdownOutcome, SupervisorSettings};
pub use metrics::{ConsumerMetrics, MetricsError, MetricsServer};
pub use probe::{PROBE_INTERVAL, wait_until_reachable};
pub use state::{ConsumerState, ConsumerStatus};
pub use subscription::{LoopSettings, SubscriptionLoop};
