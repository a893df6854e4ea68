//! Reconnect backoff for the subscription loop.
//!
//! Unlike a per-call retry policy, this one is stateful across reconnect
//! attempts: the delay stays at the floor for the first few consecutive
//! faults and only starts doubling once the streak reaches a threshold.
//! A successful connect resets both the streak and the delay.
//!
//! # Example
//!
//! ```rust
//! use complaints_runtime::backoff::{BackoffPolicy, ReconnectBackoff};
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::builder()
//!     .ceiling(Duration::from_secs(30))
//!     .build();
//! let mut backoff = ReconnectBackoff::new(policy);
//!
//! assert_eq!(backoff.next_sleep(), None);
//! backoff.record_fault();
//! assert_eq!(backoff.next_sleep(), Some(Duration::from_secs(1)));
//! ```

use std::time::Duration;

/// Backoff configuration.
///
/// # Default Values
///
/// - `floor`: 1 second
/// - `ceiling`: 60 seconds
/// - `streak_threshold`: 5 consecutive faults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay after the first fault, and after every reset
    pub floor: Duration,
    /// Upper bound for the delay
    pub ceiling: Duration,
    /// Consecutive faults after which the delay starts doubling
    pub streak_threshold: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(1),
            ceiling: Duration::from_secs(60),
            streak_threshold: 5,
        }
    }
}

impl BackoffPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder {
            floor: Duration::from_secs(1),
            ceiling: Duration::from_secs(60),
            streak_threshold: 5,
        }
    }

    const fn initial_delay(&self) -> Duration {
        if self.floor.as_nanos() > self.ceiling.as_nanos() {
            self.ceiling
        } else {
            self.floor
        }
    }
}

/// Builder for [`BackoffPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicyBuilder {
    floor: Duration,
    ceiling: Duration,
    streak_threshold: u32,
}

impl BackoffPolicyBuilder {
    /// Set the floor delay.
    #[must_use]
    pub const fn floor(mut self, floor: Duration) -> Self {
        self.floor = floor;
        self
    }

    /// Set the ceiling delay.
    #[must_use]
    pub const fn ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Set the streak length after which the delay doubles.
    #[must_use]
    pub const fn streak_threshold(mut self, threshold: u32) -> Self {
        self.streak_threshold = threshold;
        self
    }

    /// Build the policy.
    #[must_use]
    pub const fn build(self) -> BackoffPolicy {
        BackoffPolicy {
            floor: self.floor,
            ceiling: self.ceiling,
            streak_threshold: self.streak_threshold,
        }
    }
}

/// Error streak and current delay of a reconnecting consumer.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    policy: BackoffPolicy,
    streak: u32,
    delay: Duration,
}

impl ReconnectBackoff {
    /// Start with no faults and the delay at the floor.
    #[must_use]
    pub const fn new(policy: BackoffPolicy) -> Self {
        Self {
            streak: 0,
            delay: policy.initial_delay(),
            policy,
        }
    }

    /// Record a connectivity fault and return the new streak length.
    ///
    /// Once the streak reaches the threshold, every further fault doubles
    /// the delay up to the ceiling.
    pub fn record_fault(&mut self) -> u32 {
        self.streak = self.streak.saturating_add(1);
        if self.is_widening() {
            self.delay = self.delay.saturating_mul(2).min(self.policy.ceiling);
        }
        self.streak
    }

    /// Clear the streak and return the delay to the floor.
    pub const fn reset(&mut self) {
        self.streak = 0;
        self.delay = self.policy.initial_delay();
    }

    /// How long to wait before the next connect attempt.
    ///
    /// `None` when the last attempt did not fault.
    #[must_use]
    pub const fn next_sleep(&self) -> Option<Duration> {
        if self.streak == 0 {
            None
        } else {
            Some(self.delay)
        }
    }

    /// Current consecutive fault count.
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    /// Current delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether the streak is long enough for the delay to grow.
    #[must_use]
    pub const fn is_widening(&self) -> bool {
        self.streak >= self.policy.streak_threshold
    }

    /// The policy in use.
    #[must_use]
    pub const fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }
}
