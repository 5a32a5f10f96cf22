//! Classified retry/backoff controller
//!
//! | Class | Trigger | Base | Growth | Ceiling |
//! |-------|---------|------|--------|---------|
//! | RateLimit | service reports too many requests | 0.34s | x2 | 10s |
//! | Network | timeout, connection failure, 5xx | 1s | x2 | 20s |
//!
//! Both classes are retried without an attempt limit; the ceiling bounds the
//! pacing, not the number of attempts. Every other error is fatal to the call.

use crate::api::{RemoteError, RemoteErrorKind};
use crate::config::RetryConfig;
use std::time::Duration;

/// Failure classes that are retried after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    RateLimit,
    Network,
}

impl FailureClass {
    /// Returns the retry class of an error kind, or `None` if it is fatal
    pub fn of(kind: RemoteErrorKind) -> Option<Self> {
        match kind {
            RemoteErrorKind::RateLimited => Some(Self::RateLimit),
            RemoteErrorKind::Network => Some(Self::Network),
            RemoteErrorKind::PermissionOrNotFound
            | RemoteErrorKind::Api
            | RemoteErrorKind::Protocol => None,
        }
    }
}

/// What the gateway should do with a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then re-issue the call
    RetryAfter {
        class: FailureClass,
        delay: Duration,
        /// Consecutive failures of this class, including this one
        attempt: u32,
    },
    /// Surface the error to the caller
    Fatal,
}

/// Current delay of one failure class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    base: Duration,
    ceiling: Duration,
    current: Duration,
    consecutive_failures: u32,
}

impl BackoffState {
    pub fn new(base: Duration, ceiling: Duration) -> Self {
        Self {
            base,
            ceiling,
            current: base.min(ceiling),
            consecutive_failures: 0,
        }
    }

    /// Records a failure and returns the delay to sleep before retrying
    ///
    /// The following failure waits twice as long, up to the ceiling.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.ceiling);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }

    /// Resets the delay to its base after a success
    pub fn reset(&mut self) {
        self.current = self.base.min(self.ceiling);
        self.consecutive_failures = 0;
    }

    /// Delay the next failure would sleep for
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }
}

/// Per-run backoff state for both retried classes
#[derive(Debug, Clone)]
pub struct Backoff {
    rate_limit: BackoffState,
    network: BackoffState,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            rate_limit: BackoffState::new(
                Duration::from_millis(config.rate_limit_base_ms),
                Duration::from_millis(config.rate_limit_ceiling_ms),
            ),
            network: BackoffState::new(
                Duration::from_millis(config.network_base_ms),
                Duration::from_millis(config.network_ceiling_ms),
            ),
        }
    }

    /// Decides between retrying after a delay and giving up on the call
    pub fn classify_and_maybe_retry(&mut self, error: &RemoteError) -> RetryDecision {
        match FailureClass::of(error.kind) {
            Some(class) => {
                let state = self.state_mut(class);
                let delay = state.next_delay();
                RetryDecision::RetryAfter {
                    class,
                    delay,
                    attempt: state.consecutive_failures(),
                }
            }
            None => RetryDecision::Fatal,
        }
    }

    /// Resets both classes after a successful call
    pub fn record_success(&mut self) {
        self.rate_limit.reset();
        self.network.reset();
    }

    pub fn state(&self, class: FailureClass) -> &BackoffState {
        match class {
            FailureClass::RateLimit => &self.rate_limit,
            FailureClass::Network => &self.network,
        }
    }

    fn state_mut(&mut self, class: FailureClass) -> &mut BackoffState {
        match class {
            FailureClass::RateLimit => &mut self.rate_limit,
            FailureClass::Network => &mut self.network,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
