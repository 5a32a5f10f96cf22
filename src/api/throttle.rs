//! Sliding-window request throttle
//!
//! Admits at most `max_calls` calls in any trailing `window`, computed from a
//! pruned log of call timestamps rather than fixed buckets.

use crate::output::Reporter;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Extra time slept past the computed wait, since sleeps are imprecise
const WAIT_BUFFER: Duration = Duration::from_millis(10);

/// Ordered log of admitted call timestamps, oldest first
#[derive(Debug, Clone)]
pub struct RateWindow {
    calls: VecDeque<Instant>,
    max_calls: usize,
    window: Duration,
}

impl RateWindow {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            calls: VecDeque::with_capacity(max_calls),
            max_calls,
            window,
        }
    }

    /// Drops timestamps that fell out of the trailing window ending at `now`
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.calls.front() {
            if now.saturating_duration_since(oldest) > self.window {
                self.calls.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time to wait before one more call may be admitted, or `None` if it
    /// may be admitted at `now`
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        self.prune(now);
        if self.calls.len() < self.max_calls {
            return None;
        }
        let oldest = *self.calls.front()?;
        Some((oldest + self.window).saturating_duration_since(now) + WAIT_BUFFER)
    }

    /// Records an admitted call
    pub fn record(&mut self, now: Instant) {
        self.calls.push_back(now);
    }

    /// Number of calls currently inside the window
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn max_calls(&self) -> usize {
        self.max_calls
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Shared admission gate over a [`RateWindow`]
///
/// Admission is serialized: concurrent callers queue on the window lock, so
/// the limit holds no matter how many tasks share one throttle.
#[derive(Debug)]
pub struct Throttle {
    window: Mutex<RateWindow>,
}

impl Throttle {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            window: Mutex::new(RateWindow::new(max_calls, window)),
        }
    }

    /// Waits until one more call fits in the window, then records it
    ///
    /// The check is repeated after every sleep instead of trusting the sleep
    /// duration. Returns the total time spent waiting.
    pub async fn admit(&self, reporter: &Reporter) -> Duration {
        let mut window = self.window.lock().await;
        let mut waited = Duration::ZERO;

        while let Some(wait) = window.wait_time(Instant::now()) {
            reporter.warn(format!(
                "Reached the limit of {} requests per {}s, pausing {:.2}s...",
                window.max_calls(),
                window.window().as_secs(),
                wait.as_secs_f64()
            ));
            tokio::time::sleep(wait).await;
            waited += wait;
        }

        window.record(Instant::now());
        waited
    }

    /// Number of calls inside the current window
    pub async fn in_flight_window(&self) -> usize {
        let mut window = self.window.lock().await;
        window.prune(Instant::now());
        window.len()
    }
}
