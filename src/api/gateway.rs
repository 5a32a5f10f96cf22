use crate::api::{Backoff, Params, RemoteError, RetryDecision, Throttle, Transport};
use crate::config::{LimitsConfig, RetryConfig};
use crate::output::Reporter;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};

/// The single chokepoint for remote calls
///
/// Each call is admitted by the throttle, attempted through the transport,
/// and on a rate-limit or network failure re-issued after the backoff delay
/// (re-admitted by the throttle each time). Throttle and backoff state belong
/// to this gateway, so independent runs use independent gateways.
pub struct Gateway {
    transport: Arc<dyn Transport>,
    throttle: Throttle,
    backoff: Mutex<Backoff>,
    reporter: Reporter,
}

impl Gateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        limits: &LimitsConfig,
        retry: &RetryConfig,
        reporter: Reporter,
    ) -> Self {
        Self {
            transport,
            throttle: Throttle::new(limits.max_calls, limits.window()),
            backoff: Mutex::new(Backoff::new(retry)),
            reporter,
        }
    }

    /// Invokes a named remote method
    ///
    /// # Returns
    ///
    /// * `Ok(Value)` - The `response` payload
    /// * `Err(RemoteError)` - A failure that retrying cannot fix
    pub async fn invoke(&self, method: &str, params: &Params) -> Result<Value, RemoteError> {
        loop {
            self.throttle.admit(&self.reporter).await;

            let error = match self.transport.call(method, params).await {
                Ok(value) => {
                    self.backoff().record_success();
                    return Ok(value);
                }
                Err(error) => error,
            };

            let decision = self.backoff().classify_and_maybe_retry(&error);
            match decision {
                RetryDecision::RetryAfter {
                    delay, attempt, ..
                } => {
                    self.reporter.warn(format!(
                        "{} on {}, retrying in {:.2}s (attempt {})",
                        error,
                        method,
                        delay.as_secs_f64(),
                        attempt
                    ));
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Fatal => return Err(error),
            }
        }
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /// Snapshot of the backoff state
    pub fn backoff_snapshot(&self) -> Backoff {
        self.backoff().clone()
    }

    fn backoff(&self) -> std::sync::MutexGuard<'_, Backoff> {
        self.backoff.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
