//! HTTP transport for VK API method calls
//!
//! This module handles the wire side of a remote call:
//! - Building the HTTP client
//! - Posting form-encoded parameters to `{base_url}/method/{name}`
//! - HTTP-level retries for 429/5xx and transport errors
//! - Decoding the `{"response": ...}` / `{"error": {...}}` envelope
//!
//! # Error mapping
//!
//! | Condition | Result |
//! |-----------|--------|
//! | `{"error": {"error_code": N}}` | `RemoteError::api(N, msg)` |
//! | HTTP 429 after local retries | RateLimited |
//! | HTTP 5xx, timeout, connect failure after local retries | Network |
//! | Other non-success status, invalid JSON, missing envelope | Protocol |

use crate::api::{Params, RemoteError};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Performs a single named remote call
///
/// Implementations report failures already classified; the gateway decides
/// whether to retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, params: &Params) -> Result<Value, RemoteError>;
}

/// Builds an HTTP client with proper configuration
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`Transport`] over the public HTTPS API
pub struct HttpTransport {
    client: Client,
    base_url: String,
    version: String,
    token: String,
    local_retries: u32,
    local_retry_backoff: Duration,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig, token: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, config, token))
    }

    pub fn with_client(client: Client, config: &ApiConfig, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.clone(),
            token: token.into(),
            local_retries: config.local_retries,
            local_retry_backoff: Duration::from_millis(config.local_retry_backoff_ms),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/method/{}", self.base_url, method)
    }

    fn retry_delay(&self, attempt: u32) -> Duration {
        self.local_retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: &Params) -> Result<Value, RemoteError> {
        let url = self.method_url(method);
        let mut form: Vec<(&str, &str)> = params.iter().collect();
        form.push(("access_token", self.token.as_str()));
        form.push(("v", self.version.as_str()));

        let mut attempt = 0;
        loop {
            let failure = match self.client.post(&url).form(&form).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        return read_response(method, response).await;
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        RemoteError::throttled(format!("HTTP {} from {}", status, method))
                    } else {
                        RemoteError::network(format!("HTTP {} from {}", status, method))
                    }
                }
                Err(e) => RemoteError::network(describe_transport_error(&e)),
            };

            if attempt >= self.local_retries {
                return Err(failure);
            }

            let delay = self.retry_delay(attempt);
            tracing::debug!(
                "{} failed ({}), HTTP retry {}/{} in {:?}",
                method,
                failure.message,
                attempt + 1,
                self.local_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Statuses retried at the HTTP level before surfacing
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}

async fn read_response(method: &str, response: reqwest::Response) -> Result<Value, RemoteError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| RemoteError::network(format!("Reading {} reply: {}", method, e)))?;

    if !status.is_success() {
        return Err(RemoteError::protocol(format!(
            "HTTP {} from {}",
            status, method
        )));
    }

    decode_envelope(method, &body)
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: Option<Value>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error_code: i64,
    #[serde(default)]
    error_msg: String,
}

/// Decodes the API reply envelope
pub(crate) fn decode_envelope(method: &str, body: &[u8]) -> Result<Value, RemoteError> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| RemoteError::protocol(format!("Invalid JSON from {}: {}", method, e)))?;

    match envelope {
        Envelope {
            error: Some(error), ..
        } => Err(RemoteError::api(error.error_code, error.error_msg)),
        Envelope {
            response: Some(response),
            ..
        } => Ok(response),
        _ => Err(RemoteError::protocol(format!(
            "Reply from {} has neither response nor error",
            method
        ))),
    }
}
