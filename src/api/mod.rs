//! Remote call gateway for the VK API
//!
//! Every remote call made by this crate goes through [`Gateway::invoke`],
//! which composes:
//! - a sliding-window request throttle
//! - a classified retry/backoff controller
//! - a [`Transport`] that performs the actual call
//!
//! Typed wrappers for the wall and name-lookup methods live in `methods`.

mod backoff;
mod gateway;
mod methods;
mod throttle;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::{Backoff, BackoffState, FailureClass, RetryDecision};
pub use gateway::Gateway;
pub use throttle::{RateWindow, Throttle};
pub use transport::{build_http_client, HttpTransport, Transport};
pub use types::{Attachment, Comment, Page, Post, ResolvedName, Thread};

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// API error code for "too many requests per second"
pub const RATE_LIMIT_CODE: i64 = 6;

/// API error codes meaning the target is gone or we lack rights on it
///
/// Retrying any of these cannot help.
pub const PERMISSION_CODES: &[i64] = &[7, 15, 18, 30, 100, 203, 210, 211, 212, 1051];

/// Classification of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// The service reported too many requests
    RateLimited,
    /// Timeout, connection failure, or 5xx after HTTP-level retries
    Network,
    /// Missing permissions, deleted or nonexistent target, wrong profile type
    PermissionOrNotFound,
    /// Any other error reported by the service
    Api,
    /// The reply could not be understood
    Protocol,
}

impl RemoteErrorKind {
    /// Maps a service error code to its kind
    pub fn from_api_code(code: i64) -> Self {
        if code == RATE_LIMIT_CODE {
            Self::RateLimited
        } else if PERMISSION_CODES.contains(&code) {
            Self::PermissionOrNotFound
        } else {
            Self::Api
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::Network => "network",
            Self::PermissionOrNotFound => "permission or not found",
            Self::Api => "api",
            Self::Protocol => "protocol",
        };
        f.write_str(label)
    }
}

/// A failed remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error{}: {message}", code_suffix(.code))]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub code: Option<i64>,
    pub message: String,
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(" {}", c)).unwrap_or_default()
}

impl RemoteError {
    /// An error reported by the service itself
    pub fn api(code: i64, message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::from_api_code(code),
            code: Some(code),
            message: message.into(),
        }
    }

    /// A transport-level failure
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Network,
            code: None,
            message: message.into(),
        }
    }

    /// An HTTP 429 that survived the HTTP-level retries
    pub fn throttled(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::RateLimited,
            code: None,
            message: message.into(),
        }
    }

    /// A reply that could not be decoded
    pub fn protocol(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteErrorKind::Protocol,
            code: None,
            message: message.into(),
        }
    }

    pub fn is_permission(&self) -> bool {
        self.kind == RemoteErrorKind::PermissionOrNotFound
    }
}

/// Named parameters of a remote call
///
/// Values are kept in their wire (string) form and ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter, replacing any previous value under the same key
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
