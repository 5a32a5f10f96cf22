//! VK Relink: bulk link replacement across VK community walls
//!
//! This crate walks the posts, comments and comment threads of a list of
//! VK communities and rewrites every occurrence of one link into another,
//! keeping attachments intact. All remote calls go through a single gateway
//! that enforces a sliding-window request budget and retries rate-limit and
//! network failures with exponential backoff.

pub mod api;
pub mod community;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for VK Relink operations
#[derive(Debug, Error)]
pub enum RelinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Remote call failed: {0}")]
    Remote(#[from] api::RemoteError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("A run is already in progress")]
    RunActive,

    #[error("Invalid run phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("Run worker terminated unexpectedly: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing VK access token (pass --token or set VK_TOKEN)")]
    MissingToken,
}

/// Result type alias for VK Relink operations
pub type Result<T> = std::result::Result<T, RelinkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::{Gateway, RemoteError, RemoteErrorKind};
pub use community::{CommunityRef, OwnerId};
pub use config::{Config, RunParams};
pub use crawler::{Orchestrator, RunHandle, Runner};
pub use output::{RunEvent, RunSummary};
pub use state::RunPhase;
