//! Configuration module for VK Relink
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and assembling the parameters of a single run.
//!
//! # Example
//!
//! ```no_run
//! use vk_relink::config::{load_config, load_token, RunParams};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("relink.toml")).unwrap();
//! let token = load_token(None).unwrap();
//! let params = RunParams::from_config(&config.run, token);
//! println!("{} communities queued", params.communities.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, LimitsConfig, RetryConfig, RunConfig, RunParams};

// Re-export parser functions
pub use parser::{load_config, load_token, parse_config, TOKEN_ENV_VAR};
pub use validation::validate_params;
