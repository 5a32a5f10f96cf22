use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for VK Relink
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub run: RunConfig,
}

/// Remote API endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the API host; methods live under `{base_url}/method/{name}`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// API version sent with every call as `v`
    pub version: String,

    /// Overall request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// HTTP-level retries for 429/5xx and transport errors before the
    /// failure is reported to the gateway
    #[serde(rename = "local-retries")]
    pub local_retries: u32,

    /// Base delay between HTTP-level retries (milliseconds), doubled per attempt
    #[serde(rename = "local-retry-backoff-ms")]
    pub local_retry_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vk.com".to_string(),
            version: "5.199".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 10,
            local_retries: 3,
            local_retry_backoff_ms: 500,
        }
    }
}

/// Request budget and crawl pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum calls admitted in any trailing window
    #[serde(rename = "max-calls")]
    pub max_calls: usize,

    /// Length of the trailing window (seconds)
    #[serde(rename = "window-secs")]
    pub window_secs: u64,

    /// Courtesy delay after every post, comment and page fetch (milliseconds)
    #[serde(rename = "pacing-ms")]
    pub pacing_ms: u64,

    /// Pause between two communities (milliseconds)
    #[serde(rename = "community-pause-ms")]
    pub community_pause_ms: u64,

    /// Items requested per page of posts or comments
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Thread replies returned inline with each top-level comment
    #[serde(rename = "thread-items")]
    pub thread_items: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_calls: 180,
            window_secs: 60,
            pacing_ms: 340,
            community_pause_ms: 1000,
            page_size: 100,
            thread_items: 10,
        }
    }
}

impl LimitsConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn community_pause(&self) -> Duration {
        Duration::from_millis(self.community_pause_ms)
    }
}

/// Backoff parameters for the two retried failure classes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    #[serde(rename = "rate-limit-base-ms")]
    pub rate_limit_base_ms: u64,

    #[serde(rename = "rate-limit-ceiling-ms")]
    pub rate_limit_ceiling_ms: u64,

    #[serde(rename = "network-base-ms")]
    pub network_base_ms: u64,

    #[serde(rename = "network-ceiling-ms")]
    pub network_ceiling_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_base_ms: 340,
            rate_limit_ceiling_ms: 10_000,
            network_base_ms: 1_000,
            network_ceiling_ms: 20_000,
        }
    }
}

/// What to replace and where
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Link to search for (literal substring)
    #[serde(rename = "old-link")]
    pub old_link: String,

    /// Replacement link
    #[serde(rename = "new-link")]
    pub new_link: String,

    /// Community identifiers: URLs, short names or `club123`-style ids
    pub communities: Vec<String>,
}

/// Parameters of one run as supplied by the shell
///
/// The token never comes from the config file, only from the command line
/// or the environment.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub token: String,
    pub old_link: String,
    pub new_link: String,
    pub communities: Vec<String>,
}

impl RunParams {
    /// Builds run parameters, trimming inputs and dropping blank community lines
    pub fn new(
        token: impl Into<String>,
        old_link: impl Into<String>,
        new_link: impl Into<String>,
        communities: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            token: token.into().trim().to_string(),
            old_link: old_link.into().trim().to_string(),
            new_link: new_link.into().trim().to_string(),
            communities: communities
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    /// Combines the `[run]` section with a token obtained elsewhere
    pub fn from_config(run: &RunConfig, token: impl Into<String>) -> Self {
        Self::new(
            token,
            run.old_link.clone(),
            run.new_link.clone(),
            run.communities.iter().cloned(),
        )
    }
}
