use crate::config::types::{ApiConfig, Config, LimitsConfig, RetryConfig, RunConfig, RunParams};
use crate::ConfigError;
use url::Url;

/// Highest page size the wall methods accept
const MAX_PAGE_SIZE: u32 = 100;

/// Highest number of inline thread replies the comments method accepts
const MAX_THREAD_ITEMS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_limits_config(&config.limits)?;
    validate_retry_config(&config.retry)?;
    validate_run_config(&config.run)?;
    Ok(())
}

/// Validates the parameters of a single run, including the credential
pub fn validate_params(params: &RunParams) -> Result<(), ConfigError> {
    if params.token.is_empty() {
        return Err(ConfigError::MissingToken);
    }
    validate_links(&params.old_link, &params.new_link)?;
    if params.communities.is_empty() {
        return Err(ConfigError::Validation(
            "at least one community must be given".to_string(),
        ));
    }
    Ok(())
}

/// Validates API endpoint configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "version cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates request budget and pagination limits
fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_calls < 1 {
        return Err(ConfigError::Validation(format!(
            "max-calls must be >= 1, got {}",
            config.max_calls
        )));
    }

    if config.window_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "window-secs must be >= 1, got {}",
            config.window_secs
        )));
    }

    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.thread_items > MAX_THREAD_ITEMS {
        return Err(ConfigError::Validation(format!(
            "thread-items must be at most {}, got {}",
            MAX_THREAD_ITEMS, config.thread_items
        )));
    }

    Ok(())
}

/// Validates backoff bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    check_backoff_pair(
        "rate-limit",
        config.rate_limit_base_ms,
        config.rate_limit_ceiling_ms,
    )?;
    check_backoff_pair("network", config.network_base_ms, config.network_ceiling_ms)
}

fn check_backoff_pair(class: &str, base: u64, ceiling: u64) -> Result<(), ConfigError> {
    if base == 0 {
        return Err(ConfigError::Validation(format!(
            "{}-base-ms must be >= 1",
            class
        )));
    }
    if ceiling < base {
        return Err(ConfigError::Validation(format!(
            "{}-ceiling-ms ({}) must not be below {}-base-ms ({})",
            class, ceiling, class, base
        )));
    }
    Ok(())
}

/// Validates the `[run]` section
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    validate_links(config.old_link.trim(), config.new_link.trim())?;

    if config.communities.iter().all(|c| c.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "communities must contain at least one entry".to_string(),
        ));
    }

    Ok(())
}

/// An empty search string would match between every character
fn validate_links(old_link: &str, new_link: &str) -> Result<(), ConfigError> {
    if old_link.is_empty() {
        return Err(ConfigError::Validation(
            "old-link cannot be empty".to_string(),
        ));
    }
    if new_link.is_empty() {
        return Err(ConfigError::Validation(
            "new-link cannot be empty".to_string(),
        ));
    }
    Ok(())
}
