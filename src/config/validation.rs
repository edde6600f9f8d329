use crate::config::types::{Config, FetcherConfig, LookupConfig, PipelineConfig, SearchConfig};
use crate::search::SearchDate;
use crate::ConfigError;
use url::Url;

/// Largest batch the look-up endpoint accepts in one call
pub const MAX_BATCH_SIZE: usize = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_lookup_config(&config.lookup)?;
    validate_pipeline_config(&config.pipeline)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates listing fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    validate_http_url("search-url", &config.search_url)?;
    validate_http_url("timeline-url", &config.timeline_url)?;

    if config.user_agents.is_empty() {
        return Err(ConfigError::Validation(
            "user-agents must list at least one identity".to_string(),
        ));
    }

    if config.user_agents.iter().any(|agent| agent.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user-agents cannot contain empty entries".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetcher timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates look-up configuration
fn validate_lookup_config(config: &LookupConfig) -> Result<(), ConfigError> {
    validate_http_url("endpoint", &config.endpoint)?;

    if config.batch_size < 1 || config.batch_size > MAX_BATCH_SIZE {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.batch_size
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "lookup timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.profile.trim().is_empty() {
        return Err(ConfigError::Validation(
            "profile cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), ConfigError> {
    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "queue-capacity must be >= 1, got {}",
            config.queue_capacity
        )));
    }
    Ok(())
}

/// Validates that stored date bounds parse
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    for (field, value) in [("since", &config.since), ("until", &config.until)] {
        if let Some(raw) = value {
            SearchDate::parse(raw)
                .map_err(|e| ConfigError::Validation(format!("search {}: {}", field, e)))?;
        }
    }
    Ok(())
}

/// Validates that a URL parses and uses http(s)
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}
