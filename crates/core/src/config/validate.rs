use super::{types::Config, ConfigError};

fn check_url(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{} must be an http(s) URL, got '{}'",
            field, url
        )))
    }
}

/// Validate configuration
/// Currently validates:
/// - Generation API key is set and base URLs are http(s)
/// - Timeouts, attempt bound and ingest concurrency are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.generation.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "generation.api_key cannot be empty".to_string(),
        ));
    }
    check_url("generation.base_url", &config.generation.base_url)?;
    check_url("storage.api_url", &config.storage.api_url)?;
    check_url("storage.gateway_url", &config.storage.gateway_url)?;

    if config.generation.timeout_secs == 0 || config.storage.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.poller.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "poller.max_attempts cannot be 0".to_string(),
        ));
    }

    if config.ingest.max_concurrent_ingests == 0 {
        return Err(ConfigError::ValidationError(
            "ingest.max_concurrent_ingests cannot be 0".to_string(),
        ));
    }

    Ok(())
}
