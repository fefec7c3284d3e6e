use super::{types::Config, ConfigError};

/// Validate configuration before anything is constructed from it.
///
/// Rejects missing credentials, non-HTTP base URLs and zero-valued
/// durations or ports.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.client.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "client.api_key is required".to_string(),
        ));
    }

    let base_url = &config.client.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "client.base_url must be an http(s) URL, got '{}'",
            base_url
        )));
    }

    if config.client.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "client.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.lock.default_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "lock.default_ttl_secs cannot be 0".to_string(),
        ));
    }

    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
