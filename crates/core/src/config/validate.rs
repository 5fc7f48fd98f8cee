use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Batch size bound, admission ceiling, worker count and fetch timeout are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.server.max_urls_per_batch == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_urls_per_batch must be greater than 0".to_string(),
        ));
    }

    if config.admission.max_concurrent_batches == 0 {
        return Err(ConfigError::ValidationError(
            "admission.max_concurrent_batches must be greater than 0".to_string(),
        ));
    }

    if config.downloader.workers == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.workers must be greater than 0".to_string(),
        ));
    }

    if config.downloader.fetch_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.fetch_timeout_ms must be greater than 0".to_string(),
        ));
    }

    Ok(())
}
