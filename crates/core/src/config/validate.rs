use super::{types::Config, AuthMethod, ConfigError};

/// Smallest and largest accepted discovery lookback, in days.
pub const MIN_DAYS_BACK: u32 = 1;
pub const MAX_DAYS_BACK: u32 = 60;
/// Thirty days.
pub const MAX_DISCOVERY_INTERVAL_HOURS: u64 = 720;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.library.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.url cannot be empty".to_string(),
        ));
    }
    if config.library.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "library.api_key cannot be empty".to_string(),
        ));
    }
    if config.catalog.api_key.is_empty() {
        return Err(ConfigError::ValidationError(
            "catalog.api_key cannot be empty".to_string(),
        ));
    }

    let monitor = &config.monitor;
    if !(MIN_DAYS_BACK..=MAX_DAYS_BACK).contains(&monitor.days_back) {
        return Err(ConfigError::ValidationError(format!(
            "monitor.days_back must be between {} and {}",
            MIN_DAYS_BACK, MAX_DAYS_BACK
        )));
    }
    if monitor.queue_poll_interval_secs == 0
        || monitor.discovery_interval_hours == 0
        || monitor.health_check_interval_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "monitor intervals must be greater than 0".to_string(),
        ));
    }
    if monitor.discovery_interval_hours > MAX_DISCOVERY_INTERVAL_HOURS {
        return Err(ConfigError::ValidationError(format!(
            "monitor.discovery_interval_hours cannot exceed {}",
            MAX_DISCOVERY_INTERVAL_HOURS
        )));
    }

    Ok(())
}
