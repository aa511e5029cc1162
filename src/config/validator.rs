//! Configuration validation for memscan

use super::loader::{Config, ConfigError};

/// Validates configuration invariants before they reach the session
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.engine.socket_path.is_empty() {
            return Err(ConfigError::Invalid(
                "engine.socket_path must not be empty".to_string(),
            ));
        }
        if config.engine.page_size == 0 {
            return Err(ConfigError::Invalid(
                "engine.page_size must be greater than zero".to_string(),
            ));
        }
        if config.engine.max_frame_len < 1024 {
            return Err(ConfigError::Invalid(
                "engine.max_frame_len must be at least 1024".to_string(),
            ));
        }
        if config.worker.watch_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "worker.watch_interval_ms must be greater than zero".to_string(),
            ));
        }
        if config.worker.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "worker.progress_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Convenience wrapper matching the loader's free-function style
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
