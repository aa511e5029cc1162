//! Configuration module for memscan
//!
//! Provides configuration loading, validation, and default settings for
//! the session controller and its background workers.

mod defaults;
mod loader;
mod validator;

pub use defaults::*;
pub use loader::{load_config, Config, ConfigError, ConfigLoader, EngineConfig, LoggingConfig, WorkerConfig};
pub use validator::{validate_config, ConfigValidator};

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;
