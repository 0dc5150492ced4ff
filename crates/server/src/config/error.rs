//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("failed to read config file: {0}")]
    ReadError(String),

    #[error("failed to parse config file: {0}")]
    ParseError(String),

    #[error("config validation failed: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub fn io_error_to_config_error(err: std::io::Error) -> ConfigError {
    ConfigError::ReadError(err.to_string())
}
