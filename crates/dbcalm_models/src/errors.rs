//! Domain-level error types

use thiserror::Error;

/// Domain-level errors for backup/restore control-plane operations
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid entity state for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A chain walk could not find a referenced backup
    #[error("Chain broken: {0}")]
    ChainBroken(String),

    /// Validation error (e.g., schedule fields inconsistent with frequency)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Missing required data
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Database engine version could not be determined or is unsupported
    #[error("Unsupported engine: {0}")]
    UnsupportedEngine(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
