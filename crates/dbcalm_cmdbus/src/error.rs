//! Command-bus error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CmdBusError {
    #[error("socket io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request/response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no reply received before timeout")]
    Timeout,

    #[error("failed to remove stale socket file after retries: {0}")]
    StaleSocket(String),
}

pub type CmdBusResult<T> = Result<T, CmdBusError>;
