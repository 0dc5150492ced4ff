//! Error types for the process runner and precondition validator. Kept
//! separate from `dbcalm_storage::StorageError`/`dbcalm_models::DomainError`
//! since these describe failures in *this* crate's orchestration layer, not
//! the lower-level crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("failed to persist process record: {0}")]
    Storage(#[from] dbcalm_storage::StorageError),

    #[error("could not allocate a unique command id after {0} attempts")]
    CommandIdExhausted(u32),

    #[error("command chain was empty")]
    EmptyChain,
}

pub type RunnerResult<T> = Result<T, RunnerError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidatorError {
    #[error("server is not running")]
    ServerNotAlive,

    #[error("cannot restore: server is not stopped")]
    ServerNotDead,

    #[error("data directory is not empty")]
    DataDirNotEmpty,

    #[error("data directory could not be read")]
    DataDirUnreadable,

    #[error("credentials file is missing or malformed: {0}")]
    InvalidCredentialsFile(String),

    #[error("id {0} is already in use")]
    DuplicateId(String),

    #[error("schedule field out of range: {0}")]
    InvalidScheduleField(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

impl ValidatorError {
    /// HTTP-ish status code this failure maps to, per the gate-check table:
    /// bad input is 400, a duplicate id is 409, everything else gated on
    /// live server/filesystem/credentials state is 503.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::UnknownCommand(_) | Self::InvalidScheduleField(_) => 400,
            Self::DuplicateId(_) => 409,
            Self::ServerNotAlive
            | Self::ServerNotDead
            | Self::DataDirNotEmpty
            | Self::DataDirUnreadable
            | Self::InvalidCredentialsFile(_) => 503,
        }
    }
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;
