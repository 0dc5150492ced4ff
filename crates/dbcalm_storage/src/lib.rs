//! SQLite-backed persistence for the backup/restore control plane.
//!
//! One `sqlx::SqlitePool` (WAL mode), one repository struct per entity,
//! migrations as embedded `CREATE TABLE IF NOT EXISTS` statements run at
//! pool-init.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod connection;
pub mod error;
pub mod migrations;
pub mod repositories;

pub use connection::{init_pool, init_pool_with_config, DatabasePool};
pub use error::{StorageError, StorageResult};
pub use repositories::{
    AuthCodeRepository, BackupRepository, ClientRepository, ProcessRepository, RestoreRepository,
    ScheduleRepository, UserRepository,
};
