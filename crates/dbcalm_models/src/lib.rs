//! dbcalm Core Models
//!
//! Shared entity types for the backup/restore control plane: `Process`,
//! `Backup`, `Restore`, `Schedule`, `Client`, `User`, `AuthCode`.
//!
//! This crate has no integration dependencies beyond `sqlx`'s type traits
//! (used on the entities whose columns map one-to-one onto scalar types) and
//! serves as the foundation other crates build on.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod auth_code;
pub mod backup;
pub mod client;
pub mod errors;
pub mod process;
pub mod restore;
pub mod schedule;
pub mod user;

pub use auth_code::AuthCode;
pub use backup::{timestamp_backup_id, Backup};
pub use client::Client;
pub use errors::{DomainError, DomainResult};
pub use process::{Process, ProcessArgs, ProcessStatus, ProcessType};
pub use restore::{Restore, RestoreTarget};
pub use schedule::{BackupType, Frequency, IntervalUnit, RetentionUnit, Schedule};
pub use user::User;
