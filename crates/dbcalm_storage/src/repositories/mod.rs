//! One repository per entity, each offering the create/get/update/list/delete
//! operations that entity actually needs.

pub mod auth_code;
pub mod backup;
pub mod client;
pub mod process;
pub mod restore;
pub mod schedule;
pub mod user;

pub use auth_code::AuthCodeRepository;
pub use backup::BackupRepository;
pub use client::ClientRepository;
pub use process::ProcessRepository;
pub use restore::RestoreRepository;
pub use schedule::ScheduleRepository;
pub use user::UserRepository;
