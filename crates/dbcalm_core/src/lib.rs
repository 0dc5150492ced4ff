//! Pure control-plane logic for the backup/restore daemon: command
//! construction, chain resolution, retention, engine-version detection, and
//! the cron-file scheduler bridge. No I/O beyond what callers inject as
//! closures (version detection) or pass in as already-loaded data
//! (retention, chain walk).

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery, clippy::unwrap_used)]

pub mod chain;
pub mod command_builder;
pub mod cron;
pub mod engine;
pub mod retention;
pub mod settings;

pub use chain::required_backups;
pub use command_builder::{build_full_backup_cmd, build_incremental_backup_cmd, build_restore_cmds, CommandSpec};
pub use cron::{cron_expression, cron_line, render_cron_file};
pub use engine::{parse_version, requires_apply_log_only, VersionCache};
pub use retention::{expired_backups, group_into_chains, Chain};
pub use settings::{BackupSettings, Compression, Engine};
