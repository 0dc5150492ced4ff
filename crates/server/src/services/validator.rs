//! Precondition validator: a table-driven gate engine keyed by command name.
//! Every gate returns a `ValidatorError` carrying its own status code
//! instead of a bare bool, so handlers can surface 400/409/503 without
//! re-deriving the mapping.

use std::fs;
use std::path::Path;

use dbcalm_storage::{BackupRepository, ProcessRepository};

use super::error::{ValidatorError, ValidatorResult};

/// Files/extensions tolerated in an otherwise-empty MySQL/MariaDB data
/// directory — buffer pool dump, redo logs, the running server's own
/// socket/pid/error-log/config, or a stray lock flag.
const ALLOWED_DATA_DIR_ENTRIES: &[&str] = &["ib_buffer_pool", "ibdata1", "ib_logfile0", "ib_logfile1"];
const ALLOWED_DATA_DIR_EXTENSIONS: &[&str] = &["sock", "pid", "err", "cnf", "flag"];

pub struct PreconditionValidator {
    backups: BackupRepository,
    processes: ProcessRepository,
    credentials_file: String,
    data_dir: String,
}

impl PreconditionValidator {
    #[must_use]
    pub const fn new(
        backups: BackupRepository,
        processes: ProcessRepository,
        credentials_file: String,
        data_dir: String,
    ) -> Self {
        Self { backups, processes, credentials_file, data_dir }
    }

    /// `mysqladmin ping`/equivalent gate: the server must answer before a
    /// backup can start. Callers supply the already-observed liveness since
    /// the actual ping is a `ProcessRunner` invocation, not this module's
    /// concern.
    pub fn require_server_alive(&self, server_is_alive: bool) -> ValidatorResult<()> {
        if server_is_alive {
            Ok(())
        } else {
            Err(ValidatorError::ServerNotAlive)
        }
    }

    /// The inverse gate, used before a database-target restore copy-back.
    pub fn require_server_dead(&self, server_is_alive: bool) -> ValidatorResult<()> {
        if server_is_alive {
            Err(ValidatorError::ServerNotDead)
        } else {
            Ok(())
        }
    }

    /// A directory is empty enough to restore into if every entry is one of
    /// the allowlisted MySQL/MariaDB housekeeping files. An unreadable
    /// directory fails safe as "not empty" rather than silently proceeding.
    pub fn require_data_dir_empty(&self) -> ValidatorResult<()> {
        let entries = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return Err(ValidatorError::DataDirUnreadable),
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => return Err(ValidatorError::DataDirUnreadable),
            };
            if !is_allowed_data_dir_entry(&entry.path()) {
                return Err(ValidatorError::DataDirNotEmpty);
            }
        }
        Ok(())
    }

    /// Credentials file must contain the `[client-<project>]` defaults group
    /// the backup binary is told to read via `--defaults-group-suffix`.
    pub fn require_valid_credentials_file(&self, project: &str) -> ValidatorResult<()> {
        let contents = fs::read_to_string(&self.credentials_file)
            .map_err(|e| ValidatorError::InvalidCredentialsFile(e.to_string()))?;
        let header = format!("[client-{project}]");
        if contents.lines().any(|line| line.trim() == header) {
            Ok(())
        } else {
            Err(ValidatorError::InvalidCredentialsFile(format!("missing {header} group header")))
        }
    }

    /// An id supplied by the caller (rather than generated) must not already
    /// name an existing backup or an in-flight command.
    pub async fn require_unique_id(&self, id: &str) -> ValidatorResult<()> {
        if self.backups.exists(id).await.unwrap_or(false) {
            return Err(ValidatorError::DuplicateId(id.to_string()));
        }
        if self.processes.command_id_exists(id).await.unwrap_or(false) {
            return Err(ValidatorError::DuplicateId(id.to_string()));
        }
        Ok(())
    }

    /// Schedule field-range validation: hour 0-23, minute 0-59, day_of_week
    /// 0-6, day_of_month 1-28 (never 29-31, so every month can run it),
    /// interval_value >= 1.
    pub fn validate_schedule_fields(
        &self,
        hour: Option<u8>,
        minute: Option<u8>,
        day_of_week: Option<u8>,
        day_of_month: Option<u8>,
        interval_value: Option<u32>,
    ) -> ValidatorResult<()> {
        if let Some(h) = hour {
            if h > 23 {
                return Err(ValidatorError::InvalidScheduleField(format!("hour {h} out of range 0-23")));
            }
        }
        if let Some(m) = minute {
            if m > 59 {
                return Err(ValidatorError::InvalidScheduleField(format!("minute {m} out of range 0-59")));
            }
        }
        if let Some(dow) = day_of_week {
            if dow > 6 {
                return Err(ValidatorError::InvalidScheduleField(format!("day_of_week {dow} out of range 0-6")));
            }
        }
        if let Some(dom) = day_of_month {
            if !(1..=28).contains(&dom) {
                return Err(ValidatorError::InvalidScheduleField(format!("day_of_month {dom} out of range 1-28")));
            }
        }
        if let Some(iv) = interval_value {
            if iv < 1 {
                return Err(ValidatorError::InvalidScheduleField("interval_value must be at least 1".to_string()));
            }
        }
        Ok(())
    }
}

fn is_allowed_data_dir_entry(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        if ALLOWED_DATA_DIR_ENTRIES.contains(&name) {
            return true;
        }
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ALLOWED_DATA_DIR_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn make_validator(data_dir: String) -> PreconditionValidator {
        let pool = dbcalm_storage::init_pool_with_config("sqlite::memory:", 1, std::time::Duration::from_secs(5))
            .await
            .unwrap();
        PreconditionValidator::new(
            BackupRepository::new(pool.clone()),
            ProcessRepository::new(pool),
            "/nonexistent/client.cnf".to_string(),
            data_dir,
        )
    }

    #[tokio::test]
    async fn server_alive_gate_rejects_when_dead() {
        let validator = make_validator("/tmp".to_string()).await;
        assert!(matches!(validator.require_server_alive(false), Err(ValidatorError::ServerNotAlive)));
        assert!(validator.require_server_alive(true).is_ok());
    }

    #[tokio::test]
    async fn server_dead_gate_rejects_when_alive() {
        let validator = make_validator("/tmp".to_string()).await;
        assert!(matches!(validator.require_server_dead(true), Err(ValidatorError::ServerNotDead)));
    }

    #[tokio::test]
    async fn data_dir_with_only_allowlisted_entries_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ibdata1"), b"").unwrap();
        std::fs::write(dir.path().join("mysqld.sock"), b"").unwrap();
        let validator = make_validator(dir.path().to_string_lossy().to_string()).await;
        assert!(validator.require_data_dir_empty().is_ok());
    }

    #[tokio::test]
    async fn data_dir_with_a_real_database_file_is_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("mysql")).unwrap();
        let validator = make_validator(dir.path().to_string_lossy().to_string()).await;
        assert!(matches!(validator.require_data_dir_empty(), Err(ValidatorError::DataDirNotEmpty)));
    }

    #[tokio::test]
    async fn unreadable_data_dir_fails_safe() {
        let validator = make_validator("/root/definitely-does-not-exist-dbcalm".to_string()).await;
        assert!(matches!(validator.require_data_dir_empty(), Err(ValidatorError::DataDirUnreadable)));
    }

    #[tokio::test]
    async fn schedule_field_ranges_are_enforced() {
        let validator = make_validator("/tmp".to_string()).await;
        assert!(validator.validate_schedule_fields(Some(23), Some(59), Some(6), Some(28), Some(1)).is_ok());
        assert!(validator.validate_schedule_fields(Some(24), None, None, None, None).is_err());
        assert!(validator.validate_schedule_fields(None, Some(60), None, None, None).is_err());
        assert!(validator.validate_schedule_fields(None, None, Some(7), None, None).is_err());
        assert!(validator.validate_schedule_fields(None, None, None, Some(29), None).is_err());
        assert!(validator.validate_schedule_fields(None, None, None, None, Some(0)).is_err());
    }
}
