//! The `Process` entity: one external-binary execution recorded for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of a single spawned process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Running,
    Success,
    Failed,
}

impl ProcessStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of job a `Process` (or chain of processes) is carrying out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessType {
    Backup,
    Restore,
    CleanupBackups,
    UpdateCronSchedules,
    MysqlPingCheck,
    DeleteDirectory,
}

impl ProcessType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::CleanupBackups => "cleanup_backups",
            Self::UpdateCronSchedules => "update_cron_schedules",
            Self::MysqlPingCheck => "mysql_ping_check",
            Self::DeleteDirectory => "delete_directory",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "backup" => Some(Self::Backup),
            "restore" => Some(Self::Restore),
            "cleanup_backups" => Some(Self::CleanupBackups),
            "update_cron_schedules" => Some(Self::UpdateCronSchedules),
            "mysql_ping_check" => Some(Self::MysqlPingCheck),
            "delete_directory" => Some(Self::DeleteDirectory),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProcessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Business arguments carried alongside a process (backup id, schedule id, ...).
///
/// Kept as a loosely-typed JSON map because the set of keys depends on
/// `ProcessType`; the queue handler and status projection pick out the
/// keys they care about by name.
pub type ProcessArgs = HashMap<String, serde_json::Value>;

/// A single external-binary execution, as recorded in the audit store.
///
/// `Process` rows are created by the runner at spawn time and updated exactly
/// once, when the child terminates. They are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Process {
    pub id: Option<i64>,
    pub command: String,
    pub command_id: String,
    pub pid: i32,
    pub status: ProcessStatus,
    pub output: Option<String>,
    pub error: Option<String>,
    pub return_code: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub process_type: ProcessType,
    pub args: ProcessArgs,
}

impl Process {
    /// A fresh, just-spawned process row.
    #[must_use]
    pub fn new_running(
        command: String,
        command_id: String,
        pid: i32,
        process_type: ProcessType,
        args: ProcessArgs,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            command,
            command_id,
            pid,
            status: ProcessStatus::Running,
            output: None,
            error: None,
            return_code: None,
            start_time,
            end_time: None,
            process_type,
            args,
        }
    }

    /// Stamp this process as terminal, merging stdout into `output` on
    /// success or keeping stdout/stderr split on failure.
    pub fn complete(&mut self, end_time: DateTime<Utc>, stdout: String, stderr: String, return_code: i32) {
        self.end_time = Some(end_time);
        self.return_code = Some(return_code);
        if return_code == 0 {
            self.status = ProcessStatus::Success;
            self.output = Some(stdout);
            self.error = if stderr.is_empty() { None } else { Some(stderr) };
        } else {
            self.status = ProcessStatus::Failed;
            self.output = Some(stdout);
            self.error = Some(stderr);
        }
    }

    #[must_use]
    pub fn arg_str(&self, key: &str) -> Option<String> {
        self.args.get(key).and_then(|v| v.as_str()).map(ToString::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_success_merges_stdout() {
        let mut p = Process::new_running(
            "/usr/bin/mariabackup --backup".into(),
            "cmd-1".into(),
            123,
            ProcessType::Backup,
            ProcessArgs::new(),
            Utc::now(),
        );
        p.complete(Utc::now(), "done".into(), String::new(), 0);
        assert_eq!(p.status, ProcessStatus::Success);
        assert_eq!(p.output.as_deref(), Some("done"));
        assert!(p.error.is_none());
    }

    #[test]
    fn complete_failure_keeps_stdout_and_stderr_split() {
        let mut p = Process::new_running(
            "/usr/bin/mariabackup --backup".into(),
            "cmd-1".into(),
            123,
            ProcessType::Backup,
            ProcessArgs::new(),
            Utc::now(),
        );
        p.complete(Utc::now(), "partial".into(), "disk full".into(), 1);
        assert_eq!(p.status, ProcessStatus::Failed);
        assert_eq!(p.output.as_deref(), Some("partial"));
        assert_eq!(p.error.as_deref(), Some("disk full"));
    }

    #[test]
    fn process_type_round_trips_through_str() {
        for t in [
            ProcessType::Backup,
            ProcessType::Restore,
            ProcessType::CleanupBackups,
            ProcessType::UpdateCronSchedules,
            ProcessType::MysqlPingCheck,
            ProcessType::DeleteDirectory,
        ] {
            assert_eq!(ProcessType::from_str(t.as_str()), Some(t));
        }
    }
}
