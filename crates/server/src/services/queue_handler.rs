//! Drains a process-runner completion channel to its terminal state and
//! materializes the business row (`Backup`/`Restore`) the process was
//! carrying out, or reconciles `cleanup_backups` against the filesystem.
//!
//! One worker per accepted command: `spawn_watcher` takes ownership of the
//! receiver and runs until it yields (or the sender drops, meaning the
//! chain aborted before producing a terminal process).

use std::path::PathBuf;

use dbcalm_models::{Backup, Process, ProcessStatus, ProcessType, Restore, RestoreTarget};
use dbcalm_storage::{BackupRepository, RestoreRepository};

pub struct QueueHandler {
    backups: BackupRepository,
    restores: RestoreRepository,
    backup_dir: PathBuf,
}

impl QueueHandler {
    #[must_use]
    pub fn new(backups: BackupRepository, restores: RestoreRepository, backup_dir: impl Into<PathBuf>) -> Self {
        Self { backups, restores, backup_dir: backup_dir.into() }
    }

    /// Spawns a background task that awaits the terminal process on `rx`
    /// and dispatches it. Fire-and-forget: the API already answered 202
    /// before this runs.
    pub fn spawn_watcher(self: std::sync::Arc<Self>, mut rx: tokio::sync::mpsc::Receiver<Process>) {
        tokio::spawn(async move {
            let Some(process) = rx.recv().await else {
                tracing::warn!("queue handler watcher received no terminal process; chain aborted early");
                return;
            };
            self.dispatch(process).await;
        });
    }

    async fn dispatch(&self, process: Process) {
        let result = match process.process_type {
            ProcessType::Backup => self.handle_backup(&process).await,
            ProcessType::Restore => self.handle_restore(&process).await,
            ProcessType::CleanupBackups => self.handle_cleanup(&process).await,
            ProcessType::UpdateCronSchedules | ProcessType::MysqlPingCheck | ProcessType::DeleteDirectory => Ok(()),
        };
        if let Err(err) = result {
            tracing::error!(command_id = %process.command_id, error = %err, "queue handler dispatch failed");
        }
    }

    async fn handle_backup(&self, process: &Process) -> Result<(), dbcalm_storage::StorageError> {
        let Some(id) = process.arg_str("id") else {
            tracing::error!(command_id = %process.command_id, "backup process missing id argument");
            return Ok(());
        };

        if process.status != ProcessStatus::Success {
            self.compensate_failed_backup(&id).await;
            return Ok(());
        }

        let from_backup_id = process.arg_str("from_backup_id");
        let schedule_id = process.args.get("schedule_id").and_then(serde_json::Value::as_i64);

        let backup = Backup {
            id,
            from_backup_id,
            schedule_id,
            start_time: process.start_time,
            end_time: process.end_time.unwrap_or(process.start_time),
            process_id: process.id.unwrap_or_default(),
        };
        self.backups.create(&backup).await
    }

    /// Best-effort cleanup of a partial backup directory left behind by a
    /// failed run — the directory is junk either way, so a removal error
    /// here is logged, not propagated.
    async fn compensate_failed_backup(&self, id: &str) {
        let target = self.backup_dir.join(id);
        if tokio::fs::metadata(&target).await.is_ok() {
            if let Err(err) = tokio::fs::remove_dir_all(&target).await {
                tracing::warn!(path = %target.display(), error = %err, "failed to clean up partial backup directory");
            }
        }
    }

    async fn handle_restore(&self, process: &Process) -> Result<(), dbcalm_storage::StorageError> {
        let target = process
            .arg_str("target")
            .and_then(|t| RestoreTarget::from_str(&t))
            .unwrap_or(RestoreTarget::Database);
        let backup_id = process.arg_str("backup_id").unwrap_or_default();
        let target_path = process.arg_str("target_path").unwrap_or_default();
        let scratch_dir = process.arg_str("scratch_dir");

        if target == RestoreTarget::Database {
            if let Some(scratch) = scratch_dir {
                let scratch = PathBuf::from(scratch);
                tokio::spawn(async move {
                    if let Err(err) = tokio::fs::remove_dir_all(&scratch).await {
                        tracing::warn!(path = %scratch.display(), error = %err, "failed to remove restore scratch directory");
                    }
                });
            }
        }

        if process.status != ProcessStatus::Success {
            return Ok(());
        }

        let backup = self.backups.get(&backup_id).await?;
        let Some(backup) = backup else {
            tracing::warn!(backup_id, "restore completed but its source backup row is gone");
            return Ok(());
        };

        let restore = Restore {
            id: process.command_id.clone(),
            start_time: process.start_time,
            end_time: process.end_time.unwrap_or(process.start_time),
            target: target.as_str().to_string(),
            target_path,
            backup_id: backup.id,
            backup_timestamp: backup.start_time,
            process_id: process.id.unwrap_or_default(),
        };
        self.restores.create(&restore).await
    }

    /// Filesystem is the source of truth: a `Backup` row survives reconciliation
    /// exactly when its folder is still on disk, regardless of what the
    /// system service reported for the id overall.
    async fn handle_cleanup(&self, process: &Process) -> Result<(), dbcalm_storage::StorageError> {
        let Some(ids) = process.args.get("backup_ids").and_then(|v| v.as_array()) else {
            return Ok(());
        };
        let ids: Vec<String> = ids.iter().filter_map(|v| v.as_str().map(ToString::to_string)).collect();
        let total = ids.len();
        let mut deleted = 0;

        for id in ids {
            let folder = self.backup_dir.join(&id);
            if tokio::fs::metadata(&folder).await.is_err() {
                self.backups.delete(&id).await?;
                deleted += 1;
            }
        }

        tracing::info!(deleted, total, "cleanup reconciliation: deleted {deleted} backup records out of {total}");
        Ok(())
    }
}
