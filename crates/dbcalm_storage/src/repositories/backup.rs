//! Repository for the `Backup` entity. `Backup` derives `sqlx::FromRow`
//! directly since every column is scalar.

use dbcalm_models::Backup;
use sqlx::sqlite::SqlitePool;

use crate::error::{StorageError, StorageResult};

#[derive(Clone)]
pub struct BackupRepository {
    pool: SqlitePool,
}

impl BackupRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, backup: &Backup) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO backups (id, from_backup_id, schedule_id, start_time, end_time, process_id)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&backup.id)
        .bind(&backup.from_backup_id)
        .bind(backup.schedule_id)
        .bind(backup.start_time)
        .bind(backup.end_time)
        .bind(backup.process_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<Backup>> {
        let backup = sqlx::query_as::<_, Backup>(
            "SELECT id, from_backup_id, schedule_id, start_time, end_time, process_id
             FROM backups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(backup)
    }

    pub async fn exists(&self, id: &str) -> StorageResult<bool> {
        Ok(self.get(id).await?.is_some())
    }

    pub async fn list(&self) -> StorageResult<Vec<Backup>> {
        let backups = sqlx::query_as::<_, Backup>(
            "SELECT id, from_backup_id, schedule_id, start_time, end_time, process_id
             FROM backups ORDER BY start_time ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(backups)
    }

    /// All backups for one schedule, ordered oldest-first (what the
    /// retention policy and chain grouping expect).
    pub async fn list_by_schedule(&self, schedule_id: i64) -> StorageResult<Vec<Backup>> {
        let backups = sqlx::query_as::<_, Backup>(
            "SELECT id, from_backup_id, schedule_id, start_time, end_time, process_id
             FROM backups WHERE schedule_id = ? ORDER BY start_time ASC",
        )
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(backups)
    }

    /// Most recently started backup, regardless of schedule. Used by the
    /// API to default an incremental's `from_backup_id`.
    pub async fn most_recent(&self) -> StorageResult<Option<Backup>> {
        let backup = sqlx::query_as::<_, Backup>(
            "SELECT id, from_backup_id, schedule_id, start_time, end_time, process_id
             FROM backups ORDER BY start_time DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(backup)
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM backups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("backup {id}")));
        }
        Ok(())
    }
}
