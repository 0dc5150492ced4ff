//! Repository for the `Restore` entity.

use dbcalm_models::Restore;
use sqlx::sqlite::SqlitePool;

use crate::error::StorageResult;

#[derive(Clone)]
pub struct RestoreRepository {
    pool: SqlitePool,
}

impl RestoreRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, restore: &Restore) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO restores (id, start_time, end_time, target, target_path, backup_id, backup_timestamp, process_id)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&restore.id)
        .bind(restore.start_time)
        .bind(restore.end_time)
        .bind(&restore.target)
        .bind(&restore.target_path)
        .bind(&restore.backup_id)
        .bind(restore.backup_timestamp)
        .bind(restore.process_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<Restore>> {
        let restore = sqlx::query_as::<_, Restore>(
            "SELECT id, start_time, end_time, target, target_path, backup_id, backup_timestamp, process_id
             FROM restores WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(restore)
    }

    pub async fn list(&self) -> StorageResult<Vec<Restore>> {
        let restores = sqlx::query_as::<_, Restore>(
            "SELECT id, start_time, end_time, target, target_path, backup_id, backup_timestamp, process_id
             FROM restores ORDER BY start_time DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(restores)
    }
}
