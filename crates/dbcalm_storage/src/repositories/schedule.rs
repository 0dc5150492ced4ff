//! Repository for the `Schedule` entity. Enum columns are stored as their
//! `as_str()` text, so `Schedule` is mapped by hand rather than derived.

use chrono::{DateTime, Utc};
use dbcalm_models::{BackupType, Frequency, IntervalUnit, RetentionUnit, Schedule};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

use crate::error::{StorageError, StorageResult};

#[derive(FromRow)]
struct ScheduleRow {
    id: i64,
    backup_type: String,
    frequency: String,
    day_of_week: Option<i64>,
    day_of_month: Option<i64>,
    hour: Option<i64>,
    minute: Option<i64>,
    interval_value: Option<i64>,
    interval_unit: Option<String>,
    retention_value: Option<i64>,
    retention_unit: Option<String>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ScheduleRow> for Schedule {
    type Error = StorageError;

    fn try_from(row: ScheduleRow) -> Result<Self, Self::Error> {
        let backup_type = BackupType::from_str(&row.backup_type)
            .ok_or_else(|| StorageError::SerializationError(format!("unknown backup_type: {}", row.backup_type)))?;
        let frequency = Frequency::from_str(&row.frequency)
            .ok_or_else(|| StorageError::SerializationError(format!("unknown frequency: {}", row.frequency)))?;
        let interval_unit = row
            .interval_unit
            .map(|s| IntervalUnit::from_str(&s).ok_or_else(|| StorageError::SerializationError(format!("unknown interval_unit: {s}"))))
            .transpose()?;
        let retention_unit = row
            .retention_unit
            .map(|s| RetentionUnit::from_str(&s).ok_or_else(|| StorageError::SerializationError(format!("unknown retention_unit: {s}"))))
            .transpose()?;

        Ok(Self {
            id: Some(row.id),
            backup_type,
            frequency,
            day_of_week: row.day_of_week.map(|v| u8::try_from(v).unwrap_or(0)),
            day_of_month: row.day_of_month.map(|v| u8::try_from(v).unwrap_or(1)),
            hour: row.hour.map(|v| u8::try_from(v).unwrap_or(0)),
            minute: row.minute.map(|v| u8::try_from(v).unwrap_or(0)),
            interval_value: row.interval_value.map(|v| u32::try_from(v).unwrap_or(1)),
            interval_unit,
            retention_value: row.retention_value,
            retention_unit,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: SqlitePool,
}

impl ScheduleRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, schedule: &Schedule) -> StorageResult<i64> {
        let result = sqlx::query(
            "INSERT INTO schedules (backup_type, frequency, day_of_week, day_of_month, hour, minute,
                                     interval_value, interval_unit, retention_value, retention_unit,
                                     enabled, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(schedule.backup_type.as_str())
        .bind(schedule.frequency.as_str())
        .bind(schedule.day_of_week.map(i64::from))
        .bind(schedule.day_of_month.map(i64::from))
        .bind(schedule.hour.map(i64::from))
        .bind(schedule.minute.map(i64::from))
        .bind(schedule.interval_value.map(i64::from))
        .bind(schedule.interval_unit.map(IntervalUnit::as_str))
        .bind(schedule.retention_value)
        .bind(schedule.retention_unit.map(RetentionUnit::as_str))
        .bind(schedule.enabled)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> StorageResult<Option<Schedule>> {
        let row: Option<ScheduleRow> = sqlx::query_as(
            "SELECT id, backup_type, frequency, day_of_week, day_of_month, hour, minute,
                    interval_value, interval_unit, retention_value, retention_unit,
                    enabled, created_at, updated_at
             FROM schedules WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn list(&self) -> StorageResult<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT id, backup_type, frequency, day_of_week, day_of_month, hour, minute,
                    interval_value, interval_unit, retention_value, retention_unit,
                    enabled, created_at, updated_at
             FROM schedules ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn list_enabled(&self) -> StorageResult<Vec<Schedule>> {
        let rows: Vec<ScheduleRow> = sqlx::query_as(
            "SELECT id, backup_type, frequency, day_of_week, day_of_month, hour, minute,
                    interval_value, interval_unit, retention_value, retention_unit,
                    enabled, created_at, updated_at
             FROM schedules WHERE enabled = 1 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn has_enabled_full_schedule(&self) -> StorageResult<bool> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM schedules WHERE enabled = 1 AND backup_type = 'full'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }

    pub async fn delete(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("schedule {id}")));
        }
        Ok(())
    }
}
