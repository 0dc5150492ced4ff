//! Repository for the `Process` audit trail: created once at spawn,
//! updated exactly once at terminal, never deleted.

use chrono::{DateTime, Utc};
use dbcalm_models::{Process, ProcessArgs, ProcessStatus, ProcessType};
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

use crate::error::{StorageError, StorageResult};

#[derive(FromRow)]
struct ProcessRow {
    id: i64,
    command: String,
    command_id: String,
    pid: i64,
    status: String,
    output: Option<String>,
    error: Option<String>,
    return_code: Option<i64>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    #[sqlx(rename = "type")]
    process_type: String,
    args: String,
}

impl TryFrom<ProcessRow> for Process {
    type Error = StorageError;

    fn try_from(row: ProcessRow) -> Result<Self, Self::Error> {
        let status = ProcessStatus::from_str(&row.status)
            .ok_or_else(|| StorageError::SerializationError(format!("unknown process status: {}", row.status)))?;
        let process_type = ProcessType::from_str(&row.process_type)
            .ok_or_else(|| StorageError::SerializationError(format!("unknown process type: {}", row.process_type)))?;
        let args: ProcessArgs = serde_json::from_str(&row.args)?;

        Ok(Self {
            id: Some(row.id),
            command: row.command,
            command_id: row.command_id,
            pid: i32::try_from(row.pid).unwrap_or(i32::MAX),
            status,
            output: row.output,
            error: row.error,
            return_code: row.return_code.map(|c| i32::try_from(c).unwrap_or(i32::MAX)),
            start_time: row.start_time,
            end_time: row.end_time,
            process_type,
            args,
        })
    }
}

#[derive(Clone)]
pub struct ProcessRepository {
    pool: SqlitePool,
}

impl ProcessRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a fresh `running` process row and fills in its assigned id.
    pub async fn create(&self, process: &mut Process) -> StorageResult<()> {
        let args_json = serde_json::to_string(&process.args)?;
        let result = sqlx::query(
            "INSERT INTO processes (command, command_id, pid, status, output, error, return_code, start_time, end_time, type, args)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&process.command)
        .bind(&process.command_id)
        .bind(i64::from(process.pid))
        .bind(process.status.as_str())
        .bind(&process.output)
        .bind(&process.error)
        .bind(process.return_code.map(i64::from))
        .bind(process.start_time)
        .bind(process.end_time)
        .bind(process.process_type.as_str())
        .bind(&args_json)
        .execute(&self.pool)
        .await?;

        process.id = Some(result.last_insert_rowid());
        Ok(())
    }

    /// Persists the terminal state of an already-created process.
    pub async fn update_terminal(&self, process: &Process) -> StorageResult<()> {
        let id = process.id.ok_or_else(|| StorageError::InvalidState("process has no id".into()))?;
        sqlx::query(
            "UPDATE processes SET status = ?, output = ?, error = ?, return_code = ?, end_time = ? WHERE id = ?",
        )
        .bind(process.status.as_str())
        .bind(&process.output)
        .bind(&process.error)
        .bind(process.return_code.map(i64::from))
        .bind(process.end_time)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn by_command_id(&self, command_id: &str) -> StorageResult<Vec<Process>> {
        let rows: Vec<ProcessRow> = sqlx::query_as(
            "SELECT id, command, command_id, pid, status, output, error, return_code, start_time, end_time, type, args
             FROM processes WHERE command_id = ? ORDER BY id ASC",
        )
        .bind(command_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Latest row sharing `command_id`, for status polling.
    pub async fn latest_by_command_id(&self, command_id: &str) -> StorageResult<Option<Process>> {
        let row: Option<ProcessRow> = sqlx::query_as(
            "SELECT id, command, command_id, pid, status, output, error, return_code, start_time, end_time, type, args
             FROM processes WHERE command_id = ? ORDER BY id DESC LIMIT 1",
        )
        .bind(command_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn command_id_exists(&self, command_id: &str) -> StorageResult<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processes WHERE command_id = ?")
            .bind(command_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }
}
