//! Schema bootstrap: plain embedded `CREATE TABLE IF NOT EXISTS` statements
//! run once at pool-init, not a migration framework.

use sqlx::sqlite::SqlitePool;

use crate::error::StorageResult;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS processes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    command TEXT NOT NULL,
    command_id TEXT NOT NULL,
    pid INTEGER NOT NULL,
    status TEXT NOT NULL,
    output TEXT,
    error TEXT,
    return_code INTEGER,
    start_time TEXT NOT NULL,
    end_time TEXT,
    type TEXT NOT NULL,
    args TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_processes_command_id ON processes(command_id);

CREATE TABLE IF NOT EXISTS backups (
    id TEXT PRIMARY KEY,
    from_backup_id TEXT,
    schedule_id INTEGER,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    process_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_backups_schedule_id ON backups(schedule_id);
CREATE INDEX IF NOT EXISTS idx_backups_from_backup_id ON backups(from_backup_id);

CREATE TABLE IF NOT EXISTS restores (
    id TEXT PRIMARY KEY,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    target TEXT NOT NULL,
    target_path TEXT NOT NULL,
    backup_id TEXT NOT NULL,
    backup_timestamp TEXT NOT NULL,
    process_id INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS schedules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    backup_type TEXT NOT NULL,
    frequency TEXT NOT NULL,
    day_of_week INTEGER,
    day_of_month INTEGER,
    hour INTEGER,
    minute INTEGER,
    interval_value INTEGER,
    interval_unit TEXT,
    retention_value INTEGER,
    retention_unit TEXT,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    secret_hash TEXT NOT NULL,
    scopes TEXT NOT NULL,
    label TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS auth_codes (
    code TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    scopes TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
";

pub async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
