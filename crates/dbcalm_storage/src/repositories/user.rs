//! Repository for the `User` entity. All-scalar, derives `sqlx::FromRow`
//! directly on the domain type.

use dbcalm_models::User;
use sqlx::sqlite::SqlitePool;

use crate::error::{StorageError, StorageResult};

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user: &User) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO users (username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, username: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, created_at, updated_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn list(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, created_at, updated_at FROM users ORDER BY username ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn update_password(&self, username: &str, password_hash: &str, now: chrono::DateTime<chrono::Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE username = ?")
            .bind(password_hash)
            .bind(now)
            .bind(username)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("user {username}")));
        }
        Ok(())
    }

    pub async fn delete(&self, username: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("user {username}")));
        }
        Ok(())
    }
}
