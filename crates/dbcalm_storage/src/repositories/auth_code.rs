//! Repository for the `AuthCode` entity. `scopes` is a JSON array column,
//! and lookups lazily expire: a read that finds an expired row deletes it
//! and reports not found rather than trusting the caller's clock.

use chrono::Utc;
use dbcalm_models::AuthCode;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

use crate::error::StorageResult;

#[derive(FromRow)]
struct AuthCodeRow {
    code: String,
    username: String,
    scopes: String,
    expires_at: i64,
}

impl TryFrom<AuthCodeRow> for AuthCode {
    type Error = serde_json::Error;

    fn try_from(row: AuthCodeRow) -> Result<Self, Self::Error> {
        let scopes: Vec<String> = serde_json::from_str(&row.scopes)?;
        Ok(Self { code: row.code, username: row.username, scopes, expires_at: row.expires_at })
    }
}

#[derive(Clone)]
pub struct AuthCodeRepository {
    pool: SqlitePool,
}

impl AuthCodeRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, auth_code: &AuthCode) -> StorageResult<()> {
        let scopes_json = serde_json::to_string(&auth_code.scopes)?;
        sqlx::query("INSERT INTO auth_codes (code, username, scopes, expires_at) VALUES (?, ?, ?, ?)")
            .bind(&auth_code.code)
            .bind(&auth_code.username)
            .bind(&scopes_json)
            .bind(auth_code.expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Consumes (deletes) a code and returns it, unless it is expired — in
    /// which case it is deleted anyway and `None` is returned.
    pub async fn consume(&self, code: &str) -> StorageResult<Option<AuthCode>> {
        let row: Option<AuthCodeRow> = sqlx::query_as(
            "SELECT code, username, scopes, expires_at FROM auth_codes WHERE code = ?",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let auth_code: AuthCode = row.try_into()?;

        sqlx::query("DELETE FROM auth_codes WHERE code = ?")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if auth_code.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(auth_code))
    }
}
