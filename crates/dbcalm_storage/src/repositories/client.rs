//! Repository for the `Client` entity. `scopes` is a JSON array column, so
//! `Client` is mapped by hand rather than derived.

use dbcalm_models::Client;
use sqlx::sqlite::SqlitePool;
use sqlx::FromRow;

use crate::error::{StorageError, StorageResult};

#[derive(FromRow)]
struct ClientRow {
    id: String,
    secret_hash: String,
    scopes: String,
    label: String,
}

impl TryFrom<ClientRow> for Client {
    type Error = StorageError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let scopes: Vec<String> = serde_json::from_str(&row.scopes)?;
        Ok(Self { id: row.id, secret_hash: row.secret_hash, scopes, label: row.label })
    }
}

#[derive(Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, client: &Client, now: chrono::DateTime<chrono::Utc>) -> StorageResult<()> {
        let scopes_json = serde_json::to_string(&client.scopes)?;
        sqlx::query("INSERT INTO clients (id, secret_hash, scopes, label, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&client.id)
            .bind(&client.secret_hash)
            .bind(&scopes_json)
            .bind(&client.label)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rewrites `secret_hash`, `scopes`, and `label` for an existing client —
    /// used to rotate a credential or change grants without issuing a new id.
    pub async fn update(&self, client: &Client) -> StorageResult<()> {
        let scopes_json = serde_json::to_string(&client.scopes)?;
        let result = sqlx::query("UPDATE clients SET secret_hash = ?, scopes = ?, label = ? WHERE id = ?")
            .bind(&client.secret_hash)
            .bind(&scopes_json)
            .bind(&client.label)
            .bind(&client.id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("client {}", client.id)));
        }
        Ok(())
    }

    pub async fn get(&self, id: &str) -> StorageResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, secret_hash, scopes, label FROM clients WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TryInto::try_into).transpose()
    }

    pub async fn list(&self) -> StorageResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as("SELECT id, secret_hash, scopes, label FROM clients ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("client {id}")));
        }
        Ok(())
    }
}
