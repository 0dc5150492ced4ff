//! The `Client` entity: API credentials for service-to-service auth.

use serde::{Deserialize, Serialize};

/// An API client (service account). `secret` is bcrypt-hashed once stored;
/// the plaintext secret is only ever returned to the caller at creation.
///
/// `scopes` is stored as a JSON array column in SQLite, so this type does not
/// derive `sqlx::FromRow` directly — the storage crate maps its own row type
/// onto this one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub secret_hash: String,
    pub scopes: Vec<String>,
    pub label: String,
}

impl Client {
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
