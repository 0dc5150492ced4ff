//! The `User` entity: an operator login.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An operator account used to log into the API front door interactively.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
