//! The `Restore` entity: a completed restore attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a restore chain is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreTarget {
    /// Copy-back into the live MySQL/MariaDB data directory.
    Database,
    /// Prepare into a scratch directory for inspection only.
    Folder,
}

impl RestoreTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Database => "database",
            Self::Folder => "folder",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "database" => Some(Self::Database),
            "folder" => Some(Self::Folder),
            _ => None,
        }
    }
}

impl std::fmt::Display for RestoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed restore attempt.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Restore {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub target: String,
    pub target_path: String,
    pub backup_id: String,
    pub backup_timestamp: DateTime<Utc>,
    pub process_id: i64,
}

impl Restore {
    #[must_use]
    pub fn restore_target(&self) -> Option<RestoreTarget> {
        RestoreTarget::from_str(&self.target)
    }
}
