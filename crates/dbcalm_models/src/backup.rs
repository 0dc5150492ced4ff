//! The `Backup` entity: a successful backup artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A successful backup artifact, materialized by the queue handler once its
/// producing `Process` finishes with exit code 0.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Backup {
    pub id: String,
    pub from_backup_id: Option<String>,
    pub schedule_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub process_id: i64,
}

impl Backup {
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.from_backup_id.is_none()
    }
}

/// An identifier either supplied by the caller or assigned by the API as the
/// current UTC instant, formatted `YYYY-MM-DD-HH-MM-SS`.
#[must_use]
pub fn timestamp_backup_id(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d-%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_id_matches_expected_shape() {
        let now = Utc.with_ymd_and_hms(2024, 10, 18, 3, 0, 0).unwrap();
        assert_eq!(timestamp_backup_id(now), "2024-10-18-03-00-00");
    }

    #[test]
    fn is_full_reflects_parentage() {
        let base = Backup {
            id: "b1".into(),
            from_backup_id: None,
            schedule_id: None,
            start_time: Utc::now(),
            end_time: Utc::now(),
            process_id: 1,
        };
        assert!(base.is_full());

        let inc = Backup { from_backup_id: Some("b1".into()), ..base };
        assert!(!inc.is_full());
    }
}
