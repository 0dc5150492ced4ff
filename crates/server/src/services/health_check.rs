//! Backs `GET /health`: confirms the SQLite pool answers and, best-effort,
//! that the command-bus sockets are present on disk. Results are cheap
//! enough that no caching layer is needed here.

use std::path::Path;

use serde::Serialize;

use crate::db::DatabasePool;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub database_ok: bool,
    pub db_cmd_socket_present: bool,
    pub system_cmd_socket_present: bool,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.database_ok
    }
}

pub struct HealthCheckService;

impl HealthCheckService {
    pub async fn check(pool: &DatabasePool, db_cmd_socket: &str, system_cmd_socket: &str) -> HealthReport {
        let database_ok = sqlx::query("SELECT 1").execute(pool).await.is_ok();
        HealthReport {
            database_ok,
            db_cmd_socket_present: Path::new(db_cmd_socket).exists(),
            system_cmd_socket_present: Path::new(system_cmd_socket).exists(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unhealthy_report_is_not_healthy() {
        let report = HealthReport { database_ok: false, db_cmd_socket_present: true, system_cmd_socket_present: true };
        assert!(!report.is_healthy());
    }

    #[test]
    fn healthy_report_is_healthy() {
        let report = HealthReport { database_ok: true, db_cmd_socket_present: false, system_cmd_socket_present: false };
        assert!(report.is_healthy());
    }
}
