//! Shells out to the engine's admin binary for the two ambient facts the
//! command builder needs but can't compute itself: whether the server is
//! alive, and which version it's running. Kept separate from
//! `ProcessRunner` since these are quick diagnostic probes, not tracked
//! backup/restore operations — no `Process` row is recorded for them.

use dbcalm_core::Engine;
use dbcalm_models::{DomainError, DomainResult};
use tokio::sync::OnceCell;

pub struct EngineProbe {
    engine: Engine,
    credentials_file: String,
    project: String,
    // `dbcalm_core::VersionCache` caches synchronously and can't await a
    // child process itself, so the async-lazy caching lives here instead;
    // `parse_version` still does the actual parsing.
    version_cache: OnceCell<(u32, u32, u32)>,
}

impl EngineProbe {
    #[must_use]
    pub fn new(engine: Engine, credentials_file: String, project: String) -> Self {
        Self { engine, credentials_file, project, version_cache: OnceCell::new() }
    }

    /// `mysqladmin ping`/`mariadb-admin ping` — true only on a clean exit.
    pub async fn server_is_alive(&self) -> bool {
        tokio::process::Command::new(self.engine.version_admin_binary())
            .arg(format!("--defaults-file={}", self.credentials_file))
            .arg(format!("--defaults-group-suffix=-{}", self.project))
            .arg("ping")
            .output()
            .await
            .is_ok_and(|out| out.status.success())
    }

    /// Cached `(major, minor, patch)`, probing the admin binary's `--version`
    /// output at most once per process lifetime.
    pub async fn version(&self) -> DomainResult<(u32, u32, u32)> {
        self.version_cache
            .get_or_try_init(|| async {
                let output = tokio::process::Command::new(self.engine.version_admin_binary())
                    .arg("--version")
                    .output()
                    .await
                    .map_err(|e| DomainError::MissingData(e.to_string()))?;
                let text = String::from_utf8_lossy(&output.stdout);
                dbcalm_core::parse_version(&text)
            })
            .await
            .copied()
    }
}
