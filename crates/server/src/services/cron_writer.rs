//! Owns the atomic swap of `/etc/cron.d/<project>`: render to a temp file
//! in the same directory, chmod 644, then rename over the target. Runs in
//! the system command service, the sole writer of this path.

use std::io;
use std::path::{Path, PathBuf};

use dbcalm_core::render_cron_file;
use dbcalm_models::Schedule;

pub struct CronWriter {
    cron_d_dir: PathBuf,
    project: String,
    binary_path: String,
}

impl CronWriter {
    #[must_use]
    pub fn new(cron_d_dir: impl Into<PathBuf>, project: String, binary_path: String) -> Self {
        Self { cron_d_dir: cron_d_dir.into(), project, binary_path }
    }

    fn target_path(&self) -> PathBuf {
        self.cron_d_dir.join(&self.project)
    }

    /// Writes the rendered fragment to a sibling temp file, chmods it 644,
    /// then renames it over the final path — the rename is atomic on the
    /// same filesystem, so cron never observes a half-written fragment.
    pub async fn write(&self, schedules: &[Schedule]) -> io::Result<()> {
        let rendered = render_cron_file(schedules, &self.binary_path, &self.project, chrono::Utc::now());
        let target = self.target_path();
        let tmp_path = self.cron_d_dir.join(format!(".{}.tmp", self.project));

        tokio::fs::write(&tmp_path, rendered.as_bytes()).await?;
        set_permissions_644(&tmp_path).await?;
        tokio::fs::rename(&tmp_path, &target).await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn set_permissions_644(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o644);
    tokio::fs::set_permissions(path, perms).await
}

#[cfg(not(unix))]
async fn set_permissions_644(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dbcalm_models::{BackupType, Frequency};

    fn schedule() -> Schedule {
        Schedule {
            id: Some(1),
            backup_type: BackupType::Full,
            frequency: Frequency::Daily,
            day_of_week: None,
            day_of_month: None,
            hour: Some(3),
            minute: Some(0),
            interval_value: None,
            interval_unit: None,
            retention_value: None,
            retention_unit: None,
            enabled: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn write_produces_a_readable_fragment_with_no_tmp_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CronWriter::new(dir.path(), "dbcalm".to_string(), "/usr/bin/dbcalmctl".to_string());
        writer.write(&[schedule()]).await.unwrap();

        let contents = tokio::fs::read_to_string(dir.path().join("dbcalm")).await.unwrap();
        assert!(contents.contains("schedule id: 1"));
        assert!(tokio::fs::metadata(dir.path().join(".dbcalm.tmp")).await.is_err());
    }

    #[tokio::test]
    async fn write_overwrites_a_previous_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CronWriter::new(dir.path(), "dbcalm".to_string(), "/usr/bin/dbcalmctl".to_string());
        writer.write(&[schedule()]).await.unwrap();

        let mut disabled = schedule();
        disabled.enabled = false;
        writer.write(&[disabled]).await.unwrap();

        let contents = tokio::fs::read_to_string(dir.path().join("dbcalm")).await.unwrap();
        assert!(!contents.contains("schedule id: 1"));
    }
}
