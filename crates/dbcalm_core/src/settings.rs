//! Settings consumed by the command builder: paths and engine choice are
//! config-layer concerns, kept here as a plain struct so `command_builder`
//! stays a pure function of `(settings, args)`.

use serde::{Deserialize, Serialize};

/// Compression applied to a streamed backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    Gzip,
    Zstd,
}

impl Compression {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => ".gz",
            Self::Zstd => ".zst",
        }
    }

    #[must_use]
    pub const fn pipe_command(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd - -c -T0",
        }
    }
}

/// Which backup engine's binary and copy-back conventions to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engine {
    MariaDb,
    MySql,
}

impl Engine {
    #[must_use]
    pub const fn default_binary(self) -> &'static str {
        match self {
            Self::MariaDb => "mariabackup",
            Self::MySql => "xtrabackup",
        }
    }

    #[must_use]
    pub const fn version_admin_binary(self) -> &'static str {
        match self {
            Self::MariaDb => "mariadb-admin",
            Self::MySql => "mysqladmin",
        }
    }

    /// Below this version the prepare step on the base must pass
    /// `--apply-log-only` when further increments remain to be applied.
    /// Only meaningful for MariaDB; MySQL/xtrabackup always requires it
    /// regardless of version.
    #[must_use]
    pub const fn apply_log_only_version_threshold(self) -> Option<(u32, u32)> {
        match self {
            Self::MariaDb => Some((10, 2)),
            Self::MySql => None,
        }
    }

    /// Whether `--datadir` must always be appended on copy-back
    /// (MySQL/xtrabackup) vs. left to the server defaults file (MariaDB).
    #[must_use]
    pub const fn always_sets_datadir_on_copy_back(self) -> bool {
        matches!(self, Self::MySql)
    }
}

/// Everything the command builder needs to construct argv vectors, owned by
/// the caller (typically loaded from `DbcalmConfig`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    pub engine: Engine,
    pub backup_bin: Option<String>,
    pub credentials_file: String,
    pub project: String,
    pub backup_dir: String,
    pub data_dir: String,
    pub stream: bool,
    pub compression: Option<Compression>,
    pub forward: Option<String>,
}

impl BackupSettings {
    #[must_use]
    pub fn backup_binary(&self) -> &str {
        self.backup_bin.as_deref().unwrap_or_else(|| self.engine.default_binary())
    }
}
