//! The single typed configuration struct, loaded from YAML and layered
//! under `DBCALM_*` environment overrides. Passed as an explicit `Arc` to
//! every constructor that needs it — never stashed behind a global.

use dbcalm_core::{BackupSettings, Compression, Engine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DbcalmConfig {
    /// Project name; drives socket paths (`/var/run/<project>/...`), the
    /// cron fragment name, and the `-<project>` defaults-group suffix.
    pub project: String,

    /// Database engine in front of this host.
    pub engine: Engine,

    /// Overrides the engine's default backup binary (`mariabackup`/`xtrabackup`).
    pub backup_bin: Option<String>,

    /// MySQL/MariaDB client credentials file, e.g. `/etc/dbcalm/client.cnf`.
    pub credentials_file: String,

    /// Directory backup artifacts are written under (one subdirectory per id).
    pub backup_dir: String,

    /// The live server's data directory, checked for emptiness before a
    /// database-target restore and passed to `--datadir` on MySQL copy-back.
    pub data_dir: String,

    /// Stream backups through `xbstream` instead of writing straight to
    /// `--target-dir`.
    pub stream: bool,

    /// Compression applied when streaming.
    pub compression: Option<Compression>,

    /// Command streamed backups are piped into instead of a local file,
    /// e.g. `nc remote-host 9999`.
    pub forward: Option<String>,

    /// Where the SQLite state file lives. Overridable by `DATABASE_PATH`
    /// (the storage crate's own convention) independently of this config.
    pub state_dir: String,

    /// API front door bind host/port.
    pub api_host: String,
    pub api_port: u16,

    /// Path to the DB command service's socket (socket A).
    pub db_cmd_socket: String,
    /// Path to the system command service's socket (socket B).
    pub system_cmd_socket: String,

    /// Secret used to sign JWTs issued by `/auth/token`.
    pub jwt_secret: String,
    /// JWT lifetime in hours.
    pub jwt_expiration_hours: i64,

    /// Absolute path to the `dbcalmctl` binary, written into the rendered
    /// cron fragment.
    pub cli_binary_path: String,
}

impl Default for DbcalmConfig {
    fn default() -> Self {
        Self {
            project: "dbcalm".to_string(),
            engine: Engine::MariaDb,
            backup_bin: None,
            credentials_file: "/etc/dbcalm/client.cnf".to_string(),
            backup_dir: "/var/backups/dbcalm".to_string(),
            data_dir: "/var/lib/mysql".to_string(),
            stream: false,
            compression: None,
            forward: None,
            state_dir: "/var/lib/dbcalm".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8080,
            db_cmd_socket: "/var/run/dbcalm/dbcalm.cmd.sock".to_string(),
            system_cmd_socket: "/var/run/dbcalm/dbcalm.system.sock".to_string(),
            jwt_secret: String::new(),
            jwt_expiration_hours: 8,
            cli_binary_path: "/usr/bin/dbcalmctl".to_string(),
        }
    }
}

impl DbcalmConfig {
    /// Projects the command-builder-relevant fields out as a `BackupSettings`.
    #[must_use]
    pub fn backup_settings(&self) -> BackupSettings {
        BackupSettings {
            engine: self.engine,
            backup_bin: self.backup_bin.clone(),
            credentials_file: self.credentials_file.clone(),
            project: self.project.clone(),
            backup_dir: self.backup_dir.clone(),
            data_dir: self.data_dir.clone(),
            stream: self.stream,
            compression: self.compression,
            forward: self.forward.clone(),
        }
    }
}
