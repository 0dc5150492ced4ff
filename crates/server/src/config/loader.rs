//! Loads the single `DbcalmConfig` from an optional YAML file, layered
//! under `DBCALM_*` environment overrides.
//!
//! Unlike the multi-tenant config cache this replaces, there is exactly one
//! config for the life of a process: load once at startup, validate once,
//! wrap in `Arc`, and pass it down explicitly.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{io_error_to_config_error, ConfigError, ConfigResult};
use super::model::DbcalmConfig;

const DEFAULT_CONFIG_PATH: &str = "/etc/dbcalm/config.yaml";
const CONFIG_PATH_ENV: &str = "DBCALM_CONFIG_PATH";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves the config file path: `DBCALM_CONFIG_PATH` if set, else the
    /// default system location.
    #[must_use]
    pub fn config_path() -> PathBuf {
        env::var(CONFIG_PATH_ENV).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
    }

    /// Loads config from the resolved path if it exists, falling back to
    /// defaults if no file is present, then applies environment overrides.
    pub fn load() -> ConfigResult<DbcalmConfig> {
        let path = Self::config_path();
        let base = if path.exists() {
            Self::load_file(&path)?
        } else {
            DbcalmConfig::default()
        };
        Ok(Self::apply_env_overrides(base))
    }

    fn load_file(path: &Path) -> ConfigResult<DbcalmConfig> {
        let contents = fs::read_to_string(path).map_err(io_error_to_config_error)?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn apply_env_overrides(mut config: DbcalmConfig) -> DbcalmConfig {
        if let Ok(v) = env::var("DBCALM_PROJECT") {
            config.project = v;
        }
        if let Ok(v) = env::var("DBCALM_BACKUP_DIR") {
            config.backup_dir = v;
        }
        if let Ok(v) = env::var("DBCALM_DATA_DIR") {
            config.data_dir = v;
        }
        if let Ok(v) = env::var("DBCALM_CREDENTIALS_FILE") {
            config.credentials_file = v;
        }
        if let Ok(v) = env::var("DBCALM_STATE_DIR") {
            config.state_dir = v;
        }
        if let Ok(v) = env::var("DBCALM_API_HOST") {
            config.api_host = v;
        }
        if let Ok(v) = env::var("DBCALM_API_PORT") {
            if let Ok(port) = v.parse() {
                config.api_port = port;
            }
        }
        if let Ok(v) = env::var("DBCALM_DB_CMD_SOCKET") {
            config.db_cmd_socket = v;
        }
        if let Ok(v) = env::var("DBCALM_SYSTEM_CMD_SOCKET") {
            config.system_cmd_socket = v;
        }
        if let Ok(v) = env::var("DBCALM_JWT_SECRET") {
            config.jwt_secret = v;
        }
        if let Ok(v) = env::var("DBCALM_CLI_BINARY_PATH") {
            config.cli_binary_path = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ConfigLoader::load_file(Path::new("/nonexistent/dbcalm-config.yaml"));
        assert!(config.is_err());
    }

    #[test]
    fn env_override_wins_over_default() {
        env::set_var("DBCALM_PROJECT", "testproj");
        let config = ConfigLoader::apply_env_overrides(DbcalmConfig::default());
        assert_eq!(config.project, "testproj");
        env::remove_var("DBCALM_PROJECT");
    }

    #[test]
    fn parses_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "project: acme\napi_port: 9090\n").unwrap();
        let config = ConfigLoader::load_file(&path).unwrap();
        assert_eq!(config.project, "acme");
        assert_eq!(config.api_port, 9090);
    }
}
