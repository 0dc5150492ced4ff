//! Startup configuration validation: paths must exist or be creatable and
//! numeric ranges must be sane. Run once at process start in every binary.

use std::path::Path;

use super::error::{ConfigError, ConfigResult};
use super::model::DbcalmConfig;

pub struct ConfigValidator;

impl ConfigValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns non-fatal warnings on success, or the full list of fatal
    /// errors on failure (first one is surfaced to the operator).
    pub fn validate(&self, config: &DbcalmConfig) -> Result<Vec<String>, Vec<ConfigError>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if config.project.trim().is_empty() {
            errors.push(ConfigError::ValidationError("project must not be empty".into()));
        }

        if config.api_port == 0 {
            errors.push(ConfigError::ValidationError("api_port must be nonzero".into()));
        }

        if config.jwt_secret.len() < 32 {
            warnings.push(format!(
                "jwt_secret is only {} characters; production deployments should use at least 32",
                config.jwt_secret.len()
            ));
        }

        Self::check_creatable_dir(&config.backup_dir, &mut errors);
        Self::check_creatable_dir(&config.state_dir, &mut errors);

        if let Some(parent) = Path::new(&config.credentials_file).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                warnings.push(format!("credentials file parent {} does not exist yet", parent.display()));
            }
        }

        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(errors)
        }
    }

    fn check_creatable_dir(path: &str, errors: &mut Vec<ConfigError>) {
        let p = Path::new(path);
        if p.exists() {
            if !p.is_dir() {
                errors.push(ConfigError::ValidationError(format!("{path} exists and is not a directory")));
            }
            return;
        }
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                errors.push(ConfigError::ValidationError(format!("{path} parent directory does not exist")));
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate_config(config: &DbcalmConfig) -> ConfigResult<Vec<String>> {
    ConfigValidator::new().validate(config).map_err(|mut errs| errs.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes_with_warnings() {
        let config = DbcalmConfig { state_dir: "/tmp".into(), backup_dir: "/tmp".into(), ..Default::default() };
        let result = ConfigValidator::new().validate(&config);
        assert!(result.is_ok());
    }

    #[test]
    fn empty_project_is_rejected() {
        let config = DbcalmConfig { project: String::new(), state_dir: "/tmp".into(), backup_dir: "/tmp".into(), ..Default::default() };
        let result = ConfigValidator::new().validate(&config);
        assert!(result.is_err());
    }

    #[test]
    fn zero_port_is_rejected() {
        let config = DbcalmConfig { api_port: 0, state_dir: "/tmp".into(), backup_dir: "/tmp".into(), ..Default::default() };
        assert!(ConfigValidator::new().validate(&config).is_err());
    }
}
