//! Configuration
//!
//! JSON settings for the admin console and controller policies, with
//! environment overrides for deployment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::confirm::DEFAULT_CONFIRM_LITERAL;

/// Overrides `api_base_url`
pub const API_URL_ENV: &str = "TIMETABLE_ADMIN_API";
/// Bearer token for the console session
pub const TOKEN_ENV: &str = "TIMETABLE_ADMIN_TOKEN";
/// Path of the JSON config file
pub const CONFIG_ENV: &str = "TIMETABLE_ADMIN_CONFIG";

/// What happens when the backend rejects our credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthFallback {
    /// Keep the screen populated: substitute fixtures on load, apply
    /// mutations locally, and ask for a fresh login
    #[default]
    Fixtures,
    /// Surface the failure and ask for a fresh login
    Disabled,
}

impl AuthFallback {
    pub fn uses_fixtures(self) -> bool {
        self == AuthFallback::Fixtures
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub dir: PathBuf,
    pub app_name: String,
    pub level: String,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            app_name: "TimetableAdmin".to_string(),
            level: "info".to_string(),
            max_file_bytes: 1024 * 1024,
            max_files: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Backend root, e.g. `https://api.example.edu/api`. Absent = offline.
    pub api_base_url: Option<String>,
    pub auth_fallback: AuthFallback,
    pub confirm_literal: String,
    pub log: LogSettings,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            auth_fallback: AuthFallback::default(),
            confirm_literal: DEFAULT_CONFIRM_LITERAL.to_string(),
            log: LogSettings::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Cannot read {}: {}", path.display(), e),
            ConfigError::Parse(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AdminConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.confirm_literal.is_empty() {
            return Err(ConfigError::Parse("confirm_literal must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_json(&json)
    }

    /// File named by `TIMETABLE_ADMIN_CONFIG` (defaults without it), then
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply environment overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_api_override(std::env::var(API_URL_ENV).ok())
    }

    fn with_api_override(mut self, api: Option<String>) -> Self {
        if let Some(url) = api.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = Some(url);
        }
        self
    }

    pub fn logger_config(&self) -> rolling_logger::LoggerConfig {
        let level = log::LevelFilter::from_str(&self.log.level).unwrap_or(log::LevelFilter::Info);
        rolling_logger::LoggerConfig {
            level,
            max_file_bytes: self.log.max_file_bytes,
            max_files: self.log.max_files,
            ..rolling_logger::LoggerConfig::new(self.log.dir.clone(), &self.log.app_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = AdminConfig::from_json("{}").unwrap();
        assert_eq!(config, AdminConfig::default());
        assert_eq!(config.confirm_literal, "delete");
        assert!(config.auth_fallback.uses_fixtures());
    }

    #[test]
    fn test_parse_full_config() {
        let config = AdminConfig::from_json(
            r#"{
                "api_base_url": "https://api.example.edu/api",
                "auth_fallback": "disabled",
                "confirm_literal": "remove",
                "log": { "level": "debug", "max_files": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url.as_deref(), Some("https://api.example.edu/api"));
        assert_eq!(config.auth_fallback, AuthFallback::Disabled);
        assert_eq!(config.confirm_literal, "remove");
        assert_eq!(config.log.max_files, 2);
        assert_eq!(config.log.app_name, "TimetableAdmin");

        let logger = config.logger_config();
        assert_eq!(logger.level, log::LevelFilter::Debug);
        assert_eq!(logger.max_files, 2);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(AdminConfig::from_json(r#"{"auth_fallback":"sometimes"}"#), Err(ConfigError::Parse(_))));
        assert!(matches!(AdminConfig::from_json(r#"{"confirm_literal":""}"#), Err(ConfigError::Parse(_))));
        assert!(matches!(AdminConfig::from_file("/nonexistent/admin.json"), Err(ConfigError::Io(_, _))));
    }

    #[test]
    fn test_blank_api_override_is_ignored() {
        let config = AdminConfig::default().with_api_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, None);

        let config = AdminConfig::default().with_api_override(Some("http://localhost:8080".to_string()));
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let mut config = AdminConfig::default();
        config.log.level = "loud".to_string();
        assert_eq!(config.logger_config().level, log::LevelFilter::Info);
    }
}
