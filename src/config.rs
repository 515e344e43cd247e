//! Configuration management module.

use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::{DEFAULT_TIMESTAMP_FORMAT, StoreOptions};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration load result.
#[derive(Debug)]
pub enum ConfigLoadResult {
    /// Config loaded successfully.
    Loaded(AppConfig),
    /// Config file missing (first run).
    Missing,
    /// Config file exists but invalid.
    Invalid(ConfigError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where roster data lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty means the platform data directory.
    #[serde(default)]
    pub data_dir: String,
}

/// Rotation generation and reveal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    /// chrono format string for record timestamps.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    /// Delay before the first revealed slot (default: 800).
    #[serde(default = "default_reveal_base_delay_ms")]
    pub reveal_base_delay_ms: u64,
    /// Delay between revealed slots (default: 400).
    #[serde(default = "default_reveal_interval_ms")]
    pub reveal_interval_ms: u64,
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_reveal_base_delay_ms() -> u64 {
    800
}

fn default_reveal_interval_ms() -> u64 {
    400
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Also write a daily rolling log file under `<data_dir>/logs`.
    pub file_enabled: bool,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "break-order")
}

impl AppConfig {
    /// Get config file path (platform config directory).
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|d| d.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Attempt to load config with detailed result.
    pub fn try_load(path: &Path) -> ConfigLoadResult {
        if !path.exists() {
            return ConfigLoadResult::Missing;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<AppConfig>(&content) {
                Ok(config) => match config.validate() {
                    Ok(()) => ConfigLoadResult::Loaded(config),
                    Err(e) => ConfigLoadResult::Invalid(e),
                },
                Err(e) => ConfigLoadResult::Invalid(ConfigError::Parse(e)),
            },
            Err(e) => ConfigLoadResult::Invalid(ConfigError::Read(e)),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let format = self.rotation.timestamp_format.trim();
        if format.is_empty() {
            return Err(ConfigError::Validation("Timestamp format cannot be empty".to_string()));
        }
        if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::Validation(format!(
                "Timestamp format '{format}' is not a valid chrono format"
            )));
        }
        if self.rotation.reveal_interval_ms > 10_000 {
            return Err(ConfigError::Validation(
                "Reveal interval cannot exceed 10000 ms".to_string(),
            ));
        }
        if self.rotation.reveal_base_delay_ms > 10_000 {
            return Err(ConfigError::Validation(
                "Reveal delay cannot exceed 10000 ms".to_string(),
            ));
        }
        let level = self.logging.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Log level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Store settings derived from this config.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            timestamp_format: self.rotation.timestamp_format.clone(),
        }
    }
}

impl StorageConfig {
    /// Resolve the data directory, falling back to the platform default.
    pub fn resolved_data_dir(&self) -> PathBuf {
        let configured = self.data_dir.trim();
        if !configured.is_empty() {
            return PathBuf::from(configured);
        }
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("break-order-data"))
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            timestamp_format: default_timestamp_format(),
            reveal_base_delay_ms: default_reveal_base_delay_ms(),
            reveal_interval_ms: default_reveal_interval_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str("[storage]\ndata_dir = \"/tmp/bo\"\n").unwrap();
        assert_eq!(config.storage.resolved_data_dir(), PathBuf::from("/tmp/bo"));
        assert_eq!(config.rotation.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.rotation.reveal_interval_ms, 400);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validation_timestamp_format() {
        let mut config = AppConfig::default();

        config.rotation.timestamp_format = String::new();
        assert!(config.validate().is_err());

        config.rotation.timestamp_format = "%Y-%m-%d %Q".to_string();
        assert!(config.validate().is_err());

        config.rotation.timestamp_format = "%Y-%m-%d %H:%M".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_reveal_bounds() {
        let mut config = AppConfig::default();

        config.rotation.reveal_interval_ms = 10_001;
        assert!(config.validate().is_err());

        config.rotation.reveal_interval_ms = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_log_level() {
        let mut config = AppConfig::default();

        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        assert!(matches!(AppConfig::try_load(&path), ConfigLoadResult::Missing));

        let mut config = AppConfig::default();
        config.rotation.reveal_interval_ms = 250;
        config.save(&path).unwrap();

        match AppConfig::try_load(&path) {
            ConfigLoadResult::Loaded(loaded) => assert_eq!(loaded.rotation.reveal_interval_ms, 250),
            other => panic!("unexpected load result: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = 3\n").unwrap();

        assert!(matches!(
            AppConfig::try_load(&path),
            ConfigLoadResult::Invalid(ConfigError::Parse(_))
        ));
    }
}
