//! Configuration management for Daylist
//!
//! This module handles loading, parsing, and validation of configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::MAX_AUTO_BACKUP_INTERVAL_HOURS;
use crate::utils::datetime;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub backup: BackupConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path; empty = platform data directory
    pub database_path: String,
}

/// Backup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Remote store kind: "memory" or "firestore"
    pub backend: String,
    /// Firestore project id (required for the firestore backend)
    pub project_id: String,
    /// Environment variable holding the Firebase web API key
    pub api_key_env: String,
    /// Auto-backup interval in hours (0 = disabled, manual backup only)
    pub auto_backup_interval_hours: u64,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Date format for due dates
    pub date_format: String,
    /// Datetime format for timestamps
    pub datetime_format: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging to a file
    pub enabled: bool,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            project_id: String::new(),
            api_key_env: "DAYLIST_FIREBASE_API_KEY".to_string(),
            auto_backup_interval_hours: 24,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            date_format: datetime::EXPORT_DATE_FORMAT.to_string(),
            datetime_format: datetime::EXPORT_DATETIME_FORMAT.to_string(),
        }
    }
}

impl StorageConfig {
    /// sqlx connection URL for the configured (or default) database path
    pub fn database_url(&self) -> Result<String> {
        let path = if self.database_path.is_empty() {
            dirs::data_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
                .join("daylist")
                .join("daylist.db")
        } else {
            PathBuf::from(&self.database_path)
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }

        Ok(format!("sqlite://{}?mode=rwc", path.display()))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in order of precedence
    fn find_config_file() -> Result<Option<PathBuf>> {
        // 1. Check current directory
        let current_dir_config = PathBuf::from("daylist.toml");
        if current_dir_config.exists() {
            return Ok(Some(current_dir_config));
        }

        // 2. Check XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("daylist").join("config.toml");
            if xdg_config.exists() {
                return Ok(Some(xdg_config));
            }
        }

        Ok(None)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate backup settings
        match self.backup.backend.as_str() {
            "memory" => {}
            "firestore" => {
                if self.backup.project_id.is_empty() {
                    anyhow::bail!("backup.project_id is required for the firestore backend");
                }
                if self.backup.api_key_env.is_empty() {
                    anyhow::bail!("backup.api_key_env cannot be empty");
                }
            }
            backend => {
                anyhow::bail!("unsupported backup backend '{}'", backend);
            }
        }

        if self.backup.auto_backup_interval_hours > MAX_AUTO_BACKUP_INTERVAL_HOURS {
            anyhow::bail!(
                "auto_backup_interval_hours cannot exceed {} ({} given)",
                MAX_AUTO_BACKUP_INTERVAL_HOURS,
                self.backup.auto_backup_interval_hours
            );
        }

        // Validate date/time formats
        if let Err(e) = chrono::NaiveDate::parse_from_str("2025-01-01", &self.export.date_format) {
            anyhow::bail!("Invalid date_format '{}': {}", self.export.date_format, e);
        }

        if let Err(e) =
            chrono::NaiveDateTime::parse_from_str("2025-01-01 12:00", &self.export.datetime_format)
        {
            anyhow::bail!("Invalid datetime_format '{}': {}", self.export.datetime_format, e);
        }

        Ok(())
    }

    /// Generate default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Self::default();
        let toml_content = toml::to_string_pretty(&config).context("Failed to serialize default config")?;

        // Add header comment
        let header = format!(
            "# Daylist Configuration File\n# Generated on {}\n\n",
            chrono::Local::now().format(datetime::EXPORT_DATE_FORMAT)
        );

        let full_content = header + &toml_content;

        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        std::fs::write(&path, full_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        println!("Generated default configuration file: {}", path.as_ref().display());
        Ok(())
    }

    /// Get the XDG config directory path
    pub fn get_xdg_config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("daylist"))
    }

    /// Get the default config file path
    pub fn get_default_config_path() -> Result<PathBuf> {
        Ok(Self::get_xdg_config_dir()?.join("config.toml"))
    }
}
