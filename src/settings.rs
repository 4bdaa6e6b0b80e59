//! User-facing settings.
//!
//! A small key-value store persisted as a toml file, read as a reactive
//! stream: subscribers get the current value immediately and every update
//! afterwards via a `tokio::sync::watch` channel.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Persisted settings with their stated defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub dark_theme: bool,
    pub sort_ascending: bool,
    pub auto_backup_enabled: bool,
    /// Epoch millis of the last successful backup, if any.
    pub last_backup_at: Option<i64>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_theme: false,
            sort_ascending: true,
            auto_backup_enabled: false,
            last_backup_at: None,
        }
    }
}

/// Settings store bound to a toml file on disk.
pub struct SettingsStore {
    path: PathBuf,
    tx: watch::Sender<UserSettings>,
}

impl SettingsStore {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing. A malformed file is an error, not silently replaced.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let settings = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {}", path.display()))?
        } else {
            UserSettings::default()
        };

        let (tx, _) = watch::channel(settings);
        Ok(Self { path, tx })
    }

    /// Current settings snapshot.
    pub fn current(&self) -> UserSettings {
        self.tx.borrow().clone()
    }

    /// Reactive stream of settings values. The receiver observes the current
    /// value immediately and is notified on every update.
    pub fn subscribe(&self) -> watch::Receiver<UserSettings> {
        self.tx.subscribe()
    }

    /// Apply a mutation, persist it, then publish to subscribers.
    pub fn update<F>(&self, mutate: F) -> Result<UserSettings>
    where
        F: FnOnce(&mut UserSettings),
    {
        let mut settings = self.current();
        mutate(&mut settings);
        self.persist(&settings)?;
        self.tx.send_replace(settings.clone());
        Ok(settings)
    }

    fn persist(&self, settings: &UserSettings) -> Result<()> {
        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {}", parent.display()))?;
        }
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file: {}", self.path.display()))?;
        Ok(())
    }

    /// Default settings file path under the XDG config directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
            .map(|dir| dir.join("daylist").join("settings.toml"))
    }
}
