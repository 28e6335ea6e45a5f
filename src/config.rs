//! Configuration handling for the response watcher

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sync::SESSION_KEY;

/// Overrides the data directory from the config file
pub const DATA_DIR_ENV: &str = "STEPFORM_DATA_DIR";

const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the durable store
    pub data_dir: Option<PathBuf>,
    /// How often the store directory is polled for external changes
    pub poll_interval_ms: Option<u64>,
    /// Key of the builder session snapshot
    pub session_key: Option<String>,
}

impl AppConfig {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("io", "stepform", "stepform")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Store directory: environment, then config file, then the platform data dir
    pub fn data_dir(&self) -> Result<PathBuf> {
        let from_env = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
        self.resolve_data_dir(from_env)
    }

    fn resolve_data_dir(&self, from_env: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(dir) = from_env.or_else(|| self.data_dir.clone()) {
            return Ok(dir);
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .context("No home directory to place the data directory in")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn session_key(&self) -> &str {
        self.session_key.as_deref().unwrap_or(SESSION_KEY)
    }
}
