//! notiq configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NotiqError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotiqConfig {
    /// How many notifications are kept live on the host at once.
    /// The host refuses more than 64; the default leaves headroom.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Directory holding the persisted notification queue.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
    /// Which queue store backend to use.
    #[serde(default)]
    pub backend: QueueBackend,
    /// Seconds between background reconcile passes.
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

/// Queue store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QueueBackend {
    /// JSON file under `store_dir` — human-readable, git-friendly.
    #[default]
    Json,
    /// SQLite database under `store_dir`.
    Sqlite,
}

fn default_window() -> usize {
    60
}

fn default_store_dir() -> PathBuf {
    NotiqConfig::home_dir().join("queue")
}

fn default_reconcile_interval() -> u64 {
    300
}

impl Default for NotiqConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            store_dir: default_store_dir(),
            backend: QueueBackend::default(),
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

impl NotiqConfig {
    /// Load config from the default path (~/.notiq/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NotiqError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| NotiqError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| NotiqError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the notiq home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".notiq")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NotiqConfig::default();
        assert_eq!(config.window, 60);
        assert_eq!(config.backend, QueueBackend::Json);
        assert_eq!(config.reconcile_interval_secs, 300);
    }

    #[test]
    fn parse_partial_toml() {
        let config: NotiqConfig = toml::from_str("window = 30\nbackend = \"sqlite\"").unwrap();
        assert_eq!(config.window, 30);
        assert_eq!(config.backend, QueueBackend::Sqlite);
        assert_eq!(config.reconcile_interval_secs, 300);
    }
}
