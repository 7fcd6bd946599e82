//! File-based queue store — lightweight persistence.
//! The queue saved as one JSON file — human-readable, git-friendly.
//! Whole-collection granularity: only written when the queue changes.

use std::path::{Path, PathBuf};

use notiq_core::error::{NotiqError, Result};

use crate::entry::Notification;

/// Whole-queue durable storage.
///
/// `load` returning `Ok(None)` means "no prior state", which is distinct
/// from a previously saved empty queue.
pub trait QueueStore: Send + Sync {
    fn save(&self, entries: &[Notification]) -> Result<()>;
    fn load(&self) -> Result<Option<Vec<Notification>>>;
}

/// JSON file queue store.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a new file store under the given directory.
    pub fn new(dir: &Path) -> Self {
        std::fs::create_dir_all(dir).ok();
        Self {
            path: dir.to_path_buf(),
        }
    }

    /// Default store path (~/.notiq/queue).
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".notiq").join("queue")
    }

    fn file(&self) -> PathBuf {
        self.path.join("queue.json")
    }
}

impl QueueStore for FileStore {
    fn save(&self, entries: &[Notification]) -> Result<()> {
        let file = self.file();
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&file, &json)
            .map_err(|e| NotiqError::Store(format!("Write {}: {e}", file.display())))?;
        tracing::debug!("💾 Saved {} notifications to {}", entries.len(), file.display());
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<Notification>>> {
        let file = self.file();
        if !file.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&file)
            .map_err(|e| NotiqError::Store(format!("Read {}: {e}", file.display())))?;
        match serde_json::from_str(&json) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                // A corrupt archive degrades to "no prior state" rather than
                // wedging startup.
                tracing::warn!("⚠️ Failed to parse {}: {e}", file.display());
                Ok(None)
            }
        }
    }
}
