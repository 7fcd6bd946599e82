//! SQLite-backed queue store — survives restarts, transactional replace-all.
//! Same whole-collection granularity as the JSON store; a `meta` row
//! distinguishes "never saved" from "saved empty".

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use notiq_core::error::{NotiqError, Result};

use crate::entry::{Notification, NotificationContent, Trigger};
use crate::store::QueueStore;

/// SQLite queue store.
pub struct SqliteStore {
    // rusqlite connections are Send but not Sync; QueueStore needs both.
    conn: Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    /// Open or create the queue database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| NotiqError::Store(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    /// Run migrations to create tables.
    fn migrate(&self) -> Result<()> {
        self.lock()?
            .execute_batch(
                "
            -- The notification queue, one row per entry, position = sort order
            CREATE TABLE IF NOT EXISTS notification_queue (
                identifier TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                trigger TEXT NOT NULL,          -- JSON Trigger
                content TEXT NOT NULL           -- JSON NotificationContent
            );

            -- Store metadata (saved_at marks that a save has happened)
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
         ",
            )
            .map_err(|e| NotiqError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.conn
            .lock()
            .map_err(|_| NotiqError::Store("queue DB lock poisoned".into()))
    }
}

impl QueueStore for SqliteStore {
    fn save(&self, entries: &[Notification]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| NotiqError::Store(format!("Begin save: {e}")))?;
        tx.execute("DELETE FROM notification_queue", [])
            .map_err(|e| NotiqError::Store(format!("Clear queue: {e}")))?;
        for (position, entry) in entries.iter().enumerate() {
            tx.execute(
                "INSERT INTO notification_queue (identifier, position, trigger, content)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    entry.identifier,
                    position as i64,
                    serde_json::to_string(&entry.trigger)?,
                    serde_json::to_string(&entry.content)?,
                ],
            )
            .map_err(|e| NotiqError::Store(format!("Save '{}': {e}", entry.identifier)))?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('saved_at', ?1)",
            [Utc::now().to_rfc3339()],
        )
        .map_err(|e| NotiqError::Store(format!("Mark saved: {e}")))?;
        tx.commit()
            .map_err(|e| NotiqError::Store(format!("Commit save: {e}")))?;
        tracing::debug!("💾 Saved {} notifications to queue DB", entries.len());
        Ok(())
    }

    fn load(&self) -> Result<Option<Vec<Notification>>> {
        let conn = self.lock()?;
        let saved: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM meta WHERE key = 'saved_at'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n > 0)
            .map_err(|e| NotiqError::Store(format!("Read meta: {e}")))?;
        if !saved {
            return Ok(None);
        }

        let mut stmt = conn
            .prepare(
                "SELECT identifier, trigger, content FROM notification_queue ORDER BY position",
            )
            .map_err(|e| NotiqError::Store(format!("Load queue: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| NotiqError::Store(format!("Load queue: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            let (identifier, trigger_json, content_json) =
                row.map_err(|e| NotiqError::Store(format!("Load row: {e}")))?;
            let trigger: Trigger = serde_json::from_str(&trigger_json)?;
            let content: NotificationContent = serde_json::from_str(&content_json)?;
            entries.push(Notification {
                identifier,
                trigger,
                content,
            });
        }
        Ok(Some(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_db(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).ok();
        dir.join("queue.db")
    }

    #[test]
    fn never_saved_is_no_prior_state() {
        let path = temp_db("notiq-test-sqlite-fresh");
        let store = SqliteStore::open(&path).unwrap();
        assert!(store.load().unwrap().is_none());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn saved_empty_is_some_empty() {
        let path = temp_db("notiq-test-sqlite-empty");
        let store = SqliteStore::open(&path).unwrap();
        store.save(&[]).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, Some(vec![]));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn save_replaces_whole_queue_in_order() {
        let path = temp_db("notiq-test-sqlite-replace");
        let store = SqliteStore::open(&path).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 6, 5, 9, 0, 0).unwrap();
        store
            .save(&[
                Notification::one_shot("a", "A", "a", at),
                Notification::one_shot("b", "B", "b", at),
            ])
            .unwrap();
        store
            .save(&[Notification::one_shot("c", "C", "c", at)])
            .unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].identifier, "c");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn reopen_sees_saved_entries() {
        let path = temp_db("notiq-test-sqlite-reopen");
        let at = Utc.with_ymd_and_hms(2026, 6, 5, 9, 0, 0).unwrap();
        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .save(&[Notification::one_shot("keep", "K", "k", at)])
                .unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].identifier, "keep");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
