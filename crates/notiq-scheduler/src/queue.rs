//! The persistent notification queue — ordered soonest-first, durable.
//!
//! Owns every queued entry exclusively; constructed with an injected store
//! and loaded from it once, at construction.

use chrono::{DateTime, Utc};

use notiq_core::error::Result;

use crate::entry::Notification;
use crate::store::QueueStore;

/// An ordered, durable collection of notifications.
pub struct NotificationQueue {
    entries: Vec<Notification>,
    store: Box<dyn QueueStore>,
}

impl NotificationQueue {
    /// Open the queue, loading prior state from the store if any exists.
    pub fn open(store: Box<dyn QueueStore>) -> Self {
        let entries = match store.load() {
            Ok(Some(entries)) => {
                tracing::info!("📥 Loaded {} queued notifications", entries.len());
                entries
            }
            Ok(None) => {
                tracing::info!("No prior notification queue, starting empty");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to load notification queue: {e}");
                Vec::new()
            }
        };
        Self { entries, store }
    }

    /// Append or replace. An entry with the same identifier is overwritten
    /// in place (last write wins), keeping identifiers unique. Does not
    /// sort; call [`resort`](Self::resort) afterwards.
    pub fn push(&mut self, entry: Notification) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.identifier == entry.identifier)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Re-sort by next fire time and persist.
    pub fn resort(&mut self) -> Result<()> {
        self.resort_at(Utc::now())
    }

    /// Re-sort relative to an explicit instant and persist. Entries without
    /// a resolvable next fire sort last; among themselves they keep
    /// insertion order (stable sort).
    pub fn resort_at(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.entries
            .sort_by(|a, b| a.trigger.next_fire(now).order(&b.trigger.next_fire(now)));
        self.save()
    }

    /// Remove the entry with this identifier. No-op if absent.
    pub fn remove(&mut self, identifier: &str) -> bool {
        let len = self.entries.len();
        self.entries.retain(|e| e.identifier != identifier);
        self.entries.len() < len
    }

    /// Empty the queue. Caller persists separately.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the ordered entries.
    pub fn all(&self) -> Vec<Notification> {
        self.entries.clone()
    }

    /// Look up one entry by identifier.
    pub fn get(&self, identifier: &str) -> Option<&Notification> {
        self.entries.iter().find(|e| e.identifier == identifier)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the whole queue. Failures are returned, never swallowed.
    pub fn save(&self) -> Result<()> {
        self.store.save(&self.entries)
    }
}
