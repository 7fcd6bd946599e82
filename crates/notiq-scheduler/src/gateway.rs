//! Host notification-center gateway — the interface the reconciler drives.
//!
//! The host is an external, eventually-consistent service: its pending set
//! may have drifted from the queue (fired one-shots disappear, other code
//! may cancel things). All calls are async completion-driven; `cancel` and
//! `cancel_all` are best-effort fire-and-forget.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notiq_core::error::Result;

use crate::entry::Notification;

/// One pending request as reported by the host. The host computes its own
/// next fire time, which may be stale or absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingNotification {
    pub identifier: String,
    pub next_fire: Option<DateTime<Utc>>,
}

/// An actionable notification category, registered host-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCategory {
    pub identifier: String,
    pub actions: Vec<CategoryAction>,
}

/// One action button on a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAction {
    pub identifier: String,
    pub title: String,
}

/// The host OS notification center, seen from the scheduler.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// Point-in-time snapshot of everything currently pending. A reconcile
    /// pass takes exactly one snapshot and decides against it.
    async fn pending(&self) -> Result<Vec<PendingNotification>>;

    /// Submit one notification. May fail (e.g. permission revoked).
    async fn schedule(&self, notification: &Notification) -> Result<()>;

    /// Cancel pending requests by identifier. Best effort; unknown
    /// identifiers are ignored by the host.
    async fn cancel(&self, identifiers: &[String]);

    /// Remove everything pending.
    async fn cancel_all(&self);

    /// Replace the host's registered category set.
    async fn set_categories(&self, categories: &[NotificationCategory]) -> Result<()>;

    /// Count of currently pending requests.
    async fn pending_count(&self) -> Result<usize> {
        Ok(self.pending().await?.len())
    }
}
