//! Notification scheduler — the orchestration facade.
//!
//! Ties the durable queue, the planning pass, and the host gateway together.
//! Methods take `&mut self`, so two passes can never interleave; shared use
//! goes through `Arc<Mutex<NotificationScheduler>>` and [`spawn_reconciler`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use notiq_core::config::{NotiqConfig, QueueBackend};
use notiq_core::error::{NotiqError, Result};

use crate::entry::Notification;
use crate::gateway::{NotificationCategory, NotificationGateway};
use crate::persistence::SqliteStore;
use crate::queue::NotificationQueue;
use crate::reconcile::{self, DEFAULT_WINDOW, MAX_PENDING, ReconcileOp};
use crate::recur::Recurrence;
use crate::store::{FileStore, QueueStore};

/// What one reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Successfully submitted to the host.
    pub scheduled: usize,
    /// Evicted to make room.
    pub cancelled: usize,
    /// Submissions the gateway rejected.
    pub failed: usize,
}

/// The scheduling facade over queue, planner, and gateway.
pub struct NotificationScheduler {
    queue: NotificationQueue,
    gateway: Arc<dyn NotificationGateway>,
    window: usize,
    /// Identifiers believed live on the host. Rebuilt from the snapshot on
    /// every pass; flipped only after successful gateway calls.
    scheduled: HashSet<String>,
}

impl NotificationScheduler {
    /// Create a scheduler over an already-open queue.
    pub fn new(
        queue: NotificationQueue,
        gateway: Arc<dyn NotificationGateway>,
        window: usize,
    ) -> Self {
        Self {
            queue,
            gateway,
            window: window.min(MAX_PENDING),
            scheduled: HashSet::new(),
        }
    }

    /// Create a scheduler with the default window.
    pub fn with_defaults(queue: NotificationQueue, gateway: Arc<dyn NotificationGateway>) -> Self {
        Self::new(queue, gateway, DEFAULT_WINDOW)
    }

    /// Create a scheduler from config, opening the configured store backend.
    pub fn with_config(config: &NotiqConfig, gateway: Arc<dyn NotificationGateway>) -> Result<Self> {
        let store: Box<dyn QueueStore> = match config.backend {
            QueueBackend::Json => Box::new(FileStore::new(&config.store_dir)),
            QueueBackend::Sqlite => Box::new(SqliteStore::open(&config.store_dir.join("queue.db"))?),
        };
        Ok(Self::new(
            NotificationQueue::open(store),
            gateway,
            config.window,
        ))
    }

    /// Enqueue one notification and persist. Never talks to the gateway;
    /// submission happens on the next reconcile pass.
    pub fn schedule(&mut self, notification: Notification) -> Result<()> {
        tracing::info!("📅 Queued notification '{}'", notification.identifier);
        self.queue.push(notification);
        self.queue.resort()
    }

    /// Expand a fixed-interval repetition between two instants into sibling
    /// entries, ⌈(to − from) / interval⌉ of them, each individually
    /// cancellable. Sibling k ≥ 1 derives its identifier by appending k.
    /// With `every` set, each sibling also repeats at that granularity.
    pub fn schedule_repeating_range(
        &mut self,
        identifier: &str,
        title: &str,
        body: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval: Duration,
        every: Option<Recurrence>,
    ) -> Result<Vec<String>> {
        let span = (to - from).num_seconds();
        let step = interval.num_seconds();
        if span <= 0 {
            return Err(NotiqError::Schedule(format!(
                "empty range: {from} .. {to}"
            )));
        }
        if step <= 0 {
            return Err(NotiqError::Schedule("interval must be positive".into()));
        }

        let count = (span as u64).div_ceil(step as u64) as usize;
        let mut identifiers = Vec::with_capacity(count);
        for k in 0..count {
            let id = if k == 0 {
                identifier.to_string()
            } else {
                format!("{identifier}{k}")
            };
            let at = from + interval * (k as i32);
            let notification = match every {
                Some(every) => Notification::repeating(&id, title, body, at, every),
                None => Notification::one_shot(&id, title, body, at),
            };
            self.queue.push(notification);
            identifiers.push(id);
        }
        tracing::info!(
            "📅 Queued {count} repeating notifications under '{identifier}'"
        );
        self.queue.resort()?;
        Ok(identifiers)
    }

    /// Cancel one notification: host-side if live, then queue-side.
    pub async fn cancel(&mut self, identifier: &str) -> Result<()> {
        if self.scheduled.remove(identifier) {
            let ids = [identifier.to_string()];
            self.gateway.cancel(&ids).await;
        }
        self.queue.remove(identifier);
        self.queue.save()
    }

    /// Cancel everything, host-side and queue-side.
    pub async fn cancel_all(&mut self) -> Result<()> {
        self.gateway.cancel_all().await;
        self.queue.clear();
        self.scheduled.clear();
        tracing::info!("🧹 Cancelled all notifications");
        self.queue.save()
    }

    /// Run one reconcile pass: snapshot the host, plan against the sorted
    /// queue, execute best-effort, persist.
    pub async fn reconcile_all(&mut self) -> Result<ReconcileSummary> {
        self.reconcile_at(Utc::now()).await
    }

    pub(crate) async fn reconcile_at(&mut self, now: DateTime<Utc>) -> Result<ReconcileSummary> {
        // One snapshot per pass; every decision below is made against it.
        let pending = self.gateway.pending().await?;
        self.queue.resort_at(now)?;
        let entries = self.queue.all();
        let plan = reconcile::plan(&entries, &pending, self.window, now);

        self.scheduled = pending.iter().map(|p| p.identifier.clone()).collect();

        let mut summary = ReconcileSummary::default();
        for op in &plan.ops {
            match op {
                ReconcileOp::Cancel(id) => {
                    self.gateway.cancel(std::slice::from_ref(id)).await;
                    self.scheduled.remove(id);
                    summary.cancelled += 1;
                }
                ReconcileOp::Schedule(id) => {
                    let Some(entry) = entries.iter().find(|n| n.identifier == *id) else {
                        continue;
                    };
                    match self.gateway.schedule(entry).await {
                        Ok(()) => {
                            self.scheduled.insert(id.clone());
                            summary.scheduled += 1;
                        }
                        Err(e) => {
                            // Best effort: the next pass converges further.
                            tracing::warn!("⚠️ Failed to schedule '{id}': {e}");
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        self.queue.save()?;
        tracing::info!(
            "🔄 Reconcile pass: {} scheduled, {} cancelled, {} failed, {} queued",
            summary.scheduled,
            summary.cancelled,
            summary.failed,
            self.queue.len()
        );
        Ok(summary)
    }

    /// Snapshot of the queued notifications, soonest first.
    pub fn queued(&self) -> Vec<Notification> {
        self.queue.all()
    }

    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// How many notifications the host currently holds pending.
    pub async fn scheduled_count(&self) -> Result<usize> {
        self.gateway.pending_count().await
    }

    /// Whether this identifier was live on the host as of the last pass.
    pub fn is_scheduled(&self, identifier: &str) -> bool {
        self.scheduled.contains(identifier)
    }

    /// Register actionable categories with the host.
    pub async fn register_categories(&self, categories: &[NotificationCategory]) -> Result<()> {
        self.gateway.set_categories(categories).await
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

/// Spawn the periodic reconcile loop as a background tokio task body.
/// Manual [`NotificationScheduler::reconcile_all`] calls and this loop
/// contend on the same mutex, so passes never overlap.
pub async fn spawn_reconciler(
    scheduler: Arc<Mutex<NotificationScheduler>>,
    check_interval_secs: u64,
) {
    tracing::info!("⏰ Reconciler started (every {check_interval_secs}s)");

    let mut interval = tokio::time::interval(std::time::Duration::from_secs(check_interval_secs));

    loop {
        interval.tick().await;

        let result = {
            let mut scheduler = scheduler.lock().await;
            scheduler.reconcile_all().await
        };
        if let Err(e) = result {
            tracing::warn!("⚠️ Reconcile pass failed: {e}");
        }
    }
}
