//! # notiq scheduler
//!
//! Bounded-window local-notification scheduling: queue as many reminders as
//! you like, keep the host OS's capped pending set synced to the soonest ones.
//!
//! ## Design
//! - Durable queue — JSON file or SQLite, survives restarts
//! - Host gateway behind an async trait — the reconciler never talks to the
//!   OS directly
//! - One reconcile pass = one pending snapshot + a minimal schedule/cancel plan
//! - Tokio interval loop for periodic passes — zero overhead when idle
//!
//! ## Architecture
//! ```text
//! NotificationScheduler
//!   ├── NotificationQueue (sorted soonest-first, QueueStore-backed)
//!   │     ├── FileStore:   queue.json
//!   │     └── SqliteStore: queue.db
//!   ├── reconcile::plan — diff queue vs pending, bounded by the window
//!   └── NotificationGateway (host notification center)
//!         ├── pending() → point-in-time snapshot
//!         ├── schedule() / cancel() / cancel_all()
//!         └── set_categories()
//! ```

pub mod entry;
pub mod gateway;
pub mod persistence;
pub mod queue;
pub mod reconcile;
pub mod recur;
pub mod scheduler;
pub mod store;

pub use entry::{Attachment, NextFire, Notification, NotificationContent, Region, Trigger};
pub use gateway::{CategoryAction, NotificationCategory, NotificationGateway, PendingNotification};
pub use persistence::SqliteStore;
pub use queue::NotificationQueue;
pub use reconcile::{DEFAULT_WINDOW, MAX_PENDING, ReconcileOp, ReconcilePlan};
pub use recur::Recurrence;
pub use scheduler::{NotificationScheduler, ReconcileSummary, spawn_reconciler};
pub use store::{FileStore, QueueStore};
