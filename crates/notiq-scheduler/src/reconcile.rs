//! Bounded-window reconciliation — the planning half of the scheduler.
//!
//! The host holds at most [`MAX_PENDING`] notifications; the queue is
//! unbounded. A pass diffs the desired top-of-queue against one pending
//! snapshot and plans the minimal schedule/cancel sequence that keeps the
//! soonest entries live. The queue is authoritative for what is desired and
//! in which order; the snapshot is authoritative for what is actually live.
//!
//! Planning is pure; the facade in [`crate::scheduler`] executes plans
//! best-effort against the gateway.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::entry::Notification;
use crate::gateway::PendingNotification;

/// Hard host ceiling on concurrently scheduled notifications.
pub const MAX_PENDING: usize = 64;

/// Default window, kept below the ceiling for headroom.
pub const DEFAULT_WINDOW: usize = 60;

/// One gateway operation in a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOp {
    /// Cancel the pending request with this identifier.
    Cancel(String),
    /// Schedule the queued notification with this identifier.
    Schedule(String),
}

/// An ordered operation sequence. Cancels that make room for a schedule
/// immediately precede it.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    pub ops: Vec<ReconcileOp>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn schedules(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, ReconcileOp::Schedule(_)))
            .count()
    }

    pub fn cancels(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, ReconcileOp::Cancel(_)))
            .count()
    }
}

/// Plan one reconcile pass.
///
/// `queue` is the sorted queue view (soonest first); `pending` is the host
/// snapshot; `window` bounds how many notifications may be live at once.
/// Running the resulting plan and planning again with no intervening
/// mutation yields an empty plan.
pub fn plan(
    queue: &[Notification],
    pending: &[PendingNotification],
    window: usize,
    now: DateTime<Utc>,
) -> ReconcilePlan {
    // Desired: the first `window` entries that still resolve to something
    // schedulable. Expired one-shots stay queued but are never (re)submitted.
    let candidates: Vec<&Notification> = queue
        .iter()
        .filter(|n| n.trigger.next_fire(now).is_schedulable())
        .take(window)
        .collect();
    let candidate_ids: HashSet<&str> = candidates.iter().map(|n| n.identifier.as_str()).collect();
    let pending_ids: HashSet<&str> = pending.iter().map(|p| p.identifier.as_str()).collect();

    // Pending requests that are no longer among the desired top-window are
    // eviction candidates. Sorted by the host's own next fire time with
    // unresolvable ones last, consumed from the back: unresolvable first,
    // then latest-firing first.
    let mut evictable: Vec<&PendingNotification> = pending
        .iter()
        .filter(|p| !candidate_ids.contains(p.identifier.as_str()))
        .collect();
    evictable.sort_by(|a, b| match (a.next_fire, b.next_fire) {
        (Some(ta), Some(tb)) => ta.cmp(&tb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut ops = Vec::new();
    // Running live count, seeded from the snapshot; only ever incremented.
    let mut live = pending.len();

    for candidate in &candidates {
        if pending_ids.contains(candidate.identifier.as_str()) {
            // Already live and still desired; never re-submitted.
            continue;
        }
        if live < window {
            ops.push(ReconcileOp::Schedule(candidate.identifier.clone()));
            live += 1;
        } else {
            // Window full: replace one no-longer-desired request, or stop if
            // everything live is still desired.
            let Some(victim) = evictable.pop() else {
                break;
            };
            ops.push(ReconcileOp::Cancel(victim.identifier.clone()));
            ops.push(ReconcileOp::Schedule(candidate.identifier.clone()));
        }
    }

    ReconcilePlan { ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Region;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 5, 12, 0, 0).unwrap()
    }

    fn entry(id: &str, minutes_ahead: i64) -> Notification {
        Notification::one_shot(id, "T", "B", now() + Duration::minutes(minutes_ahead))
    }

    fn pending(id: &str, minutes_ahead: i64) -> PendingNotification {
        PendingNotification {
            identifier: id.to_string(),
            next_fire: Some(now() + Duration::minutes(minutes_ahead)),
        }
    }

    /// Run a plan against a simulated pending set, mirroring what the
    /// executor does, so idempotence can be checked end to end.
    fn apply(plan: &ReconcilePlan, queue: &[Notification], pending: &mut Vec<PendingNotification>) {
        for op in &plan.ops {
            match op {
                ReconcileOp::Cancel(id) => pending.retain(|p| p.identifier != *id),
                ReconcileOp::Schedule(id) => {
                    let n = queue.iter().find(|n| n.identifier == *id).unwrap();
                    pending.push(PendingNotification {
                        identifier: n.identifier.clone(),
                        next_fire: n.trigger.next_fire(now()).at(),
                    });
                }
            }
        }
    }

    #[test]
    fn empty_pending_schedules_window_soonest_only() {
        // 65 queued, window 60: exactly 60 schedules, zero cancels, and they
        // are the 60 soonest.
        let queue: Vec<Notification> = (0..65).map(|i| entry(&format!("n{i}"), i + 1)).collect();
        let plan = plan(&queue, &[], 60, now());
        assert_eq!(plan.schedules(), 60);
        assert_eq!(plan.cancels(), 0);
        let scheduled: HashSet<String> = plan
            .ops
            .iter()
            .map(|op| match op {
                ReconcileOp::Schedule(id) => id.clone(),
                ReconcileOp::Cancel(id) => panic!("unexpected cancel of {id}"),
            })
            .collect();
        for i in 0..60 {
            assert!(scheduled.contains(&format!("n{i}")));
        }
        for i in 60..65 {
            assert!(!scheduled.contains(&format!("n{i}")));
        }
    }

    #[test]
    fn full_window_evicts_one_per_new_candidate() {
        // 60 pending; the queue lost one of them and gained a sooner entry:
        // exactly one cancel (the now-excluded request) and one schedule.
        let mut queue: Vec<Notification> =
            (0..59).map(|i| entry(&format!("n{i}"), 10 + i)).collect();
        queue.insert(0, entry("sooner", 1));
        let os_pending: Vec<PendingNotification> =
            (0..60).map(|i| pending(&format!("n{i}"), 10 + i)).collect();

        let plan = plan(&queue, &os_pending, 60, now());
        assert_eq!(
            plan.ops,
            vec![
                ReconcileOp::Cancel("n59".into()),
                ReconcileOp::Schedule("sooner".into()),
            ]
        );
    }

    #[test]
    fn eviction_prefers_unresolvable_then_latest() {
        let queue = vec![entry("a", 1), entry("b", 2)];
        let os_pending = vec![
            pending("old-early", 5),
            pending("old-late", 50),
            PendingNotification {
                identifier: "old-ghost".into(),
                next_fire: None,
            },
        ];
        // Window 3 is already full; both candidates are new.
        let plan = plan(&queue, &os_pending, 3, now());
        assert_eq!(
            plan.ops,
            vec![
                ReconcileOp::Cancel("old-ghost".into()),
                ReconcileOp::Schedule("a".into()),
                ReconcileOp::Cancel("old-late".into()),
                ReconcileOp::Schedule("b".into()),
            ]
        );
    }

    #[test]
    fn already_pending_candidates_are_untouched() {
        let queue = vec![entry("a", 1), entry("b", 2), entry("c", 3)];
        let os_pending = vec![pending("a", 1), pending("b", 2)];
        let plan = plan(&queue, &os_pending, 60, now());
        assert_eq!(plan.ops, vec![ReconcileOp::Schedule("c".into())]);
    }

    #[test]
    fn expired_one_shots_are_not_candidates() {
        let queue = vec![
            entry("future", 5),
            entry("fired", -5),
            Notification::region("geo", "G", "g", Region::new(0.0, 0.0, 50.0)),
        ];
        let plan = plan(&queue, &[], 60, now());
        assert_eq!(
            plan.ops,
            vec![
                ReconcileOp::Schedule("future".into()),
                ReconcileOp::Schedule("geo".into()),
            ]
        );
    }

    #[test]
    fn pass_is_idempotent() {
        let queue: Vec<Notification> = (0..70).map(|i| entry(&format!("n{i}"), i + 1)).collect();
        let mut os_pending = vec![pending("stale-1", 90), pending("stale-2", 95)];

        let first = plan(&queue, &os_pending, 60, now());
        assert!(!first.is_empty());
        apply(&first, &queue, &mut os_pending);
        assert!(os_pending.len() <= 60);

        let second = plan(&queue, &os_pending, 60, now());
        assert!(second.is_empty());
    }

    #[test]
    fn pending_never_exceeds_window() {
        for queue_len in [0usize, 1, 59, 60, 61, 100] {
            let queue: Vec<Notification> = (0..queue_len)
                .map(|i| entry(&format!("n{i}"), i as i64 + 1))
                .collect();
            let mut os_pending: Vec<PendingNotification> =
                (0..30).map(|i| pending(&format!("old{i}"), 200 + i)).collect();
            let plan = plan(&queue, &os_pending, 60, now());
            apply(&plan, &queue, &mut os_pending);
            assert!(os_pending.len() <= 60, "queue_len={queue_len}");
        }
    }

    #[test]
    fn small_window_keeps_soonest() {
        let queue = vec![entry("a", 1), entry("b", 2), entry("c", 3)];
        let os_pending = vec![pending("c", 3)];
        // Window 2: a and b are desired; c must make room for one of them.
        let plan = plan(&queue, &os_pending, 2, now());
        assert_eq!(
            plan.ops,
            vec![
                ReconcileOp::Schedule("a".into()),
                ReconcileOp::Cancel("c".into()),
                ReconcileOp::Schedule("b".into()),
            ]
        );
    }

    #[test]
    fn stale_pending_left_alone_when_room_remains() {
        // A request the host still holds but the queue no longer wants is
        // only evicted when its slot is needed.
        let queue = vec![entry("a", 1)];
        let os_pending = vec![pending("a", 1), pending("stale", 30)];
        let plan = plan(&queue, &os_pending, 60, now());
        assert!(plan.is_empty());
    }
}
