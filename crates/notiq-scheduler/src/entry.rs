//! Notification definitions — the core data model for queued notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::recur::{Recurrence, next_occurrence};

/// One desired notification: a stable identifier, a trigger, and the content
/// delivered when it fires. Values are immutable once queued; scheduled
/// status lives in the scheduler, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique within the queue; correlates queue entries with the host's
    /// pending requests.
    pub identifier: String,
    /// When/how to fire.
    pub trigger: Trigger,
    /// What to show. Opaque to the reconciler.
    pub content: NotificationContent,
}

/// Displayed payload of a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Sound file name; None plays the host default.
    #[serde(default)]
    pub sound: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Category identifier, see [`crate::gateway::NotificationCategory`].
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub launch_image: Option<String>,
}

/// Media attached to a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub identifier: String,
    pub url: String,
}

/// When/how a notification triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Trigger {
    /// Fire once at a specific time.
    OneShot { at: DateTime<Utc> },
    /// Fire repeatedly; `at` anchors the significant calendar fields.
    Recurring { at: DateTime<Utc>, every: Recurrence },
    /// Fire when the device crosses a geofence boundary.
    Region { region: Region },
}

/// A circular geofence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    #[serde(default = "bool_true")]
    pub notify_on_entry: bool,
    #[serde(default)]
    pub notify_on_exit: bool,
}

fn bool_true() -> bool {
    true
}

impl Region {
    /// Entry-triggered region, the common case.
    pub fn new(latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius_meters,
            notify_on_entry: true,
            notify_on_exit: false,
        }
    }
}

/// The resolved "next fire" of a trigger at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextFire {
    /// Fires at a concrete time.
    At(DateTime<Utc>),
    /// Will fire on an external event (region crossing); no computable time.
    Eventual,
    /// A one-shot whose time has passed. Not schedulable again.
    Expired,
}

impl NextFire {
    /// Whether this trigger should still be handed to the host.
    pub fn is_schedulable(&self) -> bool {
        !matches!(self, NextFire::Expired)
    }

    /// The concrete fire time, if there is one.
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            NextFire::At(t) => Some(*t),
            _ => None,
        }
    }

    /// Queue ordering: concrete times sort ascending and always before
    /// anything without one; entries without a resolvable time are mutual
    /// ties and sort last.
    pub fn order(&self, other: &NextFire) -> Ordering {
        match (self, other) {
            (NextFire::At(a), NextFire::At(b)) => a.cmp(b),
            (NextFire::At(_), _) => Ordering::Less,
            (_, NextFire::At(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl Trigger {
    /// Resolve the next fire relative to `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> NextFire {
        match self {
            Trigger::OneShot { at } => {
                if *at > now {
                    NextFire::At(*at)
                } else {
                    NextFire::Expired
                }
            }
            Trigger::Recurring { at, every } => match next_occurrence(*at, *every, now) {
                Some(t) => NextFire::At(t),
                None => NextFire::Expired,
            },
            Trigger::Region { .. } => NextFire::Eventual,
        }
    }
}

impl Notification {
    /// A notification fired once at `at`.
    pub fn one_shot(identifier: &str, title: &str, body: &str, at: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.to_string(),
            trigger: Trigger::OneShot { at },
            content: NotificationContent::new(title, body),
        }
    }

    /// A repeating notification anchored at `at`.
    pub fn repeating(
        identifier: &str,
        title: &str,
        body: &str,
        at: DateTime<Utc>,
        every: Recurrence,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            trigger: Trigger::Recurring { at, every },
            content: NotificationContent::new(title, body),
        }
    }

    /// A geofence-triggered notification.
    pub fn region(identifier: &str, title: &str, body: &str, region: Region) -> Self {
        Self {
            identifier: identifier.to_string(),
            trigger: Trigger::Region { region },
            content: NotificationContent::new(title, body),
        }
    }

    pub fn with_sound(mut self, sound: &str) -> Self {
        self.content.sound = Some(sound.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.content.category = Some(category.to_string());
        self
    }

    pub fn with_attachment(mut self, identifier: &str, url: &str) -> Self {
        self.content.attachments.push(Attachment {
            identifier: identifier.to_string(),
            url: url.to_string(),
        });
        self
    }

    pub fn with_launch_image(mut self, name: &str) -> Self {
        self.content.launch_image = Some(name.to_string());
        self
    }
}

impl NotificationContent {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: body.to_string(),
            sound: None,
            attachments: Vec::new(),
            category: None,
            launch_image: None,
        }
    }
}

// Notifications compare equal by identifier alone.
impl PartialEq for Notification {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for Notification {}
