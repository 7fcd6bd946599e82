//! Recurrence granularity and next-fire-time computation.
//!
//! A recurrence keeps only some calendar fields of its anchor date
//! significant: weekly repeats on the anchor's weekday at its hour/minute,
//! monthly on the anchor's day-of-month, and so on. Everything here is pure —
//! callers pass the reference instant in.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// How often a notification repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    /// Every minute at the anchor's second.
    Minute,
    /// Every hour at the anchor's minute.
    Hourly,
    /// Every day at the anchor's hour and minute.
    Daily,
    /// Every week on the anchor's weekday at its hour and minute.
    Weekly,
    /// Every month on the anchor's day-of-month at its hour and minute.
    /// Months without that day are skipped.
    Monthly,
    /// Every year on the anchor's month and day at its hour and minute.
    Yearly,
}

/// Compute the first occurrence of `every` strictly after `after`, anchored
/// at `anchor`. Only the fields significant for the granularity are read from
/// the anchor — its date part does not bound the result, so a daily 09:00
/// anchor dated next month still fires tomorrow at 09:00.
pub fn next_occurrence(
    anchor: DateTime<Utc>,
    every: Recurrence,
    after: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match every {
        Recurrence::Minute => {
            let mut candidate = after.with_nanosecond(0)?.with_second(anchor.second())?;
            if candidate <= after {
                candidate += Duration::minutes(1);
            }
            Some(candidate)
        }
        Recurrence::Hourly => {
            let mut candidate = after
                .with_nanosecond(0)?
                .with_second(0)?
                .with_minute(anchor.minute())?;
            if candidate <= after {
                candidate += Duration::hours(1);
            }
            Some(candidate)
        }
        Recurrence::Daily => {
            let mut candidate = at_anchor_time(anchor, after)?;
            if candidate <= after {
                candidate += Duration::days(1);
            }
            Some(candidate)
        }
        Recurrence::Weekly => {
            let mut candidate = at_anchor_time(anchor, after)?;
            // At most 8 steps: today may match on weekday but not on time.
            for _ in 0..8 {
                if candidate > after && candidate.weekday() == anchor.weekday() {
                    return Some(candidate);
                }
                candidate += Duration::days(1);
            }
            None
        }
        Recurrence::Monthly => {
            // Walk forward month by month; months lacking the anchor's day
            // (e.g. day 31 in February) simply don't match.
            for offset in 0..48u32 {
                let months = after.month0() + offset;
                let year = after.year() + (months / 12) as i32;
                let month = months % 12 + 1;
                let Some(date) = NaiveDate::from_ymd_opt(year, month, anchor.day()) else {
                    continue;
                };
                let Some(candidate) = date.and_hms_opt(anchor.hour(), anchor.minute(), 0) else {
                    continue;
                };
                let candidate = candidate.and_utc();
                if candidate > after {
                    return Some(candidate);
                }
            }
            None
        }
        Recurrence::Yearly => {
            // 8 years covers the longest gap between Feb 29 anchors.
            for offset in 0..8i32 {
                let year = after.year() + offset;
                let Some(date) = NaiveDate::from_ymd_opt(year, anchor.month(), anchor.day()) else {
                    continue;
                };
                let Some(candidate) = date.and_hms_opt(anchor.hour(), anchor.minute(), 0) else {
                    continue;
                };
                let candidate = candidate.and_utc();
                if candidate > after {
                    return Some(candidate);
                }
            }
            None
        }
    }
}

/// `after`'s date with the anchor's hour and minute, seconds zeroed.
fn at_anchor_time(anchor: DateTime<Utc>, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    after
        .with_nanosecond(0)?
        .with_second(0)?
        .with_minute(anchor.minute())?
        .with_hour(anchor.hour())
}
