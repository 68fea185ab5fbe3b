use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta, Timelike};

use crate::constants::BOUNDARY_MINUTE;
use crate::error::ExportError;

/// Smallest `hh:01:00` instant strictly after `now`.
///
/// A `now` exactly on the boundary schedules the following hour, so waking
/// precisely at `hh:01:00` never exports the same boundary twice.
pub fn next_boundary(now: NaiveDateTime) -> Option<NaiveDateTime> {
    let candidate = now.date().and_hms_opt(now.hour(), BOUNDARY_MINUTE, 0)?;
    if now >= candidate {
        candidate.checked_add_signed(TimeDelta::hours(1))
    } else {
        Some(candidate)
    }
}

/// Wall-clock delay from `now` until [`next_boundary`].
///
/// Recomputed from the current time on every cycle so slow exports never
/// push the schedule later.
pub fn delay_until_next_boundary(now: NaiveDateTime) -> Result<Duration, ExportError> {
    let boundary = next_boundary(now)
        .ok_or_else(|| ExportError::Unclassified(format!("no boundary after {now}")))?;
    (boundary - now)
        .to_std()
        .map_err(|e| ExportError::Unclassified(format!("negative delay to {boundary}: {e}")))
}
