//! Exclusion-window predicate.
//!
//! Schedulers can suppress activity inside the window
//! [anchor:00 − 10 min, anchor:00 + 70 min]. The window may cross
//! midnight; with no anchor configured everything is allowed.

use chrono::{Local, NaiveTime, Timelike};

const MINUTES_PER_DAY: u32 = 24 * 60;
const LEAD_MINUTES: u32 = 10;
const TAIL_MINUTES: u32 = 70;

/// Whether `now` falls outside the exclusion window around
/// `anchor_hour:00`. Boundary minutes count as excluded.
pub fn is_allowed_time(now: NaiveTime, anchor_hour: Option<u32>) -> bool {
    let Some(anchor) = anchor_hour else {
        return true;
    };
    let anchor_minute = (anchor % 24) * 60;
    let start = (anchor_minute + MINUTES_PER_DAY - LEAD_MINUTES) % MINUTES_PER_DAY;
    let end = (anchor_minute + TAIL_MINUTES) % MINUTES_PER_DAY;
    let t = now.hour() * 60 + now.minute();

    let in_window = if start <= end {
        t >= start && t <= end
    } else {
        // Window wraps past midnight.
        t >= start || t <= end
    };
    !in_window
}

/// Convenience wrapper over the local wall clock.
pub fn is_allowed_now(anchor_hour: Option<u32>) -> bool {
    is_allowed_time(Local::now().time(), anchor_hour)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
