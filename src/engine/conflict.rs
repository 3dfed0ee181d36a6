//! Window validation: structural checks on a candidate availability window
//! and the two-dimensional overlap test against existing windows.

use crate::limits::*;
use crate::model::*;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Structural checks. The violated rule is reported verbatim.
pub(crate) fn validate_window(w: &AvailabilityWindow) -> Result<(), EngineError> {
    if w.end_date < w.start_date {
        return Err(EngineError::Validation("end date before start date"));
    }
    if w.end_time <= w.start_time {
        return Err(EngineError::Validation("end time not after start time"));
    }
    if w.slot_minutes == 0 {
        return Err(EngineError::Validation("slot duration must be positive"));
    }
    if w.slot_minutes > MAX_SLOT_MINUTES {
        return Err(EngineError::Validation("slot duration too long"));
    }
    if w.day_count() > MAX_WINDOW_DAYS {
        return Err(EngineError::LimitExceeded("window spans too many days"));
    }
    let first = w.start_date.and_time(w.start_time).and_utc().timestamp_millis();
    let last = w.end_date.and_time(w.end_time).and_utc().timestamp_millis();
    if first < MIN_VALID_TIMESTAMP_MS || last > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    Ok(())
}

/// Two windows conflict only when BOTH dimensions intersect: their inclusive
/// date ranges and their half-open daily time ranges. Overlapping dates with
/// disjoint times (or vice versa) is fine — the generated slots cannot clash.
pub(crate) fn windows_conflict(a: &AvailabilityWindow, b: &AvailabilityWindow) -> bool {
    let dates_intersect = a.start_date <= b.end_date && b.start_date <= a.end_date;
    let times_intersect = b.start_time < a.end_time && a.start_time < b.end_time;
    dates_intersect && times_intersect
}
