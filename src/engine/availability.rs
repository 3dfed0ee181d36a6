//! Slot expansion: turn a validated availability window into its sequence of
//! bookable spans.
//!
//! The expansion is deterministic and the emitted order is contractual:
//! calendar day first, then intra-day order. Within a day, slots are laid
//! back-to-back from `start_time`; a trailing remainder shorter than the slot
//! duration is silently dropped — no short slot is ever emitted.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::model::*;

// ── Slot Expansion ───────────────────────────────────────────────

/// Lazy iterator over the spans a window expands into.
///
/// Restartable: constructing a fresh `SlotIter` over the same window always
/// yields the same sequence.
pub struct SlotIter<'a> {
    window: &'a AvailabilityWindow,
    duration: TimeDelta,
    /// None once every day has been consumed.
    day: Option<NaiveDate>,
    cursor: NaiveTime,
}

impl<'a> SlotIter<'a> {
    pub fn new(window: &'a AvailabilityWindow) -> Self {
        Self {
            window,
            duration: TimeDelta::minutes(i64::from(window.slot_minutes)),
            day: Some(window.start_date),
            cursor: window.start_time,
        }
    }
}

impl Iterator for SlotIter<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        loop {
            let day = self.day?;
            // overflowing_add tells us whether the slot would wrap past
            // midnight; a wrapped end can never fit inside the daily range.
            let (slot_end, wrapped) = self.cursor.overflowing_add_signed(self.duration);
            if wrapped == 0 && slot_end <= self.window.end_time {
                let start = day.and_time(self.cursor).and_utc().timestamp_millis();
                let end = day.and_time(slot_end).and_utc().timestamp_millis();
                self.cursor = slot_end;
                return Some(Span::new(start, end));
            }
            // Remainder (if any) dropped; move to the next calendar day.
            self.day = match day.succ_opt() {
                Some(next) if next <= self.window.end_date => Some(next),
                _ => None,
            };
            self.cursor = self.window.start_time;
        }
    }
}

/// Number of slots a window expands into, without generating them.
///
/// `days * (daily_span / duration)` with integer division — the same
/// remainder-dropping rule the iterator applies.
pub fn slot_count(window: &AvailabilityWindow) -> usize {
    let daily_minutes = (window.end_time - window.start_time).num_minutes();
    if daily_minutes <= 0 || window.slot_minutes == 0 || window.end_date < window.start_date {
        return 0;
    }
    let per_day = daily_minutes / i64::from(window.slot_minutes);
    (window.day_count() * per_day).max(0) as usize
}
