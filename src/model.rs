use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only runtime time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

/// A bookable place (room, desk, court). Uniqueness on (name, location) is
/// enforced at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    pub name: String,
    pub location: String,
}

/// Input for publishing a new availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWindow {
    pub resource_id: Ulid,
    /// First calendar day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last calendar day of the window (inclusive).
    pub end_date: NaiveDate,
    /// Daily opening time (inclusive).
    pub start_time: NaiveTime,
    /// Daily closing time (exclusive).
    pub end_time: NaiveTime,
    pub slot_minutes: u32,
}

/// A provider-declared recurring bookable period: a date range crossed with a
/// daily time range, cut into fixed-duration slots. Immutable once published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Ulid,
    pub provider_id: String,
    pub resource_id: Ulid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: u32,
}

impl AvailabilityWindow {
    pub fn from_request(provider_id: &str, req: NewWindow) -> Self {
        Self {
            id: Ulid::new(),
            provider_id: provider_id.to_string(),
            resource_id: req.resource_id,
            start_date: req.start_date,
            end_date: req.end_date,
            start_time: req.start_time,
            end_time: req.end_time,
            slot_minutes: req.slot_minutes,
        }
    }

    /// Number of whole calendar days covered (inclusive range).
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// The state machine of a slot: Free → Booked → Free, and either → Blocked.
/// A Blocked slot never becomes Booked again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Free,
    Booked { consumer_id: String },
    Blocked,
}

impl SlotState {
    pub fn is_free(&self) -> bool {
        matches!(self, SlotState::Free)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, SlotState::Blocked)
    }

    pub fn booked_by(&self, consumer: &str) -> bool {
        matches!(self, SlotState::Booked { consumer_id } if consumer_id == consumer)
    }
}

/// One bookable unit generated from a window. Created in a batch when the
/// window is published; never deleted afterwards — cancellation returns it to
/// `Free`, blocking parks it in `Blocked`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub id: Ulid,
    pub window_id: Ulid,
    pub span: Span,
    pub state: SlotState,
}

impl SlotRecord {
    pub fn fresh(window_id: Ulid, span: Span) -> Self {
        Self {
            id: Ulid::new(),
            window_id,
            span,
            state: SlotState::Free,
        }
    }

    /// Free, unblocked, and strictly in the future — eligible for `try_book`.
    pub fn is_bookable(&self, now: Ms) -> bool {
        self.state.is_free() && self.span.start > now
    }

    /// Booked by `consumer`, strictly in the future, and not blocked.
    pub fn is_active_for(&self, consumer: &str, now: Ms) -> bool {
        self.state.booked_by(consumer) && self.span.start > now
    }
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub id: Ulid,
    pub window_id: Ulid,
    pub start: Ms,
    pub end: Ms,
    pub state: SlotState,
}

impl SlotInfo {
    pub fn from_record(rec: &SlotRecord) -> Self {
        Self {
            id: rec.id,
            window_id: rec.window_id,
            start: rec.span.start,
            end: rec.span.end,
            state: rec.state.clone(),
        }
    }
}

/// A roster row: one slot with its ownership context, for provider views and
/// the external export layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub slot_id: Ulid,
    pub window_id: Ulid,
    pub resource_id: Ulid,
    pub provider_id: String,
    pub start: Ms,
    pub end: Ms,
    pub state: SlotState,
}

/// Roster-management view of one known consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerInfo {
    pub id: String,
    pub suspended: bool,
}
