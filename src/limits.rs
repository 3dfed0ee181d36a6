//! Engine-wide limits. These bound the damage a misbehaving caller can do;
//! they are not tunable at runtime.

use crate::model::Ms;

/// Longest allowed slot duration in minutes.
pub const MAX_SLOT_MINUTES: u32 = 120;

/// Widest allowed window date range, in calendar days (inclusive count).
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Cap on the slot batch one window may expand into.
pub const MAX_SLOTS_PER_WINDOW: usize = 50_000;

/// Cap on resource name / location length.
pub const MAX_NAME_LEN: usize = 256;

/// Windows before 1970 are rejected outright.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;

/// Windows past the year 2100 are rejected outright.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;
