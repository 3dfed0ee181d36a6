//! The booking ledger: atomic state transitions over the shared slot store.
//!
//! Every slot lives behind its own `Arc<RwLock<_>>` cell inside a `DashMap`.
//! A primitive clones the Arc out of the map — never holding a map shard
//! lock across an await — then takes the write lock and performs its
//! check-then-set inside that single critical section. That makes each
//! primitive linearizable per slot: of N concurrent `try_book` callers,
//! exactly one observes Free and wins.
//!
//! `move_booking` is the one two-slot primitive. It takes both write locks
//! in slot-id order (a fixed global order, so two concurrent moves cannot
//! deadlock) and applies the free-old/book-new pair as a single unit: if any
//! precondition fails, neither slot changes.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::EngineError;

pub type SharedSlot = Arc<RwLock<SlotRecord>>;

#[derive(Default)]
pub struct BookingLedger {
    slots: DashMap<Ulid, SharedSlot>,
    /// window id → slot ids, preserved in generation order.
    window_slots: DashMap<Ulid, Vec<Ulid>>,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Store access ─────────────────────────────────────────

    pub fn get_slot(&self, id: &Ulid) -> Option<SharedSlot> {
        self.slots.get(id).map(|e| e.value().clone())
    }

    pub fn slot_ids(&self) -> Vec<Ulid> {
        self.slots.iter().map(|e| *e.key()).collect()
    }

    /// Slot ids of one window, in generation order.
    pub fn slots_for_window(&self, window_id: &Ulid) -> Vec<Ulid> {
        self.window_slots
            .get(window_id)
            .map(|e| e.value().clone())
            .unwrap_or_default()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Insert a freshly generated slot batch for a window.
    pub(super) fn insert_batch(&self, window_id: Ulid, records: Vec<SlotRecord>) {
        let mut ids = Vec::with_capacity(records.len());
        for rec in records {
            ids.push(rec.id);
            self.slots.insert(rec.id, Arc::new(RwLock::new(rec)));
        }
        self.window_slots.insert(window_id, ids);
    }

    // ── Transition primitives ────────────────────────────────

    /// Free ∧ future → Booked(consumer). Anything else reports
    /// `SlotUnavailable` and leaves the record untouched.
    pub async fn try_book(
        &self,
        slot_id: Ulid,
        consumer_id: &str,
        now: Ms,
    ) -> Result<(), EngineError> {
        let slot = self
            .get_slot(&slot_id)
            .ok_or(EngineError::NotFound(slot_id))?;
        let mut guard = slot.write().await;
        if !guard.is_bookable(now) {
            return Err(EngineError::SlotUnavailable(slot_id));
        }
        guard.state = SlotState::Booked {
            consumer_id: consumer_id.to_string(),
        };
        Ok(())
    }

    /// Booked → Free. No-op on Free, and on Blocked: a blocked slot stays
    /// blocked whatever happens to its occupant.
    pub async fn free(&self, slot_id: Ulid) -> Result<(), EngineError> {
        let slot = self
            .get_slot(&slot_id)
            .ok_or(EngineError::NotFound(slot_id))?;
        let mut guard = slot.write().await;
        if matches!(guard.state, SlotState::Booked { .. }) {
            guard.state = SlotState::Free;
        }
        Ok(())
    }

    /// Booked(consumer) ∧ unblocked ∧ future → Free, with the precondition
    /// checks and the transition under the same write lock. Used for
    /// consumer-initiated cancellation, where ownership must still hold at
    /// the instant the slot is freed.
    pub async fn free_if_booked_by(
        &self,
        slot_id: Ulid,
        consumer_id: &str,
        now: Ms,
    ) -> Result<(), EngineError> {
        let slot = self
            .get_slot(&slot_id)
            .ok_or(EngineError::NotFound(slot_id))?;
        let mut guard = slot.write().await;
        if guard.state.is_blocked() {
            return Err(EngineError::PastOrBlocked(slot_id));
        }
        if !guard.state.booked_by(consumer_id) {
            return Err(EngineError::Forbidden);
        }
        if guard.span.start <= now {
            return Err(EngineError::PastOrBlocked(slot_id));
        }
        guard.state = SlotState::Free;
        Ok(())
    }

    /// Unconditionally → Blocked, clearing any occupant in the same
    /// transition. Returns whether the state actually changed; blocking an
    /// already-Blocked slot is a no-op reported as `false`.
    pub async fn block(&self, slot_id: Ulid) -> Result<bool, EngineError> {
        let slot = self
            .get_slot(&slot_id)
            .ok_or(EngineError::NotFound(slot_id))?;
        let mut guard = slot.write().await;
        if guard.state.is_blocked() {
            return Ok(false);
        }
        guard.state = SlotState::Blocked;
        Ok(true)
    }

    /// All-or-nothing transfer of a booking from `old_id` to `new_id`.
    ///
    /// Requires the old slot currently Booked(consumer) and the new slot
    /// Free, unblocked, and in the future. On any failed precondition the
    /// error names the offending slot and neither record changes — the old
    /// booking is preserved.
    pub async fn move_booking(
        &self,
        old_id: Ulid,
        new_id: Ulid,
        consumer_id: &str,
        now: Ms,
    ) -> Result<(), EngineError> {
        if old_id == new_id {
            return Err(EngineError::SlotUnavailable(new_id));
        }
        let old = self.get_slot(&old_id).ok_or(EngineError::NotFound(old_id))?;
        let new = self.get_slot(&new_id).ok_or(EngineError::NotFound(new_id))?;

        // Fixed acquisition order by slot id.
        let (mut first, mut second) = if old_id < new_id {
            let f = old.write_owned().await;
            let s = new.write_owned().await;
            (f, s)
        } else {
            let s = new.write_owned().await;
            let f = old.write_owned().await;
            (f, s)
        };
        let (old_guard, new_guard) = (&mut first, &mut second);

        if !old_guard.state.booked_by(consumer_id) {
            return Err(EngineError::Forbidden);
        }
        if !new_guard.is_bookable(now) {
            return Err(EngineError::SlotUnavailable(new_id));
        }
        new_guard.state = SlotState::Booked {
            consumer_id: consumer_id.to_string(),
        };
        old_guard.state = SlotState::Free;
        Ok(())
    }
}
