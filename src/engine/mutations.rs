use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};
use ulid::Ulid;

use crate::auth::AuthenticatedActor;
use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::availability::{slot_count, SlotIter};
use super::conflict::{now_ms, validate_window, windows_conflict};
use super::{Engine, EngineError};

impl Engine {
    // ── Resources ────────────────────────────────────────────

    /// Register a bookable resource. Duplicate (name, location) pairs are
    /// rejected with the existing resource's id.
    pub fn create_resource(
        &self,
        actor: &AuthenticatedActor,
        name: &str,
        location: &str,
    ) -> Result<Ulid, EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        if name.is_empty() {
            return Err(EngineError::Validation("resource name must not be empty"));
        }
        if name.len() > MAX_NAME_LEN || location.len() > MAX_NAME_LEN {
            return Err(EngineError::LimitExceeded("resource name too long"));
        }
        if let Some(existing) = self
            .resources()
            .iter()
            .find(|r| r.name == name && r.location == location)
        {
            return Err(EngineError::AlreadyExists(existing.id));
        }
        let resource = Resource {
            id: Ulid::new(),
            name: name.to_string(),
            location: location.to_string(),
        };
        let id = resource.id;
        self.insert_resource(resource);
        info!(resource = %id, name, "resource registered");
        Ok(id)
    }

    // ── Window publication ───────────────────────────────────

    /// Validate a candidate window against the provider's existing windows
    /// for the same resource and, if it passes, publish it together with its
    /// full slot batch.
    ///
    /// The provider's window list stays write-locked from the conflict check
    /// through insertion, so two racing definitions cannot both pass.
    pub async fn define_availability(
        &self,
        actor: &AuthenticatedActor,
        req: NewWindow,
    ) -> Result<Ulid, EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        if self.get_resource(&req.resource_id).is_none() {
            return Err(EngineError::NotFound(req.resource_id));
        }
        let window = AvailabilityWindow::from_request(&actor.id, req);
        if let Err(e) = validate_window(&window) {
            metrics::counter!(observability::WINDOW_REJECTIONS_TOTAL).increment(1);
            return Err(e);
        }
        if slot_count(&window) > MAX_SLOTS_PER_WINDOW {
            return Err(EngineError::LimitExceeded("window expands to too many slots"));
        }

        let list = self.provider_window_list(&actor.id);
        let mut guard = list.write().await;
        for wid in guard.iter() {
            if let Some(existing) = self.get_window(wid)
                && existing.resource_id == window.resource_id
                && windows_conflict(&window, &existing)
            {
                metrics::counter!(observability::WINDOW_REJECTIONS_TOTAL).increment(1);
                return Err(EngineError::WindowConflict(existing.id));
            }
        }

        let window_id = window.id;
        let records: Vec<SlotRecord> = SlotIter::new(&window)
            .map(|span| SlotRecord::fresh(window_id, span))
            .collect();
        let generated = records.len();
        self.ledger.insert_batch(window_id, records);
        self.insert_window(Arc::new(window));
        guard.push(window_id);
        drop(guard);

        metrics::counter!(observability::WINDOWS_PUBLISHED_TOTAL).increment(1);
        metrics::counter!(observability::SLOTS_GENERATED_TOTAL).increment(generated as u64);
        info!(window = %window_id, provider = %actor.id, slots = generated, "availability window published");
        Ok(window_id)
    }

    // ── Booking use-cases ────────────────────────────────────

    /// Book a slot for a consumer. Rejected with `AlreadyReserved` while the
    /// consumer holds any active reservation, the requested slot included;
    /// otherwise the outcome is whatever the ledger's `try_book` decides.
    pub async fn book(
        &self,
        actor: &AuthenticatedActor,
        slot_id: Ulid,
    ) -> Result<(), EngineError> {
        if !actor.is_consumer() {
            return Err(EngineError::Forbidden);
        }
        let cell = self.consumer_cell(&actor.id);
        let mut cell_guard = cell.write().await;
        let now = now_ms();

        if let Some(active) = cell_guard.active_slot {
            if self.slot_is_active_for(&active, &actor.id, now).await {
                // Covers re-booking the held slot itself: the hint stays,
                // one reservation remains.
                metrics::counter!(observability::BOOKING_REJECTIONS_TOTAL).increment(1);
                return Err(EngineError::AlreadyReserved(active));
            }
            // Stale hint — the slot was freed or blocked behind our back.
            cell_guard.active_slot = None;
        }

        match self.ledger.try_book(slot_id, &actor.id, now).await {
            Ok(()) => {
                cell_guard.active_slot = Some(slot_id);
                metrics::counter!(observability::BOOKINGS_TOTAL).increment(1);
                info!(slot = %slot_id, consumer = %actor.id, "slot booked");
                Ok(())
            }
            Err(e) => {
                metrics::counter!(observability::BOOKING_REJECTIONS_TOTAL).increment(1);
                debug!(slot = %slot_id, consumer = %actor.id, error = %e, "booking rejected");
                Err(e)
            }
        }
    }

    /// Consumer cancels their own reservation. The slot must be theirs,
    /// unblocked, and not yet started; it returns to Free.
    pub async fn cancel_by_consumer(
        &self,
        actor: &AuthenticatedActor,
        slot_id: Ulid,
    ) -> Result<(), EngineError> {
        if !actor.is_consumer() {
            return Err(EngineError::Forbidden);
        }
        let cell = self.consumer_cell(&actor.id);
        let mut cell_guard = cell.write().await;
        let now = now_ms();

        self.ledger.free_if_booked_by(slot_id, &actor.id, now).await?;
        if cell_guard.active_slot == Some(slot_id) {
            cell_guard.active_slot = None;
        }
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        info!(slot = %slot_id, consumer = %actor.id, "reservation cancelled by consumer");
        Ok(())
    }

    /// Provider cancels whatever booking sits on one of their own slots.
    /// The occupant's cell hint goes stale and is repaired on their next call.
    pub async fn cancel_by_provider(
        &self,
        actor: &AuthenticatedActor,
        slot_id: Ulid,
    ) -> Result<(), EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        let (rec, window) = self.window_of_slot(&slot_id).await?;
        if window.provider_id != actor.id {
            return Err(EngineError::Forbidden);
        }
        if rec.span.start <= now_ms() {
            return Err(EngineError::PastOrBlocked(slot_id));
        }
        self.ledger.free(slot_id).await?;
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        info!(slot = %slot_id, provider = %actor.id, "reservation cancelled by provider");
        Ok(())
    }

    /// Atomically move the consumer's reservation from `old_id` to `new_id`.
    /// If the target is unavailable the old booking is left intact. The
    /// one-active-reservation check does not apply: the old slot is vacated
    /// in the same atomic step that books the new one.
    pub async fn rebook(
        &self,
        actor: &AuthenticatedActor,
        old_id: Ulid,
        new_id: Ulid,
    ) -> Result<(), EngineError> {
        if !actor.is_consumer() {
            return Err(EngineError::Forbidden);
        }
        let cell = self.consumer_cell(&actor.id);
        let mut cell_guard = cell.write().await;

        self.ledger
            .move_booking(old_id, new_id, &actor.id, now_ms())
            .await?;
        cell_guard.active_slot = Some(new_id);
        metrics::counter!(observability::REBOOKS_TOTAL).increment(1);
        info!(from = %old_id, to = %new_id, consumer = %actor.id, "reservation moved");
        Ok(())
    }

    /// Provider moves the occupant of one of their slots onto another of
    /// their slots — same all-or-nothing semantics, on the occupant's behalf.
    pub async fn rebook_by_provider(
        &self,
        actor: &AuthenticatedActor,
        old_id: Ulid,
        new_id: Ulid,
    ) -> Result<(), EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        let (old_rec, old_window) = self.window_of_slot(&old_id).await?;
        let (_, new_window) = self.window_of_slot(&new_id).await?;
        if old_window.provider_id != actor.id || new_window.provider_id != actor.id {
            return Err(EngineError::Forbidden);
        }
        let occupant = match &old_rec.state {
            SlotState::Booked { consumer_id } => consumer_id.clone(),
            _ => return Err(EngineError::SlotUnavailable(old_id)),
        };

        // Serialize against the occupant's own operations; move_booking
        // re-verifies ownership under the slot locks, so a cancel that slips
        // in between makes the move fail cleanly.
        let cell = self.consumer_cell(&occupant);
        let mut cell_guard = cell.write().await;
        self.ledger
            .move_booking(old_id, new_id, &occupant, now_ms())
            .await?;
        cell_guard.active_slot = Some(new_id);
        metrics::counter!(observability::REBOOKS_TOTAL).increment(1);
        info!(from = %old_id, to = %new_id, provider = %actor.id, consumer = %occupant, "occupant moved by provider");
        Ok(())
    }

    /// Block every not-yet-blocked slot of this provider whose start falls
    /// within the inclusive date range. Each slot's transition is
    /// independently atomic and idempotent; there is no batch transaction,
    /// so re-running after a partial failure is safe and counts only the
    /// slots it newly blocked.
    pub async fn block_period(
        &self,
        actor: &AuthenticatedActor,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<usize, EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        if to < from {
            return Err(EngineError::Validation("end date before start date"));
        }
        let range_start = day_start_ms(from);
        let range_end = match to.succ_opt() {
            Some(next) => day_start_ms(next),
            None => Ms::MAX,
        };

        let mut affected = 0usize;
        for wid in self.provider_window_ids(&actor.id).await {
            for sid in self.ledger.slots_for_window(&wid) {
                let Some(slot) = self.ledger.get_slot(&sid) else {
                    continue;
                };
                let in_range = {
                    let guard = slot.read().await;
                    !guard.state.is_blocked()
                        && guard.span.start >= range_start
                        && guard.span.start < range_end
                };
                // block() re-checks under the write lock and reports whether
                // it actually flipped the state, so a racing call cannot
                // double-count.
                if in_range && self.ledger.block(sid).await? {
                    affected += 1;
                }
            }
        }
        metrics::counter!(observability::SLOTS_BLOCKED_TOTAL).increment(affected as u64);
        info!(provider = %actor.id, %from, %to, affected, "period blocked");
        Ok(affected)
    }

    // ── Consumer roster ──────────────────────────────────────

    /// Mark a consumer as suspended. Suspension is advisory inside the
    /// engine: eligibility enforcement happens at the boundary, which reads
    /// it from the directory.
    pub async fn suspend_consumer(
        &self,
        actor: &AuthenticatedActor,
        consumer_id: &str,
    ) -> Result<(), EngineError> {
        self.set_suspended(actor, consumer_id, true).await
    }

    pub async fn reinstate_consumer(
        &self,
        actor: &AuthenticatedActor,
        consumer_id: &str,
    ) -> Result<(), EngineError> {
        self.set_suspended(actor, consumer_id, false).await
    }

    async fn set_suspended(
        &self,
        actor: &AuthenticatedActor,
        consumer_id: &str,
        suspended: bool,
    ) -> Result<(), EngineError> {
        if !actor.is_provider() {
            return Err(EngineError::Forbidden);
        }
        let cell = self
            .known_consumer(consumer_id)
            .ok_or_else(|| EngineError::UnknownConsumer(consumer_id.to_string()))?;
        cell.write().await.suspended = suspended;
        info!(consumer = %consumer_id, suspended, "consumer status updated");
        Ok(())
    }

    // ── Helpers ──────────────────────────────────────────────

    /// True when the slot is currently Booked(consumer) with a future start.
    async fn slot_is_active_for(&self, slot_id: &Ulid, consumer_id: &str, now: Ms) -> bool {
        match self.ledger.get_slot(slot_id) {
            Some(slot) => slot.read().await.is_active_for(consumer_id, now),
            None => false,
        }
    }
}

/// Midnight at the start of `day`, as unix ms (UTC).
pub(super) fn day_start_ms(day: NaiveDate) -> Ms {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}
