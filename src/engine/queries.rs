//! Read-only projections. Nothing here mutates: every function takes read
//! locks only, and the results are point-in-time snapshots — a booking that
//! lands between the snapshot and its use simply makes the follow-up
//! `try_book` lose, which is the normal race outcome.

use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::conflict::now_ms;
use super::mutations::day_start_ms;
use super::Engine;

impl Engine {
    /// Every Free, unblocked slot with a future start, ordered by start time
    /// (then slot id, for a deterministic tiebreak).
    pub async fn available_slots(&self) -> Vec<SlotInfo> {
        let now = now_ms();
        let mut out = Vec::new();
        for sid in self.ledger.slot_ids() {
            if let Some(slot) = self.ledger.get_slot(&sid) {
                let guard = slot.read().await;
                if guard.is_bookable(now) {
                    out.push(SlotInfo::from_record(&guard));
                }
            }
        }
        out.sort_by_key(|s| (s.start, s.id));
        out
    }

    /// Available slots restricted to one provider's windows — the picker a
    /// provider sees when moving an occupant.
    pub async fn available_slots_for_provider(&self, provider_id: &str) -> Vec<SlotInfo> {
        let now = now_ms();
        let mut out = Vec::new();
        for wid in self.provider_window_ids(provider_id).await {
            for sid in self.ledger.slots_for_window(&wid) {
                if let Some(slot) = self.ledger.get_slot(&sid) {
                    let guard = slot.read().await;
                    if guard.is_bookable(now) {
                        out.push(SlotInfo::from_record(&guard));
                    }
                }
            }
        }
        out.sort_by_key(|s| (s.start, s.id));
        out
    }

    /// The consumer's active reservation, if they hold one. The
    /// one-active-reservation invariant means there is at most one.
    pub async fn current_booking(&self, consumer_id: &str) -> Option<SlotInfo> {
        let now = now_ms();
        for sid in self.ledger.slot_ids() {
            if let Some(slot) = self.ledger.get_slot(&sid) {
                let guard = slot.read().await;
                if guard.is_active_for(consumer_id, now) {
                    return Some(SlotInfo::from_record(&guard));
                }
            }
        }
        None
    }

    /// Every slot of every window the provider owns, ordered by start —
    /// past, booked, and blocked slots included.
    pub async fn provider_roster(&self, provider_id: &str) -> Vec<RosterEntry> {
        let mut out = Vec::new();
        for wid in self.provider_window_ids(provider_id).await {
            let Some(window) = self.get_window(&wid) else {
                continue;
            };
            for sid in self.ledger.slots_for_window(&wid) {
                if let Some(slot) = self.ledger.get_slot(&sid) {
                    let guard = slot.read().await;
                    out.push(roster_entry(&guard, &window));
                }
            }
        }
        out.sort_by_key(|e| (e.start, e.slot_id));
        out
    }

    /// Slots on one resource whose start date falls within the inclusive
    /// range. This is the feed for the external export/report layer.
    pub async fn roster_for_resource(
        &self,
        resource_id: Ulid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<RosterEntry> {
        let range_start = day_start_ms(from);
        let range_end = match to.succ_opt() {
            Some(next) => day_start_ms(next),
            None => Ms::MAX,
        };

        // Snapshot the matching windows before awaiting anything — map shard
        // guards must not be held across an await.
        let windows: Vec<_> = self
            .windows()
            .iter()
            .filter(|e| e.value().resource_id == resource_id)
            .map(|e| e.value().clone())
            .collect();

        let mut out = Vec::new();
        for window in windows {
            for sid in self.ledger.slots_for_window(&window.id) {
                if let Some(slot) = self.ledger.get_slot(&sid) {
                    let guard = slot.read().await;
                    if guard.span.start >= range_start && guard.span.start < range_end {
                        out.push(roster_entry(&guard, &window));
                    }
                }
            }
        }
        out.sort_by_key(|e| (e.start, e.slot_id));
        out
    }

    /// Roster-management view: every consumer the engine has seen, with
    /// their suspension status.
    pub async fn consumer_directory(&self) -> Vec<ConsumerInfo> {
        let mut cells = Vec::new();
        for entry in self.consumers().iter() {
            cells.push((entry.key().clone(), entry.value().clone()));
        }
        let mut out = Vec::with_capacity(cells.len());
        for (id, cell) in cells {
            let suspended = cell.read().await.suspended;
            out.push(ConsumerInfo { id, suspended });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Point-in-time copy of one slot record.
    pub async fn slot_info(&self, slot_id: &Ulid) -> Option<SlotInfo> {
        let slot = self.ledger.get_slot(slot_id)?;
        let guard = slot.read().await;
        Some(SlotInfo::from_record(&guard))
    }

    pub fn list_resources(&self) -> Vec<Resource> {
        let mut out: Vec<Resource> = self.resources().iter().map(|e| e.value().clone()).collect();
        out.sort_by_key(|r| r.id);
        out
    }
}

fn roster_entry(rec: &SlotRecord, window: &AvailabilityWindow) -> RosterEntry {
    RosterEntry {
        slot_id: rec.id,
        window_id: rec.window_id,
        resource_id: window.resource_id,
        provider_id: window.provider_id.clone(),
        start: rec.span.start,
        end: rec.span.end,
        state: rec.state.clone(),
    }
}
