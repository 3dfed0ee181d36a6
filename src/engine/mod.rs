mod availability;
mod conflict;
mod error;
mod ledger;
mod mutations;
mod queries;

pub use availability::{slot_count, SlotIter};
pub use error::EngineError;
pub use ledger::{BookingLedger, SharedSlot};

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

pub type SharedConsumer = Arc<RwLock<ConsumerCell>>;

/// Per-consumer bookkeeping. The cell's write lock serializes that
/// consumer's own booking operations, which is what makes "at most one
/// active reservation" hold under concurrent calls by the same consumer.
///
/// `active_slot` is a hint, not a source of truth: a provider freeing or
/// blocking the slot does not touch the cell, so it can point at a slot the
/// consumer no longer holds. Readers re-verify against the ledger and repair
/// lazily.
#[derive(Debug, Default)]
pub struct ConsumerCell {
    pub active_slot: Option<Ulid>,
    pub suspended: bool,
}

/// The booking engine: slot ledger plus the window, resource, and consumer
/// registries, with the use-case logic layered on top (see `mutations.rs`
/// and `queries.rs`).
pub struct Engine {
    pub ledger: BookingLedger,
    /// Windows are immutable after publication, so a plain Arc suffices.
    windows: DashMap<Ulid, Arc<AvailabilityWindow>>,
    resources: DashMap<Ulid, Resource>,
    /// provider id → window ids. The per-provider list is write-locked while
    /// a candidate window is validated and inserted, so two racing
    /// definitions for the same provider cannot both pass the conflict check.
    provider_windows: DashMap<String, Arc<RwLock<Vec<Ulid>>>>,
    consumers: DashMap<String, SharedConsumer>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            ledger: BookingLedger::new(),
            windows: DashMap::new(),
            resources: DashMap::new(),
            provider_windows: DashMap::new(),
            consumers: DashMap::new(),
        }
    }

    pub fn get_window(&self, id: &Ulid) -> Option<Arc<AvailabilityWindow>> {
        self.windows.get(id).map(|e| e.value().clone())
    }

    pub fn get_resource(&self, id: &Ulid) -> Option<Resource> {
        self.resources.get(id).map(|e| e.value().clone())
    }

    pub(super) fn resources(&self) -> &DashMap<Ulid, Resource> {
        &self.resources
    }

    pub(super) fn windows(&self) -> &DashMap<Ulid, Arc<AvailabilityWindow>> {
        &self.windows
    }

    pub(super) fn insert_window(&self, window: Arc<AvailabilityWindow>) {
        self.windows.insert(window.id, window);
    }

    pub(super) fn insert_resource(&self, resource: Resource) {
        self.resources.insert(resource.id, resource);
    }

    /// Get or create the cell serializing this consumer's operations.
    pub(super) fn consumer_cell(&self, consumer_id: &str) -> SharedConsumer {
        self.consumers
            .entry(consumer_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    pub(super) fn known_consumer(&self, consumer_id: &str) -> Option<SharedConsumer> {
        self.consumers.get(consumer_id).map(|e| e.value().clone())
    }

    pub(super) fn consumers(&self) -> &DashMap<String, SharedConsumer> {
        &self.consumers
    }

    /// Get or create the provider's window list.
    pub(super) fn provider_window_list(&self, provider_id: &str) -> Arc<RwLock<Vec<Ulid>>> {
        self.provider_windows
            .entry(provider_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Window ids currently owned by a provider (snapshot).
    pub(super) async fn provider_window_ids(&self, provider_id: &str) -> Vec<Ulid> {
        match self.provider_windows.get(provider_id) {
            Some(entry) => {
                let list = entry.value().clone();
                drop(entry);
                list.read().await.clone()
            }
            None => Vec::new(),
        }
    }

    /// The window a slot belongs to, or NotFound for either half.
    pub(super) async fn window_of_slot(
        &self,
        slot_id: &Ulid,
    ) -> Result<(SlotRecord, Arc<AvailabilityWindow>), EngineError> {
        let slot = self
            .ledger
            .get_slot(slot_id)
            .ok_or(EngineError::NotFound(*slot_id))?;
        let rec = slot.read().await.clone();
        let window = self
            .get_window(&rec.window_id)
            .ok_or(EngineError::NotFound(rec.window_id))?;
        Ok((rec, window))
    }
}
