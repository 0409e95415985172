//! Debug instrumentation observers
//!
//! Worlds accept observers in debug builds only (`World::add_observer` is
//! compiled out otherwise). Observers exist for external debugging and
//! visualization tooling; the kernel never depends on them for correctness.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::entity::EntityId;
use crate::filter::Filter;
use crate::pool::PoolId;

/// Observer notified of world lifecycle events.
///
/// All methods have empty defaults; implement only what the tool needs.
pub trait WorldObserver {
    /// A new entity id was issued.
    fn on_entity_created(&mut self, _entity: EntityId) {}

    /// A component was attached (`attached == true`) or detached from an
    /// entity; `pool` names the component table.
    fn on_entity_changed(&mut self, _entity: EntityId, _pool: PoolId, _attached: bool) {}

    /// An entity's generation was flipped dead and its id recycled.
    fn on_entity_destroyed(&mut self, _entity: EntityId) {}

    /// A new filter was registered (deduplicated lookups do not fire this).
    fn on_filter_created(&mut self, _filter: Filter) {}

    /// World storage grew to a new capacity.
    fn on_world_resized(&mut self, _capacity: usize) {}

    /// The world is being dropped.
    fn on_world_destroyed(&mut self) {}

    /// Name for debugging.
    fn name(&self) -> &str {
        "WorldObserver"
    }
}

/// Event tallies collected by [`CountingObserver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounts {
    pub created: usize,
    pub changed: usize,
    pub destroyed: usize,
    pub filters: usize,
    pub resizes: usize,
    pub worlds_destroyed: usize,
}

/// Observer that counts events into shared state, so the tallies stay
/// readable after the observer is handed to the world.
#[derive(Default)]
pub struct CountingObserver {
    counts: Arc<Mutex<EventCounts>>,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the tallies; clone before boxing the observer.
    pub fn counts(&self) -> Arc<Mutex<EventCounts>> {
        Arc::clone(&self.counts)
    }
}

impl WorldObserver for CountingObserver {
    fn on_entity_created(&mut self, _entity: EntityId) {
        self.counts.lock().created += 1;
    }

    fn on_entity_changed(&mut self, _entity: EntityId, _pool: PoolId, _attached: bool) {
        self.counts.lock().changed += 1;
    }

    fn on_entity_destroyed(&mut self, _entity: EntityId) {
        self.counts.lock().destroyed += 1;
    }

    fn on_filter_created(&mut self, _filter: Filter) {
        self.counts.lock().filters += 1;
    }

    fn on_world_resized(&mut self, _capacity: usize) {
        self.counts.lock().resizes += 1;
    }

    fn on_world_destroyed(&mut self) {
        self.counts.lock().worlds_destroyed += 1;
    }

    fn name(&self) -> &str {
        "CountingObserver"
    }
}
