// Copyright 2025 The sparse_ecs Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Filters: incrementally maintained entity sets
//!
//! A filter is keyed by a canonical include/exclude mask of pool ids. The
//! world deduplicates filters by mask, seeds each new one with a single scan
//! and from then on keeps its membership current reactively, on every
//! component attach/detach.

use smallvec::SmallVec;

use crate::component::Component;
use crate::entity::EntityId;
use crate::error::Result;
use crate::pool::{AnyPool, PoolId};
use crate::world::World;

pub(crate) const MAX_FILTER_COMPONENTS: usize = 8;

pub(crate) type MaskList = SmallVec<[PoolId; MAX_FILTER_COMPONENTS]>;

/// Canonical include/exclude component mask. Sorted and deduplicated lists
/// make the mask itself the dedup key for filter sharing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub(crate) struct FilterMask {
    pub include: MaskList,
    pub exclude: MaskList,
}

impl FilterMask {
    pub(crate) fn canonicalize(&mut self) {
        self.include.sort_unstable();
        self.include.dedup();
        self.exclude.sort_unstable();
        self.exclude.dedup();
    }

    /// First pool id listed on both sides, if any.
    pub(crate) fn overlap(&self) -> Option<PoolId> {
        self.include
            .iter()
            .copied()
            .find(|id| self.exclude.contains(id))
    }
}

/// Cheap copyable handle to a live filter, only meaningful together with
/// the world that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Filter(pub(crate) usize);

/// Live membership state of one filter.
pub(crate) struct FilterData {
    pub mask: FilterMask,
    /// Dense entity list in insertion order; iteration goes over this.
    entities: Vec<EntityId>,
    /// Entity id -> dense position + 1; 0 marks absence. Sized to world
    /// capacity.
    sparse: Vec<u32>,
}

impl FilterData {
    pub(crate) fn new(mask: FilterMask, capacity: usize) -> Self {
        Self {
            mask,
            entities: Vec::new(),
            sparse: vec![0; capacity],
        }
    }

    pub(crate) fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub(crate) fn contains(&self, entity: EntityId) -> bool {
        self.sparse[entity as usize] != 0
    }

    pub(crate) fn resize_sparse(&mut self, capacity: usize) {
        if capacity > self.sparse.len() {
            self.sparse.resize(capacity, 0);
        }
    }

    pub(crate) fn add_entity(&mut self, entity: EntityId) {
        debug_assert_eq!(
            self.sparse[entity as usize], 0,
            "filter already tracks entity {entity}"
        );
        self.entities.push(entity);
        self.sparse[entity as usize] = self.entities.len() as u32;
    }

    pub(crate) fn remove_entity(&mut self, entity: EntityId) {
        let pos = self.sparse[entity as usize];
        debug_assert!(pos != 0, "filter does not track entity {entity}");
        if pos == 0 {
            return;
        }
        let idx = (pos - 1) as usize;
        self.sparse[entity as usize] = 0;
        self.entities.swap_remove(idx);
        if let Some(&moved) = self.entities.get(idx) {
            self.sparse[moved as usize] = pos;
        }
    }
}

/// Compatibility predicate: every include attached, every exclude absent.
/// Probes the component tables directly, never the filter's cached set.
pub(crate) fn mask_compatible(
    mask: &FilterMask,
    pools: &[Box<dyn AnyPool>],
    entity: EntityId,
) -> bool {
    mask.include.iter().all(|&id| pools[id].has(entity))
        && mask.exclude.iter().all(|&id| !pools[id].has(entity))
}

/// Compatibility computed as if the component in pool `skip` were absent.
/// Used around the transition that is being reported, where the table still
/// (or already) holds the opposite state.
pub(crate) fn mask_compatible_without(
    mask: &FilterMask,
    pools: &[Box<dyn AnyPool>],
    entity: EntityId,
    skip: PoolId,
) -> bool {
    mask.include
        .iter()
        .all(|&id| id == skip || pools[id].has(entity))
        && mask
            .exclude
            .iter()
            .all(|&id| id == skip || !pools[id].has(entity))
}

/// Fluent include/exclude builder returned by
/// [`World::build_filter`](crate::World::build_filter); terminates in
/// [`build`](FilterBuilder::build), which gets or creates the shared filter.
pub struct FilterBuilder<'w> {
    world: &'w mut World,
    mask: FilterMask,
}

impl<'w> FilterBuilder<'w> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        Self {
            world,
            mask: FilterMask::default(),
        }
    }

    /// Require component `T` to be attached.
    pub fn with<T: Component>(mut self) -> Self {
        let id = self.world.pool_id::<T>();
        self.mask.include.push(id);
        self
    }

    /// Require component `T` to be absent.
    pub fn without<T: Component>(mut self) -> Self {
        let id = self.world.pool_id::<T>();
        self.mask.exclude.push(id);
        self
    }

    /// Get or create the filter for the accumulated mask. An existing
    /// filter with the same canonical mask is returned as-is, without a
    /// rescan.
    pub fn build(mut self) -> Result<Filter> {
        self.mask.canonicalize();
        self.world.get_or_create_filter(self.mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_canonicalization_orders_and_dedups() {
        let mut a = FilterMask::default();
        a.include.extend([3, 1, 3, 2]);
        a.exclude.extend([7, 5, 7]);
        a.canonicalize();

        let mut b = FilterMask::default();
        b.include.extend([1, 2, 3]);
        b.exclude.extend([5, 7]);
        b.canonicalize();

        assert_eq!(a, b);
    }

    #[test]
    fn mask_overlap_detection() {
        let mut mask = FilterMask::default();
        mask.include.extend([1, 2]);
        mask.exclude.extend([2, 3]);
        mask.canonicalize();
        assert_eq!(mask.overlap(), Some(2));
    }

    #[test]
    fn filter_data_swap_remove_keeps_sparse_consistent() {
        let mut data = FilterData::new(FilterMask::default(), 8);
        data.add_entity(1);
        data.add_entity(3);
        data.add_entity(5);
        assert_eq!(data.entities(), &[1, 3, 5]);

        data.remove_entity(1);
        assert!(!data.contains(1));
        assert!(data.contains(3));
        assert!(data.contains(5));
        // 5 was swapped into the hole; its sparse slot must follow.
        data.remove_entity(5);
        assert_eq!(data.entities(), &[3]);
    }
}
