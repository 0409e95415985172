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

//! World: central entity and component-table storage
//!
//! The world owns entity metadata, one pool per registered component type,
//! and the registry of live filters. Component attach/detach events are
//! routed to interested filters synchronously, so a filter reflects a
//! mutation before the mutating call returns.

use std::any::TypeId;

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::component::Component;
use crate::entity::{EntityId, EntityMeta, Generation, PackedEntity};
use crate::error::{EcsError, Result};
use crate::filter::{
    mask_compatible, mask_compatible_without, Filter, FilterBuilder, FilterData, FilterMask,
};
#[cfg(debug_assertions)]
use crate::observer::WorldObserver;
use crate::pool::{AnyPool, Pool, PoolId, Table};

/// Initial sizing for a world's backing storage. All arrays grow on demand;
/// the knobs only set the point where growth starts.
#[derive(Debug, Clone, Copy)]
pub struct WorldConfig {
    /// Entity slots allocated up front; doubles when exhausted.
    pub entity_capacity: usize,
    /// Initial capacity of the id recycle list.
    pub recycled_capacity: usize,
    /// Expected number of component types.
    pub pool_capacity: usize,
    /// Expected number of distinct filters.
    pub filter_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 512,
            recycled_capacity: 512,
            pool_capacity: 128,
            filter_capacity: 64,
        }
    }
}

/// Central ECS world: entity lifecycle, component tables, filter registry.
pub struct World {
    /// Entity slot count pools and filter sparse arrays are sized to.
    capacity: usize,

    /// Metadata per allocated id; length is the allocated count.
    entities: Vec<EntityMeta>,

    /// Dead ids awaiting reuse.
    recycled: Vec<EntityId>,

    /// One table per registered component type, indexed by pool id.
    pools: Vec<Box<dyn AnyPool>>,
    pools_by_type: AHashMap<TypeId, PoolId>,

    /// Live filters and their dedup registry.
    filters: Vec<FilterData>,
    filters_by_mask: AHashMap<FilterMask, usize>,

    /// Per pool id: filters listing that pool as include / exclude.
    filters_by_include: Vec<SmallVec<[usize; 4]>>,
    filters_by_exclude: Vec<SmallVec<[usize; 4]>>,

    /// Debug instrumentation hooks; never required for correctness.
    #[cfg(debug_assertions)]
    observers: Vec<Box<dyn WorldObserver>>,
}

impl World {
    /// Create a world with default capacities.
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a world with explicit initial capacities.
    pub fn with_config(config: WorldConfig) -> Self {
        let capacity = config.entity_capacity.max(1);
        Self {
            capacity,
            entities: Vec::with_capacity(capacity),
            recycled: Vec::with_capacity(config.recycled_capacity),
            pools: Vec::with_capacity(config.pool_capacity),
            pools_by_type: AHashMap::with_capacity(config.pool_capacity),
            filters: Vec::with_capacity(config.filter_capacity),
            filters_by_mask: AHashMap::with_capacity(config.filter_capacity),
            filters_by_include: Vec::with_capacity(config.pool_capacity),
            filters_by_exclude: Vec::with_capacity(config.pool_capacity),
            #[cfg(debug_assertions)]
            observers: Vec::new(),
        }
    }

    // ---- entity lifecycle ----------------------------------------------

    /// Issue a new entity id, reusing a recycled one when available.
    ///
    /// Always succeeds; storage doubles when the allocated range is full.
    /// Every existing table's slot for the issued id is reset to its zero
    /// value so stale payload bits cannot leak across reuse.
    pub fn create_entity(&mut self) -> EntityId {
        let id = if let Some(id) = self.recycled.pop() {
            self.entities[id as usize].revive();
            id
        } else {
            if self.entities.len() == self.capacity {
                self.grow(self.capacity * 2);
            }
            let id = self.entities.len() as EntityId;
            self.entities.push(EntityMeta::fresh());
            id
        };
        for pool in &mut self.pools {
            pool.scrub(id);
        }
        trace!(entity = id, "entity created");
        #[cfg(debug_assertions)]
        self.notify(|obs| obs.on_entity_created(id));
        id
    }

    /// Destroy an entity. No-op when it is already dead.
    ///
    /// Attached components are deleted one by one; removing the last one
    /// destroys the entity through the zero-count path, which is the single
    /// mechanism by which entities disappear.
    pub fn destroy_entity(&mut self, entity: EntityId) -> Result<()> {
        let Some(meta) = self.entities.get(entity as usize) else {
            return Ok(());
        };
        if meta.generation <= 0 {
            return Ok(());
        }
        if meta.components > 0 {
            let mut pool_idx = 0;
            while self.entities[entity as usize].components > 0 && pool_idx < self.pools.len() {
                if self.pools[pool_idx].has(entity) {
                    self.remove_component_raw(entity, pool_idx)?;
                }
                pool_idx += 1;
            }
            debug_assert_eq!(
                self.entities[entity as usize].components,
                0,
                "entity {entity} retained components after a full removal pass"
            );
            return Ok(());
        }
        self.destroy_now(entity);
        Ok(())
    }

    fn destroy_now(&mut self, entity: EntityId) {
        self.entities[entity as usize].kill();
        self.recycled.push(entity);
        trace!(entity, "entity destroyed");
        #[cfg(debug_assertions)]
        self.notify(|obs| obs.on_entity_destroyed(entity));
    }

    /// True iff the id is in range and its generation is positive.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities
            .get(entity as usize)
            .map(|meta| meta.generation > 0)
            .unwrap_or(false)
    }

    /// Current generation of an allocated id (negative once dead), or
    /// `None` for an id that was never issued.
    pub fn generation(&self, entity: EntityId) -> Option<Generation> {
        self.entities.get(entity as usize).map(|meta| meta.generation)
    }

    /// Number of components attached to the entity; 0 for dead ids.
    pub fn component_count(&self, entity: EntityId) -> usize {
        self.entities
            .get(entity as usize)
            .map(|meta| meta.components as usize)
            .unwrap_or(0)
    }

    /// Entity slot count all tables are currently sized to.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len() - self.recycled.len()
    }

    /// Enumerate all alive entities in id order.
    pub fn iter_entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(id, meta)| (meta.generation > 0).then_some(id as EntityId))
    }

    /// Capture a weak `(id, generation)` reference to a live entity.
    pub fn pack_entity(&self, entity: EntityId) -> Result<PackedEntity> {
        let meta = self
            .entities
            .get(entity as usize)
            .filter(|meta| meta.generation > 0)
            .ok_or(EcsError::EntityNotAlive)?;
        Ok(PackedEntity {
            id: entity,
            generation: meta.generation,
        })
    }

    /// Resolve a packed reference, re-validating its generation.
    pub fn unpack(&self, packed: PackedEntity) -> Option<EntityId> {
        let meta = self.entities.get(packed.id as usize)?;
        (meta.generation > 0 && meta.generation == packed.generation).then_some(packed.id)
    }

    fn grow(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity > self.capacity);
        self.capacity = new_capacity;
        self.entities.reserve(new_capacity - self.entities.len());
        for pool in &mut self.pools {
            pool.resize(new_capacity);
        }
        for filter in &mut self.filters {
            filter.resize_sparse(new_capacity);
        }
        debug!(capacity = new_capacity, "world storage grown");
        #[cfg(debug_assertions)]
        self.notify(|obs| obs.on_world_resized(new_capacity));
    }

    // ---- component tables ----------------------------------------------

    /// Pool id for component type `T`, registering a new table on first use.
    pub fn pool_id<T: Component>(&mut self) -> PoolId {
        let type_id = TypeId::of::<T>();
        if let Some(&id) = self.pools_by_type.get(&type_id) {
            return id;
        }
        let id = self.pools.len();
        self.pools.push(Box::new(Pool::<T>::new(id, self.capacity)));
        self.pools_by_type.insert(type_id, id);
        self.filters_by_include.push(SmallVec::new());
        self.filters_by_exclude.push(SmallVec::new());
        id
    }

    /// Pool id for component type `T` if a table was ever registered.
    pub fn pool_id_of<T: Component>(&self) -> Option<PoolId> {
        self.pools_by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Typed table view for component type `T`.
    pub fn table<T: Component>(&mut self) -> Table<'_, T> {
        let pool = self.pool_id::<T>();
        Table::new(self, pool)
    }

    /// Number of registered component tables.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Component type name stored in a table, for introspection.
    pub fn pool_type_name(&self, pool: PoolId) -> Result<&'static str> {
        self.pools
            .get(pool)
            .map(|p| p.component_type_name())
            .ok_or(EcsError::UnknownPool(pool))
    }

    /// `TypeId` of the component type stored in a table.
    pub fn pool_type_id(&self, pool: PoolId) -> Result<TypeId> {
        self.pools
            .get(pool)
            .map(|p| p.component_type_id())
            .ok_or(EcsError::UnknownPool(pool))
    }

    fn pool_ref<T: Component>(&self, pool: PoolId) -> &Pool<T> {
        match self.pools[pool].as_any().downcast_ref::<Pool<T>>() {
            Some(p) => p,
            None => unreachable!("pool {pool} does not store {}", std::any::type_name::<T>()),
        }
    }

    fn pool_mut<T: Component>(&mut self, pool: PoolId) -> &mut Pool<T> {
        match self.pools[pool].as_any_mut().downcast_mut::<Pool<T>>() {
            Some(p) => p,
            None => unreachable!("pool {pool} does not store {}", std::any::type_name::<T>()),
        }
    }

    pub(crate) fn pool_dyn(&self, pool: PoolId) -> &dyn AnyPool {
        self.pools[pool].as_ref()
    }

    fn ensure_alive(&self, entity: EntityId) -> Result<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotAlive)
        }
    }

    // ---- component operations ------------------------------------------

    /// Attach component `T` with its default payload and return a mutable
    /// handle to it. Fails if the entity is dead or already holds `T`.
    pub fn add_component<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        let pool = self.pool_id::<T>();
        if self.pools[pool].has(entity) {
            return Err(EcsError::ComponentAlreadyPresent(std::any::type_name::<T>()));
        }
        self.pool_mut::<T>(pool).attach_default(entity);
        self.entities[entity as usize].components += 1;
        self.on_component_changed(entity, pool, true);
        Ok(self.pool_mut::<T>(pool).data_mut(entity))
    }

    /// Attach bookkeeping identical to [`add_component`](World::add_component)
    /// but without touching the payload; used when the slot was written
    /// out-of-band (command playback, raw copies).
    pub fn activate_component<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        self.ensure_alive(entity)?;
        let pool = self.pool_id::<T>();
        self.activate_raw(entity, pool)
    }

    pub(crate) fn activate_raw(&mut self, entity: EntityId, pool: PoolId) -> Result<()> {
        self.ensure_alive(entity)?;
        if self.pools[pool].has(entity) {
            return Err(EcsError::ComponentAlreadyPresent(
                self.pools[pool].component_type_name(),
            ));
        }
        self.pools[pool].activate(entity);
        self.entities[entity as usize].components += 1;
        self.on_component_changed(entity, pool, true);
        Ok(())
    }

    /// Read the attached payload of component `T`.
    pub fn get_component<T: Component>(&self, entity: EntityId) -> Result<&T> {
        self.ensure_alive(entity)?;
        let pool = self
            .pool_id_of::<T>()
            .ok_or(EcsError::ComponentMissing(std::any::type_name::<T>()))?;
        if !self.pools[pool].has(entity) {
            return Err(EcsError::ComponentMissing(std::any::type_name::<T>()));
        }
        Ok(self.pool_ref::<T>(pool).data(entity))
    }

    /// Read the attached payload of component `T` mutably.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Result<&mut T> {
        self.ensure_alive(entity)?;
        let pool = self
            .pool_id_of::<T>()
            .ok_or(EcsError::ComponentMissing(std::any::type_name::<T>()))?;
        if !self.pools[pool].has(entity) {
            return Err(EcsError::ComponentMissing(std::any::type_name::<T>()));
        }
        Ok(self.pool_mut::<T>(pool).data_mut(entity))
    }

    /// O(1) attachment check. Defined for dead ids as well; callers that
    /// care about staleness should check liveness separately.
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.pool_id_of::<T>()
            .map(|pool| self.pools[pool].has(entity))
            .unwrap_or(false)
    }

    /// Detach component `T`. No-op when not attached. When this was the
    /// entity's last component, the entity itself is destroyed.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<()> {
        self.ensure_alive(entity)?;
        match self.pool_id_of::<T>() {
            Some(pool) => self.remove_component_raw(entity, pool),
            None => Ok(()),
        }
    }

    pub(crate) fn remove_component_raw(&mut self, entity: EntityId, pool: PoolId) -> Result<()> {
        if !self.pools[pool].has(entity) {
            return Ok(());
        }
        // Filters observe the transition while the slot still reads
        // attached; compatibility around the removed pool is probed with
        // the mask entry skipped.
        self.on_component_changed(entity, pool, false);
        self.pools[pool].detach(entity);
        let meta = &mut self.entities[entity as usize];
        meta.components -= 1;
        let last = meta.components == 0;
        if last {
            self.destroy_now(entity);
        }
        Ok(())
    }

    /// Overwrite an attached slot's payload.
    pub(crate) fn write_component<T: Component>(&mut self, entity: EntityId, value: T) -> Result<()> {
        self.ensure_alive(entity)?;
        let pool = self
            .pool_id_of::<T>()
            .ok_or(EcsError::ComponentMissing(std::any::type_name::<T>()))?;
        if !self.pools[pool].has(entity) {
            return Err(EcsError::ComponentMissing(std::any::type_name::<T>()));
        }
        self.pool_mut::<T>(pool).write(entity, value);
        Ok(())
    }

    /// Pool ids of every component attached to the entity (its composition
    /// list), in table registration order.
    pub fn components_of(&self, entity: EntityId) -> Vec<PoolId> {
        if !self.is_alive(entity) {
            return Vec::new();
        }
        self.pools
            .iter()
            .filter_map(|pool| pool.has(entity).then_some(pool.id()))
            .collect()
    }

    /// Raw same-table slot copy between two entities, activating the
    /// destination slot first when needed. Add-bookkeeping is not re-run
    /// beyond that activation.
    pub fn copy_component(&mut self, pool: PoolId, src: EntityId, dst: EntityId) -> Result<()> {
        if pool >= self.pools.len() {
            return Err(EcsError::UnknownPool(pool));
        }
        self.ensure_alive(src)?;
        self.ensure_alive(dst)?;
        if !self.pools[pool].has(src) {
            return Err(EcsError::ComponentMissing(
                self.pools[pool].component_type_name(),
            ));
        }
        if !self.pools[pool].has(dst) {
            self.activate_raw(dst, pool)?;
        }
        self.pools[pool].copy(src, dst);
        Ok(())
    }

    /// Raw slot copy into another world, activating the destination slot
    /// there first when needed.
    pub fn copy_component_into<T: Component>(
        &self,
        src: EntityId,
        dst_world: &mut World,
        dst: EntityId,
    ) -> Result<()> {
        self.ensure_alive(src)?;
        let pool = self
            .pool_id_of::<T>()
            .ok_or(EcsError::ComponentMissing(std::any::type_name::<T>()))?;
        if !self.pools[pool].has(src) {
            return Err(EcsError::ComponentMissing(std::any::type_name::<T>()));
        }
        let value = self.pool_ref::<T>(pool).data(src).clone();
        dst_world.ensure_alive(dst)?;
        if !dst_world.has_component::<T>(dst) {
            dst_world.activate_component::<T>(dst)?;
        }
        dst_world.write_component::<T>(dst, value)
    }

    // ---- filters -------------------------------------------------------

    /// Start a fluent include/exclude filter builder.
    ///
    /// Reactive upkeep costs O(mask size) table probes per component
    /// transition per interested filter; fine for modest filter counts,
    /// a scalability boundary for very large numbers of overlapping
    /// filters.
    pub fn build_filter(&mut self) -> FilterBuilder<'_> {
        FilterBuilder::new(self)
    }

    pub(crate) fn get_or_create_filter(&mut self, mask: FilterMask) -> Result<Filter> {
        if mask.include.is_empty() {
            return Err(EcsError::FilterWithoutInclude);
        }
        if let Some(pool) = mask.overlap() {
            return Err(EcsError::FilterIncludeExcludeOverlap(
                self.pools[pool].component_type_name(),
            ));
        }
        if let Some(&idx) = self.filters_by_mask.get(&mask) {
            return Ok(Filter(idx));
        }

        let idx = self.filters.len();
        for &pool in &mask.include {
            self.filters_by_include[pool].push(idx);
        }
        for &pool in &mask.exclude {
            self.filters_by_exclude[pool].push(idx);
        }

        // Seed with a one-time scan; from here on membership is maintained
        // reactively.
        let mut data = FilterData::new(mask.clone(), self.capacity);
        for id in 0..self.entities.len() {
            let meta = &self.entities[id];
            if meta.generation > 0
                && meta.components > 0
                && mask_compatible(&data.mask, &self.pools, id as EntityId)
            {
                data.add_entity(id as EntityId);
            }
        }
        self.filters_by_mask.insert(mask, idx);
        self.filters.push(data);
        debug!(filter = idx, "filter created");
        #[cfg(debug_assertions)]
        self.notify(|obs| obs.on_filter_created(Filter(idx)));
        Ok(Filter(idx))
    }

    /// Entities currently matched by the filter, in insertion order.
    ///
    /// The handle must come from this world; handles are not portable
    /// across worlds.
    pub fn filter_entities(&self, filter: Filter) -> &[EntityId] {
        self.filters[filter.0].entities()
    }

    /// Number of entities currently matched by the filter.
    pub fn filter_len(&self, filter: Filter) -> usize {
        self.filters[filter.0].entities().len()
    }

    /// True when the filter currently matches no entity.
    pub fn filter_is_empty(&self, filter: Filter) -> bool {
        self.filters[filter.0].entities().is_empty()
    }

    /// Iterate the filter's current entity set.
    pub fn iter_filter(&self, filter: Filter) -> impl Iterator<Item = EntityId> + '_ {
        self.filter_entities(filter).iter().copied()
    }

    /// Route one component transition to every interested filter.
    fn on_component_changed(&mut self, entity: EntityId, pool: PoolId, added: bool) {
        {
            let World {
                filters,
                filters_by_include,
                filters_by_exclude,
                pools,
                ..
            } = self;
            let pools: &[Box<dyn AnyPool>] = pools;
            if added {
                for &f in filters_by_include[pool].iter() {
                    if mask_compatible(&filters[f].mask, pools, entity) {
                        filters[f].add_entity(entity);
                    }
                }
                for &f in filters_by_exclude[pool].iter() {
                    if mask_compatible_without(&filters[f].mask, pools, entity, pool) {
                        filters[f].remove_entity(entity);
                    }
                }
            } else {
                for &f in filters_by_include[pool].iter() {
                    if mask_compatible(&filters[f].mask, pools, entity) {
                        filters[f].remove_entity(entity);
                    }
                }
                for &f in filters_by_exclude[pool].iter() {
                    if mask_compatible_without(&filters[f].mask, pools, entity, pool) {
                        filters[f].add_entity(entity);
                    }
                }
            }
        }
        #[cfg(debug_assertions)]
        self.notify(|obs| obs.on_entity_changed(entity, pool, added));
    }

    // ---- debug instrumentation -----------------------------------------

    /// Register a debug observer. Debug builds only.
    #[cfg(debug_assertions)]
    pub fn add_observer(&mut self, observer: Box<dyn WorldObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered debug observers.
    #[cfg(debug_assertions)]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    #[cfg(debug_assertions)]
    fn notify(&mut self, mut f: impl FnMut(&mut dyn WorldObserver)) {
        for observer in &mut self.observers {
            f(observer.as_mut());
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(debug_assertions)]
impl Drop for World {
    fn drop(&mut self) {
        self.notify(|obs| obs.on_world_destroyed());
    }
}
