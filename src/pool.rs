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

//! Component tables
//!
//! One [`Pool<T>`] per component type: a dense array of slots indexed
//! directly by entity id. The world owns its pools behind the non-generic
//! [`AnyPool`] capability trait so heterogeneous tables can live in a single
//! collection; typed access goes through `as_any` downcasts.

use std::any::{Any, TypeId};

use crate::component::Component;
use crate::entity::EntityId;
use crate::error::{EcsError, Result};
use crate::world::World;

/// Index of a component table inside its world, used to address the table
/// in filter masks and composition lists.
pub type PoolId = usize;

/// How a staged payload lands in the destination slot during command
/// playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Slot must be free; it is activated first.
    Add,
    /// Slot must already be attached.
    Set,
    /// Activate the slot when free, then overwrite.
    AddOrSet,
}

#[derive(Debug, Clone)]
pub(crate) struct Slot<T> {
    pub attached: bool,
    pub data: T,
}

impl<T: Default> Default for Slot<T> {
    fn default() -> Self {
        Self {
            attached: false,
            data: T::default(),
        }
    }
}

/// Dense component table for one component type.
///
/// Owns only the per-entity slots for its type, never entities themselves.
/// Sized in lockstep with the world's entity capacity; never shrinks.
pub struct Pool<T: Component> {
    id: PoolId,
    slots: Vec<Slot<T>>,
}

impl<T: Component> Pool<T> {
    pub(crate) fn new(id: PoolId, capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, Slot::default);
        Self { id, slots }
    }

    /// Table identity inside global include/exclude masks.
    pub fn id(&self) -> PoolId {
        self.id
    }

    pub(crate) fn attached(&self, entity: EntityId) -> bool {
        self.slots[entity as usize].attached
    }

    /// Attach with a default payload and run the component's attach hook.
    pub(crate) fn attach_default(&mut self, entity: EntityId) {
        let slot = &mut self.slots[entity as usize];
        debug_assert!(!slot.attached, "slot already attached");
        slot.data = T::default();
        slot.data.on_attach();
        slot.attached = true;
    }

    /// Attach bookkeeping only; the payload is left untouched for an
    /// out-of-band write (command playback, raw copies).
    pub(crate) fn attach_raw(&mut self, entity: EntityId) {
        let slot = &mut self.slots[entity as usize];
        debug_assert!(!slot.attached, "slot already attached");
        slot.attached = true;
    }

    /// Detach and auto-reset the payload.
    pub(crate) fn detach_slot(&mut self, entity: EntityId) {
        let slot = &mut self.slots[entity as usize];
        debug_assert!(slot.attached, "slot not attached");
        slot.attached = false;
        slot.data.on_detach();
    }

    pub(crate) fn data(&self, entity: EntityId) -> &T {
        &self.slots[entity as usize].data
    }

    pub(crate) fn data_mut(&mut self, entity: EntityId) -> &mut T {
        &mut self.slots[entity as usize].data
    }

    /// Overwrite an attached slot's payload.
    pub(crate) fn write(&mut self, entity: EntityId, value: T) {
        let slot = &mut self.slots[entity as usize];
        debug_assert!(slot.attached, "write into detached slot");
        slot.data = value;
    }
}

/// Non-generic capability surface of a component table.
///
/// Everything the world (and command playback) needs without knowing the
/// component type: resize, attachment queries, raw slot maintenance, and
/// cross-world application where the generic impl recovers `T`.
pub trait AnyPool {
    /// Table identity inside global include/exclude masks.
    fn id(&self) -> PoolId;

    /// `TypeId` of the stored component type.
    fn component_type_id(&self) -> TypeId;

    /// Component type name for introspection and error messages.
    fn component_type_name(&self) -> &'static str;

    /// Grow the backing array to `capacity` slots. Driven by world growth;
    /// tables never shrink.
    fn resize(&mut self, capacity: usize);

    /// O(1) attachment check. Defined for any in-range id, including dead
    /// ones.
    fn has(&self, entity: EntityId) -> bool;

    /// Reset a detached slot's payload to the zero value so stale bits
    /// cannot leak into a recycled entity id.
    fn scrub(&mut self, entity: EntityId);

    /// Detach and auto-reset; attachment bookkeeping is the caller's job.
    fn detach(&mut self, entity: EntityId);

    /// Flip the attached flag without touching the payload; attachment
    /// bookkeeping is the caller's job.
    fn activate(&mut self, entity: EntityId);

    /// Raw same-table payload copy. The destination slot must already be
    /// attached.
    fn copy(&mut self, src: EntityId, dst: EntityId);

    /// Activate this pool's component type on `target` in `world`
    /// (registering the type there when missing).
    fn activate_in(&self, world: &mut World, target: EntityId) -> Result<()>;

    /// Delete this pool's component type from `target` in `world`.
    fn delete_in(&self, world: &mut World, target: EntityId) -> Result<()>;

    /// Copy the payload staged on `staged` in this pool into `target` in
    /// `world` according to `mode`.
    fn write_staged_into(
        &self,
        staged: EntityId,
        world: &mut World,
        target: EntityId,
        mode: WriteMode,
    ) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyPool for Pool<T> {
    fn id(&self) -> PoolId {
        self.id
    }

    fn component_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn component_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn resize(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.slots.resize_with(capacity, Slot::default);
        }
    }

    fn has(&self, entity: EntityId) -> bool {
        self.slots
            .get(entity as usize)
            .map(|slot| slot.attached)
            .unwrap_or(false)
    }

    fn scrub(&mut self, entity: EntityId) {
        let slot = &mut self.slots[entity as usize];
        debug_assert!(!slot.attached, "scrub of an attached slot");
        slot.data = T::default();
    }

    fn detach(&mut self, entity: EntityId) {
        self.detach_slot(entity);
    }

    fn activate(&mut self, entity: EntityId) {
        self.attach_raw(entity);
    }

    fn copy(&mut self, src: EntityId, dst: EntityId) {
        debug_assert!(self.slots[src as usize].attached);
        debug_assert!(self.slots[dst as usize].attached);
        let value = self.slots[src as usize].data.clone();
        self.slots[dst as usize].data = value;
    }

    fn activate_in(&self, world: &mut World, target: EntityId) -> Result<()> {
        world.activate_component::<T>(target)
    }

    fn delete_in(&self, world: &mut World, target: EntityId) -> Result<()> {
        world.remove_component::<T>(target)
    }

    fn write_staged_into(
        &self,
        staged: EntityId,
        world: &mut World,
        target: EntityId,
        mode: WriteMode,
    ) -> Result<()> {
        let value = self.slots[staged as usize].data.clone();
        match mode {
            WriteMode::Add => {
                if world.has_component::<T>(target) {
                    return Err(EcsError::ComponentAlreadyPresent(std::any::type_name::<T>()));
                }
                world.activate_component::<T>(target)?;
            }
            WriteMode::Set => {
                if !world.has_component::<T>(target) {
                    return Err(EcsError::ComponentMissing(std::any::type_name::<T>()));
                }
            }
            WriteMode::AddOrSet => {
                if !world.has_component::<T>(target) {
                    world.activate_component::<T>(target)?;
                }
            }
        }
        world.write_component::<T>(target, value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Typed view of one pool through its owning world.
///
/// Borrows the world mutably, so only one table handle can exist at a time;
/// structural changes made while iterating a filter belong in a
/// [`CommandBuffer`](crate::CommandBuffer) instead.
pub struct Table<'w, T: Component> {
    world: &'w mut World,
    pool: PoolId,
    _marker: std::marker::PhantomData<T>,
}

impl<'w, T: Component> Table<'w, T> {
    pub(crate) fn new(world: &'w mut World, pool: PoolId) -> Self {
        Self {
            world,
            pool,
            _marker: std::marker::PhantomData,
        }
    }

    /// Pool id of this table.
    pub fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Attach the component with its default payload and return a mutable
    /// handle to it. Fails if the entity is dead or already holds the
    /// component.
    pub fn add(&mut self, entity: EntityId) -> Result<&mut T> {
        self.world.add_component::<T>(entity)
    }

    /// Read the attached payload.
    pub fn get(&self, entity: EntityId) -> Result<&T> {
        self.world.get_component::<T>(entity)
    }

    /// Read the attached payload mutably.
    pub fn get_mut(&mut self, entity: EntityId) -> Result<&mut T> {
        self.world.get_component_mut::<T>(entity)
    }

    /// O(1) attachment check; never fails.
    pub fn has(&self, entity: EntityId) -> bool {
        self.world.has_component::<T>(entity)
    }

    /// Detach the component. No-op when not attached; destroys the entity
    /// when this was its last component.
    pub fn delete(&mut self, entity: EntityId) -> Result<()> {
        self.world.remove_component::<T>(entity)
    }

    /// Attach bookkeeping without touching the payload (the slot was
    /// written out-of-band).
    pub fn activate(&mut self, entity: EntityId) -> Result<()> {
        self.world.activate_component::<T>(entity)
    }

    /// Raw slot copy between two entities of the same world, activating the
    /// destination first when needed.
    pub fn copy(&mut self, src: EntityId, dst: EntityId) -> Result<()> {
        self.world.copy_component(self.pool, src, dst)
    }

    /// Raw slot copy into another world, activating the destination first
    /// when needed.
    pub fn copy_into(&self, src: EntityId, dst_world: &mut World, dst: EntityId) -> Result<()> {
        self.world.copy_component_into::<T>(src, dst_world, dst)
    }
}
