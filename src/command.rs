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

//! Deferred command buffer
//!
//! Records structural mutations while a world is being iterated and replays
//! them afterwards. Payloads are written into a private staging world at
//! schedule time; targets are weak [`PackedEntity`] references resolved at
//! playback, so a target destroyed in the meantime simply invalidates its
//! pending writes.

use tracing::trace;

use crate::component::Component;
use crate::entity::{EntityId, PackedEntity};
use crate::error::Result;
use crate::pool::{PoolId, WriteMode};
use crate::world::{World, WorldConfig};

/// Recorded structural mutation. `pool` always names a table in the
/// buffer's staging world, which is how playback recovers the component
/// type; `staged` is the scratch entity holding the payload.
#[derive(Debug, Clone, Copy)]
enum Command {
    DestroyEntity {
        target: PackedEntity,
    },
    DeleteComponent {
        target: PackedEntity,
        pool: PoolId,
    },
    AddComponent {
        target: PackedEntity,
        pool: PoolId,
        staged: EntityId,
    },
    SetComponent {
        target: PackedEntity,
        pool: PoolId,
        staged: EntityId,
    },
    AddOrSetComponent {
        target: PackedEntity,
        pool: PoolId,
        staged: EntityId,
    },
    ActivateComponent {
        target: PackedEntity,
        pool: PoolId,
    },
}

/// Append-only buffer of deferred structural mutations.
///
/// The sanctioned pattern for mutating entities visited during filter
/// iteration: schedule here, iterate to completion, then
/// [`playback`](CommandBuffer::playback).
pub struct CommandBuffer {
    staging: World,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create a buffer with a small staging world.
    pub fn new() -> Self {
        Self::with_config(WorldConfig {
            entity_capacity: 64,
            recycled_capacity: 64,
            pool_capacity: 16,
            filter_capacity: 1,
        })
    }

    /// Create a buffer whose staging world uses explicit capacities.
    pub fn with_config(staging: WorldConfig) -> Self {
        Self {
            staging: World::with_config(staging),
            commands: Vec::new(),
        }
    }

    fn stage<T: Component>(&mut self, value: T) -> (PoolId, EntityId) {
        let staged = self.staging.create_entity();
        match self.staging.add_component::<T>(staged) {
            Ok(slot) => *slot = value,
            Err(_) => unreachable!("fresh staging entity rejected a component"),
        }
        (self.staging.pool_id::<T>(), staged)
    }

    /// Schedule destruction of the target entity.
    pub fn destroy_entity(&mut self, target: PackedEntity) {
        self.commands.push(Command::DestroyEntity { target });
    }

    /// Schedule detachment of component `T` from the target entity.
    pub fn delete_component<T: Component>(&mut self, target: PackedEntity) {
        let pool = self.staging.pool_id::<T>();
        self.commands.push(Command::DeleteComponent { target, pool });
    }

    /// Schedule attachment of component `T` with the given payload. The
    /// payload is staged immediately; the target slot must still be free at
    /// playback.
    pub fn add_component<T: Component>(&mut self, target: PackedEntity, value: T) {
        let (pool, staged) = self.stage(value);
        self.commands.push(Command::AddComponent {
            target,
            pool,
            staged,
        });
    }

    /// Schedule overwriting the payload of an already attached component.
    pub fn set_component<T: Component>(&mut self, target: PackedEntity, value: T) {
        let (pool, staged) = self.stage(value);
        self.commands.push(Command::SetComponent {
            target,
            pool,
            staged,
        });
    }

    /// Schedule attach-or-overwrite of component `T`.
    pub fn add_or_set_component<T: Component>(&mut self, target: PackedEntity, value: T) {
        let (pool, staged) = self.stage(value);
        self.commands.push(Command::AddOrSetComponent {
            target,
            pool,
            staged,
        });
    }

    /// Schedule attach bookkeeping for a slot whose payload was written
    /// out-of-band. No payload is staged.
    pub fn activate_component<T: Component>(&mut self, target: PackedEntity) {
        let pool = self.staging.pool_id::<T>();
        self.commands
            .push(Command::ActivateComponent { target, pool });
    }

    /// Apply all recorded commands to `world` in FIFO order, then clear the
    /// buffer.
    ///
    /// Commands whose target no longer resolves are skipped silently (a
    /// destroyed entity legitimately invalidates pending writes to it); the
    /// staged payload's scratch entity is released either way.
    pub fn playback(&mut self, world: &mut World) -> Result<()> {
        trace!(commands = self.commands.len(), "command buffer playback");
        let mut commands = std::mem::take(&mut self.commands);
        let mut result = Ok(());
        for command in commands.drain(..) {
            if let Err(err) = self.apply(world, command) {
                result = Err(err);
                break;
            }
        }
        commands.clear();
        self.commands = commands;
        result
    }

    fn apply(&mut self, world: &mut World, command: Command) -> Result<()> {
        match command {
            Command::DestroyEntity { target } => {
                if let Some(entity) = target.resolve(world) {
                    world.destroy_entity(entity)?;
                }
                Ok(())
            }
            Command::DeleteComponent { target, pool } => {
                if let Some(entity) = target.resolve(world) {
                    self.staging.pool_dyn(pool).delete_in(world, entity)?;
                }
                Ok(())
            }
            Command::ActivateComponent { target, pool } => {
                if let Some(entity) = target.resolve(world) {
                    self.staging.pool_dyn(pool).activate_in(world, entity)?;
                }
                Ok(())
            }
            Command::AddComponent {
                target,
                pool,
                staged,
            } => self.apply_staged(world, target, pool, staged, WriteMode::Add),
            Command::SetComponent {
                target,
                pool,
                staged,
            } => self.apply_staged(world, target, pool, staged, WriteMode::Set),
            Command::AddOrSetComponent {
                target,
                pool,
                staged,
            } => self.apply_staged(world, target, pool, staged, WriteMode::AddOrSet),
        }
    }

    fn apply_staged(
        &mut self,
        world: &mut World,
        target: PackedEntity,
        pool: PoolId,
        staged: EntityId,
        mode: WriteMode,
    ) -> Result<()> {
        let result = match target.resolve(world) {
            Some(entity) => self
                .staging
                .pool_dyn(pool)
                .write_staged_into(staged, world, entity, mode),
            None => {
                trace!(entity = target.id(), "staged write skipped, target gone");
                Ok(())
            }
        };
        // The staged payload is consumed (or its target is gone); release
        // the scratch entity in both cases.
        self.staging.destroy_entity(staged)?;
        result
    }

    /// True when no commands are pending. O(1); callers that bind worlds to
    /// a fixed point loop playback until this holds.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Drop all pending commands, releasing their staged payloads.
    pub fn clear(&mut self) -> Result<()> {
        let mut commands = std::mem::take(&mut self.commands);
        for command in commands.drain(..) {
            match command {
                Command::AddComponent { staged, .. }
                | Command::SetComponent { staged, .. }
                | Command::AddOrSetComponent { staged, .. } => {
                    self.staging.destroy_entity(staged)?;
                }
                _ => {}
            }
        }
        self.commands = commands;
        Ok(())
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}
