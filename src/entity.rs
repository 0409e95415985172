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

//! Entity identifiers, per-entity metadata and weak packed references.

use crate::world::World;

/// Index of an entity inside its world.
///
/// Plain index, only meaningful together with the world that issued it.
/// For storage inside component data use [`PackedEntity`] instead.
pub type EntityId = u32;

/// Signed generation counter. Positive while the entity is alive, negative
/// once the id sits on the recycle list.
pub type Generation = i32;

/// Per-id bookkeeping held by the world.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EntityMeta {
    pub generation: Generation,
    /// Number of components currently attached.
    pub components: u32,
}

impl EntityMeta {
    pub(crate) fn fresh() -> Self {
        Self {
            generation: 1,
            components: 0,
        }
    }

    /// Flip the generation into its dead (negative) range. Wraps to the
    /// first dead generation when the positive range is exhausted.
    pub(crate) fn kill(&mut self) {
        self.generation = if self.generation == Generation::MAX {
            -1
        } else {
            -(self.generation + 1)
        };
    }

    /// Flip a recycled generation back into the alive (positive) range.
    pub(crate) fn revive(&mut self) {
        self.generation = -self.generation;
    }
}

/// Weak value-type reference to an entity: `(id, generation)`.
///
/// Safe to store inside component payloads and across deferred-buffer
/// boundaries; [`PackedEntity::resolve`] re-validates the generation against
/// a world every time, so a stale reference can never yield a live id.
///
/// The `Default` value never resolves (generation 0 marks no entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PackedEntity {
    pub(crate) id: EntityId,
    pub(crate) generation: Generation,
}

impl PackedEntity {
    /// Raw id this reference was captured from. Do not use for component
    /// access without resolving first.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Generation captured at pack time.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Validate against `world` and return the live id, or `None` if the
    /// entity has been destroyed (or recycled) since this reference was
    /// captured.
    pub fn resolve(&self, world: &World) -> Option<EntityId> {
        world.unpack(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_flip_cycle() {
        let mut meta = EntityMeta::fresh();
        assert_eq!(meta.generation, 1);
        meta.kill();
        assert_eq!(meta.generation, -2);
        meta.revive();
        assert_eq!(meta.generation, 2);
        meta.kill();
        assert_eq!(meta.generation, -3);
    }

    #[test]
    fn generation_wraps_at_max() {
        let mut meta = EntityMeta {
            generation: Generation::MAX,
            components: 0,
        };
        meta.kill();
        assert_eq!(meta.generation, -1);
        meta.revive();
        assert_eq!(meta.generation, 1);
    }

    #[test]
    fn default_packed_entity_is_null() {
        let packed = PackedEntity::default();
        assert_eq!(packed.generation(), 0);
        let world = World::new();
        assert!(packed.resolve(&world).is_none());
    }
}
