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

//! Cross-module integration tests for the storage kernel.

use crate::{CommandBuffer, Component, EcsError, Result, World};

#[derive(Debug, Default, Clone, PartialEq)]
struct Health(u32);
impl Component for Health {}

#[derive(Debug, Default, Clone, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Debug, Default, Clone, PartialEq)]
struct Poisoned;
impl Component for Poisoned {}

#[test]
fn no_two_alive_entities_share_an_id() -> Result<()> {
    let mut world = World::new();
    let mut alive = std::collections::HashSet::new();
    for _ in 0..64 {
        assert!(alive.insert(world.create_entity()));
    }
    // Kill half, recreate, and check uniqueness again.
    let victims: Vec<_> = alive.iter().copied().take(32).collect();
    for e in victims {
        world.destroy_entity(e)?;
        alive.remove(&e);
    }
    for _ in 0..32 {
        assert!(alive.insert(world.create_entity()));
    }
    assert_eq!(world.entity_count(), 64);
    Ok(())
}

#[test]
fn generation_strictly_increases_across_reuse() -> Result<()> {
    let mut world = World::new();
    let e = world.create_entity();
    let mut last = world.generation(e).unwrap();
    for _ in 0..8 {
        world.destroy_entity(e)?;
        let again = world.create_entity();
        assert_eq!(again, e);
        let gen = world.generation(e).unwrap();
        assert!(gen > last);
        last = gen;
    }
    Ok(())
}

#[test]
fn deleted_component_reads_back_as_zero_value() -> Result<()> {
    let mut world = World::new();
    let e = world.create_entity();
    // Keep a second component attached so the delete does not destroy e.
    world.add_component::<Poisoned>(e)?;
    world.add_component::<Health>(e)?.0 = 77;
    world.remove_component::<Health>(e)?;
    assert!(!world.has_component::<Health>(e));
    assert_eq!(*world.add_component::<Health>(e)?, Health::default());
    Ok(())
}

#[test]
fn filter_follows_include_and_exclude_transitions() -> Result<()> {
    let mut world = World::new();
    // Filter exists before any entity does.
    let filter = world
        .build_filter()
        .with::<Health>()
        .with::<Position>()
        .without::<Poisoned>()
        .build()?;
    assert!(world.filter_is_empty(filter));

    let e = world.create_entity();
    world.add_component::<Health>(e)?;
    assert!(world.filter_is_empty(filter));
    world.add_component::<Position>(e)?;
    assert_eq!(world.filter_entities(filter), &[e]);

    world.add_component::<Poisoned>(e)?;
    assert!(world.filter_is_empty(filter));

    world.remove_component::<Poisoned>(e)?;
    assert_eq!(world.filter_entities(filter), &[e]);
    Ok(())
}

#[test]
fn deleting_last_component_destroys_the_entity() -> Result<()> {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component::<Health>(e)?;
    world.add_component::<Position>(e)?;

    world.remove_component::<Position>(e)?;
    assert!(world.is_alive(e));

    world.remove_component::<Health>(e)?;
    assert!(!world.is_alive(e));
    Ok(())
}

#[test]
fn health_filter_scenario() -> Result<()> {
    let mut world = World::new();
    let e1 = world.create_entity();
    let e2 = world.create_entity();
    let e3 = world.create_entity();

    world.add_component::<Health>(e1)?.0 = 100;
    world.add_component::<Health>(e2)?.0 = 100;
    world.add_component::<Position>(e3)?;

    let filter = world.build_filter().with::<Health>().build()?;
    assert_eq!(world.filter_entities(filter), &[e1, e2]);

    world.remove_component::<Health>(e1)?;
    assert_eq!(world.filter_entities(filter), &[e2]);
    Ok(())
}

#[test]
fn identical_masks_share_one_filter() -> Result<()> {
    let mut world = World::new();
    let a = world
        .build_filter()
        .with::<Health>()
        .without::<Poisoned>()
        .build()?;
    // Same mask in a different declaration order.
    let b = world
        .build_filter()
        .without::<Poisoned>()
        .with::<Health>()
        .build()?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn filter_masks_are_validated() {
    let mut world = World::new();
    assert_eq!(world.build_filter().build(), Err(EcsError::FilterWithoutInclude));
    assert!(matches!(
        world
            .build_filter()
            .with::<Health>()
            .without::<Health>()
            .build(),
        Err(EcsError::FilterIncludeExcludeOverlap(_))
    ));
}

#[test]
fn command_buffer_add_then_destroy_leaves_no_trace() -> Result<()> {
    let mut world = World::new();
    let e = world.create_entity();
    let packed = world.pack_entity(e)?;

    let mut buffer = CommandBuffer::new();
    buffer.add_component(packed, Position { x: 3.0, y: 4.0 });
    buffer.destroy_entity(packed);
    buffer.playback(&mut world)?;

    assert!(buffer.is_empty());
    assert!(!world.is_alive(e));
    assert!(!world.has_component::<Position>(e));

    // The recycled id starts from a clean slate.
    let e2 = world.create_entity();
    assert_eq!(e2, e);
    assert_eq!(*world.add_component::<Position>(e2)?, Position::default());
    Ok(())
}

#[test]
fn deferred_mutation_during_filter_iteration() -> Result<()> {
    let mut world = World::new();
    for hp in [10u32, 0, 25, 0] {
        let e = world.create_entity();
        world.add_component::<Health>(e)?.0 = hp;
    }
    let filter = world.build_filter().with::<Health>().build()?;

    // Iterate the live set without mutating it; schedule the structural
    // changes and play them back afterwards.
    let mut buffer = CommandBuffer::new();
    for e in world.iter_filter(filter) {
        if world.get_component::<Health>(e)?.0 == 0 {
            buffer.destroy_entity(world.pack_entity(e)?);
        }
    }
    buffer.playback(&mut world)?;

    assert_eq!(world.filter_len(filter), 2);
    for e in world.iter_filter(filter) {
        assert!(world.get_component::<Health>(e)?.0 > 0);
    }
    Ok(())
}

#[test]
fn composition_copy_round_trip() -> Result<()> {
    let mut world = World::new();
    let src = world.create_entity();
    world.add_component::<Health>(src)?.0 = 42;
    *world.add_component::<Position>(src)? = Position { x: 1.5, y: -2.5 };

    let dst = world.create_entity();
    for pool in world.components_of(src) {
        world.copy_component(pool, src, dst)?;
    }

    assert_eq!(world.components_of(dst), world.components_of(src));
    assert_eq!(
        world.get_component::<Health>(dst)?,
        world.get_component::<Health>(src)?
    );
    assert_eq!(
        world.get_component::<Position>(dst)?,
        world.get_component::<Position>(src)?
    );
    Ok(())
}

#[test]
fn typed_table_view() -> Result<()> {
    let mut world = World::new();
    let a = world.create_entity();
    let b = world.create_entity();

    let mut table = world.table::<Health>();
    table.add(a)?.0 = 50;
    assert!(table.has(a));
    assert!(!table.has(b));
    assert_eq!(table.get(a)?, &Health(50));

    table.get_mut(a)?.0 += 25;
    table.copy(a, b)?;
    assert_eq!(table.get(b)?, &Health(75));

    table.delete(a)?;
    assert!(!world.has_component::<Health>(a));
    // a had only Health attached, so it is gone.
    assert!(!world.is_alive(a));

    // Activation attaches without touching the payload; the recycled slot
    // was scrubbed back to the zero value.
    let c = world.create_entity();
    let mut table = world.table::<Health>();
    table.activate(c)?;
    assert_eq!(table.get(c)?, &Health::default());
    Ok(())
}

#[test]
fn table_copy_into_other_world() -> Result<()> {
    let mut src_world = World::new();
    let src = src_world.create_entity();
    src_world.add_component::<Health>(src)?.0 = 5;

    let mut dst_world = World::new();
    let dst = dst_world.create_entity();
    src_world.table::<Health>().copy_into(src, &mut dst_world, dst)?;
    assert_eq!(*dst_world.get_component::<Health>(dst)?, Health(5));
    Ok(())
}

#[test]
fn pool_introspection() -> Result<()> {
    let mut world = World::new();
    let e = world.create_entity();
    world.add_component::<Health>(e)?;
    world.add_component::<Position>(e)?;
    assert_eq!(world.pool_count(), 2);

    for pool in world.components_of(e) {
        let name = world.pool_type_name(pool)?;
        assert!(name.contains("Health") || name.contains("Position"));
    }
    assert!(matches!(
        world.pool_type_name(99),
        Err(EcsError::UnknownPool(99))
    ));
    Ok(())
}

#[test]
fn cross_world_copy() -> Result<()> {
    let mut src_world = World::new();
    let src = src_world.create_entity();
    src_world.add_component::<Health>(src)?.0 = 13;

    let mut dst_world = World::new();
    let dst = dst_world.create_entity();
    src_world.copy_component_into::<Health>(src, &mut dst_world, dst)?;

    assert_eq!(*dst_world.get_component::<Health>(dst)?, Health(13));
    // Activation bookkeeping ran in the destination world.
    assert_eq!(dst_world.component_count(dst), 1);
    Ok(())
}
