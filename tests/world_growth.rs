//! Storage growth scenarios: payloads and filter memberships must survive
//! capacity doubling unchanged.

use sparse_ecs::{Component, Result, World, WorldConfig};

#[derive(Debug, Default, Clone, PartialEq)]
struct Health(u32);
impl Component for Health {}

#[derive(Debug, Default, Clone, PartialEq)]
struct Shield(u32);
impl Component for Shield {}

#[test]
fn growth_past_default_capacity_preserves_state() -> Result<()> {
    let mut world = World::new();
    assert_eq!(world.capacity(), 512);

    let filter = world.build_filter().with::<Health>().build()?;

    let mut entities = Vec::new();
    for i in 0..600u32 {
        let e = world.create_entity();
        world.add_component::<Health>(e)?.0 = i;
        if i % 2 == 0 {
            world.add_component::<Shield>(e)?.0 = i * 10;
        }
        entities.push(e);
    }
    assert!(world.capacity() >= 600);

    // Every payload written before the growth is still intact.
    for (i, &e) in entities.iter().enumerate() {
        assert_eq!(world.get_component::<Health>(e)?.0, i as u32);
        if i % 2 == 0 {
            assert_eq!(world.get_component::<Shield>(e)?.0, i as u32 * 10);
        } else {
            assert!(!world.has_component::<Shield>(e));
        }
    }

    // Filter membership is unchanged and still in creation order.
    assert_eq!(world.filter_entities(filter), entities.as_slice());
    Ok(())
}

#[test]
fn tiny_world_doubles_repeatedly() -> Result<()> {
    let mut world = World::with_config(WorldConfig {
        entity_capacity: 4,
        recycled_capacity: 4,
        pool_capacity: 4,
        filter_capacity: 4,
    });
    assert_eq!(world.capacity(), 4);

    for i in 0..40u32 {
        let e = world.create_entity();
        world.add_component::<Health>(e)?.0 = i;
    }
    assert!(world.capacity() >= 40);
    assert_eq!(world.entity_count(), 40);
    Ok(())
}

#[test]
fn recycled_ids_do_not_grow_the_world() -> Result<()> {
    let mut world = World::with_config(WorldConfig {
        entity_capacity: 8,
        ..WorldConfig::default()
    });
    for _ in 0..100 {
        let e = world.create_entity();
        world.add_component::<Health>(e)?;
        world.destroy_entity(e)?;
    }
    assert_eq!(world.capacity(), 8);
    assert_eq!(world.entity_count(), 0);
    Ok(())
}
