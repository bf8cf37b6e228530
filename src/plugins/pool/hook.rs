//! Pool-backed instantiation hook.
//!
//! Registered with the replication layer on both roles. Construction always draws
//! from this process's own `EntityPool`; destruction recycles pool-managed
//! instances and destroys everything else. An instance that came from the pool
//! is never unconditionally destroyed by this path.

use bevy::prelude::*;

use crate::plugins::replication::{despawn_if_exists, InstantiationHook, OwnerId};

use super::components::PooledEntity;
use super::entity_pool::{deactivate, EntityPool};

#[derive(Debug, Default, Clone, Copy)]
pub struct PooledInstantiationHook;

impl InstantiationHook for PooledInstantiationHook {
    fn construct(
        &self,
        world: &mut World,
        owner: OwnerId,
        position: Vec3,
        rotation: Quat,
    ) -> Option<Entity> {
        if !world.contains_resource::<EntityPool>() {
            warn!("construct for {owner:?}: no entity pool on this process");
            return None;
        }

        let e = world.resource_scope(|world, mut pool: Mut<EntityPool>| pool.acquire(world))?;

        if let Some(mut tf) = world.get_mut::<Transform>(e) {
            tf.translation = position;
            tf.rotation = rotation;
        }
        debug!("hook constructed {e} for {owner:?}");
        Some(e)
    }

    fn destruct(&self, world: &mut World, entity: Entity) {
        let recycle = world
            .get::<PooledEntity>(entity)
            .is_some_and(PooledEntity::is_pool_managed);

        if recycle {
            deactivate(world, entity);
            debug!("hook recycled {entity}");
        } else {
            despawn_if_exists(world, entity);
            debug!("hook destroyed {entity}");
        }
    }
}
