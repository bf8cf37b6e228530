use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::template::EntityTemplate;
use crate::plugins::replication::{despawn_if_exists, despawn_replicated, Replication};

use super::components::{EntityState, PooledEntity};

/// Recycled instances of one template, in creation order.
///
/// The pool is an amortizing cache, not a bound: `acquire` grows it when every
/// member is active. It only shrinks on `teardown`.
#[derive(Resource, Debug, Default)]
pub struct EntityPool {
    capacity: usize,
    members: Vec<Entity>,
    prototype: Option<EntityTemplate>,
    handler_managed: bool,
}

impl EntityPool {
    pub fn new(handler_managed: bool) -> Self {
        Self {
            handler_managed,
            ..default()
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn members(&self) -> &[Entity] {
        &self.members
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn prototype(&self) -> Option<&EntityTemplate> {
        self.prototype.as_ref()
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.prototype.is_some()
    }

    /// Pre-spawn `capacity` inactive members. A second call before `teardown` is ignored.
    pub fn initialize(&mut self, world: &mut World, capacity: usize, prototype: EntityTemplate) {
        if self.is_initialized() {
            warn!("entity pool already initialized; ignoring re-initialize");
            return;
        }

        self.capacity = capacity;
        self.members.reserve(capacity);
        for _ in 0..capacity {
            let e = spawn_member(world, &prototype, self.handler_managed);
            self.members.push(e);
        }
        self.prototype = Some(prototype);
        info!("entity pool filled: {capacity} inactive members");
    }

    /// First inactive member in creation order, activated. Grows by one when
    /// none is inactive. `None` only before `initialize`.
    pub fn acquire(&mut self, world: &mut World) -> Option<Entity> {
        if !self.is_initialized() {
            return None;
        }
        self.prune(world);
        let prototype = self.prototype.as_ref()?;

        let reusable = self.members.iter().copied().find(|&e| {
            world.get::<EntityState>(e) == Some(&EntityState::Inactive)
                && world.get::<PooledEntity>(e).is_some_and(PooledEntity::pool_member)
        });

        let e = match reusable {
            Some(e) => e,
            None => {
                let e = spawn_member(world, prototype, self.handler_managed);
                self.members.push(e);
                debug!("entity pool grew to {}", self.members.len());
                e
            }
        };

        activate(world, e);
        Some(e)
    }

    /// Evict every member and remove it.
    ///
    /// On the authority, announced members are withdrawn from replicas first;
    /// everything else is despawned directly. Safe to call repeatedly.
    pub fn teardown(&mut self, world: &mut World) -> usize {
        let members = std::mem::take(&mut self.members);
        let count = members.len();

        let authority = world
            .get_resource::<Replication>()
            .is_some_and(Replication::is_authority);

        for e in members {
            if let Some(mut pooled) = world.get_mut::<PooledEntity>(e) {
                pooled.evict();
            }

            let announced = authority && world.resource::<Replication>().is_announced(e);
            if announced {
                despawn_replicated(world, e);
            } else {
                despawn_if_exists(world, e);
            }
        }

        self.prototype = None;
        if count > 0 {
            info!("entity pool torn down: {count} members removed");
        }
        count
    }

    /// Drop handles whose entity no longer exists.
    fn prune(&mut self, world: &World) {
        let before = self.members.len();
        self.members.retain(|&e| world.get_entity(e).is_ok());
        let pruned = before - self.members.len();
        if pruned > 0 {
            debug!("pruned {pruned} dead pool members");
        }
    }
}

fn spawn_member(world: &mut World, prototype: &EntityTemplate, handler_managed: bool) -> Entity {
    world
        .spawn((
            prototype.bundle(),
            PooledEntity::new(handler_managed),
            EntityState::Inactive,
        ))
        .id()
}

/// Active: visible, eligible for motion.
pub fn activate(world: &mut World, e: Entity) {
    if let Ok(mut entity) = world.get_entity_mut(e) {
        entity.insert((EntityState::Active, Visibility::Visible));
    }
}

/// The single place that writes the inactive invariants: hidden, not moving.
pub fn deactivate(world: &mut World, e: Entity) {
    if let Ok(mut entity) = world.get_entity_mut(e) {
        entity.insert((
            EntityState::Inactive,
            Visibility::Hidden,
            LinearVelocity(Vec2::ZERO),
        ));
    }
}
