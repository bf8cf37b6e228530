//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests/diagnostics without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; applying them is normally handled by
//! `ApplyDeferred` / schedule boundaries. We call `world.flush()` after running so queued commands
//! are applied before assertions.

use std::time::Duration;

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::settings::PoolSettings;
use crate::plugins::replication::{Replication, Role};
use crate::plugins::spawner::SpawnRng;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// Bare world with the resources the pool/controller/spawner read.
pub fn world_with_role(role: Role, settings: PoolSettings) -> World {
    let mut world = World::new();
    world.insert_resource(Time::<()>::default());
    world.insert_resource(settings);
    world.insert_resource(Replication::new(role));
    world.insert_resource(SpawnRng::seeded(7));
    world
}

/// Move the generic clock forward.
pub fn advance_time(world: &mut World, dt: Duration) {
    world.resource_mut::<Time>().advance_by(dt);
}
