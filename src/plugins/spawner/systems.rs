use std::f32::consts::TAU;

use bevy::prelude::*;
use bevy::ecs::message::MessageReader;
use rand::Rng;

use crate::common::settings::{clamp_rate, PoolSettings};
use crate::plugins::physics::set_direction_and_speed;
use crate::plugins::pool::{EntityPool, EntityState};
use crate::plugins::replication::{announce_entity, despawn_replicated, Replication};

use super::scheduler::SpawnScheduler;
use super::{Lifetime, SetSpawnRate, SpawnRng};

/// Control surface: apply rate requests and mirror the accepted value into settings.
pub fn apply_rate_requests(
    mut reader: MessageReader<SetSpawnRate>,
    time: Res<Time>,
    mut settings: ResMut<PoolSettings>,
    mut scheduler: Option<ResMut<SpawnScheduler>>,
) {
    for &SetSpawnRate(requested) in reader.read() {
        let accepted = match scheduler.as_deref_mut() {
            Some(scheduler) => scheduler.set_rate(requested, time.elapsed()) as i32,
            None => clamp_rate(requested),
        };
        settings.spawn_rate = accepted;
    }
}

/// Drive the scheduler and release whatever it asks for this frame.
pub fn run_spawn_scheduler(world: &mut World) {
    let now = world.resource::<Time>().elapsed();
    let enabled = world.resource::<PoolSettings>().auto_spawn_enabled;

    let releases = world.resource_mut::<SpawnScheduler>().advance(now, enabled);
    if releases > 0 {
        release_batch(world, releases);
    }
}

/// Acquire `count` entities, place them at the anchor, give them a random
/// heading, and announce them. Returns the number actually released.
pub fn release_batch(world: &mut World, count: u32) -> u32 {
    if !world.contains_resource::<EntityPool>() {
        warn!("release skipped: no entity pool");
        return 0;
    }

    let settings = world.resource::<PoolSettings>();
    let anchor = settings.anchor();
    let speed = settings.entity_speed;
    let lifetime = settings.entity_lifetime;
    let reliable = settings.reliable_announce;

    let mut released = 0;
    for _ in 0..count {
        let Some(e) = world.resource_scope(|world, mut pool: Mut<EntityPool>| pool.acquire(world))
        else {
            warn!("entity pool produced no instance");
            break;
        };

        if let Some(mut tf) = world.get_mut::<Transform>(e) {
            tf.translation = anchor.extend(tf.translation.z);
        }

        let angle = world.resource_mut::<SpawnRng>().0.gen_range(0.0..TAU);
        set_direction_and_speed(world, e, Vec2::from_angle(angle), speed);

        if lifetime > 0.0 {
            world
                .entity_mut(e)
                .insert(Lifetime(Timer::from_seconds(lifetime, TimerMode::Once)));
        }

        let announced = world
            .get_resource::<Replication>()
            .is_some_and(|r| r.is_announced(e));
        if !announced {
            announce_entity(world, e, reliable);
        }
        released += 1;
    }

    debug!("released {released} entities");
    released
}

/// Authority: hand expired entities back through the replication layer.
pub fn expire_lifetimes(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut Lifetime, &EntityState)>,
) {
    for (e, mut lifetime, state) in &mut q {
        if *state != EntityState::Active {
            continue;
        }
        lifetime.tick(time.delta());
        if lifetime.is_finished() {
            commands.queue(move |world: &mut World| despawn_replicated(world, e));
        }
    }
}
