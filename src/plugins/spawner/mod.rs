//! Spawner plugin: rate-controlled release of pooled entities (authority only).
//!
//! # Pipeline (Update, InGame)
//! ```text
//!   SetSpawnRate messages ─► apply_rate_requests ─► SpawnScheduler.set_rate
//!                                                        │
//!   Time ─────────────────► run_spawn_scheduler ─► advance(now) = n
//!                                 │
//!                                 └─► release_batch(n):
//!                                       acquire ─► anchor ─► random heading ─► announce
//!
//!   expire_lifetimes ─► despawn_replicated ─► hook.destruct ─► back in the pool
//! ```
//!
//! `SpawnScheduler` exists only on the authority: the controller inserts it on
//! activation and removes it on teardown, which gates every system below.

pub mod scheduler;
pub mod systems;

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::common::state::GameState;

pub use scheduler::{SchedulerPhase, SpawnScheduler};

/// Rate control surface. Negative values are clamped to 0.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SetSpawnRate(pub i32);

/// Time left before the authority returns an entity to the pool.
#[derive(Component, Deref, DerefMut)]
pub struct Lifetime(pub Timer);

/// Heading source. Seed it in tests for deterministic directions.
#[derive(Resource)]
pub struct SpawnRng(pub ChaCha8Rng);

impl Default for SpawnRng {
    fn default() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl SpawnRng {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

pub fn plugin(app: &mut App) {
    app.add_message::<SetSpawnRate>()
        .init_resource::<SpawnRng>();

    app.add_systems(
        Update,
        (
            systems::apply_rate_requests,
            systems::run_spawn_scheduler.run_if(resource_exists::<SpawnScheduler>),
            systems::expire_lifetimes.run_if(resource_exists::<SpawnScheduler>),
        )
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}
