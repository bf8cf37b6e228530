//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - the replication role and settings are inserted first, then
//!   `pool_spawner::game::configure_headless` installs gameplay plugins.
//! - time advances a fixed 1/60 s per `update()`.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use pool_spawner::common::settings::PoolSettings;
use pool_spawner::plugins::replication::{Replication, Role};

pub const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

pub fn app_headless(role: Role, settings: PoolSettings) -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.insert_resource(Replication::new(role));
    app.insert_resource(settings);

    pool_spawner::game::configure_headless(&mut app);
    // `App::run` does this before the first update; plugins such as avian2d
    // initialize resources in `Plugin::finish`.
    app.finish();
    app.cleanup();
    app
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Deliver everything the authority announced since the last call.
pub fn relay(from: &mut App, to: &mut App) -> usize {
    let messages = from.world_mut().resource_mut::<Replication>().drain_outbox();
    let n = messages.len();
    to.world_mut().resource_mut::<Replication>().receive(messages);
    n
}

pub fn announced(app: &App) -> usize {
    app.world().resource::<Replication>().announced_count()
}
