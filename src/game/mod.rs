//! Game composition root.
//!
//! Provides two public configuration functions:
//! - `configure_full`: includes DefaultPlugins (window/render) + game plugins.
//! - `configure_headless`: minimal configuration for integration tests.
//!
//! The replication layer is inserted by the caller; `configure_full` falls back
//! to a host (authority + local replica) when none was provided.

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::settings::PoolSettings;
use crate::common::state::GameState;
use crate::plugins;
use crate::plugins::replication::{Replication, Role};

/// Settings file read by `run` when present.
const SETTINGS_PATH: &str = "pool_spawner.toml";

pub fn run() {
    let settings = PoolSettings::load(SETTINGS_PATH);

    let mut app = App::new();
    if let Ok(settings) = &settings {
        app.insert_resource(settings.clone());
    }
    app.add_plugins(configure_full);

    // Logging exists only once DefaultPlugins are in.
    if let Err(e) = settings {
        warn!("using default settings ({SETTINGS_PATH}: {e})");
    }
    app.run();
}

/// Full configuration for `cargo run`.
pub fn configure_full(app: &mut App) {
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Pool Spawner".into(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    }));

    if !app.world().contains_resource::<Replication>() {
        app.insert_resource(Replication::new(Role::Host));
    }

    configure_game(app);
    plugins::register_render(app);
}

/// Headless configuration for integration tests.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (camera).
/// - Insert `Replication` (and optionally `PoolSettings`) before calling.
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}
