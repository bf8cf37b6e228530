//! Feature plugins.

use bevy::prelude::*;

pub mod controller;
pub mod core;
pub mod physics;
pub mod pool;
pub mod replication;
pub mod scene;
pub mod spawner;

// Render-only
pub mod camera;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    scene::plugin(app);
    replication::plugin(app);
    spawner::plugin(app);
    controller::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
}
