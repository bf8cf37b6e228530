//! Core plugin: shared resources and global settings.

use crate::common::settings::PoolSettings;
use bevy::prelude::*;

/// Keeps settings inserted before the plugin; otherwise installs defaults.
pub fn plugin(app: &mut App) {
    app.init_resource::<PoolSettings>();
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
