//! Camera plugin: a 2D camera centred on the spawn anchor.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::settings::PoolSettings;
use crate::common::state::GameState;

#[derive(Component)]
pub struct MainCamera;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera);
}

fn spawn_camera(mut commands: Commands, settings: Res<PoolSettings>) {
    commands.spawn((
        Name::new("MainCamera"),
        MainCamera,
        Camera2d,
        Transform::from_translation(settings.anchor().extend(10.0)),
        DespawnOnExit(GameState::InGame),
    ));
}
