//! Scene-lifecycle notifications.
//!
//! The scene manager writes `SceneLifecycleEvent`s. Listeners only run while a
//! `SceneSubscription` exists, so subscribe/unsubscribe is an explicit insert/remove
//! tied to the subscriber's own activation.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEventKind {
    Load,
    Unload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SceneLoadMode {
    #[default]
    Single,
    Additive,
}

#[derive(Message, Clone, Debug, PartialEq, Eq)]
pub struct SceneLifecycleEvent {
    pub kind: SceneEventKind,
    pub scene_name: String,
    pub mode: SceneLoadMode,
}

impl SceneLifecycleEvent {
    pub fn unload(scene_name: impl Into<String>) -> Self {
        Self {
            kind: SceneEventKind::Unload,
            scene_name: scene_name.into(),
            mode: SceneLoadMode::Single,
        }
    }

    #[inline]
    pub fn unloads(&self, scene_name: &str) -> bool {
        self.kind == SceneEventKind::Unload && self.scene_name == scene_name
    }
}

/// Present while someone listens for unload of `scene`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SceneSubscription {
    pub scene: String,
}

pub fn subscribe(world: &mut World, scene: impl Into<String>) {
    let scene = scene.into();
    debug!("subscribed to lifecycle of scene `{scene}`");
    world.insert_resource(SceneSubscription { scene });
}

pub fn unsubscribe(world: &mut World) -> bool {
    world.remove_resource::<SceneSubscription>().is_some()
}

pub fn plugin(app: &mut App) {
    app.add_message::<SceneLifecycleEvent>();
}
