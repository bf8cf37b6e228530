//! Global state machine.

use bevy::prelude::*;

/// `InGame` is the scene the pool controller lives in. Entering it activates the
/// controller; a scene-unload notification tears it down.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    InGame,
}
