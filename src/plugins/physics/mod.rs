//! Physics plugin: avian2d integrates the motion assigned to released entities.

use avian2d::prelude::*;
use bevy::prelude::*;

/// Length unit for avian2d: pixels per meter.
const PIXELS_PER_METER: f32 = 20.0;

pub fn plugin(app: &mut App) {
    app.add_plugins(PhysicsPlugins::default().with_length_unit(PIXELS_PER_METER));
    app.insert_resource(Gravity(Vec2::ZERO));
}

/// Hand a direction and speed to the entity's own motion integration.
///
/// `direction` is normalized here; a zero vector stops the entity.
pub fn set_direction_and_speed(world: &mut World, entity: Entity, direction: Vec2, speed: f32) {
    let velocity = direction.normalize_or_zero() * speed;
    if let Some(mut vel) = world.get_mut::<LinearVelocity>(entity) {
        vel.0 = velocity;
    } else if let Ok(mut e) = world.get_entity_mut(entity) {
        e.insert(LinearVelocity(velocity));
    }
}
