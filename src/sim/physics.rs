//! Movement integration
//!
//! One explicit Euler step per call. Everything the step depends on is in
//! the arguments, so the same inputs always give the same result.

use glam::Vec2;

use super::object::GameObject;
use crate::settings::PhysicsSettings;

/// Advance an object's velocity and position by `dt`
///
/// Order: external acceleration, gravity (airborne only, capped at the max
/// fall speed), horizontal friction, position integration, velocity caps.
/// Friction only acts while no horizontal acceleration drives the object,
/// and snaps the speed to exactly zero once it drops below
/// `world.min_movement`.
pub fn update_movement(
    object: &mut GameObject,
    dt: f32,
    gravity: f32,
    on_ground: bool,
    world: &PhysicsSettings,
) {
    object.begin_step();

    object.vel += object.accel * dt;

    if !on_ground {
        object.vel.y = (object.vel.y + gravity * dt).min(world.max_fall_speed);
    }

    if object.friction > 0.0 && object.accel.x == 0.0 {
        let rate = if on_ground {
            object.friction
        } else {
            world.air_resistance
        };
        object.vel.x = apply_friction(object.vel.x, rate, dt, world.min_movement);
    }

    object.translate(object.vel * dt);

    object.vel = clamp_velocity(object.vel, object.max_vel);
}

/// Decay a speed toward zero, snapping once it is below `min_movement`
#[inline]
pub fn apply_friction(speed: f32, rate: f32, dt: f32, min_movement: f32) -> f32 {
    let decayed = speed * (1.0 - rate * dt).max(0.0);
    if decayed.abs() < min_movement { 0.0 } else { decayed }
}

/// Clamp each axis to ±max
#[inline]
pub fn clamp_velocity(vel: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(vel.x.clamp(-max.x, max.x), vel.y.clamp(-max.y, max.y))
}
