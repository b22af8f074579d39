//! Collision-aware horizontal movement for actors.

use bevy::prelude::*;

use crate::actor::Actor;
use crate::config::MovementConfig;
use crate::spatial::{Aabb, CollisionWorld};

/// Yaw facing along `dir` on the XZ plane.
/// In Bevy: +X is right, +Y is up, -Z is forward.
#[inline]
pub fn yaw_toward(dir: Vec3) -> f32 {
    (-dir.x).atan2(-dir.z)
}

/// Smoothly rotate current angle toward target angle at a given speed.
/// Returns the new angle after rotation.
pub fn smooth_rotate_toward(current: f32, target: f32, turn_speed: f32, dt: f32) -> f32 {
    use std::f32::consts::PI;

    // Normalize angle difference to [-PI, PI]
    let mut diff = target - current;
    while diff > PI {
        diff -= 2.0 * PI;
    }
    while diff < -PI {
        diff += 2.0 * PI;
    }

    // Turn at most turn_speed * dt radians this frame
    let max_turn = turn_speed * dt;
    if diff.abs() <= max_turn {
        target
    } else {
        current + diff.signum() * max_turn
    }
}

/// Whether a box centered on `center` would be walled off by nearby geometry.
///
/// Overlapping a solid is fine when the feet are at or above its top minus
/// `step_tolerance`: the actor walks onto it instead of bumping into it.
pub fn is_blocked(
    world: &dyn CollisionWorld,
    center: Vec3,
    half_extents: Vec3,
    step_tolerance: f32,
) -> bool {
    let bounds = Aabb::from_center_half_extents(center, half_extents);
    let bottom = bounds.min.y;

    world
        .query_near(center, half_extents.length())
        .iter()
        .any(|solid| solid.bounds.intersects(&bounds) && bottom < solid.top() - step_tolerance)
}

/// Move `actor` toward `target` by at most `speed * dt` on the XZ plane.
///
/// Returns `false` (position unchanged) when the move would run into a wall or there is
/// nowhere left to go. On success the actor is flagged as moving for this tick and its
/// facing turns toward the direction of travel.
pub fn try_move(
    world: &dyn CollisionWorld,
    actor: &mut Actor,
    target: Vec3,
    config: &MovementConfig,
    dt: f32,
) -> bool {
    let to = target - actor.position;
    let flat = Vec3::new(to.x, 0.0, to.z);
    let dist = flat.length();
    let step = (actor.descriptor.speed * dt).min(dist);

    if dist <= f32::EPSILON || step <= 0.0 {
        return false;
    }

    let dir = flat / dist;
    let proposed = actor.position + dir * step;

    if is_blocked(world, proposed, actor.half_extents(), config.step_tolerance) {
        return false;
    }

    actor.position = proposed;
    actor.moving = true;
    actor.facing = smooth_rotate_toward(actor.facing, yaw_toward(dir), config.turn_speed, dt);
    true
}

/// Turn `actor` in place to look at `point`.
pub fn face_toward(actor: &mut Actor, point: Vec3, config: &MovementConfig, dt: f32) {
    let to = point - actor.position;
    let flat = Vec3::new(to.x, 0.0, to.z);
    if flat.length_squared() <= f32::EPSILON {
        return;
    }
    actor.facing = smooth_rotate_toward(
        actor.facing,
        yaw_toward(flat.normalize()),
        config.turn_speed,
        dt,
    );
}
