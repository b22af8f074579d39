//! Vertical position-snap physics for actors.
//!
//! Goals:
//! - Keep actors standing on the highest solid under their footprint
//! - Let them climb ledges up to `max_step_height` in a single tick
//! - Drop at a constant speed when nothing holds them up
//!
//! This is intentionally not a rigid-body simulation: nothing but the constant fall
//! speed carries over between ticks.

use bevy::prelude::*;

use crate::config::PhysicsConfig;
use crate::spatial::CollisionWorld;

/// Height of the world's ground plane.
pub const GROUND_LEVEL: f32 = 0.0;

/// Outcome of one vertical step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VerticalStep {
    /// Already resting on the support (within the dead zone).
    Resting,
    /// Snapped up onto a support.
    Snapped,
    /// Moved down this tick.
    Falling,
}

/// Highest solid top under the footprint that the feet can reach.
///
/// Only tops at or below `bottom + max_step_height` qualify; anything taller is a wall.
pub fn support_height(
    world: &dyn CollisionWorld,
    position: Vec3,
    half_extents: Vec3,
    max_step_height: f32,
) -> Option<f32> {
    let bottom = position.y - half_extents.y;
    let reach = bottom + max_step_height;

    world
        .query_column(
            Vec2::new(position.x, position.z),
            Vec2::new(half_extents.x, half_extents.z),
        )
        .iter()
        .map(|solid| solid.top())
        .filter(|top| *top <= reach)
        .fold(None, |best: Option<f32>, top| {
            Some(best.map_or(top, |b| b.max(top)))
        })
}

/// Where the feet would come to rest below `position`, falling back to the ground plane.
pub fn ground_height_below(world: &dyn CollisionWorld, position: Vec3, half_extents: Vec3) -> f32 {
    support_height(world, position, half_extents, 0.0).unwrap_or(GROUND_LEVEL)
}

/// Step an actor's vertical position one tick.
///
/// - Support found above the feet: hard snap onto it
/// - Support found below the feet: fall toward it, landing exactly on top
/// - No support: fall toward the ground plane
pub fn step_vertical(
    world: &dyn CollisionWorld,
    position: &mut Vec3,
    half_extents: Vec3,
    config: &PhysicsConfig,
    dt: f32,
) -> VerticalStep {
    let floor = support_height(world, *position, half_extents, config.max_step_height)
        .unwrap_or(GROUND_LEVEL);
    let rest_y = floor + half_extents.y;
    let diff = rest_y - position.y;

    if diff.abs() <= config.snap_dead_zone {
        return VerticalStep::Resting;
    }

    if diff > 0.0 {
        position.y = rest_y;
        return VerticalStep::Snapped;
    }

    position.y = (position.y - config.fall_speed * dt).max(rest_y);
    VerticalStep::Falling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Solid, SolidGrid, SolidKind};

    const HALF: Vec3 = Vec3::new(0.5, 1.0, 0.5);
    const DT: f32 = 1.0 / 60.0;

    fn world_with(solids: &[Solid]) -> SolidGrid {
        let mut grid = SolidGrid::new();
        for solid in solids {
            grid.insert(*solid);
        }
        grid
    }

    #[test]
    fn steps_up_onto_low_ledge() {
        let world = world_with(&[Solid::placed(SolidKind::Block, 0.0, 0.0, 0.0, Vec3::new(2.0, 1.0, 2.0))]);
        let mut pos = Vec3::new(0.0, 1.0, 0.0);

        let step = step_vertical(&world, &mut pos, HALF, &PhysicsConfig::default(), DT);

        assert_eq!(step, VerticalStep::Snapped);
        assert!((pos.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn ignores_solids_taller_than_step_height() {
        let world = world_with(&[Solid::placed(SolidKind::Building, 0.0, 0.0, 0.0, Vec3::new(2.0, 10.0, 2.0))]);
        let mut pos = Vec3::new(0.0, 1.0, 0.0);

        let step = step_vertical(&world, &mut pos, HALF, &PhysicsConfig::default(), DT);

        assert_eq!(step, VerticalStep::Resting);
        assert!((pos.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn falls_at_constant_speed_until_ground() {
        let world = SolidGrid::new();
        let cfg = PhysicsConfig::default();
        let mut pos = Vec3::new(0.0, 5.0, 0.0);

        assert_eq!(step_vertical(&world, &mut pos, HALF, &cfg, 0.1), VerticalStep::Falling);
        assert!((pos.y - 2.5).abs() < 1e-5);

        step_vertical(&world, &mut pos, HALF, &cfg, 0.1);
        assert!((pos.y - HALF.y).abs() < 1e-5, "lands on the ground plane, got {}", pos.y);

        assert_eq!(step_vertical(&world, &mut pos, HALF, &cfg, 0.1), VerticalStep::Resting);
    }

    #[test]
    fn falling_lands_on_support_top() {
        let world = world_with(&[Solid::placed(SolidKind::Block, 0.0, 0.0, 0.0, Vec3::new(2.0, 3.0, 2.0))]);
        let cfg = PhysicsConfig::default();
        let mut pos = Vec3::new(0.0, 4.5, 0.0);

        for _ in 0..30 {
            step_vertical(&world, &mut pos, HALF, &cfg, DT);
        }

        assert!((pos.y - 4.0).abs() < 1e-5);
    }

    #[test]
    fn dead_zone_suppresses_micro_corrections() {
        let world = SolidGrid::new();
        let mut pos = Vec3::new(0.0, 1.005, 0.0);

        let step = step_vertical(&world, &mut pos, HALF, &PhysicsConfig::default(), DT);

        assert_eq!(step, VerticalStep::Resting);
        assert_eq!(pos.y, 1.005);
    }

    #[test]
    fn ground_below_prefers_highest_reachable_top() {
        let world = world_with(&[
            Solid::placed(SolidKind::Block, 0.0, 0.0, 0.0, Vec3::new(2.0, 1.0, 2.0)),
            Solid::placed(SolidKind::Block, 0.0, 0.0, 0.0, Vec3::new(1.0, 2.0, 1.0)),
        ]);
        let ground = ground_height_below(&world, Vec3::new(0.0, 3.0, 0.0), HALF);
        assert!((ground - 2.0).abs() < 1e-6);
        assert_eq!(ground_height_below(&SolidGrid::new(), Vec3::new(0.0, 3.0, 0.0), HALF), GROUND_LEVEL);
    }
}
