//! Cover search for actors that run and hide from a threat.

use bevy::prelude::*;

use crate::config::HidingConfig;
use crate::spatial::{CollisionWorld, Solid, SolidKind};

/// Nearest solid of `kind` whose center lies within `radius` of `point`, with its squared distance.
fn nearest_of_kind(candidates: &[Solid], kind: SolidKind, point: Vec3, radius: f32) -> Option<(Vec3, f32)> {
    let radius_sq = radius * radius;
    candidates
        .iter()
        .filter(|solid| solid.kind == kind)
        .map(|solid| {
            let center = solid.center();
            (center, flat_distance_squared(center, point))
        })
        .filter(|(_, dist_sq)| *dist_sq <= radius_sq)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

#[inline]
fn flat_distance_squared(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length_squared()
}

#[inline]
fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    Vec3::new(to.x - from.x, 0.0, to.z - from.z).normalize_or_zero()
}

/// Closest occluder (block or building) to `probe`, comparing the nearest block against
/// the nearest building.
pub fn nearest_occluder(world: &dyn CollisionWorld, probe: Vec3, radius: f32) -> Option<Vec3> {
    let candidates: Vec<Solid> = world
        .query_near(probe, radius)
        .into_iter()
        .filter(|solid| solid.kind.is_occluder())
        .collect();
    let block = nearest_of_kind(&candidates, SolidKind::Block, probe, radius);
    let building = nearest_of_kind(&candidates, SolidKind::Building, probe, radius);

    match (block, building) {
        (Some(b), Some(h)) => Some(if b.1 <= h.1 { b.0 } else { h.0 }),
        (Some(b), None) => Some(b.0),
        (None, Some(h)) => Some(h.0),
        (None, None) => None,
    }
}

/// Find a spot behind cover, away from `threat`.
///
/// Probes are cast from the actor along the "away from threat" direction rotated by each
/// configured angle. The first probe with an occluder nearby wins; the spot is placed
/// `cover_offset` behind that occluder on the far side from the threat. The returned
/// point keeps the actor's current height.
pub fn find_hiding_spot(
    world: &dyn CollisionWorld,
    actor_position: Vec3,
    threat: Vec3,
    config: &HidingConfig,
) -> Option<Vec3> {
    let mut away = flat_direction(threat, actor_position);
    if away == Vec3::ZERO {
        // Threat is right on top of us; any direction is "away".
        away = Vec3::X;
    }

    for angle in &config.probe_angles_deg {
        let dir = Quat::from_rotation_y(angle.to_radians()) * away;
        let probe = actor_position + dir * config.hide_distance;

        let Some(occluder) = nearest_occluder(world, probe, config.search_radius) else {
            continue;
        };

        let behind = flat_direction(threat, occluder);
        let spot = occluder + behind * config.cover_offset;
        return Some(Vec3::new(spot.x, actor_position.y, spot.z));
    }

    None
}
