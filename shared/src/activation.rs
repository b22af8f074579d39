//! Activation radius: only actors near the player get full simulation.

use bevy::prelude::*;

use crate::actor::{Actor, ActorKind, EnemyState, Mind, NpcState};
use crate::ai;

/// Whether `position` lies within `range` of the player. Squared distances only.
#[inline]
pub fn in_activation_range(position: Vec3, player: Vec3, range: f32) -> bool {
    position.distance_squared(player) <= range * range
}

/// Put an out-of-range actor back to its idle baseline.
///
/// Any non-idle state is reset and the target cleared, so the actor never wakes up
/// chasing a stale destination. A provoked NPC is forgiven on the way out. Already idle
/// actors are left untouched. Returns whether anything was reset.
pub fn deactivate(actor: &mut Actor) -> bool {
    if actor.is_idle() {
        return false;
    }

    actor.moving = false;
    if let Mind::Npc(mind) = &mut actor.mind {
        if mind.state == NpcState::Provoked {
            mind.provocation = 0.0;
        }
    }
    match actor.kind() {
        ActorKind::Enemy => ai::enter_enemy_state(actor, EnemyState::Idle),
        ActorKind::Npc => ai::enter_npc_state(actor, NpcState::Idle),
    }

    debug!("Actor {} left activation range, reset to idle", actor.id);
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::actor::{ActorId, ActorTypeDescriptor, Behavior, EnemyBehavior};

    #[test]
    fn range_check_is_inclusive() {
        assert!(in_activation_range(Vec3::new(150.0, 0.0, 0.0), Vec3::ZERO, 150.0));
        assert!(!in_activation_range(Vec3::new(150.1, 0.0, 0.0), Vec3::ZERO, 150.0));
    }

    #[test]
    fn deactivation_clears_chase_state() {
        let descriptor = Arc::new(ActorTypeDescriptor {
            name: "ghoul".to_string(),
            kind: ActorKind::Enemy,
            width: 1.0,
            height: 2.0,
            base_health: 50.0,
            speed: 4.0,
            visual: "ghoul".to_string(),
        });
        let mut actor = Actor::new(
            ActorId(1),
            descriptor,
            Behavior::Enemy(EnemyBehavior::Coward),
            Vec3::ZERO,
            50.0,
            None,
        );
        ai::enter_enemy_state(&mut actor, EnemyState::Fleeing);
        actor.target = Some(Vec3::new(10.0, 0.0, 10.0));

        assert!(deactivate(&mut actor));
        assert!(actor.is_idle());
        assert_eq!(actor.target(), None);
        assert_eq!(actor.enemy().map(|m| m.state()), Some(EnemyState::Idle));

        assert!(!deactivate(&mut actor), "already idle: no side effects");
    }
}
