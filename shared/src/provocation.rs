//! Provocation bookkeeping for neutral actors.
//!
//! Each qualifying hit adds a fixed amount of "anger"; reaching the threshold forces the
//! NPC into [`NpcState::Provoked`]. Anger drains over time while the NPC is not hostile,
//! so isolated hits are forgiven.

use bevy::log::debug;

use crate::actor::{Actor, Mind, NpcState};
use crate::ai;
use crate::config::ProvocationConfig;

/// Result of routing a hit through the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct HitReport {
    pub is_dead: bool,
    /// The hit pushed the NPC over the threshold this time.
    pub provoked: bool,
}

/// Apply `damage` to an NPC and update its provocation.
///
/// Already-hostile NPCs (by behaviour or by state) just take the damage.
pub fn on_hit(actor: &mut Actor, damage: f32, config: &ProvocationConfig) -> HitReport {
    let is_dead = actor.health.take_damage(damage);

    let Mind::Npc(mind) = &mut actor.mind else {
        return HitReport { is_dead, provoked: false };
    };

    if mind.behavior.is_permanently_hostile() || mind.state == NpcState::Provoked {
        return HitReport { is_dead, provoked: false };
    }

    mind.provocation = (mind.provocation + config.per_hit)
        .min(config.threshold)
        .max(0.0);
    let level = mind.provocation;
    let provoked = level >= config.threshold;

    if provoked {
        debug!("NPC {} provoked at {:.1}", actor.id, level);
        ai::enter_npc_state(actor, NpcState::Provoked);
    }

    HitReport { is_dead, provoked }
}

/// Drain provocation while the NPC is not hostile. Never drops below zero.
pub fn decay(actor: &mut Actor, dt: f32, config: &ProvocationConfig) {
    if let Mind::Npc(mind) = &mut actor.mind {
        if mind.state != NpcState::Provoked {
            mind.provocation = (mind.provocation - config.decay_rate * dt).max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::prelude::*;

    use super::*;
    use crate::actor::{ActorId, ActorKind, ActorTypeDescriptor, Behavior, NpcBehavior};

    fn npc(behavior: NpcBehavior) -> Actor {
        let descriptor = Arc::new(ActorTypeDescriptor {
            name: "villager".to_string(),
            kind: ActorKind::Npc,
            width: 0.8,
            height: 1.8,
            base_health: 100.0,
            speed: 3.0,
            visual: "villager".to_string(),
        });
        Actor::new(ActorId(3), descriptor, Behavior::Npc(behavior), Vec3::ZERO, 100.0, None)
    }

    fn state(actor: &Actor) -> NpcState {
        actor.npc().map(|m| m.state()).unwrap_or_default()
    }

    fn provocation(actor: &Actor) -> f32 {
        actor.npc().map(|m| m.provocation()).unwrap_or_default()
    }

    #[test]
    fn three_hits_provoke() {
        let cfg = ProvocationConfig::default();
        let mut actor = npc(NpcBehavior::Wanderer);

        assert!(!on_hit(&mut actor, 1.0, &cfg).provoked);
        assert!(!on_hit(&mut actor, 1.0, &cfg).provoked);
        assert_eq!(state(&actor), NpcState::Idle);

        let report = on_hit(&mut actor, 1.0, &cfg);
        assert!(report.provoked);
        assert_eq!(state(&actor), NpcState::Provoked);
        assert_eq!(actor.state_timer(), 0.0);
        assert_eq!(provocation(&actor), cfg.threshold);
    }

    #[test]
    fn two_hits_then_decay_do_not_provoke() {
        let cfg = ProvocationConfig::default();
        let mut actor = npc(NpcBehavior::Stationary);

        on_hit(&mut actor, 1.0, &cfg);
        on_hit(&mut actor, 1.0, &cfg);
        // 24 anger at 5/s drains in 4.8s.
        for _ in 0..50 {
            decay(&mut actor, 0.1, &cfg);
        }
        assert_eq!(provocation(&actor), 0.0);

        on_hit(&mut actor, 1.0, &cfg);
        assert_eq!(state(&actor), NpcState::Idle);
    }

    #[test]
    fn decay_floors_at_zero() {
        let cfg = ProvocationConfig::default();
        let mut actor = npc(NpcBehavior::Stationary);
        on_hit(&mut actor, 1.0, &cfg);

        decay(&mut actor, 1_000.0, &cfg);
        assert_eq!(provocation(&actor), 0.0);
        decay(&mut actor, 1_000.0, &cfg);
        assert_eq!(provocation(&actor), 0.0);
    }

    #[test]
    fn hostile_npcs_skip_bookkeeping() {
        let cfg = ProvocationConfig::default();
        let mut actor = npc(NpcBehavior::Hostile);

        let report = on_hit(&mut actor, 30.0, &cfg);
        assert!(!report.provoked);
        assert_eq!(provocation(&actor), 0.0);
        assert_eq!(actor.health().current, 70.0);
    }

    #[test]
    fn provoked_npcs_do_not_decay() {
        let cfg = ProvocationConfig::default();
        let mut actor = npc(NpcBehavior::Stationary);
        for _ in 0..3 {
            on_hit(&mut actor, 1.0, &cfg);
        }
        decay(&mut actor, 2.0, &cfg);
        assert_eq!(provocation(&actor), cfg.threshold);
    }

    #[test]
    fn negative_threshold_does_not_panic() {
        let cfg = ProvocationConfig {
            threshold: -1.0,
            ..ProvocationConfig::default()
        };
        let mut actor = npc(NpcBehavior::Wanderer);

        assert!(on_hit(&mut actor, 1.0, &cfg).provoked);
        assert_eq!(provocation(&actor), 0.0);
    }

    #[test]
    fn lethal_hit_reports_death() {
        let mut actor = npc(NpcBehavior::Stationary);
        assert!(on_hit(&mut actor, 500.0, &ProvocationConfig::default()).is_dead);
    }
}
