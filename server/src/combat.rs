//! Scripted combat: the player swings at whatever is closest every few seconds.

use bevy::prelude::*;
use shared::{ActorId, ActorKind, DamageType, Simulation, FIXED_TIMESTEP_HZ};

use crate::player::ScriptedPlayer;

#[derive(Resource, Debug, Clone)]
pub struct CombatScript {
    /// Seconds between swings.
    pub interval: f32,
    pub reach: f32,
    pub damage: f32,
    /// Every n-th swing is a fire attack.
    pub fire_every: u32,
    timer: f32,
    swings: u32,
}

impl Default for CombatScript {
    fn default() -> Self {
        Self {
            interval: 1.5,
            reach: 6.0,
            damage: 15.0,
            fire_every: 3,
            timer: 0.0,
            swings: 0,
        }
    }
}

impl CombatScript {
    fn next_damage_type(&mut self) -> DamageType {
        self.swings += 1;
        if self.fire_every > 0 && self.swings % self.fire_every == 0 {
            DamageType::Fire
        } else {
            DamageType::Physical
        }
    }
}

/// Closest actor within `reach` of `from` that is not already dying.
fn nearest_target(sim: &Simulation, from: Vec3, reach: f32) -> Option<(ActorId, ActorKind)> {
    sim.actors()
        .iter()
        .filter(|actor| !actor.is_dying())
        .map(|actor| (actor, actor.position().distance_squared(from)))
        .filter(|(_, dist_sq)| *dist_sq <= reach * reach)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(actor, _)| (actor.id(), actor.kind()))
}

pub fn scripted_attacks(
    mut script: ResMut<CombatScript>,
    player: Res<ScriptedPlayer>,
    mut sim: ResMut<Simulation>,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    script.timer += dt;
    if script.timer < script.interval {
        return;
    }
    script.timer = 0.0;

    let Some((target, kind)) = nearest_target(&sim, player.position, script.reach) else {
        return;
    };

    let damage_type = script.next_damage_type();
    match sim.apply_damage(target, script.damage, damage_type) {
        Ok(true) if kind == ActorKind::Enemy => {
            if let Err(err) = sim.start_death_sequence(target) {
                warn!("Could not start death of {}: {}", target, err);
            }
        }
        Ok(_) => {
            trace!("Player hit {} for {} ({:?})", target, script.damage, damage_type);
        }
        Err(err) => warn!("Attack on {} failed: {}", target, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{
        ActorRegistry, ActorTypeDescriptor, AiConfig, Behavior, EnemyBehavior, ManifestCatalog,
        NpcBehavior, NpcState, SimEvent, SpawnRequest,
    };

    fn sim() -> Simulation {
        let mut registry = ActorRegistry::new();
        for (name, kind) in [("ghoul", ActorKind::Enemy), ("villager", ActorKind::Npc)] {
            registry.register(ActorTypeDescriptor {
                name: name.to_string(),
                kind,
                width: 0.8,
                height: 1.8,
                base_health: 30.0,
                speed: 3.0,
                visual: name.to_string(),
            });
        }
        let catalog: ManifestCatalog = ["ghoul", "villager"].into_iter().collect();
        Simulation::new(AiConfig::default(), registry, catalog, 1)
    }

    fn app(sim: Simulation, script: CombatScript) -> App {
        let mut app = App::new();
        app.insert_resource(sim)
            .insert_resource(script)
            .insert_resource(ScriptedPlayer::new(vec![Vec3::new(0.0, 0.9, 0.0)], 0.0))
            .add_systems(Update, scripted_attacks);
        app
    }

    #[test]
    fn every_nth_swing_is_fire() {
        let mut script = CombatScript::default();
        let kinds: Vec<_> = (0..6).map(|_| script.next_damage_type()).collect();
        assert_eq!(kinds.iter().filter(|t| **t == DamageType::Fire).count(), 2);
        assert_eq!(kinds[2], DamageType::Fire);
    }

    #[test]
    fn lethal_swing_starts_enemy_death() {
        let mut sim = sim();
        let id = sim
            .spawn(SpawnRequest::new("ghoul", Behavior::Enemy(EnemyBehavior::Stationary), Vec3::new(2.0, 0.9, 0.0)))
            .unwrap();
        let script = CombatScript {
            interval: 0.0,
            damage: 100.0,
            ..default()
        };
        let mut app = app(sim, script);

        app.update();
        let mut sim = app.world_mut().resource_mut::<Simulation>();
        assert!(sim.actor(id).unwrap().is_dying());
        assert!(matches!(sim.drain_events().as_slice(), [SimEvent::BloodPool { .. }]));
    }

    #[test]
    fn swings_provoke_nearby_villager() {
        let mut sim = sim();
        let id = sim
            .spawn(SpawnRequest::new("villager", Behavior::Npc(NpcBehavior::Wanderer), Vec3::new(3.0, 0.9, 0.0)))
            .unwrap();
        let script = CombatScript {
            interval: 0.0,
            damage: 1.0,
            ..default()
        };
        let mut app = app(sim, script);

        for _ in 0..3 {
            app.update();
        }
        let sim = app.world().resource::<Simulation>();
        assert_eq!(sim.actor(id).and_then(|a| a.npc()).map(|m| m.state()), Some(NpcState::Provoked));
    }

    #[test]
    fn nothing_in_reach_means_no_swing() {
        let mut sim = sim();
        let id = sim
            .spawn(SpawnRequest::new("ghoul", Behavior::Enemy(EnemyBehavior::Stationary), Vec3::new(20.0, 0.9, 0.0)))
            .unwrap();
        let mut app = app(sim, CombatScript { interval: 0.0, ..default() });

        app.update();
        let sim = app.world().resource::<Simulation>();
        assert_eq!(sim.actor(id).unwrap().health().current, 30.0);
    }
}
