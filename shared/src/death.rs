//! Death sequence for hostile actors: a timed fade-out with one-shot blood / ash effects.

use bevy::prelude::*;

use crate::actor::{Actor, DamageType, EnemyState, Mind};
use crate::ai;
use crate::config::DeathConfig;

/// Fade-out progress of a dying enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct DeathSequence {
    fade_timer: f32,
    duration: f32,
    damage_type: DamageType,
    ash_spawned: bool,
}

impl DeathSequence {
    pub fn new(damage_type: DamageType, duration: f32) -> Self {
        Self {
            fade_timer: duration,
            duration,
            damage_type,
            ash_spawned: false,
        }
    }

    pub fn fade_timer(&self) -> f32 {
        self.fade_timer
    }

    pub fn damage_type(&self) -> DamageType {
        self.damage_type
    }

    pub fn ash_spawned(&self) -> bool {
        self.ash_spawned
    }

    /// `fade_timer / duration`, clamped to `[0, 1]`.
    pub fn opacity(&self) -> f32 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.fade_timer / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.fade_timer <= 0.0
    }
}

/// What one dying tick produced.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct DeathTick {
    pub opacity: f32,
    /// Ash should appear now (fires at most once per sequence).
    pub spawn_ash: bool,
    /// The fade completed; the actor must be removed.
    pub finished: bool,
}

/// Begin dying. Returns the blood-pool position when one should be spawned.
///
/// Idempotent: does nothing (and returns `None`) for actors already dying and for
/// non-enemies.
pub fn start_death_sequence(
    actor: &mut Actor,
    damage_type: DamageType,
    config: &DeathConfig,
) -> Option<Vec3> {
    if actor.is_dying() {
        return None;
    }
    let Mind::Enemy(mind) = &mut actor.mind else {
        return None;
    };

    mind.last_damage = Some(damage_type);
    mind.death = Some(DeathSequence::new(damage_type, config.fade_duration));
    actor.health.kill();
    actor.moving = false;
    ai::enter_enemy_state(actor, EnemyState::Dying);

    (damage_type != DamageType::Fire).then_some(actor.position)
}

/// Advance the fade of a dying enemy by `dt`.
///
/// Fire deaths trigger ash once the fade timer is at or below `ash_threshold`. With the
/// default tuning (threshold equal to the full duration) that is the first dying tick.
pub fn tick_death(actor: &mut Actor, dt: f32, config: &DeathConfig) -> DeathTick {
    let Mind::Enemy(mind) = &mut actor.mind else {
        return DeathTick::default();
    };
    let Some(death) = mind.death.as_mut() else {
        return DeathTick::default();
    };

    death.fade_timer = (death.fade_timer - dt).max(0.0);

    let mut spawn_ash = false;
    if death.damage_type == DamageType::Fire
        && !death.ash_spawned
        && death.fade_timer <= config.ash_threshold
    {
        death.ash_spawned = true;
        spawn_ash = true;
    }

    DeathTick {
        opacity: death.opacity(),
        spawn_ash,
        finished: death.is_finished(),
    }
}
