//! Per-actor behaviour state machines.
//!
//! Enemies and NPCs each run a small closed state machine selected by their behaviour
//! policy. All state writes go through [`enter_enemy_state`] / [`enter_npc_state`], which
//! reset the state timer and clear any movement target.

use bevy::prelude::*;
use rand::Rng;

use crate::actor::{Actor, EnemyBehavior, EnemyState, Mind, NpcBehavior, NpcState};
use crate::config::AiConfig;
use crate::hiding::find_hiding_spot;
use crate::movement::{face_toward, is_blocked, try_move};
use crate::spatial::CollisionWorld;

/// Read-only view of the world handed to every actor during a tick.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub world: &'a dyn CollisionWorld,
    /// The player doubles as the threat every behaviour reacts to.
    pub player: Vec3,
}

/// Horizontal distance. Movement is XZ-only, so stop and arrival checks ignore height.
#[inline]
fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}

// =============================================================================
// TRANSITIONS
// =============================================================================

/// Move an enemy into `state`. Re-entering the current state is a no-op.
pub(crate) fn enter_enemy_state(actor: &mut Actor, state: EnemyState) {
    let Mind::Enemy(mind) = &mut actor.mind else {
        return;
    };
    if mind.state == state {
        return;
    }
    trace!("Enemy {} {:?} -> {:?}", actor.id, mind.state, state);
    mind.state = state;
    actor.state_timer = 0.0;
    actor.target = None;
}

/// Move an NPC into `state`. Re-entering the current state is a no-op.
pub(crate) fn enter_npc_state(actor: &mut Actor, state: NpcState) {
    let Mind::Npc(mind) = &mut actor.mind else {
        return;
    };
    if mind.state == state {
        return;
    }
    trace!("NPC {} {:?} -> {:?}", actor.id, mind.state, state);
    mind.state = state;
    actor.state_timer = 0.0;
    actor.target = None;
}

/// Run one AI step for `actor`. Dying actors are left alone.
pub fn tick_actor<R: Rng + ?Sized>(
    actor: &mut Actor,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    rng: &mut R,
    dt: f32,
) {
    match &actor.mind {
        Mind::Enemy(mind) => {
            let (behavior, state) = (mind.behavior, mind.state);
            tick_enemy(actor, behavior, state, ctx, config, dt);
        }
        Mind::Npc(mind) => {
            let (behavior, state) = (mind.behavior, mind.state);
            tick_npc(actor, behavior, state, ctx, config, rng, dt);
        }
    }
}

// =============================================================================
// ENEMIES
// =============================================================================

fn tick_enemy(
    actor: &mut Actor,
    behavior: EnemyBehavior,
    state: EnemyState,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    dt: f32,
) {
    // Dead but not yet handed to the death sequence: inert.
    if state == EnemyState::Dying || actor.health.is_dead() {
        return;
    }

    match behavior {
        EnemyBehavior::Stationary => enter_enemy_state(actor, EnemyState::Idle),
        EnemyBehavior::Rusher => {
            tick_aggressive_enemy(actor, ctx, config, config.aggression.rusher_stop_distance, dt)
        }
        EnemyBehavior::Guard => {
            tick_aggressive_enemy(actor, ctx, config, config.aggression.guard_stop_distance, dt)
        }
        EnemyBehavior::Coward => tick_coward(actor, state, ctx, config, dt),
    }
}

fn tick_aggressive_enemy(
    actor: &mut Actor,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    stop_distance: f32,
    dt: f32,
) {
    if flat_distance(actor.position, ctx.player) > stop_distance {
        enter_enemy_state(actor, EnemyState::Chasing);
        actor.state_timer += dt;
        try_move(ctx.world, actor, ctx.player, &config.movement, dt);
    } else {
        // In range to attack.
        enter_enemy_state(actor, EnemyState::Idle);
    }
}

fn tick_coward(
    actor: &mut Actor,
    state: EnemyState,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    dt: f32,
) {
    let coward = &config.coward;

    match state {
        EnemyState::Idle | EnemyState::Chasing => {
            if actor.position.distance(ctx.player) < coward.detection_range {
                enter_enemy_state(actor, EnemyState::Searching);
            } else {
                enter_enemy_state(actor, EnemyState::Idle);
            }
        }
        EnemyState::Searching => {
            actor.state_timer += dt;
            match find_hiding_spot(ctx.world, actor.position, ctx.player, &config.hiding) {
                Some(spot) => {
                    enter_enemy_state(actor, EnemyState::Fleeing);
                    actor.target = Some(spot);
                }
                None if actor.state_timer > coward.search_timeout => {
                    enter_enemy_state(actor, EnemyState::Idle);
                }
                None => {}
            }
        }
        EnemyState::Fleeing => {
            actor.state_timer += dt;
            let Some(target) = actor.target else {
                enter_enemy_state(actor, EnemyState::Idle);
                return;
            };

            if flat_distance(actor.position, target) < coward.arrival_distance {
                enter_enemy_state(actor, EnemyState::Hiding);
            } else if !try_move(ctx.world, actor, target, &config.movement, dt) {
                // Cornered: cower where we stand.
                enter_enemy_state(actor, EnemyState::Hiding);
            }
        }
        EnemyState::Hiding => {
            actor.state_timer += dt;
            if actor.state_timer >= coward.hide_dwell {
                enter_enemy_state(actor, EnemyState::Idle);
            }
        }
        EnemyState::Dying => {}
    }
}

// =============================================================================
// NPCS
// =============================================================================

fn tick_npc<R: Rng + ?Sized>(
    actor: &mut Actor,
    behavior: NpcBehavior,
    state: NpcState,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    rng: &mut R,
    dt: f32,
) {
    if behavior.is_permanently_hostile() {
        let stop_distance = match behavior {
            NpcBehavior::Guard => config.aggression.guard_stop_distance,
            _ => config.hostility.stop_chase_distance,
        };
        tick_hostile_npc(actor, ctx, config, stop_distance, dt);
        return;
    }

    match state {
        NpcState::Provoked => tick_provoked(actor, ctx, config, dt),
        NpcState::Cooldown => {
            actor.state_timer += dt;
            if actor.state_timer >= config.hostility.cooldown {
                enter_npc_state(actor, NpcState::Idle);
            }
        }
        NpcState::Idle | NpcState::Wandering | NpcState::Following => match behavior {
            NpcBehavior::Stationary => enter_npc_state(actor, NpcState::Idle),
            NpcBehavior::Watcher => {
                enter_npc_state(actor, NpcState::Idle);
                face_toward(actor, ctx.player, &config.movement, dt);
            }
            NpcBehavior::Wanderer => tick_wanderer(actor, state, ctx, config, rng, dt),
            NpcBehavior::Follower => tick_follower(actor, state, ctx, config, dt),
            NpcBehavior::Guard | NpcBehavior::Hostile => {}
        },
    }
}

fn tick_hostile_npc(
    actor: &mut Actor,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    stop_distance: f32,
    dt: f32,
) {
    if flat_distance(actor.position, ctx.player) > stop_distance {
        enter_npc_state(actor, NpcState::Provoked);
        actor.state_timer += dt;
        try_move(ctx.world, actor, ctx.player, &config.movement, dt);
    } else {
        enter_npc_state(actor, NpcState::Idle);
    }
}

fn tick_provoked(actor: &mut Actor, ctx: &TickContext<'_>, config: &AiConfig, dt: f32) {
    let hostility = &config.hostility;
    actor.state_timer += dt;
    let dist = actor.position.distance(ctx.player);

    if actor.state_timer >= hostility.chase_timeout || dist > hostility.max_chase_distance {
        if let Mind::Npc(mind) = &mut actor.mind {
            // Forgiven.
            mind.provocation = 0.0;
        }
        enter_npc_state(actor, NpcState::Cooldown);
        return;
    }

    if flat_distance(actor.position, ctx.player) > hostility.stop_chase_distance {
        // Stop check is horizontal; the leash above stays 3D.
        try_move(ctx.world, actor, ctx.player, &config.movement, dt);
    }
}

fn tick_wanderer<R: Rng + ?Sized>(
    actor: &mut Actor,
    state: NpcState,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    rng: &mut R,
    dt: f32,
) {
    let wander = &config.wander;

    if state != NpcState::Wandering {
        enter_npc_state(actor, NpcState::Idle);
        actor.state_timer += dt;
        if actor.state_timer < wander.pause {
            return;
        }

        match pick_wander_target(ctx.world, actor, config, rng) {
            Some(target) => {
                enter_npc_state(actor, NpcState::Wandering);
                actor.target = Some(target);
                trace!("NPC {} wandering to {:?}", actor.id, target);
            }
            None => actor.state_timer = 0.0,
        }
        return;
    }

    let Some(target) = actor.target else {
        enter_npc_state(actor, NpcState::Idle);
        return;
    };

    if flat_distance(actor.position, target) < wander.arrival_distance
        || !try_move(ctx.world, actor, target, &config.movement, dt)
    {
        enter_npc_state(actor, NpcState::Idle);
    }
}

/// Uniform random point in the home disk that is not inside a wall.
fn pick_wander_target<R: Rng + ?Sized>(
    world: &dyn CollisionWorld,
    actor: &Actor,
    config: &AiConfig,
    rng: &mut R,
) -> Option<Vec3> {
    let radius = config.wander.radius;
    let half_extents = actor.half_extents();

    for _ in 0..config.wander.max_target_attempts {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let r = radius * rng.gen::<f32>().sqrt();
        let candidate = actor.home + Vec3::new(angle.cos() * r, 0.0, angle.sin() * r);

        if !is_blocked(world, candidate, half_extents, config.movement.step_tolerance) {
            return Some(candidate);
        }
    }

    None
}

fn tick_follower(
    actor: &mut Actor,
    state: NpcState,
    ctx: &TickContext<'_>,
    config: &AiConfig,
    dt: f32,
) {
    let follow = &config.follow;
    let dist = flat_distance(actor.position, ctx.player);

    let keep_following = if state == NpcState::Following {
        dist > follow.stop_distance
    } else {
        dist > follow.follow_distance
    };

    if keep_following {
        enter_npc_state(actor, NpcState::Following);
        actor.state_timer += dt;
        try_move(ctx.world, actor, ctx.player, &config.movement, dt);
    } else {
        enter_npc_state(actor, NpcState::Idle);
    }
}
