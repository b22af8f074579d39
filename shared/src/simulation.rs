//! The actor simulation: spawning, damage routing and the per-tick update loop.
//!
//! Each tick every actor goes through the same pipeline:
//! activation gate -> vertical physics -> provocation decay -> AI.
//! Dying enemies skip all of that and only advance their fade-out.

use std::collections::HashSet;
use std::sync::Arc;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::activation::{deactivate, in_activation_range};
use crate::actor::{
    Actor, ActorId, ActorKind, ActorRegistry, ActorView, Behavior, DamageType, Mind, NpcBehavior,
};
use crate::ai::{self, TickContext};
use crate::config::AiConfig;
use crate::death;
use crate::physics::{ground_height_below, step_vertical};
use crate::provocation;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum SpawnError {
    #[error("unknown actor type `{0}`")]
    UnknownType(String),
    #[error("visual `{visual}` for actor type `{type_name}` is not available")]
    MissingVisual { type_name: String, visual: String },
    #[error("actor type `{type_name}` is {expected:?}, behaviour does not match")]
    KindMismatch { type_name: String, expected: ActorKind },
    #[error("health override {health} for actor type `{type_name}` must be positive")]
    InvalidHealth { type_name: String, health: f32 },
}

#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("no actor {0}")]
    UnknownActor(ActorId),
    #[error("actor {id} is not {expected:?}")]
    WrongKind { id: ActorId, expected: ActorKind },
}

// =============================================================================
// VISUALS
// =============================================================================

/// Answers whether the model for an actor type can be loaded.
pub trait VisualCatalog {
    fn has_visual(&self, visual: &str) -> bool;
}

/// A fixed list of model ids known to exist.
#[derive(Clone, Debug, Default)]
pub struct ManifestCatalog {
    visuals: HashSet<String>,
}

impl ManifestCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, visual: impl Into<String>) {
        self.visuals.insert(visual.into());
    }
}

impl<S: Into<String>> FromIterator<S> for ManifestCatalog {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            visuals: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl VisualCatalog for ManifestCatalog {
    fn has_visual(&self, visual: &str) -> bool {
        self.visuals.contains(visual)
    }
}

// =============================================================================
// SPAWNING
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnOverrides {
    pub health: Option<f32>,
    pub equipment: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    pub type_name: String,
    pub behavior: Behavior,
    pub position: Vec3,
    pub overrides: SpawnOverrides,
}

impl SpawnRequest {
    pub fn new(type_name: impl Into<String>, behavior: Behavior, position: Vec3) -> Self {
        Self {
            type_name: type_name.into(),
            behavior,
            position,
            overrides: SpawnOverrides::default(),
        }
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.overrides.health = Some(health);
        self
    }

    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.overrides.equipment = Some(equipment.into());
        self
    }
}

// =============================================================================
// EVENTS
// =============================================================================

/// Side effects produced by the simulation, drained by the host after each tick.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    /// One-time blood pool under a freshly killed enemy.
    BloodPool { id: ActorId, position: Vec3 },
    /// One-time ash pile on the ground under an enemy that burned to death.
    Ash { id: ActorId, position: Vec3 },
    /// The actor is gone for good.
    Removed { id: ActorId },
}

// =============================================================================
// SIMULATION
// =============================================================================

#[derive(Resource)]
pub struct Simulation {
    config: AiConfig,
    registry: ActorRegistry,
    catalog: Box<dyn VisualCatalog + Send + Sync>,
    actors: Vec<Actor>,
    next_id: u64,
    rng: StdRng,
    events: Vec<SimEvent>,
}

impl Simulation {
    /// Build an empty simulation. `config` is sanitized before use.
    pub fn new(
        config: AiConfig,
        registry: ActorRegistry,
        catalog: impl VisualCatalog + Send + Sync + 'static,
        seed: u64,
    ) -> Self {
        Self {
            config: config.sanitized(),
            registry,
            catalog: Box::new(catalog),
            actors: Vec::new(),
            next_id: 1,
            rng: StdRng::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Per-actor render state for this tick.
    pub fn views(&self) -> impl Iterator<Item = ActorView> + '_ {
        self.actors.iter().map(Actor::view)
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    fn index_of(&self, id: ActorId) -> Result<usize, SimError> {
        self.actors
            .iter()
            .position(|actor| actor.id == id)
            .ok_or(SimError::UnknownActor(id))
    }

    fn remove_at(&mut self, index: usize, reason: &str) {
        let actor = self.actors.remove(index);
        info!("Removed {} {} ({})", actor.descriptor.name, actor.id, reason);
        self.events.push(SimEvent::Removed { id: actor.id });
    }

    /// Spawn an actor, reporting why nothing was created.
    pub fn try_spawn(&mut self, request: SpawnRequest) -> Result<ActorId, SpawnError> {
        let descriptor = self
            .registry
            .get(&request.type_name)
            .ok_or_else(|| SpawnError::UnknownType(request.type_name.clone()))?;

        if request.behavior.kind() != descriptor.kind {
            return Err(SpawnError::KindMismatch {
                type_name: request.type_name,
                expected: descriptor.kind,
            });
        }

        if !self.catalog.has_visual(&descriptor.visual) {
            return Err(SpawnError::MissingVisual {
                type_name: request.type_name,
                visual: descriptor.visual.clone(),
            });
        }

        let health = request.overrides.health.unwrap_or(descriptor.base_health);
        if health.is_nan() || health <= 0.0 {
            return Err(SpawnError::InvalidHealth {
                type_name: request.type_name,
                health,
            });
        }

        let id = ActorId(self.next_id);
        self.next_id += 1;

        let actor = Actor::new(
            id,
            Arc::clone(&descriptor),
            request.behavior,
            request.position,
            health,
            request.overrides.equipment,
        );

        debug!(
            "Spawned {} {} ({:?}) at {:?}",
            descriptor.name, id, request.behavior, request.position
        );
        self.actors.push(actor);
        Ok(id)
    }

    /// Spawn an actor; on failure logs a warning and returns `None`.
    pub fn spawn(&mut self, request: SpawnRequest) -> Option<ActorId> {
        match self.try_spawn(request) {
            Ok(id) => Some(id),
            Err(err) => {
                warn!("Failed to spawn actor: {}", err);
                None
            }
        }
    }

    /// Remove an actor right away (scripted despawn).
    pub fn despawn(&mut self, id: ActorId) -> Result<(), SimError> {
        let index = self.index_of(id)?;
        self.remove_at(index, "despawned");
        Ok(())
    }

    /// Route a hit to an actor. Returns whether the actor is now dead.
    ///
    /// NPCs go through provocation bookkeeping and are removed as soon as they die.
    /// Enemies only lose health; the caller starts their death sequence explicitly.
    pub fn apply_damage(
        &mut self,
        id: ActorId,
        amount: f32,
        damage_type: DamageType,
    ) -> Result<bool, SimError> {
        let index = self.index_of(id)?;
        let actor = &mut self.actors[index];

        if actor.kind() == ActorKind::Npc {
            let report = provocation::on_hit(actor, amount, &self.config.provocation);
            if report.is_dead {
                self.remove_at(index, "killed");
            }
            return Ok(report.is_dead);
        }

        if actor.is_dying() {
            return Ok(true);
        }
        if let Mind::Enemy(mind) = &mut actor.mind {
            mind.last_damage = Some(damage_type);
        }
        Ok(actor.health.take_damage(amount))
    }

    /// Put an enemy into its death sequence using the last damage type it took.
    pub fn start_death_sequence(&mut self, id: ActorId) -> Result<(), SimError> {
        let index = self.index_of(id)?;
        let actor = &mut self.actors[index];

        let damage_type = match &actor.mind {
            Mind::Enemy(mind) => mind.last_damage.unwrap_or_default(),
            Mind::Npc(_) => {
                return Err(SimError::WrongKind {
                    id,
                    expected: ActorKind::Enemy,
                })
            }
        };

        if actor.is_dying() {
            return Ok(());
        }

        info!("{} {} is dying ({:?})", actor.descriptor.name, id, damage_type);
        if let Some(position) = death::start_death_sequence(actor, damage_type, &self.config.death) {
            self.events.push(SimEvent::BloodPool { id, position });
        }
        Ok(())
    }

    /// Swap an NPC's behaviour, e.g. to escalate it to permanently hostile.
    pub fn set_npc_behavior(&mut self, id: ActorId, behavior: NpcBehavior) -> Result<(), SimError> {
        let index = self.index_of(id)?;
        match &mut self.actors[index].mind {
            Mind::Npc(mind) => {
                debug!("NPC {} behaviour {:?} -> {:?}", id, mind.behavior, behavior);
                mind.behavior = behavior;
                Ok(())
            }
            Mind::Enemy(_) => Err(SimError::WrongKind {
                id,
                expected: ActorKind::Npc,
            }),
        }
    }

    /// Advance every actor by `dt` seconds.
    pub fn update(&mut self, dt: f32, ctx: &TickContext<'_>) {
        let Self {
            config,
            actors,
            rng,
            events,
            ..
        } = self;
        let config = &*config;

        actors.retain_mut(|actor| {
            if actor.is_dying() {
                let tick = death::tick_death(actor, dt, &config.death);
                if tick.spawn_ash {
                    let ground = ground_height_below(ctx.world, actor.position, actor.half_extents());
                    events.push(SimEvent::Ash {
                        id: actor.id,
                        position: Vec3::new(actor.position.x, ground, actor.position.z),
                    });
                }
                if tick.finished {
                    info!("Removed {} {} (faded out)", actor.descriptor.name, actor.id);
                    events.push(SimEvent::Removed { id: actor.id });
                    return false;
                }
                return true;
            }

            if !in_activation_range(actor.position, ctx.player, config.activation.range) {
                deactivate(actor);
                return true;
            }

            actor.moving = false;
            let half_extents = actor.half_extents();
            step_vertical(ctx.world, &mut actor.position, half_extents, &config.physics, dt);
            provocation::decay(actor, dt, &config.provocation);
            ai::tick_actor(actor, ctx, config, &mut *rng, dt);
            true
        });
    }
}
