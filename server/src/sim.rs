//! Hosts the actor simulation inside the Bevy app.
//!
//! The simulation itself is a plain resource; this module feeds it the world and the
//! player each fixed tick, mirrors actor render state onto entities, and handles the
//! side effects it reports.

use std::collections::HashMap;

use bevy::prelude::*;
use shared::{
    ActorId, ActorRegistry, ActorView, AiConfig, ManifestCatalog, SimEvent, Simulation, SolidGrid,
    TickContext, FIXED_TIMESTEP_HZ,
};

use crate::combat::{self, CombatScript};
use crate::player::{self, ScriptedPlayer};
use crate::world;

/// Environment variable naming a RON file with AI tuning.
pub const AI_CONFIG_ENV: &str = "AI_CONFIG";

const ACTOR_TYPES: &str = include_str!("../assets/actors.ron");

/// Models shipped with the server build.
const SHIPPED_VISUALS: [&str; 6] = [
    "models/ghoul.glb",
    "models/bandit.glb",
    "models/imp.glb",
    "models/villager.glb",
    "models/guard.glb",
    "models/dog.glb",
];

const SIM_SEED: u64 = 0x5EED;

// =============================================================================
// LOADING
// =============================================================================

/// Load tuning from `path`, falling back to defaults on any failure.
pub fn ai_config_from(path: Option<&str>) -> AiConfig {
    let Some(path) = path else {
        info!("{} not set, using default AI tuning", AI_CONFIG_ENV);
        return AiConfig::default();
    };

    match AiConfig::load(path) {
        Ok(config) => {
            info!("Loaded AI tuning from {}", path);
            config
        }
        Err(err) => {
            warn!("Falling back to default AI tuning: {}", err);
            AiConfig::default()
        }
    }
}

pub fn load_ai_config() -> AiConfig {
    let path = std::env::var(AI_CONFIG_ENV).ok();
    ai_config_from(path.as_deref())
}

pub fn load_registry() -> ActorRegistry {
    match ActorRegistry::from_ron_str(ACTOR_TYPES) {
        Ok(registry) => registry,
        Err(err) => {
            warn!("Failed to load actor types, nothing will spawn: {}", err);
            ActorRegistry::new()
        }
    }
}

pub fn shipped_catalog() -> ManifestCatalog {
    SHIPPED_VISUALS.into_iter().collect()
}

// =============================================================================
// MIRROR ENTITIES
// =============================================================================

/// Marks the entity standing in for a simulated actor.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorMirror(pub ActorId);

/// Render state of an actor for the current tick.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ActorPose {
    pub position: Vec3,
    pub facing: f32,
    pub moving: bool,
    /// Only set while fading out.
    pub opacity: Option<f32>,
}

impl From<ActorView> for ActorPose {
    fn from(view: ActorView) -> Self {
        Self {
            position: view.position,
            facing: view.facing,
            moving: view.moving,
            opacity: view.opacity,
        }
    }
}

#[derive(Resource, Default, Debug)]
pub struct ActorEntities(HashMap<ActorId, Entity>);

impl ActorEntities {
    pub fn get(&self, id: ActorId) -> Option<Entity> {
        self.0.get(&id).copied()
    }
}

// =============================================================================
// SYSTEMS
// =============================================================================

pub fn tick_simulation(
    mut sim: ResMut<Simulation>,
    world: Res<SolidGrid>,
    player: Res<ScriptedPlayer>,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;
    let ctx = TickContext {
        world: &*world,
        player: player.position,
    };
    sim.update(dt, &ctx);
}

/// Drain simulation side effects: place decals and drop mirrors of removed actors.
pub fn process_sim_events(
    mut commands: Commands,
    mut sim: ResMut<Simulation>,
    mut entities: ResMut<ActorEntities>,
) {
    for event in sim.drain_events() {
        match event {
            SimEvent::BloodPool { id, position } => {
                info!("Blood pool under {} at {:?}", id, position);
            }
            SimEvent::Ash { id, position } => {
                info!("Ash pile from {} at {:?}", id, position);
            }
            SimEvent::Removed { id } => {
                if let Some(entity) = entities.0.remove(&id) {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

/// Copy each actor's view onto its mirror entity, spawning mirrors for new actors.
pub fn sync_actor_views(
    mut commands: Commands,
    sim: Res<Simulation>,
    mut entities: ResMut<ActorEntities>,
    mut poses: Query<&mut ActorPose>,
) {
    for view in sim.views() {
        let pose = ActorPose::from(view);
        match entities.get(view.id) {
            Some(entity) => {
                if let Ok(mut current) = poses.get_mut(entity) {
                    *current = pose;
                }
            }
            None => {
                let entity = commands.spawn((ActorMirror(view.id), pose)).id();
                entities.0.insert(view.id, entity);
            }
        }
    }
}

// =============================================================================
// PLUGIN
// =============================================================================

pub struct SimPlugin;

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        let sim = Simulation::new(load_ai_config(), load_registry(), shipped_catalog(), SIM_SEED);

        app.insert_resource(sim)
            .init_resource::<ActorEntities>()
            .init_resource::<ScriptedPlayer>()
            .init_resource::<CombatScript>()
            .add_systems(Startup, (world::setup_world, world::spawn_demo_actors))
            .add_systems(
                FixedUpdate,
                (
                    player::move_scripted_player,
                    combat::scripted_attacks,
                    tick_simulation,
                    process_sim_events,
                    sync_actor_views,
                )
                    .chain(),
            );
    }
}
