//! Enemy and NPC simulation core shared by every host.

pub mod activation;
pub mod actor;
pub mod ai;
pub mod config;
pub mod death;
pub mod hiding;
pub mod movement;
pub mod physics;
pub mod provocation;
pub mod simulation;
pub mod spatial;

pub use actor::{
    Actor, ActorId, ActorKind, ActorRegistry, ActorTypeDescriptor, ActorView, Behavior, DamageType,
    EnemyBehavior, EnemyState, Health, NpcBehavior, NpcState,
};
pub use ai::TickContext;
pub use config::{AiConfig, ConfigError};
pub use simulation::{
    ManifestCatalog, SimError, SimEvent, Simulation, SpawnError, SpawnOverrides, SpawnRequest,
    VisualCatalog,
};
pub use spatial::{CollisionWorld, Solid, SolidGrid, SolidKind};

use std::time::Duration;

/// Simulation tick rate (Hz).
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

/// Duration of one simulation tick.
pub fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ)
}
