//! Actor records: type descriptors, behaviour policies, AI states and per-instance data.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::death::DeathSequence;

// =============================================================================
// TYPE DESCRIPTORS
// =============================================================================

/// Which state machine drives an actor.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActorKind {
    Enemy,
    Npc,
}

/// Immutable data shared by every instance of one actor type.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActorTypeDescriptor {
    pub name: String,
    pub kind: ActorKind,
    /// Collision width (X and Z).
    pub width: f32,
    /// Collision height (Y).
    pub height: f32,
    pub base_health: f32,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Id of the model the renderer needs for this type.
    pub visual: String,
}

impl ActorTypeDescriptor {
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.width * 0.5, self.height * 0.5, self.width * 0.5)
    }
}

/// Descriptors keyed by type name, shared with every spawned actor.
#[derive(Resource, Clone, Debug, Default)]
pub struct ActorRegistry {
    by_name: HashMap<String, Arc<ActorTypeDescriptor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a list of descriptors from RON, e.g. `[(name: "ghoul", kind: Enemy, ...)]`.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let list: Vec<ActorTypeDescriptor> = ron::from_str(text)?;
        let mut registry = Self::new();
        for descriptor in list {
            registry.register(descriptor);
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: ActorTypeDescriptor) -> Arc<ActorTypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.by_name
            .insert(descriptor.name.clone(), Arc::clone(&descriptor));
        descriptor
    }

    pub fn get(&self, name: &str) -> Option<Arc<ActorTypeDescriptor>> {
        self.by_name.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

// =============================================================================
// BEHAVIOURS AND STATES
// =============================================================================

/// Policies available to hostile actors.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EnemyBehavior {
    /// Shooter-style: never moves.
    #[default]
    Stationary,
    /// Closes in on the player.
    Rusher,
    /// Closes in, keeping a little more distance.
    Guard,
    /// Searches for cover and hides from the player.
    Coward,
}

/// Policies available to neutral actors.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NpcBehavior {
    #[default]
    Stationary,
    /// Stands still, turning to watch the player.
    Watcher,
    Wanderer,
    Follower,
    /// Permanently hostile, keeps a guard's distance.
    Guard,
    /// Permanently hostile.
    Hostile,
}

impl NpcBehavior {
    pub fn is_permanently_hostile(&self) -> bool {
        matches!(self, NpcBehavior::Guard | NpcBehavior::Hostile)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EnemyState {
    #[default]
    Idle,
    Chasing,
    Fleeing,
    Searching,
    Hiding,
    Dying,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum NpcState {
    #[default]
    Idle,
    Wandering,
    Following,
    Provoked,
    Cooldown,
}

/// Behaviour requested for a new actor; must match the descriptor's [`ActorKind`].
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Enemy(EnemyBehavior),
    Npc(NpcBehavior),
}

impl Behavior {
    pub fn kind(&self) -> ActorKind {
        match self {
            Behavior::Enemy(_) => ActorKind::Enemy,
            Behavior::Npc(_) => ActorKind::Npc,
        }
    }
}

/// What dealt a hit. Fire deaths leave ash instead of blood.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DamageType {
    #[default]
    Physical,
    Fire,
    Explosive,
}

// =============================================================================
// HEALTH
// =============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn take_damage(&mut self, amount: f32) -> bool {
        self.current = (self.current - amount.max(0.0)).max(0.0);
        self.current <= 0.0
    }

    pub fn kill(&mut self) {
        self.current = 0.0;
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }
}

// =============================================================================
// MINDS
// =============================================================================

#[derive(Clone, Debug)]
pub struct EnemyMind {
    pub(crate) behavior: EnemyBehavior,
    pub(crate) state: EnemyState,
    pub(crate) last_damage: Option<DamageType>,
    pub(crate) death: Option<DeathSequence>,
}

impl EnemyMind {
    pub fn behavior(&self) -> EnemyBehavior {
        self.behavior
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn last_damage(&self) -> Option<DamageType> {
        self.last_damage
    }

    pub fn death(&self) -> Option<&DeathSequence> {
        self.death.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct NpcMind {
    pub(crate) behavior: NpcBehavior,
    pub(crate) state: NpcState,
    pub(crate) provocation: f32,
}

impl NpcMind {
    pub fn behavior(&self) -> NpcBehavior {
        self.behavior
    }

    pub fn state(&self) -> NpcState {
        self.state
    }

    pub fn provocation(&self) -> f32 {
        self.provocation
    }
}

/// Kind-specific AI data.
#[derive(Clone, Debug)]
pub enum Mind {
    Enemy(EnemyMind),
    Npc(NpcMind),
}

// =============================================================================
// ACTOR
// =============================================================================

/// Stable identifier handed out at spawn time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One spawned enemy or NPC.
///
/// Fields are only mutated by the simulation components (movement, physics, AI,
/// provocation, death); everything outside the crate reads through accessors.
#[derive(Clone, Debug)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) descriptor: Arc<ActorTypeDescriptor>,
    pub(crate) position: Vec3,
    pub(crate) home: Vec3,
    pub(crate) target: Option<Vec3>,
    pub(crate) state_timer: f32,
    pub(crate) facing: f32,
    pub(crate) moving: bool,
    pub(crate) health: Health,
    pub(crate) equipment: Option<String>,
    pub(crate) mind: Mind,
}

impl Actor {
    pub(crate) fn new(
        id: ActorId,
        descriptor: Arc<ActorTypeDescriptor>,
        behavior: Behavior,
        position: Vec3,
        health: f32,
        equipment: Option<String>,
    ) -> Self {
        let mind = match behavior {
            Behavior::Enemy(behavior) => Mind::Enemy(EnemyMind {
                behavior,
                state: EnemyState::Idle,
                last_damage: None,
                death: None,
            }),
            Behavior::Npc(behavior) => Mind::Npc(NpcMind {
                behavior,
                state: NpcState::Idle,
                provocation: 0.0,
            }),
        };

        Self {
            id,
            descriptor,
            position,
            home: position,
            target: None,
            state_timer: 0.0,
            facing: 0.0,
            moving: false,
            health: Health::new(health),
            equipment,
            mind,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn descriptor(&self) -> &ActorTypeDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> ActorKind {
        match self.mind {
            Mind::Enemy(_) => ActorKind::Enemy,
            Mind::Npc(_) => ActorKind::Npc,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    pub fn state_timer(&self) -> f32 {
        self.state_timer
    }

    /// Yaw in radians (visual only).
    pub fn facing(&self) -> f32 {
        self.facing
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn health(&self) -> &Health {
        &self.health
    }

    pub fn equipment(&self) -> Option<&str> {
        self.equipment.as_deref()
    }

    pub fn mind(&self) -> &Mind {
        &self.mind
    }

    pub fn half_extents(&self) -> Vec3 {
        self.descriptor.half_extents()
    }

    /// Feet height.
    pub fn bottom(&self) -> f32 {
        self.position.y - self.descriptor.height * 0.5
    }

    pub fn enemy(&self) -> Option<&EnemyMind> {
        match &self.mind {
            Mind::Enemy(mind) => Some(mind),
            Mind::Npc(_) => None,
        }
    }

    pub fn npc(&self) -> Option<&NpcMind> {
        match &self.mind {
            Mind::Npc(mind) => Some(mind),
            Mind::Enemy(_) => None,
        }
    }

    pub fn is_dying(&self) -> bool {
        matches!(&self.mind, Mind::Enemy(mind) if mind.state == EnemyState::Dying)
    }

    /// Whether the AI sits in its idle baseline with nothing to walk to.
    pub fn is_idle(&self) -> bool {
        let idle_state = match &self.mind {
            Mind::Enemy(mind) => mind.state == EnemyState::Idle,
            Mind::Npc(mind) => mind.state == NpcState::Idle,
        };
        idle_state && self.target.is_none()
    }

    /// Opacity for the renderer; `None` while not dying.
    pub fn opacity(&self) -> Option<f32> {
        self.enemy()
            .and_then(|mind| mind.death.as_ref())
            .map(DeathSequence::opacity)
    }

    pub fn view(&self) -> ActorView {
        ActorView {
            id: self.id,
            position: self.position,
            facing: self.facing,
            moving: self.moving,
            opacity: self.opacity(),
        }
    }
}

/// Per-tick snapshot handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorView {
    pub id: ActorId,
    pub position: Vec3,
    pub facing: f32,
    pub moving: bool,
    pub opacity: Option<f32>,
}
