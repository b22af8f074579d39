//! AI + physics tuning.
//!
//! Every constant the actor core reads lives here, grouped per component. Values can be
//! overridden from a RON file; anything missing falls back to the defaults below.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading an [`AiConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

// =============================================================================
// COMPONENT SECTIONS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Actors farther than this from the player are not simulated.
    pub range: f32,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self { range: 150.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Highest ledge (above the feet) that still counts as support.
    pub max_step_height: f32,
    /// Constant fall speed in units per second.
    pub fall_speed: f32,
    /// Vertical corrections at or below this are skipped.
    pub snap_dead_zone: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            max_step_height: 4.0,
            fall_speed: 25.0,
            snap_dead_zone: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// An overlapped solid does not block when the feet are within this of its top.
    pub step_tolerance: f32,
    /// Visual yaw turn rate in radians per second.
    pub turn_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            step_tolerance: 0.5,
            turn_speed: 6.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HidingConfig {
    /// Distance of each probe point from the actor.
    pub hide_distance: f32,
    /// Radius searched around each probe point for an occluder.
    pub search_radius: f32,
    /// How far behind the occluder (away from the threat) the actor stands.
    pub cover_offset: f32,
    /// Probe directions, in degrees around the vertical axis, tried in order.
    pub probe_angles_deg: Vec<f32>,
}

impl Default for HidingConfig {
    fn default() -> Self {
        Self {
            hide_distance: 15.0,
            search_radius: 40.0,
            cover_offset: 5.0,
            probe_angles_deg: vec![-30.0, 0.0, 30.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CowardConfig {
    pub detection_range: f32,
    /// Seconds of failed searching before giving up.
    pub search_timeout: f32,
    pub arrival_distance: f32,
    /// Seconds spent hiding before returning to idle.
    pub hide_dwell: f32,
}

impl Default for CowardConfig {
    fn default() -> Self {
        Self {
            detection_range: 25.0,
            search_timeout: 2.0,
            arrival_distance: 2.0,
            hide_dwell: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Seconds idled between wander legs.
    pub pause: f32,
    pub radius: f32,
    pub arrival_distance: f32,
    /// Candidate points tried before giving up on a leg.
    pub max_target_attempts: u32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self {
            pause: 4.0,
            radius: 15.0,
            arrival_distance: 1.5,
            max_target_attempts: 16,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowConfig {
    /// Start following once the player is farther than this.
    pub follow_distance: f32,
    /// Stop following once the player is within this.
    pub stop_distance: f32,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            follow_distance: 8.0,
            stop_distance: 3.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggressionConfig {
    /// Rushers stop closing in at this distance.
    pub rusher_stop_distance: f32,
    /// Guards stop closing in at this distance.
    pub guard_stop_distance: f32,
}

impl Default for AggressionConfig {
    fn default() -> Self {
        Self {
            rusher_stop_distance: 1.5,
            guard_stop_distance: 2.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvocationConfig {
    pub per_hit: f32,
    pub threshold: f32,
    /// Provocation lost per second while not hostile.
    pub decay_rate: f32,
}

impl Default for ProvocationConfig {
    fn default() -> Self {
        Self {
            per_hit: 12.0,
            threshold: 30.0,
            decay_rate: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostilityConfig {
    /// Provoked NPCs pause (but stay provoked) inside this distance.
    pub stop_chase_distance: f32,
    /// Seconds a provocation lasts.
    pub chase_timeout: f32,
    /// Provoked NPCs give up when the threat gets farther than this.
    pub max_chase_distance: f32,
    pub cooldown: f32,
}

impl Default for HostilityConfig {
    fn default() -> Self {
        Self {
            stop_chase_distance: 1.5,
            chase_timeout: 10.0,
            max_chase_distance: 30.0,
            cooldown: 5.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathConfig {
    pub fade_duration: f32,
    /// Fire deaths drop ash once the fade timer is at or below this.
    pub ash_threshold: f32,
}

impl Default for DeathConfig {
    fn default() -> Self {
        Self {
            fade_duration: 1.5,
            ash_threshold: 1.5,
        }
    }
}

// =============================================================================
// ROOT
// =============================================================================

/// All tuning consumed by [`crate::Simulation`].
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub activation: ActivationConfig,
    pub physics: PhysicsConfig,
    pub movement: MovementConfig,
    pub hiding: HidingConfig,
    pub coward: CowardConfig,
    pub wander: WanderConfig,
    pub follow: FollowConfig,
    pub aggression: AggressionConfig,
    pub provocation: ProvocationConfig,
    pub hostility: HostilityConfig,
    pub death: DeathConfig,
}

impl AiConfig {
    /// Parse a (possibly partial) config from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str::<Self>(text)?.sanitized())
    }

    /// Read and parse a RON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Clamp every negative duration, distance, rate and threshold to zero.
    pub fn sanitized(mut self) -> Self {
        let mut fields: Vec<(&'static str, &mut f32)> = vec![
            ("activation.range", &mut self.activation.range),
            ("physics.max_step_height", &mut self.physics.max_step_height),
            ("physics.fall_speed", &mut self.physics.fall_speed),
            ("physics.snap_dead_zone", &mut self.physics.snap_dead_zone),
            ("movement.step_tolerance", &mut self.movement.step_tolerance),
            ("movement.turn_speed", &mut self.movement.turn_speed),
            ("hiding.hide_distance", &mut self.hiding.hide_distance),
            ("hiding.search_radius", &mut self.hiding.search_radius),
            ("hiding.cover_offset", &mut self.hiding.cover_offset),
            ("coward.detection_range", &mut self.coward.detection_range),
            ("coward.search_timeout", &mut self.coward.search_timeout),
            ("coward.arrival_distance", &mut self.coward.arrival_distance),
            ("coward.hide_dwell", &mut self.coward.hide_dwell),
            ("wander.pause", &mut self.wander.pause),
            ("wander.radius", &mut self.wander.radius),
            ("wander.arrival_distance", &mut self.wander.arrival_distance),
            ("follow.follow_distance", &mut self.follow.follow_distance),
            ("follow.stop_distance", &mut self.follow.stop_distance),
            ("aggression.rusher_stop_distance", &mut self.aggression.rusher_stop_distance),
            ("aggression.guard_stop_distance", &mut self.aggression.guard_stop_distance),
            ("provocation.per_hit", &mut self.provocation.per_hit),
            ("provocation.threshold", &mut self.provocation.threshold),
            ("provocation.decay_rate", &mut self.provocation.decay_rate),
            ("hostility.stop_chase_distance", &mut self.hostility.stop_chase_distance),
            ("hostility.chase_timeout", &mut self.hostility.chase_timeout),
            ("hostility.max_chase_distance", &mut self.hostility.max_chase_distance),
            ("hostility.cooldown", &mut self.hostility.cooldown),
            ("death.fade_duration", &mut self.death.fade_duration),
            ("death.ash_threshold", &mut self.death.ash_threshold),
        ];

        for (name, value) in fields.iter_mut() {
            if **value < 0.0 || value.is_nan() {
                warn!("AI config `{}` = {} is invalid, clamping to 0", name, value);
                **value = 0.0;
            }
        }

        self
    }
}
