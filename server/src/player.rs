//! Stand-in for a connected player: walks a fixed patrol route through the village
//! so the AI has someone to react to.

use bevy::prelude::*;
use shared::FIXED_TIMESTEP_HZ;

/// Walking speed of the scripted player (units/s).
pub const PLAYER_WALK_SPEED: f32 = 4.0;
const PLAYER_EYE_HEIGHT: f32 = 0.9;
const WAYPOINT_REACHED: f32 = 0.1;

#[derive(Resource, Debug, Clone)]
pub struct ScriptedPlayer {
    pub position: Vec3,
    route: Vec<Vec3>,
    next: usize,
    speed: f32,
}

impl ScriptedPlayer {
    /// Start at the first waypoint and loop over the route forever.
    pub fn new(route: Vec<Vec3>, speed: f32) -> Self {
        Self {
            position: route.first().copied().unwrap_or(Vec3::ZERO),
            route,
            next: 0,
            speed,
        }
    }

    pub fn next_waypoint(&self) -> Option<Vec3> {
        self.route.get(self.next).copied()
    }

    /// Walk toward the current waypoint, moving on to the next one when reached.
    pub fn advance(&mut self, dt: f32) {
        let Some(waypoint) = self.next_waypoint() else {
            return;
        };

        let to = waypoint - self.position;
        let dist = to.length();
        let step = self.speed * dt;

        if dist <= step.max(WAYPOINT_REACHED) {
            self.position = waypoint;
            self.next = (self.next + 1) % self.route.len();
        } else {
            self.position += to / dist * step;
        }
    }
}

impl Default for ScriptedPlayer {
    /// A loop around the village square, with a detour out to the far houses.
    fn default() -> Self {
        let y = PLAYER_EYE_HEIGHT;
        Self::new(
            vec![
                Vec3::new(0.0, y, 6.0),
                Vec3::new(9.0, y, 4.0),
                Vec3::new(9.0, y, -9.0),
                Vec3::new(-8.0, y, -10.0),
                Vec3::new(-10.0, y, 10.0),
                Vec3::new(30.0, y, 30.0),
                Vec3::new(0.0, y, 25.0),
            ],
            PLAYER_WALK_SPEED,
        )
    }
}

pub fn move_scripted_player(mut player: ResMut<ScriptedPlayer>) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;
    player.advance(dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_route_and_loops() {
        let mut player = ScriptedPlayer::new(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)], 1.0);

        // First waypoint is where we start.
        player.advance(0.5);
        assert_eq!(player.next_waypoint(), Some(Vec3::new(2.0, 0.0, 0.0)));

        for _ in 0..4 {
            player.advance(0.5);
        }
        assert_eq!(player.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(player.next_waypoint(), Some(Vec3::ZERO));
    }

    #[test]
    fn empty_route_stands_still() {
        let mut player = ScriptedPlayer::new(Vec::new(), 5.0);
        player.advance(1.0);
        assert_eq!(player.position, Vec3::ZERO);
    }

    #[test]
    fn system_moves_player() {
        let mut app = App::new();
        app.insert_resource(ScriptedPlayer::new(vec![Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0)], 6.0));
        app.add_systems(Update, move_scripted_player);

        app.update(); // reaches the first waypoint
        app.update();
        let player = app.world().resource::<ScriptedPlayer>();
        assert!((player.position.z + 0.1).abs() < 1e-4);
    }
}
