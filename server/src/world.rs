//! Demo world: a small walled village with loose cover blocks and props,
//! populated with a mix of enemies and townsfolk.

use bevy::prelude::*;
use shared::{
    Behavior, EnemyBehavior, NpcBehavior, Simulation, Solid, SolidGrid, SolidKind, SpawnRequest,
};

/// (x, z, footprint, height) of each house.
const HOUSES: [(f32, f32, f32, f32); 6] = [
    (-20.0, -20.0, 8.0, 6.0),
    (-20.0, 0.0, 8.0, 6.0),
    (-20.0, 20.0, 8.0, 6.0),
    (20.0, -20.0, 10.0, 7.0),
    (20.0, 10.0, 8.0, 6.0),
    (40.0, 40.0, 12.0, 9.0),
];

/// Build the static geometry of the village.
pub fn build_village() -> SolidGrid {
    let mut grid = SolidGrid::new();

    for (x, z, footprint, height) in HOUSES {
        grid.insert(Solid::placed(
            SolidKind::Building,
            x,
            z,
            0.0,
            Vec3::new(footprint, height, footprint),
        ));
    }

    // Crates stacked around the square: good cover, and low enough to climb.
    for i in 0..8 {
        let angle = i as f32 * std::f32::consts::TAU / 8.0;
        let (x, z) = (angle.cos() * 12.0, angle.sin() * 12.0);
        let height = if i % 2 == 0 { 2.0 } else { 0.5 };
        grid.insert(Solid::placed(SolidKind::Block, x, z, 0.0, Vec3::new(2.0, height, 2.0)));
    }
    // A crate on a crate.
    grid.insert(Solid::placed(SolidKind::Block, 12.0, 0.0, 2.0, Vec3::splat(1.0)));

    // Barrels and a well: they block movement but nobody hides behind them.
    for (x, z) in [(5.0, -8.0), (-6.0, 7.0), (8.0, 8.0)] {
        grid.insert(Solid::placed(SolidKind::Prop, x, z, 0.0, Vec3::new(1.0, 1.2, 1.0)));
    }
    grid.insert(Solid::placed(SolidKind::Prop, 0.0, 0.0, 0.0, Vec3::new(2.5, 1.0, 2.5)));

    grid
}

/// Who lives in the village at startup.
pub fn demo_spawns() -> Vec<SpawnRequest> {
    let enemy = |behavior| Behavior::Enemy(behavior);
    let npc = |behavior| Behavior::Npc(behavior);

    vec![
        SpawnRequest::new("ghoul", enemy(EnemyBehavior::Rusher), Vec3::new(30.0, 0.9, -5.0)),
        SpawnRequest::new("ghoul", enemy(EnemyBehavior::Guard), Vec3::new(-30.0, 0.9, 10.0)),
        SpawnRequest::new("bandit", enemy(EnemyBehavior::Stationary), Vec3::new(20.0, 7.9, -20.0))
            .with_equipment("crossbow"),
        SpawnRequest::new("imp", enemy(EnemyBehavior::Coward), Vec3::new(6.0, 0.6, -2.0)),
        SpawnRequest::new("imp", enemy(EnemyBehavior::Coward), Vec3::new(-4.0, 0.6, -14.0))
            .with_health(15.0),
        // No model shipped for this one; the spawn is skipped.
        SpawnRequest::new("lich", enemy(EnemyBehavior::Rusher), Vec3::new(100.0, 1.1, 100.0)),
        SpawnRequest::new("villager", npc(NpcBehavior::Wanderer), Vec3::new(-10.0, 0.9, -5.0)),
        SpawnRequest::new("villager", npc(NpcBehavior::Wanderer), Vec3::new(5.0, 0.9, 15.0)),
        SpawnRequest::new("villager", npc(NpcBehavior::Watcher), Vec3::new(-14.0, 0.9, 20.0))
            .with_equipment("broom"),
        SpawnRequest::new("villager", npc(NpcBehavior::Stationary), Vec3::new(14.0, 0.9, 14.0)),
        SpawnRequest::new("dog", npc(NpcBehavior::Follower), Vec3::new(2.0, 0.4, 4.0)),
        SpawnRequest::new("guard", npc(NpcBehavior::Guard), Vec3::new(60.0, 0.95, 60.0))
            .with_equipment("halberd"),
        // Far outside the activation range of the village square.
        SpawnRequest::new("bandit", enemy(EnemyBehavior::Rusher), Vec3::new(300.0, 0.9, 0.0)),
    ]
}

/// Insert the village geometry.
pub fn setup_world(mut commands: Commands) {
    let grid = build_village();
    let cover = grid.iter().filter(|solid| solid.kind.is_occluder()).count();
    info!("Server world initialized with {} solids ({} usable as cover)", grid.len(), cover);
    commands.insert_resource(grid);
}

pub fn spawn_demo_actors(mut sim: ResMut<Simulation>) {
    let requests = demo_spawns();
    let requested = requests.len();
    let spawned = requests
        .into_iter()
        .filter_map(|request| sim.spawn(request))
        .count();

    info!(
        "Spawned {}/{} actors from {} registered types",
        spawned,
        requested,
        sim.registry().len()
    );
}
