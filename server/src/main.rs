//! Headless server hosting the enemy/NPC simulation for a demo village.
//!
//! A scripted player walks through the village and swings at whatever is nearby, so
//! every behaviour gets exercised without a client attached.

mod combat;
mod player;
mod sim;
mod world;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use shared::{tick_duration, FIXED_TIMESTEP_HZ};

fn main() {
    let mut app = App::new();

    // Headless plugins (no rendering). Run the main loop at the fixed tick rate so
    // frames and simulation ticks stay in lockstep.
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.add_plugins(bevy::log::LogPlugin::default());
    app.insert_resource(Time::<Fixed>::from_hz(FIXED_TIMESTEP_HZ));

    app.add_plugins(sim::SimPlugin);

    info!("Starting simulation server at {} Hz", FIXED_TIMESTEP_HZ);
    app.run();
}
