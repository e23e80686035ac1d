use bevy::prelude::*;
use bevy::window::WindowResolution;
use bevy_rapier2d::prelude::*;
use nightrow::config::BoatConfig;
use nightrow::constants::FIXED_HZ;
use nightrow::level::{LevelIndex, LEVEL_COUNT};
use nightrow::NightrowPlugin;
use std::env;

/// Configure Rapier physics: a river has no gravity in the top-down view.
fn setup_physics_config(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.gravity = Vec2::ZERO;
    }
}

fn main() {
    // NIGHTROW_LEVEL=<n> starts at level n instead of the first one.
    let start_level = env::var("NIGHTROW_LEVEL")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .map(|n| n % LEVEL_COUNT)
        .unwrap_or(0);

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Nightrow".into(),
            resolution: WindowResolution::new(1280, 720),
            ..Default::default()
        }),
        ..Default::default()
    }))
    .insert_resource(ClearColor(Color::BLACK))
    .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
    // Compiled defaults; load_boat_config overwrites them from
    // assets/boat.toml (if present) in the Startup schedule.
    .insert_resource(BoatConfig::default())
    .insert_resource(LevelIndex(start_level))
    // One world unit per metre; the camera does the pixel scaling.
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(1.0).in_fixed_schedule())
    .add_plugins(NightrowPlugin)
    .add_systems(Startup, setup_physics_config);

    if start_level != 0 {
        info!("Starting at level {start_level}");
    }

    app.run();
}
