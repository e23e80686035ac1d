//! Nightrow: row a small boat up a dark river.
//!
//! The steering/throttle model in [`steering`] is engine-free; everything
//! else is Bevy glue around it.  [`NightrowPlugin`] adds every gameplay
//! plugin; the binary adds windowing and physics on top.

pub mod audio;
pub mod config;
pub mod constants;
pub mod error;
pub mod graphics;
pub mod hud;
pub mod level;
pub mod notes;
pub mod player;
pub mod state;
pub mod steering;
pub mod timing;

use bevy::prelude::*;

/// All gameplay plugins, in dependency order.
///
/// Expects `BoatConfig` to be inserted and Rapier to be added by the caller.
pub struct NightrowPlugin;

impl Plugin for NightrowPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            state::GameStatePlugin,
            player::PlayerPlugin,
            audio::SoundPlugin,
            notes::NotesPlugin,
            hud::HudPlugin,
            level::LevelPlugin,
            graphics::GraphicsPlugin,
        ))
        .add_systems(Startup, config::load_boat_config);
    }
}
