//! Top-level `GameState` and the physics freeze that goes with leaving play.
//!
//! ## States
//!
//! | State      | Description                                             |
//! |------------|---------------------------------------------------------|
//! | `Boating`  | Initial state; boat under player control, physics live  |
//! | `Notes`    | Note book open; physics frozen                          |
//! | `Dialogue` | Pausing dialogue on screen; physics frozen              |
//! | `Paused`   | Pause overlay visible; physics frozen                   |
//!
//! Every boat-control system runs under `.run_if(in_state(GameState::Boating))`.

use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Top-level application state machine.
#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Rowing; the only state in which the simulation advances.
    #[default]
    Boating,
    /// Note book overlay open.
    Notes,
    /// A dialogue that pauses the game is showing.
    Dialogue,
    /// Pause overlay open.
    Paused,
}

/// Registers `GameState` and freezes Rapier outside `Boating`.
///
/// Must be added before any plugin that uses `in_state(GameState::…)`.
pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .add_systems(OnExit(GameState::Boating), pause_physics)
            .add_systems(OnEnter(GameState::Boating), resume_physics);
    }
}

/// Disable the Rapier pipeline so the river freezes in place.
pub fn pause_physics(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.physics_pipeline_active = false;
    }
}

/// Re-enable the Rapier pipeline when play resumes.
pub fn resume_physics(mut config: Query<&mut RapierConfiguration>) {
    for mut cfg in config.iter_mut() {
        cfg.physics_pipeline_active = true;
    }
}
