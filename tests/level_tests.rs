//! Headless tests for level loading, transitions, and weather.
//!
//! `LevelPlugin` runs against `MinimalPlugins`; contacts and deaths are
//! injected as messages instead of coming from Rapier.

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use nightrow::audio::SfxRequest;
use nightrow::config::BoatConfig;
use nightrow::hud::ScreenFade;
use nightrow::level::{
    LevelEntity, LevelFlow, LevelIndex, LevelPlugin, LoadLevel, Transition, Weather, LEVEL_COUNT,
};
use nightrow::player::{ContactCategory, ContactPhase, Player, PlayerContact, PlayerDied};
use nightrow::state::GameStatePlugin;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn level_app(config: BoatConfig) -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin, GameStatePlugin));
    app.insert_resource(config);
    app.init_resource::<ScreenFade>();
    app.add_message::<PlayerContact>();
    app.add_message::<PlayerDied>();
    app.add_message::<SfxRequest>();
    app.add_plugins(LevelPlugin);
    app
}

fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
    let world = app.world_mut();
    world.query_filtered::<Entity, F>().iter(world).count()
}

fn touch(app: &mut App, category: ContactCategory) {
    let other = app.world_mut().spawn_empty().id();
    app.world_mut().write_message(PlayerContact {
        other,
        category,
        phase: ContactPhase::Started,
    });
    app.update();
}

fn level_index(app: &App) -> usize {
    app.world().resource::<LevelIndex>().0
}

// ── Loading ───────────────────────────────────────────────────────────────────

#[test]
fn first_frame_loads_level_zero_with_one_boat() {
    let mut app = level_app(BoatConfig::default());
    app.update();

    assert_eq!(level_index(&app), 0);
    assert_eq!(count::<With<Player>>(&mut app), 1);
    assert!(count::<With<LevelEntity>>(&mut app) > 10);
    assert!(count::<With<ContactCategory>>(&mut app) > 0);
}

#[test]
fn loading_again_replaces_the_previous_level() {
    let mut app = level_app(BoatConfig::default());
    app.update();

    app.world_mut().write_message(LoadLevel { index: 1 });
    app.update();

    assert_eq!(level_index(&app), 1);
    assert_eq!(count::<With<Player>>(&mut app), 1);
}

#[test]
fn load_resets_weather_and_fades_in() {
    let mut app = level_app(BoatConfig::default());
    app.update();
    touch(&mut app, ContactCategory::RainUp);
    assert_eq!(app.world().resource::<Weather>().rain(), 1);

    app.world_mut().write_message(LoadLevel { index: 0 });
    app.update();

    assert_eq!(app.world().resource::<Weather>().rain(), 0);
    assert!(!app.world().resource::<ScreenFade>().is_settled(), "load must start a fade-in");
}

// ── Weather ───────────────────────────────────────────────────────────────────

#[test]
fn rain_triggers_step_and_clamp() {
    let mut app = level_app(BoatConfig::default());
    app.update();

    for _ in 0..5 {
        touch(&mut app, ContactCategory::RainUp);
    }
    assert_eq!(app.world().resource::<Weather>().rain(), 3);

    touch(&mut app, ContactCategory::RainDown);
    assert_eq!(app.world().resource::<Weather>().rain(), 2);
}

// ── Transitions ───────────────────────────────────────────────────────────────

#[test]
fn finish_line_advances_to_next_level() {
    let config = BoatConfig {
        level_end_secs: 0.0,
        ..Default::default()
    };
    let mut app = level_app(config);
    app.update();

    touch(&mut app, ContactCategory::LevelEnd);
    // Countdown fires, then the load request is handled.
    app.update();
    app.update();

    assert_eq!(level_index(&app), 1);
    assert_eq!(app.world().resource::<LevelFlow>().pending(), None);
}

#[test]
fn finish_line_arms_a_delayed_transition() {
    let mut app = level_app(BoatConfig::default());
    app.update();

    touch(&mut app, ContactCategory::LevelEnd);
    assert_eq!(
        app.world().resource::<LevelFlow>().pending(),
        Some(Transition::NextLevel)
    );
    assert_eq!(level_index(&app), 0);
}

#[test]
fn death_reloads_the_same_level() {
    let config = BoatConfig {
        death_secs: 0.0,
        ..Default::default()
    };
    let mut app = level_app(config);
    app.insert_resource(LevelIndex(2));
    app.update();
    assert_eq!(level_index(&app), 2);

    let first_boat = {
        let world = app.world_mut();
        world
            .query_filtered::<Entity, With<Player>>()
            .single(world)
            .unwrap()
    };

    app.world_mut().write_message(PlayerDied {
        position: Vec2::ZERO,
    });
    app.update();
    app.update();
    app.update();

    assert_eq!(level_index(&app), 2);
    let world = app.world_mut();
    let boat = world
        .query_filtered::<Entity, With<Player>>()
        .single(world)
        .unwrap();
    assert_ne!(boat, first_boat, "reload must spawn a fresh boat");
}

#[test]
fn last_level_wraps_to_first() {
    let config = BoatConfig {
        level_end_secs: 0.0,
        ..Default::default()
    };
    let mut app = level_app(config);
    app.insert_resource(LevelIndex(LEVEL_COUNT - 1));
    app.update();

    touch(&mut app, ContactCategory::LevelEnd);
    app.update();
    app.update();

    assert_eq!(level_index(&app), 0);
}
