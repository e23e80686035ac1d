//! Headless tests for boat collision handling.
//!
//! Rapier is not running: each test writes `CollisionEvent`s by hand and lets
//! `PlayerPlugin`'s dispatch → react → consume chain handle them in one
//! `app.update()`.

use bevy::input::gamepad::GamepadConnectionEvent;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy_rapier2d::prelude::*;
use bevy_rapier2d::rapier::geometry::CollisionEventFlags;
use bevy::ecs::message::Messages;
use nightrow::audio::{Cue, SfxRequest};
use nightrow::config::BoatConfig;
use nightrow::constants::DEBRIS_IMPACT_VOLUME;
use nightrow::graphics::CameraShake;
use nightrow::hud::HelperMessage;
use nightrow::notes::NoteInventory;
use nightrow::player::{
    spawn_player, BoatMotion, Bottle, ContactCategory, PlayerHealth, PlayerPlugin, WallContacts,
};
use nightrow::state::GameStatePlugin;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Everything `PlayerPlugin` reads from other plugins, without them.
fn contact_app() -> App {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin));
    app.insert_resource(BoatConfig::default());
    app.init_resource::<ButtonInput<KeyCode>>();
    app.init_resource::<NoteInventory>();
    app.init_resource::<HelperMessage>();
    app.init_resource::<CameraShake>();
    app.add_message::<GamepadConnectionEvent>();
    app.add_message::<CollisionEvent>();
    app.add_message::<SfxRequest>();
    app.add_plugins((GameStatePlugin, PlayerPlugin));
    app
}

fn spawn_boat(app: &mut App, position: Vec2) -> Entity {
    let config = BoatConfig::default();
    let boat = {
        let world = app.world_mut();
        let mut commands = world.commands();
        spawn_player(&mut commands, position, &config)
    };
    app.world_mut().flush();
    boat
}

fn started(a: Entity, b: Entity) -> CollisionEvent {
    CollisionEvent::Started(a, b, CollisionEventFlags::empty())
}

fn stopped(a: Entity, b: Entity) -> CollisionEvent {
    CollisionEvent::Stopped(a, b, CollisionEventFlags::empty())
}

fn collide(app: &mut App, event: CollisionEvent) {
    app.world_mut().write_message(event);
    app.update();
}

fn health(app: &App, boat: Entity) -> PlayerHealth {
    app.world().get::<PlayerHealth>(boat).unwrap().clone()
}

// ── Bottles ───────────────────────────────────────────────────────────────────

#[test]
fn bottle_heals_files_note_and_disappears() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();
    app.world_mut().get_mut::<PlayerHealth>(boat).unwrap().hp = 2;

    let bottle = app
        .world_mut()
        .spawn((
            ContactCategory::Bottle,
            Bottle { note_id: 3 },
            Transform::from_xyz(0.5, 0.0, 0.0),
        ))
        .id();

    collide(&mut app, started(boat, bottle));

    assert_eq!(health(&app, boat).hp, 3);
    assert!(app.world().resource::<NoteInventory>().is_collected(3));
    assert!(!app.world().resource::<HelperMessage>().text().is_empty());
    assert!(
        app.world().get_entity(bottle).is_err(),
        "bottle must be consumed"
    );
}

// ── Enemies ───────────────────────────────────────────────────────────────────

#[test]
fn enemy_hit_costs_a_heart_and_knocks_back() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();

    let enemy = app
        .world_mut()
        .spawn((ContactCategory::Enemy, Transform::from_xyz(2.0, 0.0, 0.0)))
        .id();

    // Either body order must work.
    collide(&mut app, started(enemy, boat));

    let hp = health(&app, boat);
    assert_eq!(hp.hp, 2);
    assert!(hp.is_invulnerable());

    let motion = app.world().get::<BoatMotion>(boat).unwrap();
    assert!(motion.knockback.magnitude() > 0.0);
    assert!(
        motion.knockback.direction().x < 0.0,
        "enemy on the right must push the boat left"
    );
    assert!(app.world().resource::<CameraShake>().is_active());
    assert!(
        app.world().get_entity(enemy).is_ok(),
        "enemies are not consumed"
    );
}

#[test]
fn enemy_contact_while_invulnerable_is_ignored() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();
    let enemy = app
        .world_mut()
        .spawn((ContactCategory::Enemy, Transform::from_xyz(0.0, 2.0, 0.0)))
        .id();

    collide(&mut app, started(boat, enemy));
    collide(&mut app, stopped(boat, enemy));
    collide(&mut app, started(boat, enemy));

    assert_eq!(health(&app, boat).hp, 2);
}

#[test]
fn last_heart_sinks_the_boat() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();
    let enemy = app
        .world_mut()
        .spawn((ContactCategory::Enemy, Transform::from_xyz(0.0, 2.0, 0.0)))
        .id();

    for _ in 0..3 {
        app.world_mut()
            .get_mut::<PlayerHealth>(boat)
            .unwrap()
            .invulnerable
            .clear();
        collide(&mut app, started(boat, enemy));
    }

    let hp = health(&app, boat);
    assert!(hp.is_dead());
    let config = BoatConfig::default();
    assert!(hp.invulnerable.remaining() <= config.death_secs);
    assert!(hp.invulnerable.remaining() > config.invulnerable_secs);
}

// ── Debris ────────────────────────────────────────────────────────────────────

#[test]
fn debris_thud_uses_velocity_before_the_bounce() {
    let mut app = contact_app();
    // Keep the fixed-step movement update from rewriting the boat's motion.
    app.insert_resource(Time::<Fixed>::from_seconds(3600.0));
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();

    let full = BoatConfig::default().max_boosted_speed();
    app.world_mut().get_mut::<BoatMotion>(boat).unwrap().commanded = Vec2::new(full, 0.0);
    // What the solver leaves behind after a head-on hit with restitution 0.2.
    app.world_mut().get_mut::<Velocity>(boat).unwrap().linvel = Vec2::new(-0.2 * full, 0.0);
    app.world_mut()
        .resource_mut::<Messages<SfxRequest>>()
        .clear();

    let rock = app
        .world_mut()
        .spawn((ContactCategory::HardDebris, Transform::from_xyz(1.0, 0.0, 0.0)))
        .id();
    collide(&mut app, started(boat, rock));

    let thuds: Vec<SfxRequest> = app
        .world_mut()
        .resource_mut::<Messages<SfxRequest>>()
        .drain()
        .filter(|r| r.cue == Cue::HitHardDebris)
        .collect();
    assert_eq!(thuds.len(), 1);
    assert!(
        (thuds[0].volume - DEBRIS_IMPACT_VOLUME).abs() < 1e-4,
        "full-speed hit should be loudest, got {}",
        thuds[0].volume
    );
    assert!(app.world().get_entity(rock).is_ok(), "debris is not consumed");
}

// ── Walls ─────────────────────────────────────────────────────────────────────

#[test]
fn wall_overlap_is_tracked_until_it_stops() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();
    let wall = app
        .world_mut()
        .spawn((
            ContactCategory::WallHorizontal,
            Transform::from_xyz(-3.0, 0.0, 0.0),
        ))
        .id();

    collide(&mut app, started(wall, boat));
    assert_eq!(app.world().get::<WallContacts>(boat).unwrap().0, vec![wall]);

    collide(&mut app, stopped(boat, wall));
    assert!(!app.world().get::<WallContacts>(boat).unwrap().is_touching());
    assert!(app.world().get_entity(wall).is_ok());
}

// ── Filtering ─────────────────────────────────────────────────────────────────

#[test]
fn unrelated_and_uncategorized_contacts_are_ignored() {
    let mut app = contact_app();
    let boat = spawn_boat(&mut app, Vec2::ZERO);
    app.update();

    let bottle = app
        .world_mut()
        .spawn((ContactCategory::Bottle, Bottle { note_id: 1 }, Transform::default()))
        .id();
    let rock = app.world_mut().spawn(Transform::default()).id();
    let plain = app.world_mut().spawn(Transform::default()).id();

    // Bottle touched by something that isn't the boat.
    collide(&mut app, started(rock, bottle));
    // Boat touches something without a category.
    collide(&mut app, started(boat, plain));

    assert!(app.world().get_entity(bottle).is_ok());
    assert_eq!(app.world().resource::<NoteInventory>().collected_count(), 0);
    assert_eq!(health(&app, boat).hp, BoatConfig::default().max_health);
}
