//! Player module: the boat entity, its input, movement, health, and contacts.
//!
//! ## Sub-module layout
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`state`] | Components (`Player`, `BoatMotion`, `PlayerHealth`, `SteerLock`, …), `RowIntent`, `PlayerDied` |
//! | [`control`] | Keyboard / gamepad → `RowIntent`, per-step steering → Rapier `Velocity`, creaks |
//! | [`health`] | Hits, healing, invulnerability countdown |
//! | [`contact`] | `ContactCategory` table, collision dispatch, per-category handlers |
//!
//! All public items used by other modules are re-exported here.

pub mod contact;
pub mod control;
pub mod health;
pub mod state;

pub use contact::{Bottle, ContactCategory, ContactPhase, ContactSet, PlayerContact};
pub use state::{
    BoatMotion, Player, PlayerDied, PlayerHealth, PreferredGamepad, RowAnimation, RowIntent,
    SteerLock, WallContacts,
};

use crate::config::BoatConfig;
use crate::constants::BOAT_COLLIDER_RADIUS;
use crate::state::GameState;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

/// Registers boat resources, messages, and systems.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RowIntent>()
            .init_resource::<PreferredGamepad>()
            .add_message::<PlayerContact>()
            .add_message::<PlayerDied>()
            .configure_sets(
                Update,
                (ContactSet::Dispatch, ContactSet::React, ContactSet::Consume).chain(),
            )
            .add_systems(
                Update,
                (
                    control::gamepad_connection_system,
                    (
                        control::player_intent_clear_system,
                        control::keyboard_to_intent_system,
                        control::gamepad_to_intent_system,
                    )
                        .chain(),
                    control::steer_lock_system,
                    health::invulnerability_system,
                    control::creak_system,
                )
                    .run_if(in_state(GameState::Boating)),
            )
            .add_systems(Update, control::row_animation_tint_system)
            .add_systems(
                Update,
                (
                    contact::collision_dispatch_system,
                    contact::wall_contact_system,
                )
                    .chain()
                    .in_set(ContactSet::Dispatch),
            )
            .add_systems(
                Update,
                (
                    contact::bottle_contact_system,
                    contact::enemy_contact_system,
                    contact::debris_contact_system,
                )
                    .in_set(ContactSet::React),
            )
            .add_systems(
                Update,
                contact::consume_contacts_system.in_set(ContactSet::Consume),
            )
            .add_systems(
                FixedUpdate,
                control::apply_row_intent_system.run_if(in_state(GameState::Boating)),
            );
    }
}

// ── Boat spawn ─────────────────────────────────────────────────────────────────

/// Spawn the boat at `position`, facing up, at rest, with steering locked.
///
/// The boat is a dynamic ball with rotation locked: heading is owned by the
/// steering model and written to the `Transform` every physics step.
pub fn spawn_player(commands: &mut Commands, position: Vec2, config: &BoatConfig) -> Entity {
    let (motion, health, lock, creak, anim) = state::initial_boat_state(config);
    let entity = commands
        .spawn((
            Player,
            (motion, health, lock, creak, anim, WallContacts::default()),
            // Physics
            (
                RigidBody::Dynamic,
                Collider::ball(BOAT_COLLIDER_RADIUS),
                Velocity::zero(),
                GravityScale(0.0),
                LockedAxes::ROTATION_LOCKED,
                Restitution::coefficient(0.2),
                ActiveEvents::COLLISION_EVENTS,
            ),
            // Transform / visibility
            Sprite::from_color(
                Color::srgb(0.55, 0.40, 0.25),
                Vec2::new(BOAT_COLLIDER_RADIUS * 1.4, BOAT_COLLIDER_RADIUS * 2.6),
            ),
            Transform::from_translation(position.extend(1.0)),
        ))
        .id();

    info!("Boat spawned at {position}");
    entity
}
