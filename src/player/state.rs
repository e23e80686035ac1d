//! Boat components, resources, and messages.
//!
//! All ECS types that describe the player's boat live here.  Systems that
//! mutate this state are in the sibling modules:
//! - [`super::control`] — input sampling + per-step movement
//! - [`super::health`] — hits, healing, invulnerability
//! - [`super::contact`] — collision category dispatch

use crate::config::BoatConfig;
use crate::steering::{DecayingOffset, Knockback, RowState, Steering, SteeringInput, TurnInput};
use crate::timing::Countdown;
use bevy::prelude::*;

// ── Components ─────────────────────────────────────────────────────────────────

/// Marker component for the player's boat entity.
#[derive(Component)]
pub struct Player;

/// Everything the per-step movement update reads and writes.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct BoatMotion {
    pub steering: Steering,
    /// Wall push-back, added on top of the rowing velocity.
    pub offset: DecayingOffset,
    /// Bounce away from the last enemy hit; used while invulnerable.
    pub knockback: Knockback,
    /// Velocity written on the last physics step, before the solver
    /// resolves any contact.
    pub commanded: Vec2,
}

/// Animation parameter for the rower and the boat light.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowAnimation(pub RowState);

/// Hearts plus the invulnerability window after a hit.
#[derive(Component, Debug, Clone)]
pub struct PlayerHealth {
    pub hp: u32,
    pub max_hp: u32,
    pub invulnerable: Countdown,
}

impl PlayerHealth {
    pub fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            invulnerable: Countdown::default(),
        }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable.is_running()
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp == 0
    }
}

impl Default for PlayerHealth {
    fn default() -> Self {
        Self::new(crate::constants::MAX_HEALTH)
    }
}

/// Input is ignored until this runs out (opening seconds of each level).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SteerLock(pub Countdown);

/// Time until the hull creaks again while moving.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct CreakTimer(pub Countdown);

/// Push-back walls the boat is currently overlapping.
#[derive(Component, Debug, Clone, Default)]
pub struct WallContacts(pub Vec<Entity>);

impl WallContacts {
    pub fn add(&mut self, wall: Entity) {
        if !self.0.contains(&wall) {
            self.0.push(wall);
        }
    }

    pub fn remove(&mut self, wall: Entity) {
        self.0.retain(|&w| w != wall);
    }

    #[inline]
    pub fn is_touching(&self) -> bool {
        !self.0.is_empty()
    }
}

// ── Resources ──────────────────────────────────────────────────────────────────

/// Aggregated rowing intent for the current frame, from all input sources.
///
/// Written in `Update` (once per render frame), consumed in `FixedUpdate`
/// (once per physics step).  Tests populate it directly to drive the boat
/// without an input device.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq)]
pub struct RowIntent {
    /// Raw direction sample, each axis in `[-1, 1]`.
    pub direction: Vec2,
    /// Fast-row held.
    pub boost: bool,
    /// Turn-in-place key held (only used while `direction` is zero).
    pub turn: TurnInput,
}

impl RowIntent {
    #[inline]
    pub fn to_input(self) -> SteeringInput {
        SteeringInput::new(self.direction, self.boost, self.turn)
    }
}

/// Tracks the most recently connected gamepad so stray HID devices don't
/// steal input.  Cleared when that gamepad disconnects.
#[derive(Resource, Default)]
pub struct PreferredGamepad(pub Option<Entity>);

// ── Messages ───────────────────────────────────────────────────────────────────

/// The boat lost its last heart.
#[derive(Message, Debug, Clone, Copy)]
pub struct PlayerDied {
    pub position: Vec2,
}

// ── Spawn helpers ──────────────────────────────────────────────────────────────

/// Freshly spawned boat state for `config`, facing up at rest.
pub fn initial_boat_state(
    config: &BoatConfig,
) -> (BoatMotion, PlayerHealth, SteerLock, CreakTimer, RowAnimation) {
    (
        BoatMotion::default(),
        PlayerHealth::new(config.max_health),
        SteerLock(Countdown::running(config.steer_lock_secs)),
        CreakTimer(Countdown::running(config.avg_creak_secs)),
        RowAnimation::default(),
    )
}
