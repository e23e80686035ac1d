//! Boat input and movement systems.
//!
//! ## Pipeline
//!
//! `Update` (once per render frame):
//! 1. [`player_intent_clear_system`] — resets `RowIntent`.
//! 2. [`keyboard_to_intent_system`] — WASD / arrows, Shift, Q/E into `RowIntent`.
//! 3. [`gamepad_to_intent_system`] — left stick, South / R2, L1 / R1 into `RowIntent`.
//!
//! `FixedUpdate` (once per physics step, before Rapier):
//! 4. [`apply_row_intent_system`] — runs the steering model and writes the
//!    Rapier `Velocity` and the boat's rotation.
//!
//! Input is dropped while the boat's [`SteerLock`] is running or the boat is
//! sinking.  Tests populate `RowIntent` directly and run only step 4.

use super::contact::{wall_push_direction, ContactCategory};
use super::state::{
    BoatMotion, CreakTimer, PlayerHealth, PreferredGamepad, RowAnimation, RowIntent, SteerLock,
    WallContacts,
};
use super::Player;
use crate::audio::{Cue, SfxRequest};
use crate::config::BoatConfig;
use crate::constants::{CREAK_JITTER_SECS, CREAK_MIN_SPEED};
use crate::steering::{RowState, SteeringParams, TurnInput};
use bevy::input::gamepad::{GamepadAxis, GamepadButton, GamepadConnection, GamepadConnectionEvent};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::Rng;

// ── Step 1: Clear ─────────────────────────────────────────────────────────────

pub fn player_intent_clear_system(mut intent: ResMut<RowIntent>) {
    *intent = RowIntent::default();
}

/// Whether the boat currently accepts input.
fn accepts_input(q: &Query<(&SteerLock, &PlayerHealth), With<Player>>) -> bool {
    match q.single() {
        Ok((lock, health)) => !lock.0.is_running() && !health.is_dead(),
        Err(_) => false,
    }
}

/// Raw axis from a negative/positive key pair: `-1`, `0`, or `1`.
fn key_axis(keys: &ButtonInput<KeyCode>, negative: [KeyCode; 2], positive: [KeyCode; 2]) -> f32 {
    let neg = keys.any_pressed(negative);
    let pos = keys.any_pressed(positive);
    (pos as i32 - neg as i32) as f32
}

// ── Step 2a: Keyboard → Intent ────────────────────────────────────────────────

/// Translate keys into [`RowIntent`].
///
/// - **WASD / arrows** → `direction`
/// - **Shift** → `boost`
/// - **Q / E** → turn in place left / right
pub fn keyboard_to_intent_system(
    keys: Res<ButtonInput<KeyCode>>,
    q_boat: Query<(&SteerLock, &PlayerHealth), With<Player>>,
    mut intent: ResMut<RowIntent>,
) {
    if !accepts_input(&q_boat) {
        return;
    }

    let x = key_axis(
        &keys,
        [KeyCode::KeyA, KeyCode::ArrowLeft],
        [KeyCode::KeyD, KeyCode::ArrowRight],
    );
    let y = key_axis(
        &keys,
        [KeyCode::KeyS, KeyCode::ArrowDown],
        [KeyCode::KeyW, KeyCode::ArrowUp],
    );
    if x != 0.0 || y != 0.0 {
        intent.direction = Vec2::new(x, y);
    }

    if keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]) {
        intent.boost = true;
    }

    if keys.pressed(KeyCode::KeyQ) {
        intent.turn = TurnInput::Left;
    } else if keys.pressed(KeyCode::KeyE) {
        intent.turn = TurnInput::Right;
    }
}

// ── Step 2b: Gamepad connection ────────────────────────────────────────────────

/// Track gamepad connect / disconnect events and update [`PreferredGamepad`].
///
/// The most recently connected gamepad always wins.
pub fn gamepad_connection_system(
    mut events: MessageReader<GamepadConnectionEvent>,
    mut preferred: ResMut<PreferredGamepad>,
) {
    for event in events.read() {
        match &event.connection {
            GamepadConnection::Connected { .. } => {
                preferred.0 = Some(event.gamepad);
                info!("[gamepad] {:?} connected (now preferred)", event.gamepad);
            }
            GamepadConnection::Disconnected => {
                info!("[gamepad] {:?} disconnected", event.gamepad);
                if preferred.0 == Some(event.gamepad) {
                    preferred.0 = None;
                }
            }
        }
    }
}

// ── Step 2c: Gamepad → Intent ─────────────────────────────────────────────────

/// Translate the preferred gamepad into [`RowIntent`].
///
/// Left stick past the deadzone sets `direction`; South or R2 rows fast;
/// L1 / R1 turn in place.  Does nothing without a connected gamepad.
pub fn gamepad_to_intent_system(
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    q_boat: Query<(&SteerLock, &PlayerHealth), With<Player>>,
    mut intent: ResMut<RowIntent>,
    config: Res<BoatConfig>,
) {
    if !accepts_input(&q_boat) {
        return;
    }
    let Some(gamepad_entity) = preferred.0 else {
        return;
    };
    let Ok(gamepad) = gamepads.get(gamepad_entity) else {
        return;
    };

    let stick = Vec2::new(
        gamepad.get(GamepadAxis::LeftStickX).unwrap_or(0.0),
        gamepad.get(GamepadAxis::LeftStickY).unwrap_or(0.0),
    );
    if stick.length() >= config.gamepad_deadzone {
        intent.direction = stick;
    }

    if gamepad.pressed(GamepadButton::South) || gamepad.pressed(GamepadButton::RightTrigger2) {
        intent.boost = true;
    }

    if gamepad.pressed(GamepadButton::LeftTrigger) {
        intent.turn = TurnInput::Left;
    } else if gamepad.pressed(GamepadButton::RightTrigger) {
        intent.turn = TurnInput::Right;
    }
}

/// Count down the opening steer lock.
pub fn steer_lock_system(mut q: Query<&mut SteerLock, With<Player>>, time: Res<Time>) {
    for mut lock in q.iter_mut() {
        if lock.0.tick(time.delta_secs()) {
            info!("Steering unlocked");
        }
    }
}

// ── Step 4: Apply intent → physics ───────────────────────────────────────────

/// Advance the boat by one physics step.
///
/// | Boat state      | Velocity written                                   |
/// |-----------------|----------------------------------------------------|
/// | invulnerable    | knockback only; steering suspended, offset relaxes |
/// | otherwise       | `forward * speed + wall offset`                    |
///
/// Each overlapped push-back wall adds `2 * acceleration` away from itself;
/// the offset only relaxes while no wall is touched.
pub fn apply_row_intent_system(
    mut q: Query<
        (
            &mut Transform,
            &mut Velocity,
            &mut BoatMotion,
            &mut RowAnimation,
            &PlayerHealth,
            &WallContacts,
        ),
        With<Player>,
    >,
    walls: Query<(&Transform, &ContactCategory), Without<Player>>,
    intent: Res<RowIntent>,
    config: Res<BoatConfig>,
) {
    let Ok((mut transform, mut velocity, mut motion, mut anim, health, contacts)) = q.single_mut()
    else {
        return;
    };

    velocity.angvel = 0.0;
    let params = SteeringParams::from_config(&config);

    if health.is_invulnerable() {
        // Walls do not push a bouncing boat, but an old push keeps fading.
        motion
            .offset
            .relax(params.offset_rate(), params.offset_epsilon_sq);
        motion.commanded = motion.knockback.step(config.bounce_decay);
        velocity.linvel = motion.commanded;
        anim.set_if_neq(RowAnimation(RowState::Idle));
        return;
    }

    let state = motion.steering.step(&intent.to_input(), &params);
    anim.set_if_neq(RowAnimation(state));

    let boat_pos = transform.translation.truncate();
    for &wall in &contacts.0 {
        if let Ok((wall_transform, category)) = walls.get(wall) {
            let dir = wall_push_direction(*category, wall_transform.translation.truncate(), boat_pos);
            motion.offset.push(dir, params.offset_rate());
        }
    }
    if !contacts.is_touching() {
        motion
            .offset
            .relax(params.offset_rate(), params.offset_epsilon_sq);
    }

    motion.commanded = motion.steering.velocity(&motion.offset);
    velocity.linvel = motion.commanded;
    transform.rotation = Quat::from_rotation_z(motion.steering.heading());
}

// ── Feedback ──────────────────────────────────────────────────────────────────

/// Tint the boat by row state; fade it while invulnerable.
pub fn row_animation_tint_system(
    mut q: Query<(&RowAnimation, &PlayerHealth, &mut Sprite), With<Player>>,
) {
    for (anim, health, mut sprite) in q.iter_mut() {
        let base = match anim.0 {
            RowState::Idle => Color::srgb(0.55, 0.40, 0.25),
            RowState::Rowing => Color::srgb(0.65, 0.48, 0.28),
            RowState::FastRowing => Color::srgb(0.80, 0.60, 0.32),
        };
        let alpha = if health.is_invulnerable() { 0.5 } else { 1.0 };
        sprite.color = base.with_alpha(alpha);
    }
}

/// Creak the hull at jittered intervals while the boat moves faster than
/// `CREAK_MIN_SPEED`.
pub fn creak_system(
    mut q: Query<(&Transform, &Velocity, &mut CreakTimer), With<Player>>,
    mut sfx: MessageWriter<SfxRequest>,
    time: Res<Time>,
    config: Res<BoatConfig>,
) {
    let mut rng = rand::thread_rng();
    for (transform, velocity, mut creak) in q.iter_mut() {
        if velocity.linvel.length() <= CREAK_MIN_SPEED {
            continue;
        }
        if creak.0.tick(time.delta_secs()) {
            sfx.write(SfxRequest::new(
                Cue::BoatCreak,
                transform.translation.truncate(),
                config.creak_volume,
            ));
            let low = (config.avg_creak_secs - CREAK_JITTER_SECS).max(0.1);
            let high = (config.avg_creak_secs + CREAK_JITTER_SECS).max(low + 0.1);
            creak.0.start(rng.gen_range(low..high));
        }
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
