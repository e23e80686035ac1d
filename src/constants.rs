//! Centralised gameplay constants.
//!
//! Every tunable lives here so it can be found and changed in one place.
//! [`crate::config::BoatConfig::default`] mirrors these values; anything listed
//! in `assets/boat.toml` overrides them at startup.
//!
//! Movement values are expressed **per physics step** (see [`FIXED_HZ`]), not
//! per second: the boat model relaxes speed and heading once per fixed tick.

// ── Simulation clock ──────────────────────────────────────────────────────────

/// Physics steps per second.  Steering constants below assume this rate.
pub const FIXED_HZ: f64 = 50.0;

// ── Boat: Movement ────────────────────────────────────────────────────────────

/// Cruising speed (world units per second) reached while rowing normally.
pub const MAX_SPEED: f32 = 2.3;

/// Maximum heading change per physics step, in degrees.
///
/// Turning in place (no direction input, turn key held) uses half of this.
pub const TURN_RATE_DEG: f32 = 2.6;

/// Fraction of the remaining gap to the target speed closed each step.
///
/// 0.017 takes roughly 130 steps (2.6 s) to reach 90 % of cruise speed.
pub const ACCELERATION: f32 = 0.017;

/// Speed and acceleration multiplier while the fast-row input is held.
pub const FAST_ROW_MULTIPLIER: f32 = 1.6;

/// Relaxed speeds below this snap to exactly zero so the boat comes to rest.
pub const REST_SPEED_EPSILON: f32 = 1e-3;

/// Wall push-back offsets with a squared length below this snap to zero.
pub const OFFSET_EPSILON_SQ: f32 = 0.05;

/// Seconds after spawning during which steering input is ignored.
pub const STEER_LOCK_SECS: f32 = 3.0;

// ── Boat: Knockback ───────────────────────────────────────────────────────────

/// Initial speed of the bounce away from an enemy that hit the boat.
pub const BOUNCE_MAGNITUDE: f32 = 3.0;

/// Per-step multiplier applied to the bounce speed while invulnerable.
pub const BOUNCE_DECAY: f32 = 0.95;

// ── Boat: Health ──────────────────────────────────────────────────────────────

/// Hearts the boat starts with and can heal back up to.
pub const MAX_HEALTH: u32 = 3;

/// Invulnerability window after a non-fatal hit (seconds).
pub const INVULNERABLE_SECS: f32 = 1.5;

/// Invulnerability window after the killing hit; also the delay before the
/// level reloads.
pub const DEATH_SECS: f32 = 2.0;

/// Camera shake intensity applied when the boat is hit.
pub const HIT_SHAKE_INTENSITY: f32 = 5.0;

// ── Boat: Physics body ────────────────────────────────────────────────────────

/// Radius of the boat's ball collider (world units).
pub const BOAT_COLLIDER_RADIUS: f32 = 0.45;

/// World units to screen pixels.  The boat model works in small units.
pub const PIXELS_PER_UNIT: f32 = 48.0;

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Mean seconds between hull creaks while the boat is moving.
pub const AVG_CREAK_SECS: f32 = 4.0;

/// Creak interval jitter: each interval is drawn from `avg ± this`.
pub const CREAK_JITTER_SECS: f32 = 1.0;

/// Boat speed above which the hull creaks.
pub const CREAK_MIN_SPEED: f32 = 1.0;

pub const CREAK_VOLUME: f32 = 0.4;
pub const BOTTLE_PICKUP_VOLUME: f32 = 0.25;
pub const ENEMY_HIT_VOLUME: f32 = 0.4;

/// Debris impact volume at full boosted closing speed.
pub const DEBRIS_IMPACT_VOLUME: f32 = 0.6;

pub const NOTE_OPEN_VOLUME: f32 = 0.25;
pub const NOTE_CLOSE_VOLUME: f32 = 0.25;
pub const NOTE_NEXT_VOLUME: f32 = 0.3;
pub const NOTE_PREVIOUS_VOLUME: f32 = 0.4;

/// Music volume reached after the opening fade-in.
pub const MUSIC_VOLUME: f32 = 0.55;

/// Length of the music fade-in on level load (seconds).
pub const MUSIC_FADE_SECS: f32 = 3.0;

/// Volume of each active rain layer.
pub const RAIN_LAYER_VOLUME: f32 = 0.35;

// ── Weather ───────────────────────────────────────────────────────────────────

/// Number of rain intensity steps above dry.
pub const MAX_RAIN_LEVEL: u8 = 3;

// ── Notes / UI ────────────────────────────────────────────────────────────────

/// Pages in the note book; the cursor wraps over `1..=MAX_NOTES`.
pub const MAX_NOTES: u32 = 10;

/// How long the helper message stays on screen after a bottle pickup.
pub const HELPER_MESSAGE_SECS: f32 = 4.0;

/// Gamepad stick magnitude below which the boat receives no direction input.
pub const GAMEPAD_DEADZONE: f32 = 0.2;

/// Stick deflection treated as a page-turn press in the note book.
pub const GAMEPAD_PAGE_THRESHOLD: f32 = 0.8;

// ── Level flow ────────────────────────────────────────────────────────────────

/// Delay between touching the level end and the next level loading.
pub const LEVEL_END_SECS: f32 = 3.0;

/// Duration of the fade to black at the level end.
pub const LEVEL_FADE_SECS: f32 = 3.0;

/// Duration of the fade back in after a level loads.
pub const LEVEL_FADE_IN_SECS: f32 = 1.0;
