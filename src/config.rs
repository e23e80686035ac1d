//! Runtime boat configuration loaded from `assets/boat.toml`.
//!
//! [`BoatConfig`] is a Bevy [`Resource`] that mirrors the tunables in
//! [`crate::constants`].  At startup, [`load_boat_config`] reads
//! `assets/boat.toml` and overwrites the defaults with any values present in
//! the file.  Missing keys fall back to the compile-time defaults, so a minimal
//! TOML can override just the values you care about:
//!
//! ```toml
//! max_speed = 2.8
//! fast_row_multiplier = 1.4
//! ```
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `BoatConfig::default()`.

use crate::constants::*;
use crate::error::{
    validate_boost_multiplier, validate_positive, validate_step_rate, validate_unit_rate,
    GameError, GameResult,
};
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

pub const BOAT_CONFIG_PATH: &str = "assets/boat.toml";

/// Runtime-tunable boat and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.
#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoatConfig {
    // ── Movement ──────────────────────────────────────────────────────────────
    pub max_speed: f32,
    pub turn_rate_deg: f32,
    pub acceleration: f32,
    pub fast_row_multiplier: f32,
    pub rest_speed_epsilon: f32,
    pub offset_epsilon_sq: f32,
    pub steer_lock_secs: f32,

    // ── Knockback ─────────────────────────────────────────────────────────────
    pub bounce_magnitude: f32,
    pub bounce_decay: f32,

    // ── Health ────────────────────────────────────────────────────────────────
    pub max_health: u32,
    pub invulnerable_secs: f32,
    pub death_secs: f32,
    pub hit_shake_intensity: f32,

    // ── Audio ─────────────────────────────────────────────────────────────────
    pub avg_creak_secs: f32,
    pub creak_volume: f32,
    pub music_volume: f32,

    // ── Notes / UI ────────────────────────────────────────────────────────────
    pub max_notes: u32,
    pub helper_message_secs: f32,
    pub gamepad_deadzone: f32,

    // ── Level flow ────────────────────────────────────────────────────────────
    pub level_end_secs: f32,
}

impl Default for BoatConfig {
    fn default() -> Self {
        Self {
            // Movement
            max_speed: MAX_SPEED,
            turn_rate_deg: TURN_RATE_DEG,
            acceleration: ACCELERATION,
            fast_row_multiplier: FAST_ROW_MULTIPLIER,
            rest_speed_epsilon: REST_SPEED_EPSILON,
            offset_epsilon_sq: OFFSET_EPSILON_SQ,
            steer_lock_secs: STEER_LOCK_SECS,
            // Knockback
            bounce_magnitude: BOUNCE_MAGNITUDE,
            bounce_decay: BOUNCE_DECAY,
            // Health
            max_health: MAX_HEALTH,
            invulnerable_secs: INVULNERABLE_SECS,
            death_secs: DEATH_SECS,
            hit_shake_intensity: HIT_SHAKE_INTENSITY,
            // Audio
            avg_creak_secs: AVG_CREAK_SECS,
            creak_volume: CREAK_VOLUME,
            music_volume: MUSIC_VOLUME,
            // Notes / UI
            max_notes: MAX_NOTES,
            helper_message_secs: HELPER_MESSAGE_SECS,
            gamepad_deadzone: GAMEPAD_DEADZONE,
            // Level flow
            level_end_secs: LEVEL_END_SECS,
        }
    }
}

impl BoatConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(path: &str, contents: &str) -> GameResult<Self> {
        let config: BoatConfig = toml::from_str(contents).map_err(|e| GameError::ConfigParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse `path`.  `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> GameResult<Option<Self>> {
        let display = path.display().to_string();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(GameError::ConfigRead {
                    path: display,
                    source,
                })
            }
        };
        Self::from_toml_str(&display, &contents).map(Some)
    }

    /// Reject values the boat model cannot run with.
    pub fn validate(&self) -> GameResult<()> {
        validate_positive("max_speed", self.max_speed)?;
        validate_positive("turn_rate_deg", self.turn_rate_deg)?;
        validate_step_rate("acceleration", self.acceleration)?;
        validate_boost_multiplier(self.fast_row_multiplier)?;
        validate_step_rate(
            "acceleration * fast_row_multiplier",
            self.acceleration * self.fast_row_multiplier,
        )?;
        // Wall push-back decays at twice the rowing rate.
        validate_step_rate("acceleration * 2", self.acceleration * 2.0)?;
        validate_positive("rest_speed_epsilon", self.rest_speed_epsilon)?;
        validate_unit_rate("bounce_decay", self.bounce_decay)?;
        validate_positive("offset_epsilon_sq", self.offset_epsilon_sq)?;
        if self.max_health == 0 {
            return Err(GameError::UnsafeConstant {
                name: "max_health",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        if self.max_notes == 0 {
            return Err(GameError::UnsafeConstant {
                name: "max_notes",
                value: 0.0,
                safe_range: "[1, ∞)",
            });
        }
        Ok(())
    }

    /// Fastest speed the boat can ever reach (fast rowing, fully relaxed).
    #[inline]
    pub fn max_boosted_speed(&self) -> f32 {
        self.max_speed * self.fast_row_multiplier
    }
}

/// Startup system: attempt to load `assets/boat.toml` and overwrite the
/// `BoatConfig` resource with any values present in the file.
///
/// A missing file is not an error.  Read, parse, and validation errors are
/// logged and the compiled defaults stay in place.
pub fn load_boat_config(mut config: ResMut<BoatConfig>) {
    match BoatConfig::load(Path::new(BOAT_CONFIG_PATH)) {
        Ok(Some(loaded)) => {
            *config = loaded;
            info!("Loaded boat config from {BOAT_CONFIG_PATH}");
        }
        Ok(None) => {
            info!("No {BOAT_CONFIG_PATH} found; using compiled defaults");
        }
        Err(e) => {
            warn!("{e}; using defaults");
        }
    }
}
