//! Game-specific error types.
//!
//! Loading and validation code returns these instead of panicking; the
//! startup systems log the error and keep the compiled defaults.
//!
//! ## Usage
//!
//! ```rust
//! use nightrow::error::{validate_unit_rate, GameResult};
//!
//! fn check(accel: f32) -> GameResult<()> {
//!     validate_unit_rate("acceleration", accel)?;
//!     Ok(())
//! }
//! # assert!(check(0.017).is_ok());
//! ```

use std::fmt;

/// Top-level error enum for the game.
#[derive(Debug)]
pub enum GameError {
    /// A config or data file exists but could not be read.
    ConfigRead {
        path: String,
        source: std::io::Error,
    },

    /// `assets/boat.toml` is not valid TOML or has mistyped keys.
    ConfigParse { path: String, message: String },

    /// `assets/notes.toml` is not valid TOML or has mistyped keys.
    NotesParse { path: String, message: String },

    /// A tuning constant is outside the range the boat model can handle.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::ConfigRead { path, source } => {
                write!(f, "failed to read '{}': {}", path, source)
            }
            GameError::ConfigParse { path, message } => {
                write!(f, "failed to parse boat config '{}': {}", path, message)
            }
            GameError::NotesParse { path, message } => {
                write!(f, "failed to parse notes '{}': {}", path, message)
            }
            GameError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::ConfigRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience alias: a `Result` using `GameError` as the error type.
pub type GameResult<T> = Result<T, GameError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Rejects relaxation rates outside `(0, 1]`.
///
/// A rate of 0 never moves; above 1 the `lerp` overshoots and oscillates.
pub fn validate_unit_rate(name: &'static str, value: f32) -> GameResult<()> {
    if !(value > 0.0 && value <= 1.0) {
        Err(GameError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, 1.0]",
        })
    } else {
        Ok(())
    }
}

/// Rejects per-step approach rates outside `(0, 1)`.
///
/// A rate of exactly 1 reaches the target in a single step, so the approach
/// is no longer gradual.
pub fn validate_step_rate(name: &'static str, value: f32) -> GameResult<()> {
    if !(value > 0.0 && value < 1.0) {
        Err(GameError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, 1.0)",
        })
    } else {
        Ok(())
    }
}

/// Rejects boost multipliers below 1; fast rowing must never be slower.
pub fn validate_boost_multiplier(value: f32) -> GameResult<()> {
    if !(value >= 1.0 && value.is_finite()) {
        Err(GameError::UnsafeConstant {
            name: "fast_row_multiplier",
            value,
            safe_range: "[1.0, ∞)",
        })
    } else {
        Ok(())
    }
}

/// Rejects values that must be strictly positive and finite.
pub fn validate_positive(name: &'static str, value: f32) -> GameResult<()> {
    if !(value > 0.0 && value.is_finite()) {
        Err(GameError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    } else {
        Ok(())
    }
}
