//! Steering and throttle model for the rowing boat.
//!
//! This module is pure arithmetic: no ECS, no physics.  Once per physics step
//! the controller hands [`Steering::step`] the latest input sample and gets
//! back the next heading and speed; the caller turns those into a velocity
//! with [`Steering::velocity`].
//!
//! ## Conventions
//!
//! - Heading is an angle in radians, `0` facing world `+Y`, counter-clockwise
//!   positive, always normalized into `(-π, π]`.  This matches
//!   `Quat::from_rotation_z(heading)` applied to a sprite drawn facing up.
//! - Speed is a scalar in `[0, max_speed * boost_multiplier]`.
//! - Every rate is per step, not per second.
//!
//! ## Step
//!
//! | Input | Heading | Speed |
//! |-------|---------|-------|
//! | direction, no boost | rotate toward direction by ≤ `turn_rate` | `lerp(speed, max, accel)` |
//! | direction + boost | same | `lerp(speed, max·mult, accel·mult)` |
//! | none | `± turn_rate / 2` if a turn input is held | `lerp(speed, 0, accel)`, snaps to 0 |

use crate::config::BoatConfig;
use bevy::math::Vec2;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

// ── Parameters & input ────────────────────────────────────────────────────────

/// Tunable constants consumed by [`Steering::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    /// Cruise speed reached while rowing normally.
    pub max_speed: f32,
    /// Maximum heading change per step (radians).
    pub turn_rate: f32,
    /// Fraction of the gap to the target speed closed per step.
    pub acceleration: f32,
    /// Target-speed and acceleration multiplier while boosting.
    pub boost_multiplier: f32,
    /// Idle speeds below this snap to zero.
    pub rest_speed_epsilon: f32,
    /// Offsets with a squared length below this snap to zero.
    pub offset_epsilon_sq: f32,
}

impl SteeringParams {
    pub fn from_config(config: &BoatConfig) -> Self {
        Self {
            max_speed: config.max_speed.max(0.0),
            turn_rate: config.turn_rate_deg.to_radians().max(0.0),
            acceleration: config.acceleration.clamp(0.0, 1.0),
            boost_multiplier: config.fast_row_multiplier.max(1.0),
            rest_speed_epsilon: config.rest_speed_epsilon.max(0.0),
            offset_epsilon_sq: config.offset_epsilon_sq.max(0.0),
        }
    }

    #[inline]
    pub fn max_boosted_speed(&self) -> f32 {
        self.max_speed * self.boost_multiplier
    }

    /// Per-step decay rate of the wall push-back offset, and the amount added
    /// per step while touching a wall.
    #[inline]
    pub fn offset_rate(&self) -> f32 {
        self.acceleration * 2.0
    }
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self::from_config(&BoatConfig::default())
    }
}

/// Secondary turn-in-place input, only honoured while the direction is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TurnInput {
    #[default]
    None,
    Left,
    Right,
}

/// One input sample, sanitized on construction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringInput {
    /// Raw axis sample, each component in `[-1, 1]`.
    pub direction: Vec2,
    pub boost: bool,
    pub turn: TurnInput,
}

impl SteeringInput {
    /// Clamp each axis into `[-1, 1]`; non-finite axes read as zero.
    pub fn new(direction: Vec2, boost: bool, turn: TurnInput) -> Self {
        Self {
            direction: Vec2::new(sanitize_axis(direction.x), sanitize_axis(direction.y)),
            boost,
            turn,
        }
    }
}

fn sanitize_axis(v: f32) -> f32 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// What the rower is doing this step; doubles as the animation parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RowState {
    #[default]
    Idle = 0,
    Rowing = 1,
    FastRowing = 2,
}

impl RowState {
    /// Integer value handed to the animation sink.
    #[inline]
    pub fn as_index(self) -> i32 {
        self as i32
    }
}

// ── Angle helpers ─────────────────────────────────────────────────────────────

/// Normalize an angle into `(-π, π]`.  Non-finite input maps to `0`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    let a = angle.rem_euclid(TAU);
    if a > PI {
        a - TAU
    } else {
        a
    }
}

/// Heading that faces along `direction`, or `None` for a zero vector.
///
/// The zero check runs before `atan2` so an idle stick never yields a heading.
pub fn heading_of(direction: Vec2) -> Option<f32> {
    if direction.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(wrap_angle(direction.y.atan2(direction.x) - FRAC_PI_2))
}

/// Unit vector pointing along `heading`.
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    Vec2::new(-heading.sin(), heading.cos())
}

/// Rotate `current` toward `target` by at most `max_step`, taking the short
/// way round.  Lands exactly on `target` when it is within one step.
pub fn rotate_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let max_step = max_step.max(0.0);
    let diff = wrap_angle(target - current);
    if diff.abs() <= max_step {
        wrap_angle(target)
    } else {
        wrap_angle(current + max_step * diff.signum())
    }
}

#[inline]
fn relax(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate.clamp(0.0, 1.0)
}

// ── Steering state ────────────────────────────────────────────────────────────

/// Heading and throttle of one boat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    heading: f32,
    speed: f32,
}

impl Steering {
    pub fn new(heading: f32, speed: f32) -> Self {
        Self {
            heading: wrap_angle(heading),
            speed: if speed.is_finite() { speed.max(0.0) } else { 0.0 },
        }
    }

    #[inline]
    pub fn heading(&self) -> f32 {
        self.heading
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Unit vector the boat is facing.
    #[inline]
    pub fn forward(&self) -> Vec2 {
        heading_vector(self.heading)
    }

    /// Drop the throttle to zero immediately (used when the boat is hit).
    pub fn halt(&mut self) {
        self.speed = 0.0;
    }

    /// Advance one physics step.
    pub fn step(&mut self, input: &SteeringInput, params: &SteeringParams) -> RowState {
        let state = match heading_of(input.direction) {
            Some(target) => {
                self.heading = rotate_towards(self.heading, target, params.turn_rate);
                if input.boost {
                    self.speed = relax(
                        self.speed,
                        params.max_boosted_speed(),
                        params.acceleration * params.boost_multiplier,
                    );
                    RowState::FastRowing
                } else {
                    self.speed = relax(self.speed, params.max_speed, params.acceleration);
                    RowState::Rowing
                }
            }
            None => {
                self.speed = relax(self.speed, 0.0, params.acceleration);
                if self.speed < params.rest_speed_epsilon {
                    self.speed = 0.0;
                }
                let nudge = params.turn_rate * 0.5;
                match input.turn {
                    TurnInput::Left => self.heading = wrap_angle(self.heading + nudge),
                    TurnInput::Right => self.heading = wrap_angle(self.heading - nudge),
                    TurnInput::None => {}
                }
                RowState::Idle
            }
        };
        self.speed = self.speed.clamp(0.0, params.max_boosted_speed());
        state
    }

    /// Final velocity: forward at the current speed plus the external offset.
    #[inline]
    pub fn velocity(&self, offset: &DecayingOffset) -> Vec2 {
        self.forward() * self.speed + offset.value()
    }
}

// ── External displacement terms ───────────────────────────────────────────────

/// Externally imposed displacement (wall push-back) that relaxes to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecayingOffset(Vec2);

impl DecayingOffset {
    pub fn new(value: Vec2) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> Vec2 {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == Vec2::ZERO
    }

    /// Add `direction * amount` (no normalization of `direction`).
    pub fn push(&mut self, direction: Vec2, amount: f32) {
        self.0 += direction * amount;
    }

    /// Shrink by `rate` of the current value; snap to zero once the squared
    /// length drops below `epsilon_sq`.
    pub fn relax(&mut self, rate: f32, epsilon_sq: f32) {
        if self.is_zero() {
            return;
        }
        self.0 -= self.0 * rate.clamp(0.0, 1.0);
        if self.0.length_squared() < epsilon_sq {
            self.0 = Vec2::ZERO;
        }
    }
}

/// Bounce away from a hit; replaces steering while the boat is invulnerable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Knockback {
    direction: Vec2,
    magnitude: f32,
}

impl Knockback {
    /// Begin bouncing along `direction` (normalized here) at `magnitude`.
    pub fn start(&mut self, direction: Vec2, magnitude: f32) {
        self.direction = direction.normalize_or_zero();
        self.magnitude = magnitude.max(0.0);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[inline]
    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Velocity for this step, then decay the magnitude by `decay`.
    pub fn step(&mut self, decay: f32) -> Vec2 {
        let velocity = self.direction * self.magnitude;
        self.magnitude *= decay.clamp(0.0, 1.0);
        velocity
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SteeringParams {
        SteeringParams {
            max_speed: 2.3,
            turn_rate: 2.6_f32.to_radians(),
            acceleration: 0.017,
            boost_multiplier: 1.6,
            rest_speed_epsilon: 1e-3,
            offset_epsilon_sq: 0.05,
        }
    }

    fn row(x: f32, y: f32) -> SteeringInput {
        SteeringInput::new(Vec2::new(x, y), false, TurnInput::None)
    }

    fn sample_inputs() -> Vec<SteeringInput> {
        let axes = [-1.0, -0.5, 0.0, 0.3, 1.0];
        let mut inputs = Vec::new();
        for &x in &axes {
            for &y in &axes {
                for boost in [false, true] {
                    for turn in [TurnInput::None, TurnInput::Left, TurnInput::Right] {
                        inputs.push(SteeringInput::new(Vec2::new(x, y), boost, turn));
                    }
                }
            }
        }
        inputs
    }

    // ── worked examples ───────────────────────────────────────────────────────

    #[test]
    fn first_step_from_rest_facing_up() {
        let p = params();
        let mut s = Steering::default();
        let state = s.step(&row(0.0, 1.0), &p);

        assert_eq!(state, RowState::Rowing);
        assert!(s.heading().abs() < 1e-6, "heading {}", s.heading());
        let expected = 2.3 * 0.017;
        assert!(
            (s.speed() - expected).abs() < 1e-6,
            "expected speed {expected}, got {}",
            s.speed()
        );
    }

    #[test]
    fn boosted_speed_caps_at_multiplied_max() {
        let p = params();
        let mut s = Steering::default();
        let boost = SteeringInput::new(Vec2::Y, true, TurnInput::None);
        for _ in 0..5000 {
            assert_eq!(s.step(&boost, &p), RowState::FastRowing);
            assert!(s.speed() <= p.max_boosted_speed() + 1e-6);
        }
        assert!((s.speed() - 2.3 * 1.6).abs() < 1e-3, "speed {}", s.speed());
    }

    #[test]
    fn small_offset_snaps_to_zero() {
        let mut offset = DecayingOffset::new(Vec2::new(0.2, 0.0));
        offset.relax(2.0 * 0.017, 0.05);
        assert!(offset.is_zero());
    }

    #[test]
    fn offset_decays_geometrically_until_snap() {
        let p = params();
        let mut offset = DecayingOffset::new(Vec2::new(1.0, 0.0));
        let factor = 1.0 - p.offset_rate();
        let mut expected = 1.0_f32;
        let mut steps = 0;
        while !offset.is_zero() {
            offset.relax(p.offset_rate(), p.offset_epsilon_sq);
            expected *= factor;
            steps += 1;
            if !offset.is_zero() {
                assert!((offset.value().x - expected).abs() < 1e-5);
            }
            assert!(steps < 100, "offset never reached zero");
        }
        assert!(expected * expected < p.offset_epsilon_sq);
    }

    // ── properties ────────────────────────────────────────────────────────────

    #[test]
    fn speed_stays_within_bounds_for_all_inputs() {
        let p = params();
        for start in [0.0, 1.0, 2.3, 3.68] {
            for input in sample_inputs() {
                let mut s = Steering::new(0.7, start);
                for _ in 0..50 {
                    s.step(&input, &p);
                    assert!(s.speed() >= 0.0);
                    assert!(s.speed() <= p.max_boosted_speed() + 1e-6);
                }
            }
        }
    }

    #[test]
    fn idle_speed_decreases_monotonically_to_exact_zero() {
        let p = params();
        let mut s = Steering::new(0.0, p.max_boosted_speed());
        let mut previous = s.speed();
        let mut steps = 0;
        while s.speed() > 0.0 {
            s.step(&row(0.0, 0.0), &p);
            assert!(s.speed() < previous, "speed did not decrease");
            previous = s.speed();
            steps += 1;
            assert!(steps < 1000, "speed never reached zero");
        }
        assert_eq!(s.speed(), 0.0);
    }

    #[test]
    fn heading_change_is_bounded_and_never_overshoots() {
        let p = params();
        for input in sample_inputs() {
            let Some(target) = heading_of(input.direction) else {
                continue;
            };
            let mut s = Steering::new(2.0, 0.0);
            for _ in 0..200 {
                let before = s.heading();
                let before_gap = wrap_angle(target - before).abs();
                s.step(&input, &p);
                let turned = wrap_angle(s.heading() - before).abs();
                assert!(turned <= p.turn_rate + 1e-5, "turned {turned}");
                let after_gap = wrap_angle(target - s.heading()).abs();
                assert!(after_gap <= before_gap + 1e-5, "overshot target");
            }
            assert!(wrap_angle(target - s.heading()).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_input_never_produces_nan() {
        let p = params();
        let mut s = Steering::new(1.0, 1.0);
        s.step(&row(0.0, 0.0), &p);
        assert!(s.heading().is_finite());
        assert_eq!(heading_of(Vec2::ZERO), None);
    }

    #[test]
    fn out_of_range_input_is_clamped() {
        let input = SteeringInput::new(Vec2::new(5.0, f32::NAN), false, TurnInput::None);
        assert_eq!(input.direction, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn turn_in_place_uses_half_rate_only_when_idle() {
        let p = params();
        let mut s = Steering::default();
        s.step(&SteeringInput::new(Vec2::ZERO, false, TurnInput::Left), &p);
        assert!((s.heading() - p.turn_rate * 0.5).abs() < 1e-6);
        s.step(&SteeringInput::new(Vec2::ZERO, false, TurnInput::Right), &p);
        s.step(&SteeringInput::new(Vec2::ZERO, false, TurnInput::Right), &p);
        assert!((s.heading() + p.turn_rate * 0.5).abs() < 1e-6);

        // Direction input wins over the turn key.
        let mut s = Steering::default();
        s.step(&SteeringInput::new(Vec2::Y, false, TurnInput::Left), &p);
        assert!(s.heading().abs() < 1e-6);
    }

    #[test]
    fn rotate_towards_takes_short_way_across_pi() {
        let step = 0.1;
        let next = rotate_towards(PI - 0.05, -PI + 0.05, step);
        // Shortest path crosses ±π: the gap is 0.1, so it lands on the target.
        assert!((next - (-PI + 0.05)).abs() < 1e-5, "got {next}");
    }

    #[test]
    fn heading_matches_input_direction() {
        assert!((heading_of(Vec2::Y).unwrap()).abs() < 1e-6);
        assert!((heading_of(Vec2::NEG_X).unwrap() - FRAC_PI_2).abs() < 1e-6);
        assert!((heading_of(Vec2::X).unwrap() + FRAC_PI_2).abs() < 1e-6);
        let v = heading_vector(heading_of(Vec2::new(1.0, 1.0)).unwrap());
        assert!((v - Vec2::new(1.0, 1.0).normalize()).length() < 1e-5);
    }

    #[test]
    fn velocity_sums_forward_and_offset() {
        let s = Steering::new(0.0, 2.0);
        let offset = DecayingOffset::new(Vec2::new(0.5, 0.0));
        let v = s.velocity(&offset);
        assert!((v - Vec2::new(0.5, 2.0)).length() < 1e-5);
    }

    #[test]
    fn knockback_decays_by_factor() {
        let mut k = Knockback::default();
        k.start(Vec2::new(0.0, -4.0), 3.0);
        let v1 = k.step(0.95);
        let v2 = k.step(0.95);
        assert!((v1 - Vec2::new(0.0, -3.0)).length() < 1e-6);
        assert!((v2.length() - 3.0 * 0.95).abs() < 1e-5);
    }
}
