//! Explicit countdown timers advanced once per tick.
//!
//! Every "wait N seconds, then flip a flag" in the game is a [`Countdown`]
//! owned by the component or resource that cares about it.  Systems call
//! [`Countdown::tick`] with the frame delta and react on the tick that
//! reports completion.

/// A one-shot timer counting down to zero.
///
/// A fresh (or cleared) countdown is idle: ticking it does nothing and never
/// reports completion.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// A countdown already running with `secs` remaining.
    pub fn running(secs: f32) -> Self {
        let mut countdown = Self::default();
        countdown.start(secs);
        countdown
    }

    /// (Re)start with `secs` remaining.  Non-positive durations leave it idle.
    pub fn start(&mut self, secs: f32) {
        self.remaining = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
    }

    /// Stop without reporting completion.
    pub fn clear(&mut self) {
        self.remaining = 0.0;
    }

    /// Advance by `dt` seconds.  Returns `true` exactly once, on the tick that
    /// takes the remaining time to zero.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.remaining <= 0.0 {
            return false;
        }
        self.remaining -= dt.max(0.0);
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.remaining > 0.0
    }

    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once() {
        let mut c = Countdown::running(1.0);
        let fired: Vec<bool> = (0..6).map(|_| c.tick(0.25)).collect();
        assert_eq!(fired, vec![false, false, false, true, false, false]);
        assert!(!c.is_running());
    }

    #[test]
    fn idle_countdown_never_fires() {
        let mut c = Countdown::default();
        assert!(!c.tick(10.0));
        assert!(!c.is_running());
    }

    #[test]
    fn cleared_countdown_does_not_fire() {
        let mut c = Countdown::running(0.5);
        c.clear();
        assert!(!c.tick(1.0));
    }

    #[test]
    fn restart_extends_the_window() {
        let mut c = Countdown::running(0.5);
        assert!(!c.tick(0.4));
        c.start(1.0);
        assert!(!c.tick(0.5));
        assert!(c.tick(0.5));
    }

    #[test]
    fn negative_and_nan_durations_stay_idle() {
        assert!(!Countdown::running(-1.0).is_running());
        assert!(!Countdown::running(f32::NAN).is_running());
    }
}
