//! Hits, healing, and the invulnerability window.
//!
//! A hit costs one heart, zeroes the throttle, starts a knockback away from
//! the attacker, and opens an invulnerability window during which steering is
//! replaced by the knockback.  The killing hit uses the longer
//! `death_secs` window; the level reloads when it ends (see `crate::level`).

use super::state::{BoatMotion, Player, PlayerHealth};
use crate::config::BoatConfig;
use bevy::prelude::*;

/// Result of [`apply_hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Already invulnerable; nothing changed.
    Ignored,
    /// Lost a heart, still afloat.
    Hurt,
    /// Lost the last heart.
    Died,
}

/// Apply one hit arriving from `away`'s opposite direction.
///
/// `away` points from the attacker toward the boat; the knockback follows it.
pub fn apply_hit(
    health: &mut PlayerHealth,
    motion: &mut BoatMotion,
    away: Vec2,
    config: &BoatConfig,
) -> HitOutcome {
    if health.is_invulnerable() || health.is_dead() {
        return HitOutcome::Ignored;
    }

    health.hp = health.hp.saturating_sub(1);
    motion.steering.halt();
    motion.knockback.start(away, config.bounce_magnitude);

    if health.hp == 0 {
        health.invulnerable.start(config.death_secs);
        HitOutcome::Died
    } else {
        health.invulnerable.start(config.invulnerable_secs);
        HitOutcome::Hurt
    }
}

/// Restore one heart, up to the maximum.  Returns whether anything changed.
pub fn heal(health: &mut PlayerHealth) -> bool {
    if health.is_dead() || health.hp >= health.max_hp {
        return false;
    }
    health.hp += 1;
    true
}

/// Count down the invulnerability window; steering resumes when it ends.
pub fn invulnerability_system(
    mut q: Query<(&mut PlayerHealth, &mut BoatMotion), With<Player>>,
    time: Res<Time>,
) {
    let dt = time.delta_secs();
    for (mut health, mut motion) in q.iter_mut() {
        if health.invulnerable.tick(dt) {
            motion.knockback.clear();
            debug!("Boat invulnerability ended ({} hp)", health.hp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hurt_boat() -> (PlayerHealth, BoatMotion, BoatConfig) {
        let config = BoatConfig::default();
        (PlayerHealth::new(3), BoatMotion::default(), config)
    }

    #[test]
    fn hit_costs_one_heart_and_grants_invulnerability() {
        let (mut health, mut motion, config) = hurt_boat();
        let outcome = apply_hit(&mut health, &mut motion, Vec2::NEG_Y, &config);
        assert_eq!(outcome, HitOutcome::Hurt);
        assert_eq!(health.hp, 2);
        assert!(health.is_invulnerable());
        assert!((health.invulnerable.remaining() - config.invulnerable_secs).abs() < 1e-6);
        assert!((motion.knockback.magnitude() - config.bounce_magnitude).abs() < 1e-6);
    }

    #[test]
    fn second_hit_while_invulnerable_is_ignored() {
        let (mut health, mut motion, config) = hurt_boat();
        apply_hit(&mut health, &mut motion, Vec2::X, &config);
        let outcome = apply_hit(&mut health, &mut motion, Vec2::X, &config);
        assert_eq!(outcome, HitOutcome::Ignored);
        assert_eq!(health.hp, 2);
    }

    #[test]
    fn last_heart_dies_with_longer_window() {
        let (mut health, mut motion, config) = hurt_boat();
        health.hp = 1;
        let outcome = apply_hit(&mut health, &mut motion, Vec2::X, &config);
        assert_eq!(outcome, HitOutcome::Died);
        assert!(health.is_dead());
        assert!((health.invulnerable.remaining() - config.death_secs).abs() < 1e-6);
    }

    #[test]
    fn heal_is_capped_at_max() {
        let (mut health, _, _) = hurt_boat();
        assert!(!heal(&mut health));
        health.hp = 1;
        assert!(heal(&mut health));
        assert!(heal(&mut health));
        assert!(!heal(&mut health));
        assert_eq!(health.hp, 3);
    }

    #[test]
    fn dead_boat_cannot_heal() {
        let (mut health, _, _) = hurt_boat();
        health.hp = 0;
        assert!(!heal(&mut health));
    }

    #[test]
    fn invulnerability_expires_through_system() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_systems(Update, invulnerability_system);

        let (mut health, mut motion, config) = hurt_boat();
        apply_hit(&mut health, &mut motion, Vec2::X, &config);
        health.invulnerable.start(1e-6);
        let boat = app.world_mut().spawn((Player, health, motion)).id();

        // Make sure some time passes between the frames.
        app.update();
        std::thread::sleep(std::time::Duration::from_millis(5));
        app.update();

        let health = app.world().get::<PlayerHealth>(boat).unwrap();
        assert!(!health.is_invulnerable());
        let motion = app.world().get::<BoatMotion>(boat).unwrap();
        assert_eq!(motion.knockback.magnitude(), 0.0);
    }
}
