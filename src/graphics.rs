//! Camera setup, follow, and shake.

use crate::constants::PIXELS_PER_UNIT;
use crate::player::Player;
use crate::timing::Countdown;
use bevy::prelude::*;
use rand::Rng;

/// Screen shake applied on top of the follow position.
///
/// Intensity is in screen pixels and fades linearly over the duration.
#[derive(Resource, Debug, Clone, Default)]
pub struct CameraShake {
    intensity: f32,
    duration: f32,
    countdown: Countdown,
}

impl CameraShake {
    /// Start (or restart) a shake.  A stronger running shake is not weakened.
    pub fn start(&mut self, intensity: f32, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        if self.countdown.is_running() && self.current_intensity() > intensity {
            return;
        }
        self.intensity = intensity;
        self.duration = duration;
        self.countdown.start(duration);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.countdown.is_running()
    }

    /// Intensity right now, fading to zero at the end of the shake.
    pub fn current_intensity(&self) -> f32 {
        if !self.countdown.is_running() || self.duration <= 0.0 {
            return 0.0;
        }
        self.intensity * (self.countdown.remaining() / self.duration)
    }

    pub fn tick(&mut self, dt: f32) {
        if self.countdown.tick(dt) {
            self.intensity = 0.0;
        }
    }
}

/// Spawn the 2D camera: one world unit is `PIXELS_PER_UNIT` screen pixels.
///
/// The camera also carries the spatial audio listener.
pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scale: 1.0 / PIXELS_PER_UNIT,
            ..OrthographicProjection::default_2d()
        }),
        SpatialListener::new(1.0),
    ));
    info!("Camera spawned");
}

/// Keep the camera centred on the boat, jittered by any running shake.
pub fn camera_follow_system(
    q_player: Query<&Transform, With<Player>>,
    mut q_camera: Query<&mut Transform, (With<Camera>, Without<Player>)>,
    mut shake: ResMut<CameraShake>,
    time: Res<Time>,
) {
    shake.tick(time.delta_secs());

    let Ok(player_transform) = q_player.single() else {
        return;
    };
    let Ok(mut cam) = q_camera.single_mut() else {
        return;
    };

    let mut jitter = Vec2::ZERO;
    let intensity = shake.current_intensity();
    if intensity > 0.0 {
        let mut rng = rand::thread_rng();
        // Intensity is authored in pixels.
        let amplitude = intensity / PIXELS_PER_UNIT;
        jitter = Vec2::new(
            rng.gen_range(-amplitude..=amplitude),
            rng.gen_range(-amplitude..=amplitude),
        );
    }

    cam.translation.x = player_transform.translation.x + jitter.x;
    cam.translation.y = player_transform.translation.y + jitter.y;
}

pub struct GraphicsPlugin;

impl Plugin for GraphicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraShake>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, camera_follow_system);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shake_fades_and_stops() {
        let mut shake = CameraShake::default();
        assert_eq!(shake.current_intensity(), 0.0);

        shake.start(5.0, 2.0);
        assert!(shake.is_active());
        assert!((shake.current_intensity() - 5.0).abs() < 1e-6);

        shake.tick(1.0);
        assert!((shake.current_intensity() - 2.5).abs() < 1e-6);

        shake.tick(1.5);
        assert!(!shake.is_active());
        assert_eq!(shake.current_intensity(), 0.0);
    }

    #[test]
    fn weaker_shake_does_not_override_stronger() {
        let mut shake = CameraShake::default();
        shake.start(5.0, 2.0);
        shake.start(1.0, 2.0);
        assert!((shake.current_intensity() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn zero_duration_is_ignored() {
        let mut shake = CameraShake::default();
        shake.start(5.0, 0.0);
        assert!(!shake.is_active());
    }

    #[test]
    fn camera_tracks_player() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<CameraShake>();
        app.add_systems(Update, camera_follow_system);

        app.world_mut()
            .spawn((Player, Transform::from_xyz(4.0, -7.0, 1.0)));
        let cam = app
            .world_mut()
            .spawn((Camera::default(), Transform::default()))
            .id();

        app.update();

        let t = app.world().get::<Transform>(cam).unwrap();
        assert_eq!(t.translation.x, 4.0);
        assert_eq!(t.translation.y, -7.0);
    }
}
