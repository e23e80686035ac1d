//! Sound effects, music, and rain ambience on top of Bevy audio.
//!
//! Gameplay code never touches `AudioPlayer` directly: it writes an
//! [`SfxRequest`] naming a [`Cue`], and [`play_sfx_system`] turns each request
//! into a one-shot entity that despawns when the clip ends.
//!
//! ## Entities owned here
//!
//! | Entity            | Lifetime                  | Marker          |
//! |-------------------|---------------------------|-----------------|
//! | one-shot effect   | until the clip finishes   | `Pausable` if spatial |
//! | level music       | one level                 | [`Music`]       |
//! | rain layer × 3    | whole session, looping    | [`RainLayer`]   |

use crate::config::BoatConfig;
use crate::constants::{MAX_RAIN_LEVEL, MUSIC_FADE_SECS, RAIN_LAYER_VOLUME};
use crate::level::{LevelLoaded, Weather, LEVEL_COUNT};
use crate::state::GameState;
use bevy::audio::{AudioSinkPlayback, Volume};
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Number of variants shipped for cues that pick a random clip.
const CREAK_VARIANTS: usize = 3;
const DEBRIS_VARIANTS: usize = 3;
/// Dialogue barks shipped as `sounds/bark_<n>.ogg`.
pub const BARK_COUNT: u32 = 4;

/// Asset path of the music track for the level at `index`.
pub fn music_path(index: usize) -> String {
    format!("music/level_{}.ogg", index + 1)
}

// ── Cues & requests ───────────────────────────────────────────────────────────

/// A named sound.  Some cues have several clips and pick one at random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    BottlePickup,
    BoatCreak,
    HitEnemy,
    HitHardDebris,
    OpenNotes,
    CloseNotes,
    NextNote,
    PreviousNote,
    PlayerDeath,
    /// Spoken line attached to a dialogue trigger.
    Bark(u32),
}

/// Ask for a one-shot sound.
///
/// `position: None` plays the clip flat (menu / notebook sounds); otherwise
/// it is spatialised relative to the camera's listener.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SfxRequest {
    pub cue: Cue,
    pub position: Option<Vec2>,
    pub volume: f32,
}

impl SfxRequest {
    /// A sound coming from somewhere on the river.
    pub fn new(cue: Cue, position: Vec2, volume: f32) -> Self {
        Self {
            cue,
            position: Some(position),
            volume,
        }
    }

    /// A flat interface sound.
    pub fn ui(cue: Cue, volume: f32) -> Self {
        Self {
            cue,
            position: None,
            volume,
        }
    }
}

/// Sinks that stop while the river is frozen (notes, dialogue, pause).
#[derive(Component)]
pub struct Pausable;

/// The current level's music track.
#[derive(Component)]
pub struct Music;

/// One of the looping rain sources; the index is the rain level (1..=3) at
/// which this layer becomes audible.
#[derive(Component, Debug, Clone, Copy)]
pub struct RainLayer(pub u8);

// ── Sound bank ────────────────────────────────────────────────────────────────

/// Clip handles for every cue, plus music and rain.
#[derive(Resource, Default, Debug, Clone)]
pub struct SoundBank {
    clips: HashMap<Cue, Vec<Handle<AudioSource>>>,
    music: Vec<Handle<AudioSource>>,
    rain: Vec<Handle<AudioSource>>,
}

impl SoundBank {
    pub fn insert(&mut self, cue: Cue, clips: Vec<Handle<AudioSource>>) {
        self.clips.insert(cue, clips);
    }

    pub fn set_music(&mut self, tracks: Vec<Handle<AudioSource>>) {
        self.music = tracks;
    }

    pub fn set_rain(&mut self, layers: Vec<Handle<AudioSource>>) {
        self.rain = layers;
    }

    /// A clip for `cue`; random among variants.  `None` if nothing is loaded.
    pub fn pick<R: Rng + ?Sized>(&self, cue: Cue, rng: &mut R) -> Option<Handle<AudioSource>> {
        self.clips.get(&cue)?.choose(rng).cloned()
    }

    /// Music for the level at `index`; one track per level.
    pub fn music_for(&self, index: usize) -> Option<Handle<AudioSource>> {
        if self.music.is_empty() {
            return None;
        }
        self.music.get(index % self.music.len()).cloned()
    }
}

/// Queue every clip with the asset server.
pub fn load_sound_bank(mut commands: Commands, asset_server: Res<AssetServer>) {
    let mut bank = SoundBank::default();
    let single = |path: &'static str| vec![asset_server.load::<AudioSource>(path)];

    bank.insert(Cue::BottlePickup, single("sounds/bottle_pickup.ogg"));
    bank.insert(Cue::HitEnemy, single("sounds/enemy_hit.ogg"));
    bank.insert(Cue::OpenNotes, single("sounds/notes_open.ogg"));
    bank.insert(Cue::CloseNotes, single("sounds/notes_close.ogg"));
    bank.insert(Cue::NextNote, single("sounds/page_turn.ogg"));
    bank.insert(Cue::PreviousNote, single("sounds/page_turn.ogg"));
    bank.insert(Cue::PlayerDeath, single("sounds/boat_sink.ogg"));

    bank.insert(
        Cue::BoatCreak,
        (1..=CREAK_VARIANTS)
            .map(|i| asset_server.load(format!("sounds/creak_{i}.ogg")))
            .collect(),
    );
    bank.insert(
        Cue::HitHardDebris,
        (1..=DEBRIS_VARIANTS)
            .map(|i| asset_server.load(format!("sounds/debris_{i}.ogg")))
            .collect(),
    );
    for id in 0..BARK_COUNT {
        bank.insert(
            Cue::Bark(id),
            vec![asset_server.load(format!("sounds/bark_{id}.ogg"))],
        );
    }

    bank.set_music(
        (0..LEVEL_COUNT)
            .map(|i| asset_server.load(music_path(i)))
            .collect(),
    );
    bank.set_rain(
        (1..=MAX_RAIN_LEVEL)
            .map(|i| asset_server.load(format!("sounds/rain_{i}.ogg")))
            .collect(),
    );

    commands.insert_resource(bank);
    info!("Sound bank queued");
}

// ── One-shot effects ──────────────────────────────────────────────────────────

/// Spawn a self-despawning player for every [`SfxRequest`].
pub fn play_sfx_system(
    mut commands: Commands,
    mut requests: MessageReader<SfxRequest>,
    bank: Res<SoundBank>,
) {
    let mut rng = rand::thread_rng();
    for request in requests.read() {
        let Some(clip) = bank.pick(request.cue, &mut rng) else {
            debug!("No clip loaded for {:?}", request.cue);
            continue;
        };
        let volume = Volume::Linear(request.volume.clamp(0.0, 1.0));

        match request.position {
            Some(position) => {
                commands.spawn((
                    AudioPlayer::new(clip),
                    PlaybackSettings::DESPAWN
                        .with_volume(volume)
                        .with_spatial(true),
                    Transform::from_translation(position.extend(0.0)),
                    Pausable,
                ));
            }
            None => {
                commands.spawn((
                    AudioPlayer::new(clip),
                    PlaybackSettings::DESPAWN.with_volume(volume),
                ));
            }
        }
    }
}

// ── Music ─────────────────────────────────────────────────────────────────────

/// Linear fade from silence to `target` over `duration` seconds.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MusicFade {
    elapsed: f32,
    duration: f32,
    target: f32,
}

impl MusicFade {
    pub fn new(duration: f32, target: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration,
            target,
        }
    }

    /// Advance by `dt` and return the volume to apply now.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.volume()
    }

    pub fn volume(&self) -> f32 {
        if self.duration <= 0.0 {
            return self.target;
        }
        self.target * (self.elapsed / self.duration)
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Swap in the new level's music, fading it up from silence.
pub fn start_level_music_system(
    mut commands: Commands,
    mut loaded: MessageReader<LevelLoaded>,
    q_music: Query<Entity, With<Music>>,
    bank: Res<SoundBank>,
    config: Res<BoatConfig>,
) {
    let Some(level) = loaded.read().last() else {
        return;
    };
    for entity in q_music.iter() {
        commands.entity(entity).despawn();
    }
    let Some(track) = bank.music_for(level.index) else {
        return;
    };
    commands.spawn((
        AudioPlayer::new(track),
        PlaybackSettings::LOOP.with_volume(Volume::Linear(0.0)),
        Music,
        MusicFade::new(MUSIC_FADE_SECS, config.music_volume),
    ));
    debug!("Music started for level {}", level.index);
}

pub fn music_fade_system(
    mut commands: Commands,
    mut q: Query<(Entity, &mut MusicFade, &mut AudioSink)>,
    time: Res<Time>,
) {
    for (entity, mut fade, mut sink) in q.iter_mut() {
        let volume = fade.advance(time.delta_secs());
        sink.set_volume(Volume::Linear(volume));
        if fade.is_finished() {
            commands.entity(entity).remove::<MusicFade>();
        }
    }
}

// ── Pause / resume ────────────────────────────────────────────────────────────

pub fn pause_sounds_system(q: Query<&AudioSink, With<Pausable>>) {
    for sink in q.iter() {
        sink.pause();
    }
}

pub fn resume_sounds_system(q: Query<&AudioSink, With<Pausable>>) {
    for sink in q.iter() {
        sink.play();
    }
}

// ── Rain ──────────────────────────────────────────────────────────────────────

/// Volume of the rain layer that switches on at `layer` when the weather is
/// at `rain`.
pub fn rain_layer_volume(rain: u8, layer: u8) -> f32 {
    if layer > 0 && rain >= layer {
        RAIN_LAYER_VOLUME
    } else {
        0.0
    }
}

/// Spawn the looping rain layers, all silent.
pub fn spawn_rain_layers(mut commands: Commands, bank: Res<SoundBank>) {
    for (i, clip) in bank.rain.iter().enumerate() {
        commands.spawn((
            AudioPlayer::new(clip.clone()),
            PlaybackSettings::LOOP.with_volume(Volume::Linear(0.0)),
            RainLayer(i as u8 + 1),
            Pausable,
        ));
    }
}

pub fn rain_volume_system(weather: Res<Weather>, mut q: Query<(&RainLayer, &mut AudioSink)>) {
    if !weather.is_changed() {
        return;
    }
    for (layer, mut sink) in q.iter_mut() {
        sink.set_volume(Volume::Linear(rain_layer_volume(weather.rain(), layer.0)));
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct SoundPlugin;

impl Plugin for SoundPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SfxRequest>()
            .init_resource::<SoundBank>()
            .add_systems(Startup, (load_sound_bank, spawn_rain_layers).chain())
            .add_systems(
                Update,
                (
                    play_sfx_system,
                    start_level_music_system,
                    music_fade_system,
                    rain_volume_system,
                ),
            )
            .add_systems(OnExit(GameState::Boating), pause_sounds_system)
            .add_systems(OnEnter(GameState::Boating), resume_sounds_system);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pick_returns_none_for_unloaded_cue() {
        let bank = SoundBank::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(bank.pick(Cue::HitEnemy, &mut rng).is_none());
    }

    #[test]
    fn pick_chooses_among_variants() {
        let mut bank = SoundBank::default();
        bank.insert(Cue::BoatCreak, vec![Handle::default(), Handle::default()]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert!(bank.pick(Cue::BoatCreak, &mut rng).is_some());
        }
    }

    #[test]
    fn music_cycles_through_tracks() {
        let mut bank = SoundBank::default();
        assert!(bank.music_for(0).is_none());
        bank.set_music(vec![Handle::default(), Handle::default()]);
        assert!(bank.music_for(0).is_some());
        assert!(bank.music_for(5).is_some());
    }

    #[test]
    fn every_level_has_its_own_track() {
        let paths: Vec<String> = (0..LEVEL_COUNT).map(music_path).collect();
        assert_eq!(paths[0], "music/level_1.ogg");
        assert_eq!(paths[LEVEL_COUNT - 1], format!("music/level_{LEVEL_COUNT}.ogg"));
        for (i, a) in paths.iter().enumerate() {
            assert!(!paths[i + 1..].contains(a), "{a} is shared");
        }
    }

    #[test]
    fn music_fade_reaches_target_and_stays() {
        let mut fade = MusicFade::new(3.0, 0.55);
        assert_eq!(fade.volume(), 0.0);
        let half = fade.advance(1.5);
        assert!((half - 0.275).abs() < 1e-6);
        assert!(!fade.is_finished());
        let full = fade.advance(10.0);
        assert!((full - 0.55).abs() < 1e-6);
        assert!(fade.is_finished());
    }

    #[test]
    fn zero_length_fade_is_immediate() {
        let mut fade = MusicFade::new(0.0, 0.4);
        assert!((fade.advance(0.0) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn rain_layers_switch_on_in_order() {
        assert_eq!(rain_layer_volume(0, 1), 0.0);
        assert_eq!(rain_layer_volume(1, 1), RAIN_LAYER_VOLUME);
        assert_eq!(rain_layer_volume(1, 2), 0.0);
        assert_eq!(rain_layer_volume(3, 3), RAIN_LAYER_VOLUME);
        assert_eq!(rain_layer_volume(3, 0), 0.0);
    }

    #[test]
    fn sfx_request_spawns_one_shot_player() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_message::<SfxRequest>();
        let mut bank = SoundBank::default();
        bank.insert(Cue::HitEnemy, vec![Handle::default()]);
        app.insert_resource(bank);
        app.add_systems(Update, play_sfx_system);

        app.world_mut()
            .write_message(SfxRequest::new(Cue::HitEnemy, Vec2::new(1.0, 2.0), 0.4));
        // No clip for this one; it must be skipped.
        app.world_mut()
            .write_message(SfxRequest::ui(Cue::OpenNotes, 0.25));
        app.update();

        let world = app.world_mut();
        let mut q = world.query_filtered::<&Transform, (With<AudioPlayer>, With<Pausable>)>();
        let spawned: Vec<_> = q.iter(world).collect();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].translation.truncate(), Vec2::new(1.0, 2.0));
    }
}
