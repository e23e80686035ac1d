//! River layouts, level lifecycle, and weather.
//!
//! ## Lifecycle
//!
//! 1. Something writes [`LoadLevel`] (startup, the finish line, or a death).
//! 2. [`load_level_system`] despawns every [`LevelEntity`], resets weather,
//!    builds the layout with [`build_layout`], spawns it plus a fresh boat,
//!    and writes [`LevelLoaded`].
//! 3. Reaching the [`ContactCategory::LevelEnd`] trigger, or losing the last
//!    heart, arms [`LevelFlow`]; when its countdown ends the next (or the
//!    same) level is requested.
//!
//! Layouts are generated from a per-level seed so every attempt at a level
//! is the same river.

use crate::audio::{Cue, SfxRequest};
use crate::config::BoatConfig;
use crate::constants::{
    BOAT_COLLIDER_RADIUS, LEVEL_FADE_IN_SECS, LEVEL_FADE_SECS, MAX_RAIN_LEVEL,
};
use crate::hud::{Dialogue, ScreenFade};
use crate::player::{
    spawn_player, Bottle, ContactCategory, ContactSet, PlayerContact, PlayerDied,
};
use crate::state::GameState;
use crate::timing::Countdown;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed offset for layout generation; level `i` uses `LAYOUT_SEED + i`.
const LAYOUT_SEED: u64 = 0x6e69_6768_7472_6f77;
/// Width of the solid bank blocks either side of the river.
const BANK_THICKNESS: f32 = 4.0;
/// Depth of the push-back zone reaching into the water from each bank.
const PUSH_ZONE_REACH: f32 = 0.6;
/// Distance between the boat's spawn point and the bottom of the river.
const SPAWN_OFFSET: f32 = 3.0;
/// Obstacles never start closer than this to the spawn point.
pub const SPAWN_CLEARANCE: f32 = BOAT_COLLIDER_RADIUS + 4.0;

// ── Resources & messages ──────────────────────────────────────────────────────

/// Index of the level currently in play.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelIndex(pub usize);

/// Everything spawned for a level; despawned when the next one loads.
#[derive(Component)]
pub struct LevelEntity;

/// Request to (re)build level `index`.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadLevel {
    pub index: usize,
}

/// A level finished loading.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelLoaded {
    pub index: usize,
}

/// How heavy the rain is, `0..=MAX_RAIN_LEVEL`.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Weather {
    rain: u8,
}

impl Weather {
    #[inline]
    pub fn rain(&self) -> u8 {
        self.rain
    }

    /// One step heavier.  Returns whether the level changed.
    pub fn raise(&mut self) -> bool {
        if self.rain >= MAX_RAIN_LEVEL {
            return false;
        }
        self.rain += 1;
        true
    }

    /// One step lighter.  Returns whether the level changed.
    pub fn lower(&mut self) -> bool {
        if self.rain == 0 {
            return false;
        }
        self.rain -= 1;
        true
    }
}

/// What happens when [`LevelFlow`]'s countdown runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    NextLevel,
    Reload,
}

/// Pending level change.
#[derive(Resource, Debug, Clone, Default)]
pub struct LevelFlow {
    pending: Option<Transition>,
    countdown: Countdown,
}

impl LevelFlow {
    /// Arm a transition.  A reload overrides a pending advance; otherwise the
    /// first request wins.
    pub fn arm(&mut self, transition: Transition, secs: f32) -> bool {
        match (self.pending, transition) {
            (None, _) | (Some(Transition::NextLevel), Transition::Reload) => {
                self.pending = Some(transition);
                self.countdown.start(secs);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> Option<Transition> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.countdown.clear();
    }

    /// Advance; returns the transition on the tick it fires.
    pub fn tick(&mut self, dt: f32) -> Option<Transition> {
        let pending = self.pending?;
        if self.countdown.tick(dt) || !self.countdown.is_running() {
            self.pending = None;
            return Some(pending);
        }
        None
    }
}

/// Index after `current`, wrapping to the first level after the last.
pub fn next_level_index(current: usize) -> usize {
    (current + 1) % LEVEL_COUNT
}

// ── Layout ────────────────────────────────────────────────────────────────────

/// Per-level tuning.
#[derive(Debug, Clone, Copy)]
struct LevelTheme {
    length: f32,
    width: f32,
    rocks: usize,
    logs: usize,
    enemies: usize,
    line: &'static str,
    speaker: u32,
}

const THEMES: [LevelTheme; 3] = [
    LevelTheme {
        length: 60.0,
        width: 12.0,
        rocks: 8,
        logs: 3,
        enemies: 2,
        line: "The lantern's lit. Row north and keep clear of the rocks.",
        speaker: 0,
    },
    LevelTheme {
        length: 80.0,
        width: 10.0,
        rocks: 12,
        logs: 5,
        enemies: 4,
        line: "Something moves under the water here. Don't stop.",
        speaker: 1,
    },
    LevelTheme {
        length: 100.0,
        width: 9.0,
        rocks: 16,
        logs: 6,
        enemies: 6,
        line: "I can see the light from here. Almost home.",
        speaker: 2,
    },
];

pub const LEVEL_COUNT: usize = THEMES.len();

/// One thing placed in the river.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    /// Solid bank block.
    Bank { center: Vec2, half_extents: Vec2 },
    /// Push-back sensor along a bank.
    PushZone {
        center: Vec2,
        half_extents: Vec2,
        category: ContactCategory,
    },
    Rock { center: Vec2, radius: f32 },
    /// Floating log; moves when hit.
    Log { center: Vec2, half_extents: Vec2 },
    Enemy {
        center: Vec2,
        radius: f32,
        drift: Drift,
    },
    Bottle { center: Vec2, note_id: u32 },
    Rain {
        center: Vec2,
        half_extents: Vec2,
        heavier: bool,
    },
    Dialogue { center: Vec2, half_extents: Vec2, dialogue: Dialogue },
    LevelEnd { center: Vec2, half_extents: Vec2 },
}

impl Feature {
    pub fn category(&self) -> Option<ContactCategory> {
        match self {
            Feature::Bank { .. } => None,
            Feature::PushZone { category, .. } => Some(*category),
            Feature::Rock { .. } | Feature::Log { .. } => Some(ContactCategory::HardDebris),
            Feature::Enemy { .. } => Some(ContactCategory::Enemy),
            Feature::Bottle { .. } => Some(ContactCategory::Bottle),
            Feature::Rain { heavier: true, .. } => Some(ContactCategory::RainUp),
            Feature::Rain { heavier: false, .. } => Some(ContactCategory::RainDown),
            Feature::Dialogue { .. } => Some(ContactCategory::Dialogue),
            Feature::LevelEnd { .. } => Some(ContactCategory::LevelEnd),
        }
    }

    pub fn center(&self) -> Vec2 {
        match self {
            Feature::Bank { center, .. }
            | Feature::PushZone { center, .. }
            | Feature::Rock { center, .. }
            | Feature::Log { center, .. }
            | Feature::Enemy { center, .. }
            | Feature::Bottle { center, .. }
            | Feature::Rain { center, .. }
            | Feature::Dialogue { center, .. }
            | Feature::LevelEnd { center, .. } => *center,
        }
    }
}

/// Side-to-side sway for enemies.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub origin: Vec2,
    pub amplitude: f32,
    /// Radians per second.
    pub frequency: f32,
    pub phase: f32,
}

impl Drift {
    pub fn position_at(&self, t: f32) -> Vec2 {
        self.origin + Vec2::X * self.amplitude * (t * self.frequency + self.phase).sin()
    }
}

/// A complete river.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    pub index: usize,
    /// Boat spawn point.
    pub spawn: Vec2,
    /// Water runs from `y = 0` to `y = length`.
    pub length: f32,
    /// Water runs from `x = -width / 2` to `x = width / 2`.
    pub width: f32,
    pub features: Vec<Feature>,
}

/// Notes hidden in level `index` when there are `max_notes` in total.
pub fn notes_for_level(index: usize, max_notes: u32) -> std::ops::RangeInclusive<u32> {
    let per_level = max_notes.div_ceil(LEVEL_COUNT as u32).max(1);
    let first = index as u32 * per_level + 1;
    let last = ((index as u32 + 1) * per_level).min(max_notes);
    first..=last
}

/// Generate level `index` (wrapped into the level count).
pub fn build_layout(index: usize, max_notes: u32) -> LevelLayout {
    let index = index % LEVEL_COUNT;
    let theme = THEMES[index];
    let mut rng = StdRng::seed_from_u64(LAYOUT_SEED + index as u64);

    let half_w = theme.width * 0.5;
    let length = theme.length;
    let mut features = Vec::new();

    // Banks: left, right, bottom, top.
    let side_half = Vec2::new(BANK_THICKNESS * 0.5, length * 0.5 + BANK_THICKNESS);
    let end_half = Vec2::new(half_w + BANK_THICKNESS, BANK_THICKNESS * 0.5);
    for sign in [-1.0, 1.0] {
        features.push(Feature::Bank {
            center: Vec2::new(sign * (half_w + BANK_THICKNESS * 0.5), length * 0.5),
            half_extents: side_half,
        });
        // Centre sits inside the bank so the push always points into the water.
        features.push(Feature::PushZone {
            center: Vec2::new(sign * half_w, length * 0.5),
            half_extents: Vec2::new(PUSH_ZONE_REACH, length * 0.5),
            category: ContactCategory::WallHorizontal,
        });
    }
    for (y, sign) in [(0.0, -1.0), (length, 1.0)] {
        features.push(Feature::Bank {
            center: Vec2::new(0.0, y + sign * BANK_THICKNESS * 0.5),
            half_extents: end_half,
        });
        features.push(Feature::PushZone {
            center: Vec2::new(0.0, y),
            half_extents: Vec2::new(half_w, PUSH_ZONE_REACH),
            category: ContactCategory::WallVertical,
        });
    }

    // Obstacles stay clear of the spawn area and the finish line.
    let lane = half_w - PUSH_ZONE_REACH - 1.0;
    let random_point = |rng: &mut StdRng| {
        Vec2::new(
            rng.gen_range(-lane..lane),
            rng.gen_range(SPAWN_OFFSET + 5.0..length - 6.0),
        )
    };

    for _ in 0..theme.rocks {
        features.push(Feature::Rock {
            center: random_point(&mut rng),
            radius: rng.gen_range(0.4..0.9),
        });
    }
    for _ in 0..theme.logs {
        features.push(Feature::Log {
            center: random_point(&mut rng),
            half_extents: Vec2::new(rng.gen_range(0.8..1.4), 0.2),
        });
    }
    for _ in 0..theme.enemies {
        let origin = random_point(&mut rng);
        features.push(Feature::Enemy {
            center: origin,
            radius: 0.5,
            drift: Drift {
                origin,
                amplitude: rng.gen_range(0.5..lane.max(0.6)),
                frequency: rng.gen_range(0.4..1.2),
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
            },
        });
    }
    for note_id in notes_for_level(index, max_notes) {
        features.push(Feature::Bottle {
            center: random_point(&mut rng),
            note_id,
        });
    }

    // Weather strips across the whole river.
    let strip = Vec2::new(half_w, 0.5);
    features.push(Feature::Rain {
        center: Vec2::new(0.0, length * 0.3),
        half_extents: strip,
        heavier: true,
    });
    if index > 0 {
        features.push(Feature::Rain {
            center: Vec2::new(0.0, length * 0.5),
            half_extents: strip,
            heavier: true,
        });
    }
    features.push(Feature::Rain {
        center: Vec2::new(0.0, length * 0.85),
        half_extents: strip,
        heavier: false,
    });

    features.push(Feature::Dialogue {
        center: Vec2::new(0.0, SPAWN_OFFSET + 2.0),
        half_extents: strip,
        dialogue: Dialogue {
            duration: 4.0,
            content: theme.line.to_string(),
            pause_game: index == 0,
            character_id: theme.speaker,
            bark_id: Some(index as u32),
            trigger_id: index as u32,
        },
    });

    features.push(Feature::LevelEnd {
        center: Vec2::new(0.0, length - 2.0),
        half_extents: strip,
    });

    LevelLayout {
        index,
        spawn: Vec2::new(0.0, SPAWN_OFFSET),
        length,
        width: theme.width,
        features,
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

fn water_color() -> Color {
    Color::srgb(0.04, 0.07, 0.12)
}

fn feature_color(feature: &Feature) -> Color {
    match feature {
        Feature::Bank { .. } => Color::srgb(0.10, 0.13, 0.08),
        Feature::PushZone { .. } => Color::srgba(0.0, 0.0, 0.0, 0.0),
        Feature::Rock { .. } => Color::srgb(0.35, 0.35, 0.38),
        Feature::Log { .. } => Color::srgb(0.36, 0.24, 0.14),
        Feature::Enemy { .. } => Color::srgb(0.45, 0.10, 0.35),
        Feature::Bottle { .. } => Color::srgb(0.40, 0.80, 0.55),
        Feature::Rain { .. } | Feature::Dialogue { .. } => Color::srgba(0.0, 0.0, 0.0, 0.0),
        Feature::LevelEnd { .. } => Color::srgba(0.95, 0.85, 0.40, 0.35),
    }
}

/// Spawn one feature; returns its entity.
pub fn spawn_feature(commands: &mut Commands, feature: &Feature) -> Entity {
    let center = feature.center();
    let color = feature_color(feature);
    let mut entity = commands.spawn((
        LevelEntity,
        Transform::from_translation(center.extend(0.0)),
    ));

    match feature {
        Feature::Bank { half_extents, .. } => {
            entity.insert((
                RigidBody::Fixed,
                Collider::cuboid(half_extents.x, half_extents.y),
                Sprite::from_color(color, *half_extents * 2.0),
            ));
        }
        Feature::PushZone { half_extents, .. }
        | Feature::Rain { half_extents, .. }
        | Feature::LevelEnd { half_extents, .. } => {
            entity.insert((
                Collider::cuboid(half_extents.x, half_extents.y),
                Sprite::from_color(color, *half_extents * 2.0),
            ));
        }
        Feature::Dialogue {
            half_extents,
            dialogue,
            ..
        } => {
            entity.insert((
                Collider::cuboid(half_extents.x, half_extents.y),
                dialogue.clone(),
            ));
        }
        Feature::Rock { radius, .. } => {
            entity.insert((
                RigidBody::Fixed,
                Collider::ball(*radius),
                Sprite::from_color(color, Vec2::splat(radius * 2.0)),
            ));
        }
        Feature::Log { half_extents, .. } => {
            entity.insert((
                RigidBody::Dynamic,
                Collider::cuboid(half_extents.x, half_extents.y),
                Velocity::zero(),
                GravityScale(0.0),
                Damping {
                    linear_damping: 1.5,
                    angular_damping: 2.0,
                },
                Sprite::from_color(color, *half_extents * 2.0),
            ));
        }
        Feature::Enemy { radius, drift, .. } => {
            entity.insert((
                RigidBody::KinematicPositionBased,
                Collider::ball(*radius),
                *drift,
                Sprite::from_color(color, Vec2::splat(radius * 2.0)),
            ));
        }
        Feature::Bottle { note_id, .. } => {
            entity.insert((
                Collider::ball(0.3),
                Bottle { note_id: *note_id },
                Sprite::from_color(color, Vec2::new(0.25, 0.5)),
            ));
        }
    }

    if let Some(category) = feature.category() {
        entity.insert((category, ActiveEvents::COLLISION_EVENTS));
        if category.rule().sensor {
            entity.insert(Sensor);
        }
    }
    entity.id()
}

/// Spawn the water, every feature, and the boat.
pub fn spawn_layout(commands: &mut Commands, layout: &LevelLayout, config: &BoatConfig) {
    commands.spawn((
        LevelEntity,
        Sprite::from_color(
            water_color(),
            Vec2::new(layout.width + BANK_THICKNESS * 4.0, layout.length + BANK_THICKNESS * 4.0),
        ),
        Transform::from_xyz(0.0, layout.length * 0.5, -10.0),
    ));
    for feature in &layout.features {
        spawn_feature(commands, feature);
    }
    let boat = spawn_player(commands, layout.spawn, config);
    commands.entity(boat).insert(LevelEntity);
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Load whichever level `LevelIndex` starts at (0 unless overridden).
pub fn request_first_level(index: Res<LevelIndex>, mut load: MessageWriter<LoadLevel>) {
    load.write(LoadLevel { index: index.0 });
}

/// Tear down the current level and build the requested one.
#[allow(clippy::too_many_arguments)]
pub fn load_level_system(
    mut commands: Commands,
    mut requests: MessageReader<LoadLevel>,
    q_level: Query<Entity, With<LevelEntity>>,
    mut index: ResMut<LevelIndex>,
    mut weather: ResMut<Weather>,
    mut flow: ResMut<LevelFlow>,
    mut fade: ResMut<ScreenFade>,
    mut loaded: MessageWriter<LevelLoaded>,
    config: Res<BoatConfig>,
) {
    let Some(request) = requests.read().last().copied() else {
        return;
    };

    for entity in q_level.iter() {
        commands.entity(entity).despawn();
    }

    let layout = build_layout(request.index, config.max_notes);
    spawn_layout(&mut commands, &layout, &config);

    index.0 = layout.index;
    *weather = Weather::default();
    flow.clear();
    fade.fade_to(0.0, LEVEL_FADE_IN_SECS);
    loaded.write(LevelLoaded {
        index: layout.index,
    });
    info!(
        "Level {} loaded ({} features)",
        layout.index,
        layout.features.len()
    );
}

/// Finish line: fade out and move on after `level_end_secs`.
pub fn level_end_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    mut flow: ResMut<LevelFlow>,
    mut fade: ResMut<ScreenFade>,
    config: Res<BoatConfig>,
) {
    for contact in contacts.read() {
        if !contact.started(ContactCategory::LevelEnd) {
            continue;
        }
        if flow.arm(Transition::NextLevel, config.level_end_secs) {
            fade.fade_to(1.0, LEVEL_FADE_SECS);
            info!("Reached the end of the river");
        }
    }
}

/// The boat sank: play the death sound and reload after `death_secs`.
pub fn player_died_system(
    mut died: MessageReader<PlayerDied>,
    mut flow: ResMut<LevelFlow>,
    mut fade: ResMut<ScreenFade>,
    mut sfx: MessageWriter<SfxRequest>,
    config: Res<BoatConfig>,
) {
    for event in died.read() {
        sfx.write(SfxRequest::new(Cue::PlayerDeath, event.position, 1.0));
        if flow.arm(Transition::Reload, config.death_secs) {
            fade.fade_to(1.0, config.death_secs);
        }
    }
}

pub fn level_flow_system(
    mut flow: ResMut<LevelFlow>,
    index: Res<LevelIndex>,
    mut load: MessageWriter<LoadLevel>,
    time: Res<Time>,
) {
    let next = match flow.tick(time.delta_secs()) {
        Some(Transition::NextLevel) => next_level_index(index.0),
        Some(Transition::Reload) => index.0,
        None => return,
    };
    load.write(LoadLevel { index: next });
}

/// Rain triggers step the weather up or down.
pub fn weather_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    mut weather: ResMut<Weather>,
) {
    for contact in contacts.read() {
        let changed = if contact.started(ContactCategory::RainUp) {
            weather.raise()
        } else if contact.started(ContactCategory::RainDown) {
            weather.lower()
        } else {
            continue;
        };
        if changed {
            debug!("Rain level now {}", weather.rain());
        }
    }
}

/// Sway enemies along their drift path.
pub fn drift_system(mut q: Query<(&Drift, &mut Transform)>, time: Res<Time>) {
    let t = time.elapsed_secs();
    for (drift, mut transform) in q.iter_mut() {
        let p = drift.position_at(t);
        transform.translation.x = p.x;
        transform.translation.y = p.y;
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelIndex>()
            .init_resource::<Weather>()
            .init_resource::<LevelFlow>()
            .add_message::<LoadLevel>()
            .add_message::<LevelLoaded>()
            .add_systems(Startup, request_first_level)
            .add_systems(Update, load_level_system.before(ContactSet::Dispatch))
            .add_systems(
                Update,
                (
                    level_end_contact_system,
                    player_died_system,
                    weather_contact_system,
                )
                    .in_set(ContactSet::React),
            )
            .add_systems(
                Update,
                level_flow_system.run_if(in_state(GameState::Boating)),
            )
            .add_systems(
                FixedUpdate,
                drift_system.run_if(in_state(GameState::Boating)),
            );
    }
}
