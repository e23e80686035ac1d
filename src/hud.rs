//! On-screen overlays: hearts, helper message, dialogue, pause, and fade.
//!
//! ## Systems (registered by `HudPlugin`)
//!
//! | System                      | Schedule                  | Purpose                              |
//! |-----------------------------|---------------------------|--------------------------------------|
//! | `setup_hud`                 | `Startup`                 | Hearts row, helper + dialogue text, fade overlay |
//! | `sync_hearts_system`        | `Update`                  | Fill hearts from `PlayerHealth`      |
//! | `helper_message_system`     | `Update`                  | Expire and display the helper line   |
//! | `dialogue_contact_system`   | `Update / ContactSet::React` | Start dialogue from a trigger     |
//! | `dialogue_tick_system`      | `Update / Boating, Dialogue` | Expire dialogue; unpause          |
//! | `dialogue_skip_system`      | `Update / Dialogue`       | Space / Enter / South skip the line  |
//! | `dialogue_panel_system`     | `Update`                  | Show or hide the dialogue box        |
//! | `toggle_pause_system`       | `Update / Boating`        | Escape / Start → `Paused`            |
//! | `pause_resume_input_system` | `Update / Paused`         | Escape / Start → `Boating`           |
//! | `screen_fade_system`        | `Update`                  | Drive the full-screen fade overlay   |

use crate::audio::{Cue, SfxRequest};
use crate::config::BoatConfig;
use crate::player::{ContactCategory, ContactSet, Player, PlayerContact, PlayerHealth, PreferredGamepad};
use crate::state::GameState;
use crate::timing::Countdown;
use bevy::prelude::*;

fn heart_full() -> Color {
    Color::srgb(0.85, 0.16, 0.20)
}
fn heart_empty() -> Color {
    Color::srgba(0.25, 0.08, 0.10, 0.6)
}
fn helper_color() -> Color {
    Color::srgb(0.92, 0.90, 0.80)
}
fn dialogue_color() -> Color {
    Color::srgb(0.95, 0.93, 0.86)
}

// ── Resources ─────────────────────────────────────────────────────────────────

/// A one-line hint at the bottom of the screen that disappears on its own.
#[derive(Resource, Debug, Clone, Default)]
pub struct HelperMessage {
    text: String,
    expiry: Countdown,
}

impl HelperMessage {
    pub fn show(&mut self, text: impl Into<String>, secs: f32) {
        self.text = text.into();
        self.expiry.start(secs);
    }

    /// Text to display right now (empty once expired).
    pub fn text(&self) -> &str {
        if self.expiry.is_running() {
            &self.text
        } else {
            ""
        }
    }

    /// Returns `true` on the tick the message expires.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.expiry.tick(dt) {
            self.text.clear();
            return true;
        }
        false
    }
}

/// Dialogue trigger placed in a level.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Dialogue {
    /// Seconds on screen.
    pub duration: f32,
    pub content: String,
    /// Freeze the river while the line is shown.
    pub pause_game: bool,
    pub character_id: u32,
    /// Spoken bark to play, if any.
    pub bark_id: Option<u32>,
    /// Identifies the trigger for logging.
    pub trigger_id: u32,
}

/// Who says a line.
pub fn speaker_name(character_id: u32) -> &'static str {
    match character_id {
        0 => "Rower",
        1 => "Ferryman",
        2 => "Lighthouse Keeper",
        _ => "Voice",
    }
}

/// The line currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ShownLine {
    pub speaker: &'static str,
    pub content: String,
    pub pauses: bool,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct ActiveDialogue {
    line: Option<ShownLine>,
    countdown: Countdown,
}

impl ActiveDialogue {
    pub fn start(&mut self, dialogue: &Dialogue) {
        self.line = Some(ShownLine {
            speaker: speaker_name(dialogue.character_id),
            content: dialogue.content.clone(),
            pauses: dialogue.pause_game,
        });
        self.countdown.start(dialogue.duration.max(0.0));
    }

    pub fn line(&self) -> Option<&ShownLine> {
        self.line.as_ref()
    }

    /// Drop the line now.  Returns whether it was pausing the game.
    pub fn finish(&mut self) -> bool {
        self.countdown.clear();
        self.line.take().is_some_and(|l| l.pauses)
    }

    /// Advance; on expiry returns `Some(pauses)` for the line that ended.
    pub fn tick(&mut self, dt: f32) -> Option<bool> {
        if self.line.is_none() {
            return None;
        }
        if self.countdown.tick(dt) || !self.countdown.is_running() {
            return Some(self.finish());
        }
        None
    }
}

/// Full-screen black overlay alpha, linearly animated.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ScreenFade {
    alpha: f32,
    from: f32,
    to: f32,
    elapsed: f32,
    duration: f32,
}

impl Default for ScreenFade {
    /// Starts black; the first level load fades in.
    fn default() -> Self {
        Self {
            alpha: 1.0,
            from: 1.0,
            to: 1.0,
            elapsed: 0.0,
            duration: 0.0,
        }
    }
}

impl ScreenFade {
    /// Animate from the current alpha to `target` over `secs`.
    pub fn fade_to(&mut self, target: f32, secs: f32) {
        self.from = self.alpha;
        self.to = target.clamp(0.0, 1.0);
        self.elapsed = 0.0;
        self.duration = secs.max(0.0);
        if self.duration == 0.0 {
            self.alpha = self.to;
        }
    }

    pub fn advance(&mut self, dt: f32) -> f32 {
        if self.duration > 0.0 && self.elapsed < self.duration {
            self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
            let t = self.elapsed / self.duration;
            self.alpha = self.from + (self.to - self.from) * t;
        }
        self.alpha
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.alpha == self.to
    }
}

// ── Component markers ─────────────────────────────────────────────────────────

/// One heart in the hearts row; the index is its position from the left.
#[derive(Component)]
pub struct Heart(pub u32);

#[derive(Component)]
pub struct HelperText;

#[derive(Component)]
pub struct DialogueBox;

#[derive(Component)]
pub struct DialogueText;

#[derive(Component)]
pub struct PauseOverlayRoot;

#[derive(Component)]
pub struct FadeOverlay;

// ── Startup ───────────────────────────────────────────────────────────────────

/// Spawn the persistent HUD nodes.
pub fn setup_hud(mut commands: Commands, config: Res<BoatConfig>) {
    // Hearts, top left
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(12.0),
            column_gap: Val::Px(6.0),
            ..default()
        })
        .with_children(|row| {
            for i in 0..config.max_health.max(1) {
                row.spawn((
                    Node {
                        width: Val::Px(22.0),
                        height: Val::Px(22.0),
                        ..default()
                    },
                    BackgroundColor(heart_full()),
                    Heart(i),
                ));
            }
        });

    // Helper message, bottom centre
    commands
        .spawn(Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            bottom: Val::Px(24.0),
            justify_content: JustifyContent::Center,
            ..default()
        })
        .with_children(|bar| {
            bar.spawn((
                Text::new(""),
                TextFont {
                    font_size: 18.0,
                    ..default()
                },
                TextColor(helper_color()),
                HelperText,
            ));
        });

    // Dialogue box, lower third
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(70.0),
                left: Val::Percent(15.0),
                bottom: Val::Px(72.0),
                padding: UiRect::all(Val::Px(16.0)),
                border: UiRect::all(Val::Px(2.0)),
                ..default()
            },
            BackgroundColor(Color::srgba(0.02, 0.03, 0.06, 0.85)),
            BorderColor::all(Color::srgb(0.30, 0.30, 0.40)),
            Visibility::Hidden,
            DialogueBox,
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new(""),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
                TextColor(dialogue_color()),
                DialogueText,
            ));
        });

    // Fade overlay above everything
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            left: Val::Px(0.0),
            top: Val::Px(0.0),
            ..default()
        },
        BackgroundColor(Color::BLACK),
        ZIndex(500),
        FadeOverlay,
    ));

    info!("HUD spawned");
}

// ── Update: hearts & helper ───────────────────────────────────────────────────

pub fn sync_hearts_system(
    q_player: Query<&PlayerHealth, (With<Player>, Changed<PlayerHealth>)>,
    mut q_hearts: Query<(&Heart, &mut BackgroundColor)>,
) {
    let Ok(health) = q_player.single() else {
        return;
    };
    for (heart, mut bg) in q_hearts.iter_mut() {
        bg.0 = if heart.0 < health.hp {
            heart_full()
        } else {
            heart_empty()
        };
    }
}

pub fn helper_message_system(
    mut helper: ResMut<HelperMessage>,
    mut q_text: Query<&mut Text, With<HelperText>>,
    time: Res<Time>,
) {
    helper.tick(time.delta_secs());
    if !helper.is_changed() {
        return;
    }
    for mut text in q_text.iter_mut() {
        *text = Text::new(helper.text().to_string());
    }
}

// ── Dialogue ──────────────────────────────────────────────────────────────────

/// Boat touched a dialogue trigger: show it, play its bark, maybe pause.
///
/// The trigger itself is despawned by `consume_contacts_system`.
pub fn dialogue_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    q_triggers: Query<(&Dialogue, &Transform)>,
    mut active: ResMut<ActiveDialogue>,
    mut next_state: ResMut<NextState<GameState>>,
    mut sfx: MessageWriter<SfxRequest>,
) {
    for contact in contacts.read() {
        if !contact.started(ContactCategory::Dialogue) {
            continue;
        }
        let Ok((dialogue, transform)) = q_triggers.get(contact.other) else {
            continue;
        };

        active.start(dialogue);
        if let Some(bark) = dialogue.bark_id {
            sfx.write(SfxRequest::new(
                Cue::Bark(bark),
                transform.translation.truncate(),
                1.0,
            ));
        }
        if dialogue.pause_game {
            next_state.set(GameState::Dialogue);
        }
        info!(
            "Dialogue {} ({}) for {:.1}s",
            dialogue.trigger_id,
            speaker_name(dialogue.character_id),
            dialogue.duration
        );
    }
}

/// Count the line down; leave `Dialogue` when a pausing line ends.
pub fn dialogue_tick_system(
    mut active: ResMut<ActiveDialogue>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    time: Res<Time>,
) {
    if active.tick(time.delta_secs()).is_some() && *state.get() == GameState::Dialogue {
        next_state.set(GameState::Boating);
    }
}

/// Space / Enter / South skip a pausing line.
pub fn dialogue_skip_system(
    keys: Res<ButtonInput<KeyCode>>,
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    mut active: ResMut<ActiveDialogue>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    let pad = preferred
        .0
        .and_then(|e| gamepads.get(e).ok())
        .is_some_and(|pad| pad.just_pressed(GamepadButton::South));
    if keys.any_just_pressed([KeyCode::Space, KeyCode::Enter]) || pad {
        active.finish();
        next_state.set(GameState::Boating);
    }
}

pub fn dialogue_panel_system(
    active: Res<ActiveDialogue>,
    mut q_box: Query<&mut Visibility, With<DialogueBox>>,
    mut q_text: Query<&mut Text, With<DialogueText>>,
) {
    if !active.is_changed() {
        return;
    }
    let (visibility, content) = match active.line() {
        Some(line) => (
            Visibility::Inherited,
            format!("{}: {}", line.speaker, line.content),
        ),
        None => (Visibility::Hidden, String::new()),
    };
    for mut vis in q_box.iter_mut() {
        vis.set_if_neq(visibility);
    }
    for mut text in q_text.iter_mut() {
        *text = Text::new(content.clone());
    }
}

// ── Pause ─────────────────────────────────────────────────────────────────────

fn pause_pressed(
    keys: &ButtonInput<KeyCode>,
    preferred: &PreferredGamepad,
    gamepads: &Query<&Gamepad>,
) -> bool {
    let pad = preferred
        .0
        .and_then(|e| gamepads.get(e).ok())
        .is_some_and(|pad| pad.just_pressed(GamepadButton::Start));
    keys.just_pressed(KeyCode::Escape) || pad
}

/// Escape / Start while in `Boating` → `Paused`.
pub fn toggle_pause_system(
    keys: Res<ButtonInput<KeyCode>>,
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if pause_pressed(&keys, &preferred, &gamepads) {
        next_state.set(GameState::Paused);
    }
}

/// Escape / Start while in `Paused` → back to `Boating`.
pub fn pause_resume_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if pause_pressed(&keys, &preferred, &gamepads) {
        next_state.set(GameState::Boating);
    }
}

pub fn setup_pause_overlay(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(12.0),
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.70)),
            ZIndex(200),
            PauseOverlayRoot,
        ))
        .with_children(|overlay| {
            overlay.spawn((
                Text::new("PAUSED"),
                TextFont {
                    font_size: 38.0,
                    ..default()
                },
                TextColor(dialogue_color()),
            ));
            overlay.spawn((
                Text::new("ESC to resume"),
                TextFont {
                    font_size: 14.0,
                    ..default()
                },
                TextColor(helper_color()),
            ));
        });
}

pub fn cleanup_pause_overlay(mut commands: Commands, q: Query<Entity, With<PauseOverlayRoot>>) {
    for entity in q.iter() {
        commands.entity(entity).despawn();
    }
}

// ── Fade ──────────────────────────────────────────────────────────────────────

pub fn screen_fade_system(
    mut fade: ResMut<ScreenFade>,
    mut q: Query<&mut BackgroundColor, With<FadeOverlay>>,
    time: Res<Time>,
) {
    if fade.is_settled() && !fade.is_changed() {
        return;
    }
    let alpha = fade.advance(time.delta_secs());
    for mut bg in q.iter_mut() {
        bg.0 = Color::BLACK.with_alpha(alpha);
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HelperMessage>()
            .init_resource::<ActiveDialogue>()
            .init_resource::<ScreenFade>()
            .add_systems(Startup, setup_hud.after(crate::config::load_boat_config))
            .add_systems(
                Update,
                (
                    sync_hearts_system,
                    helper_message_system,
                    dialogue_panel_system,
                    screen_fade_system,
                ),
            )
            .add_systems(Update, dialogue_contact_system.in_set(ContactSet::React))
            .add_systems(
                Update,
                dialogue_tick_system
                    .run_if(in_state(GameState::Boating).or(in_state(GameState::Dialogue))),
            )
            .add_systems(
                Update,
                (
                    toggle_pause_system.run_if(in_state(GameState::Boating)),
                    pause_resume_input_system.run_if(in_state(GameState::Paused)),
                    dialogue_skip_system.run_if(in_state(GameState::Dialogue)),
                ),
            )
            .add_systems(OnEnter(GameState::Paused), setup_pause_overlay)
            .add_systems(OnExit(GameState::Paused), cleanup_pause_overlay);
    }
}
