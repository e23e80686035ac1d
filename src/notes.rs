//! Collectable notes: the library of texts, the inventory cursor, and the
//! notebook panel.
//!
//! ## Systems (registered by `NotesPlugin`)
//!
//! | System                      | Schedule                   | Purpose                          |
//! |-----------------------------|----------------------------|----------------------------------|
//! | `load_note_library`         | `Startup`                  | Read `assets/notes.toml`         |
//! | `toggle_notes_system`       | `Update / Boating, Notes`  | I / North opens or closes the book |
//! | `page_notes_system`         | `Update / Notes`           | Left / right turn pages          |
//! | `spawn_note_panel`          | `OnEnter(Notes)`           | Build the panel                  |
//! | `refresh_note_panel_system` | `Update / Notes`           | Show the page under the cursor   |
//! | `despawn_note_panel`        | `OnExit(Notes)`            | Tear the panel down              |

use crate::audio::{Cue, SfxRequest};
use crate::config::BoatConfig;
use crate::constants::{
    GAMEPAD_PAGE_THRESHOLD, MAX_NOTES, NOTE_CLOSE_VOLUME, NOTE_NEXT_VOLUME, NOTE_OPEN_VOLUME,
    NOTE_PREVIOUS_VOLUME,
};
use crate::error::{GameError, GameResult};
use crate::player::PreferredGamepad;
use crate::state::GameState;
use bevy::prelude::*;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const NOTES_PATH: &str = "assets/notes.toml";

const UNCOLLECTED_TITLE: &str = "???";
const UNCOLLECTED_TEXT: &str = "You haven't found this note yet.";
const BLANK_TEXT: &str = "The ink has run. Nothing can be read.";

// ── Library ───────────────────────────────────────────────────────────────────

/// One page of the notebook.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NoteEntry {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize, Default)]
struct NoteFile {
    #[serde(default)]
    note: Vec<NoteEntry>,
}

/// Texts of every note, keyed by id.
#[derive(Resource, Debug, Clone, Default)]
pub struct NoteLibrary {
    entries: BTreeMap<u32, NoteEntry>,
}

impl NoteLibrary {
    /// Parse a `[[note]]` table array.  Later duplicates replace earlier ones.
    pub fn from_toml_str(path: &str, contents: &str) -> GameResult<Self> {
        let file: NoteFile = toml::from_str(contents).map_err(|e| GameError::NotesParse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut entries = BTreeMap::new();
        for entry in file.note {
            if entry.id == 0 {
                return Err(GameError::NotesParse {
                    path: path.to_string(),
                    message: "note ids start at 1".to_string(),
                });
            }
            entries.insert(entry.id, entry);
        }
        Ok(Self { entries })
    }

    /// Load from disk; `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> GameResult<Option<Self>> {
        let display = path.display().to_string();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&display, &contents).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(GameError::ConfigRead {
                path: display,
                source,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&NoteEntry> {
        self.entries.get(&id)
    }

    /// Title and body to display for page `id`.
    pub fn page(&self, id: u32, collected: bool) -> (String, String) {
        if !collected {
            return (UNCOLLECTED_TITLE.to_string(), UNCOLLECTED_TEXT.to_string());
        }
        match self.get(id) {
            Some(entry) => (entry.title.clone(), entry.text.clone()),
            None => (format!("Note {id}"), BLANK_TEXT.to_string()),
        }
    }
}

// ── Inventory ─────────────────────────────────────────────────────────────────

/// Which notes have been found, and the page the notebook is open at.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct NoteInventory {
    current: u32,
    max_notes: u32,
    collected: BTreeSet<u32>,
}

impl Default for NoteInventory {
    fn default() -> Self {
        Self::new(MAX_NOTES)
    }
}

impl NoteInventory {
    pub fn new(max_notes: u32) -> Self {
        Self {
            current: 1,
            max_notes: max_notes.max(1),
            collected: BTreeSet::new(),
        }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.current
    }

    #[inline]
    pub fn max_notes(&self) -> u32 {
        self.max_notes
    }

    /// Turn to the next page, wrapping from the last to the first.
    pub fn next(&mut self) -> u32 {
        self.current = if self.current >= self.max_notes {
            1
        } else {
            self.current + 1
        };
        self.current
    }

    /// Turn to the previous page, wrapping from the first to the last.
    pub fn previous(&mut self) -> u32 {
        self.current = if self.current <= 1 {
            self.max_notes
        } else {
            self.current - 1
        };
        self.current
    }

    /// File note `id`.  Returns `false` if it was already held or is out of
    /// range.
    pub fn collect(&mut self, id: u32) -> bool {
        if id == 0 || id > self.max_notes {
            warn!("Ignoring note id {id} outside 1..={}", self.max_notes);
            return false;
        }
        self.collected.insert(id)
    }

    pub fn is_collected(&self, id: u32) -> bool {
        self.collected.contains(&id)
    }

    pub fn collected_count(&self) -> usize {
        self.collected.len()
    }
}

// ── Startup ───────────────────────────────────────────────────────────────────

/// Read the note texts and size the inventory from `BoatConfig::max_notes`.
///
/// A missing or broken file leaves an empty library; every page then shows
/// the blank placeholder.
pub fn load_note_library(
    mut library: ResMut<NoteLibrary>,
    mut inventory: ResMut<NoteInventory>,
    config: Res<BoatConfig>,
) {
    *inventory = NoteInventory::new(config.max_notes);

    match NoteLibrary::load(Path::new(NOTES_PATH)) {
        Ok(Some(loaded)) => {
            info!("Loaded {} notes from {NOTES_PATH}", loaded.len());
            *library = loaded;
        }
        Ok(None) => warn!("{NOTES_PATH} not found; notes will be blank"),
        Err(e) => warn!("{e}; notes will be blank"),
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

/// Turn a stick axis into a one-shot page step.
///
/// Fires once when `x` crosses `±threshold`; re-arms after the stick falls
/// back under half the threshold.
pub fn stick_edge(x: f32, threshold: f32, held: &mut bool) -> i32 {
    if x.abs() >= threshold {
        if *held {
            return 0;
        }
        *held = true;
        return if x > 0.0 { 1 } else { -1 };
    }
    if x.abs() < threshold * 0.5 {
        *held = false;
    }
    0
}

/// I / gamepad North, edge triggered: Boating ↔ Notes.
pub fn toggle_notes_system(
    keys: Res<ButtonInput<KeyCode>>,
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    state: Res<State<GameState>>,
    mut next_state: ResMut<NextState<GameState>>,
    mut sfx: MessageWriter<SfxRequest>,
) {
    let pad_pressed = preferred
        .0
        .and_then(|e| gamepads.get(e).ok())
        .is_some_and(|pad| pad.just_pressed(GamepadButton::North));
    if !keys.just_pressed(KeyCode::KeyI) && !pad_pressed {
        return;
    }

    match state.get() {
        GameState::Boating => {
            next_state.set(GameState::Notes);
            sfx.write(SfxRequest::ui(Cue::OpenNotes, NOTE_OPEN_VOLUME));
        }
        GameState::Notes => {
            next_state.set(GameState::Boating);
            sfx.write(SfxRequest::ui(Cue::CloseNotes, NOTE_CLOSE_VOLUME));
        }
        _ => {}
    }
}

/// Left / right (arrows, A / D, d-pad, or a stick flick) turn pages.
pub fn page_notes_system(
    keys: Res<ButtonInput<KeyCode>>,
    preferred: Res<PreferredGamepad>,
    gamepads: Query<&Gamepad>,
    mut stick_held: Local<bool>,
    mut inventory: ResMut<NoteInventory>,
    mut sfx: MessageWriter<SfxRequest>,
) {
    let mut step = 0;
    if keys.any_just_pressed([KeyCode::ArrowRight, KeyCode::KeyD]) {
        step += 1;
    }
    if keys.any_just_pressed([KeyCode::ArrowLeft, KeyCode::KeyA]) {
        step -= 1;
    }

    if let Some(pad) = preferred.0.and_then(|e| gamepads.get(e).ok()) {
        if pad.just_pressed(GamepadButton::DPadRight) {
            step += 1;
        }
        if pad.just_pressed(GamepadButton::DPadLeft) {
            step -= 1;
        }
        let x = pad.get(GamepadAxis::LeftStickX).unwrap_or(0.0);
        step += stick_edge(x, GAMEPAD_PAGE_THRESHOLD, &mut *stick_held);
    }

    match step.signum() {
        1 => {
            inventory.next();
            sfx.write(SfxRequest::ui(Cue::NextNote, NOTE_NEXT_VOLUME));
        }
        -1 => {
            inventory.previous();
            sfx.write(SfxRequest::ui(Cue::PreviousNote, NOTE_PREVIOUS_VOLUME));
        }
        _ => {}
    }
}

// ── Panel ─────────────────────────────────────────────────────────────────────

/// Root of the notebook panel; despawned on `OnExit(Notes)`.
#[derive(Component)]
pub struct NotePanelRoot;

#[derive(Component)]
pub struct NoteTitleText;

#[derive(Component)]
pub struct NoteBodyText;

/// "3 / 10" footer.
#[derive(Component)]
pub struct NotePageText;

pub fn spawn_note_panel(mut commands: Commands) {
    commands
        .spawn((
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                position_type: PositionType::Absolute,
                left: Val::Px(0.0),
                top: Val::Px(0.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.60)),
            ZIndex(150),
            NotePanelRoot,
        ))
        .with_children(|overlay| {
            overlay
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(Val::Px(32.0)),
                        row_gap: Val::Px(16.0),
                        border: UiRect::all(Val::Px(2.0)),
                        width: Val::Px(520.0),
                        min_height: Val::Px(360.0),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.86, 0.80, 0.66)),
                    BorderColor::all(Color::srgb(0.45, 0.35, 0.22)),
                ))
                .with_children(|page| {
                    page.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: 30.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.20, 0.14, 0.08)),
                        NoteTitleText,
                    ));
                    page.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: 18.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.18, 0.14, 0.10)),
                        Node {
                            flex_grow: 1.0,
                            ..default()
                        },
                        NoteBodyText,
                    ));
                    page.spawn((
                        Text::new(""),
                        TextFont {
                            font_size: 14.0,
                            ..default()
                        },
                        TextColor(Color::srgb(0.40, 0.32, 0.22)),
                        NotePageText,
                    ));
                });
        });
}

pub fn despawn_note_panel(mut commands: Commands, q: Query<Entity, With<NotePanelRoot>>) {
    for entity in q.iter() {
        commands.entity(entity).despawn();
    }
}

/// Write the current page into the panel.
///
/// Runs every frame in `Notes` but only rewrites text when something changed
/// or the panel was just spawned.
#[allow(clippy::type_complexity)]
pub fn refresh_note_panel_system(
    inventory: Res<NoteInventory>,
    library: Res<NoteLibrary>,
    spawned: Query<(), Added<NotePanelRoot>>,
    mut q_title: Query<&mut Text, (With<NoteTitleText>, Without<NoteBodyText>, Without<NotePageText>)>,
    mut q_body: Query<&mut Text, (With<NoteBodyText>, Without<NoteTitleText>, Without<NotePageText>)>,
    mut q_page: Query<&mut Text, (With<NotePageText>, Without<NoteTitleText>, Without<NoteBodyText>)>,
) {
    if spawned.is_empty() && !inventory.is_changed() && !library.is_changed() {
        return;
    }

    let id = inventory.current();
    let (title, body) = library.page(id, inventory.is_collected(id));
    for mut text in q_title.iter_mut() {
        *text = Text::new(title.clone());
    }
    for mut text in q_body.iter_mut() {
        *text = Text::new(body.clone());
    }
    for mut text in q_page.iter_mut() {
        *text = Text::new(format!("{id} / {}", inventory.max_notes()));
    }
}

// ── Plugin ────────────────────────────────────────────────────────────────────

pub struct NotesPlugin;

impl Plugin for NotesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NoteLibrary>()
            .init_resource::<NoteInventory>()
            .add_systems(
                Startup,
                load_note_library.after(crate::config::load_boat_config),
            )
            .add_systems(
                Update,
                toggle_notes_system
                    .run_if(in_state(GameState::Boating).or(in_state(GameState::Notes))),
            )
            .add_systems(
                Update,
                (page_notes_system, refresh_note_panel_system)
                    .chain()
                    .run_if(in_state(GameState::Notes)),
            )
            .add_systems(OnEnter(GameState::Notes), spawn_note_panel)
            .add_systems(OnExit(GameState::Notes), despawn_note_panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    const SAMPLE: &str = r#"
[[note]]
id = 1
title = "Day one"
text = "The river is higher than last year."

[[note]]
id = 3
title = "Lantern"
text = "Keep it lit."
"#;

    #[test]
    fn cursor_wraps_both_ways() {
        let mut inv = NoteInventory::new(10);
        assert_eq!(inv.current(), 1);
        assert_eq!(inv.previous(), 10);
        assert_eq!(inv.next(), 1);
        for _ in 0..9 {
            inv.next();
        }
        assert_eq!(inv.current(), 10);
        assert_eq!(inv.next(), 1);
    }

    #[test]
    fn collect_rejects_duplicates_and_out_of_range() {
        let mut inv = NoteInventory::new(10);
        assert!(inv.collect(4));
        assert!(!inv.collect(4));
        assert!(!inv.collect(0));
        assert!(!inv.collect(11));
        assert!(inv.is_collected(4));
        assert_eq!(inv.collected_count(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut inv = NoteInventory::new(0);
        assert_eq!(inv.max_notes(), 1);
        assert_eq!(inv.next(), 1);
        assert_eq!(inv.previous(), 1);
    }

    #[test]
    fn library_parses_note_tables() {
        let lib = NoteLibrary::from_toml_str("notes.toml", SAMPLE).unwrap();
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get(3).unwrap().title, "Lantern");
        assert!(lib.get(2).is_none());
    }

    #[test]
    fn library_rejects_zero_id_and_bad_toml() {
        let err = NoteLibrary::from_toml_str("n.toml", "[[note]]\nid = 0\n").unwrap_err();
        assert!(matches!(err, GameError::NotesParse { .. }));
        let err = NoteLibrary::from_toml_str("n.toml", "[[note]\n").unwrap_err();
        assert!(matches!(err, GameError::NotesParse { .. }));
    }

    #[test]
    fn pages_fall_back_to_placeholders() {
        let lib = NoteLibrary::from_toml_str("notes.toml", SAMPLE).unwrap();
        assert_eq!(lib.page(1, true).0, "Day one");
        assert_eq!(lib.page(1, false).0, UNCOLLECTED_TITLE);
        let (title, body) = lib.page(2, true);
        assert_eq!(title, "Note 2");
        assert_eq!(body, BLANK_TEXT);
    }

    #[test]
    fn stick_pages_once_per_flick() {
        let mut held = false;
        assert_eq!(stick_edge(0.9, 0.8, &mut held), 1);
        assert_eq!(stick_edge(0.95, 0.8, &mut held), 0);
        // Still above the release point.
        assert_eq!(stick_edge(0.5, 0.8, &mut held), 0);
        assert_eq!(stick_edge(0.9, 0.8, &mut held), 0);
        assert_eq!(stick_edge(0.1, 0.8, &mut held), 0);
        assert_eq!(stick_edge(-0.85, 0.8, &mut held), -1);
    }

    fn notes_app() -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, StatesPlugin));
        app.init_state::<GameState>();
        app.add_message::<SfxRequest>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<PreferredGamepad>();
        app.init_resource::<NoteInventory>();
        app.add_systems(
            Update,
            toggle_notes_system.run_if(in_state(GameState::Boating).or(in_state(GameState::Notes))),
        );
        app.add_systems(
            Update,
            page_notes_system.run_if(in_state(GameState::Notes)),
        );
        app
    }

    fn tap(app: &mut App, key: KeyCode) {
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(key);
        app.update();
        let mut keys = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keys.release(key);
        keys.clear();
    }

    fn state(app: &App) -> GameState {
        *app.world().resource::<State<GameState>>().get()
    }

    #[test]
    fn inventory_key_toggles_notes_state() {
        let mut app = notes_app();
        app.update();

        tap(&mut app, KeyCode::KeyI);
        app.update();
        assert_eq!(state(&app), GameState::Notes);

        tap(&mut app, KeyCode::KeyI);
        app.update();
        assert_eq!(state(&app), GameState::Boating);
    }

    #[test]
    fn arrows_turn_pages_only_in_notes() {
        let mut app = notes_app();
        app.update();

        tap(&mut app, KeyCode::ArrowRight);
        assert_eq!(app.world().resource::<NoteInventory>().current(), 1);

        tap(&mut app, KeyCode::KeyI);
        app.update();
        tap(&mut app, KeyCode::ArrowRight);
        assert_eq!(app.world().resource::<NoteInventory>().current(), 2);
        tap(&mut app, KeyCode::ArrowLeft);
        tap(&mut app, KeyCode::ArrowLeft);
        assert_eq!(app.world().resource::<NoteInventory>().current(), 10);
    }
}
