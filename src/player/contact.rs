//! Collision category dispatch for the boat.
//!
//! Every entity the boat can meet carries a [`ContactCategory`].  The
//! dispatcher turns Rapier `CollisionEvent`s that involve the boat into
//! [`PlayerContact`] messages; handler systems pick the categories they care
//! about.  [`ContactCategory::rule`] is the table that says how each category
//! behaves.
//!
//! ## Ordering (all in `Update`, see [`ContactSet`])
//!
//! 1. `Dispatch` — [`collision_dispatch_system`], [`wall_contact_system`]
//! 2. `React` — per-category handlers (here and in `level`, `hud`)
//! 3. `Consume` — [`consume_contacts_system`] despawns one-shot pickups/triggers
//!
//! Consumption runs last so handlers can still read the other entity's
//! components in the frame it was touched.

use super::health::{apply_hit, heal, HitOutcome};
use super::state::{BoatMotion, Player, PlayerDied, PlayerHealth, WallContacts};
use crate::audio::{Cue, SfxRequest};
use crate::config::BoatConfig;
use crate::constants::{
    BOTTLE_PICKUP_VOLUME, DEBRIS_IMPACT_VOLUME, ENEMY_HIT_VOLUME,
};
use crate::graphics::CameraShake;
use crate::hud::HelperMessage;
use crate::notes::NoteInventory;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

// ── Categories ─────────────────────────────────────────────────────────────────

/// What kind of thing the boat touched.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactCategory {
    /// Floating bottle: heals and holds a note.
    Bottle,
    /// Hurts the boat and knocks it back.
    Enemy,
    /// Solid rock or log; only makes noise.
    HardDebris,
    /// Weather trigger: one step heavier rain.
    RainUp,
    /// Weather trigger: one step lighter rain.
    RainDown,
    /// Finish line of the level.
    LevelEnd,
    /// Shows a line of dialogue.
    Dialogue,
    /// Bank zone pushing the boat back along X.
    WallHorizontal,
    /// Bank zone pushing the boat back along Y.
    WallVertical,
}

/// How a category behaves on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRule {
    /// Spawned as a Rapier sensor (no physical response).
    pub sensor: bool,
    /// Despawned after its first contact.
    pub consumed: bool,
    /// Tracked for the whole overlap, not just the first touch.
    pub sustained: bool,
}

impl ContactCategory {
    pub const ALL: [ContactCategory; 9] = [
        ContactCategory::Bottle,
        ContactCategory::Enemy,
        ContactCategory::HardDebris,
        ContactCategory::RainUp,
        ContactCategory::RainDown,
        ContactCategory::LevelEnd,
        ContactCategory::Dialogue,
        ContactCategory::WallHorizontal,
        ContactCategory::WallVertical,
    ];

    pub const fn rule(self) -> ContactRule {
        const fn rule(sensor: bool, consumed: bool, sustained: bool) -> ContactRule {
            ContactRule {
                sensor,
                consumed,
                sustained,
            }
        }
        match self {
            ContactCategory::Bottle => rule(true, true, false),
            ContactCategory::Enemy => rule(false, false, false),
            ContactCategory::HardDebris => rule(false, false, false),
            ContactCategory::RainUp => rule(true, true, false),
            ContactCategory::RainDown => rule(true, true, false),
            ContactCategory::LevelEnd => rule(true, false, false),
            ContactCategory::Dialogue => rule(true, true, false),
            ContactCategory::WallHorizontal => rule(true, false, true),
            ContactCategory::WallVertical => rule(true, false, true),
        }
    }

    #[inline]
    pub fn is_wall(self) -> bool {
        matches!(
            self,
            ContactCategory::WallHorizontal | ContactCategory::WallVertical
        )
    }
}

/// Unit push a bank zone applies to a boat at `boat`.
///
/// Horizontal zones push along X away from the zone's centre, vertical zones
/// along Y.  A boat exactly on the centre line gets no push.
pub fn wall_push_direction(category: ContactCategory, wall: Vec2, boat: Vec2) -> Vec2 {
    match category {
        ContactCategory::WallHorizontal => {
            if wall.x < boat.x {
                Vec2::X
            } else if wall.x > boat.x {
                Vec2::NEG_X
            } else {
                Vec2::ZERO
            }
        }
        ContactCategory::WallVertical => {
            if wall.y < boat.y {
                Vec2::Y
            } else if wall.y > boat.y {
                Vec2::NEG_Y
            } else {
                Vec2::ZERO
            }
        }
        _ => Vec2::ZERO,
    }
}

// ── Messages & components on contact targets ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    Started,
    Stopped,
}

/// The boat started or stopped touching `other`.
#[derive(Message, Debug, Clone, Copy)]
pub struct PlayerContact {
    pub other: Entity,
    pub category: ContactCategory,
    pub phase: ContactPhase,
}

impl PlayerContact {
    #[inline]
    pub fn started(&self, category: ContactCategory) -> bool {
        self.phase == ContactPhase::Started && self.category == category
    }
}

/// Note held by a bottle.
#[derive(Component, Debug, Clone, Copy)]
pub struct Bottle {
    pub note_id: u32,
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContactSet {
    Dispatch,
    React,
    Consume,
}

pub const BOTTLE_HELPER_TEXT: &str = "To Read Notes: Press 'I' or the ▲|Y Button";

// ── Dispatch ───────────────────────────────────────────────────────────────────

/// Translate Rapier collision events involving the boat into [`PlayerContact`].
///
/// Events between two non-player entities, or with an uncategorized entity,
/// are ignored.
pub fn collision_dispatch_system(
    mut collision_events: MessageReader<CollisionEvent>,
    q_player: Query<Entity, With<Player>>,
    q_category: Query<&ContactCategory>,
    mut contacts: MessageWriter<PlayerContact>,
) {
    let Ok(player) = q_player.single() else {
        collision_events.clear();
        return;
    };

    for event in collision_events.read() {
        let (e1, e2, phase) = match event {
            CollisionEvent::Started(e1, e2, _) => (*e1, *e2, ContactPhase::Started),
            CollisionEvent::Stopped(e1, e2, _) => (*e1, *e2, ContactPhase::Stopped),
        };

        let other = if e1 == player {
            e2
        } else if e2 == player {
            e1
        } else {
            continue;
        };

        let Ok(category) = q_category.get(other) else {
            continue;
        };

        contacts.write(PlayerContact {
            other,
            category: *category,
            phase,
        });
    }
}

/// Keep [`WallContacts`] in sync with bank-zone overlaps.
pub fn wall_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    mut q_player: Query<&mut WallContacts, With<Player>>,
) {
    let Ok(mut walls) = q_player.single_mut() else {
        return;
    };
    for contact in contacts.read() {
        if !contact.category.rule().sustained {
            continue;
        }
        match contact.phase {
            ContactPhase::Started => walls.add(contact.other),
            ContactPhase::Stopped => walls.remove(contact.other),
        }
    }
}

// ── Handlers ───────────────────────────────────────────────────────────────────

/// Bottle pickup: heal, file the note, chime, and show the reading hint.
pub fn bottle_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    mut q_player: Query<&mut PlayerHealth, With<Player>>,
    q_bottles: Query<(&Bottle, &Transform)>,
    mut inventory: ResMut<NoteInventory>,
    mut helper: ResMut<HelperMessage>,
    mut sfx: MessageWriter<SfxRequest>,
    config: Res<BoatConfig>,
) {
    let Ok(mut health) = q_player.single_mut() else {
        return;
    };
    for contact in contacts.read() {
        if !contact.started(ContactCategory::Bottle) {
            continue;
        }
        let Ok((bottle, transform)) = q_bottles.get(contact.other) else {
            continue;
        };

        heal(&mut health);
        if inventory.collect(bottle.note_id) {
            info!("Collected note {}", bottle.note_id);
        }
        sfx.write(SfxRequest::new(
            Cue::BottlePickup,
            transform.translation.truncate(),
            BOTTLE_PICKUP_VOLUME,
        ));
        helper.show(BOTTLE_HELPER_TEXT, config.helper_message_secs);
    }
}

/// Enemy contact: knock the boat away and take a heart unless invulnerable.
#[allow(clippy::too_many_arguments)]
pub fn enemy_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    mut q_player: Query<(&Transform, &mut PlayerHealth, &mut BoatMotion), With<Player>>,
    q_transforms: Query<&Transform, Without<Player>>,
    mut sfx: MessageWriter<SfxRequest>,
    mut died: MessageWriter<PlayerDied>,
    mut shake: ResMut<CameraShake>,
    config: Res<BoatConfig>,
) {
    let Ok((boat_transform, mut health, mut motion)) = q_player.single_mut() else {
        return;
    };
    let boat_pos = boat_transform.translation.truncate();

    for contact in contacts.read() {
        if !contact.started(ContactCategory::Enemy) {
            continue;
        }
        let enemy_pos = q_transforms
            .get(contact.other)
            .map(|t| t.translation.truncate())
            .unwrap_or(boat_pos);

        let outcome = apply_hit(&mut health, &mut motion, boat_pos - enemy_pos, &config);
        if outcome == HitOutcome::Ignored {
            continue;
        }

        sfx.write(SfxRequest::new(Cue::HitEnemy, enemy_pos, ENEMY_HIT_VOLUME));
        shake.start(config.hit_shake_intensity, health.invulnerable.remaining());

        if outcome == HitOutcome::Died {
            warn!("Boat sank");
            died.write(PlayerDied { position: boat_pos });
        } else {
            info!("Boat hit by enemy ({} hp left)", health.hp);
        }
    }
}

/// Volume of a debris impact at closing speed `relative_speed`.
pub fn debris_impact_volume(relative_speed: f32, max_boosted_speed: f32) -> f32 {
    if max_boosted_speed <= 0.0 {
        return 0.0;
    }
    let ratio = relative_speed * relative_speed / (max_boosted_speed * max_boosted_speed);
    (ratio * DEBRIS_IMPACT_VOLUME).clamp(0.0, 1.0)
}

/// Hard debris: thud scaled by how fast the boat hit it.
///
/// The closing speed uses the boat's commanded velocity: by the time the
/// contact is read, the solver has already bounced the boat's `Velocity`.
pub fn debris_contact_system(
    mut contacts: MessageReader<PlayerContact>,
    q_player: Query<(&Transform, &BoatMotion), With<Player>>,
    q_debris: Query<(&Transform, Option<&Velocity>), Without<Player>>,
    mut sfx: MessageWriter<SfxRequest>,
    config: Res<BoatConfig>,
) {
    let Ok((boat_transform, motion)) = q_player.single() else {
        return;
    };
    for contact in contacts.read() {
        if !contact.started(ContactCategory::HardDebris) {
            continue;
        }
        let (position, debris_velocity) = match q_debris.get(contact.other) {
            Ok((t, v)) => (t.translation.truncate(), v.map(|v| v.linvel).unwrap_or(Vec2::ZERO)),
            Err(_) => (boat_transform.translation.truncate(), Vec2::ZERO),
        };
        let closing = (motion.commanded - debris_velocity).length();
        let volume = debris_impact_volume(closing, config.max_boosted_speed());
        sfx.write(SfxRequest::new(Cue::HitHardDebris, position, volume));
    }
}

/// Despawn one-shot contact targets after every handler has seen them.
pub fn consume_contacts_system(
    mut commands: Commands,
    mut contacts: MessageReader<PlayerContact>,
) {
    let mut consumed: Vec<Entity> = Vec::new();
    for contact in contacts.read() {
        if contact.phase == ContactPhase::Started
            && contact.category.rule().consumed
            && !consumed.contains(&contact.other)
        {
            consumed.push(contact.other);
        }
    }
    for entity in consumed {
        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }
}
