//! Room document wire format

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::game::character::{ActorKind, Character};
use crate::game::weapons::{ClassKey, ItemKind, WeaponKey};
use crate::game::world::DroppedItem;

/// Shared room document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomDoc {
    pub host_id: Option<String>,
    pub game_started: bool,
    pub players: HashMap<String, PlayerState>,
    pub dropped_items: Vec<ItemState>,
}

impl RoomDoc {
    /// Fresh room hosted by `host_id`
    pub fn hosted_by(host_id: &str) -> Self {
        Self {
            host_id: Some(host_id.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    pub x: f32,
    pub y: f32,
}

impl Default for Direction {
    fn default() -> Self {
        Self { x: 0.0, y: 1.0 }
    }
}

/// One actor's slot in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub name: String,
    pub health: f32,
    pub max_health: f32,
    #[serde(default)]
    pub block_bar: f32,
    #[serde(default)]
    pub arrows: u32,
    /// Weapon key; display names are accepted on read
    #[serde(default)]
    pub weapon_name: String,
    pub is_alive: bool,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub class_key: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_player: bool,
}

fn default_true() -> bool {
    true
}

impl From<&Character> for PlayerState {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id.to_string(),
            x: c.x,
            y: c.y,
            name: c.name.clone(),
            health: c.health,
            max_health: c.max_health,
            block_bar: c.block_bar,
            arrows: c.arrows,
            weapon_name: c.weapon_key().as_str().to_string(),
            is_alive: c.is_alive,
            direction: Direction {
                x: c.direction.0,
                y: c.direction.1,
            },
            class_key: c.class_key.as_str().to_string(),
            color: c.color.clone(),
            is_player: c.kind == ActorKind::Player,
        }
    }
}

impl PlayerState {
    /// Rebuild a remote actor; `None` when the id is not a UUID
    pub fn to_character(&self) -> Option<Character> {
        let Ok(id) = Uuid::parse_str(&self.id) else {
            warn!(player_id = %self.id, "Skipping player with invalid id");
            return None;
        };
        let class_key = ClassKey::parse_or_default(&self.class_key);
        let kind = if self.is_player { ActorKind::Player } else { ActorKind::Bot };
        let mut c = Character::new(id, kind, self.name.clone(), class_key, self.color.clone(), self.x, self.y);

        if self.max_health > 0.0 {
            c.max_health = self.max_health;
        }
        c.health = self.health.clamp(0.0, c.max_health);
        c.is_alive = c.health > 0.0;

        if let Some(key) = WeaponKey::lookup(&self.weapon_name) {
            c.inventory = vec![key];
            c.active_weapon = 0;
        }
        c.block_bar = self.block_bar.clamp(0.0, c.weapon().block_value);
        c.arrows = self.arrows;

        let len = (self.direction.x * self.direction.x + self.direction.y * self.direction.y).sqrt();
        if len > 0.0 {
            c.direction = (self.direction.x / len, self.direction.y / len);
        }
        Some(c)
    }
}

/// One dropped item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemState {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub item_type: String,
}

impl From<&DroppedItem> for ItemState {
    fn from(item: &DroppedItem) -> Self {
        Self {
            id: item.id.to_string(),
            x: item.x,
            y: item.y,
            item_type: item.item.as_str().to_string(),
        }
    }
}

impl ItemState {
    /// `None` (with a warning) for unknown ids or item types
    pub fn to_item(&self) -> Option<DroppedItem> {
        let Ok(id) = Uuid::parse_str(&self.id) else {
            warn!(item_id = %self.id, "Skipping item with invalid id");
            return None;
        };
        let item: ItemKind = match self.item_type.parse() {
            Ok(kind) => kind,
            Err(e) => {
                warn!(item_id = %self.id, error = %e, "Skipping unknown item");
                return None;
            }
        };
        Some(DroppedItem {
            id,
            x: self.x,
            y: self.y,
            item,
        })
    }
}
