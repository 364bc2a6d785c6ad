//! Static weapon and class tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Weapon identifiers as stored in inventories and on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponKey {
    BareHands,
    Sword,
    Shield,
    Lance,
    Dagger,
    BowAndArrow,
    Knife,
}

/// What a projectile carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    Arrow,
    /// The weapon itself is thrown
    Thrown,
}

/// Weapon stats (immutable, looked up by key)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    pub key: WeaponKey,
    pub name: &'static str,
    /// Melee reach, centre to centre
    pub range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    pub damage: f32,
    /// Block bar capacity
    pub block_value: f32,
    /// Block bar drain per second while blocking
    pub block_cost: f32,
    pub combo: &'static [&'static str],
    /// Maximum projectile distance (arrow flight or full-charge throw)
    pub throw_range: f32,
    pub is_throwable: bool,
    pub projectile: Option<ProjectileKind>,
    /// Displacement applied to melee targets, in pixels
    pub knockback: f32,
    /// Bow draw time
    pub charge_time: Option<f32>,
}

const BARE_HANDS: Weapon = Weapon {
    key: WeaponKey::BareHands,
    name: "Bare Hands",
    range: 1.5,
    attack_cooldown: 1.0,
    damage: 0.5,
    block_value: 5.0,
    block_cost: 2.0,
    combo: &["jab", "cross", "uppercut"],
    throw_range: 0.0,
    is_throwable: false,
    projectile: None,
    knockback: 0.0,
    charge_time: None,
};

const SWORD: Weapon = Weapon {
    key: WeaponKey::Sword,
    name: "Sword",
    range: 2.7,
    attack_cooldown: 1.2,
    damage: 1.0,
    block_value: 4.0,
    block_cost: 1.5,
    combo: &["diagonal", "horizontal", "thrust", "horizontal", "vertical"],
    throw_range: 6.0,
    is_throwable: true,
    projectile: Some(ProjectileKind::Thrown),
    knockback: 0.0,
    charge_time: None,
};

const SHIELD: Weapon = Weapon {
    key: WeaponKey::Shield,
    name: "Shield",
    range: 2.0,
    attack_cooldown: 1.5,
    damage: 0.7,
    block_value: 6.0,
    block_cost: 1.5,
    combo: &["thrust", "horizontal"],
    throw_range: 7.0,
    is_throwable: true,
    projectile: Some(ProjectileKind::Thrown),
    knockback: 0.0,
    charge_time: None,
};

const LANCE: Weapon = Weapon {
    key: WeaponKey::Lance,
    name: "Lance",
    range: 3.0,
    attack_cooldown: 1.0,
    damage: 0.8,
    block_value: 4.0,
    block_cost: 1.5,
    combo: &["thrust", "diagonal", "horizontal"],
    throw_range: 8.0,
    is_throwable: true,
    projectile: Some(ProjectileKind::Thrown),
    knockback: 0.0,
    charge_time: None,
};

const DAGGER: Weapon = Weapon {
    key: WeaponKey::Dagger,
    name: "Dagger",
    range: 2.0,
    attack_cooldown: 0.7,
    damage: 1.0,
    block_value: 5.0,
    block_cost: 1.5,
    combo: &["horizontal", "thrust", "horizontal", "diagonal"],
    throw_range: 7.5,
    is_throwable: true,
    projectile: Some(ProjectileKind::Thrown),
    knockback: 0.0,
    charge_time: None,
};

const BOW_AND_ARROW: Weapon = Weapon {
    key: WeaponKey::BowAndArrow,
    name: "Bow and Arrow",
    range: 1.5,
    attack_cooldown: 2.0,
    damage: 1.0,
    block_value: 5.0,
    block_cost: 2.0,
    combo: &["vertical", "horizontal"],
    throw_range: 18.0,
    is_throwable: false,
    projectile: Some(ProjectileKind::Arrow),
    knockback: 0.0,
    charge_time: Some(1.0),
};

const KNIFE: Weapon = Weapon {
    key: WeaponKey::Knife,
    name: "Knife",
    range: 1.6,
    attack_cooldown: 1.1,
    damage: 0.8,
    block_value: 4.0,
    block_cost: 1.2,
    combo: &["thrust", "horizontal", "vertical"],
    throw_range: 7.5,
    is_throwable: true,
    projectile: Some(ProjectileKind::Thrown),
    knockback: 0.0,
    charge_time: None,
};

impl WeaponKey {
    pub const ALL: [WeaponKey; 7] = [
        WeaponKey::BareHands,
        WeaponKey::Sword,
        WeaponKey::Shield,
        WeaponKey::Lance,
        WeaponKey::Dagger,
        WeaponKey::BowAndArrow,
        WeaponKey::Knife,
    ];

    pub fn stats(self) -> &'static Weapon {
        match self {
            WeaponKey::BareHands => &BARE_HANDS,
            WeaponKey::Sword => &SWORD,
            WeaponKey::Shield => &SHIELD,
            WeaponKey::Lance => &LANCE,
            WeaponKey::Dagger => &DAGGER,
            WeaponKey::BowAndArrow => &BOW_AND_ARROW,
            WeaponKey::Knife => &KNIFE,
        }
    }

    /// Wire key, e.g. `bowAndArrow`
    pub fn as_str(self) -> &'static str {
        match self {
            WeaponKey::BareHands => "bareHands",
            WeaponKey::Sword => "sword",
            WeaponKey::Shield => "shield",
            WeaponKey::Lance => "lance",
            WeaponKey::Dagger => "dagger",
            WeaponKey::BowAndArrow => "bowAndArrow",
            WeaponKey::Knife => "knife",
        }
    }

    /// Resolve either a wire key or a display name
    pub fn lookup(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == value || key.stats().name.eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for WeaponKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Weapon {
    pub fn uses_arrows(&self) -> bool {
        self.projectile == Some(ProjectileKind::Arrow)
    }

    pub fn is_bow(&self) -> bool {
        self.uses_arrows() && self.charge_time.is_some()
    }

    /// Throwable by hand; bows never are
    pub fn can_be_thrown(&self) -> bool {
        self.is_throwable && !self.is_bow() && self.throw_range > 0.0
    }

    pub fn combo_len(&self) -> usize {
        self.combo.len().max(1)
    }
}

/// Things that can lie on the arena floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Weapon(WeaponKey),
    /// Bundle of arrows for bow users
    Arrow,
}

impl ItemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Weapon(key) => key.as_str(),
            ItemKind::Arrow => "arrow",
        }
    }
}

impl Serialize for ItemKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown item type in a snapshot
#[derive(Debug, thiserror::Error)]
#[error("unknown item type: {0}")]
pub struct UnknownItem(pub String);

impl FromStr for ItemKind {
    type Err = UnknownItem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "arrow" {
            return Ok(ItemKind::Arrow);
        }
        WeaponKey::lookup(s)
            .map(ItemKind::Weapon)
            .ok_or_else(|| UnknownItem(s.to_string()))
    }
}

/// Character classes; wire names are kept from the original lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKey {
    #[serde(rename = "espadachim")]
    Swordsman,
    #[serde(rename = "hoplita")]
    Hoplite,
    #[serde(rename = "emboscador")]
    Ambusher,
    #[serde(rename = "cacador")]
    Hunter,
}

/// Base attributes selected by a class
#[derive(Debug, Clone, Copy)]
pub struct ClassStats {
    pub max_health: f32,
    /// Grid units per second
    pub speed: f32,
    pub starting_weapons: &'static [WeaponKey],
}

impl Default for ClassKey {
    fn default() -> Self {
        Self::Swordsman
    }
}

impl ClassKey {
    pub const ALL: [ClassKey; 4] = [
        ClassKey::Swordsman,
        ClassKey::Hoplite,
        ClassKey::Ambusher,
        ClassKey::Hunter,
    ];

    pub fn stats(self) -> ClassStats {
        match self {
            ClassKey::Swordsman => ClassStats {
                max_health: 4.0,
                speed: 3.0,
                starting_weapons: &[WeaponKey::Sword, WeaponKey::Knife],
            },
            ClassKey::Hoplite => ClassStats {
                max_health: 5.0,
                speed: 2.0,
                starting_weapons: &[WeaponKey::Lance, WeaponKey::Shield],
            },
            ClassKey::Ambusher => ClassStats {
                max_health: 3.0,
                speed: 3.5,
                starting_weapons: &[WeaponKey::Dagger, WeaponKey::Dagger],
            },
            ClassKey::Hunter => ClassStats {
                max_health: 2.0,
                speed: 3.0,
                starting_weapons: &[WeaponKey::BowAndArrow, WeaponKey::Knife],
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClassKey::Swordsman => "espadachim",
            ClassKey::Hoplite => "hoplita",
            ClassKey::Ambusher => "emboscador",
            ClassKey::Hunter => "cacador",
        }
    }

    /// Parse a class key, falling back to the default class with a warning
    pub fn parse_or_default(value: &str) -> Self {
        match Self::ALL.into_iter().find(|class| class.as_str() == value) {
            Some(class) => class,
            None => {
                warn!(class_key = value, "Unknown class key, using default class");
                Self::default()
            }
        }
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
