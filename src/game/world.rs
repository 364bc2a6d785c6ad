//! Actors, obstacles and dropped items, plus procedural placement

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use super::character::{ActorKind, Character};
use super::constants::{
    ACTOR_PLACEMENT_ATTEMPTS, DUMMY_FALLBACK_POSITION, GRID_SIZE, OBSTACLE_PLACEMENT_ATTEMPTS,
    SPAWN_POINTS,
};
use super::physics::{Obstacle, PhysicsSystem, ACTOR_HALF};
use super::weapons::{ClassKey, ItemKind};

/// Item lying on the arena floor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedItem {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub item: ItemKind,
}

impl DroppedItem {
    pub fn new(x: f32, y: f32, item: ItemKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            x,
            y,
            item,
        }
    }
}

/// Shared item-list mutation produced by a tick, forwarded to the sync layer
#[derive(Debug, Clone, PartialEq)]
pub enum WorldRequest {
    AddItem(DroppedItem),
    RemoveItem(Uuid),
}

/// State rebuilt from inbound snapshots: remote actors and the item list.
/// Replaced wholesale on every snapshot; local edits only last until then.
#[derive(Debug, Default)]
pub struct RemoteWorld {
    pub actors: HashMap<Uuid, Character>,
    pub items: Vec<DroppedItem>,
    pub host_id: Option<String>,
    pub game_started: bool,
}

impl RemoteWorld {
    /// Remove an item by id, reporting whether it was present
    pub fn take_item(&mut self, id: Uuid) -> Option<DroppedItem> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }
}

/// Locally simulated part of the world
#[derive(Debug)]
pub struct Arena {
    pub local: Character,
    pub bots: Vec<Character>,
    pub dummy: Option<Character>,
    pub obstacles: Vec<Obstacle>,
}

impl Arena {
    pub fn new(local: Character, obstacles: Vec<Obstacle>) -> Self {
        Self {
            local,
            bots: Vec::new(),
            dummy: None,
            obstacles,
        }
    }

    /// Borrow every actor, local and remote, as one roster
    pub fn roster<'a>(&'a mut self, remote: &'a mut RemoteWorld) -> Roster<'a> {
        Roster {
            local: &mut self.local,
            bots: &mut self.bots,
            dummy: self.dummy.as_mut(),
            remote: &mut remote.actors,
        }
    }

    /// Split into the actor roster and the obstacle list so both can be
    /// borrowed at once
    pub fn roster_and_obstacles<'a>(
        &'a mut self,
        remote: &'a mut RemoteWorld,
    ) -> (Roster<'a>, &'a [Obstacle]) {
        let roster = Roster {
            local: &mut self.local,
            bots: &mut self.bots,
            dummy: self.dummy.as_mut(),
            remote: &mut remote.actors,
        };
        (roster, &self.obstacles)
    }

    /// Centres of living actors other than `id`, for movement collision
    pub fn blockers_except(&self, remote: &RemoteWorld, id: Uuid) -> Vec<(f32, f32)> {
        std::iter::once(&self.local)
            .chain(self.bots.iter())
            .chain(self.dummy.iter())
            .chain(remote.actors.values())
            .filter(|actor| actor.id != id && actor.is_alive)
            .map(|actor| (actor.x, actor.y))
            .collect()
    }

    /// Place a bot at a free spawn point; returns its id, or `None` when no
    /// free point was found
    pub fn spawn_bot(&mut self, rng: &mut ChaCha8Rng, remote: &RemoteWorld) -> Option<Uuid> {
        let mut occupied: Vec<(f32, f32)> = Vec::new();
        occupied.extend(self.local.is_alive.then_some((self.local.x, self.local.y)));
        occupied.extend(self.dummy.iter().map(|d| (d.x, d.y)));
        occupied.extend(self.bots.iter().filter(|b| b.is_alive).map(|b| (b.x, b.y)));
        occupied.extend(remote.actors.values().filter(|a| a.is_alive).map(|a| (a.x, a.y)));

        let bot = WorldGen::place_bot(rng, &self.obstacles, &occupied)?;
        let id = bot.id;
        info!(bot_id = %id, class = %bot.class_key, x = bot.x, y = bot.y, "Bot spawned");
        self.bots.push(bot);
        Some(id)
    }
}

/// Mutable view over every actor taking part in a tick
pub struct Roster<'a> {
    pub local: &'a mut Character,
    pub bots: &'a mut Vec<Character>,
    pub dummy: Option<&'a mut Character>,
    pub remote: &'a mut HashMap<Uuid, Character>,
}

impl<'a> Roster<'a> {
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Character> + '_ {
        std::iter::once(&mut *self.local)
            .chain(self.bots.iter_mut())
            .chain(self.dummy.as_deref_mut())
            .chain(self.remote.values_mut())
    }
}

/// Procedural placement of obstacles and actors
pub struct WorldGen;

impl WorldGen {
    /// Place up to `count` unit obstacles that overlap neither each other nor
    /// any spawn point's actor box
    pub fn obstacles(rng: &mut ChaCha8Rng, count: usize) -> Vec<Obstacle> {
        let cells = GRID_SIZE as i32;
        let mut placed: Vec<Obstacle> = Vec::with_capacity(count);

        for index in 0..count {
            let mut done = false;
            for _ in 0..OBSTACLE_PLACEMENT_ATTEMPTS {
                let candidate = Obstacle::new(rng.gen_range(0..cells) as f32, rng.gen_range(0..cells) as f32);
                let overlaps_existing = placed.iter().any(|o| o.x == candidate.x && o.y == candidate.y);
                let covers_spawn = SPAWN_POINTS
                    .iter()
                    .any(|&(sx, sy)| candidate.overlaps(sx, sy, ACTOR_HALF));
                if !overlaps_existing && !covers_spawn {
                    placed.push(candidate);
                    done = true;
                    break;
                }
            }
            if !done {
                warn!(
                    obstacle = index + 1,
                    attempts = OBSTACLE_PLACEMENT_ATTEMPTS,
                    "Could not place obstacle, continuing with fewer"
                );
            }
        }
        placed
    }

    /// Put the dummy on a random free cell, falling back to a fixed position
    pub fn place_dummy(rng: &mut ChaCha8Rng, obstacles: &[Obstacle], local: &Character) -> Character {
        let cells = GRID_SIZE as i32;
        for _ in 0..ACTOR_PLACEMENT_ATTEMPTS {
            let x = rng.gen_range(0..cells) as f32 + 0.5;
            let y = rng.gen_range(0..cells) as f32 + 0.5;
            if !PhysicsSystem::actor_blocked(x, y, obstacles, &[(local.x, local.y)]) {
                return Character::dummy(x, y);
            }
        }
        warn!(
            attempts = ACTOR_PLACEMENT_ATTEMPTS,
            "Could not place dummy, using fallback position"
        );
        let (x, y) = DUMMY_FALLBACK_POSITION;
        Character::dummy(x, y)
    }

    /// Build a bot with a random class and colour at a free spawn point
    pub fn place_bot(rng: &mut ChaCha8Rng, obstacles: &[Obstacle], occupied: &[(f32, f32)]) -> Option<Character> {
        for _ in 0..ACTOR_PLACEMENT_ATTEMPTS {
            let (x, y) = SPAWN_POINTS[rng.gen_range(0..SPAWN_POINTS.len())];
            if PhysicsSystem::actor_blocked(x, y, obstacles, occupied) {
                continue;
            }
            let class = ClassKey::ALL[rng.gen_range(0..ClassKey::ALL.len())];
            let color = format!("#{:06x}", rng.gen_range(0..=0xFF_FFFFu32));
            let name = format!("Bot {}", rng.gen_range(0..100));
            return Some(Character::new(Uuid::new_v4(), ActorKind::Bot, name, class, color, x, y));
        }
        warn!(
            attempts = ACTOR_PLACEMENT_ATTEMPTS,
            "No free spawn point for bot"
        );
        None
    }
}
