//! Observable frame snapshot handed to rendering once per tick

use serde::Serialize;
use uuid::Uuid;

use super::character::{ActorKind, ActorState, Character};
use super::combat::{AttackVisual, CombatFeedback};
use super::engine::{ChargeIndicator, Engine};
use super::physics::Obstacle;
use super::projectile::Projectile;
use super::weapons::{ClassKey, WeaponKey};
use super::world::{DroppedItem, RemoteWorld};

/// Read-only view of one actor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub id: Uuid,
    pub kind: ActorKind,
    pub name: String,
    pub class_key: ClassKey,
    pub color: String,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    pub block_bar: f32,
    pub arrows: u32,
    pub weapon: WeaponKey,
    pub inventory: Vec<WeaponKey>,
    pub facing: f32,
    pub state: ActorState,
    pub attached_weapons: Vec<WeaponKey>,
}

impl From<&Character> for ActorView {
    fn from(c: &Character) -> Self {
        Self {
            id: c.id,
            kind: c.kind,
            name: c.name.clone(),
            class_key: c.class_key,
            color: c.color.clone(),
            x: c.x,
            y: c.y,
            health: c.health,
            max_health: c.max_health,
            block_bar: c.block_bar,
            arrows: c.arrows,
            weapon: c.weapon_key(),
            inventory: c.inventory.clone(),
            facing: c.facing_angle(),
            state: c.state(),
            attached_weapons: c.attached_weapons.clone(),
        }
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub tick: u64,
    pub local: ActorView,
    pub remote: Vec<ActorView>,
    pub bots: Vec<ActorView>,
    pub dummy: Option<ActorView>,
    pub items: Vec<DroppedItem>,
    pub obstacles: Vec<Obstacle>,
    pub projectiles: Vec<Projectile>,
    pub attack_visuals: Vec<AttackVisual>,
    pub feedback: Vec<CombatFeedback>,
    pub charge: Option<ChargeIndicator>,
    /// Top-left of the viewport, world pixels
    pub camera: (f32, f32),
}

impl FrameSnapshot {
    pub fn build(engine: &Engine, remote: &RemoteWorld, camera: (f32, f32)) -> Self {
        let arena = &engine.arena;
        let ctx = &engine.ctx;
        let mut remote_views: Vec<ActorView> = remote.actors.values().map(ActorView::from).collect();
        remote_views.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Self {
            tick: engine.tick_count(),
            local: ActorView::from(&arena.local),
            remote: remote_views,
            bots: arena.bots.iter().map(ActorView::from).collect(),
            dummy: arena.dummy.as_ref().map(ActorView::from),
            items: remote.items.clone(),
            obstacles: arena.obstacles.clone(),
            projectiles: ctx.projectiles.clone(),
            attack_visuals: ctx.attack_visuals.clone(),
            feedback: ctx.feedback.entries().to_vec(),
            charge: ctx.charge,
            camera,
        }
    }

    /// Actors drawn this frame, local included
    pub fn actor_count(&self) -> usize {
        1 + self.remote.len() + self.bots.len() + usize::from(self.dummy.is_some())
    }
}

/// Running totals over published frames, for the periodic log line
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_frames: u64,
    pub avg_actors_per_frame: f32,
    pub max_projectiles: usize,
}

impl SnapshotStats {
    pub fn record(&mut self, frame: &FrameSnapshot) {
        self.total_frames += 1;
        let n = self.total_frames as f32;
        self.avg_actors_per_frame =
            self.avg_actors_per_frame * ((n - 1.0) / n) + (frame.actor_count() as f32 / n);
        self.max_projectiles = self.max_projectiles.max(frame.projectiles.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::Arena;
    use approx::assert_relative_eq;

    fn engine() -> Engine {
        let local = Character::new(Uuid::new_v4(), ActorKind::Player, "me", ClassKey::Hunter, "#fff", 4.0, 4.0);
        let mut arena = Arena::new(local, vec![Obstacle::new(1.0, 1.0)]);
        arena.dummy = Some(Character::dummy(10.0, 8.0));
        Engine::new(arena)
    }

    #[test]
    fn frame_carries_local_remote_and_world() {
        let engine = engine();
        let mut remote = RemoteWorld::default();
        let other = Character::new(Uuid::new_v4(), ActorKind::Player, "zed", ClassKey::Hoplite, "#0f0", 8.0, 8.0);
        remote.actors.insert(other.id, other);
        remote.items.push(DroppedItem::new(3.0, 3.0, crate::game::weapons::ItemKind::Arrow));

        let frame = FrameSnapshot::build(&engine, &remote, (0.0, 0.0));
        assert_eq!(frame.local.weapon, WeaponKey::BowAndArrow);
        assert_eq!(frame.local.arrows, 10);
        assert_eq!(frame.remote.len(), 1);
        assert_eq!(frame.items.len(), 1);
        assert_eq!(frame.obstacles.len(), 1);
        assert_eq!(frame.actor_count(), 3);
    }

    #[test]
    fn frame_serializes_camel_case() {
        let frame = FrameSnapshot::build(&engine(), &RemoteWorld::default(), (0.0, 0.0));
        let json = serde_json::to_value(&frame).unwrap();
        assert!(json.get("attackVisuals").is_some());
        assert_eq!(json["local"]["classKey"], "cacador");
        assert_eq!(json["local"]["state"], "idle");
    }

    #[test]
    fn stats_average_actor_count() {
        let engine = engine();
        let mut stats = SnapshotStats::default();
        let frame = FrameSnapshot::build(&engine, &RemoteWorld::default(), (0.0, 0.0));
        stats.record(&frame);
        stats.record(&frame);
        assert_eq!(stats.total_frames, 2);
        assert_relative_eq!(stats.avg_actors_per_frame, 2.0);
    }
}
