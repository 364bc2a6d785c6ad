//! Per-frame simulation loop
//!
//! One call to [`Engine::tick`] resolves the local actor's intentions in a
//! fixed order (timers, movement, block, attack, pickup-or-throw, dash,
//! weapon switch, drop), then advances bots, projectiles and the ephemeral
//! visuals. Nothing here fails: unavailable actions become warning feedback.

use serde::Serialize;
use tracing::debug;

use super::bot::{AttackStyle, BotAction, BotBrain};
use super::character::Character;
use super::combat::{AttackOrigin, AttackVisual, CombatSystem, FeedbackKind, FeedbackLog};
use super::constants::{
    ARRIVAL_TOLERANCE, ARROW_BUNDLE, DASH_DISTANCE, MAX_INVENTORY, MIN_RELEASE_CHARGE,
    PICKUP_COOLDOWN, PICKUP_RANGE, THROW_COOLDOWN_FACTOR,
};
use super::physics::PhysicsSystem;
use super::projectile::{Projectile, ProjectileEvent};
use super::weapons::{ClassKey, ItemKind, WeaponKey};
use super::world::{Arena, DroppedItem, RemoteWorld, WorldRequest};
use crate::input::Intentions;

/// What the charge bar is filling for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeKind {
    Bow,
    Throw,
}

/// Bow draw or throw wind-up in progress, for the charge bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChargeIndicator {
    pub kind: ChargeKind,
    pub progress: f32,
    pub x: f32,
    pub y: f32,
}

/// Mutable state owned by the loop and handed to sub-routines
#[derive(Debug, Default)]
pub struct SimContext {
    pub projectiles: Vec<Projectile>,
    pub attack_visuals: Vec<AttackVisual>,
    pub feedback: FeedbackLog,
    /// Item-list mutations waiting for the sync layer
    pub outbox: Vec<WorldRequest>,
    pub charge: Option<ChargeIndicator>,
}

impl SimContext {
    /// Put an item on the floor locally and queue it for the shared list
    pub fn spawn_item(&mut self, remote: &mut RemoteWorld, item: DroppedItem) {
        remote.items.push(item.clone());
        self.outbox.push(WorldRequest::AddItem(item));
    }
}

pub struct Engine {
    pub arena: Arena,
    pub ctx: SimContext,
    /// Where the local actor respawns
    home: (f32, f32),
    tick: u64,
}

impl Engine {
    pub fn new(arena: Arena) -> Self {
        let home = (arena.local.x, arena.local.y);
        Self {
            arena,
            ctx: SimContext::default(),
            home,
            tick: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn local(&self) -> &Character {
        &self.arena.local
    }

    /// Requests produced since the last drain
    pub fn drain_requests(&mut self) -> Vec<WorldRequest> {
        std::mem::take(&mut self.ctx.outbox)
    }

    /// Advance the simulation by `dt` seconds
    pub fn tick(&mut self, dt: f32, intents: &mut Intentions, remote: &mut RemoteWorld) {
        self.tick += 1;
        self.ctx.charge = None;

        if let Some(angle) = intents.take_aim() {
            if self.arena.local.is_alive {
                self.arena.local.face(angle);
            }
        }

        if self.arena.local.is_alive {
            self.resolve_local(dt, intents, remote);
        } else {
            intents.clear_requests();
            intents.click_target = None;
        }

        self.update_bots(dt, remote);
        self.update_projectiles(dt, remote);

        AttackVisual::age(&mut self.ctx.attack_visuals, dt);
        self.ctx.feedback.age(dt);
    }

    fn resolve_local(&mut self, dt: f32, intents: &mut Intentions, remote: &mut RemoteWorld) {
        self.arena.local.timers.decay(dt);
        self.resolve_movement(dt, intents, remote);
        self.arena
            .local
            .update_block(intents.block, dt, &mut self.ctx.feedback);
        self.resolve_attack(dt, intents, remote);
        let picked = self.resolve_pickup(intents, remote);
        self.resolve_throw(dt, intents, picked);
        self.resolve_dash(intents, remote);
        if intents.take_switch() && self.arena.local.can_act() {
            self.arena.local.switch_weapon(&mut self.ctx.feedback);
        }
        self.resolve_drop(intents, remote);
    }

    fn resolve_movement(&mut self, dt: f32, intents: &mut Intentions, remote: &RemoteWorld) {
        let arena = &mut self.arena;
        let id = arena.local.id;

        if intents.moving_directionally() {
            intents.click_target = None;
            let (dx, dy) = intents.move_vector();
            if dx == 0.0 && dy == 0.0 {
                return;
            }
            let blockers = arena.blockers_except(remote, id);
            arena.local.move_by(dx, dy, dt, &arena.obstacles, &blockers);
            return;
        }

        let Some((tx, ty)) = intents.click_target else {
            return;
        };
        if !arena.local.can_act() {
            return;
        }
        let distance = PhysicsSystem::distance(arena.local.x, arena.local.y, tx, ty);
        if distance > ARRIVAL_TOLERANCE {
            let angle = PhysicsSystem::angle_to(arena.local.x, arena.local.y, tx, ty);
            let blockers = arena.blockers_except(remote, id);
            arena
                .local
                .move_by(angle.cos(), angle.sin(), dt, &arena.obstacles, &blockers);
        } else {
            intents.click_target = None;
        }
    }

    fn resolve_attack(&mut self, dt: f32, intents: &Intentions, remote: &mut RemoteWorld) {
        let local = &mut self.arena.local;
        let weapon = local.weapon();

        if intents.attack && local.can_act() && local.timers.attack <= 0.0 {
            if let (true, Some(charge_time)) = (weapon.is_bow(), weapon.charge_time) {
                local.is_charging = true;
                local.charge_progress = (local.charge_progress + dt / charge_time).min(1.0);
                self.ctx.charge = Some(ChargeIndicator {
                    kind: ChargeKind::Bow,
                    progress: local.charge_progress,
                    x: local.x,
                    y: local.y,
                });
                return;
            }

            let origin = AttackOrigin::of(local, local.facing_angle());
            local.timers.attack = weapon.attack_cooldown;
            let step = local.advance_combo();
            let (x, y) = (local.x, local.y);
            self.ctx
                .feedback
                .push(format!("COMBO {}", step + 1), x, y - 1.0, FeedbackKind::Combo);
            self.ctx.feedback.push("ATTACK!", x, y + 0.5, FeedbackKind::Neutral);

            let mut roster = self.arena.roster(remote);
            let hits = CombatSystem::melee_strike(origin, roster.iter_mut(), &mut self.ctx);
            debug!(actor_id = %origin.attacker, weapon = %weapon.key, hits, "Melee swing");
            return;
        }

        if !intents.attack && local.is_charging {
            let charge = local.charge_progress;
            if local.can_act() {
                if charge >= MIN_RELEASE_CHARGE && local.arrows > 0 && local.timers.throw <= 0.0 {
                    if CombatSystem::fire_arrow(local, intents.aim_angle, charge, &mut self.ctx) {
                        local.timers.throw = weapon.attack_cooldown;
                    }
                } else if local.arrows == 0 {
                    self.ctx
                        .feedback
                        .push("No arrows!", local.x, local.y - 1.0, FeedbackKind::Warning);
                } else if local.timers.throw > 0.0 {
                    self.ctx
                        .feedback
                        .push("Bow reloading", local.x, local.y - 1.0, FeedbackKind::Warning);
                }
            }
            local.is_charging = false;
            local.charge_progress = 0.0;
        }
    }

    /// Collect the first eligible item in range. Returns true on pickup.
    fn resolve_pickup(&mut self, intents: &mut Intentions, remote: &mut RemoteWorld) -> bool {
        let local = &mut self.arena.local;
        if !intents.interact_available() || !local.can_act() || local.timers.pickup > 0.0 {
            return false;
        }

        let fx = &mut self.ctx.feedback;
        let mut collected = None;
        for item in &remote.items {
            if PhysicsSystem::distance(local.x, local.y, item.x, item.y) > PICKUP_RANGE {
                continue;
            }
            match item.item {
                ItemKind::Arrow if local.weapon().uses_arrows() => {
                    local.arrows += ARROW_BUNDLE;
                    fx.push(format!("+{ARROW_BUNDLE} arrows"), local.x, local.y, FeedbackKind::Positive);
                    collected = Some(item.id);
                    break;
                }
                ItemKind::Weapon(key) if key.stats().is_throwable => {
                    if local.inventory.len() >= MAX_INVENTORY {
                        fx.push("Inventory full!", local.x, local.y, FeedbackKind::Warning);
                        local.timers.pickup = PICKUP_COOLDOWN;
                        break;
                    }
                    local.add_to_inventory(key);
                    fx.push(
                        format!("Picked up {}", key.stats().name),
                        local.x,
                        local.y,
                        FeedbackKind::Positive,
                    );
                    collected = Some(item.id);
                    break;
                }
                _ => {}
            }
        }

        let Some(id) = collected else {
            return false;
        };
        local.timers.pickup = PICKUP_COOLDOWN;
        remote.take_item(id);
        self.ctx.outbox.push(WorldRequest::RemoveItem(id));
        intents.consume_interact();
        debug!(actor_id = %local.id, item_id = %id, "Item picked up");
        true
    }

    fn resolve_throw(&mut self, dt: f32, intents: &Intentions, picked: bool) {
        let local = &mut self.arena.local;

        if intents.interact_available()
            && !picked
            && local.can_act()
            && local.weapon().can_be_thrown()
            && local.timers.throw <= 0.0
        {
            local.is_throwing = true;
            local.throw_charge = (local.throw_charge + dt).min(1.0);
            self.ctx.charge = Some(ChargeIndicator {
                kind: ChargeKind::Throw,
                progress: local.throw_charge,
                x: local.x,
                y: local.y,
            });
            return;
        }

        if !intents.interact && local.is_throwing {
            let charge = local.throw_charge;
            if local.can_act() && charge >= MIN_RELEASE_CHARGE && local.timers.throw <= 0.0 {
                if let Some(thrown) = CombatSystem::throw_weapon(local, intents.aim_angle, charge, &mut self.ctx) {
                    local.timers.throw = thrown.attack_cooldown * THROW_COOLDOWN_FACTOR;
                }
            } else if local.timers.throw > 0.0 {
                self.ctx
                    .feedback
                    .push("Throw reloading", local.x, local.y - 1.0, FeedbackKind::Warning);
            }
            local.is_throwing = false;
            local.throw_charge = 0.0;
        }
    }

    fn resolve_dash(&mut self, intents: &mut Intentions, remote: &RemoteWorld) {
        if !intents.take_dash() {
            return;
        }
        let arena = &mut self.arena;
        let local = &arena.local;
        if !local.can_act() || local.timers.dash > 0.0 {
            return;
        }

        let tx = local.x + local.direction.0 * DASH_DISTANCE;
        let ty = local.y + local.direction.1 * DASH_DISTANCE;
        let blockers = arena.blockers_except(remote, local.id);
        if PhysicsSystem::actor_blocked(tx, ty, &arena.obstacles, &blockers) {
            self.ctx
                .feedback
                .push("Path blocked!", local.x, local.y, FeedbackKind::Warning);
        } else {
            arena.local.do_dash(tx, ty, &mut self.ctx.feedback);
        }
    }

    fn resolve_drop(&mut self, intents: &mut Intentions, remote: &mut RemoteWorld) {
        if !intents.take_drop() {
            return;
        }
        let local = &mut self.arena.local;
        if !local.can_act() || local.timers.pickup > 0.0 || local.weapon_key() == WeaponKey::BareHands {
            return;
        }
        let Some(key) = local.drop_active_weapon(&mut self.ctx.feedback) else {
            return;
        };
        let item = DroppedItem::new(local.x, local.y, ItemKind::Weapon(key));
        self.ctx.feedback.push(
            format!("Dropped {}", key.stats().name),
            local.x,
            local.y,
            FeedbackKind::Positive,
        );
        local.timers.pickup = PICKUP_COOLDOWN;
        self.ctx.spawn_item(remote, item);
    }

    fn update_bots(&mut self, dt: f32, remote: &mut RemoteWorld) {
        let local = &self.arena.local;
        let target = local.is_alive.then_some((local.x, local.y));

        for index in 0..self.arena.bots.len() {
            let action = BotBrain::decide(&mut self.arena.bots[index], target, dt);
            match action {
                BotAction::Idle => {}
                BotAction::Respawned(stuck) => {
                    let (x, y) = (self.arena.bots[index].x, self.arena.bots[index].y);
                    for key in stuck {
                        self.ctx
                            .spawn_item(remote, DroppedItem::new(x, y, ItemKind::Weapon(key)));
                    }
                }
                BotAction::Pursue { angle } => {
                    let id = self.arena.bots[index].id;
                    let blockers = self.arena.blockers_except(remote, id);
                    let arena = &mut self.arena;
                    arena.bots[index].move_by(angle.cos(), angle.sin(), dt, &arena.obstacles, &blockers);
                }
                BotAction::Attack { style, angle } => {
                    let cooldown = self.arena.bots[index].weapon().attack_cooldown;
                    match style {
                        AttackStyle::Melee => {
                            let origin = AttackOrigin::of(&self.arena.bots[index], angle);
                            let mut roster = self.arena.roster(remote);
                            CombatSystem::melee_strike(origin, roster.iter_mut(), &mut self.ctx);
                        }
                        AttackStyle::Bow => {
                            CombatSystem::fire_arrow(&mut self.arena.bots[index], angle, 1.0, &mut self.ctx);
                        }
                        AttackStyle::Throw => {
                            CombatSystem::throw_weapon(&mut self.arena.bots[index], angle, 1.0, &mut self.ctx);
                        }
                    }
                    self.arena.bots[index].timers.attack = cooldown;
                }
            }
        }
    }

    fn update_projectiles(&mut self, dt: f32, remote: &mut RemoteWorld) {
        let mut projectiles = std::mem::take(&mut self.ctx.projectiles);

        for projectile in projectiles.iter_mut() {
            let event = {
                let (mut roster, obstacles) = self.arena.roster_and_obstacles(remote);
                projectile.update(dt, obstacles, roster.iter_mut(), &mut self.ctx.feedback)
            };
            if event != ProjectileEvent::Expired || projectile.has_hit {
                continue;
            }
            if let ItemKind::Weapon(key) = projectile.item {
                let (x, y) = PhysicsSystem::clamp_to_grid(projectile.x, projectile.y, 0.0);
                let item = DroppedItem::new(x, y, ItemKind::Weapon(key));
                self.ctx.spawn_item(remote, item);
            }
        }

        projectiles.retain(|projectile| !projectile.is_done());
        projectiles.append(&mut self.ctx.projectiles);
        self.ctx.projectiles = projectiles;
    }

    /// Bring the local actor back at its home position, dropping any weapons
    /// stuck to it
    pub fn respawn_local(&mut self, class_key: ClassKey, remote: &mut RemoteWorld) {
        let (x, y) = self.home;
        let stuck = self.arena.local.respawn(x, y, class_key);
        for key in stuck {
            self.ctx
                .spawn_item(remote, DroppedItem::new(x, y, ItemKind::Weapon(key)));
        }
    }

    /// Switch the local actor to another class without respawning
    pub fn change_class(&mut self, class_key: ClassKey) {
        self.arena.local.setup_class(class_key);
    }
}
