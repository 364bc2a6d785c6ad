//! Character entity shared by players, bots and the training dummy

use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::combat::{FeedbackKind, FeedbackLog};
use super::constants::{BLOCK_BREAK_STUN, BLOCK_REGEN_DIVISOR, DASH_COOLDOWN, STARTING_ARROWS};
use super::physics::{Obstacle, PhysicsSystem, ACTOR_HALF};
use super::weapons::{ClassKey, Weapon, WeaponKey};

/// Which behaviour drives a character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// Human-controlled (local or remote)
    Player,
    /// Driven by the pursue-or-attack AI
    Bot,
    /// Static training target, never loses health
    Dummy,
}

/// Observable combat state, derived from flags and timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorState {
    Idle,
    Blocking,
    Charging,
    Throwing,
    Stunned,
    Dead,
}

/// Countdown timers, all non-negative and decayed toward zero each tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Timers {
    pub attack: f32,
    pub throw: f32,
    pub dash: f32,
    pub pickup: f32,
    pub stun: f32,
}

impl Timers {
    pub fn decay(&mut self, dt: f32) {
        self.attack = (self.attack - dt).max(0.0);
        self.throw = (self.throw - dt).max(0.0);
        self.dash = (self.dash - dt).max(0.0);
        self.pickup = (self.pickup - dt).max(0.0);
        self.stun = (self.stun - dt).max(0.0);
    }
}

#[derive(Debug, Clone)]
pub struct Character {
    pub id: Uuid,
    pub kind: ActorKind,
    pub name: String,
    pub class_key: ClassKey,
    pub color: String,
    /// Centre of the actor, in grid units
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub max_health: f32,
    /// Grid units per second
    pub speed: f32,
    /// Unit facing vector
    pub direction: (f32, f32),
    /// Never empty; bare hands is the fallback
    pub inventory: Vec<WeaponKey>,
    pub active_weapon: usize,
    pub block_bar: f32,
    pub arrows: u32,
    pub timers: Timers,
    pub is_alive: bool,
    pub is_blocking: bool,
    pub is_charging: bool,
    pub is_throwing: bool,
    /// Bow draw, 0..=1
    pub charge_progress: f32,
    /// Throw wind-up, 0..=1
    pub throw_charge: f32,
    pub combo_step: usize,
    /// Foreign weapons stuck to the body by projectile hits
    pub attached_weapons: Vec<WeaponKey>,
}

impl Character {
    pub fn new(
        id: Uuid,
        kind: ActorKind,
        name: impl Into<String>,
        class_key: ClassKey,
        color: impl Into<String>,
        x: f32,
        y: f32,
    ) -> Self {
        let stats = class_key.stats();
        let mut character = Self {
            id,
            kind,
            name: name.into(),
            class_key,
            color: color.into(),
            x,
            y,
            health: stats.max_health,
            max_health: stats.max_health,
            speed: stats.speed,
            direction: (0.0, 1.0),
            inventory: Vec::new(),
            active_weapon: 0,
            block_bar: 0.0,
            arrows: 0,
            timers: Timers::default(),
            is_alive: true,
            is_blocking: false,
            is_charging: false,
            is_throwing: false,
            charge_progress: 0.0,
            throw_charge: 0.0,
            combo_step: 0,
            attached_weapons: Vec::new(),
        };
        character.setup_class(class_key);
        character
    }

    pub fn dummy(x: f32, y: f32) -> Self {
        Self::new(Uuid::new_v4(), ActorKind::Dummy, "Dummy", ClassKey::default(), "#a0aec0", x, y)
    }

    pub fn weapon_key(&self) -> WeaponKey {
        self.inventory
            .get(self.active_weapon)
            .copied()
            .unwrap_or(WeaponKey::BareHands)
    }

    pub fn weapon(&self) -> &'static Weapon {
        self.weapon_key().stats()
    }

    pub fn facing_angle(&self) -> f32 {
        self.direction.1.atan2(self.direction.0)
    }

    pub fn face(&mut self, angle: f32) {
        self.direction = (angle.cos(), angle.sin());
    }

    pub fn is_stunned(&self) -> bool {
        self.timers.stun > 0.0
    }

    /// Alive and not stunned
    pub fn can_act(&self) -> bool {
        self.is_alive && !self.is_stunned()
    }

    pub fn state(&self) -> ActorState {
        if !self.is_alive {
            ActorState::Dead
        } else if self.is_stunned() {
            ActorState::Stunned
        } else if self.is_blocking {
            ActorState::Blocking
        } else if self.is_charging {
            ActorState::Charging
        } else if self.is_throwing {
            ActorState::Throwing
        } else {
            ActorState::Idle
        }
    }

    /// Apply class attributes and rebuild the inventory from the class loadout
    pub fn setup_class(&mut self, class_key: ClassKey) {
        let stats = class_key.stats();
        self.class_key = class_key;
        self.max_health = stats.max_health;
        self.speed = stats.speed;
        // Only respawn revives a dead actor
        self.health = if self.is_alive { self.health.min(self.max_health) } else { 0.0 };
        self.inventory = stats.starting_weapons.to_vec();
        if self.inventory.is_empty() {
            self.inventory.push(WeaponKey::BareHands);
        }
        self.active_weapon = 0;
        self.equip_active();
    }

    /// Re-derive weapon-bound state after the active slot changed
    fn equip_active(&mut self) {
        let weapon = self.weapon();
        self.block_bar = weapon.block_value;
        self.arrows = if weapon.uses_arrows() { STARTING_ARROWS } else { 0 };
        self.combo_step = 0;
        self.is_charging = false;
        self.charge_progress = 0.0;
        self.is_throwing = false;
        self.throw_charge = 0.0;
    }

    /// Rotate to the next inventory slot; refuses when only one weapon is held
    pub fn switch_weapon(&mut self, fx: &mut FeedbackLog) -> bool {
        if self.inventory.len() <= 1 {
            fx.push("Only one weapon!", self.x, self.y, FeedbackKind::Warning);
            return false;
        }
        self.active_weapon = (self.active_weapon + 1) % self.inventory.len();
        self.equip_active();
        fx.push(format!("Weapon: {}", self.weapon().name), self.x, self.y, FeedbackKind::Positive);
        true
    }

    /// Remove the active weapon from the inventory and hand its key back
    pub fn drop_active_weapon(&mut self, fx: &mut FeedbackLog) -> Option<WeaponKey> {
        if self.weapon_key() == WeaponKey::BareHands {
            fx.push("Can't drop bare hands!", self.x, self.y, FeedbackKind::Warning);
            return None;
        }
        let dropped = self.inventory.remove(self.active_weapon);
        if self.inventory.is_empty() {
            self.inventory.push(WeaponKey::BareHands);
        }
        self.active_weapon %= self.inventory.len();
        self.equip_active();
        Some(dropped)
    }

    pub fn add_to_inventory(&mut self, key: WeaponKey) {
        if self.inventory == [WeaponKey::BareHands] {
            self.inventory[0] = key;
            self.active_weapon = 0;
            self.equip_active();
        } else {
            self.inventory.push(key);
        }
    }

    pub fn take_damage(
        &mut self,
        amount: f32,
        attacker: Option<Uuid>,
        direction: Option<f32>,
        fx: &mut FeedbackLog,
    ) {
        if !self.is_alive || amount <= 0.0 {
            return;
        }
        debug!(target_id = %self.id, attacker = ?attacker, direction = ?direction, amount, "Damage incoming");

        if self.kind == ActorKind::Dummy {
            fx.push(format!("{:.1}", amount), self.x, self.y, FeedbackKind::Damage);
            return;
        }

        let mut remaining = amount;
        if self.is_blocking && self.block_bar > 0.0 {
            let blocked = self.block_bar.min(amount);
            self.block_bar -= blocked;
            remaining -= blocked;
            fx.push("Blocked!", self.x, self.y, FeedbackKind::Block);
            if self.block_bar <= 0.0 {
                self.block_bar = 0.0;
                self.break_guard(fx);
            }
        }

        if remaining > 0.0 {
            self.health = (self.health - remaining).max(0.0);
            fx.push(format!("-{:.1}", remaining), self.x, self.y, FeedbackKind::Damage);
        }

        if self.health <= 0.0 {
            self.health = 0.0;
            self.is_alive = false;
            self.is_blocking = false;
            self.is_charging = false;
            self.is_throwing = false;
            fx.push("Defeated!", self.x, self.y, FeedbackKind::Death);
            info!(actor_id = %self.id, name = %self.name, "Actor defeated");
        }
    }

    /// Damage from a projectile; thrown weapons stay stuck to the target
    pub fn take_projectile_hit(
        &mut self,
        damage: f32,
        owner: Uuid,
        heading: f32,
        stuck: Option<WeaponKey>,
        fx: &mut FeedbackLog,
    ) {
        if !self.is_alive {
            return;
        }
        self.take_damage(damage, Some(owner), Some(heading), fx);
        fx.push("Hit!", self.x, self.y, FeedbackKind::Damage);
        if let Some(key) = stuck {
            self.attach_weapon(key, fx);
        }
    }

    pub fn attach_weapon(&mut self, key: WeaponKey, fx: &mut FeedbackLog) {
        self.attached_weapons.push(key);
        fx.push("Weapon stuck!", self.x, self.y, FeedbackKind::Neutral);
    }

    /// Drain or refill the block bar for this tick
    pub fn update_block(&mut self, held: bool, dt: f32, fx: &mut FeedbackLog) {
        let weapon = self.weapon();
        if held && weapon.block_value > 0.0 && self.block_bar > 0.0 && !self.is_stunned() {
            self.is_blocking = true;
            self.block_bar = (self.block_bar - weapon.block_cost * dt).max(0.0);
            if self.block_bar <= 0.0 {
                self.break_guard(fx);
            }
        } else {
            self.is_blocking = false;
            if self.block_bar < weapon.block_value {
                let regen = weapon.block_value / BLOCK_REGEN_DIVISOR * dt;
                self.block_bar = (self.block_bar + regen).min(weapon.block_value);
            }
        }
    }

    fn break_guard(&mut self, fx: &mut FeedbackLog) {
        self.is_blocking = false;
        self.timers.stun = BLOCK_BREAK_STUN;
        fx.push("Barrier broken!", self.x, self.y, FeedbackKind::Warning);
    }

    /// Advance the combo and return the new step
    pub fn advance_combo(&mut self) -> usize {
        self.combo_step = (self.combo_step + 1) % self.weapon().combo_len();
        self.combo_step
    }

    /// Bring the character back to life, returning foreign weapons to drop
    pub fn respawn(&mut self, x: f32, y: f32, class_key: ClassKey) -> Vec<WeaponKey> {
        let stuck = std::mem::take(&mut self.attached_weapons);
        let (x, y) = PhysicsSystem::clamp_to_grid(x, y, ACTOR_HALF);
        self.x = x;
        self.y = y;
        self.setup_class(class_key);
        self.health = self.max_health;
        self.is_alive = true;
        self.is_blocking = false;
        self.timers = Timers::default();
        info!(actor_id = %self.id, name = %self.name, class = %class_key, "Actor respawned");
        stuck
    }

    /// Move along a direction, committing each axis only if it stays clear
    pub fn move_by(
        &mut self,
        dir_x: f32,
        dir_y: f32,
        dt: f32,
        obstacles: &[Obstacle],
        others: &[(f32, f32)],
    ) {
        if !self.can_act() || self.kind == ActorKind::Dummy {
            return;
        }

        let new_x = self.x + dir_x * self.speed * dt;
        let new_y = self.y + dir_y * self.speed * dt;

        if !PhysicsSystem::actor_blocked(new_x, self.y, obstacles, others) {
            self.x = new_x;
        }
        if !PhysicsSystem::actor_blocked(self.x, new_y, obstacles, others) {
            self.y = new_y;
        }

        if dir_x != 0.0 || dir_y != 0.0 {
            self.face(dir_y.atan2(dir_x));
        }
    }

    /// Teleport to a pre-validated target and start the dash cooldown
    pub fn do_dash(&mut self, x: f32, y: f32, fx: &mut FeedbackLog) {
        self.x = x;
        self.y = y;
        self.timers.dash = DASH_COOLDOWN;
        fx.push("DASH!", self.x, self.y, FeedbackKind::Positive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn swordsman() -> Character {
        Character::new(Uuid::new_v4(), ActorKind::Player, "p1", ClassKey::Swordsman, "#fff", 5.0, 5.0)
    }

    fn assert_invariants(c: &Character) {
        assert!(c.health >= 0.0 && c.health <= c.max_health);
        assert_eq!(c.is_alive, c.health > 0.0);
        assert!(c.block_bar >= 0.0 && c.block_bar <= c.weapon().block_value);
        assert!(!c.inventory.is_empty());
    }

    #[test]
    fn new_character_uses_class_loadout() {
        let c = swordsman();
        assert_eq!(c.inventory, vec![WeaponKey::Sword, WeaponKey::Knife]);
        assert_relative_eq!(c.max_health, 4.0);
        assert_relative_eq!(c.block_bar, 4.0);
        assert_eq!(c.arrows, 0);
        assert_invariants(&c);
    }

    #[test]
    fn hunter_starts_with_ten_arrows() {
        let c = Character::new(Uuid::new_v4(), ActorKind::Bot, "b", ClassKey::Hunter, "#000", 2.0, 2.0);
        assert_eq!(c.weapon_key(), WeaponKey::BowAndArrow);
        assert_eq!(c.arrows, 10);
    }

    #[test]
    fn zero_damage_changes_nothing() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.take_damage(0.0, None, None, &mut fx);
        assert_relative_eq!(c.health, 4.0);
        assert!(c.is_alive);
        assert!(fx.entries().is_empty());
    }

    #[test]
    fn blocking_absorbs_then_breaks_guard() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.is_blocking = true;
        c.block_bar = 2.0;
        c.take_damage(3.0, None, None, &mut fx);
        assert_relative_eq!(c.block_bar, 0.0);
        assert_relative_eq!(c.health, 3.0);
        assert_relative_eq!(c.timers.stun, 1.0);
        assert!(!c.is_blocking);
        assert_invariants(&c);
    }

    #[test]
    fn partial_block_keeps_guard_up() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.is_blocking = true;
        c.block_bar = 3.0;
        c.take_damage(1.0, None, None, &mut fx);
        assert_relative_eq!(c.block_bar, 2.0);
        assert_relative_eq!(c.health, 4.0);
        assert!(c.is_blocking);
        assert!(!c.is_stunned());
    }

    #[test]
    fn lethal_damage_floors_health() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.take_damage(10.0, None, None, &mut fx);
        assert_relative_eq!(c.health, 0.0);
        assert!(!c.is_alive);
        assert_eq!(c.state(), ActorState::Dead);
        assert!(fx.entries().iter().any(|f| f.kind == FeedbackKind::Death));

        c.take_damage(1.0, None, None, &mut fx);
        assert_relative_eq!(c.health, 0.0);
    }

    #[test]
    fn dummy_shows_damage_but_never_loses_health() {
        let mut dummy = Character::dummy(10.0, 8.0);
        let mut fx = FeedbackLog::default();
        dummy.take_damage(3.0, None, None, &mut fx);
        assert_relative_eq!(dummy.health, dummy.max_health);
        assert_eq!(fx.entries()[0].text, "3.0");
    }

    #[test]
    fn dropping_bare_hands_returns_none() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.inventory = vec![WeaponKey::BareHands];
        c.active_weapon = 0;
        assert_eq!(c.drop_active_weapon(&mut fx), None);
        assert_eq!(c.inventory, vec![WeaponKey::BareHands]);
    }

    #[test]
    fn dropping_last_weapon_falls_back_to_bare_hands() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        assert_eq!(c.drop_active_weapon(&mut fx), Some(WeaponKey::Sword));
        assert_eq!(c.weapon_key(), WeaponKey::Knife);
        assert_eq!(c.drop_active_weapon(&mut fx), Some(WeaponKey::Knife));
        assert_eq!(c.inventory, vec![WeaponKey::BareHands]);
        assert_invariants(&c);
    }

    #[test]
    fn switch_weapon_rotates_and_resets_combo() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.combo_step = 3;
        assert!(c.switch_weapon(&mut fx));
        assert_eq!(c.weapon_key(), WeaponKey::Knife);
        assert_eq!(c.combo_step, 0);
        assert!(c.switch_weapon(&mut fx));
        assert_eq!(c.weapon_key(), WeaponKey::Sword);
    }

    #[test]
    fn switch_with_single_weapon_warns() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.inventory = vec![WeaponKey::Dagger];
        assert!(!c.switch_weapon(&mut fx));
        assert_eq!(fx.entries()[0].kind, FeedbackKind::Warning);
    }

    #[test]
    fn combo_cycles_through_weapon_sequence() {
        let mut c = swordsman();
        let len = c.weapon().combo.len();
        for n in 1..=12 {
            c.advance_combo();
            assert_eq!(c.combo_step, n % len);
        }
    }

    #[test]
    fn respawn_returns_attached_weapons_and_restores_health() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.attach_weapon(WeaponKey::Dagger, &mut fx);
        c.take_damage(10.0, None, None, &mut fx);
        let drops = c.respawn(2.0, 2.0, ClassKey::Hoplite);
        assert_eq!(drops, vec![WeaponKey::Dagger]);
        assert!(c.attached_weapons.is_empty());
        assert!(c.is_alive);
        assert_relative_eq!(c.health, 5.0);
        assert_eq!(c.inventory, vec![WeaponKey::Lance, WeaponKey::Shield]);
        assert_invariants(&c);
    }

    #[test]
    fn move_commits_free_axis_only() {
        let mut c = swordsman();
        c.x = 4.5;
        c.y = 5.5;
        let obstacles = [Obstacle::new(5.0, 5.0)];
        // speed 3 * dt 0.1 = 0.3 per axis
        c.move_by(1.0, 1.0, 0.1, &obstacles, &[]);
        assert_relative_eq!(c.x, 4.5);
        assert_relative_eq!(c.y, 5.8, epsilon = 1e-5);
    }

    #[test]
    fn move_is_noop_while_stunned() {
        let mut c = swordsman();
        c.timers.stun = 0.5;
        c.move_by(1.0, 0.0, 0.1, &[], &[]);
        assert_relative_eq!(c.x, 5.0);
    }

    #[test]
    fn block_drain_breaks_guard_and_stuns() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.block_bar = 0.1;
        c.update_block(true, 0.1, &mut fx);
        assert_relative_eq!(c.block_bar, 0.0);
        assert!(!c.is_blocking);
        assert_relative_eq!(c.timers.stun, 1.0);
    }

    #[test]
    fn block_regenerates_when_released() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.block_bar = 1.0;
        c.update_block(false, 1.0, &mut fx);
        // sword: blockValue 4 regenerates at 4 / 5 per second
        assert_relative_eq!(c.block_bar, 1.8, epsilon = 1e-5);
    }

    #[test]
    fn dash_sets_cooldown() {
        let mut c = swordsman();
        let mut fx = FeedbackLog::default();
        c.do_dash(8.0, 5.0, &mut fx);
        assert_relative_eq!(c.x, 8.0);
        assert_relative_eq!(c.timers.dash, DASH_COOLDOWN);
    }
}
