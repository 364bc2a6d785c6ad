//! Attack primitives and the ephemeral combat annotations they produce

use serde::Serialize;
use uuid::Uuid;

use super::character::Character;
use super::constants::{
    ATTACK_VISUAL_LIFETIME, CELL_SIZE, CHARGE_DAMAGE_BONUS, COMBAT_FEEDBACK_LIFETIME,
    FEEDBACK_RISE_SPEED,
};
use super::engine::SimContext;
use super::physics::{PhysicsSystem, ACTOR_HALF};
use super::projectile::Projectile;
use super::weapons::{ItemKind, Weapon};

/// Visual category of a floating combat text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Damage,
    Block,
    Parry,
    Positive,
    Warning,
    Death,
    Combo,
    Neutral,
    Hit,
}

/// Colour, font size (px) and initial vertical offset (px) for a kind
#[derive(Debug, Clone, Copy)]
pub struct FeedbackStyle {
    pub color: &'static str,
    pub font_size: u32,
    pub offset_y: f32,
}

impl FeedbackKind {
    pub fn style(self) -> FeedbackStyle {
        let (color, font_size, offset_y) = match self {
            FeedbackKind::Damage => ("#f56565", 20, -40.0),
            FeedbackKind::Block => ("#63b3ed", 18, -40.0),
            FeedbackKind::Parry => ("#a0aec0", 22, -50.0),
            FeedbackKind::Positive => ("#48bb78", 16, -30.0),
            FeedbackKind::Warning => ("#ecc94b", 16, -30.0),
            FeedbackKind::Death => ("#e53e3e", 24, -60.0),
            FeedbackKind::Combo => ("#9f7aea", 18, -30.0),
            FeedbackKind::Neutral => ("#cbd5e0", 16, -30.0),
            FeedbackKind::Hit => ("#edf2f7", 16, -30.0),
        };
        FeedbackStyle {
            color,
            font_size,
            offset_y,
        }
    }
}

/// Floating text above an actor
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatFeedback {
    pub id: u64,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub kind: FeedbackKind,
    pub color: &'static str,
    pub font_size: u32,
    pub offset_y: f32,
    pub life: f32,
    pub opacity: f32,
}

/// Combat feedback owned by the simulation, aged every tick
#[derive(Debug, Default)]
pub struct FeedbackLog {
    entries: Vec<CombatFeedback>,
    next_id: u64,
}

impl FeedbackLog {
    pub fn push(&mut self, text: impl Into<String>, x: f32, y: f32, kind: FeedbackKind) {
        let style = kind.style();
        self.next_id += 1;
        self.entries.push(CombatFeedback {
            id: self.next_id,
            text: text.into(),
            x,
            y,
            kind,
            color: style.color,
            font_size: style.font_size,
            offset_y: style.offset_y,
            life: COMBAT_FEEDBACK_LIFETIME,
            opacity: 1.0,
        });
    }

    /// Float entries upward, fade them out and drop the expired ones
    pub fn age(&mut self, dt: f32) {
        for entry in &mut self.entries {
            entry.life -= dt;
            entry.offset_y -= FEEDBACK_RISE_SPEED * dt;
            entry.opacity = (entry.life / COMBAT_FEEDBACK_LIFETIME).max(0.0);
        }
        self.entries.retain(|entry| entry.life > 0.0);
    }

    pub fn entries(&self) -> &[CombatFeedback] {
        &self.entries
    }
}

/// Short-lived melee swing rectangle
#[derive(Debug, Clone, Serialize)]
pub struct AttackVisual {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub range: f32,
    pub life: f32,
}

impl AttackVisual {
    /// Visuals fade at twice real time
    pub fn age(visuals: &mut Vec<AttackVisual>, dt: f32) {
        for visual in visuals.iter_mut() {
            visual.life -= dt * 2.0;
        }
        visuals.retain(|visual| visual.life > 0.0);
    }
}

/// Attacker data captured before the target scan so the attacker itself
/// can live in the same roster as its targets
#[derive(Debug, Clone, Copy)]
pub struct AttackOrigin {
    pub attacker: Uuid,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub weapon: &'static Weapon,
}

impl AttackOrigin {
    pub fn of(attacker: &Character, angle: f32) -> Self {
        Self {
            attacker: attacker.id,
            x: attacker.x,
            y: attacker.y,
            angle,
            weapon: attacker.weapon(),
        }
    }
}

/// Combat system for resolving swings, shots and throws
pub struct CombatSystem;

impl CombatSystem {
    /// Damage scaled by a 0..=1 charge
    pub fn charged_damage(base: f32, charge: f32) -> f32 {
        base * (1.0 + CHARGE_DAMAGE_BONUS * charge)
    }

    /// Swing in a cone and hit every living target inside it.
    /// Returns the number of targets hit.
    pub fn melee_strike<'a>(
        origin: AttackOrigin,
        targets: impl Iterator<Item = &'a mut Character>,
        ctx: &mut SimContext,
    ) -> usize {
        let weapon = origin.weapon;
        ctx.attack_visuals.push(AttackVisual {
            x: origin.x,
            y: origin.y,
            angle: origin.angle,
            range: weapon.range,
            life: ATTACK_VISUAL_LIFETIME,
        });

        let mut hits = 0;
        for target in targets {
            if target.id == origin.attacker || !target.is_alive {
                continue;
            }
            if !PhysicsSystem::in_attack_cone(origin.x, origin.y, origin.angle, target.x, target.y, weapon.range) {
                continue;
            }
            hits += 1;
            let heading = PhysicsSystem::angle_to(origin.x, origin.y, target.x, target.y);
            target.take_damage(weapon.damage, Some(origin.attacker), Some(heading), &mut ctx.feedback);

            if weapon.knockback != 0.0 {
                let push = weapon.knockback / CELL_SIZE;
                let (x, y) = PhysicsSystem::clamp_to_grid(
                    target.x + heading.cos() * push,
                    target.y + heading.sin() * push,
                    ACTOR_HALF,
                );
                target.x = x;
                target.y = y;
            }
        }

        if hits > 0 {
            ctx.feedback.push("Hit!", origin.x, origin.y + 1.0, FeedbackKind::Hit);
        }
        hits
    }

    /// Loose an arrow along `angle`. Returns false when out of ammo.
    pub fn fire_arrow(shooter: &mut Character, angle: f32, charge: f32, ctx: &mut SimContext) -> bool {
        if shooter.arrows == 0 {
            ctx.feedback.push("No arrows!", shooter.x, shooter.y, FeedbackKind::Warning);
            return false;
        }
        let weapon = shooter.weapon();
        let (start_x, start_y) = Self::muzzle(shooter);
        ctx.projectiles.push(Projectile::new(
            shooter.id,
            start_x,
            start_y,
            angle,
            weapon.throw_range,
            Self::charged_damage(weapon.damage, charge),
            ItemKind::Arrow,
        ));
        shooter.arrows -= 1;
        ctx.feedback.push("-1 arrow", shooter.x, shooter.y, FeedbackKind::Neutral);
        true
    }

    /// Throw the active weapon. Returns the thrown weapon's stats, or `None`
    /// when the active weapon cannot be thrown.
    pub fn throw_weapon(
        thrower: &mut Character,
        angle: f32,
        charge: f32,
        ctx: &mut SimContext,
    ) -> Option<&'static Weapon> {
        let weapon = thrower.weapon();
        if !weapon.can_be_thrown() {
            ctx.feedback.push("Can't throw that!", thrower.x, thrower.y, FeedbackKind::Warning);
            return None;
        }
        let (start_x, start_y) = Self::muzzle(thrower);
        let key = thrower.drop_active_weapon(&mut ctx.feedback)?;

        ctx.projectiles.push(Projectile::new(
            thrower.id,
            start_x,
            start_y,
            angle,
            weapon.throw_range * charge,
            Self::charged_damage(weapon.damage, charge),
            ItemKind::Weapon(key),
        ));
        ctx.feedback.push(
            format!("Threw {}", weapon.name),
            thrower.x,
            thrower.y,
            FeedbackKind::Positive,
        );
        Some(weapon)
    }

    /// Spawn point half a body-width along the facing vector
    fn muzzle(actor: &Character) -> (f32, f32) {
        (
            actor.x + actor.direction.0 * ACTOR_HALF,
            actor.y + actor.direction.1 * ACTOR_HALF,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::ActorKind;
    use crate::game::weapons::{ClassKey, WeaponKey};
    use approx::assert_relative_eq;

    fn actor(class: ClassKey, x: f32, y: f32) -> Character {
        Character::new(Uuid::new_v4(), ActorKind::Player, "a", class, "#fff", x, y)
    }

    #[test]
    fn melee_hits_inside_cone_only() {
        let attacker = actor(ClassKey::Swordsman, 5.0, 5.0);
        let mut front = actor(ClassKey::Swordsman, 6.0, 5.0);
        let mut side = actor(ClassKey::Swordsman, 5.0, 7.0);
        let mut ctx = SimContext::default();

        let origin = AttackOrigin::of(&attacker, 0.0);
        let hits = CombatSystem::melee_strike(origin, [&mut front, &mut side].into_iter(), &mut ctx);

        assert_eq!(hits, 1);
        assert_relative_eq!(front.health, 3.0);
        assert_relative_eq!(side.health, 4.0);
        assert_eq!(ctx.attack_visuals.len(), 1);
    }

    #[test]
    fn melee_can_hit_several_targets() {
        let attacker = actor(ClassKey::Hoplite, 5.0, 5.0);
        let mut a = actor(ClassKey::Swordsman, 6.0, 5.0);
        let mut b = actor(ClassKey::Swordsman, 7.5, 5.2);
        let mut ctx = SimContext::default();

        let origin = AttackOrigin::of(&attacker, 0.0);
        let hits = CombatSystem::melee_strike(origin, [&mut a, &mut b].into_iter(), &mut ctx);
        assert_eq!(hits, 2);
    }

    #[test]
    fn melee_skips_the_attacker_itself() {
        let mut attacker = actor(ClassKey::Swordsman, 5.0, 5.0);
        let mut ctx = SimContext::default();
        let origin = AttackOrigin::of(&attacker, 0.0);
        let hits = CombatSystem::melee_strike(origin, std::iter::once(&mut attacker), &mut ctx);
        assert_eq!(hits, 0);
        assert_relative_eq!(attacker.health, 4.0);
    }

    #[test]
    fn arrow_consumes_ammo_and_scales_damage() {
        let mut hunter = actor(ClassKey::Hunter, 5.0, 5.0);
        let mut ctx = SimContext::default();
        assert!(CombatSystem::fire_arrow(&mut hunter, 0.0, 1.0, &mut ctx));
        assert_eq!(hunter.arrows, 9);
        assert_eq!(ctx.projectiles.len(), 1);
        assert_relative_eq!(ctx.projectiles[0].damage, 1.5);
        assert_relative_eq!(ctx.projectiles[0].max_distance, 18.0);
    }

    #[test]
    fn arrow_without_ammo_warns() {
        let mut hunter = actor(ClassKey::Hunter, 5.0, 5.0);
        hunter.arrows = 0;
        let mut ctx = SimContext::default();
        assert!(!CombatSystem::fire_arrow(&mut hunter, 0.0, 1.0, &mut ctx));
        assert!(ctx.projectiles.is_empty());
        assert_eq!(ctx.feedback.entries()[0].kind, FeedbackKind::Warning);
    }

    #[test]
    fn throw_uses_thrown_weapon_stats_and_drops_it() {
        let mut c = actor(ClassKey::Hoplite, 5.0, 5.0);
        let mut ctx = SimContext::default();
        let thrown = CombatSystem::throw_weapon(&mut c, 0.0, 0.5, &mut ctx);
        assert_eq!(thrown.map(|w| w.key), Some(WeaponKey::Lance));
        assert_eq!(c.inventory, vec![WeaponKey::Shield]);
        let projectile = &ctx.projectiles[0];
        assert_relative_eq!(projectile.max_distance, 4.0);
        assert_relative_eq!(projectile.damage, 0.8 * 1.25);
        assert_eq!(projectile.item, ItemKind::Weapon(WeaponKey::Lance));
    }

    #[test]
    fn bow_cannot_be_thrown() {
        let mut c = actor(ClassKey::Hunter, 5.0, 5.0);
        let mut ctx = SimContext::default();
        assert!(CombatSystem::throw_weapon(&mut c, 0.0, 1.0, &mut ctx).is_none());
        assert_eq!(c.weapon_key(), WeaponKey::BowAndArrow);
    }

    #[test]
    fn feedback_rises_fades_and_expires() {
        let mut log = FeedbackLog::default();
        log.push("x", 1.0, 1.0, FeedbackKind::Damage);
        log.age(0.75);
        let entry = &log.entries()[0];
        assert_relative_eq!(entry.opacity, 0.5);
        assert_relative_eq!(entry.offset_y, -40.0 - 15.0);
        log.age(0.8);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn attack_visuals_decay_twice_as_fast() {
        let mut visuals = vec![AttackVisual { x: 0.0, y: 0.0, angle: 0.0, range: 1.0, life: 0.2 }];
        AttackVisual::age(&mut visuals, 0.05);
        assert_relative_eq!(visuals[0].life, 0.1, epsilon = 1e-6);
        AttackVisual::age(&mut visuals, 0.06);
        assert!(visuals.is_empty());
    }
}
