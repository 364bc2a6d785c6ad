//! Arrows and thrown weapons in flight

use serde::Serialize;
use uuid::Uuid;

use super::character::Character;
use super::combat::FeedbackLog;
use super::constants::{PROJECTILE_SIZE, PROJECTILE_TRAVEL_TIME};
use super::physics::{Obstacle, PhysicsSystem, ACTOR_HALF};
use super::weapons::ItemKind;

const PROJECTILE_HALF: f32 = PROJECTILE_SIZE / 2.0;

/// Result of advancing a projectile by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileEvent {
    Flying,
    /// Destroyed by an obstacle, nothing is recovered
    Blocked,
    /// Hit the actor with this id
    Hit(Uuid),
    /// Ran out of life without hitting anything
    Expired,
}

/// Active projectile in the arena
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projectile {
    pub id: Uuid,
    pub owner: Uuid,
    pub x: f32,
    pub y: f32,
    /// Travel direction in radians, fixed at launch
    pub angle: f32,
    pub max_distance: f32,
    pub damage: f32,
    pub item: ItemKind,
    /// Grid units per second
    pub speed: f32,
    /// Seconds of flight left
    pub life: f32,
    pub distance_traveled: f32,
    pub has_hit: bool,
}

impl Projectile {
    pub fn new(
        owner: Uuid,
        x: f32,
        y: f32,
        angle: f32,
        max_distance: f32,
        damage: f32,
        item: ItemKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            x,
            y,
            angle,
            max_distance,
            damage,
            item,
            speed: max_distance / PROJECTILE_TRAVEL_TIME,
            life: PROJECTILE_TRAVEL_TIME,
            distance_traveled: 0.0,
            has_hit: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.has_hit || self.life <= 0.0
    }

    /// Advance along the launch angle, testing obstacles then living actors
    /// other than the owner before committing the new position
    pub fn update<'a>(
        &mut self,
        dt: f32,
        obstacles: &[Obstacle],
        targets: impl Iterator<Item = &'a mut Character>,
        fx: &mut FeedbackLog,
    ) -> ProjectileEvent {
        if self.is_done() {
            return ProjectileEvent::Expired;
        }

        let step = self.speed * dt.min(self.life);
        let new_x = self.x + self.angle.cos() * step;
        let new_y = self.y + self.angle.sin() * step;
        self.distance_traveled += step;
        self.life = (self.life - dt).max(0.0);

        if obstacles.iter().any(|obs| obs.overlaps(new_x, new_y, PROJECTILE_HALF)) {
            self.life = 0.0;
            self.has_hit = true;
            return ProjectileEvent::Blocked;
        }

        for target in targets {
            if target.id == self.owner || !target.is_alive {
                continue;
            }
            if PhysicsSystem::circles_overlap(new_x, new_y, target.x, target.y, ACTOR_HALF + PROJECTILE_HALF) {
                let stuck = match self.item {
                    ItemKind::Weapon(key) => Some(key),
                    ItemKind::Arrow => None,
                };
                target.take_projectile_hit(self.damage, self.owner, self.angle, stuck, fx);
                self.life = 0.0;
                self.has_hit = true;
                return ProjectileEvent::Hit(target.id);
            }
        }

        self.x = new_x;
        self.y = new_y;

        if self.life <= 0.0 {
            ProjectileEvent::Expired
        } else {
            ProjectileEvent::Flying
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::ActorKind;
    use crate::game::weapons::{ClassKey, WeaponKey};
    use approx::assert_relative_eq;

    fn target(x: f32, y: f32) -> Character {
        Character::new(Uuid::new_v4(), ActorKind::Bot, "t", ClassKey::Swordsman, "#000", x, y)
    }

    #[test]
    fn unobstructed_projectile_travels_exactly_max_distance() {
        let mut p = Projectile::new(Uuid::new_v4(), 1.0, 1.0, 0.0, 6.0, 1.0, ItemKind::Arrow);
        let mut fx = FeedbackLog::default();
        let mut last = ProjectileEvent::Flying;
        for _ in 0..40 {
            last = p.update(1.0 / 60.0, &[], std::iter::empty(), &mut fx);
            if last != ProjectileEvent::Flying {
                break;
            }
        }
        assert_eq!(last, ProjectileEvent::Expired);
        assert_relative_eq!(p.distance_traveled, 6.0, epsilon = 1e-4);
        assert_relative_eq!(p.x, 7.0, epsilon = 1e-4);
        assert!(!p.has_hit);
    }

    #[test]
    fn large_final_step_is_clamped_to_remaining_life() {
        let mut p = Projectile::new(Uuid::new_v4(), 1.0, 1.0, 0.0, 4.0, 1.0, ItemKind::Arrow);
        let mut fx = FeedbackLog::default();
        p.update(0.4, &[], std::iter::empty(), &mut fx);
        let event = p.update(0.4, &[], std::iter::empty(), &mut fx);
        assert_eq!(event, ProjectileEvent::Expired);
        assert_relative_eq!(p.distance_traveled, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn obstacle_destroys_projectile_silently() {
        let mut p = Projectile::new(Uuid::new_v4(), 1.0, 1.5, 0.0, 6.0, 1.0, ItemKind::Weapon(WeaponKey::Knife));
        let mut fx = FeedbackLog::default();
        let obstacles = [Obstacle::new(2.0, 1.0)];
        let event = p.update(0.1, &obstacles, std::iter::empty(), &mut fx);
        assert_eq!(event, ProjectileEvent::Blocked);
        assert!(p.has_hit);
        assert_relative_eq!(p.x, 1.0);
    }

    #[test]
    fn thrown_weapon_sticks_to_target() {
        let owner = Uuid::new_v4();
        let mut victim = target(2.0, 1.0);
        let mut p = Projectile::new(owner, 1.0, 1.0, 0.0, 6.0, 1.0, ItemKind::Weapon(WeaponKey::Dagger));
        let mut fx = FeedbackLog::default();
        let event = p.update(0.1, &[], std::iter::once(&mut victim), &mut fx);
        assert_eq!(event, ProjectileEvent::Hit(victim.id));
        assert_relative_eq!(victim.health, 3.0);
        assert_eq!(victim.attached_weapons, vec![WeaponKey::Dagger]);
    }

    #[test]
    fn arrows_never_attach_and_skip_owner() {
        let mut shooter = target(1.2, 1.0);
        let mut p = Projectile::new(shooter.id, 1.0, 1.0, 0.0, 6.0, 1.0, ItemKind::Arrow);
        let mut fx = FeedbackLog::default();
        let event = p.update(0.01, &[], std::iter::once(&mut shooter), &mut fx);
        assert_eq!(event, ProjectileEvent::Flying);

        let mut victim = target(1.5, 1.0);
        let event = p.update(0.01, &[], std::iter::once(&mut victim), &mut fx);
        assert_eq!(event, ProjectileEvent::Hit(victim.id));
        assert!(victim.attached_weapons.is_empty());
    }
}
