//! Pursue-or-attack bot behaviour

use super::character::Character;
use super::physics::PhysicsSystem;
use super::weapons::{Weapon, WeaponKey};

/// Which attack primitive a weapon maps to when a bot uses it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackStyle {
    Melee,
    Bow,
    Throw,
}

impl AttackStyle {
    pub fn for_weapon(weapon: &Weapon) -> Self {
        if weapon.is_bow() {
            AttackStyle::Bow
        } else if weapon.can_be_thrown() {
            AttackStyle::Throw
        } else {
            AttackStyle::Melee
        }
    }
}

/// What a bot wants to do this tick
#[derive(Debug, Clone, PartialEq)]
pub enum BotAction {
    /// Was dead and came back; the weapons that were stuck to it
    Respawned(Vec<WeaponKey>),
    Idle,
    /// Walk straight toward the target along `angle`
    Pursue { angle: f32 },
    Attack { style: AttackStyle, angle: f32 },
}

pub struct BotBrain;

impl BotBrain {
    /// Decide the bot's action against `target` (the local player's centre,
    /// `None` when that player is dead)
    pub fn decide(bot: &mut Character, target: Option<(f32, f32)>, dt: f32) -> BotAction {
        if !bot.is_alive {
            let (x, y, class) = (bot.x, bot.y, bot.class_key);
            return BotAction::Respawned(bot.respawn(x, y, class));
        }

        bot.timers.decay(dt);

        let Some((tx, ty)) = target else {
            return BotAction::Idle;
        };

        let angle = PhysicsSystem::angle_to(bot.x, bot.y, tx, ty);
        let distance = PhysicsSystem::distance(bot.x, bot.y, tx, ty);
        let weapon = bot.weapon();

        if distance > weapon.range {
            return BotAction::Pursue { angle };
        }
        if bot.timers.attack > 0.0 || bot.is_stunned() {
            return BotAction::Idle;
        }
        bot.face(angle);
        BotAction::Attack {
            style: AttackStyle::for_weapon(weapon),
            angle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::character::ActorKind;
    use crate::game::combat::FeedbackLog;
    use crate::game::weapons::ClassKey;
    use uuid::Uuid;

    fn bot(class: ClassKey) -> Character {
        Character::new(Uuid::new_v4(), ActorKind::Bot, "Bot 1", class, "#123456", 5.0, 5.0)
    }

    #[test]
    fn far_target_is_pursued() {
        let mut b = bot(ClassKey::Swordsman);
        let action = BotBrain::decide(&mut b, Some((10.0, 5.0)), 0.016);
        assert_eq!(action, BotAction::Pursue { angle: 0.0 });
    }

    #[test]
    fn close_target_is_attacked_with_weapon_style() {
        let mut archer = bot(ClassKey::Hunter);
        match BotBrain::decide(&mut archer, Some((6.0, 5.0)), 0.016) {
            BotAction::Attack { style, .. } => assert_eq!(style, AttackStyle::Bow),
            other => panic!("unexpected {other:?}"),
        }

        let mut swordsman = bot(ClassKey::Swordsman);
        match BotBrain::decide(&mut swordsman, Some((6.0, 5.0)), 0.016) {
            BotAction::Attack { style, .. } => assert_eq!(style, AttackStyle::Throw),
            other => panic!("unexpected {other:?}"),
        }

        swordsman.inventory = vec![WeaponKey::BareHands];
        swordsman.active_weapon = 0;
        match BotBrain::decide(&mut swordsman, Some((6.0, 5.0)), 0.016) {
            BotAction::Attack { style, .. } => assert_eq!(style, AttackStyle::Melee),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cooldown_keeps_bot_idle() {
        let mut b = bot(ClassKey::Swordsman);
        b.timers.attack = 1.0;
        assert_eq!(BotBrain::decide(&mut b, Some((6.0, 5.0)), 0.1), BotAction::Idle);
        assert!(b.timers.attack < 1.0);
    }

    #[test]
    fn dead_bot_respawns_in_place_and_releases_stuck_weapons() {
        let mut b = bot(ClassKey::Ambusher);
        let mut fx = FeedbackLog::default();
        b.attach_weapon(WeaponKey::Knife, &mut fx);
        b.take_damage(100.0, None, None, &mut fx);
        let action = BotBrain::decide(&mut b, Some((6.0, 5.0)), 0.016);
        assert_eq!(action, BotAction::Respawned(vec![WeaponKey::Knife]));
        assert!(b.is_alive);
        assert_eq!((b.x, b.y), (5.0, 5.0));
    }

    #[test]
    fn no_target_means_idle() {
        let mut b = bot(ClassKey::Hoplite);
        assert_eq!(BotBrain::decide(&mut b, None, 0.016), BotAction::Idle);
    }
}
