//! Arena geometry: grid bounds, box overlap, attack cones

use serde::Serialize;
use std::f32::consts::{PI, TAU};

use super::constants::{ACTOR_SIZE, GRID_SIZE, MELEE_ARC, OBSTACLE_SIZE};

/// Half-extent of an actor's collision box
pub const ACTOR_HALF: f32 = ACTOR_SIZE / 2.0;

/// Axis-aligned unit cell blocking movement and projectiles.
/// `x`/`y` is the cell's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
}

impl Obstacle {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Does a box centred on (cx, cy) with the given half-extent overlap this cell?
    pub fn overlaps(&self, cx: f32, cy: f32, half: f32) -> bool {
        cx - half < self.x + OBSTACLE_SIZE
            && cx + half > self.x
            && cy - half < self.y + OBSTACLE_SIZE
            && cy + half > self.y
    }
}

/// Geometry helpers shared by movement, combat and projectiles
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Is a box centred on (x, y) fully inside the grid?
    pub fn in_bounds(x: f32, y: f32, half: f32) -> bool {
        x - half >= 0.0 && x + half <= GRID_SIZE && y - half >= 0.0 && y + half <= GRID_SIZE
    }

    /// Clamp a box centre so the box stays inside the grid
    pub fn clamp_to_grid(x: f32, y: f32, half: f32) -> (f32, f32) {
        (x.clamp(half, GRID_SIZE - half), y.clamp(half, GRID_SIZE - half))
    }

    /// Overlap test for two centred boxes
    pub fn boxes_overlap(ax: f32, ay: f32, a_half: f32, bx: f32, by: f32, b_half: f32) -> bool {
        (ax - bx).abs() < a_half + b_half && (ay - by).abs() < a_half + b_half
    }

    /// Would an actor box at (x, y) hit the grid edge, an obstacle or another actor?
    ///
    /// `others` holds the centres of the living actors to test against, without
    /// the moving actor itself.
    pub fn actor_blocked(x: f32, y: f32, obstacles: &[Obstacle], others: &[(f32, f32)]) -> bool {
        if !Self::in_bounds(x, y, ACTOR_HALF) {
            return true;
        }
        if obstacles.iter().any(|obs| obs.overlaps(x, y, ACTOR_HALF)) {
            return true;
        }
        others
            .iter()
            .any(|&(ox, oy)| Self::boxes_overlap(x, y, ACTOR_HALF, ox, oy, ACTOR_HALF))
    }

    pub fn distance(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
        let dx = bx - ax;
        let dy = by - ay;
        (dx * dx + dy * dy).sqrt()
    }

    /// Angle of the vector from a to b
    pub fn angle_to(ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
        (by - ay).atan2(bx - ax)
    }

    /// Absolute angular difference folded into [0, PI]
    pub fn angle_diff(a: f32, b: f32) -> f32 {
        let diff = (a - b).rem_euclid(TAU);
        if diff > PI {
            TAU - diff
        } else {
            diff
        }
    }

    /// Is the target centre inside the melee cone in front of the attacker?
    pub fn in_attack_cone(ox: f32, oy: f32, facing: f32, tx: f32, ty: f32, range: f32) -> bool {
        let dist = Self::distance(ox, oy, tx, ty);
        if dist > range {
            return false;
        }
        if dist <= f32::EPSILON {
            return true;
        }
        Self::angle_diff(facing, Self::angle_to(ox, oy, tx, ty)) <= MELEE_ARC / 2.0
    }

    /// Circle approximation used for projectile hits
    pub fn circles_overlap(ax: f32, ay: f32, bx: f32, by: f32, combined_radius: f32) -> bool {
        let dx = bx - ax;
        let dy = by - ay;
        dx * dx + dy * dy < combined_radius * combined_radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case(1.0, 0.0, true)]
    #[case(0.0, 2.0, false)]
    #[case(2.0, 0.0, true)]
    #[case(2.1, 0.0, false)]
    #[case(-1.0, 0.0, false)]
    fn cone_from_origin_facing_east(#[case] tx: f32, #[case] ty: f32, #[case] expected: bool) {
        assert_eq!(PhysicsSystem::in_attack_cone(0.0, 0.0, 0.0, tx, ty, 2.0), expected);
    }

    #[test]
    fn cone_edge_is_thirty_degrees() {
        let inside = 29.0_f32.to_radians();
        let outside = 31.0_f32.to_radians();
        assert!(PhysicsSystem::in_attack_cone(0.0, 0.0, 0.0, inside.cos(), inside.sin(), 2.0));
        assert!(!PhysicsSystem::in_attack_cone(0.0, 0.0, 0.0, outside.cos(), outside.sin(), 2.0));
    }

    #[test]
    fn angle_diff_wraps_around() {
        assert_relative_eq!(PhysicsSystem::angle_diff(PI - 0.1, -PI + 0.1), 0.2, epsilon = 1e-5);
        assert_relative_eq!(PhysicsSystem::angle_diff(0.0, PI / 2.0), PI / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn actor_blocked_by_edges_obstacles_and_actors() {
        let obstacles = [Obstacle::new(5.0, 5.0)];
        assert!(PhysicsSystem::actor_blocked(0.2, 3.0, &[], &[]));
        assert!(PhysicsSystem::actor_blocked(5.5, 5.5, &obstacles, &[]));
        assert!(PhysicsSystem::actor_blocked(4.7, 5.5, &obstacles, &[]));
        assert!(!PhysicsSystem::actor_blocked(4.5, 5.5, &obstacles, &[]));
        assert!(PhysicsSystem::actor_blocked(3.0, 3.0, &[], &[(3.5, 3.0)]));
        assert!(!PhysicsSystem::actor_blocked(3.0, 3.0, &[], &[(3.9, 3.0)]));
    }

    #[test]
    fn clamp_keeps_box_inside_grid() {
        let (x, y) = PhysicsSystem::clamp_to_grid(-3.0, 25.0, ACTOR_HALF);
        assert_relative_eq!(x, ACTOR_HALF);
        assert_relative_eq!(y, GRID_SIZE - ACTOR_HALF);
    }
}
