//! Falling-tree animation.
//!
//! A felled tree tips over along its horizontal impact direction. Progress
//! advances by a fixed step each tick and accelerates with `sin(progress)`,
//! which is close enough to a toppling trunk without simulating one.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::geometry::MAX_TREE_HEIGHT;
use crate::instance::TreeType;

/// Tuning constants for the fall animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallParams {
    /// Multiplier applied to speed each tick.
    pub step: f32,
    /// Per-tick acceleration scale.
    pub damping: f32,
    /// Lowest initial speed, so gentle impacts still topple the tree.
    pub min_speed: f32,
    /// Initial speed per unit of lateral impact speed.
    pub speed_scale: f32,
    /// Impacts faster than this leave no falling tree.
    pub max_lateral_speed: f32,
    /// How far the base sinks into the ground over the whole fall.
    pub sink_depth: f32,
}

impl Default for FallParams {
    fn default() -> Self {
        Self {
            step: 0.1,
            damping: 0.04,
            min_speed: 0.01,
            speed_scale: 0.0004,
            max_lateral_speed: 500.0,
            sink_depth: 20.0,
        }
    }
}

/// A tree in the middle of falling over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FallingTree {
    /// Base position when the tree was felled.
    pub position: Vec3,
    /// Unit horizontal direction of the fall.
    pub direction: Vec3,
    /// Visual variant.
    pub tree_type: TreeType,
    /// Current progress rate.
    pub speed: f32,
    /// Progress in `[0, 1]`; the tree is dropped once it passes 1.
    pub fall_pos: f32,
}

impl FallingTree {
    /// Base position, lowered as the fall progresses.
    pub fn draw_position(&self, sink_depth: f32) -> Vec3 {
        self.position - Vec3::Y * (self.fall_pos * sink_depth)
    }

    /// Centre and radius of the sphere used for visibility tests.
    pub fn bounding_sphere(&self, sink_depth: f32) -> (Vec3, f32) {
        let half = MAX_TREE_HEIGHT * 0.5;
        (self.draw_position(sink_depth) + Vec3::Y * half, half)
    }

    /// Model matrix for the main pass: the trunk axis rotated half a turn
    /// over the whole fall.
    pub fn transform(&self, sink_depth: f32) -> Mat4 {
        let y = self.trunk_axis();
        let z = y.cross(Vec3::NEG_X).normalize_or_zero();
        let x = y.cross(z);
        Self::basis(x, y, z, self.draw_position(sink_depth))
    }

    /// Model matrix for the shadow pass, built against `+X` instead of `-X`.
    pub fn shadow_transform(&self, sink_depth: f32) -> Mat4 {
        let y = self.trunk_axis();
        let z = y.cross(Vec3::X).normalize_or_zero();
        let x = z.cross(y);
        Self::basis(x, y, z, self.draw_position(sink_depth))
    }

    fn trunk_axis(&self) -> Vec3 {
        let (sin, cos) = (self.fall_pos * PI).sin_cos();
        Vec3::new(self.direction.x * sin, cos, self.direction.z * sin)
    }

    fn basis(x: Vec3, y: Vec3, z: Vec3, origin: Vec3) -> Mat4 {
        Mat4::from_cols(x.extend(0.0), y.extend(0.0), z.extend(0.0), origin.extend(1.0))
    }
}

/// All trees currently falling.
#[derive(Clone, Debug, Default)]
pub struct FallingTrees {
    params: FallParams,
    trees: Vec<FallingTree>,
}

impl FallingTrees {
    /// Create an empty animator.
    pub fn new(params: FallParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
        }
    }

    /// Animation constants.
    pub fn params(&self) -> &FallParams {
        &self.params
    }

    /// Start a fall from an impact. Returns `false` when the horizontal
    /// impact speed exceeds the cap and the fall is suppressed.
    pub fn add(&mut self, position: Vec3, impact: Vec3, tree_type: TreeType) -> bool {
        let lateral = Vec3::new(impact.x, 0.0, impact.z);
        let len = lateral.length();
        if len > self.params.max_lateral_speed {
            return false;
        }

        self.trees.push(FallingTree {
            position,
            direction: lateral.normalize_or_zero(),
            tree_type,
            speed: (len * self.params.speed_scale).max(self.params.min_speed),
            fall_pos: 0.0,
        });
        true
    }

    /// Advance every fall by one tick. Returns how many trees finished.
    pub fn update(&mut self) -> usize {
        let before = self.trees.len();
        let FallParams { step, damping, .. } = self.params;
        self.trees.retain_mut(|tree| {
            tree.fall_pos += tree.speed * step;
            if tree.fall_pos > 1.0 {
                return false;
            }
            tree.speed += tree.fall_pos.sin() * damping;
            true
        });
        before - self.trees.len()
    }

    /// Trees still falling, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FallingTree> {
        self.trees.iter()
    }

    /// Number of trees still falling.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether nothing is falling.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pine() -> TreeType {
        TreeType::new(0).unwrap()
    }

    fn ticks_to_finish(impact: Vec3) -> usize {
        let mut falling = FallingTrees::new(FallParams::default());
        assert!(falling.add(Vec3::ZERO, impact, pine()));
        let mut ticks = 0;
        while !falling.is_empty() {
            falling.update();
            ticks += 1;
            assert!(ticks <= 1001, "fall never finished");
        }
        ticks
    }

    #[test]
    fn test_fast_impact_is_rejected() {
        let mut falling = FallingTrees::new(FallParams::default());
        assert!(!falling.add(Vec3::ZERO, Vec3::new(400.0, 0.0, 400.0), pine()));
        assert!(falling.is_empty());
    }

    /// Vertical velocity does not count towards the lateral cap.
    #[test]
    fn test_vertical_component_ignored() {
        let mut falling = FallingTrees::new(FallParams::default());
        assert!(falling.add(Vec3::ZERO, Vec3::new(100.0, 9000.0, 0.0), pine()));
        let tree = falling.iter().next().unwrap();
        assert_eq!(tree.direction, Vec3::X);
        assert!((tree.speed - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_slow_impact_clamped_to_min_speed() {
        let mut falling = FallingTrees::new(FallParams::default());
        assert!(falling.add(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), pine()));
        assert_eq!(falling.iter().next().unwrap().speed, 0.01);
    }

    #[test]
    fn test_fall_finishes_deterministically() {
        // Initial speed 0.2 at the lateral cap, 0.01 at the floor.
        assert_eq!(ticks_to_finish(Vec3::new(500.0, 0.0, 0.0)), 30);
        assert_eq!(ticks_to_finish(Vec3::new(0.0, 0.0, 500.0)), 30);
        assert_eq!(ticks_to_finish(Vec3::new(1.0, 0.0, 0.0)), 77);
    }

    #[test]
    fn test_first_tick_advances_by_speed_times_step() {
        let mut falling = FallingTrees::new(FallParams::default());
        falling.add(Vec3::ZERO, Vec3::new(250.0, 0.0, 0.0), pine());
        assert_eq!(falling.update(), 0);
        let tree = falling.iter().next().unwrap();
        assert!((tree.fall_pos - 0.01).abs() < 1e-6);
        assert!((tree.speed - (0.1 + 0.01f32.sin() * 0.04)).abs() < 1e-6);
    }

    #[test]
    fn test_upright_tree_has_identity_basis() {
        let tree = FallingTree {
            position: Vec3::new(1.0, 2.0, 3.0),
            direction: Vec3::X,
            tree_type: pine(),
            speed: 0.1,
            fall_pos: 0.0,
        };
        let m = tree.transform(20.0);
        assert!((m.x_axis.truncate() - Vec3::X).length() < 1e-6);
        assert!((m.y_axis.truncate() - Vec3::Y).length() < 1e-6);
        assert!((m.z_axis.truncate() - Vec3::Z).length() < 1e-6);
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_half_fallen_tree_lies_along_direction() {
        let tree = FallingTree {
            position: Vec3::ZERO,
            direction: Vec3::Z,
            tree_type: pine(),
            speed: 0.1,
            fall_pos: 0.5,
        };
        let m = tree.transform(20.0);
        assert!((m.y_axis.truncate() - Vec3::Z).length() < 1e-5);
        assert!((m.w_axis.truncate() - Vec3::new(0.0, -10.0, 0.0)).length() < 1e-6);

        let shadow = tree.shadow_transform(20.0);
        assert!((shadow.y_axis.truncate() - Vec3::Z).length() < 1e-5);
    }
}
