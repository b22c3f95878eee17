//! Grid visibility: which tree squares might be on screen.

use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec3;

use crate::camera::ViewCamera;
use crate::geometry::MAX_TREE_HEIGHT;
use crate::grid::{GridBounds, SquareCoord};

/// Enumerates the squares that may be visible from a camera.
pub trait GridVisibility {
    /// Call `visitor` once for every potentially visible square within
    /// `max_distance` of the camera, widened by `extra` squares on each side.
    fn visit_squares(
        &self,
        camera: &dyn ViewCamera,
        bounds: GridBounds,
        max_distance: f32,
        extra: i32,
        visitor: &mut dyn FnMut(SquareCoord),
    );
}

/// Scans the squares inside the draw radius and keeps those whose bounding
/// sphere passes the camera test.
///
/// Terrain height is unknown here, so each square is approximated by a
/// sphere around its centre at `ground_height`, tall enough for the largest
/// tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct RadiusVisibility {
    /// Height of the terrain the squares are centred on.
    pub ground_height: f32,
}

impl GridVisibility for RadiusVisibility {
    fn visit_squares(
        &self,
        camera: &dyn ViewCamera,
        bounds: GridBounds,
        max_distance: f32,
        extra: i32,
        visitor: &mut dyn FnMut(SquareCoord),
    ) {
        let eye = camera.position();
        let reach = max_distance.max(0.0) + extra as f32 * bounds.extent;
        let min = bounds.unclamped_coord(eye - Vec3::new(reach, 0.0, reach));
        let max = bounds.unclamped_coord(eye + Vec3::new(reach, 0.0, reach));

        let x_end = max.x.min(bounds.squares_x as i32 - 1);
        let z_end = max.z.min(bounds.squares_z as i32 - 1);
        let radius = bounds.extent * FRAC_1_SQRT_2 + MAX_TREE_HEIGHT;

        for z in min.z.max(0)..=z_end {
            for x in min.x.max(0)..=x_end {
                let coord = SquareCoord::new(x, z);
                let center = bounds.center(coord) + Vec3::Y * self.ground_height;
                let planar = Vec3::new(center.x - eye.x, 0.0, center.z - eye.z).length();
                if planar - bounds.extent * FRAC_1_SQRT_2 > reach {
                    continue;
                }
                if camera.in_view(center, radius) {
                    visitor(coord);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use std::f32::consts::FRAC_PI_2;

    fn bounds() -> GridBounds {
        GridBounds {
            squares_x: 16,
            squares_z: 16,
            extent: 512.0,
        }
    }

    fn collect(camera: &Camera, max_distance: f32, extra: i32) -> Vec<SquareCoord> {
        let mut seen = Vec::new();
        RadiusVisibility::default().visit_squares(
            camera,
            bounds(),
            max_distance,
            extra,
            &mut |coord| seen.push(coord),
        );
        seen
    }

    fn top_down(x: f32, z: f32) -> Camera {
        Camera::new(Vec3::new(x, 5000.0, z), Vec3::NEG_Y, 2.5, 1.0, 1.0, 100_000.0)
    }

    #[test]
    fn test_only_squares_within_reach_are_visited() {
        let camera = top_down(4096.0, 4096.0);
        let seen = collect(&camera, 1024.0, 0);
        assert!(!seen.is_empty());
        let eye = SquareCoord::new(8, 8);
        assert!(seen.contains(&eye));
        for coord in &seen {
            assert!(coord.chebyshev_distance(eye) <= 3);
        }
    }

    #[test]
    fn test_extra_margin_widens_the_scan() {
        let camera = top_down(4096.0, 4096.0);
        let narrow = collect(&camera, 1024.0, 0).len();
        let wide = collect(&camera, 1024.0, 1).len();
        assert!(wide > narrow);
    }

    #[test]
    fn test_scan_is_clamped_to_grid() {
        let camera = top_down(10.0, 10.0);
        for coord in collect(&camera, 4096.0, 2) {
            assert!(bounds().contains(coord));
        }
    }

    #[test]
    fn test_squares_behind_camera_are_skipped() {
        let camera = Camera::new(Vec3::new(4096.0, 50.0, 4096.0), Vec3::NEG_Z, FRAC_PI_2, 1.0, 1.0, 100_000.0);
        let seen = collect(&camera, 3000.0, 0);
        assert!(seen.iter().any(|c| c.z < 8));
        assert!(seen.iter().all(|c| c.z <= 9));
    }
}
