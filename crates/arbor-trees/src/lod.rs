//! Distance-based LOD selection for tree squares and near trees.

use glam::Vec3;

use crate::TreeError;

/// Distance-factor boundaries for square-level LOD.
///
/// The factor is the planar camera distance to a square's centre divided by
/// the maximum tree draw distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodThresholds {
    mid: f32,
    fade: f32,
    far: f32,
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            mid: 1.0,
            fade: 1.5,
            far: 2.0,
        }
    }
}

impl LodThresholds {
    /// Create thresholds. Requires `0 < mid <= fade < far`.
    pub fn new(mid: f32, fade: f32, far: f32) -> Result<Self, TreeError> {
        let ordered = mid > 0.0 && mid <= fade && fade < far && far.is_finite();
        if ordered {
            Ok(Self { mid, fade, far })
        } else {
            Err(TreeError::InvalidThresholds { mid, fade, far })
        }
    }

    /// Upper bound of the mid band.
    pub fn mid(&self) -> f32 {
        self.mid
    }

    /// Factor beyond which far squares start fading out.
    pub fn fade(&self) -> f32 {
        self.fade
    }

    /// Upper bound of the far band; squares at or beyond it are culled.
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Pick the band for a square at the given distance factor.
    pub fn classify(&self, factor: f32) -> SquareLod {
        if factor < self.mid {
            SquareLod::Mid
        } else if factor < self.far {
            let alpha = if factor > self.fade {
                1.0 - (factor - self.fade) / (self.far - self.fade)
            } else {
                1.0
            };
            SquareLod::Far { alpha }
        } else {
            SquareLod::Culled
        }
    }
}

/// Band chosen for a whole square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SquareLod {
    /// Cached medium-detail batch.
    Mid,
    /// Cached single-quad batch, drawn with `alpha` opacity.
    Far {
        /// 1.0 up to the fade factor, ramping linearly to 0.0 at the far factor.
        alpha: f32,
    },
    /// Too far to draw.
    Culled,
}

/// Planar distance factor and unit direction from a square centre to the camera.
///
/// Height is ignored. The direction is zero when the camera is exactly above
/// the centre.
pub fn square_distance_factor(camera: Vec3, center: Vec3, max_distance: f32) -> (f32, Vec3) {
    let dif = Vec3::new(camera.x - center.x, 0.0, camera.z - center.z);
    (dif.length() / max_distance, dif.normalize_or_zero())
}

/// World-space distances for per-tree LOD inside the near region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearThresholds {
    /// Trees closer than this are drawn with full detail.
    pub detail_distance: f32,
    /// Trees closer than this (and beyond `detail_distance`) are blended.
    pub blend_distance: f32,
}

impl Default for NearThresholds {
    /// 110 and 125 heightmap squares of 8 world units.
    fn default() -> Self {
        Self {
            detail_distance: 880.0,
            blend_distance: 1000.0,
        }
    }
}

impl NearThresholds {
    /// Pick the treatment for a tree at squared distance `dist_sq` from the camera.
    pub fn classify(&self, dist_sq: f32) -> TreeLod {
        if dist_sq < self.detail_distance * self.detail_distance {
            TreeLod::Detailed
        } else if dist_sq < self.blend_distance * self.blend_distance {
            let rel_dist = (dist_sq.sqrt() - self.detail_distance)
                / (self.blend_distance - self.detail_distance);
            TreeLod::Blended { rel_dist }
        } else {
            TreeLod::Billboard
        }
    }
}

/// Treatment chosen for a single near tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TreeLod {
    /// Full model.
    Detailed,
    /// Full model with an alpha ramp, plus a billboard in the fade pass.
    Blended {
        /// 0.0 at the detail distance, 1.0 at the blend distance.
        rel_dist: f32,
    },
    /// Near billboard in the per-frame batch.
    Billboard,
}
