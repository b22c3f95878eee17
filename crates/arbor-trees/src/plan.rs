//! Backend-agnostic output of a tree draw pass.

use std::ops::AddAssign;

use glam::{Mat4, Vec3};

use crate::arena::GeometryHandle;
use crate::geometry::BillboardGeometry;
use crate::grid::SquareCoord;
use crate::instance::TreeType;

/// Which pass is being planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawPass {
    /// Regular camera pass.
    Main,
    /// Water reflection pass; always draws near trees in detail.
    Reflection,
    /// Shadow-map pass.
    Shadow,
}

/// Far billboard texture variant, chosen from the camera heading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FarTexture {
    /// Camera looks towards negative z.
    Front,
    /// Camera looks towards positive z.
    Back,
}

impl FarTexture {
    /// Pick the variant for a camera forward vector.
    pub fn for_forward(forward: Vec3) -> Self {
        if forward.z < 0.0 { Self::Front } else { Self::Back }
    }
}

/// A near tree deferred to the blended second pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeEntry {
    /// Tree base.
    pub position: Vec3,
    /// Visual variant.
    pub tree_type: TreeType,
    /// 0.0 at the detail distance, 1.0 at the blend distance.
    pub rel_dist: f32,
}

/// One draw the backend should issue, in submission order.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// Replay a cached mid-band square batch.
    CachedMid {
        /// Square the batch belongs to.
        square: SquareCoord,
        /// Arena handle of the batch.
        handle: GeometryHandle,
    },
    /// Replay a cached far-band square batch.
    CachedFar {
        /// Square the batch belongs to.
        square: SquareCoord,
        /// Arena handle of the batch.
        handle: GeometryHandle,
        /// Opacity, below 1.0 inside the fade range.
        alpha: f32,
    },
    /// Full tree model.
    DetailedTree {
        /// Tree base.
        position: Vec3,
        /// Visual variant.
        tree_type: TreeType,
    },
    /// Full tree model with an alpha ramp.
    BlendedTree {
        /// Tree base.
        position: Vec3,
        /// Visual variant.
        tree_type: TreeType,
        /// 0.0 at the detail distance, 1.0 at the blend distance.
        rel_dist: f32,
    },
    /// Full tree model with an arbitrary transform.
    FallingTree {
        /// Model matrix.
        transform: Mat4,
        /// Visual variant.
        tree_type: TreeType,
    },
    /// Per-frame batch of near billboards.
    NearBillboards {
        /// The batch, built this frame.
        geometry: BillboardGeometry,
    },
    /// Billboard for one blended tree, drawn after everything else.
    FadedBillboard {
        /// The deferred tree.
        entry: FadeEntry,
        /// Its billboard.
        geometry: BillboardGeometry,
    },
}

/// Counters gathered while planning a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Squares drawn from the mid batch.
    pub mid_squares: usize,
    /// Squares drawn from the far batch.
    pub far_squares: usize,
    /// Far squares drawn with alpha below one.
    pub faded_squares: usize,
    /// Visible squares beyond the far factor.
    pub culled_squares: usize,
    /// Squares handled tree by tree.
    pub near_squares: usize,
    /// Batches built from scratch.
    pub batches_built: usize,
    /// Far batches rebuilt after the camera turned.
    pub batches_refreshed: usize,
    /// Retired batches released at the start of the pass.
    pub batches_released: usize,
    /// Stale batches reclaimed by the sweeper.
    pub batches_reclaimed: usize,
    /// Near trees drawn in full detail.
    pub detailed_trees: usize,
    /// Near trees drawn blended.
    pub blended_trees: usize,
    /// Near trees drawn as billboards.
    pub billboard_trees: usize,
    /// Near trees outside the view.
    pub culled_trees: usize,
    /// Falling trees drawn.
    pub falling_trees: usize,
    /// Fade entries dropped because the per-pass cap was reached.
    pub dropped_fade_entries: usize,
}

impl AddAssign<&FrameStats> for FrameStats {
    fn add_assign(&mut self, rhs: &FrameStats) {
        self.mid_squares += rhs.mid_squares;
        self.far_squares += rhs.far_squares;
        self.faded_squares += rhs.faded_squares;
        self.culled_squares += rhs.culled_squares;
        self.near_squares += rhs.near_squares;
        self.batches_built += rhs.batches_built;
        self.batches_refreshed += rhs.batches_refreshed;
        self.batches_released += rhs.batches_released;
        self.batches_reclaimed += rhs.batches_reclaimed;
        self.detailed_trees += rhs.detailed_trees;
        self.blended_trees += rhs.blended_trees;
        self.billboard_trees += rhs.billboard_trees;
        self.culled_trees += rhs.culled_trees;
        self.falling_trees += rhs.falling_trees;
        self.dropped_fade_entries += rhs.dropped_fade_entries;
    }
}

/// Everything a backend needs to draw one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    /// Pass this plan was built for.
    pub pass: DrawPass,
    /// Frame number the plan was built at.
    pub frame: u32,
    /// Far billboard texture variant.
    pub far_texture: FarTexture,
    /// Whether near squares were handled tree by tree.
    pub detailed: bool,
    /// Draws in submission order.
    pub commands: Vec<DrawCommand>,
    /// Counters.
    pub stats: FrameStats,
}

impl FramePlan {
    /// Fade entries deferred to the second pass, in submission order.
    pub fn fade_entries(&self) -> impl Iterator<Item = &FadeEntry> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FadedBillboard { entry, .. } => Some(entry),
            _ => None,
        })
    }
}
