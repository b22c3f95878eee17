//! The tree drawer: per-frame LOD classification over the square grid.
//!
//! A pass first releases batches retired by tree edits, then walks the
//! squares the visibility query reports. Squares outside the near region get
//! a cached mid or far batch depending on their distance factor. When near
//! rendering is active, the squares around the camera are handled tree by
//! tree instead, followed by falling trees, the per-frame near billboard
//! batch, and the blended second pass.

use glam::Vec3;

use crate::TreeError;
use crate::arena::{GeometryArena, GeometryHandle};
use crate::camera::ViewCamera;
use crate::falling::{FallParams, FallingTrees};
use crate::geometry::{BillboardGeometry, CROSSED_VERTICES, MAX_TREE_HEIGHT, QUAD_VERTICES, far_side_vector};
use crate::grid::{SquareCoord, TreeGrid, TreeSquare};
use crate::instance::{TreeInstance, TreeType};
use crate::lod::{LodThresholds, NearThresholds, SquareLod, TreeLod, square_distance_factor};
use crate::plan::{DrawCommand, DrawPass, FadeEntry, FarTexture, FramePlan, FrameStats};
use crate::sweep::{CacheSweeper, DEFAULT_STALENESS_FRAMES, DEFAULT_SWEEP_DIVISOR};
use crate::visibility::GridVisibility;

/// Tuning for the drawer.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawerSettings {
    /// Square-level distance-factor bands.
    pub lod: LodThresholds,
    /// Per-tree distances inside the near region.
    pub near: NearThresholds,
    /// Chebyshev radius, in squares, of the near region around the camera.
    pub near_radius: i32,
    /// Tree distance (in squares) from which near trees are drawn in detail.
    pub detailed_min_distance: f32,
    /// Far batches are rebuilt once the view direction's cosine to the baked
    /// direction drops below this.
    pub view_refresh_cosine: f32,
    /// Extra radius for near-tree visibility in the shadow pass.
    pub shadow_view_margin: f32,
    /// Cap on blended trees deferred to the second pass.
    pub max_fade_entries: usize,
    /// Frames a cached batch may go unused.
    pub staleness_frames: u32,
    /// Sweeper passes per full grid scan.
    pub sweep_divisor: usize,
    /// Fall animation constants.
    pub fall: FallParams,
}

impl Default for DrawerSettings {
    fn default() -> Self {
        Self {
            lod: LodThresholds::default(),
            near: NearThresholds::default(),
            near_radius: 2,
            detailed_min_distance: 4.0,
            view_refresh_cosine: 0.97,
            shadow_view_margin: 150.0,
            max_fade_entries: 3000,
            staleness_frames: DEFAULT_STALENESS_FRAMES,
            sweep_divisor: DEFAULT_SWEEP_DIVISOR,
            fall: FallParams::default(),
        }
    }
}

/// Owns the tree grid, its cached batches and the falling trees.
pub struct TreeDrawer {
    grid: TreeGrid,
    arena: GeometryArena,
    falling: FallingTrees,
    sweeper: CacheSweeper,
    settings: DrawerSettings,
    last_tree_distance: f32,
}

impl TreeDrawer {
    /// Create a drawer over an existing grid.
    pub fn new(grid: TreeGrid, settings: DrawerSettings) -> Self {
        log::info!(
            "Tree drawer over {} squares ({} trees), square extent {}",
            grid.square_count(),
            grid.tree_count(),
            grid.extent()
        );
        Self {
            grid,
            arena: GeometryArena::new(),
            falling: FallingTrees::new(settings.fall),
            sweeper: CacheSweeper::new(settings.staleness_frames, settings.sweep_divisor),
            settings,
            last_tree_distance: 4.0,
        }
    }

    /// The square grid.
    pub fn grid(&self) -> &TreeGrid {
        &self.grid
    }

    /// Cached batches.
    pub fn arena(&self) -> &GeometryArena {
        &self.arena
    }

    /// Look up a cached batch by handle.
    pub fn batch(&self, handle: GeometryHandle) -> Option<&BillboardGeometry> {
        self.arena.get(handle)
    }

    /// Trees currently falling.
    pub fn falling(&self) -> &FallingTrees {
        &self.falling
    }

    /// Drawer tuning.
    pub fn settings(&self) -> &DrawerSettings {
        &self.settings
    }

    /// Tree distance of the last regular pass, reused by the shadow pass.
    pub fn last_tree_distance(&self) -> f32 {
        self.last_tree_distance
    }

    /// Place a tree of type `tree_type` at `position`.
    pub fn add_tree(
        &mut self,
        tree_type: u8,
        position: Vec3,
    ) -> Result<Option<TreeInstance>, TreeError> {
        let tree_type = TreeType::new(tree_type)?;
        self.grid.add(tree_type, position)
    }

    /// Remove the tree at `position`, if there is one.
    pub fn delete_tree(&mut self, position: Vec3) -> Result<Option<TreeInstance>, TreeError> {
        self.grid.remove(position)
    }

    /// Start a fall animation for a felled tree. Returns `Ok(false)` when the
    /// impact was too fast to animate.
    pub fn add_falling_tree(
        &mut self,
        position: Vec3,
        impact: Vec3,
        tree_type: u8,
    ) -> Result<bool, TreeError> {
        let tree_type = TreeType::new(tree_type)?;
        Ok(self.falling.add(position, impact, tree_type))
    }

    /// Advance falling trees by one tick. Returns how many finished.
    pub fn update(&mut self) -> usize {
        self.falling.update()
    }

    /// Plan a camera pass and run one sweeper step.
    ///
    /// `tree_distance` is the draw distance in squares. A reflection pass
    /// always handles near trees individually.
    pub fn draw(
        &mut self,
        camera: &dyn ViewCamera,
        visibility: &dyn GridVisibility,
        tree_distance: f32,
        reflection: bool,
        frame: u32,
    ) -> FramePlan {
        let pass = if reflection {
            DrawPass::Reflection
        } else {
            DrawPass::Main
        };
        self.last_tree_distance = tree_distance;

        let mut plan = self.plan_pass(camera, visibility, tree_distance, pass, frame);
        plan.stats.batches_reclaimed = self.sweeper.sweep(&mut self.grid, &mut self.arena, frame);

        log::trace!("{pass:?} pass at frame {frame}: {:?}", plan.stats);
        plan
    }

    /// Plan the shadow-map pass with the tree distance of the last regular
    /// pass. The sweeper does not run.
    pub fn draw_shadow_pass(
        &mut self,
        camera: &dyn ViewCamera,
        visibility: &dyn GridVisibility,
        frame: u32,
    ) -> FramePlan {
        let plan = self.plan_pass(
            camera,
            visibility,
            self.last_tree_distance,
            DrawPass::Shadow,
            frame,
        );
        log::trace!("Shadow pass at frame {frame}: {:?}", plan.stats);
        plan
    }

    fn release_retired(&mut self) -> usize {
        let mut released = 0;
        for handle in self.grid.drain_retired() {
            if self.arena.release(handle).is_some() {
                released += 1;
            }
        }
        released
    }

    fn plan_pass(
        &mut self,
        camera: &dyn ViewCamera,
        visibility: &dyn GridVisibility,
        tree_distance: f32,
        pass: DrawPass,
        frame: u32,
    ) -> FramePlan {
        let mut stats = FrameStats {
            batches_released: self.release_retired(),
            ..FrameStats::default()
        };

        let detailed =
            tree_distance >= self.settings.detailed_min_distance || pass == DrawPass::Reflection;
        let bounds = self.grid.bounds();
        let max_distance = tree_distance * bounds.extent;
        let eye = camera.position();
        let camera_square = bounds.unclamped_coord(eye);
        let extra = i32::from(pass == DrawPass::Shadow);

        let mut visible = Vec::new();
        visibility.visit_squares(camera, bounds, max_distance * 2.0, extra, &mut |coord| {
            visible.push(coord)
        });

        let mut commands = Vec::new();
        for coord in visible {
            if detailed && coord.chebyshev_distance(camera_square) <= self.settings.near_radius {
                continue;
            }
            if let Some(command) = self.plan_square(coord, eye, max_distance, frame, &mut stats) {
                commands.push(command);
            }
        }

        if detailed {
            self.plan_near(camera, camera_square, pass, frame, &mut stats, &mut commands);
        }

        FramePlan {
            pass,
            frame,
            far_texture: FarTexture::for_forward(camera.forward()),
            detailed,
            commands,
            stats,
        }
    }

    fn plan_square(
        &mut self,
        coord: SquareCoord,
        eye: Vec3,
        max_distance: f32,
        frame: u32,
        stats: &mut FrameStats,
    ) -> Option<DrawCommand> {
        let center = self.grid.bounds().center(coord);
        let (factor, dir) = square_distance_factor(eye, center, max_distance);
        let lod = self.settings.lod.classify(factor);
        let refresh_cosine = self.settings.view_refresh_cosine;

        let Self { grid, arena, .. } = self;
        let square = grid.square_mut(coord)?;

        match lod {
            SquareLod::Mid => {
                square.last_seen = frame;
                if square.is_empty() {
                    return None;
                }
                let handle = match square.mid.filter(|h| arena.contains(*h)) {
                    Some(handle) => handle,
                    None => {
                        let handle = arena.insert(build_mid(square));
                        square.mid = Some(handle);
                        stats.batches_built += 1;
                        log::debug!("Built mid batch for square {coord:?} ({} trees)", square.len());
                        handle
                    }
                };
                stats.mid_squares += 1;
                Some(DrawCommand::CachedMid {
                    square: coord,
                    handle,
                })
            }
            SquareLod::Far { alpha } => {
                square.last_seen_far = frame;
                if square.is_empty() {
                    return None;
                }
                let cached = square.far.filter(|h| arena.contains(*h));
                let handle = match cached {
                    Some(handle) if dir.dot(square.view_dir) >= refresh_cosine => handle,
                    Some(handle) => {
                        let replaced = arena.replace(handle, build_far(square, dir));
                        debug_assert!(replaced, "live far handle {handle:?} not in arena");
                        square.view_dir = dir;
                        stats.batches_refreshed += 1;
                        handle
                    }
                    None => {
                        let handle = arena.insert(build_far(square, dir));
                        square.far = Some(handle);
                        square.view_dir = dir;
                        stats.batches_built += 1;
                        log::debug!("Built far batch for square {coord:?} ({} trees)", square.len());
                        handle
                    }
                };
                stats.far_squares += 1;
                if alpha < 1.0 {
                    stats.faded_squares += 1;
                }
                Some(DrawCommand::CachedFar {
                    square: coord,
                    handle,
                    alpha,
                })
            }
            SquareLod::Culled => {
                stats.culled_squares += 1;
                None
            }
        }
    }

    fn plan_near(
        &mut self,
        camera: &dyn ViewCamera,
        camera_square: SquareCoord,
        pass: DrawPass,
        frame: u32,
        stats: &mut FrameStats,
        commands: &mut Vec<DrawCommand>,
    ) {
        let shadow = pass == DrawPass::Shadow;
        let bounds = self.grid.bounds();
        let radius = self.settings.near_radius;
        let near = self.settings.near;
        let max_fades = self.settings.max_fade_entries;
        let margin = if shadow {
            self.settings.shadow_view_margin
        } else {
            0.0
        };
        let half_height = MAX_TREE_HEIGHT * 0.5;
        let eye = camera.position();

        // The camera may be arbitrarily far outside the grid.
        let x_range = camera_square.x.saturating_sub(radius).max(0)
            ..=camera_square.x.saturating_add(radius).min(bounds.squares_x as i32 - 1);
        let z_range = camera_square.z.saturating_sub(radius).max(0)
            ..=camera_square.z.saturating_add(radius).min(bounds.squares_z as i32 - 1);

        let mut billboards = BillboardGeometry::new();
        let mut fades = Vec::new();

        for z in z_range {
            for x in x_range.clone() {
                let Some(square) = self.grid.square_mut(SquareCoord::new(x, z)) else {
                    continue;
                };
                square.last_seen = frame;
                stats.near_squares += 1;

                for tree in square.trees() {
                    let center = tree.position + Vec3::Y * half_height;
                    if !camera.in_view(center, half_height + margin) {
                        stats.culled_trees += 1;
                        continue;
                    }

                    let (position, tree_type) = (tree.position, tree.tree_type);
                    match near.classify((position - eye).length_squared()) {
                        TreeLod::Detailed => {
                            stats.detailed_trees += 1;
                            commands.push(DrawCommand::DetailedTree {
                                position,
                                tree_type,
                            });
                        }
                        TreeLod::Blended { rel_dist } => {
                            stats.blended_trees += 1;
                            commands.push(DrawCommand::BlendedTree {
                                position,
                                tree_type,
                                rel_dist,
                            });
                            if fades.len() < max_fades {
                                fades.push(FadeEntry {
                                    position,
                                    tree_type,
                                    rel_dist,
                                });
                            } else {
                                stats.dropped_fade_entries += 1;
                            }
                        }
                        TreeLod::Billboard => {
                            stats.billboard_trees += 1;
                            billboards.push_near(position, tree_type);
                        }
                    }
                }
            }
        }

        if stats.dropped_fade_entries > 0 {
            log::warn!(
                "Dropped {} fade entries in {pass:?} pass (cap {max_fades})",
                stats.dropped_fade_entries
            );
        }

        let sink = self.falling.params().sink_depth;
        for tree in self.falling.iter() {
            let (center, radius) = tree.bounding_sphere(sink);
            if !camera.in_view(center, radius) {
                continue;
            }
            let transform = if shadow {
                tree.shadow_transform(sink)
            } else {
                tree.transform(sink)
            };
            stats.falling_trees += 1;
            commands.push(DrawCommand::FallingTree {
                transform,
                tree_type: tree.tree_type,
            });
        }

        if !billboards.is_empty() {
            commands.push(DrawCommand::NearBillboards {
                geometry: billboards,
            });
        }

        commands.extend(fades.into_iter().map(|entry| {
            let mut geometry = BillboardGeometry::with_capacity(CROSSED_VERTICES);
            geometry.push_near(entry.position, entry.tree_type);
            DrawCommand::FadedBillboard { entry, geometry }
        }));
    }
}

fn build_mid(square: &TreeSquare) -> BillboardGeometry {
    let mut geometry = BillboardGeometry::with_capacity(square.len() * CROSSED_VERTICES);
    for tree in square.trees() {
        geometry.push_mid(tree.position, tree.tree_type);
    }
    geometry
}

fn build_far(square: &TreeSquare, view_dir: Vec3) -> BillboardGeometry {
    let side = far_side_vector(view_dir);
    let mut geometry = BillboardGeometry::with_capacity(square.len() * QUAD_VERTICES);
    for tree in square.trees() {
        geometry.push_far(tree.position, side, tree.tree_type);
    }
    geometry
}

#[cfg(test)]
#[path = "drawer_tests.rs"]
mod tests;
