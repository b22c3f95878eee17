//! Spatial bucket grid: fixed-size tree squares over the map.
//!
//! Each [`TreeSquare`] owns the trees whose base falls inside it plus the
//! cached mid and far batches built from them. Any change to a square's trees
//! retires both batches; retired handles queue up until the render side
//! drains them with [`TreeGrid::drain_retired`].

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::TreeError;
use crate::arena::GeometryHandle;
use crate::instance::{InstanceKey, TreeInstance, TreeType};

/// Integer coordinate of a tree square.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SquareCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub z: i32,
}

impl SquareCoord {
    /// Create a coordinate.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chessboard distance between two squares, saturating at `i32::MAX`.
    pub fn chebyshev_distance(self, other: Self) -> i32 {
        let dx = self.x.abs_diff(other.x);
        let dz = self.z.abs_diff(other.z);
        i32::try_from(dx.max(dz)).unwrap_or(i32::MAX)
    }
}

/// Size and resolution of a grid, copied out for visibility queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridBounds {
    /// Squares along x.
    pub squares_x: usize,
    /// Squares along z.
    pub squares_z: usize,
    /// World-space width of one square.
    pub extent: f32,
}

impl GridBounds {
    /// Square containing a world position, ignoring the grid limits.
    ///
    /// Uses floor division so positions left of the origin land in negative
    /// columns instead of column zero.
    pub fn unclamped_coord(&self, position: Vec3) -> SquareCoord {
        SquareCoord::new(
            (position.x / self.extent).floor() as i32,
            (position.z / self.extent).floor() as i32,
        )
    }

    /// Whether a coordinate addresses a square of the grid.
    pub fn contains(&self, coord: SquareCoord) -> bool {
        coord.x >= 0
            && coord.z >= 0
            && (coord.x as usize) < self.squares_x
            && (coord.z as usize) < self.squares_z
    }

    /// World-space centre of a square, at height zero.
    pub fn center(&self, coord: SquareCoord) -> Vec3 {
        Vec3::new(
            (coord.x as f32 + 0.5) * self.extent,
            0.0,
            (coord.z as f32 + 0.5) * self.extent,
        )
    }
}

/// One grid cell: its trees, cached batches, and last-seen frame stamps.
#[derive(Default)]
pub struct TreeSquare {
    trees: FxHashMap<InstanceKey, TreeInstance>,
    pub(crate) mid: Option<GeometryHandle>,
    pub(crate) far: Option<GeometryHandle>,
    pub(crate) view_dir: Vec3,
    pub(crate) last_seen: u32,
    pub(crate) last_seen_far: u32,
}

impl TreeSquare {
    fn new() -> Self {
        Self {
            view_dir: Vec3::Y,
            ..Self::default()
        }
    }

    /// Trees in this square, in no particular order.
    pub fn trees(&self) -> impl Iterator<Item = &TreeInstance> {
        self.trees.values()
    }

    /// Look up a tree by identity.
    pub fn get(&self, key: InstanceKey) -> Option<&TreeInstance> {
        self.trees.get(&key)
    }

    /// Number of trees.
    pub fn len(&self) -> usize {
        self.trees.len()
    }

    /// Whether the square has no trees.
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Cached mid-band batch, if built.
    pub fn mid_artifact(&self) -> Option<GeometryHandle> {
        self.mid
    }

    /// Cached far-band batch, if built.
    pub fn far_artifact(&self) -> Option<GeometryHandle> {
        self.far
    }

    /// Direction the far batch was baked for.
    pub fn view_dir(&self) -> Vec3 {
        self.view_dir
    }

    /// Last frame the mid batch (or the near trees) were needed.
    pub fn last_seen(&self) -> u32 {
        self.last_seen
    }

    /// Last frame the far batch was needed.
    pub fn last_seen_far(&self) -> u32 {
        self.last_seen_far
    }

    /// Detach both cached batches.
    pub(crate) fn take_artifacts(&mut self) -> impl Iterator<Item = GeometryHandle> {
        [self.mid.take(), self.far.take()].into_iter().flatten()
    }
}

/// Tree squares covering the map.
pub struct TreeGrid {
    bounds: GridBounds,
    squares: Vec<TreeSquare>,
    tree_count: usize,
    retired: Vec<GeometryHandle>,
}

impl TreeGrid {
    /// Create an empty grid of `squares_x * squares_z` squares, each `extent`
    /// world units wide.
    pub fn new(squares_x: usize, squares_z: usize, extent: f32) -> Result<Self, TreeError> {
        if squares_x == 0 || squares_z == 0 {
            return Err(TreeError::EmptyGrid {
                squares_x,
                squares_z,
            });
        }
        if !(extent.is_finite() && extent > 0.0) {
            return Err(TreeError::InvalidExtent(extent));
        }

        let count = squares_x * squares_z;
        Ok(Self {
            bounds: GridBounds {
                squares_x,
                squares_z,
                extent,
            },
            squares: (0..count).map(|_| TreeSquare::new()).collect(),
            tree_count: 0,
            retired: Vec::new(),
        })
    }

    /// Grid size and resolution.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// World-space width of one square.
    pub fn extent(&self) -> f32 {
        self.bounds.extent
    }

    /// Total number of squares.
    pub fn square_count(&self) -> usize {
        self.squares.len()
    }

    /// Total number of trees across all squares.
    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    /// Square containing `position`, or an error if it lies off the grid.
    pub fn coord_of(&self, position: Vec3) -> Result<SquareCoord, TreeError> {
        let coord = self.bounds.unclamped_coord(position);
        let finite = position.x.is_finite() && position.z.is_finite();
        if finite && position.x >= 0.0 && position.z >= 0.0 && self.bounds.contains(coord) {
            Ok(coord)
        } else {
            Err(TreeError::OutOfBounds {
                x: position.x,
                z: position.z,
                squares_x: self.bounds.squares_x,
                squares_z: self.bounds.squares_z,
            })
        }
    }

    /// Flat index of a square, if the coordinate is on the grid.
    pub fn index_of(&self, coord: SquareCoord) -> Option<usize> {
        self.bounds
            .contains(coord)
            .then(|| coord.z as usize * self.bounds.squares_x + coord.x as usize)
    }

    /// Square at a coordinate.
    pub fn square(&self, coord: SquareCoord) -> Option<&TreeSquare> {
        self.index_of(coord).map(|i| &self.squares[i])
    }

    pub(crate) fn square_mut(&mut self, coord: SquareCoord) -> Option<&mut TreeSquare> {
        self.index_of(coord).map(|i| &mut self.squares[i])
    }

    pub(crate) fn square_at_mut(&mut self, index: usize) -> Option<&mut TreeSquare> {
        self.squares.get_mut(index)
    }

    /// Tree placed at `position`, if any.
    pub fn get(&self, position: Vec3) -> Option<&TreeInstance> {
        let coord = self.coord_of(position).ok()?;
        self.square(coord)?.get(InstanceKey::from_position(position))
    }

    /// Place a tree. A tree already at the same truncated position is
    /// replaced and returned.
    pub fn add(
        &mut self,
        tree_type: TreeType,
        position: Vec3,
    ) -> Result<Option<TreeInstance>, TreeError> {
        let coord = self.coord_of(position)?;
        let instance = TreeInstance::new(tree_type, position);
        let replaced = self
            .square_mut(coord)
            .and_then(|square| square.trees.insert(instance.key, instance));
        if replaced.is_none() {
            self.tree_count += 1;
        }
        self.invalidate(coord);
        Ok(replaced)
    }

    /// Remove the tree at `position`. Removing an absent tree is not an error,
    /// but still invalidates the square's batches.
    pub fn remove(&mut self, position: Vec3) -> Result<Option<TreeInstance>, TreeError> {
        let coord = self.coord_of(position)?;
        let key = InstanceKey::from_position(position);
        let removed = self
            .square_mut(coord)
            .and_then(|square| square.trees.remove(&key));
        if removed.is_some() {
            self.tree_count -= 1;
        }
        self.invalidate(coord);
        Ok(removed)
    }

    /// Retire both cached batches of the square containing `position`.
    pub fn invalidate_at(&mut self, position: Vec3) -> Result<(), TreeError> {
        let coord = self.coord_of(position)?;
        self.invalidate(coord);
        Ok(())
    }

    fn invalidate(&mut self, coord: SquareCoord) {
        if let Some(index) = self.index_of(coord) {
            self.retired.extend(self.squares[index].take_artifacts());
        }
    }

    /// Take the handles retired since the last drain.
    pub fn drain_retired(&mut self) -> Vec<GeometryHandle> {
        std::mem::take(&mut self.retired)
    }

    /// Number of handles waiting to be released.
    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}
