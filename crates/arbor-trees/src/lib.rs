//! Tree rendering support: a spatial grid of tree squares, cached billboard
//! batches per square, distance-based LOD selection, amortized cache
//! reclamation, and falling-tree animation.
//!
//! Nothing here talks to a graphics API. A draw pass produces a
//! [`FramePlan`] listing cached batches (by [`GeometryHandle`]), per-tree
//! draws and freshly built billboard batches; a backend turns that into GPU
//! work.

mod arena;
mod camera;
mod drawer;
mod error;
mod falling;
mod geometry;
mod grid;
mod instance;
mod lod;
mod plan;
mod shared;
mod sweep;
mod visibility;

pub use arena::{GeometryArena, GeometryHandle};
pub use camera::{Camera, ViewCamera};
pub use drawer::{DrawerSettings, TreeDrawer};
pub use error::TreeError;
pub use falling::{FallParams, FallingTree, FallingTrees};
pub use geometry::{BillboardGeometry, BillboardVertex, MAX_TREE_HEIGHT, far_side_vector};
pub use grid::{GridBounds, SquareCoord, TreeGrid, TreeSquare};
pub use instance::{InstanceKey, TREE_TYPE_COUNT, TreeInstance, TreeType};
pub use lod::{LodThresholds, NearThresholds, SquareLod, TreeLod, square_distance_factor};
pub use plan::{DrawCommand, DrawPass, FadeEntry, FarTexture, FramePlan, FrameStats};
pub use shared::SharedTreeDrawer;
pub use sweep::{CacheSweeper, DEFAULT_STALENESS_FRAMES, DEFAULT_SWEEP_DIVISOR};
pub use visibility::{GridVisibility, RadiusVisibility};
