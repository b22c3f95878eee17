//! Error types for tree placement and drawer configuration.

/// Errors raised by the tree grid, the LOD thresholds, and the drawer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    /// The position does not fall inside any square of the grid.
    #[error("position ({x}, {z}) lies outside the {squares_x}x{squares_z} tree grid")]
    OutOfBounds {
        /// World-space x coordinate that was rejected.
        x: f32,
        /// World-space z coordinate that was rejected.
        z: f32,
        /// Number of squares along x.
        squares_x: usize,
        /// Number of squares along z.
        squares_z: usize,
    },

    /// Tree type index outside the atlas.
    #[error("tree type {0} is out of range (expected 0..16)")]
    InvalidTreeType(u8),

    /// LOD factors must satisfy `0 < mid <= fade < far`.
    #[error("invalid LOD thresholds: mid={mid}, fade={fade}, far={far}")]
    InvalidThresholds {
        /// Mid-band upper factor.
        mid: f32,
        /// Fade start factor.
        fade: f32,
        /// Far-band upper factor.
        far: f32,
    },

    /// A grid needs at least one square on each axis.
    #[error("tree grid must have at least one square per axis (got {squares_x}x{squares_z})")]
    EmptyGrid {
        /// Requested squares along x.
        squares_x: usize,
        /// Requested squares along z.
        squares_z: usize,
    },

    /// The world-space width of a square must be positive and finite.
    #[error("square extent must be positive and finite (got {0})")]
    InvalidExtent(f32),
}
