//! CPU-side billboard geometry for the three tree shapes.
//!
//! Every shape is a list of quads (four vertices each) textured from the
//! tree atlas. The near shape is three crossed quads, the mid shape swaps the
//! horizontal canopy quad for a diamond, and the far shape is a single
//! camera-facing quad.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::instance::TreeType;

/// Height of the tallest tree, in world units.
pub const MAX_TREE_HEIGHT: f32 = 60.0;

const HALF_TREE_HEIGHT: f32 = MAX_TREE_HEIGHT * 0.5;

/// Height of the horizontal canopy quad above the tree base.
const CANOPY_HEIGHT: f32 = MAX_TREE_HEIGHT * 0.4;

/// Atlas rows `(v_start, v_end)` for the two vertical quads and the canopy quad.
const LEAF_ROWS: [(f32, f32); 3] = [(0.001, 0.124), (0.126, 0.249), (0.251, 0.374)];

/// Atlas row used by the far billboard.
const FAR_ROW: (f32, f32) = (0.376, 0.499);

/// Atlas column `(u_start, u_end)` shared by every quad.
const COLUMN: (f32, f32) = (0.0, 0.125);

/// Vertices per quad.
pub const QUAD_VERTICES: usize = 4;

/// Vertices emitted by [`BillboardGeometry::push_near`] and [`BillboardGeometry::push_mid`].
pub const CROSSED_VERTICES: usize = 3 * QUAD_VERTICES;

/// A billboard vertex: world position plus atlas texture coordinate.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct BillboardVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Atlas texture coordinate.
    pub uv: [f32; 2],
}

/// A batch of billboard quads, ready to upload as a vertex buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BillboardGeometry {
    vertices: Vec<BillboardVertex>,
}

impl BillboardGeometry {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty batch with room for `vertices` vertices.
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
        }
    }

    /// Vertices in submission order.
    pub fn vertices(&self) -> &[BillboardVertex] {
        &self.vertices
    }

    /// Raw vertex bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the batch has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of quads.
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / QUAD_VERTICES
    }

    /// Append the near shape: two crossed vertical quads and a square canopy.
    pub fn push_near(&mut self, base: Vec3, tree_type: TreeType) {
        let offset = tree_type.atlas_offset();
        self.push_crossed(base, offset);

        let y = base.y + CANOPY_HEIGHT;
        let h = HALF_TREE_HEIGHT;
        self.push_quad(
            [
                Vec3::new(base.x + h, y, base.z + h),
                Vec3::new(base.x + h, y, base.z - h),
                Vec3::new(base.x - h, y, base.z - h),
                Vec3::new(base.x - h, y, base.z + h),
            ],
            LEAF_ROWS[2],
            offset,
        );
    }

    /// Append the mid shape: two crossed vertical quads and a diamond canopy.
    pub fn push_mid(&mut self, base: Vec3, tree_type: TreeType) {
        let offset = tree_type.atlas_offset();
        self.push_crossed(base, offset);

        let y = base.y + CANOPY_HEIGHT;
        let h = HALF_TREE_HEIGHT;
        self.push_quad(
            [
                Vec3::new(base.x + h, y, base.z),
                Vec3::new(base.x, y, base.z - h),
                Vec3::new(base.x - h, y, base.z),
                Vec3::new(base.x, y, base.z + h),
            ],
            LEAF_ROWS[2],
            offset,
        );
    }

    /// Append the far shape: a single quad spanning `base ± side`.
    ///
    /// `side` is the horizontal half-width vector, perpendicular to the view
    /// direction the batch is baked for.
    pub fn push_far(&mut self, base: Vec3, side: Vec3, tree_type: TreeType) {
        let up = Vec3::Y * MAX_TREE_HEIGHT;
        self.push_quad(
            [base + side, base + side + up, base - side + up, base - side],
            FAR_ROW,
            tree_type.atlas_offset(),
        );
    }

    fn push_crossed(&mut self, base: Vec3, offset: Vec2) {
        let (x, y, z) = (base.x, base.y, base.z);
        let (h, top) = (HALF_TREE_HEIGHT, base.y + MAX_TREE_HEIGHT);
        self.push_quad(
            [
                Vec3::new(x + h, y, z),
                Vec3::new(x + h, top, z),
                Vec3::new(x - h, top, z),
                Vec3::new(x - h, y, z),
            ],
            LEAF_ROWS[0],
            offset,
        );
        self.push_quad(
            [
                Vec3::new(x, y, z + h),
                Vec3::new(x, top, z + h),
                Vec3::new(x, top, z - h),
                Vec3::new(x, y, z - h),
            ],
            LEAF_ROWS[1],
            offset,
        );
    }

    fn push_quad(&mut self, corners: [Vec3; 4], row: (f32, f32), offset: Vec2) {
        let (u0, u1) = (COLUMN.0 + offset.x, COLUMN.1 + offset.x);
        let (v0, v1) = (row.0 + offset.y, row.1 + offset.y);
        let uvs = [[u0, v0], [u0, v1], [u1, v1], [u1, v0]];
        self.vertices
            .extend(corners.iter().zip(uvs).map(|(p, uv)| BillboardVertex {
                position: p.to_array(),
                uv,
            }));
    }
}

/// Horizontal half-width vector for far billboards facing `view_dir`.
pub fn far_side_vector(view_dir: Vec3) -> Vec3 {
    Vec3::Y.cross(view_dir) * HALF_TREE_HEIGHT
}
