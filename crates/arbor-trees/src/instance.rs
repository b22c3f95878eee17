//! Tree instances, their visual variant, and their placement identity.

use glam::{Vec2, Vec3};

use crate::TreeError;

/// Number of visual variants in the billboard atlas.
pub const TREE_TYPE_COUNT: u8 = 16;

/// Variants below this index are pines, the rest are leafy trees.
const PINE_TYPE_COUNT: u8 = 8;

/// Width of one variant column in the atlas.
const ATLAS_COLUMN_WIDTH: f32 = 0.125;

/// Visual variant of a tree, in `0..16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeType(u8);

impl TreeType {
    /// Validate a raw type index.
    pub fn new(index: u8) -> Result<Self, TreeError> {
        if index < TREE_TYPE_COUNT {
            Ok(Self(index))
        } else {
            Err(TreeError::InvalidTreeType(index))
        }
    }

    /// The raw type index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Whether this variant is drawn from the pine half of the atlas.
    pub fn is_pine(self) -> bool {
        self.0 < PINE_TYPE_COUNT
    }

    /// Index of this variant within its family, in `0..8`.
    pub fn variant(self) -> u8 {
        self.0 % PINE_TYPE_COUNT
    }

    /// Texture-coordinate offset of this variant's column and row in the atlas.
    ///
    /// Pines live in the upper half of the atlas (`v + 0.5`), leafy trees in
    /// the lower half.
    pub fn atlas_offset(self) -> Vec2 {
        let row = if self.is_pine() { 0.5 } else { 0.0 };
        Vec2::new(f32::from(self.variant()) * ATLAS_COLUMN_WIDTH, row)
    }
}

/// Placement identity of a tree: its world position truncated to integers.
///
/// Two trees whose positions truncate to the same `(x, z)` pair are the same
/// placement; adding the second one replaces the first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    /// Truncated world x.
    pub x: i32,
    /// Truncated world z.
    pub z: i32,
}

impl InstanceKey {
    /// Quantize a world position into a key.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            x: position.x as i32,
            z: position.z as i32,
        }
    }
}

/// A single placed tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeInstance {
    /// Placement identity.
    pub key: InstanceKey,
    /// Base of the trunk in world space.
    pub position: Vec3,
    /// Visual variant.
    pub tree_type: TreeType,
}

impl TreeInstance {
    /// Create an instance, deriving its key from the position.
    pub fn new(tree_type: TreeType, position: Vec3) -> Self {
        Self {
            key: InstanceKey::from_position(position),
            position,
            tree_type,
        }
    }
}
