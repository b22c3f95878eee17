//! Generation-checked storage for cached billboard batches.
//!
//! Squares hold [`GeometryHandle`]s instead of geometry. Releasing a slot bumps
//! its generation, so handles kept past a release resolve to nothing rather
//! than to whatever batch reuses the slot.

use crate::geometry::BillboardGeometry;

/// Opaque reference to a batch stored in a [`GeometryArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    geometry: Option<BillboardGeometry>,
}

/// Arena of compiled billboard batches.
#[derive(Default)]
pub struct GeometryArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    live_vertices: usize,
}

impl GeometryArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a batch and return its handle. Freed slots are reused first.
    pub fn insert(&mut self, geometry: BillboardGeometry) -> GeometryHandle {
        self.live += 1;
        self.live_vertices += geometry.len();

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.geometry = Some(geometry);
            return GeometryHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            geometry: Some(geometry),
        });
        GeometryHandle {
            index,
            generation: 0,
        }
    }

    /// Look up a batch. Returns `None` for released or stale handles.
    pub fn get(&self, handle: GeometryHandle) -> Option<&BillboardGeometry> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.geometry.as_ref())
    }

    /// Whether `handle` still refers to a live batch.
    pub fn contains(&self, handle: GeometryHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Rebuild a live batch in place, keeping its handle.
    ///
    /// Returns `false` (and drops `geometry`) if the handle is stale.
    pub fn replace(&mut self, handle: GeometryHandle, geometry: BillboardGeometry) -> bool {
        let Some(slot) = self.live_slot_mut(handle) else {
            return false;
        };
        let new_len = geometry.len();
        let old_len = slot.geometry.replace(geometry).map_or(0, |g| g.len());
        self.live_vertices = self.live_vertices - old_len + new_len;
        true
    }

    /// Free a batch. Releasing a stale handle is a no-op.
    pub fn release(&mut self, handle: GeometryHandle) -> Option<BillboardGeometry> {
        let slot = self.live_slot_mut(handle)?;
        let geometry = slot.geometry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        self.live_vertices -= geometry.len();
        Some(geometry)
    }

    /// Number of live batches.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether no batch is live.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total vertices across live batches.
    pub fn vertex_count(&self) -> usize {
        self.live_vertices
    }

    fn live_slot_mut(&mut self, handle: GeometryHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.geometry.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::TreeType;
    use glam::Vec3;

    fn batch(trees: usize) -> BillboardGeometry {
        let mut geometry = BillboardGeometry::new();
        for i in 0..trees {
            geometry.push_mid(Vec3::new(i as f32, 0.0, 0.0), TreeType::new(0).unwrap());
        }
        geometry
    }

    #[test]
    fn test_insert_and_get() {
        let mut arena = GeometryArena::new();
        let handle = arena.insert(batch(2));
        assert_eq!(arena.get(handle).map(BillboardGeometry::len), Some(24));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.vertex_count(), 24);
    }

    #[test]
    fn test_released_handle_is_stale_after_slot_reuse() {
        let mut arena = GeometryArena::new();
        let old = arena.insert(batch(1));
        assert!(arena.release(old).is_some());

        let new = arena.insert(batch(3));
        assert_ne!(old, new);
        assert!(arena.get(old).is_none());
        assert_eq!(arena.get(new).map(BillboardGeometry::len), Some(36));
    }

    #[test]
    fn test_double_release_is_noop() {
        let mut arena = GeometryArena::new();
        let handle = arena.insert(batch(1));
        assert!(arena.release(handle).is_some());
        assert!(arena.release(handle).is_none());
        assert!(arena.is_empty());
        assert_eq!(arena.vertex_count(), 0);
    }

    #[test]
    fn test_replace_keeps_handle_and_tracks_vertices() {
        let mut arena = GeometryArena::new();
        let handle = arena.insert(batch(1));
        assert!(arena.replace(handle, batch(4)));
        assert_eq!(arena.vertex_count(), 48);
        assert!(arena.contains(handle));

        arena.release(handle);
        assert!(!arena.replace(handle, batch(1)));
        assert_eq!(arena.vertex_count(), 0);
    }
}
