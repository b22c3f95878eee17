//! Amortized reclamation of cached square batches.
//!
//! Each pass inspects a window of `ceil(squares / divisor)` squares starting
//! where the previous pass stopped, wrapping at the end of the grid. Any
//! batch whose square has not needed it for more than the staleness window is
//! released. A full sweep of the grid therefore takes `divisor` passes.

use crate::arena::GeometryArena;
use crate::grid::TreeGrid;

/// Frames a batch may go unused before it is reclaimed.
pub const DEFAULT_STALENESS_FRAMES: u32 = 50;

/// Passes needed to cover the whole grid.
pub const DEFAULT_SWEEP_DIVISOR: usize = 20;

/// Moving-window reclaimer for square batches.
#[derive(Clone, Debug)]
pub struct CacheSweeper {
    staleness: u32,
    divisor: usize,
    cursor: usize,
}

impl Default for CacheSweeper {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_FRAMES, DEFAULT_SWEEP_DIVISOR)
    }
}

impl CacheSweeper {
    /// Create a sweeper. A divisor of zero is treated as one.
    pub fn new(staleness: u32, divisor: usize) -> Self {
        Self {
            staleness,
            divisor: divisor.max(1),
            cursor: 0,
        }
    }

    /// Frames a batch may go unused.
    pub fn staleness(&self) -> u32 {
        self.staleness
    }

    /// Index of the first square the next pass inspects.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Squares inspected per pass for a grid of `square_count` squares.
    pub fn window_len(&self, square_count: usize) -> usize {
        square_count.div_ceil(self.divisor)
    }

    /// Whether a batch last needed at `stamp` is stale at `frame`.
    ///
    /// Nothing is stale during the first `staleness` frames.
    pub fn is_stale(&self, stamp: u32, frame: u32) -> bool {
        frame
            .checked_sub(self.staleness)
            .is_some_and(|limit| stamp < limit)
    }

    /// Inspect the next window and release stale batches. Returns how many
    /// batches were released.
    pub fn sweep(&mut self, grid: &mut TreeGrid, arena: &mut GeometryArena, frame: u32) -> usize {
        let count = grid.square_count();
        let window = self.window_len(count);
        if window == 0 {
            return 0;
        }

        let mut reclaimed = 0;
        for offset in 0..window {
            let index = (self.cursor + offset) % count;
            let Some(square) = grid.square_at_mut(index) else {
                continue;
            };

            if self.is_stale(square.last_seen, frame)
                && let Some(handle) = square.mid.take()
            {
                arena.release(handle);
                reclaimed += 1;
            }
            if self.is_stale(square.last_seen_far, frame)
                && let Some(handle) = square.far.take()
            {
                arena.release(handle);
                reclaimed += 1;
            }
        }
        self.cursor = (self.cursor + window) % count;

        if reclaimed > 0 {
            log::debug!("Reclaimed {reclaimed} stale tree batches at frame {frame}");
        }
        reclaimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BillboardGeometry;
    use crate::grid::SquareCoord;

    fn cached_grid(squares_x: usize, squares_z: usize) -> (TreeGrid, GeometryArena) {
        let mut grid = TreeGrid::new(squares_x, squares_z, 512.0).unwrap();
        let mut arena = GeometryArena::new();
        for z in 0..squares_z as i32 {
            for x in 0..squares_x as i32 {
                let square = grid.square_mut(SquareCoord::new(x, z)).unwrap();
                square.mid = Some(arena.insert(BillboardGeometry::new()));
                square.far = Some(arena.insert(BillboardGeometry::new()));
            }
        }
        (grid, arena)
    }

    fn stamp(grid: &mut TreeGrid, coord: SquareCoord, mid: u32, far: u32) {
        let square = grid.square_mut(coord).unwrap();
        square.last_seen = mid;
        square.last_seen_far = far;
    }

    #[test]
    fn test_staleness_boundary() {
        let sweeper = CacheSweeper::default();
        assert!(sweeper.is_stale(49, 100));
        assert!(!sweeper.is_stale(50, 100));
        assert!(!sweeper.is_stale(51, 100));
        assert!(!sweeper.is_stale(0, 49));
        assert!(!sweeper.is_stale(0, 50));
        assert!(sweeper.is_stale(0, 51));
    }

    #[test]
    fn test_window_is_a_twentieth_of_the_grid() {
        let sweeper = CacheSweeper::default();
        assert_eq!(sweeper.window_len(400), 20);
        assert_eq!(sweeper.window_len(401), 21);
        assert_eq!(sweeper.window_len(5), 1);
        assert_eq!(sweeper.window_len(0), 0);
    }

    /// A square stamped 51 frames ago loses its batches; one stamped 49 frames
    /// ago keeps them.
    #[test]
    fn test_stale_squares_reclaimed_fresh_squares_kept() {
        let (mut grid, mut arena) = cached_grid(2, 1);
        let frame = 200;
        stamp(&mut grid, SquareCoord::new(0, 0), frame - 51, frame - 51);
        stamp(&mut grid, SquareCoord::new(1, 0), frame - 49, frame - 49);

        let mut sweeper = CacheSweeper::new(50, 1);
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, frame), 2);

        let stale = grid.square(SquareCoord::new(0, 0)).unwrap();
        assert!(stale.mid_artifact().is_none());
        assert!(stale.far_artifact().is_none());
        let fresh = grid.square(SquareCoord::new(1, 0)).unwrap();
        assert!(fresh.mid_artifact().is_some());
        assert!(fresh.far_artifact().is_some());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_mid_and_far_stamps_are_independent() {
        let (mut grid, mut arena) = cached_grid(1, 1);
        stamp(&mut grid, SquareCoord::new(0, 0), 10, 95);
        let mut sweeper = CacheSweeper::new(50, 1);
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, 100), 1);
        let square = grid.square(SquareCoord::new(0, 0)).unwrap();
        assert!(square.mid_artifact().is_none());
        assert!(square.far_artifact().is_some());
    }

    #[test]
    fn test_window_advances_and_wraps() {
        let (mut grid, mut arena) = cached_grid(5, 5);
        let mut sweeper = CacheSweeper::new(50, 4);
        assert_eq!(sweeper.window_len(25), 7);

        // All squares are stale; each pass reclaims exactly its window.
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, 1000), 14);
        assert_eq!(sweeper.cursor(), 7);
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, 1000), 14);
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, 1000), 14);
        assert_eq!(sweeper.cursor(), 21);

        // The fourth pass wraps: squares 21..25 are reclaimed, 0..3 already were.
        assert_eq!(sweeper.sweep(&mut grid, &mut arena, 1000), 8);
        assert_eq!(sweeper.cursor(), 3);
        assert!(arena.is_empty());
    }

    #[test]
    fn test_full_cycle_reaches_every_square() {
        let (mut grid, mut arena) = cached_grid(8, 8);
        let mut sweeper = CacheSweeper::default();
        for _ in 0..20 {
            sweeper.sweep(&mut grid, &mut arena, 500);
        }
        assert!(arena.is_empty());
    }
}
