//! Turning a loaded [`Config`] into a populated tree drawer.

use arbor_config::Config;
use arbor_trees::{
    DrawerSettings, FallParams, LodThresholds, TREE_TYPE_COUNT, TreeDrawer, TreeError, TreeGrid,
};
use glam::Vec3;
use rand::Rng;

/// Drawer tuning from the `lod`, `cache` and `falling` sections.
pub fn drawer_settings(config: &Config) -> Result<DrawerSettings, TreeError> {
    let lod = &config.lod;
    let falling = &config.falling;
    Ok(DrawerSettings {
        lod: LodThresholds::new(lod.mid, lod.fade, lod.far)?,
        near_radius: lod.near_radius,
        staleness_frames: config.cache.staleness_frames,
        sweep_divisor: config.cache.sweep_divisor,
        fall: FallParams {
            step: falling.step,
            damping: falling.damping,
            min_speed: falling.min_speed,
            speed_scale: falling.speed_scale,
            max_lateral_speed: falling.max_lateral_speed,
            ..FallParams::default()
        },
        ..DrawerSettings::default()
    })
}

/// An empty grid sized from the `grid` section.
pub fn empty_grid(config: &Config) -> Result<TreeGrid, TreeError> {
    let (squares_x, squares_z) = config.grid.tree_squares();
    TreeGrid::new(squares_x, squares_z, config.grid.tree_square_extent())
}

/// Scatter `count` trees of random type over the grid. Returns the positions
/// that ended up holding a tree.
pub fn scatter_trees(
    drawer: &mut TreeDrawer,
    count: u32,
    rng: &mut impl Rng,
) -> Result<Vec<Vec3>, TreeError> {
    let bounds = drawer.grid().bounds();
    let size_x = bounds.squares_x as f32 * bounds.extent;
    let size_z = bounds.squares_z as f32 * bounds.extent;

    let mut placed = Vec::with_capacity(count as usize);
    for _ in 0..count {
        // Whole units, so the stored key matches the position exactly.
        let position = Vec3::new(
            rng.gen_range(0..size_x as u32) as f32,
            0.0,
            rng.gen_range(0..size_z as u32) as f32,
        );
        let tree_type = rng.gen_range(0..TREE_TYPE_COUNT);
        if drawer.add_tree(tree_type, position)?.is_none() {
            placed.push(position);
        }
    }
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256StarStar;

    #[test]
    fn test_default_config_maps_to_default_settings() {
        let settings = drawer_settings(&Config::default()).unwrap();
        assert_eq!(settings, DrawerSettings::default());

        let grid = empty_grid(&Config::default()).unwrap();
        assert_eq!(grid.square_count(), 64);
        assert_eq!(grid.extent(), 512.0);
    }

    #[test]
    fn test_unordered_bands_rejected() {
        let mut config = Config::default();
        config.lod.mid = 3.0;
        assert!(matches!(
            drawer_settings(&config),
            Err(TreeError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_scatter_is_reproducible() {
        let config = Config::default();
        let scatter = |seed| {
            let mut drawer = TreeDrawer::new(empty_grid(&config).unwrap(), DrawerSettings::default());
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            let placed = scatter_trees(&mut drawer, 2000, &mut rng).unwrap();
            assert_eq!(placed.len(), drawer.grid().tree_count());
            placed
        };
        assert_eq!(scatter(7), scatter(7));
        assert_ne!(scatter(7), scatter(8));
    }
}
