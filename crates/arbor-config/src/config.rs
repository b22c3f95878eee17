//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name used inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Default config directory, `<platform config dir>/arbor`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("arbor"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Map and square sizes.
    pub grid: GridConfig,
    /// Level-of-detail bands.
    pub lod: LodConfig,
    /// Render-cache reclamation.
    pub cache: CacheConfig,
    /// Fall animation constants.
    pub falling: FallingConfig,
    /// Headless simulation harness.
    pub sim: SimConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Map and square sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    /// Map width in heightmap squares.
    pub map_squares_x: u32,
    /// Map depth in heightmap squares.
    pub map_squares_z: u32,
    /// World units per heightmap square.
    pub square_size: f32,
    /// Heightmap squares per tree square, along each axis.
    pub tree_square_size: u32,
}

impl GridConfig {
    /// World-space side length of one tree square.
    pub fn tree_square_extent(&self) -> f32 {
        self.square_size * self.tree_square_size as f32
    }

    /// Number of tree squares along x and z, rounding partial squares up.
    pub fn tree_squares(&self) -> (usize, usize) {
        let per = self.tree_square_size.max(1);
        (
            self.map_squares_x.div_ceil(per) as usize,
            self.map_squares_z.div_ceil(per) as usize,
        )
    }
}

/// Level-of-detail bands, as multiples of the draw distance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LodConfig {
    /// Squares closer than this factor use the mid batch.
    pub mid: f32,
    /// Far batches start fading at this factor.
    pub fade: f32,
    /// Squares beyond this factor are not drawn.
    pub far: f32,
    /// Draw distance in tree squares.
    pub tree_distance: f32,
    /// Chebyshev radius of the per-tree region around the camera.
    pub near_radius: i32,
}

/// Render-cache reclamation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Frames a cached batch may go unused before it is reclaimed.
    pub staleness_frames: u32,
    /// Sweeper passes per full grid scan.
    pub sweep_divisor: usize,
}

/// Fall animation constants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallingConfig {
    /// Fraction of speed added to the fall position per tick.
    pub step: f32,
    /// Gravity-like acceleration scale.
    pub damping: f32,
    /// Floor for the initial speed.
    pub min_speed: f32,
    /// Initial speed per unit of lateral impact speed.
    pub speed_scale: f32,
    /// Impacts faster than this are not animated.
    pub max_lateral_speed: f32,
}

/// Headless simulation harness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Frames to simulate.
    pub frames: u32,
    /// Trees scattered at start.
    pub trees: u32,
    /// RNG seed.
    pub seed: u64,
    /// Trees felled per frame.
    pub felled_per_frame: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log per-frame statistics from the harness.
    pub frame_stats: bool,
}

// --- Default implementations ---

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            map_squares_x: 512,
            map_squares_z: 512,
            square_size: 8.0,
            tree_square_size: 64,
        }
    }
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            mid: 1.0,
            fade: 1.5,
            far: 2.0,
            tree_distance: 4.0,
            near_radius: 2,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            staleness_frames: 50,
            sweep_divisor: 20,
        }
    }
}

impl Default for FallingConfig {
    fn default() -> Self {
        Self {
            step: 0.1,
            damping: 0.04,
            min_speed: 0.01,
            speed_scale: 0.0004,
            max_lateral_speed: 500.0,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            trees: 20_000,
            seed: 42,
            felled_per_frame: 1,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            frame_stats: false,
        }
    }
}

// --- Validation ---

impl Config {
    /// Reject values the drawer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::InvalidValue {
                field,
                reason: reason.to_string(),
            })
        };

        if self.grid.map_squares_x == 0 || self.grid.map_squares_z == 0 {
            return invalid("grid.map_squares", "map must be at least one square");
        }
        if self.grid.tree_square_size == 0 {
            return invalid("grid.tree_square_size", "must be positive");
        }
        if !(self.grid.square_size > 0.0 && self.grid.square_size.is_finite()) {
            return invalid("grid.square_size", "must be positive and finite");
        }
        let lod = &self.lod;
        if !(lod.mid > 0.0 && lod.mid <= lod.fade && lod.fade < lod.far && lod.far.is_finite()) {
            return invalid("lod", "expected 0 < mid <= fade < far");
        }
        if !(lod.tree_distance > 0.0) {
            return invalid("lod.tree_distance", "must be positive");
        }
        if lod.near_radius < 0 {
            return invalid("lod.near_radius", "must not be negative");
        }
        if self.cache.sweep_divisor == 0 {
            return invalid("cache.sweep_divisor", "must be positive");
        }
        let falling = &self.falling;
        let non_negative = [
            ("falling.step", falling.step),
            ("falling.damping", falling.damping),
            ("falling.min_speed", falling.min_speed),
            ("falling.speed_scale", falling.speed_scale),
            ("falling.max_lateral_speed", falling.max_lateral_speed),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return invalid(field, "must be finite and not negative");
            }
        }
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("tree_square_size: 64"));
        assert!(ron_str.contains("staleness_frames: 50"));
    }

    #[test]
    fn test_default_grid_matches_tree_squares() {
        let grid = GridConfig::default();
        assert_eq!(grid.tree_square_extent(), 512.0);
        assert_eq!(grid.tree_squares(), (8, 8));

        let ragged = GridConfig {
            map_squares_x: 130,
            map_squares_z: 64,
            ..GridConfig::default()
        };
        assert_eq!(ragged.tree_squares(), (3, 1));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(grid: (), lod: (), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.falling, FallingConfig::default());
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_fields() {
        let config: Config = ron::from_str("(lod: (tree_distance: 6.0))").unwrap();
        assert_eq!(config.lod.tree_distance, 6.0);
        assert_eq!(config.lod.fade, 1.5);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_unordered_bands() {
        let mut config = Config::default();
        config.lod.fade = 2.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "lod", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_divisor() {
        let mut config = Config::default();
        config.cache.sweep_divisor = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "cache.sweep_divisor",
                ..
            })
        ));
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_fall_params() {
        let mut config = Config::default();
        config.falling.step = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "falling.step",
                ..
            })
        ));

        let mut config = Config::default();
        config.falling.damping = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "falling.damping",
                ..
            })
        ));

        let mut config = Config::default();
        config.falling.min_speed = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_infinite_far_band() {
        let mut config = Config::default();
        config.lod.far = f32::INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "lod", .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.grid.map_squares_x = 1024;
        config.sim.seed = 7;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "(grid: (tree_square_size: 0))").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.lod.tree_distance = 8.0;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.lod.tree_distance), Some(8.0));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
