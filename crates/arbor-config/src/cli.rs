//! Command-line argument parsing for the simulation harness.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Arbor command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "arbor-sim", about = "Headless tree drawer simulation")]
pub struct CliArgs {
    /// Frames to simulate.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Trees scattered at start.
    #[arg(long)]
    pub trees: Option<u32>,

    /// RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Draw distance in tree squares.
    #[arg(long)]
    pub tree_distance: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(frames) = args.frames {
            self.sim.frames = frames;
        }
        if let Some(trees) = args.trees {
            self.sim.trees = trees;
        }
        if let Some(seed) = args.seed {
            self.sim.seed = seed;
        }
        if let Some(distance) = args.tree_distance {
            self.lod.tree_distance = distance;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
