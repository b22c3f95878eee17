//! Configuration for the tree drawer and its simulation harness.
//!
//! Settings persist to disk as RON files, can be overridden from the command
//! line via clap, and can be re-read to detect edits while running.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CONFIG_FILE_NAME, CacheConfig, Config, DebugConfig, FallingConfig, GridConfig, LodConfig,
    SimConfig, default_config_dir,
};
pub use error::ConfigError;
