//! Headless tree drawer simulation.
//!
//! Plants a forest, orbits a camera over it and fells trees while planning a
//! main and a shadow pass every frame. Nothing is rendered; the plans'
//! statistics are logged instead.
//!
//! Run with `cargo run -p arbor-sim -- --frames 300 --trees 50000`.

mod setup;

use std::f32::consts::{FRAC_PI_3, TAU};
use std::path::PathBuf;

use arbor_config::{CliArgs, Config, default_config_dir};
use arbor_trees::{Camera, FrameStats, RadiusVisibility, TreeDrawer, TreeError};
use clap::Parser;
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{error, info};

/// Camera height above the ground while orbiting.
const ORBIT_HEIGHT: f32 = 150.0;

/// Impacts are drawn from this range on each horizontal axis; the fastest
/// ones exceed the animation limit on purpose.
const MAX_IMPACT: f32 = 400.0;

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    arbor_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config) {
        error!("Simulation failed: {e}");
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), TreeError> {
    let mut rng = Xoshiro256StarStar::seed_from_u64(config.sim.seed);
    let mut drawer = TreeDrawer::new(setup::empty_grid(config)?, setup::drawer_settings(config)?);
    let mut standing = setup::scatter_trees(&mut drawer, config.sim.trees, &mut rng)?;
    info!(
        trees = standing.len(),
        squares = drawer.grid().square_count(),
        seed = config.sim.seed,
        "Forest planted"
    );

    let bounds = drawer.grid().bounds();
    let center = Vec3::new(
        bounds.squares_x as f32 * bounds.extent * 0.5,
        0.0,
        bounds.squares_z as f32 * bounds.extent * 0.5,
    );
    let orbit_radius = center.x.min(center.z) * 0.6;
    let mut camera = Camera::new(center, Vec3::NEG_Z, FRAC_PI_3, 16.0 / 9.0, 1.0, 50_000.0);
    let visibility = RadiusVisibility::default();

    let mut totals = FrameStats::default();
    let mut shadow_totals = FrameStats::default();
    let (mut felled, mut too_fast, mut landed) = (0usize, 0usize, 0usize);

    for frame in 1..=config.sim.frames {
        let angle = frame as f32 / config.sim.frames as f32 * TAU;
        let eye = center + Vec3::new(angle.cos(), 0.0, angle.sin()) * orbit_radius
            + Vec3::Y * ORBIT_HEIGHT;
        // Tangent to the orbit, tilted slightly down.
        camera.look_to(eye, Vec3::new(-angle.sin(), -0.15, angle.cos()));

        for _ in 0..config.sim.felled_per_frame {
            if standing.is_empty() {
                break;
            }
            let position = standing.swap_remove(rng.gen_range(0..standing.len()));
            let Some(tree) = drawer.delete_tree(position)? else {
                continue;
            };
            let impact = Vec3::new(
                rng.gen_range(-MAX_IMPACT..MAX_IMPACT),
                0.0,
                rng.gen_range(-MAX_IMPACT..MAX_IMPACT),
            );
            if drawer.add_falling_tree(position, impact, tree.tree_type.index())? {
                felled += 1;
            } else {
                too_fast += 1;
            }
        }
        landed += drawer.update();

        let plan = drawer.draw(&camera, &visibility, config.lod.tree_distance, false, frame);
        let shadow = drawer.draw_shadow_pass(&camera, &visibility, frame);
        if config.debug.frame_stats {
            info!(
                frame,
                commands = plan.commands.len(),
                shadow_commands = shadow.commands.len(),
                cached = drawer.arena().len(),
                stats = ?plan.stats,
                "Frame planned"
            );
        }
        totals += &plan.stats;
        shadow_totals += &shadow.stats;
    }

    info!(
        frames = config.sim.frames,
        built = totals.batches_built,
        refreshed = totals.batches_refreshed,
        released = totals.batches_released,
        reclaimed = totals.batches_reclaimed,
        cached = drawer.arena().len(),
        "Cache activity"
    );
    info!(
        detailed = totals.detailed_trees,
        blended = totals.blended_trees,
        billboards = totals.billboard_trees,
        dropped_fades = totals.dropped_fade_entries,
        shadow_detailed = shadow_totals.detailed_trees,
        "Near trees"
    );
    info!(
        felled,
        too_fast,
        landed,
        still_falling = drawer.falling().len(),
        standing = drawer.grid().tree_count(),
        "Falling trees"
    );
    Ok(())
}
