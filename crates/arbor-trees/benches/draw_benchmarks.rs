use std::f32::consts::FRAC_PI_3;

use arbor_trees::*;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::Vec3;

/// 16x16 squares of 512 units with a tree every 64 units.
fn forest() -> TreeDrawer {
    let mut grid = TreeGrid::new(16, 16, 512.0).unwrap();
    for z in 0..128 {
        for x in 0..128 {
            let position = Vec3::new(x as f32 * 64.0 + 7.0, 0.0, z as f32 * 64.0 + 11.0);
            grid.add(TreeType::new(((x + z) % 16) as u8).unwrap(), position)
                .unwrap();
        }
    }
    TreeDrawer::new(grid, DrawerSettings::default())
}

fn camera() -> Camera {
    Camera::new(
        Vec3::new(4096.0, 300.0, 4096.0),
        Vec3::new(0.3, -0.2, -1.0),
        FRAC_PI_3,
        16.0 / 9.0,
        1.0,
        50_000.0,
    )
}

fn bench_draw_warm_cache(c: &mut Criterion) {
    let mut drawer = forest();
    let camera = camera();
    let visibility = RadiusVisibility::default();
    drawer.draw(&camera, &visibility, 6.0, false, 1);
    let mut frame = 1;
    c.bench_function("draw_warm_cache", |bencher| {
        bencher.iter(|| {
            frame += 1;
            black_box(drawer.draw(&camera, &visibility, black_box(6.0), false, frame))
        })
    });
}

fn bench_draw_cold_cache(c: &mut Criterion) {
    let camera = camera();
    let visibility = RadiusVisibility::default();
    c.bench_function("draw_cold_cache", |bencher| {
        bencher.iter_batched(
            forest,
            |mut drawer| black_box(drawer.draw(&camera, &visibility, 6.0, false, 1)),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_shadow_pass(c: &mut Criterion) {
    let mut drawer = forest();
    let camera = camera();
    let visibility = RadiusVisibility::default();
    drawer.draw(&camera, &visibility, 6.0, false, 1);
    c.bench_function("shadow_pass", |bencher| {
        bencher.iter(|| black_box(drawer.draw_shadow_pass(&camera, &visibility, 1)))
    });
}

fn bench_square_distance_factor(c: &mut Criterion) {
    let eye = black_box(Vec3::new(100.0, 40.0, 900.0));
    let center = black_box(Vec3::new(3000.0, 0.0, 256.0));
    c.bench_function("square_distance_factor", |bencher| {
        bencher.iter(|| black_box(square_distance_factor(eye, center, 3072.0)))
    });
}

fn bench_fall_update(c: &mut Criterion) {
    c.bench_function("fall_update_256", |bencher| {
        bencher.iter_batched(
            || {
                let mut falling = FallingTrees::new(FallParams::default());
                for i in 0..256 {
                    let impact = Vec3::new((i % 7) as f32 * 40.0, 0.0, (i % 5) as f32 * 60.0 + 1.0);
                    falling.add(Vec3::new(i as f32, 0.0, 0.0), impact, TreeType::new(0).unwrap());
                }
                falling
            },
            |mut falling| black_box(falling.update()),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_draw_warm_cache,
    bench_draw_cold_cache,
    bench_shadow_pass,
    bench_square_distance_factor,
    bench_fall_update
);
criterion_main!(benches);
