//! Build a BVH over a grid of boxes and cast a ray batch through it.
//!
//! Usage:
//!   cargo run --release --bin trace_grid -- --grid 20 --method middle

use std::sync::Arc;
use std::time::Instant;

use glam::Vec3;
use rayon::prelude::*;

use rkbvh::bvh::{BoxPrimitive, Bvh, Primitive, SplitMethod};
use rkbvh::core::types::Result;
use rkbvh::math::{Aabb, Ray};

/// Boxes of size 2 spaced every 4 units, `n` per axis
fn grid_scene(n: i32) -> Vec<Arc<dyn Primitive>> {
    let mut primitives = Vec::with_capacity((n * n * n) as usize);
    for i in 0..n {
        for j in 0..n {
            for k in 0..n {
                let lower =
                    Vec3::new(4.0 * i as f32, 4.0 * j as f32, 4.0 * k as f32) + Vec3::ONE;
                let bounds = Aabb::new(lower, lower + Vec3::splat(2.0));
                primitives.push(Arc::new(BoxPrimitive::new(bounds)) as Arc<dyn Primitive>);
            }
        }
    }
    primitives
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let grid: i32 = args
        .iter()
        .position(|a| a == "--grid")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);

    let method: SplitMethod = args
        .iter()
        .position(|a| a == "--method")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or_default();

    let scene = grid_scene(grid);
    log::info!("scene: {} boxes, {} split", scene.len(), method);

    let start = Instant::now();
    let bvh = Bvh::new(scene, 1, method);
    log::info!(
        "built {} nodes over {} primitives in {:.2?}",
        bvh.node_count(),
        bvh.primitive_count(),
        start.elapsed(),
    );

    // One ray per cell, fired from the box center toward +x, plus one gap
    // ray per cell that must miss everything
    let rays: Vec<(Ray, Ray)> = (0..grid * grid * grid)
        .map(|c| {
            let cell = Vec3::new(
                4.0 * (c % grid) as f32,
                4.0 * ((c / grid) % grid) as f32,
                4.0 * (c / (grid * grid)) as f32,
            );
            (
                Ray::new(cell + Vec3::splat(2.0), Vec3::X),
                Ray::new(cell, Vec3::Z),
            )
        })
        .collect();

    let start = Instant::now();
    let (hits, stray) = rays
        .par_iter()
        .map(|(inside, gap)| {
            let hit = bvh.intersect(&mut inside.clone()).is_some() as u64;
            let miss = bvh.intersect_p(gap) as u64;
            (hit, miss)
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));
    let elapsed = start.elapsed();

    log::info!(
        "{} rays in {:.2?}: {} expected hits, {} stray gap hits",
        rays.len() * 2,
        elapsed,
        hits,
        stray,
    );

    if hits != rays.len() as u64 || stray != 0 {
        log::error!("traversal results disagree with the analytic scene");
    }

    Ok(())
}

fn main() {
    rkbvh::core::logging::init();

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
