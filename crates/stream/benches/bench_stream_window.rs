use std::collections::HashSet;
use std::hint::black_box;
use std::time::Instant;

use cellstream::{
    CellCoord, CellRect, Handle, HandleAllocator, InstantiateError, Instantiator, Placeable, Region,
    Registry, SharedAnchor, StreamConfig, Streamer, TemplateId,
};
use glam::Vec2;

#[derive(Default)]
struct NullInstantiator {
    handles: HandleAllocator,
}

impl Instantiator for NullInstantiator {
    fn instantiate(&mut self, _: TemplateId, _: Vec2) -> Result<Handle, InstantiateError> {
        Ok(self.handles.alloc())
    }

    fn destroy(&mut self, handle: Handle) {
        self.handles.free(handle);
    }
}

fn make_region(side: i32) -> Region {
    (-side..side)
        .flat_map(|x| {
            (-side..side).map(move |y| Placeable::new(TemplateId(0), Vec2::new(x as f32 + 0.5, y as f32 + 0.5)))
        })
        .collect()
}

fn bench_band_updates(half: f32, iterations: usize) {
    let (registry, _) = Registry::from_region(make_region(256));
    let anchor = SharedAnchor::new(Vec2::ZERO);
    let mut streamer = Streamer::with_registry(NullInstantiator::default(), registry);
    let config = StreamConfig::new(Vec2::splat(half), 0.0);
    if let Err(e) = streamer.start(anchor.clone(), config) {
        println!("  start failed: {e}");
        return;
    }
    streamer.tick();

    let start = Instant::now();
    for i in 0..iterations {
        // Walk back and forth along the diagonal, one cell per tick.
        let t = (i % 64) as f32 - 32.0;
        anchor.set(Vec2::splat(t));
        let _ = black_box(streamer.tick());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  band update (half={half}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_full_rescan(half: f32, iterations: usize) {
    let (registry, _) = Registry::from_region(make_region(256));
    let mut loaded: HashSet<CellCoord> = HashSet::new();

    let start = Instant::now();
    for i in 0..iterations {
        let t = (i % 64) as f32 - 32.0;
        let Some(window) = CellRect::around(Vec2::splat(t), Vec2::splat(half)) else {
            continue;
        };
        let desired: HashSet<CellCoord> = window
            .cells()
            .filter(|c| !registry.query(*c).is_empty())
            .collect();
        let to_load = desired.difference(&loaded).count();
        let to_unload = loaded.difference(&desired).count();
        black_box((to_load, to_unload));
        loaded = desired;
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  full rescan (half={half}, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Stream Window Benchmarks ===\n");

    println!("Incremental band updates:");
    bench_band_updates(8.0, 10000);
    bench_band_updates(32.0, 1000);
    bench_band_updates(64.0, 100);

    println!("\nFull window rescan:");
    bench_full_rescan(8.0, 10000);
    bench_full_rescan(32.0, 1000);
    bench_full_rescan(64.0, 100);

    println!("\n=== Done ===");
}
