use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cellstream::{
    Handle, HandleAllocator, InstantiateError, Instantiator, Placeable, Region, TemplateId,
};
use glam::Vec2;

use crate::settings::WorldSettings;

/// Stand-in engine: mints generational handles and can be told to fail.
#[derive(Debug, Default)]
pub struct SimInstantiator {
    handles: HandleAllocator,
    /// Fail every n-th instantiation (0 disables failures).
    pub fail_every: usize,
    attempts: usize,
    pub stale_destroys: usize,
}

impl SimInstantiator {
    pub fn new(fail_every: usize) -> Self {
        Self {
            fail_every,
            ..Self::default()
        }
    }

    pub fn live(&self) -> usize {
        self.handles.live_count()
    }
}

impl Instantiator for SimInstantiator {
    fn instantiate(&mut self, template: TemplateId, position: Vec2) -> Result<Handle, InstantiateError> {
        self.attempts += 1;
        if self.fail_every > 0 && self.attempts % self.fail_every == 0 {
            return Err(InstantiateError::new(format!(
                "simulated failure for template {} at {position}",
                template.0
            )));
        }
        Ok(self.handles.alloc())
    }

    fn destroy(&mut self, handle: Handle) {
        if !self.handles.free(handle) {
            tracing::error!(?handle, "destroy of stale handle");
            self.stale_destroys += 1;
        }
    }
}

/// Counts hook invocations across every scattered placeable.
#[derive(Debug, Clone, Default)]
pub struct HookCounters {
    pub setups: Arc<AtomicUsize>,
    pub teardowns: Arc<AtomicUsize>,
}

impl HookCounters {
    pub fn setups(&self) -> usize {
        self.setups.load(Ordering::Relaxed)
    }

    pub fn teardowns(&self) -> usize {
        self.teardowns.load(Ordering::Relaxed)
    }
}

/// Scatter placeables deterministically over the world.
pub fn scatter(world: &WorldSettings, hooks: &HookCounters) -> Region {
    let mut state = world.seed;
    let mut next_unit = move || {
        state = splitmix64(state);
        (state >> 40) as f32 / (1u64 << 24) as f32
    };

    let templates = world.templates.max(1);
    (0..world.placeables)
        .map(|_| {
            let x = (next_unit() * 2.0 - 1.0) * world.extent;
            let y = (next_unit() * 2.0 - 1.0) * world.extent;
            let template = TemplateId((next_unit() * templates as f32) as u64 % templates);
            let setups = hooks.setups.clone();
            let teardowns = hooks.teardowns.clone();
            Placeable::new(template, Vec2::new(x, y))
                .on_spawn(move |_, _| {
                    setups.fetch_add(1, Ordering::Relaxed);
                })
                .on_destroy(move |_| {
                    teardowns.fetch_add(1, Ordering::Relaxed);
                })
        })
        .collect()
}

/// Anchor position at `tick` on a lap around a circle of `radius`.
pub fn orbit(tick: u64, radius: f32, speed: f32) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let angle = tick as f32 * speed / radius;
    Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Aggregated tick statistics for the run summary.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub recomputes: u64,
    pub spawned: usize,
    pub despawned: usize,
    pub faults: usize,
    pub cells_scanned: usize,
    pub peak_active: usize,
    pub total_time: Duration,
    pub max_time: Duration,
}

impl RunSummary {
    pub fn record(&mut self, stats: &cellstream::StreamStats) {
        self.ticks += 1;
        self.recomputes += stats.recomputed as u64;
        self.spawned += stats.spawned_this_tick;
        self.despawned += stats.despawned_this_tick;
        self.faults += stats.faults_this_tick;
        self.cells_scanned += stats.cells_scanned;
        self.peak_active = self.peak_active.max(stats.active_count);
        self.total_time += stats.tick_time;
        self.max_time = self.max_time.max(stats.tick_time);
    }

    pub fn average_time(&self) -> Duration {
        if self.ticks == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.ticks as u32
    }
}

/// Splitmix64 step, used to scatter placeables reproducibly per seed.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellstream::{SharedAnchor, StreamConfig, Streamer};

    fn small_world() -> WorldSettings {
        WorldSettings {
            placeables: 300,
            extent: 20.0,
            templates: 3,
            seed: 5,
        }
    }

    #[test]
    fn scatter_is_deterministic_per_seed() {
        let hooks = HookCounters::default();
        let a = scatter(&small_world(), &hooks);
        let b = scatter(&small_world(), &hooks);
        assert_eq!(a.placement_count(), 300);
        let cells_a: Vec<_> = a.cells().collect();
        let cells_b: Vec<_> = b.cells().collect();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn scatter_stays_inside_extent() {
        let region = scatter(&small_world(), &HookCounters::default());
        for cell in region.cells() {
            assert!((-20..20).contains(&cell.x));
            assert!((-20..20).contains(&cell.y));
        }
    }

    #[test]
    fn orbit_stays_on_circle() {
        for tick in [0, 10, 1000] {
            let p = orbit(tick, 30.0, 0.5);
            assert!((p.length() - 30.0).abs() < 1e-3);
        }
        assert_eq!(orbit(5, 0.0, 1.0), Vec2::ZERO);
    }

    #[test]
    fn sim_instantiator_fails_on_schedule() {
        let mut sim = SimInstantiator::new(3);
        let results: Vec<_> = (0..6)
            .map(|_| sim.instantiate(TemplateId(0), Vec2::ZERO).is_ok())
            .collect();
        assert_eq!(results, vec![true, true, false, true, true, false]);
        assert_eq!(sim.live(), 4);
    }

    #[test]
    fn full_run_balances_hooks_and_handles() {
        let hooks = HookCounters::default();
        let mut streamer = Streamer::new(SimInstantiator::new(7));
        streamer.bulk_insert(scatter(&small_world(), &hooks));

        let anchor = SharedAnchor::new(orbit(0, 12.0, 0.8));
        streamer
            .start(anchor.clone(), StreamConfig::new(Vec2::splat(6.0), 0.5))
            .unwrap();

        let mut summary = RunSummary::default();
        for tick in 0..200 {
            anchor.set(orbit(tick, 12.0, 0.8));
            streamer.tick();
            summary.record(streamer.stats());
        }
        assert!(summary.spawned > 0);
        assert!(summary.faults > 0);

        streamer.stop();
        assert_eq!(streamer.instantiator().live(), 0);
        assert_eq!(streamer.instantiator().stale_destroys, 0);
        assert_eq!(hooks.setups(), hooks.teardowns());
    }
}
