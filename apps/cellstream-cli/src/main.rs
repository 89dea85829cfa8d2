mod settings;
mod sim;

use std::path::PathBuf;

use cellstream::{SharedAnchor, Streamer};
use clap::{Parser, Subcommand};
use glam::Vec2;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;
use crate::sim::{HookCounters, RunSummary, SimInstantiator};

#[derive(Parser)]
#[command(name = "cellstream-cli", about = "CLI tool for cellstream operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print the default settings file as YAML
    DefaultSettings,
    /// Walk an anchor around a scattered world and report streaming stats
    Simulate {
        /// Settings file (.yaml, .yml or .json)
        #[arg(short, long)]
        settings: Option<PathBuf>,
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Radius of the anchor's circular path
        #[arg(long, default_value = "64.0")]
        radius: f32,
        /// Anchor speed in world units per tick
        #[arg(long, default_value = "0.5")]
        speed: f32,
        /// Override the window half-extent on both axes
        #[arg(long)]
        half_extent: Option<f32>,
        /// Override the movement threshold
        #[arg(long)]
        threshold: Option<f32>,
        /// Make every n-th instantiation fail
        #[arg(long, default_value = "0")]
        fail_every: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("cellstream-cli v{}", env!("CARGO_PKG_VERSION"));
            let defaults = Settings::default();
            println!(
                "default window half-extents: {}, movement threshold: {}",
                defaults.stream.half_extents, defaults.stream.movement_threshold
            );
        }
        Commands::DefaultSettings => {
            print!("{}", Settings::default().to_yaml()?);
        }
        Commands::Simulate {
            settings,
            ticks,
            radius,
            speed,
            half_extent,
            threshold,
            fail_every,
        } => {
            let mut settings = match settings {
                Some(path) => Settings::load(&path)?,
                None => Settings::default(),
            };
            if let Some(half) = half_extent {
                settings.stream.half_extents = Vec2::splat(half);
            }
            if let Some(threshold) = threshold {
                settings.stream.movement_threshold = threshold;
            }

            let hooks = HookCounters::default();
            let region = sim::scatter(&settings.world, &hooks);
            println!(
                "Scattered {} placeables over {} cells",
                region.placement_count(),
                region.len()
            );

            let mut streamer = Streamer::new(SimInstantiator::new(fail_every));
            let loaded = streamer.bulk_insert(region);
            for fault in &loaded.faults {
                tracing::warn!(%fault, "placeable rejected");
            }

            let anchor = SharedAnchor::new(sim::orbit(0, radius, speed));
            streamer.start(anchor.clone(), settings.stream)?;

            let mut summary = RunSummary::default();
            for tick in 0..ticks {
                anchor.set(sim::orbit(tick, radius, speed));
                let report = streamer.tick();
                if !report.is_empty() {
                    tracing::debug!(
                        tick,
                        spawned = report.spawned.len(),
                        despawned = report.despawned.len(),
                        faults = report.faults.len(),
                        "tick"
                    );
                }
                summary.record(streamer.stats());
            }

            let stopped = streamer.stop();
            println!(
                "Ticks: {}, recomputes: {}, peak active: {}",
                summary.ticks, summary.recomputes, summary.peak_active
            );
            println!(
                "Spawned: {}, despawned: {} (+{} on stop), faults: {}",
                summary.spawned,
                summary.despawned,
                stopped.despawned.len(),
                summary.faults
            );
            println!(
                "Cells scanned: {}, tick time avg {:?}, max {:?}",
                summary.cells_scanned,
                summary.average_time(),
                summary.max_time
            );
            println!(
                "Hooks: {} setups, {} teardowns, live handles after stop: {}",
                hooks.setups(),
                hooks.teardowns(),
                streamer.instantiator().live()
            );
        }
    }

    Ok(())
}
