use anyhow::{Context, Result};
use clap::Parser;
use horde_client::{load_config, run, PlayerPath, RunOptions};
use horde_core::SimulationConfig;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless horde simulation runner", long_about = None)]
struct Args {
    /// JSON simulation config; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of agents to spawn
    #[arg(short, long, default_value_t = 500)]
    agents: usize,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Elapsed reference frames per tick
    #[arg(long, default_value_t = 1.0)]
    dt: f32,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Scripted player movement
    #[arg(short, long, value_enum, default_value_t = PlayerPath::Orbit)]
    player: PlayerPath,

    /// Draw neutral agents toward the world center
    #[arg(long)]
    attract_center: bool,

    /// Write JSON-lines frames to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a frame every N ticks
    #[arg(short, long, default_value_t = 1)]
    every: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimulationConfig::default(),
    };

    log::info!("Horde client starting...");
    log::info!(
        "{} agents, {} ticks, world {}x{}, player {:?}",
        args.agents,
        args.ticks,
        config.world_extent.width,
        config.world_extent.height,
        args.player
    );

    let options = RunOptions {
        agents: args.agents,
        ticks: args.ticks,
        dt: args.dt,
        seed: args.seed,
        player: args.player,
        attract_center: args.attract_center,
        every: args.every,
    };

    let started = Instant::now();
    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            run(config, &options, &mut writer)?
        }
        None => run(config, &options, &mut io::sink())?,
    };

    log::info!(
        "Finished {} ticks in {:.2?}: {} of {} agents alerted, {} frames written",
        summary.ticks,
        started.elapsed(),
        summary.alerted,
        summary.agents,
        summary.frames
    );
    if summary.peak_out_of_bounds > 0 {
        log::warn!(
            "up to {} agents were outside the world on a single tick",
            summary.peak_out_of_bounds
        );
    }

    Ok(())
}
