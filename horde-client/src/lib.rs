use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use horde_core::{AgentView, Extent, Simulation, SimulationConfig, TickInput, TickStats, Vector2D};
use serde::Serialize;

/// Angular speed of the orbiting player, radians per tick.
const ORBIT_SPEED: f32 = 0.02;

/// Scripted player movement driving the headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PlayerPath {
    /// No player in the world
    #[default]
    None,
    /// Player parked at the world center
    Still,
    /// Player circling the world center
    Orbit,
}

impl PlayerPath {
    pub fn position_at(self, tick: u64, extent: Extent) -> Option<Vector2D> {
        let center = Vector2D::new(extent.width / 2.0, extent.height / 2.0);
        match self {
            PlayerPath::None => None,
            PlayerPath::Still => Some(center),
            PlayerPath::Orbit => {
                let radius = extent.width.min(extent.height) / 4.0;
                let angle = tick as f32 * ORBIT_SPEED;
                Some(center + Vector2D::from_angle(angle) * radius)
            }
        }
    }
}

/// Parses a JSON configuration. Missing fields take their defaults.
pub fn parse_config(json: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig =
        serde_json::from_str(json).context("Failed to parse simulation config")?;
    config.validate().context("Invalid simulation config")?;
    Ok(config)
}

pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    parse_config(&json).with_context(|| format!("Config file {}", path.display()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub agents: usize,
    pub ticks: u64,
    pub dt: f32,
    pub seed: Option<u64>,
    pub player: PlayerPath,
    /// Draw neutral agents toward the world center.
    pub attract_center: bool,
    /// Write a frame every this many ticks.
    pub every: u64,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            agents: 500,
            ticks: 600,
            dt: 1.0,
            seed: None,
            player: PlayerPath::Orbit,
            attract_center: false,
            every: 1,
        }
    }
}

/// One JSON line of the frame dump.
#[derive(Debug, Serialize)]
struct Frame<'a> {
    stats: &'a TickStats,
    player: Option<[f32; 2]>,
    agents: &'a [AgentView],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub agents: usize,
    pub alerted: usize,
    pub frames: u64,
    /// Largest out-of-bounds count seen on any tick.
    pub peak_out_of_bounds: usize,
}

/// Runs the simulation headless, writing JSON-lines frames to `out`.
pub fn run<W: Write>(
    config: SimulationConfig,
    options: &RunOptions,
    out: &mut W,
) -> Result<RunSummary> {
    let mut sim = match options.seed {
        Some(seed) => Simulation::with_seed(config, seed),
        None => Simulation::new(config),
    }
    .context("Failed to create simulation")?;
    sim.populate(options.agents);

    let extent = config.world_extent;
    let attraction = options
        .attract_center
        .then(|| Vector2D::new(extent.width / 2.0, extent.height / 2.0));
    let every = options.every.max(1);

    let mut summary = RunSummary {
        agents: sim.len(),
        ..RunSummary::default()
    };
    let mut views = Vec::with_capacity(sim.len());

    for tick in 0..options.ticks {
        let input = TickInput {
            player: options.player.position_at(tick, extent),
            attraction,
        };
        let stats = sim.step(options.dt, &input);
        summary.peak_out_of_bounds = summary.peak_out_of_bounds.max(stats.out_of_bounds);

        if stats.newly_alerted > 0 {
            log::debug!(
                "tick {}: {} newly alerted, {} of {} alerted",
                stats.tick,
                stats.newly_alerted,
                stats.alerted,
                summary.agents
            );
        }

        if stats.tick % every == 0 {
            views.clear();
            views.extend(sim.views());
            let frame = Frame {
                stats: &stats,
                player: input.player.map(|p| [p.x, p.y]),
                agents: &views,
            };
            serde_json::to_writer(&mut *out, &frame).context("Failed to encode frame")?;
            out.write_all(b"\n").context("Failed to write frame")?;
            summary.frames += 1;
        }

        summary.ticks = stats.tick;
        summary.alerted = stats.alerted;
    }

    out.flush().context("Failed to flush output")?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_paths() {
        let extent = Extent::square(800.0);
        assert_eq!(PlayerPath::None.position_at(3, extent), None);
        assert_eq!(
            PlayerPath::Still.position_at(3, extent),
            Some(Vector2D::new(400.0, 400.0))
        );

        let start = PlayerPath::Orbit.position_at(0, extent).unwrap();
        assert!((start.x - 600.0).abs() < 1e-3);
        assert!((start.y - 400.0).abs() < 1e-3);

        let later = PlayerPath::Orbit.position_at(100, extent).unwrap();
        let center = Vector2D::new(400.0, 400.0);
        assert!((later.distance(&center) - 200.0).abs() < 1e-2);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(r#"{ "perception_radius": 30.0, "boundary_mode": "bounce" }"#)
            .unwrap();
        assert_eq!(config.perception_radius, 30.0);
        assert_eq!(config.node_capacity, SimulationConfig::default().node_capacity);
    }

    #[test]
    fn test_parse_rejects_invalid_config() {
        assert!(parse_config(r#"{ "node_capacity": 0 }"#).is_err());
        assert!(parse_config("not json").is_err());
    }
}
