use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::region::Region;

/// Size of the world; positions live in `[0, width] x [0, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub const fn square(size: f32) -> Self {
        Self::new(size, size)
    }

    pub fn region(&self) -> Region {
        Region::from_extent(self.width, self.height)
    }
}

/// What happens when an agent leaves the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// Toroidal world: leaving one edge re-enters from the opposite one.
    #[default]
    Wrap,
    /// Reflective world: the offending velocity component is negated.
    Bounce,
}

/// How steering and integration are sequenced within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOrder {
    /// Each agent steers and integrates before the next one is visited, so
    /// later agents see earlier agents' updated state.
    #[default]
    Interleaved,
    /// Every agent steers against the state at the start of the tick, then
    /// all agents integrate.
    Staged,
}

/// Range of baseline speeds handed to spawned agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f32,
    pub max: f32,
}

impl Default for SpeedRange {
    fn default() -> Self {
        Self { min: 0.1, max: 1.0 }
    }
}

/// Configuration for the horde simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world_extent: Extent,
    pub perception_radius: f32,
    pub node_capacity: usize,
    pub boundary_mode: BoundaryMode,
    pub tick_order: TickOrder,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub separation_weight: f32,
    /// Fraction of max speed used when steering toward the local centroid.
    pub cohesion_speed_factor: f32,
    /// Multiplier on pursuit and attraction steering.
    pub attraction_strength: f32,
    pub alert_speed_multiplier: f32,
    pub alert_force_multiplier: f32,
    /// Agents closer than this to the player become alerted.
    pub player_alert_radius: f32,
    /// Probability per reference frame that a neutral agent gets a random impulse.
    pub wander_chance: f32,
    pub wander_strength: f32,
    /// Divisor of the exponential heading smoothing; 1 snaps instantly.
    pub heading_smoothing: f32,
    pub base_max_force: f32,
    pub speed_range: SpeedRange,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world_extent: Extent::square(800.0),
            perception_radius: 50.0,
            node_capacity: 8,
            boundary_mode: BoundaryMode::Wrap,
            tick_order: TickOrder::Interleaved,
            alignment_weight: 0.25,
            cohesion_weight: 0.25,
            separation_weight: 1.5,
            cohesion_speed_factor: 0.75,
            attraction_strength: 1.5,
            alert_speed_multiplier: 3.0,
            alert_force_multiplier: 2.0,
            player_alert_radius: 50.0,
            wander_chance: 0.02,
            wander_strength: 0.05,
            heading_smoothing: 20.0,
            base_max_force: 0.05,
            speed_range: SpeedRange::default(),
        }
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl SimulationConfig {
    /// Checks every field, reporting the first invalid one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Extent { width, height } = self.world_extent;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidExtent { width, height });
        }
        if self.node_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        positive("perception_radius", self.perception_radius)?;
        positive("alert_speed_multiplier", self.alert_speed_multiplier)?;
        positive("alert_force_multiplier", self.alert_force_multiplier)?;
        positive("base_max_force", self.base_max_force)?;
        positive("cohesion_speed_factor", self.cohesion_speed_factor)?;

        non_negative("alignment_weight", self.alignment_weight)?;
        non_negative("cohesion_weight", self.cohesion_weight)?;
        non_negative("separation_weight", self.separation_weight)?;
        non_negative("attraction_strength", self.attraction_strength)?;
        non_negative("player_alert_radius", self.player_alert_radius)?;
        non_negative("wander_strength", self.wander_strength)?;

        if !(0.0..=1.0).contains(&self.wander_chance) {
            return Err(ConfigError::NotProbability {
                field: "wander_chance",
                value: self.wander_chance,
            });
        }
        if !(self.heading_smoothing >= 1.0 && self.heading_smoothing.is_finite()) {
            return Err(ConfigError::SmoothingBelowOne(self.heading_smoothing));
        }

        let SpeedRange { min, max } = self.speed_range;
        positive("speed_range.min", min)?;
        positive("speed_range.max", max)?;
        if min > max {
            return Err(ConfigError::InvertedSpeedRange { min, max });
        }
        Ok(())
    }
}
