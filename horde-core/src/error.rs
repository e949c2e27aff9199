use thiserror::Error;

/// Errors raised while validating a [`crate::SimulationConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// World width or height is zero, negative or not finite.
    #[error("world extent must be positive and finite, got {width}x{height}")]
    InvalidExtent { width: f32, height: f32 },

    /// Quadtree nodes must be able to hold at least one entry.
    #[error("node capacity must be at least 1")]
    ZeroCapacity,

    /// A value that must be strictly positive and finite was not.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    /// A weight or radius that may be zero was negative or not finite.
    #[error("{field} must be non-negative and finite, got {value}")]
    Negative { field: &'static str, value: f32 },

    /// A per-frame probability outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    NotProbability { field: &'static str, value: f32 },

    /// Smoothing divisors below one overshoot the target heading.
    #[error("heading smoothing divisor must be at least 1, got {0}")]
    SmoothingBelowOne(f32),

    /// Spawn speed range with `min > max`.
    #[error("speed range is inverted: min {min} > max {max}")]
    InvertedSpeedRange { min: f32, max: f32 },
}
