#![cfg_attr(not(feature = "std"), no_std)]
//! Flocking horde simulation with a per-tick quadtree for neighbor queries.
//!
//! Agents align, cohere and separate with the neighbors found inside their
//! perception radius. An agent that comes near the player, or near an agent
//! that already has, becomes alerted for good and chases its target faster.

extern crate alloc;

pub mod agent;
pub mod behavior;
pub mod config;
pub mod error;
pub mod quadtree;
pub mod region;
pub mod simulation;
pub mod vector;

pub use agent::{Agent, AgentId, FlockForces, Neighbor, SteeringContext, Target};
pub use config::{BoundaryMode, Extent, SimulationConfig, SpeedRange, TickOrder};
pub use error::ConfigError;
pub use quadtree::{IndexEntry, QuadTree, MAX_DEPTH};
pub use region::{Circle, Quadrant, QueryShape, Region};
pub use simulation::{AgentView, Simulation, TickInput, TickStats};
pub use vector::Vector2D;
