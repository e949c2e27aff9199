//! Per-tick orchestration: rebuild the index, fire player triggers, steer and
//! integrate every agent.

use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::Serialize;
use slotmap::{Key, SecondaryMap, SlotMap};

use crate::agent::{Agent, AgentId, Neighbor, SteeringContext, Target};
use crate::config::{BoundaryMode, Extent, SimulationConfig, TickOrder};
use crate::error::ConfigError;
use crate::quadtree::{IndexEntry, QuadTree};
use crate::region::{Circle, QueryShape};
use crate::vector::Vector2D;

/// Values supplied by the host for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    /// Resolved position of the player this tick.
    pub player: Option<Vector2D>,
    /// Point neutral agents are drawn toward this tick.
    pub attraction: Option<Vector2D>,
}

/// Summary of one call to [`Simulation::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TickStats {
    pub tick: u64,
    /// Agents inserted into the spatial index.
    pub indexed: usize,
    /// Agents whose position fell outside the world and were left out of the index.
    pub out_of_bounds: usize,
    pub newly_alerted: usize,
    pub alerted: usize,
    pub index_nodes: usize,
}

/// What presentation needs to draw an agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub heading: f32,
    pub alerted: bool,
}

/// Owns the agent population and the spatial index reused across ticks.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    agents: SlotMap<AgentId, Agent>,
    index: QuadTree<AgentId>,
    rng: SmallRng,
    player: Option<Vector2D>,
    tick: u64,
    order: Vec<AgentId>,
    found: Vec<IndexEntry<AgentId>>,
    neighbors: Vec<Neighbor>,
    frozen: SecondaryMap<AgentId, Neighbor>,
}

impl Simulation {
    /// Creates an empty simulation seeded from the operating system.
    #[cfg(feature = "std")]
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Creates an empty simulation whose randomness is fully determined by `seed`.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: SmallRng) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            index: QuadTree::new(config.world_extent.region(), config.node_capacity),
            config,
            agents: SlotMap::with_key(),
            rng,
            player: None,
            tick: 0,
            order: Vec::new(),
            found: Vec::new(),
            neighbors: Vec::new(),
            frozen: SecondaryMap::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replaces the configuration. Agents keep their state.
    pub fn set_config(&mut self, config: SimulationConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.index = QuadTree::new(config.world_extent.region(), config.node_capacity);
        self.config = config;
        Ok(())
    }

    /// Spawns `count` randomly placed agents.
    pub fn populate(&mut self, count: usize) {
        for _ in 0..count {
            let agent = Agent::random(&mut self.rng, &self.config);
            self.agents.insert(agent);
        }
        log::debug!("populated {} agents, {} total", count, self.agents.len());
    }

    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        self.agents.insert(agent)
    }

    /// Removes an agent. Agents chasing it stop receiving pursuit force.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    pub fn agents(&self) -> impl Iterator<Item = (AgentId, &Agent)> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Last player position received through [`TickInput`].
    pub fn player(&self) -> Option<Vector2D> {
        self.player
    }

    pub fn views(&self) -> impl Iterator<Item = AgentView> + '_ {
        self.agents.iter().map(|(id, agent)| AgentView {
            id: id.data().as_ffi(),
            x: agent.position.x,
            y: agent.position.y,
            heading: agent.heading,
            alerted: agent.is_alerted(),
        })
    }

    /// Advances the simulation by `dt` reference frames.
    pub fn step(&mut self, dt: f32, input: &TickInput) -> TickStats {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("ignoring invalid delta {}, stepping by 0", dt);
            0.0
        };
        self.tick += 1;

        let (indexed, out_of_bounds) = self.rebuild_index();
        let index_nodes = self.index.node_count();

        let mut newly_alerted = self.trigger_player(input.player);

        match self.config.tick_order {
            TickOrder::Interleaved => {
                for i in 0..self.order.len() {
                    let id = self.order[i];
                    if self.steer_agent(id, dt, input.attraction, false) {
                        newly_alerted += 1;
                    }
                    self.integrate(id, dt);
                }
            }
            TickOrder::Staged => {
                self.frozen.clear();
                for (id, agent) in self.agents.iter() {
                    self.frozen.insert(id, Neighbor::of(id, agent));
                }
                for i in 0..self.order.len() {
                    let id = self.order[i];
                    if self.steer_agent(id, dt, input.attraction, true) {
                        newly_alerted += 1;
                    }
                }
                for i in 0..self.order.len() {
                    let id = self.order[i];
                    self.integrate(id, dt);
                }
            }
        }

        self.index.clear();

        let stats = TickStats {
            tick: self.tick,
            indexed,
            out_of_bounds,
            newly_alerted,
            alerted: self.agents.values().filter(|a| a.is_alerted()).count(),
            index_nodes,
        };
        log::debug!(
            "tick {}: {} indexed, {} outside, {} newly alerted, {} alerted, {} nodes",
            stats.tick,
            stats.indexed,
            stats.out_of_bounds,
            stats.newly_alerted,
            stats.alerted,
            stats.index_nodes
        );
        stats
    }

    fn rebuild_index(&mut self) -> (usize, usize) {
        self.index.clear();
        self.order.clear();
        self.order.extend(self.agents.keys());

        let Extent { width, height } = self.config.world_extent;
        let mut out_of_bounds = 0;
        for &id in &self.order {
            let mut position = self.agents[id].position;
            // A bounced agent may sit just past the wall until it turns back.
            if self.config.boundary_mode == BoundaryMode::Bounce {
                position.x = position.x.clamp(0.0, width);
                position.y = position.y.clamp(0.0, height);
            }
            if !self.index.insert(IndexEntry::new(position.x, position.y, id)) {
                log::trace!("{:?} at ({}, {}) is outside the world", id, position.x, position.y);
                out_of_bounds += 1;
            }
        }
        (self.order.len() - out_of_bounds, out_of_bounds)
    }

    fn trigger_player(&mut self, player: Option<Vector2D>) -> usize {
        let Some(player) = player else {
            return 0;
        };
        self.player = Some(player);

        let radius_sq = self.config.player_alert_radius * self.config.player_alert_radius;
        let mut alerted = 0;
        for (id, agent) in self.agents.iter_mut() {
            if agent.position.distance_squared(&player) < radius_sq && agent.alert(Target::Player) {
                log::trace!("{:?} spotted the player", id);
                alerted += 1;
            }
        }
        alerted
    }

    /// Queries the index around `id` and runs its steering. When `staged`,
    /// neighbors and targets are read from the start-of-tick snapshot.
    fn steer_agent(
        &mut self,
        id: AgentId,
        dt: f32,
        attraction: Option<Vector2D>,
        staged: bool,
    ) -> bool {
        let Some(agent) = self.agents.get(id) else {
            return false;
        };
        let position = agent.position;
        let target = agent.target();

        self.found.clear();
        let range = Circle::around(position, self.config.perception_radius);
        self.index.query(&range, &mut self.found);

        self.neighbors.clear();
        for entry in self.found.iter().filter(|entry| entry.owner != id) {
            let neighbor = if staged {
                self.frozen.get(entry.owner).copied()
            } else {
                self.agents
                    .get(entry.owner)
                    .map(|other| Neighbor::of(entry.owner, other))
            };
            // Agents already integrated this tick may have moved (or wrapped)
            // out of range since the index was built.
            self.neighbors.extend(
                neighbor.filter(|n| range.contains(n.position.x, n.position.y)),
            );
        }

        let target_position = match target {
            Some(Target::Agent(other)) if staged => self.frozen.get(other).map(|n| n.position),
            Some(Target::Agent(other)) => self.agents.get(other).map(|a| a.position),
            Some(Target::Player) => self.player,
            None => None,
        };
        let context = SteeringContext {
            target_position,
            attraction,
            dt,
        };

        match self.agents.get_mut(id) {
            Some(agent) => agent.steer(id, &self.neighbors, &context, &self.config, &mut self.rng),
            None => false,
        }
    }

    fn integrate(&mut self, id: AgentId, dt: f32) {
        if let Some(agent) = self.agents.get_mut(id) {
            agent.update(dt, &self.config);
            agent.edges(self.config.boundary_mode, self.config.world_extent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm_config() -> SimulationConfig {
        SimulationConfig {
            wander_chance: 0.0,
            ..SimulationConfig::default()
        }
    }

    fn parked(x: f32, y: f32) -> Agent {
        Agent::new(Vector2D::new(x, y), Vector2D::zero(), 1.0, 0.05)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulationConfig {
            node_capacity: 0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            Simulation::with_seed(config, 1).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn test_populate_and_views() {
        let mut sim = Simulation::with_seed(SimulationConfig::default(), 4).unwrap();
        sim.populate(100);
        assert_eq!(sim.len(), 100);
        assert_eq!(sim.views().count(), 100);
        assert!(sim.views().all(|view| !view.alerted));
    }

    #[test]
    fn test_step_moves_agents_and_counts_ticks() {
        let mut sim = Simulation::with_seed(SimulationConfig::default(), 8).unwrap();
        sim.populate(50);
        let before: Vec<Vector2D> = sim.agents().map(|(_, a)| a.position).collect();

        let stats = sim.step(1.0, &TickInput::default());
        assert_eq!(stats.tick, 1);
        assert_eq!(stats.indexed, 50);
        assert_eq!(stats.out_of_bounds, 0);
        assert!(stats.index_nodes >= 1);
        assert_eq!(sim.tick(), 1);

        let moved = sim
            .agents()
            .zip(before.iter())
            .any(|((_, agent), initial)| agent.position != *initial);
        assert!(moved);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let run = || {
            let mut sim = Simulation::with_seed(SimulationConfig::default(), 99).unwrap();
            sim.populate(200);
            let input = TickInput {
                player: Some(Vector2D::new(400.0, 400.0)),
                attraction: None,
            };
            for _ in 0..20 {
                sim.step(1.0, &input);
            }
            sim.views().collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_player_proximity_alerts() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        let near = sim.add_agent(parked(100.0, 100.0));
        let far = sim.add_agent(parked(600.0, 600.0));

        let input = TickInput {
            player: Some(Vector2D::new(120.0, 100.0)),
            attraction: None,
        };
        let stats = sim.step(1.0, &input);
        assert_eq!(stats.newly_alerted, 1);
        assert_eq!(stats.alerted, 1);
        assert_eq!(sim.agent(near).unwrap().target(), Some(Target::Player));
        assert!(!sim.agent(far).unwrap().is_alerted());
        assert_eq!(sim.player(), Some(Vector2D::new(120.0, 100.0)));
    }

    #[test]
    fn test_chasing_agent_keeps_pursuing_remembered_player() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        let id = sim.add_agent(parked(100.0, 100.0));
        sim.step(
            1.0,
            &TickInput {
                player: Some(Vector2D::new(130.0, 100.0)),
                attraction: None,
            },
        );
        for _ in 0..10 {
            sim.step(1.0, &TickInput::default());
        }
        let agent = sim.agent(id).unwrap();
        assert!(agent.position.x > 100.0);
        assert!(agent.velocity.x > 0.0);
    }

    #[test]
    fn test_removed_target_stops_pursuit() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        let mut leader = parked(200.0, 200.0);
        leader.alert(Target::Player);
        let leader = sim.add_agent(leader);
        let follower = sim.add_agent(parked(220.0, 200.0));

        sim.step(1.0, &TickInput::default());
        assert_eq!(
            sim.agent(follower).unwrap().target(),
            Some(Target::Agent(leader))
        );

        assert!(sim.remove_agent(leader).is_some());
        let velocity = sim.agent(follower).unwrap().velocity;
        sim.step(1.0, &TickInput::default());
        // No neighbors and no target left: nothing changes the velocity.
        assert_eq!(sim.agent(follower).unwrap().velocity, velocity);
        assert!(sim.agent(follower).unwrap().is_alerted());
    }

    #[test]
    fn test_bounce_agent_past_wall_is_indexed_and_pulled_back() {
        let config = SimulationConfig {
            boundary_mode: BoundaryMode::Bounce,
            ..calm_config()
        };
        let mut sim = Simulation::with_seed(config, 1).unwrap();
        let mut runaway = parked(801.0, 400.0);
        runaway.velocity = Vector2D::new(0.5, 0.0);
        let id = sim.add_agent(runaway);
        sim.add_agent(parked(10.0, 10.0));

        let stats = sim.step(1.0, &TickInput::default());
        assert_eq!(stats.out_of_bounds, 0);
        assert_eq!(stats.indexed, 2);
        let agent = sim.agent(id).unwrap();
        assert!(agent.velocity.x < 0.0);
        assert_eq!(agent.position.x, 800.0);
    }

    #[test]
    fn test_bounce_edge_agent_spreads_alert() {
        let config = SimulationConfig {
            boundary_mode: BoundaryMode::Bounce,
            ..calm_config()
        };
        let mut sim = Simulation::with_seed(config, 1).unwrap();
        let mut chaser = parked(801.0, 400.0);
        chaser.alert(Target::Player);
        let chaser = sim.add_agent(chaser);
        let inside = sim.add_agent(parked(790.0, 400.0));

        let stats = sim.step(1.0, &TickInput::default());
        assert_eq!(stats.out_of_bounds, 0);
        assert_eq!(sim.agent(inside).unwrap().target(), Some(Target::Agent(chaser)));
    }

    #[test]
    fn test_neighbor_wrapped_this_tick_is_not_flocked_with() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        // Visited first: moves past the east wall and wraps to x = 0.
        let mut leaver = parked(799.5, 400.0);
        leaver.velocity = Vector2D::new(1.0, 0.0);
        let leaver = sim.add_agent(leaver);
        let stay = sim.add_agent(parked(780.0, 400.0));

        sim.step(1.0, &TickInput::default());
        assert_eq!(sim.agent(leaver).unwrap().position.x, 0.0);
        assert_eq!(sim.agent(stay).unwrap().velocity, Vector2D::zero());
    }

    #[test]
    fn test_neighbor_on_perception_radius_counts() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        let mut chaser = parked(100.0, 100.0);
        chaser.alert(Target::Player);
        sim.add_agent(chaser);
        let edge = sim.add_agent(parked(150.0, 100.0));

        sim.step(1.0, &TickInput::default());
        assert!(sim.agent(edge).unwrap().is_alerted());
    }

    #[test]
    fn test_invalid_delta_is_ignored() {
        let mut sim = Simulation::with_seed(calm_config(), 1).unwrap();
        let mut agent = parked(100.0, 100.0);
        agent.velocity = Vector2D::new(1.0, 0.0);
        let id = sim.add_agent(agent);

        sim.step(f32::NAN, &TickInput::default());
        assert_eq!(sim.agent(id).unwrap().position, Vector2D::new(100.0, 100.0));
        sim.step(-1.0, &TickInput::default());
        assert_eq!(sim.agent(id).unwrap().position, Vector2D::new(100.0, 100.0));
    }

    #[test]
    fn test_set_config_validates() {
        let mut sim = Simulation::with_seed(SimulationConfig::default(), 1).unwrap();
        let bad = SimulationConfig {
            world_extent: Extent::new(-1.0, 10.0),
            ..SimulationConfig::default()
        };
        assert!(sim.set_config(bad).is_err());
        assert_eq!(*sim.config(), SimulationConfig::default());

        let wide = SimulationConfig {
            world_extent: Extent::new(1600.0, 900.0),
            ..SimulationConfig::default()
        };
        sim.set_config(wide).unwrap();
        sim.add_agent(parked(1500.0, 850.0));
        assert_eq!(sim.step(1.0, &TickInput::default()).out_of_bounds, 0);
    }
}
