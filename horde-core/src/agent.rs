use rand::Rng;
use slotmap::new_key_type;

use crate::behavior;
use crate::config::{BoundaryMode, Extent, SimulationConfig};
use crate::vector::{abs, Vector2D};

new_key_type! {
    /// Generational handle to an agent owned by a [`crate::Simulation`].
    pub struct AgentId;
}

/// What an alerted agent is chasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Agent(AgentId),
    Player,
}

/// Read-only view of another agent, as seen during steering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: AgentId,
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub alerted: bool,
}

impl Neighbor {
    pub fn of(id: AgentId, agent: &Agent) -> Self {
        Self {
            id,
            position: agent.position,
            velocity: agent.velocity,
            alerted: agent.alerted,
        }
    }
}

/// The three flocking terms, each already clamped to `max_force` but not weighted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlockForces {
    pub alignment: Vector2D,
    pub cohesion: Vector2D,
    pub separation: Vector2D,
    /// Number of neighbors that contributed.
    pub count: usize,
}

/// Per-call inputs to [`Agent::steer`] that live outside the agent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SteeringContext {
    /// Current position of the agent's target, if it has one that still exists.
    pub target_position: Option<Vector2D>,
    /// Point neutral agents are drawn toward this tick.
    pub attraction: Option<Vector2D>,
    /// Elapsed reference frames, scales the wander probability.
    pub dt: f32,
}

/// A single horde member
#[derive(Debug, Clone)]
pub struct Agent {
    pub position: Vector2D,
    pub velocity: Vector2D,
    pub acceleration: Vector2D,
    pub max_force: f32,
    pub max_speed: f32,
    pub baseline_speed: f32,
    pub baseline_force: f32,
    /// Smoothed presentation heading in radians.
    pub heading: f32,
    alerted: bool,
    target: Option<Target>,
}

impl Agent {
    pub fn new(
        position: Vector2D,
        velocity: Vector2D,
        baseline_speed: f32,
        baseline_force: f32,
    ) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector2D::zero(),
            max_force: baseline_force,
            max_speed: baseline_speed,
            baseline_speed,
            baseline_force,
            heading: velocity.heading(),
            alerted: false,
            target: None,
        }
    }

    /// Spawns an agent somewhere in the world with a random heading and a
    /// baseline speed drawn from the configured range.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, config: &SimulationConfig) -> Self {
        let Extent { width, height } = config.world_extent;
        let position = Vector2D::new(rng.gen_range(0.0..=width), rng.gen_range(0.0..=height));
        let range = config.speed_range;
        let baseline_speed = rng.gen_range(range.min..=range.max);
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let direction = Vector2D::from_angle(rng.gen_range(0.0..core::f32::consts::TAU));
        let velocity = direction.set_magnitude(rng.gen::<f32>() * baseline_speed * sign);
        Self::new(position, velocity, baseline_speed, config.base_max_force)
    }

    pub fn apply_force(&mut self, force: Vector2D) {
        self.acceleration += force;
    }

    pub fn is_alerted(&self) -> bool {
        self.alerted
    }

    pub fn target(&self) -> Option<Target> {
        self.target
    }

    /// Latches the alerted state and records `target`.
    ///
    /// Returns `false` without touching the current target when the agent
    /// is already alerted. Nothing ever clears the flag.
    pub fn alert(&mut self, target: Target) -> bool {
        if self.alerted {
            return false;
        }
        self.alerted = true;
        self.target = Some(target);
        true
    }

    /// Alignment, cohesion and separation against `neighbors`. `me` is skipped
    /// if it shows up in the list.
    pub fn flock_forces(
        &self,
        me: AgentId,
        neighbors: &[Neighbor],
        config: &SimulationConfig,
    ) -> FlockForces {
        let mut align = Vector2D::zero();
        let mut group = Vector2D::zero();
        let mut separate = Vector2D::zero();
        let mut count = 0;

        for other in neighbors.iter().filter(|other| other.id != me) {
            align += other.velocity;
            group += other.position;
            // Coincident agents have no direction to flee in.
            let d2 = self.position.distance_squared(&other.position);
            if d2 > 0.0 {
                separate += (self.position - other.position) / d2;
            }
            count += 1;
        }

        if count == 0 {
            return FlockForces::default();
        }

        let total = count as f32;
        let velocity = self.velocity;
        let alignment = behavior::steer(
            (align / total).set_magnitude(self.max_speed),
            velocity,
            self.max_force,
        );
        let cohesion = behavior::steer(
            (group / total - self.position)
                .set_magnitude(self.max_speed * config.cohesion_speed_factor),
            velocity,
            self.max_force,
        );
        let separation = behavior::steer(
            (separate / total).set_magnitude(self.max_speed),
            velocity,
            self.max_force,
        );

        FlockForces {
            alignment,
            cohesion,
            separation,
            count,
        }
    }

    /// Adds the weighted flocking terms to the acceleration and catches the
    /// alert from the first alerted neighbor. Alerted agents steer with the
    /// raised limits.
    ///
    /// Returns the position of that neighbor when this call latched the alert.
    pub fn flock(
        &mut self,
        me: AgentId,
        neighbors: &[Neighbor],
        config: &SimulationConfig,
    ) -> Option<Vector2D> {
        let mut caught = None;
        if !self.alerted {
            if let Some(source) = neighbors.iter().find(|n| n.id != me && n.alerted) {
                self.alert(Target::Agent(source.id));
                log::trace!("{:?} alerted by neighbor {:?}", me, source.id);
                caught = Some(source.position);
            }
        }
        if self.alerted {
            self.raise_limits(config);
        }

        let forces = self.flock_forces(me, neighbors, config);
        self.apply_force(forces.alignment * config.alignment_weight);
        self.apply_force(forces.cohesion * config.cohesion_weight);
        self.apply_force(forces.separation * config.separation_weight);
        caught
    }

    /// Full steering pass: flocking, then pursuit when alerted or attraction
    /// and wander otherwise.
    ///
    /// Returns `true` if the agent became alerted during this call.
    pub fn steer<R: Rng + ?Sized>(
        &mut self,
        me: AgentId,
        neighbors: &[Neighbor],
        context: &SteeringContext,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> bool {
        let caught = self.flock(me, neighbors, config);

        if self.alerted {
            if let Some(target) = caught.or(context.target_position) {
                self.pursue(target, config.attraction_strength);
            }
        } else {
            if let Some(point) = context.attraction {
                self.pursue(point, config.attraction_strength);
            }
            let chance = (config.wander_chance * context.dt).clamp(0.0, 1.0);
            if rng.gen::<f32>() < chance {
                let angle = rng.gen_range(0.0..core::f32::consts::TAU);
                self.apply_force(Vector2D::from_angle(angle) * config.wander_strength);
            }
        }

        caught.is_some()
    }

    fn raise_limits(&mut self, config: &SimulationConfig) {
        self.max_speed = self.baseline_speed * config.alert_speed_multiplier;
        self.max_force = self.baseline_force * config.alert_force_multiplier;
    }

    fn pursue(&mut self, point: Vector2D, strength: f32) {
        let force =
            behavior::seek(self.position, self.velocity, point, self.max_speed, self.max_force);
        self.apply_force(force * strength);
    }

    /// Integrates one step of `dt` reference frames and resets the acceleration.
    ///
    /// Position advances with the velocity from before this step, matching the
    /// per-frame order move, accelerate, clamp.
    pub fn update(&mut self, dt: f32, config: &SimulationConfig) {
        if self.alerted {
            self.raise_limits(config);
        }

        self.position += self.velocity * dt;
        self.velocity += self.acceleration * dt;
        self.velocity = self.velocity.limit(self.max_speed);
        self.acceleration = Vector2D::zero();

        if self.velocity.magnitude_squared() > 0.0 {
            let divisor = config.heading_smoothing;
            self.heading = behavior::smooth_heading(self.heading, self.velocity.heading(), divisor);
        }
    }

    pub fn edges(&mut self, mode: BoundaryMode, extent: Extent) {
        match mode {
            BoundaryMode::Wrap => self.wrap_edges(extent.width, extent.height),
            BoundaryMode::Bounce => self.bounce_edges(extent.width, extent.height),
        }
    }

    fn wrap_edges(&mut self, width: f32, height: f32) {
        if self.position.x > width {
            self.position.x = 0.0;
        } else if self.position.x < 0.0 {
            self.position.x = width;
        }

        if self.position.y > height {
            self.position.y = 0.0;
        } else if self.position.y < 0.0 {
            self.position.y = height;
        }
    }

    // Reflect by sign rather than flipping blindly, so an agent already
    // heading back inside is not turned around again.
    fn bounce_edges(&mut self, width: f32, height: f32) {
        if self.position.x < 0.0 {
            self.position.x = 0.0;
            self.velocity.x = abs(self.velocity.x);
        } else if self.position.x > width {
            self.position.x = width;
            self.velocity.x = -abs(self.velocity.x);
        }

        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity.y = abs(self.velocity.y);
        } else if self.position.y > height {
            self.position.y = height;
            self.velocity.y = -abs(self.velocity.y);
        }
    }
}
