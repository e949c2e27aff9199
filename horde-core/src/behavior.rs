//! Steering helpers shared by the agent rules.

use crate::vector::Vector2D;

const FULL_TURN: f32 = core::f32::consts::TAU;
const HALF_TURN: f32 = core::f32::consts::PI;

/// Reynolds steering: the force that turns `velocity` into `desired`,
/// capped at `max_force`.
pub fn steer(desired: Vector2D, velocity: Vector2D, max_force: f32) -> Vector2D {
    (desired - velocity).limit(max_force)
}

/// Steering toward `target` at full `max_speed`.
pub fn seek(
    position: Vector2D,
    velocity: Vector2D,
    target: Vector2D,
    max_speed: f32,
    max_force: f32,
) -> Vector2D {
    let desired = (target - position).set_magnitude(max_speed);
    steer(desired, velocity, max_force)
}

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_signed_angle(mut angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    while angle <= -HALF_TURN {
        angle += FULL_TURN;
    }
    while angle > HALF_TURN {
        angle -= FULL_TURN;
    }
    angle
}

/// Moves `current` a `1 / divisor` step toward `target` along the shorter arc.
pub fn smooth_heading(current: f32, target: f32, divisor: f32) -> f32 {
    let delta = wrap_signed_angle(target - current);
    wrap_signed_angle(current + delta / divisor)
}
