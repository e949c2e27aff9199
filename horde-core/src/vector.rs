use serde::{Deserialize, Serialize};

pub(crate) fn sqrt(value: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        value.sqrt()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::sqrtf(value)
    }
}

pub(crate) fn abs(value: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        value.abs()
    }
    #[cfg(not(feature = "std"))]
    {
        libm::fabsf(value)
    }
}

pub(crate) fn atan2(y: f32, x: f32) -> f32 {
    #[cfg(feature = "std")]
    {
        y.atan2(x)
    }
    #[cfg(not(feature = "std"))]
    {
        libm::atan2f(y, x)
    }
}

pub(crate) fn sin_cos(angle: f32) -> (f32, f32) {
    #[cfg(feature = "std")]
    {
        angle.sin_cos()
    }
    #[cfg(not(feature = "std"))]
    {
        (libm::sinf(angle), libm::cosf(angle))
    }
}

/// A 2D vector used for position, velocity and steering forces.
///
/// Every operation returns a new value; degenerate inputs (zero length,
/// division by zero) leave the vector unchanged instead of producing NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Unit vector pointing along `angle` radians.
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = sin_cos(angle);
        Self { x: cos, y: sin }
    }

    pub fn scale(&self, n: f32) -> Self {
        Self {
            x: self.x * n,
            y: self.y * n,
        }
    }

    /// Divides both components by `n`. Dividing by zero is the identity.
    pub fn divide(&self, n: f32) -> Self {
        if n == 0.0 {
            return *self;
        }
        Self {
            x: self.x / n,
            y: self.y / n,
        }
    }

    pub fn magnitude_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn magnitude(&self) -> f32 {
        sqrt(self.magnitude_squared())
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            self.divide(mag)
        } else {
            *self
        }
    }

    /// Rescales to length `n`; the zero vector stays zero.
    pub fn set_magnitude(&self, n: f32) -> Self {
        self.normalize().scale(n)
    }

    pub fn limit(&self, max: f32) -> Self {
        if self.magnitude() > max {
            self.set_magnitude(max)
        } else {
            *self
        }
    }

    pub fn distance_squared(&self, other: &Vector2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: &Vector2D) -> f32 {
        sqrt(self.distance_squared(other))
    }

    /// Angle of the vector in radians, as `atan2(y, x)`.
    pub fn heading(&self) -> f32 {
        atan2(self.y, self.x)
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        self.scale(scalar)
    }
}

impl core::ops::Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        self.divide(scalar)
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl core::ops::SubAssign for Vector2D {
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_vector2d_magnitude() {
        let v = Vector2D::new(3.0, 4.0);
        assert_eq!(v.magnitude(), 5.0);
        assert_eq!(v.magnitude_squared(), 25.0);
    }

    #[test]
    fn test_vector2d_operations() {
        let v1 = Vector2D::new(1.0, 2.0);
        let v2 = Vector2D::new(3.0, 4.0);

        assert_eq!(v1 + v2, Vector2D::new(4.0, 6.0));
        assert_eq!(v2 - v1, Vector2D::new(2.0, 2.0));
        assert_eq!(v1 * 2.0, Vector2D::new(2.0, 4.0));
        assert_eq!(v2 / 2.0, Vector2D::new(1.5, 2.0));

        let mut acc = Vector2D::zero();
        acc += v1;
        acc -= v2;
        assert_eq!(acc, Vector2D::new(-2.0, -2.0));
    }

    #[test]
    fn test_divide_by_zero_is_identity() {
        let v = Vector2D::new(1.5, -2.0);
        assert_eq!(v.divide(0.0), v);
        assert_eq!(v / 0.0, v);
    }

    #[test]
    fn test_zero_vector_degenerate_ops() {
        let zero = Vector2D::zero();
        assert_eq!(zero.normalize(), zero);
        assert_eq!(zero.set_magnitude(10.0), zero);
        assert_eq!(zero.limit(1.0), zero);
        assert!(!zero.normalize().x.is_nan());
    }

    #[test]
    fn test_set_magnitude() {
        let v = Vector2D::new(0.0, -2.0).set_magnitude(5.0);
        assert!((v.y + 5.0).abs() < 1e-6);
        assert_eq!(v.x, 0.0);
    }

    #[test]
    fn test_limit_is_noop_below_max() {
        let v = Vector2D::new(0.3, 0.4);
        assert_eq!(v.limit(1.0), v);
        let clamped = Vector2D::new(30.0, 40.0).limit(1.0);
        assert!((clamped.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_limit_idempotent() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let v = Vector2D::new(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
            let max = rng.gen_range(0.01..50.0);
            let once = v.limit(max);
            let twice = once.limit(max);
            assert!((twice - once).magnitude() <= max * 1e-5);
            assert!(once.magnitude() <= max * (1.0 + 1e-5));
        }
    }

    #[test]
    fn test_distance_and_heading() {
        let a = Vector2D::new(0.0, 0.0);
        let b = Vector2D::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance_squared(&a), 25.0);
        assert!((Vector2D::new(0.0, 1.0).heading() - core::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let unit = Vector2D::from_angle(core::f32::consts::PI);
        assert!((unit.x + 1.0).abs() < 1e-6);
        assert!(unit.y.abs() < 1e-6);
    }
}
