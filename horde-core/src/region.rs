//! Query shapes for the spatial index.

use crate::vector::{abs, Vector2D};

/// A shape the quadtree can be queried with.
pub trait QueryShape {
    /// Whether the point lies inside the shape.
    fn contains(&self, x: f32, y: f32) -> bool;

    /// Whether the shape overlaps `boundary`. Used to prune whole subtrees, so
    /// it may report false positives but never false negatives.
    fn intersects(&self, boundary: &Region) -> bool;
}

/// Axis-aligned rectangle stored as center and half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub center_x: f32,
    pub center_y: f32,
    pub half_width: f32,
    pub half_height: f32,
}

impl Region {
    pub const fn new(center_x: f32, center_y: f32, half_width: f32, half_height: f32) -> Self {
        Self {
            center_x,
            center_y,
            half_width,
            half_height,
        }
    }

    /// The region covering `[0, width] x [0, height]`.
    pub fn from_extent(width: f32, height: f32) -> Self {
        Self::new(width / 2.0, height / 2.0, width / 2.0, height / 2.0)
    }

    /// Inclusive on all four edges.
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.center_x - self.half_width
            && x <= self.center_x + self.half_width
            && y >= self.center_y - self.half_height
            && y <= self.center_y + self.half_height
    }

    /// Separating-axis test on half extents. Touching edges count as overlap.
    pub fn overlaps(&self, other: &Region) -> bool {
        !(other.center_x - other.half_width > self.center_x + self.half_width
            || other.center_x + other.half_width < self.center_x - self.half_width
            || other.center_y - other.half_height > self.center_y + self.half_height
            || other.center_y + other.half_height < self.center_y - self.half_height)
    }

    /// One of the four equal quadrants around the center. North is toward
    /// smaller `y` (screen coordinates).
    pub fn quadrant(&self, quadrant: Quadrant) -> Region {
        let hw = self.half_width / 2.0;
        let hh = self.half_height / 2.0;
        let (dx, dy) = match quadrant {
            Quadrant::NorthEast => (hw, -hh),
            Quadrant::NorthWest => (-hw, -hh),
            Quadrant::SouthEast => (hw, hh),
            Quadrant::SouthWest => (-hw, hh),
        };
        Region::new(self.center_x + dx, self.center_y + dy, hw, hh)
    }
}

impl QueryShape for Region {
    fn contains(&self, x: f32, y: f32) -> bool {
        self.contains_point(x, y)
    }

    fn intersects(&self, boundary: &Region) -> bool {
        self.overlaps(boundary)
    }
}

/// Child slots of a subdivided node, in insertion and traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];
}

/// Circular query region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    radius_squared: f32,
}

impl Circle {
    pub fn new(center_x: f32, center_y: f32, radius: f32) -> Self {
        Self {
            center_x,
            center_y,
            radius,
            radius_squared: radius * radius,
        }
    }

    pub fn around(center: Vector2D, radius: f32) -> Self {
        Self::new(center.x, center.y, radius)
    }
}

impl QueryShape for Circle {
    fn contains(&self, x: f32, y: f32) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        dx * dx + dy * dy <= self.radius_squared
    }

    fn intersects(&self, boundary: &Region) -> bool {
        // Distance from the center to the closest point of the rectangle.
        let dx = (abs(self.center_x - boundary.center_x) - boundary.half_width).max(0.0);
        let dy = (abs(self.center_y - boundary.center_y) - boundary.half_height).max(0.0);
        dx * dx + dy * dy <= self.radius_squared
    }
}
