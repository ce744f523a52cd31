//!
//! # Integer Points & Float Vectors
//!
//! All stored geometry is denominated in integer database units.
//! Offsetting math happens in [Vec2] float-space,
//! and rounds back to [Point]s on the way out.
//!

// Crates.io
use serde::{Deserialize, Serialize};

/// Internal type alias for coordinate values
pub type Int = isize;

/// # Point in two-dimensional layout-space, in database units
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: Int,
    pub y: Int,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: Int, y: Int) -> Self {
        Self { x, y }
    }
}

/// # Two-Dimensional Float Vector
///
/// Workhorse of the offsetting math in [crate::outline].
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Vec2 {
    pub x: f64,
    pub y: f64,
}
impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Lift a database-unit [Point] into float-space
    pub fn from_point(p: Point) -> Self {
        Self {
            x: p.x as f64,
            y: p.y as f64,
        }
    }
    /// Round back to the nearest database-unit [Point]
    pub fn to_point(self) -> Point {
        Point::new(self.x.round() as Int, self.y.round() as Int)
    }
    /// The vector from `a` to `b`
    pub fn between(a: Point, b: Point) -> Self {
        Self {
            x: (b.x - a.x) as f64,
            y: (b.y - a.y) as f64,
        }
    }
    pub fn add(self, other: Vec2) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
    pub fn scale(self, k: f64) -> Self {
        Self::new(self.x * k, self.y * k)
    }
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }
    /// Unit-length copy. Callers are responsible for non-zero length.
    pub fn unit(self) -> Self {
        let len = self.length();
        Self::new(self.x / len, self.y / len)
    }
    /// Counter-clockwise perpendicular, i.e. the left-hand normal of a tangent
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }
    /// Rotate counter-clockwise by `angle` radians
    pub fn rotate(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}
