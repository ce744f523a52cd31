//!
//! # Rectangular Bounding Boxes
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::geom::{Int, Point};

/// # Rectangular Bounding Box
///
/// Points `p0` and `p1` represent opposite corners of a bounding rectangle.
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct BoundBox {
    pub p0: Point,
    pub p1: Point,
}
impl BoundBox {
    /// Create an empty, otherwise invalid [BoundBox]
    pub fn empty() -> Self {
        Self {
            p0: Point::new(Int::MAX, Int::MAX),
            p1: Point::new(Int::MIN, Int::MIN),
        }
    }
    /// Boolean indication of whether a box is empty
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }
    /// Compute the bounding box of `pts`, as the min/max over their coordinates
    pub fn from_points(pts: &[Point]) -> Self {
        let mut bbox = Self::empty();
        for pt in pts {
            bbox.grow(pt);
        }
        bbox
    }
    /// Expand to include [Point] `pt`
    pub fn grow(&mut self, pt: &Point) {
        self.p0 = Point::new(self.p0.x.min(pt.x), self.p0.y.min(pt.y));
        self.p1 = Point::new(self.p1.x.max(pt.x), self.p1.y.max(pt.y));
    }
    /// Compute the union with `other`, creating a new [BoundBox]
    pub fn union(&self, other: &BoundBox) -> BoundBox {
        BoundBox {
            p0: Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            p1: Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        }
    }
    /// Expand in all directions by `delta`
    pub fn expand(&mut self, delta: Int) {
        self.p0.x -= delta;
        self.p0.y -= delta;
        self.p1.x += delta;
        self.p1.y += delta;
    }
    /// Get the box's size as an (x,y) tuple
    pub fn size(&self) -> (Int, Int) {
        (self.p1.x - self.p0.x, self.p1.y - self.p0.y)
    }
}
