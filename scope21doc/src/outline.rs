//!
//! # Path Outline Synthesis
//!
//! Converts a GDSII PATH's centerline, width, and end-cap style
//! into a closed polygon ring suitable for filled rendering,
//! or a bare polyline for the zero-width case.
//!
//! The construction offsets the centerline to each side by half the width.
//! Interior corners use unnormalized miter joins:
//! the offset direction at a vertex is the average of the unit perpendiculars
//! of its two adjacent segments, scaled so the offset point lands at
//! perpendicular distance `width/2` from both segments.
//! No miter-length clamping is applied; sharp turns may produce spike
//! artifacts, which is accepted behavior rather than a defect.
//!

// Std-Lib Imports
use std::collections::HashSet;
use std::f64::consts::PI;

// Crates.io
use serde::{Deserialize, Serialize};

// Local Imports
use crate::geom::{Int, Point, Vec2};

/// Number of straight sub-segments approximating each semicircular end cap
pub const CAP_ARC_SEGMENTS: usize = 8;

/// Squared-length floor below which a miter direction is treated as a full turn-back
const MITER_EPS: f64 = 1e-12;

/// # Path End-Cap Styles
///
/// Decoded from GDSII `PATHTYPE` records.
/// `Custom` (pathtype 4, with BGNEXTN/ENDEXTN extension records)
/// is decoded upstream but not consumed here; it renders with `Flush` caps.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PathType {
    /// Pathtype 0: square ends flush with the endpoints
    #[default]
    Flush,
    /// Pathtype 1: rounded ends, approximated by [CAP_ARC_SEGMENTS] sub-segments
    Round,
    /// Pathtype 2: square ends extended by half the width
    Extended,
    /// Pathtype 4: custom extensions; falls back to [PathType::Flush]
    Custom,
}
impl PathType {
    /// Decode from a `PATHTYPE` record value. Out-of-spec values yield `None`.
    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            0 => Some(Self::Flush),
            1 => Some(Self::Round),
            2 => Some(Self::Extended),
            4 => Some(Self::Custom),
            _ => None,
        }
    }
}

/// # Synthesized Path Geometry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PathOutline {
    /// No usable geometry (fewer than two usable centerline points)
    Empty,
    /// Zero-width path: the centerline itself, unclosed,
    /// renderable as a stroked line rather than a filled region
    Polyline(Vec<Point>),
    /// Closed ring; the first point is repeated at the end
    Ring(Vec<Point>),
}
impl PathOutline {
    /// Boolean indication of whether this outline is too degenerate to store.
    /// Rings need at least three distinct points; polylines at least two.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Polyline(pts) => pts.len() < 2,
            Self::Ring(pts) => {
                let distinct: HashSet<&Point> = pts.iter().collect();
                distinct.len() < 3
            }
        }
    }
}

/// Synthesize the filled outline of a path from its centerline, width, and cap style.
///
/// Pure function of its inputs. Policy:
/// * Fewer than two centerline points: [PathOutline::Empty].
/// * `width <= 0`: the centerline passes through unchanged as a [PathOutline::Polyline].
/// * Otherwise: left- and right-offset chains at `width/2`, mitered corners,
///   and `pathtype`-dependent end caps, assembled into a closed [PathOutline::Ring].
///
/// Offsets are computed in floats and rounded to integer database units.
pub fn synthesize(centerline: &[Point], width: Int, pathtype: PathType) -> PathOutline {
    if centerline.len() < 2 {
        return PathOutline::Empty;
    }
    if width <= 0 {
        return PathOutline::Polyline(centerline.to_vec());
    }
    // Coincident neighbors carry no direction; collapse them before offsetting
    let mut ctr: Vec<Point> = Vec::with_capacity(centerline.len());
    for pt in centerline {
        if ctr.last() != Some(pt) {
            ctr.push(*pt);
        }
    }
    if ctr.len() < 2 {
        return PathOutline::Empty;
    }

    let half = width as f64 / 2.0;
    let n = ctr.len();

    // Unit tangent of each segment, and left-hand unit normal at each
    let tangents: Vec<Vec2> = ctr
        .windows(2)
        .map(|w| Vec2::between(w[0], w[1]).unit())
        .collect();
    let normals: Vec<Vec2> = tangents.iter().map(|t| t.perp()).collect();

    // Per-vertex offset vectors
    let mut offsets: Vec<Vec2> = Vec::with_capacity(n);
    offsets.push(normals[0].scale(half));
    for i in 1..n - 1 {
        // Unnormalized miter: average the adjacent unit normals,
        // then scale so the offset point sits at distance `half`
        // from both segments. Unclamped; sharp turns spike.
        let m = normals[i - 1].add(normals[i]).scale(0.5);
        let d = m.dot(m);
        if d < MITER_EPS {
            // Full turn-back; fall back to the incoming segment's normal
            offsets.push(normals[i - 1].scale(half));
        } else {
            offsets.push(m.scale(half / d));
        }
    }
    offsets.push(normals[n - 2].scale(half));

    // Left- and right-offset chains
    let mut left: Vec<Vec2> = Vec::with_capacity(n);
    let mut right: Vec<Vec2> = Vec::with_capacity(n);
    for (pt, off) in ctr.iter().zip(offsets.iter()) {
        let p = Vec2::from_point(*pt);
        left.push(p.add(*off));
        right.push(p.add(off.scale(-1.0)));
    }

    // Extended caps push the chain endpoints outward along the end tangents
    if let PathType::Extended = pathtype {
        let start_ext = tangents[0].scale(-half);
        let end_ext = tangents[n - 2].scale(half);
        left[0] = left[0].add(start_ext);
        right[0] = right[0].add(start_ext);
        left[n - 1] = left[n - 1].add(end_ext);
        right[n - 1] = right[n - 1].add(end_ext);
    }

    // Assemble: start cap, left chain, end cap, reversed right chain
    let mut ring: Vec<Vec2> = Vec::with_capacity(2 * n + 2 * CAP_ARC_SEGMENTS + 1);
    if let PathType::Round = pathtype {
        // Semicircle centered on the first centerline point,
        // sweeping from the right-offset point around the back to the left-offset point.
        // The left-offset point itself is supplied by the left chain.
        let center = Vec2::from_point(ctr[0]);
        let radius = right[0].add(center.scale(-1.0));
        for k in 0..CAP_ARC_SEGMENTS {
            let angle = -(k as f64) * PI / CAP_ARC_SEGMENTS as f64;
            ring.push(center.add(radius.rotate(angle)));
        }
    }
    ring.extend_from_slice(&left);
    if let PathType::Round = pathtype {
        // Semicircle centered on the last centerline point,
        // from the left-offset point around to the right-offset point.
        // Both ends are supplied by the chains; emit interior points only.
        let center = Vec2::from_point(ctr[n - 1]);
        let radius = left[n - 1].add(center.scale(-1.0));
        for k in 1..CAP_ARC_SEGMENTS {
            let angle = -(k as f64) * PI / CAP_ARC_SEGMENTS as f64;
            ring.push(center.add(radius.rotate(angle)));
        }
    }
    ring.extend(right.iter().rev());

    // Round to database units, drop consecutive duplicates, and close
    let mut pts: Vec<Point> = Vec::with_capacity(ring.len() + 1);
    for v in ring {
        let pt = v.to_point();
        if pts.last() != Some(&pt) {
            pts.push(pt);
        }
    }
    if pts.first() != pts.last() {
        let first = pts[0];
        pts.push(first);
    }
    PathOutline::Ring(pts)
}
