//!
//! # Viewer Document Model
//!
//! The assembled, immutable result of a parse:
//! cells full of polygons and instances, a layer registry
//! with deterministic display colors, and summary statistics.
//!

// Std-Lib Imports
use std::collections::HashMap;

// Crates.io
use serde::{Deserialize, Serialize};

// Local Imports
use crate::bbox::BoundBox;
use crate::geom::Point;
use scope21gds::{GdsDateTimes, GdsUnits};

/// # Display Color
///
/// RGB triple in the zero-to-one range, ready for upload to a render pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color(pub [f32; 3]);

/// Palette cycled through as layers are first sighted
pub const COLORS: [Color; 7] = [
    Color([1.0, 0.0, 0.0]), // red
    Color([0.0, 1.0, 0.0]), // green
    Color([0.0, 0.0, 1.0]), // blue
    Color([1.0, 1.0, 0.0]), //
    Color([1.0, 0.0, 1.0]), //
    Color([0.0, 1.0, 1.0]), //
    Color([1.0, 1.0, 1.0]), // white
];

/// # Layer Specification
/// As in seemingly every layout system, this uses two numbers to identify each layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerSpec(pub i16, pub i16);
impl LayerSpec {
    pub fn new(layer: i16, datatype: i16) -> Self {
        Self(layer, datatype)
    }
    /// GDSII layer number
    pub fn layer(&self) -> i16 {
        self.0
    }
    /// GDSII datatype number
    pub fn datatype(&self) -> i16 {
        self.1
    }
    /// Derive this spec's display [Color], a pure function of the two numbers.
    /// Re-parsing the same file always yields the same per-layer colors.
    pub fn color(&self) -> Color {
        let key = self.0 as i64 * 131 + self.1 as i64;
        COLORS[key.rem_euclid(COLORS.len() as i64) as usize]
    }
}

/// # Per-Layer Display Entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layer {
    /// (Layer, datatype) identifier
    pub spec: LayerSpec,
    /// Display name, generally of the form "24/0"
    pub name: String,
    /// Display color, derived from `spec`
    pub color: Color,
    /// Display toggle; layers start visible
    pub visible: bool,
}
impl Layer {
    fn from_spec(spec: LayerSpec) -> Self {
        Self {
            spec,
            name: format!("{}/{}", spec.layer(), spec.datatype()),
            color: spec.color(),
            visible: true,
        }
    }
}

/// # Layer Set & Manager
///
/// Keeps one [Layer] per (layer, datatype) pair sighted during a parse,
/// preserving insertion order for stable display stacking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Layers {
    slots: HashMap<LayerSpec, Layer>,
    order: Vec<LayerSpec>,
}
impl Layers {
    /// Get the [Layer] for `spec`, creating it on first sighting
    pub fn get_or_insert(&mut self, spec: LayerSpec) -> &Layer {
        if !self.slots.contains_key(&spec) {
            self.slots.insert(spec, Layer::from_spec(spec));
            self.order.push(spec);
        }
        &self.slots[&spec]
    }
    /// Get a reference to the [Layer] for `spec`, if present
    pub fn get(&self, spec: LayerSpec) -> Option<&Layer> {
        self.slots.get(&spec)
    }
    /// Iterate over layers in first-sighting order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.order.iter().filter_map(move |spec| self.slots.get(spec))
    }
    pub fn len(&self) -> usize {
        self.order.len()
    }
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Distinguishes filled rings from zero-width stroked centerlines
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PolygonKind {
    /// Closed, filled outline; first point repeated last
    Ring,
    /// Unclosed zero-width path centerline, stroked rather than filled
    Polyline,
}

/// # Finalized Polygon
///
/// Immutable once built. Ring points are closed (first == last);
/// polylines are the sole unclosed exception.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Polygon {
    /// Document-unique identifier, in element order
    pub id: usize,
    /// Vertex list, in database units
    pub points: Vec<Point>,
    /// (Layer, datatype) pair
    pub layer: LayerSpec,
    /// Pre-computed point-wise bounding box
    pub bbox: BoundBox,
    pub kind: PolygonKind,
}

/// # Cell Instance
///
/// A placement of another cell by name, from SREF or AREF.
/// Accumulated for document completeness; no geometry is synthesized from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instance {
    /// Name of the referenced cell
    pub cell_name: String,
    /// Location of the referenced cell's origin
    pub origin: Point,
    /// Array columns and rows; `None` for single (SREF) placements
    pub colrow: Option<(i16, i16)>,
    /// Vertical reflection, applied before rotation
    pub reflect: bool,
    /// Magnification factor
    pub mag: Option<f64>,
    /// Angle of rotation (degrees), counter-clockwise
    pub angle: Option<f64>,
}

/// # Layout Cell
///
/// Sealed at ENDSTR and never revisited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Cell {
    pub name: String,
    pub polygons: Vec<Polygon>,
    pub instances: Vec<Instance>,
    /// Union of the polygon bounding boxes
    pub bbox: BoundBox,
}
impl Cell {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            polygons: Vec::new(),
            instances: Vec::new(),
            bbox: BoundBox::empty(),
        }
    }
}

/// # Parse Statistics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocStats {
    /// Total records consumed from the stream
    pub records: usize,
    /// Sealed cells
    pub cells: usize,
    /// Filled polygons, including converted paths
    pub polygons: usize,
    /// Zero-width path centerlines
    pub polylines: usize,
    /// Elements dropped as degenerate
    pub dropped: usize,
}

/// # Viewer Document
///
/// Built once per parse and never mutated afterward.
/// Invariants: every polygon's (layer, datatype) pair has a [Layer] entry,
/// and every ring carries at least three distinct points,
/// with two-point polylines the sole permitted exception.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Library name, from LIBNAME
    pub name: String,
    /// GDSII format version, from HEADER
    pub version: Option<i16>,
    /// Modification and access dates, from BGNLIB
    pub dates: Option<GdsDateTimes>,
    /// Database and user unit sizes
    pub units: GdsUnits,
    /// Sealed cells, by name
    pub cells: HashMap<String, Cell>,
    /// Cell names in stream order
    pub cell_order: Vec<String>,
    /// Layer registry
    pub layers: Layers,
    pub stats: DocStats,
    /// True only when ENDLIB was reached without a fatal error
    pub complete: bool,
}
impl Document {
    /// Iterate over cells in stream order
    pub fn cells_ordered(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cell_order.iter().filter_map(move |name| self.cells.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_colors_are_deterministic() {
        let spec = LayerSpec::new(24, 0);
        assert_eq!(spec.color(), spec.color());
        assert_eq!(spec.color(), LayerSpec::new(24, 0).color());
        // Negative layer numbers still index the palette
        let _ = LayerSpec::new(-3, -7).color();
    }

    #[test]
    fn layers_insert_once_in_order() {
        let mut layers = Layers::default();
        layers.get_or_insert(LayerSpec::new(24, 0));
        layers.get_or_insert(LayerSpec::new(1, 0));
        layers.get_or_insert(LayerSpec::new(24, 0));
        assert_eq!(layers.len(), 2);
        let specs: Vec<LayerSpec> = layers.iter().map(|l| l.spec).collect();
        assert_eq!(specs, vec![LayerSpec::new(24, 0), LayerSpec::new(1, 0)]);
        let layer = layers.get(LayerSpec::new(24, 0)).unwrap();
        assert_eq!(layer.name, "24/0");
        assert!(layer.visible);
    }
}
