//!
//! # Scope21 Viewer Document Layer
//!
//! Turns a GDSII byte stream into an immutable viewer [Document]:
//! a record-driven parser state machine ([parse]), path-outline geometry
//! synthesis ([outline]), and the document model with its layer registry
//! and deterministic display colors ([document]).
//!
//! The library core never touches the filesystem; callers hand it bytes:
//!
//! ```rust
//! use scope21doc::parse_gds;
//!
//! let outcome = parse_gds(&[]);
//! assert!(!outcome.document.complete);
//! ```
//!

pub mod bbox;
pub mod document;
pub mod geom;
pub mod outline;
pub mod parse;

pub use bbox::BoundBox;
pub use document::{
    Cell, Color, DocStats, Document, Instance, Layer, LayerSpec, Layers, Polygon, PolygonKind,
    COLORS,
};
pub use geom::{Int, Point};
pub use outline::{synthesize, PathOutline, PathType};
pub use parse::{parse_gds, ParseOutcome, ParseWarning};

// Unit tests
#[cfg(test)]
mod tests;
