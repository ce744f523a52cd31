//!
//! # GDSII Stream to Document Parser
//!
//! Drives the record stream from [scope21gds] through a closed state machine,
//! accumulating per-element state between element-open records and `ENDEL`,
//! sealing cells at `ENDSTR`, and assembling the final [Document].
//!
//! The grammar nests three levels deep (library, cell, element) but arrives
//! as a flat record sequence; [ActiveElement] holds the single element-level
//! accumulator that may be open at any time. Malformed sequences are dropped
//! with [ParseWarning]s rather than aborting; only undecodable record
//! boundaries (truncation, bad lengths) end a parse early.
//!

// Std-Lib Imports
use std::fmt;

// Crates.io
use log::{debug, warn};
use serde::{Deserialize, Serialize};

// Local Imports
use crate::bbox::BoundBox;
use crate::document::{
    Cell, Document, Instance, LayerSpec, Polygon, PolygonKind,
};
use crate::geom::{Int, Point};
use crate::outline::{synthesize, PathOutline, PathType};
use scope21gds::{GdsDateTimes, GdsError, GdsRecord, GdsRecordIter, GdsResult, GdsUnits};

/// # Parse Warnings
///
/// Recoverable defects encountered mid-parse. Each corresponds to a dropped
/// record or element; none stops the parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ParseWarning {
    /// A record arrived somewhere the format grammar does not allow it
    Structural { detail: String },
    /// Custom or out-of-spec PATHTYPE value; the path renders with flush caps
    UnsupportedPathType { value: i16 },
    /// A synthesized element had too few distinct points and was dropped
    DegenerateGeometry { cell: String, element: String },
}
impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural { detail } => write!(f, "structural: {}", detail),
            Self::UnsupportedPathType { value } => {
                write!(f, "unsupported pathtype {}, using flush caps", value)
            }
            Self::DegenerateGeometry { cell, element } => {
                write!(f, "degenerate {} dropped in cell {}", element, cell)
            }
        }
    }
}

/// # Parse Outcome
///
/// Everything a parse produces: the document, the warnings gathered along
/// the way, and the fatal stream error if one cut the parse short.
/// When `truncation` is set the document keeps every cell sealed before the
/// break, with its `complete` flag false.
#[derive(Debug)]
pub struct ParseOutcome {
    pub document: Document,
    pub warnings: Vec<ParseWarning>,
    pub truncation: Option<GdsError>,
}

/// In-flight state for a BOUNDARY element
#[derive(Debug, Default)]
struct BoundaryAcc {
    layer: i16,
    datatype: i16,
    xy: Vec<Point>,
}

/// In-flight state for a PATH element.
/// `pathtype` stays a raw i16 until finalization, where out-of-spec
/// values warn and fall back to flush caps.
#[derive(Debug, Default)]
struct PathAcc {
    layer: i16,
    datatype: i16,
    width: i32,
    pathtype: i16,
    begin_extn: Option<i32>,
    end_extn: Option<i32>,
    xy: Vec<Point>,
}

/// In-flight state for an SREF or AREF element
#[derive(Debug, Default)]
struct InstanceAcc {
    cell_name: String,
    origin: Option<Point>,
    colrow: Option<(i16, i16)>,
    reflect: bool,
    mag: Option<f64>,
    angle: Option<f64>,
}

/// The single element-level accumulator that may be open at a time.
/// `Ignored` swallows the record-spans of out-of-scope TEXT/NODE/BOX
/// elements without raising stray-record warnings.
#[derive(Debug, Default)]
enum ActiveElement {
    #[default]
    None,
    Boundary(BoundaryAcc),
    Path(PathAcc),
    Instance(InstanceAcc),
    Ignored,
}
impl ActiveElement {
    /// Name of the open element kind, for warning messages
    fn describe(&self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::Boundary(_) => "boundary",
            Self::Path(_) => "path",
            Self::Instance(_) => "instance",
            Self::Ignored => "ignored element",
        }
    }
}

/// Parse a GDSII byte stream into a [ParseOutcome].
///
/// Single-threaded and single-use; each record is handled in amortized
/// constant time. Never panics on malformed input: grammar violations
/// become [ParseWarning]s, and only undecodable record boundaries stop
/// the parse, surfaced as `truncation` on the outcome.
pub fn parse_gds(bytes: &[u8]) -> ParseOutcome {
    let mut parser = GdsDocParser::default();
    let truncation = parser.run(bytes).err();
    if let Some(ref err) = truncation {
        warn!("parse stopped early: {}", err);
    }
    parser.finish(truncation)
}

/// # GDSII Document Parser
///
/// Owns the in-progress [Document], the open cell if any,
/// and the [ActiveElement] accumulator.
#[derive(Debug, Default)]
struct GdsDocParser {
    doc: Document,
    cell: Option<Cell>,
    active: ActiveElement,
    warnings: Vec<ParseWarning>,
    /// Counter for generated names of cells sealed without a STRNAME
    unnamed: usize,
    /// Next document-unique polygon id
    next_id: usize,
}
impl GdsDocParser {
    /// Consume the stream, dispatching each record. Returns `Err` only for
    /// fatal stream errors; the document state accumulated so far survives.
    fn run(&mut self, bytes: &[u8]) -> GdsResult<()> {
        let mut records = GdsRecordIter::open(bytes)?;
        while let Some(record) = records.next()? {
            self.doc.stats.records += 1;
            self.handle(record);
        }
        Ok(())
    }
    /// Wrap up into a [ParseOutcome]. An open cell at stream-end was never
    /// sealed and is discarded; only sealed cells are visible in the result.
    fn finish(mut self, truncation: Option<GdsError>) -> ParseOutcome {
        if let Some(cell) = self.cell.take() {
            self.structural(format!(
                "stream ended inside cell \"{}\"; cell discarded",
                cell.name
            ));
        }
        if truncation.is_some() {
            self.doc.complete = false;
        }
        self.doc.stats.cells = self.doc.cells.len();
        ParseOutcome {
            document: self.doc,
            warnings: self.warnings,
            truncation,
        }
    }
    /// Per-record dispatch
    fn handle(&mut self, record: GdsRecord) {
        match record {
            // Library-level records
            GdsRecord::Header { version } => self.doc.version = Some(version),
            GdsRecord::BgnLib { dates } => match GdsDateTimes::parse(&dates) {
                Ok(dates) => self.doc.dates = Some(dates),
                Err(e) => self.structural(format!("bad BGNLIB dates: {}", e)),
            },
            GdsRecord::LibName(name) => self.doc.name = name,
            GdsRecord::Units(user, db) => self.doc.units = GdsUnits(user, db),
            GdsRecord::EndLib => {
                if let Some(cell) = self.cell.take() {
                    self.structural(format!("ENDLIB with cell \"{}\" still open", cell.name));
                    self.cell = Some(cell);
                    self.seal_cell();
                }
                self.doc.complete = true;
            }
            // Cell-level records
            GdsRecord::BgnStruct { dates: _ } => {
                if self.cell.is_some() {
                    self.structural("BGNSTR with a cell already open".to_string());
                    self.seal_cell();
                }
                self.cell = Some(Cell::new(""));
            }
            GdsRecord::StructName(name) => match self.cell {
                Some(ref mut cell) => cell.name = name,
                None => self.structural(format!("STRNAME \"{}\" outside a cell", name)),
            },
            GdsRecord::EndStruct => {
                if let ActiveElement::None = self.active {
                } else {
                    self.structural(format!(
                        "ENDSTR with {} still open",
                        self.active.describe()
                    ));
                    self.active = ActiveElement::None;
                }
                if self.cell.is_none() {
                    self.structural("ENDSTR with no cell open".to_string());
                } else {
                    self.seal_cell();
                }
            }
            // Element-open records
            GdsRecord::Boundary => {
                self.open_element(ActiveElement::Boundary(BoundaryAcc::default()))
            }
            GdsRecord::Path => self.open_element(ActiveElement::Path(PathAcc::default())),
            GdsRecord::StructRef | GdsRecord::ArrayRef => {
                self.open_element(ActiveElement::Instance(InstanceAcc::default()))
            }
            GdsRecord::Text | GdsRecord::Node | GdsRecord::Box => {
                self.open_element(ActiveElement::Ignored)
            }
            // Element-attribute records
            GdsRecord::Layer(num) => match self.active {
                ActiveElement::Boundary(ref mut acc) => acc.layer = num,
                ActiveElement::Path(ref mut acc) => acc.layer = num,
                _ => (), // no open shape accumulator: no-op
            },
            GdsRecord::DataType(num) => match self.active {
                ActiveElement::Boundary(ref mut acc) => acc.datatype = num,
                ActiveElement::Path(ref mut acc) => acc.datatype = num,
                _ => (),
            },
            GdsRecord::Width(width) => {
                if let ActiveElement::Path(ref mut acc) = self.active {
                    acc.width = width;
                }
            }
            GdsRecord::PathType(value) => {
                if let ActiveElement::Path(ref mut acc) = self.active {
                    acc.pathtype = value;
                }
            }
            GdsRecord::BeginExtn(extn) => {
                // Decoded and stored, but unread by outline synthesis
                if let ActiveElement::Path(ref mut acc) = self.active {
                    acc.begin_extn = Some(extn);
                }
            }
            GdsRecord::EndExtn(extn) => {
                if let ActiveElement::Path(ref mut acc) = self.active {
                    acc.end_extn = Some(extn);
                }
            }
            GdsRecord::StructRefName(name) => match self.active {
                ActiveElement::Instance(ref mut acc) => acc.cell_name = name,
                _ => self.structural(format!("SNAME \"{}\" outside a reference", name)),
            },
            GdsRecord::ColRow { cols, rows } => {
                if let ActiveElement::Instance(ref mut acc) = self.active {
                    acc.colrow = Some((cols, rows));
                }
            }
            GdsRecord::Strans(b0, _b1) => {
                if let ActiveElement::Instance(ref mut acc) = self.active {
                    acc.reflect = b0 & 0x80 != 0;
                }
            }
            GdsRecord::Mag(mag) => {
                if let ActiveElement::Instance(ref mut acc) = self.active {
                    acc.mag = Some(mag);
                }
            }
            GdsRecord::Angle(angle) => {
                if let ActiveElement::Instance(ref mut acc) = self.active {
                    acc.angle = Some(angle);
                }
            }
            GdsRecord::Xy(vals) => {
                let pts = points(&vals);
                match self.active {
                    ActiveElement::Boundary(ref mut acc) => acc.xy = pts,
                    ActiveElement::Path(ref mut acc) => acc.xy = pts,
                    // AREF XY carries origin plus two lattice points; the
                    // origin is all the accumulator keeps
                    ActiveElement::Instance(ref mut acc) => {
                        acc.origin = pts.first().copied()
                    }
                    ActiveElement::Ignored => (),
                    ActiveElement::None => {
                        self.structural("XY with no element open".to_string())
                    }
                }
            }
            // Element-close
            GdsRecord::EndElement => self.end_element(),
            GdsRecord::Unknown { rtype, dtype, data } => {
                debug!(
                    "skipping unknown record type {:#04x} dtype {:#04x} ({} bytes)",
                    rtype,
                    dtype,
                    data.len()
                );
            }
        }
    }
    /// Open a new element accumulator, dropping (with a warning)
    /// whatever was left open
    fn open_element(&mut self, next: ActiveElement) {
        if let ActiveElement::None = self.active {
        } else {
            self.structural(format!(
                "new element opened with {} still open; prior element dropped",
                self.active.describe()
            ));
        }
        self.active = next;
    }
    /// ENDEL: finalize and store the open element
    fn end_element(&mut self) {
        let active = std::mem::take(&mut self.active);
        match active {
            ActiveElement::None => {
                self.structural("ENDEL with no element open".to_string())
            }
            ActiveElement::Ignored => (),
            ActiveElement::Boundary(acc) => self.finalize_boundary(acc),
            ActiveElement::Path(acc) => self.finalize_path(acc),
            ActiveElement::Instance(acc) => self.finalize_instance(acc),
        }
    }
    /// Close out a BOUNDARY into a ring [Polygon]
    fn finalize_boundary(&mut self, acc: BoundaryAcc) {
        if self.cell.is_none() {
            self.structural("boundary outside a cell; dropped".to_string());
            return;
        }
        let mut pts = acc.xy;
        // The stream's closing point is optional; guarantee first == last
        if pts.first() != pts.last() {
            if let Some(first) = pts.first().copied() {
                pts.push(first);
            }
        }
        let outline = PathOutline::Ring(pts);
        if outline.is_degenerate() {
            self.drop_degenerate("boundary");
            return;
        }
        if let PathOutline::Ring(pts) = outline {
            self.store_polygon(pts, LayerSpec::new(acc.layer, acc.datatype), PolygonKind::Ring);
        }
    }
    /// Close out a PATH, synthesizing its outline
    fn finalize_path(&mut self, acc: PathAcc) {
        if self.cell.is_none() {
            self.structural("path outside a cell; dropped".to_string());
            return;
        }
        let pathtype = match PathType::from_i16(acc.pathtype) {
            Some(PathType::Custom) => {
                self.warning(ParseWarning::UnsupportedPathType { value: acc.pathtype });
                PathType::Custom
            }
            Some(pt) => pt,
            None => {
                self.warning(ParseWarning::UnsupportedPathType { value: acc.pathtype });
                PathType::Flush
            }
        };
        let outline = synthesize(&acc.xy, acc.width as Int, pathtype);
        if outline.is_degenerate() {
            self.drop_degenerate("path");
            return;
        }
        let layer = LayerSpec::new(acc.layer, acc.datatype);
        match outline {
            PathOutline::Ring(pts) => self.store_polygon(pts, layer, PolygonKind::Ring),
            PathOutline::Polyline(pts) => self.store_polygon(pts, layer, PolygonKind::Polyline),
            // Covered by the degeneracy check above
            PathOutline::Empty => (),
        }
    }
    /// Close out an SREF/AREF into an [Instance]
    fn finalize_instance(&mut self, acc: InstanceAcc) {
        let cell = match self.cell {
            Some(ref mut cell) => cell,
            None => {
                self.structural("reference outside a cell; dropped".to_string());
                return;
            }
        };
        if acc.cell_name.is_empty() {
            self.structural("reference with no SNAME; dropped".to_string());
            return;
        }
        let origin = match acc.origin {
            Some(origin) => origin,
            None => {
                self.structural(format!(
                    "reference to \"{}\" with no XY; dropped",
                    acc.cell_name
                ));
                return;
            }
        };
        cell.instances.push(Instance {
            cell_name: acc.cell_name,
            origin,
            colrow: acc.colrow,
            reflect: acc.reflect,
            mag: acc.mag,
            angle: acc.angle,
        });
    }
    /// Register a finalized polygon with its layer entry and running counters
    fn store_polygon(&mut self, points: Vec<Point>, layer: LayerSpec, kind: PolygonKind) {
        self.doc.layers.get_or_insert(layer);
        let bbox = BoundBox::from_points(&points);
        let polygon = Polygon {
            id: self.next_id,
            points,
            layer,
            bbox: bbox.clone(),
            kind,
        };
        self.next_id += 1;
        match kind {
            PolygonKind::Ring => self.doc.stats.polygons += 1,
            PolygonKind::Polyline => self.doc.stats.polylines += 1,
        }
        // `cell.is_some()` is checked by every caller
        if let Some(ref mut cell) = self.cell {
            cell.bbox = cell.bbox.union(&bbox);
            cell.polygons.push(polygon);
        }
    }
    /// ENDSTR: move the open cell into the document.
    /// Cells sealed without a STRNAME get a generated name; a repeated
    /// name replaces the earlier cell. Both cases warn.
    fn seal_cell(&mut self) {
        let mut cell = match self.cell.take() {
            Some(cell) => cell,
            None => return,
        };
        if cell.name.is_empty() {
            cell.name = format!("unnamed{}", self.unnamed);
            self.unnamed += 1;
            self.structural(format!(
                "cell sealed without STRNAME; named \"{}\"",
                cell.name
            ));
        }
        let name = cell.name.clone();
        if self.doc.cells.insert(name.clone(), cell).is_some() {
            self.structural(format!(
                "duplicate cell name \"{}\"; later definition replaces earlier",
                name
            ));
        } else {
            self.doc.cell_order.push(name);
        }
    }
    fn drop_degenerate(&mut self, element: &str) {
        let cell = self
            .cell
            .as_ref()
            .map(|c| c.name.clone())
            .unwrap_or_default();
        self.doc.stats.dropped += 1;
        self.warning(ParseWarning::DegenerateGeometry {
            cell,
            element: element.to_string(),
        });
    }
    fn structural(&mut self, detail: String) {
        self.warning(ParseWarning::Structural { detail });
    }
    fn warning(&mut self, warning: ParseWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}

/// Pair up an XY payload's i32 coordinates into [Point]s.
/// A trailing odd coordinate, if any, is dropped.
fn points(vals: &[i32]) -> Vec<Point> {
    vals.chunks_exact(2)
        .map(|c| Point::new(c[0] as Int, c[1] as Int))
        .collect()
}
