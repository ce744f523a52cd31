//!
//! # Document-Level Unit Tests
//!
//! Streams are built synthetically with the [scope21gds::write] test encoder,
//! then parsed back through [parse_gds].
//!

use crate::document::{LayerSpec, PolygonKind};
use crate::geom::Point;
use crate::parse::{parse_gds, ParseWarning};
use scope21gds::write::encode_stream;
use scope21gds::GdsRecord;

/// A plausible BGNLIB / BGNSTR date payload
fn dates() -> Vec<i16> {
    vec![2023, 5, 1, 0, 0, 0, 2023, 5, 1, 0, 0, 0]
}
/// Wrap `records` in a library prelude and ENDLIB, and encode to bytes
fn lib(records: Vec<GdsRecord>) -> Vec<u8> {
    let mut all = vec![
        GdsRecord::Header { version: 600 },
        GdsRecord::BgnLib { dates: dates() },
        GdsRecord::LibName("testlib".into()),
        GdsRecord::Units(1e-3, 1e-9),
    ];
    all.extend(records);
    all.push(GdsRecord::EndLib);
    encode_stream(&all).unwrap()
}
/// Wrap `elems` in a named cell
fn cell(name: &str, elems: Vec<GdsRecord>) -> Vec<GdsRecord> {
    let mut all = vec![
        GdsRecord::BgnStruct { dates: dates() },
        GdsRecord::StructName(name.into()),
    ];
    all.extend(elems);
    all.push(GdsRecord::EndStruct);
    all
}

#[test]
fn it_parses_a_minimal_boundary() {
    // A unit square: four corners plus the stream's closing point
    let bytes = lib(cell(
        "SQ",
        vec![
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 10, 0, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert!(outcome.truncation.is_none());
    assert!(outcome.warnings.is_empty());
    let doc = outcome.document;
    assert!(doc.complete);
    assert_eq!(doc.name, "testlib");
    assert_eq!(doc.version, Some(600));
    assert!(doc.dates.is_some());
    assert_eq!(doc.stats.cells, 1);
    assert_eq!(doc.stats.polygons, 1);
    let sq = &doc.cells["SQ"];
    assert_eq!(sq.polygons.len(), 1);
    let poly = &sq.polygons[0];
    assert_eq!(poly.kind, PolygonKind::Ring);
    assert_eq!(poly.layer, LayerSpec::new(1, 0));
    assert_eq!(poly.points.len(), 5);
    assert_eq!(poly.points.first(), poly.points.last());
    assert!(doc.layers.get(LayerSpec::new(1, 0)).is_some());
}

#[test]
fn it_closes_unclosed_boundaries() {
    // Same square without the closing point; the parser closes it
    let bytes = lib(cell(
        "SQ",
        vec![
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 10]),
            GdsRecord::EndElement,
        ],
    ));
    let doc = parse_gds(&bytes).document;
    let poly = &doc.cells["SQ"].polygons[0];
    assert_eq!(poly.points.len(), 5);
    assert_eq!(poly.points.first(), poly.points.last());
}

#[test]
fn it_synthesizes_closed_rings_from_wide_paths() {
    let bytes = lib(cell(
        "P",
        vec![
            GdsRecord::Path,
            GdsRecord::Layer(2),
            GdsRecord::DataType(0),
            GdsRecord::Width(10),
            GdsRecord::Xy(vec![0, 0, 100, 0, 100, 100]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert!(outcome.warnings.is_empty());
    let doc = outcome.document;
    assert_eq!(doc.stats.polygons, 1);
    assert_eq!(doc.stats.polylines, 0);
    let poly = &doc.cells["P"].polygons[0];
    assert_eq!(poly.kind, PolygonKind::Ring);
    assert_eq!(poly.points.first(), poly.points.last());
    // At least three distinct points
    let distinct: std::collections::HashSet<&Point> = poly.points.iter().collect();
    assert!(distinct.len() >= 3);
}

#[test]
fn it_warns_on_stray_xy_and_completes() {
    // An XY with no element open is dropped with exactly one warning,
    // and the parse still completes
    let bytes = lib(cell(
        "C",
        vec![
            GdsRecord::Xy(vec![1, 2]),
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(matches!(
        outcome.warnings[0],
        ParseWarning::Structural { .. }
    ));
    assert!(outcome.document.complete);
    assert_eq!(outcome.document.stats.polygons, 1);
}

#[test]
fn it_handles_many_zero_width_paths() {
    // 10k zero-width paths on one layer: 10k polylines, one layer entry
    let mut elems = Vec::new();
    for i in 0..10_000i32 {
        elems.extend(vec![
            GdsRecord::Path,
            GdsRecord::Layer(5),
            GdsRecord::DataType(0),
            GdsRecord::Width(0),
            GdsRecord::Xy(vec![i, 0, i, 100]),
            GdsRecord::EndElement,
        ]);
    }
    let bytes = lib(cell("MANY", elems));
    let outcome = parse_gds(&bytes);
    assert!(outcome.warnings.is_empty());
    let doc = outcome.document;
    assert!(doc.complete);
    assert_eq!(doc.stats.polylines, 10_000);
    assert_eq!(doc.stats.polygons, 0);
    assert_eq!(doc.layers.len(), 1);
    assert_eq!(doc.cells["MANY"].polygons.len(), 10_000);
}

#[test]
fn it_parses_the_top_cell_scenario() {
    // One zero-width two-point path on layer 24:
    // a single polyline, identity centerline, bbox {0,0}..{1000,0}
    let bytes = lib(cell(
        "TOP",
        vec![
            GdsRecord::Path,
            GdsRecord::Layer(24),
            GdsRecord::DataType(0),
            GdsRecord::Width(0),
            GdsRecord::Xy(vec![0, 0, 1000, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let doc = parse_gds(&bytes).document;
    let top = &doc.cells["TOP"];
    assert_eq!(top.polygons.len(), 1);
    let poly = &top.polygons[0];
    assert_eq!(poly.kind, PolygonKind::Polyline);
    assert_eq!(poly.layer, LayerSpec::new(24, 0));
    assert_eq!(poly.points, vec![Point::new(0, 0), Point::new(1000, 0)]);
    assert_eq!(top.bbox.p0, Point::new(0, 0));
    assert_eq!(top.bbox.p1, Point::new(1000, 0));
}

#[test]
fn it_falls_back_on_unsupported_pathtypes() {
    // Pathtype 4 (custom) and an out-of-spec 3 both warn and render flush
    let bytes = lib(cell(
        "C",
        vec![
            GdsRecord::Path,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Width(10),
            GdsRecord::PathType(4),
            GdsRecord::BeginExtn(5),
            GdsRecord::EndExtn(5),
            GdsRecord::Xy(vec![0, 0, 100, 0]),
            GdsRecord::EndElement,
            GdsRecord::Path,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Width(10),
            GdsRecord::PathType(3),
            GdsRecord::Xy(vec![0, 0, 100, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert_eq!(outcome.warnings.len(), 2);
    assert_eq!(
        outcome.warnings[0],
        ParseWarning::UnsupportedPathType { value: 4 }
    );
    assert_eq!(
        outcome.warnings[1],
        ParseWarning::UnsupportedPathType { value: 3 }
    );
    let cell = &outcome.document.cells["C"];
    assert_eq!(cell.polygons.len(), 2);
    // Both render with flush caps: identical four-corner rectangles
    assert_eq!(cell.polygons[0].points, cell.polygons[1].points);
    assert_eq!(cell.polygons[0].points.len(), 5);
}

#[test]
fn it_drops_degenerate_elements() {
    let bytes = lib(cell(
        "C",
        vec![
            // Two-point boundary: no area, dropped
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0]),
            GdsRecord::EndElement,
            // Single-point wide path: dropped
            GdsRecord::Path,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Width(10),
            GdsRecord::Xy(vec![0, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert_eq!(outcome.warnings.len(), 2);
    assert!(outcome
        .warnings
        .iter()
        .all(|w| matches!(w, ParseWarning::DegenerateGeometry { .. })));
    let doc = outcome.document;
    assert_eq!(doc.stats.dropped, 2);
    assert_eq!(doc.stats.polygons, 0);
    assert!(doc.cells["C"].polygons.is_empty());
}

#[test]
fn it_accumulates_instances() {
    let bytes = lib(cell(
        "TOP",
        vec![
            GdsRecord::StructRef,
            GdsRecord::StructRefName("CHILD".into()),
            GdsRecord::Strans(0x80, 0),
            GdsRecord::Mag(2.0),
            GdsRecord::Angle(90.0),
            GdsRecord::Xy(vec![100, 200]),
            GdsRecord::EndElement,
            GdsRecord::ArrayRef,
            GdsRecord::StructRefName("CHILD".into()),
            GdsRecord::ColRow { cols: 4, rows: 2 },
            GdsRecord::Xy(vec![0, 0, 400, 0, 0, 200]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert!(outcome.warnings.is_empty());
    let top = &outcome.document.cells["TOP"];
    assert_eq!(top.instances.len(), 2);
    let sref = &top.instances[0];
    assert_eq!(sref.cell_name, "CHILD");
    assert_eq!(sref.origin, Point::new(100, 200));
    assert!(sref.reflect);
    assert_eq!(sref.mag, Some(2.0));
    assert_eq!(sref.angle, Some(90.0));
    assert_eq!(sref.colrow, None);
    let aref = &top.instances[1];
    assert_eq!(aref.origin, Point::new(0, 0));
    assert_eq!(aref.colrow, Some((4, 2)));
}

#[test]
fn it_keeps_sealed_cells_on_truncation() {
    let mut elems = cell(
        "GOOD",
        vec![
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 0]),
            GdsRecord::EndElement,
        ],
    );
    elems.extend(cell("PART", vec![]));
    let full = lib(elems);
    // Cut into the final record's header: "PART" never seals, "GOOD" survives
    let cut = &full[..full.len() - 2];
    let outcome = parse_gds(cut);
    assert!(outcome.truncation.is_some());
    let doc = outcome.document;
    assert!(!doc.complete);
    assert_eq!(doc.stats.cells, 1);
    assert_eq!(doc.cells["GOOD"].polygons.len(), 1);
    assert!(!doc.cells.contains_key("PART"));
    // The discarded open cell is called out
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, ParseWarning::Structural { .. })));
}

#[test]
fn it_names_unnamed_cells() {
    // A cell sealed without STRNAME gets a generated name and a warning
    let bytes = lib(vec![
        GdsRecord::BgnStruct { dates: dates() },
        GdsRecord::EndStruct,
    ]);
    let outcome = parse_gds(&bytes);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.document.cells.contains_key("unnamed0"));
    assert_eq!(outcome.document.cell_order, vec!["unnamed0".to_string()]);
}

#[test]
fn it_swallows_ignored_elements() {
    // TEXT spans are skipped wholesale; their inner records raise no warnings
    let bytes = lib(cell(
        "C",
        vec![
            GdsRecord::Text,
            GdsRecord::Layer(63),
            GdsRecord::Xy(vec![5, 5]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert!(outcome.warnings.is_empty());
    let doc = outcome.document;
    assert!(doc.complete);
    assert!(doc.cells["C"].polygons.is_empty());
    assert!(doc.layers.is_empty());
}

#[test]
fn it_ignores_unknown_records() {
    // An unrecognized record type passes through the decoder and is skipped
    let bytes = lib(cell(
        "C",
        vec![
            GdsRecord::Unknown {
                rtype: 0x22, // NODETYPE, undecoded
                dtype: 0x02,
                data: vec![0x00, 0x07],
            },
            GdsRecord::Boundary,
            GdsRecord::Layer(1),
            GdsRecord::DataType(0),
            GdsRecord::Xy(vec![0, 0, 10, 0, 10, 10, 0, 0]),
            GdsRecord::EndElement,
        ],
    ));
    let outcome = parse_gds(&bytes);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.document.stats.polygons, 1);
}

#[test]
fn it_keeps_cells_in_stream_order() {
    let mut elems = cell("B", vec![]);
    elems.extend(cell("A", vec![]));
    elems.extend(cell("M", vec![]));
    let bytes = lib(elems);
    let doc = parse_gds(&bytes).document;
    assert_eq!(
        doc.cell_order,
        vec!["B".to_string(), "A".to_string(), "M".to_string()]
    );
    let ordered: Vec<&str> = doc.cells_ordered().map(|c| c.name.as_str()).collect();
    assert_eq!(ordered, vec!["B", "A", "M"]);
}

#[test]
fn it_counts_records() {
    let bytes = lib(cell("C", vec![]));
    let doc = parse_gds(&bytes).document;
    // Four prelude records, BGNSTR + STRNAME + ENDSTR, and ENDLIB
    assert_eq!(doc.stats.records, 8);
}
