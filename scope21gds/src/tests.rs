//!
//! # Scope21 GDSII Decoder Tests
//!

use super::*;
use crate::write::{encode_record, encode_stream};

/// Drain `bytes` into a vector of records
fn decode_all(bytes: &[u8]) -> GdsResult<Vec<GdsRecord>> {
    let mut it = GdsRecordIter::open(bytes)?;
    let mut records = Vec::new();
    while let Some(r) = it.next()? {
        records.push(r);
    }
    Ok(records)
}

#[test]
fn it_round_trips_records() -> GdsResult<()> {
    // Encode a representative set of records, and check each decodes back identically
    let records = vec![
        GdsRecord::Header { version: 600 },
        GdsRecord::BgnLib {
            dates: vec![70, 1, 1, 0, 0, 1, 70, 1, 1, 0, 0, 1],
        },
        GdsRecord::LibName("lib".into()),
        GdsRecord::Units(1e-3, 1e-9),
        GdsRecord::BgnStruct {
            dates: vec![70, 1, 1, 0, 0, 1, 70, 1, 1, 0, 0, 1],
        },
        GdsRecord::StructName("cell0".into()),
        GdsRecord::Path,
        GdsRecord::Layer(24),
        GdsRecord::DataType(0),
        GdsRecord::PathType(1),
        GdsRecord::Width(250),
        GdsRecord::BeginExtn(10),
        GdsRecord::EndExtn(-10),
        GdsRecord::Xy(vec![0, 0, 1000, 0, 1000, 1000]),
        GdsRecord::EndElement,
        GdsRecord::StructRef,
        GdsRecord::StructRefName("cell1".into()),
        GdsRecord::Strans(0x80, 0x00),
        GdsRecord::Mag(2.0),
        GdsRecord::Angle(90.0),
        GdsRecord::ColRow { cols: 3, rows: 2 },
        GdsRecord::EndStruct,
        GdsRecord::EndLib,
    ];
    let bytes = encode_stream(&records)?;
    assert_eq!(decode_all(&bytes)?, records);
    Ok(())
}

#[test]
fn it_decodes_gds_floats() {
    // Golden values from the GDSII spec's float examples
    for val in [0.0, 1.0, -1.0, 1e-3, 1e-9, 0.5, 2.0, 1e6, -255.75] {
        let enc = GdsFloat64::encode(val);
        let dec = GdsFloat64::decode(enc);
        assert!(
            (dec - val).abs() <= val.abs() * 1e-14,
            "float round-trip failed for {}",
            val
        );
    }
    // Zero encodes to all-zero bytes
    assert_eq!(GdsFloat64::encode(0.0), 0u64);
}

#[test]
fn it_passes_unknown_records_through() -> GdsResult<()> {
    // PROPATTR (0x2B) is spec-valid but un-acted-upon: it decodes generically
    let bytes = encode_stream(&[GdsRecord::Unknown {
        rtype: 0x2B,
        dtype: 0x02,
        data: vec![0x00, 0x01],
    }])?;
    let records = decode_all(&bytes)?;
    assert_eq!(
        records,
        vec![GdsRecord::Unknown {
            rtype: 0x2B,
            dtype: 0x02,
            data: vec![0x00, 0x01],
        }]
    );
    Ok(())
}

#[test]
fn it_passes_deprecated_records_through() -> GdsResult<()> {
    // SPACING (0x18) is "Discontinued"; it must survive as a generic record
    let bytes = encode_stream(&[GdsRecord::Unknown {
        rtype: 0x18,
        dtype: 0x02,
        data: vec![0x00, 0x02],
    }])?;
    let records = decode_all(&bytes)?;
    assert!(matches!(records[0], GdsRecord::Unknown { rtype: 0x18, .. }));
    Ok(())
}

#[test]
fn it_decodes_out_of_spec_payloads_generically() -> GdsResult<()> {
    // A LAYER record with a four-byte payload is out of spec,
    // but its boundary is sound, so it passes through generically.
    let bytes = vec![0x00, 0x08, 0x0D, 0x02, 0, 0, 0, 7];
    let records = decode_all(&bytes)?;
    assert_eq!(
        records,
        vec![GdsRecord::Unknown {
            rtype: 0x0D,
            dtype: 0x02,
            data: vec![0, 0, 0, 7],
        }]
    );
    Ok(())
}

#[test]
fn it_rejects_truncated_streams() -> GdsResult<()> {
    // An XY record declaring 24 payload bytes, with only 8 present
    let mut full = Vec::new();
    encode_record(&GdsRecord::Xy(vec![0, 0, 1000, 0, 1000, 1000]), &mut full)?;
    let bytes = &full[..12]; // 4 header bytes + 8 of 24 payload bytes
    match decode_all(bytes) {
        Err(GdsError::Truncated { needed, available }) => {
            assert_eq!(needed, 24);
            assert_eq!(available, 8);
            Ok(())
        }
        other => panic!("expected truncation error, got {:?}", other),
    }
}

#[test]
fn it_rejects_bad_record_lengths() {
    // Length below the four header bytes
    assert!(matches!(
        decode_all(&[0x00, 0x02, 0x00, 0x00]),
        Err(GdsError::RecordLen(2))
    ));
    // Odd length
    assert!(matches!(
        decode_all(&[0x00, 0x05, 0x00, 0x00, 0x00]),
        Err(GdsError::RecordLen(5))
    ));
}

#[test]
fn it_stops_at_endlib() -> GdsResult<()> {
    // Trailing garbage after ENDLIB is never decoded
    let mut bytes = encode_stream(&[GdsRecord::Header { version: 600 }, GdsRecord::EndLib])?;
    bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF]); // would be a RecordLen error if read
    let records = decode_all(&bytes)?;
    assert_eq!(
        records,
        vec![GdsRecord::Header { version: 600 }, GdsRecord::EndLib]
    );
    Ok(())
}

#[test]
fn it_handles_empty_input() -> GdsResult<()> {
    assert_eq!(decode_all(&[])?, Vec::new());
    Ok(())
}

#[test]
fn it_peeks() -> GdsResult<()> {
    let bytes = encode_stream(&[GdsRecord::Header { version: 600 }, GdsRecord::EndLib])?;
    let mut it = GdsRecordIter::open(&bytes)?;
    assert_eq!(*it.peek(), Some(GdsRecord::Header { version: 600 }));
    assert_eq!(it.next()?, Some(GdsRecord::Header { version: 600 }));
    assert_eq!(*it.peek(), Some(GdsRecord::EndLib));
    Ok(())
}

#[test]
fn it_parses_dates() -> GdsResult<()> {
    let d = [70, 1, 1, 0, 0, 1, 122, 6, 15, 12, 30, 0];
    let dates = GdsDateTimes::parse(&d)?;
    assert_eq!(dates.encode(), vec![1970, 1, 1, 0, 0, 1, 2022, 6, 15, 12, 30, 0]);
    assert!(GdsDateTimes::parse(&d[..6]).is_err());
    Ok(())
}

#[test]
fn it_strips_string_padding() -> GdsResult<()> {
    // Odd-length names are NUL-padded on disk and stripped on decode
    let bytes = encode_stream(&[GdsRecord::StructName("abc".into())])?;
    assert_eq!(bytes.len() % 2, 0);
    assert_eq!(decode_all(&bytes)?, vec![GdsRecord::StructName("abc".into())]);
    Ok(())
}

#[test]
fn it_serializes_records() {
    // Records are serde-serializable, for golden-style comparisons downstream
    let r = GdsRecord::Xy(vec![0, 0, 10, 0]);
    let json = serde_json::to_string(&r).unwrap();
    let back: GdsRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(r, back);
}
