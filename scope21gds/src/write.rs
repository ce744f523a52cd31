//!
//! # Scope21 GDSII Record Encoding
//!
//! Test-support encoding of [GdsRecord]s back into binary form,
//! used to build synthetic byte streams for decoder and parser tests.
//! The viewer core itself never writes GDSII;
//! this module is compiled for tests and the `selftest` feature only.
//!

// Crates.io
use byteorder::{BigEndian, WriteBytesExt};

// Local Imports
use crate::data::*;
use crate::{GdsError, GdsResult};

/// Encode `records` into a fresh byte buffer
pub fn encode_stream(records: &[GdsRecord]) -> GdsResult<Vec<u8>> {
    let mut bytes = Vec::new();
    for r in records {
        encode_record(r, &mut bytes)?;
    }
    Ok(bytes)
}

/// Encode a single [GdsRecord] onto `bytes`
pub fn encode_record(record: &GdsRecord, bytes: &mut Vec<u8>) -> GdsResult<()> {
    // GDS strings are padded to even lengths
    let gds_strlen = |s: &str| -> usize { s.len() + s.len() % 2 };
    // First grab the header info: RecordType, DataType, and length
    use GdsDataType::{BitArray, NoData, Str, F64, I16, I32};
    let (rtype, dtype, len) = match record {
        // Library-Level Records
        GdsRecord::Header { .. } => (GdsRecordType::Header, I16, 2),
        GdsRecord::BgnLib { dates } => (GdsRecordType::BgnLib, I16, 2 * dates.len()),
        GdsRecord::LibName(s) => (GdsRecordType::LibName, Str, gds_strlen(s)),
        GdsRecord::Units(_, _) => (GdsRecordType::Units, F64, 16),
        GdsRecord::EndLib => (GdsRecordType::EndLib, NoData, 0),

        // Structure (Cell) Level Records
        GdsRecord::BgnStruct { dates } => (GdsRecordType::BgnStruct, I16, 2 * dates.len()),
        GdsRecord::StructName(s) => (GdsRecordType::StructName, Str, gds_strlen(s)),
        GdsRecord::StructRefName(s) => (GdsRecordType::StructRefName, Str, gds_strlen(s)),
        GdsRecord::EndStruct => (GdsRecordType::EndStruct, NoData, 0),

        // Element-Level Records
        GdsRecord::Boundary => (GdsRecordType::Boundary, NoData, 0),
        GdsRecord::Path => (GdsRecordType::Path, NoData, 0),
        GdsRecord::StructRef => (GdsRecordType::StructRef, NoData, 0),
        GdsRecord::ArrayRef => (GdsRecordType::ArrayRef, NoData, 0),
        GdsRecord::Text => (GdsRecordType::Text, NoData, 0),
        GdsRecord::Node => (GdsRecordType::Node, NoData, 0),
        GdsRecord::Box => (GdsRecordType::Box, NoData, 0),
        GdsRecord::Layer(_) => (GdsRecordType::Layer, I16, 2),
        GdsRecord::DataType(_) => (GdsRecordType::DataType, I16, 2),
        GdsRecord::Width(_) => (GdsRecordType::Width, I32, 4),
        GdsRecord::Xy(d) => (GdsRecordType::Xy, I32, 4 * d.len()),
        GdsRecord::EndElement => (GdsRecordType::EndElement, NoData, 0),

        // Instance & Path Attribute Records
        GdsRecord::ColRow { .. } => (GdsRecordType::ColRow, I16, 4),
        GdsRecord::Strans(_, _) => (GdsRecordType::Strans, BitArray, 2),
        GdsRecord::Mag(_) => (GdsRecordType::Mag, F64, 8),
        GdsRecord::Angle(_) => (GdsRecordType::Angle, F64, 8),
        GdsRecord::PathType(_) => (GdsRecordType::PathType, I16, 2),
        GdsRecord::BeginExtn(_) => (GdsRecordType::BeginExtn, I32, 4),
        GdsRecord::EndExtn(_) => (GdsRecordType::EndExtn, I32, 4),

        // Generic records re-emit their raw bytes
        GdsRecord::Unknown { rtype, dtype, data } => {
            match u16::try_from(data.len() + 4) {
                Ok(total) => bytes.write_u16::<BigEndian>(total)?,
                Err(_) => return Err(GdsError::RecordLen(data.len())),
            };
            bytes.write_u8(*rtype)?;
            bytes.write_u8(*dtype)?;
            bytes.extend_from_slice(data);
            return Ok(());
        }
    };
    // Send those header-bytes to the buffer.
    // Include the four header bytes in total-length.
    match u16::try_from(len + 4) {
        Ok(val) => bytes.write_u16::<BigEndian>(val)?,
        Err(_) => return Err(GdsError::RecordLen(len)),
    };
    bytes.write_u8(rtype as u8)?;
    bytes.write_u8(dtype as u8)?;

    // Now write the data portion, organized by data-type
    match record {
        // NoData
        GdsRecord::EndLib
        | GdsRecord::EndStruct
        | GdsRecord::Boundary
        | GdsRecord::Path
        | GdsRecord::StructRef
        | GdsRecord::ArrayRef
        | GdsRecord::Text
        | GdsRecord::Node
        | GdsRecord::Box
        | GdsRecord::EndElement => (),

        // BitArrays
        GdsRecord::Strans(d0, d1) => {
            bytes.write_u8(*d0)?;
            bytes.write_u8(*d1)?;
        }
        // Single I16s
        GdsRecord::Header { version: d }
        | GdsRecord::Layer(d)
        | GdsRecord::DataType(d)
        | GdsRecord::PathType(d) => bytes.write_i16::<BigEndian>(*d)?,

        // Single I32s
        GdsRecord::Width(d) | GdsRecord::BeginExtn(d) | GdsRecord::EndExtn(d) => {
            bytes.write_i32::<BigEndian>(*d)?
        }
        // Single F64s
        GdsRecord::Mag(d) | GdsRecord::Angle(d) => {
            bytes.write_u64::<BigEndian>(GdsFloat64::encode(*d))?
        }
        // "Structs"
        GdsRecord::Units(d0, d1) => {
            bytes.write_u64::<BigEndian>(GdsFloat64::encode(*d0))?;
            bytes.write_u64::<BigEndian>(GdsFloat64::encode(*d1))?;
        }
        GdsRecord::ColRow { cols, rows } => {
            bytes.write_i16::<BigEndian>(*cols)?;
            bytes.write_i16::<BigEndian>(*rows)?;
        }
        // Vectors
        GdsRecord::BgnLib { dates: d } | GdsRecord::BgnStruct { dates: d } => {
            for val in d.iter() {
                bytes.write_i16::<BigEndian>(*val)?;
            }
        }
        GdsRecord::Xy(d) => {
            for val in d.iter() {
                bytes.write_i32::<BigEndian>(*val)?;
            }
        }
        // Strings
        GdsRecord::LibName(s) | GdsRecord::StructName(s) | GdsRecord::StructRefName(s) => {
            bytes.extend_from_slice(s.as_bytes());
            if s.len() % 2 != 0 {
                // Pad odd-length strings with a zero-valued byte
                bytes.write_u8(0x00)?;
            }
        }
        GdsRecord::Unknown { .. } => unreachable!(), // Handled above
    };
    Ok(())
}
