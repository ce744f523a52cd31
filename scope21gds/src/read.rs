//!
//! # Scope21 GDSII Record Reading & Scanning
//!
//! Decodes a caller-supplied byte buffer into an ordered, lazy sequence of [GdsRecord]s.
//! The buffer is supplied whole by the loader (file upload, fetch, etc.);
//! this layer has no file-system or network responsibility,
//! and its only side effect is cursor advancement.
//!

// Std-Lib Imports
use std::io::Cursor;

// Crates.io
use byteorder::{BigEndian, ReadBytesExt};
use log::debug;
use num_traits::FromPrimitive;

// Local Imports
use crate::data::*;
use crate::{GdsError, GdsResult};

/// # GdsReader
///
/// Helper for decoding GDS records from an in-memory byte buffer.
/// Reads one record per call to [GdsReader::read_record],
/// returning `Ok(None)` upon reaching the end of the buffer.
pub struct GdsReader<'a> {
    /// Byte buffer being read
    file: Cursor<&'a [u8]>,
}
impl<'a> GdsReader<'a> {
    /// Create a [GdsReader] over byte-buffer `bytes`
    pub fn new(bytes: &'a [u8]) -> GdsReader<'a> {
        debug!("scanning {} byte gds stream", bytes.len());
        GdsReader {
            file: Cursor::new(bytes),
        }
    }
    /// Number of bytes remaining past our cursor
    fn remaining(&self) -> usize {
        let len = self.file.get_ref().len() as u64;
        (len - self.file.position().min(len)) as usize
    }
    /// Read the next record-header from our buffer.
    /// Returns `Ok(None)` if the cursor sits exactly at the end of the stream.
    fn read_record_header(&mut self) -> GdsResult<Option<GdsRecordHeader>> {
        let avail = self.remaining();
        if avail == 0 {
            return Ok(None);
        }
        if avail < 4 {
            // Not enough bytes for the four header bytes: record boundaries are undecodable.
            return Err(GdsError::Truncated {
                needed: 4,
                available: avail,
            });
        }
        // Read the 16-bit record-size. (In bytes, including the four header bytes.)
        let len = match self.file.read_u16::<BigEndian>() {
            Err(e) => return Err(GdsError::Boxed(Box::new(e))),
            Ok(num) if num < 4 => return Err(GdsError::RecordLen(num as usize)), // Invalid (too short) length
            Ok(num) if num % 2 != 0 => return Err(GdsError::RecordLen(num as usize)), // Invalid (odd) length
            Ok(num) => num, // The normal case
        };
        let len = len - 4; // Strip out the four header-bytes
        let rtype = self.file.read_u8()?;
        let dtype = self.file.read_u8()?;
        Ok(Some(GdsRecordHeader { rtype, dtype, len }))
    }
    /// Read the next binary-encoded [GdsRecord].
    /// Returns `Ok(None)` at a clean end-of-buffer,
    /// and [GdsError::Truncated] if a record's declared length
    /// exceeds the bytes remaining.
    pub fn read_record(&mut self) -> GdsResult<Option<GdsRecord>> {
        let header = match self.read_record_header()? {
            Some(h) => h,
            None => return Ok(None),
        };
        // Check the declared payload fits in what remains of the buffer
        let len = header.len as usize;
        if len > self.remaining() {
            return Err(GdsError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(Some(self.read_record_content(&header)?))
    }
    fn read_record_content(&mut self, header: &GdsRecordHeader) -> GdsResult<GdsRecord> {
        // Pull the full payload; all further decoding operates on these bytes
        let data = self.read_bytes(header.len)?;

        // Decode the record-type tag. Unrecognized and deprecated tags pass through generically.
        let rtype = match GdsRecordType::from_u8(header.rtype) {
            Some(t) if t.valid() => t,
            _ => return Ok(unknown(header, data)),
        };
        let dtype = match GdsDataType::from_u8(header.dtype) {
            Some(t) => t,
            None => return Ok(unknown(header, data)),
        };

        // Based on the header data, decode to a [GdsRecord]
        use GdsDataType::{BitArray, NoData, Str, F64, I16, I32};
        let len = header.len;
        let record: GdsRecord = match (rtype, dtype, len) {
            // Library-Level Records
            (GdsRecordType::Header, I16, 2) => GdsRecord::Header {
                version: read_i16(&data)[0],
            },
            (GdsRecordType::BgnLib, I16, 24) => GdsRecord::BgnLib {
                dates: read_i16(&data),
            },
            (GdsRecordType::LibName, Str, _) => GdsRecord::LibName(read_str(data)?),
            (GdsRecordType::Units, F64, 16) => {
                let v = read_f64(&data);
                GdsRecord::Units(v[0], v[1])
            }
            (GdsRecordType::EndLib, NoData, 0) => GdsRecord::EndLib,

            // Structure (Cell) Level Records
            (GdsRecordType::BgnStruct, I16, 24) => GdsRecord::BgnStruct {
                dates: read_i16(&data),
            },
            (GdsRecordType::StructName, Str, _) => GdsRecord::StructName(read_str(data)?),
            (GdsRecordType::StructRefName, Str, _) => GdsRecord::StructRefName(read_str(data)?),
            (GdsRecordType::EndStruct, NoData, 0) => GdsRecord::EndStruct,

            // Element-Level Records
            (GdsRecordType::Boundary, NoData, 0) => GdsRecord::Boundary,
            (GdsRecordType::Path, NoData, 0) => GdsRecord::Path,
            (GdsRecordType::StructRef, NoData, 0) => GdsRecord::StructRef,
            (GdsRecordType::ArrayRef, NoData, 0) => GdsRecord::ArrayRef,
            (GdsRecordType::Text, NoData, 0) => GdsRecord::Text,
            (GdsRecordType::Node, NoData, 0) => GdsRecord::Node,
            (GdsRecordType::Box, NoData, 0) => GdsRecord::Box,
            (GdsRecordType::Layer, I16, 2) => GdsRecord::Layer(read_i16(&data)[0]),
            (GdsRecordType::DataType, I16, 2) => GdsRecord::DataType(read_i16(&data)[0]),
            (GdsRecordType::Width, I32, 4) => GdsRecord::Width(read_i32(&data)[0]),
            (GdsRecordType::Xy, I32, _) => GdsRecord::Xy(read_i32(&data)),
            (GdsRecordType::EndElement, NoData, 0) => GdsRecord::EndElement,

            // Instance & Path Attribute Records
            (GdsRecordType::ColRow, I16, 4) => {
                let d = read_i16(&data);
                GdsRecord::ColRow {
                    cols: d[0],
                    rows: d[1],
                }
            }
            (GdsRecordType::Strans, BitArray, 2) => GdsRecord::Strans(data[0], data[1]),
            (GdsRecordType::Mag, F64, 8) => GdsRecord::Mag(read_f64(&data)[0]),
            (GdsRecordType::Angle, F64, 8) => GdsRecord::Angle(read_f64(&data)[0]),
            (GdsRecordType::PathType, I16, 2) => GdsRecord::PathType(read_i16(&data)[0]),
            (GdsRecordType::BeginExtn, I32, 4) => GdsRecord::BeginExtn(read_i32(&data)[0]),
            (GdsRecordType::EndExtn, I32, 4) => GdsRecord::EndExtn(read_i32(&data)[0]),

            // Everything else - property records, text attributes, masks, and the like -
            // passes through generically. So do in-spec tags carrying out-of-spec
            // data-types or lengths; the record boundary remains sound either way.
            _ => unknown(header, data),
        };
        Ok(record)
    }
    /// Read `len` bytes
    fn read_bytes(&mut self, len: u16) -> GdsResult<Vec<u8>> {
        let mut data = vec![0u8; len as usize];
        std::io::Read::read_exact(&mut self.file, &mut data)?;
        Ok(data)
    }
}

/// Create the generic form of a record from its header and raw payload
fn unknown(header: &GdsRecordHeader, data: Vec<u8>) -> GdsRecord {
    GdsRecord::Unknown {
        rtype: header.rtype,
        dtype: header.dtype,
        data,
    }
}
/// Decode pairs of payload-bytes into i16s
fn read_i16(data: &[u8]) -> Vec<i16> {
    data.chunks_exact(2)
        .map(|c| i16::from_be_bytes([c[0], c[1]]))
        .collect()
}
/// Decode four-byte chunks of payload into i32s
fn read_i32(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(4)
        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
/// Decode eight-byte chunks of payload into f64s, via GDSII's float format
fn read_f64(data: &[u8]) -> Vec<f64> {
    data.chunks_exact(8)
        .map(|c| {
            let bytes = [c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]];
            GdsFloat64::decode(u64::from_be_bytes(bytes))
        })
        .collect()
}
/// Decode payload-bytes into an ASCII string, stripping the optional trailing NUL
fn read_str(mut data: Vec<u8>) -> GdsResult<String> {
    if data.last() == Some(&0x00) {
        data.pop();
    }
    let s: String = std::str::from_utf8(&data)?.into();
    Ok(s)
}

/// # GdsRecordIter
///
/// A peekable, single-use iterator of [GdsRecord]s decoded from a byte buffer.
/// Iteration ends after the `ENDLIB` record, or at the end of the buffer,
/// whichever comes first.
pub struct GdsRecordIter<'a> {
    /// Underlying reader
    rdr: GdsReader<'a>,
    /// Next record, stored for peeking
    nxt: Option<GdsRecord>,
    /// Number of records read
    numread: usize,
}
impl<'a> GdsRecordIter<'a> {
    /// Create a [GdsRecordIter] over `bytes`, decoding its first record
    pub fn open(bytes: &'a [u8]) -> GdsResult<GdsRecordIter<'a>> {
        let mut rdr = GdsReader::new(bytes);
        let nxt = rdr.read_record()?;
        Ok(GdsRecordIter {
            rdr,
            nxt,
            numread: 0,
        })
    }
    /// Advance our iterator and return the next record
    pub fn next(&mut self) -> GdsResult<Option<GdsRecord>> {
        if self.nxt.is_none() {
            return Ok(None);
        }
        // Decode a new record and swap it with our `nxt`.
        // Nothing follows `ENDLIB`; do not read past it.
        let mut rv = if self.nxt == Some(GdsRecord::EndLib) {
            None
        } else {
            self.rdr.read_record()?
        };
        std::mem::swap(&mut rv, &mut self.nxt);
        self.numread += 1;
        Ok(rv)
    }
    /// Peek at our next record, without advancing
    pub fn peek(&self) -> &Option<GdsRecord> {
        &self.nxt
    }
    /// Number of records read so far
    pub fn num_read(&self) -> usize {
        self.numread
    }
}
