//!
//! # Scope21 GDSII Stream Decoder
//!
//! GDSII is the IC (and photonic) industry's de facto standard for storing and sharing layout data.
//! `scope21gds` is the stream-format layer of the Scope21 viewer:
//! it decodes GDSII's record-oriented binary format, on GDSII's terms,
//! into an ordered sequence of typed [GdsRecord]s.
//!
//! Data comes in as a plain byte buffer — the loader which produces that buffer
//! (file read, upload, fetch) is a collaborator outside this crate —
//! and comes out one record at a time through the lazy, single-use [GdsRecordIter].
//! Assembling records into cells, polygons, and a renderable document
//! is the job of the companion `scope21doc` crate.
//!
//! Decoding is deliberately lenient: record types this viewer never acts upon,
//! deprecated types, and out-of-spec payload combinations all pass through as
//! [GdsRecord::Unknown] rather than failing the parse.
//! Only corruption which makes record boundaries undecodable —
//! a bad length field, or a declared length running past the end of the buffer —
//! is fatal, via [GdsError::RecordLen] and [GdsError::Truncated].
//!
//! ## Usage
//!
//! ```
//! use scope21gds::GdsRecordIter;
//!
//! let bytes: &[u8] = &[];
//! let mut it = GdsRecordIter::open(bytes)?;
//! while let Some(record) = it.next()? {
//!     // feed `record` to a consumer
//! }
//! # Ok::<(), scope21gds::GdsError>(())
//! ```
//!

// Std-Lib Imports
use std::fmt;

// Modules & Re-Exports
pub mod data;
pub mod read;
pub use data::*;
pub use read::{GdsReader, GdsRecordIter};

#[cfg(any(test, feature = "selftest"))]
pub mod write;
#[cfg(test)]
mod tests;

/// Crate-Wide Result Type
pub type GdsResult<T> = Result<T, GdsError>;

///
/// # Gds Error Enumeration
///
/// All variants are tied in some sense to decoding the byte stream.
/// Every variant is fatal to the stream which produced it:
/// the conditions below make further record boundaries undecodable.
/// Recoverable conditions are modeled as warnings in `scope21doc`, not here.
///
#[derive(Debug)]
pub enum GdsError {
    /// Invalid record length: below the four header bytes, or odd
    RecordLen(usize),
    /// Declared record length exceeds the bytes remaining in the stream
    Truncated { needed: usize, available: usize },
    /// Other decoding errors
    Decode(String),
    /// Boxed external errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
}
impl fmt::Display for GdsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GdsError::RecordLen(len) => write!(f, "invalid record length {}", len),
            GdsError::Truncated { needed, available } => write!(
                f,
                "truncated gds stream: record declares {} payload bytes, {} remain",
                needed, available
            ),
            GdsError::Decode(msg) => write!(f, "gds decode error: {}", msg),
            GdsError::Boxed(err) => err.fmt(f),
        }
    }
}
impl std::error::Error for GdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<std::io::Error> for GdsError {
    fn from(e: std::io::Error) -> Self {
        GdsError::Boxed(Box::new(e))
    }
}
impl From<std::str::Utf8Error> for GdsError {
    fn from(e: std::str::Utf8Error) -> Self {
        GdsError::Decode(format!("{:?}", e))
    }
}
impl From<String> for GdsError {
    fn from(e: String) -> Self {
        GdsError::Decode(e)
    }
}
