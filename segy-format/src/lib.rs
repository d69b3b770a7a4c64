//! # segy-format
//!
//! A byte-exact codec for the SEG-Y seismic container format: the
//! 3200-byte EBCDIC textual header, the 400-byte big-endian binary
//! header, optional extended textual headers, and a sequence of trace
//! records (240-byte header + opaque sample payload).
//!
//! The reader streams traces one at a time and never materializes the
//! whole file; the writer mirrors that discipline and enforces the
//! exact region sizes on every write. Sample payloads are treated as
//! opaque byte spans and copied verbatim.
//!
//! ## Quick Start
//!
//! ```no_run
//! use segy_format::SegyReader;
//!
//! let mut reader = SegyReader::open("line_042.segy")?;
//! println!("{} traces", reader.summary().trace_count);
//! for trace in reader.traces() {
//!     let trace = trace?;
//!     println!("trace {} has {} sample bytes", trace.index, trace.samples.len());
//! }
//! # Ok::<(), segy_format::Error>(())
//! ```

pub mod ebcdic;
pub mod error;
pub mod fields;
pub mod header;
pub mod reader;
pub mod writer;

pub use error::{Error, Result};
pub use fields::{
    binary_field, binary_field_at, trace_field, trace_field_at, FieldDef, BINARY_FIELDS,
    TRACE_FIELDS,
};
pub use header::{BinaryHeader, TraceHeader, BINARY_HEADER_LEN, TRACE_HEADER_LEN};
pub use reader::{FileSummary, SegyReader, Trace};
pub use writer::SegyWriter;

/// Size of the textual (EBCDIC) header region in bytes.
pub const TEXTUAL_HEADER_LEN: usize = 3200;

/// Size of one extended textual header record in bytes.
pub const EXTENDED_HEADER_LEN: usize = 3200;

/// Bytes per sample for a recognized binary-header format code.
///
/// Returns `None` for format codes outside the recognized set.
pub fn bytes_per_sample(format_code: i16) -> Option<usize> {
    match format_code {
        1 => Some(4), // IBM float
        2 => Some(4), // 4-byte integer
        3 => Some(2), // 2-byte integer
        4 => Some(4), // fixed point with gain
        5 => Some(4), // IEEE float
        6 => Some(8), // IEEE double
        8 => Some(1), // 1-byte integer
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_format_codes() {
        assert_eq!(bytes_per_sample(1), Some(4));
        assert_eq!(bytes_per_sample(3), Some(2));
        assert_eq!(bytes_per_sample(6), Some(8));
        assert_eq!(bytes_per_sample(8), Some(1));
        assert_eq!(bytes_per_sample(0), None);
        assert_eq!(bytes_per_sample(7), None);
        assert_eq!(bytes_per_sample(9), None);
    }
}
