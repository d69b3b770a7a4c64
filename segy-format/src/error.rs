//! Error types for SEG-Y codec operations

use thiserror::Error;

/// Result type for SEG-Y codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing SEG-Y structures
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File ends before a complete region could be read
    #[error("Truncated file: needed {expected} bytes for {region}, got {actual}")]
    TruncatedFile {
        region: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Trace region size is not a multiple of the per-trace record size
    #[error(
        "Inconsistent sample count: {trace_bytes} trace bytes is not a \
         multiple of the {record_len}-byte record ({remainder} left over)"
    )]
    InconsistentSampleCount {
        trace_bytes: u64,
        record_len: u64,
        remainder: u64,
    },

    /// Format code outside the recognized set
    #[error("Unknown format code: {0}")]
    UnknownFormatCode(i16),

    /// Field name not present in the header tables
    #[error("Unknown field: '{0}'")]
    UnknownField(String),

    /// Value does not fit the destination field width
    #[error("Value {value} out of range for field '{field}' ({min}..={max})")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Custom byte span falls outside the header block
    #[error("Byte span {offset}+{width} outside the {block_len}-byte header")]
    SpanOutOfBounds {
        offset: u16,
        width: u8,
        block_len: usize,
    },

    /// Unsupported field width for a custom byte-offset edit
    #[error("Unsupported field width: {0} (expected 1, 2 or 4)")]
    UnsupportedWidth(u8),

    /// A fixed-size region was written with the wrong number of bytes
    #[error("{region} must be exactly {expected} bytes, got {actual}")]
    RegionSize {
        region: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Sample buffer length disagrees with the trace layout
    #[error("Sample payload must be {expected} bytes, got {actual}")]
    PayloadSize { expected: usize, actual: usize },
}
