//! Typed views over the fixed-size header blocks
//!
//! Both header types wrap their raw byte block and expose big-endian
//! get/set keyed by [`FieldDef`] or by an explicit `(offset, width,
//! signed)` span. Sets are range-checked against the span width before
//! any byte is touched.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{Error, Result};
use crate::fields::{binary_field, trace_field, FieldDef};

/// Size of the binary file header in bytes.
pub const BINARY_HEADER_LEN: usize = 400;

/// Size of one trace header in bytes.
pub const TRACE_HEADER_LEN: usize = 240;

/// Inclusive value range for a span of `width` bytes.
pub fn span_range(width: u8, signed: bool) -> (i64, i64) {
    let bits = width as u32 * 8;
    if signed {
        (-(1i64 << (bits - 1)), (1i64 << (bits - 1)) - 1)
    } else {
        (0, (1i64 << bits) - 1)
    }
}

fn check_span(offset: u16, width: u8, block_len: usize) -> Result<usize> {
    if !matches!(width, 1 | 2 | 4) {
        return Err(Error::UnsupportedWidth(width));
    }
    let start = offset as usize;
    if start == 0 || start + width as usize - 1 > block_len {
        return Err(Error::SpanOutOfBounds { offset, width, block_len });
    }
    Ok(start - 1)
}

fn read_span(bytes: &[u8], offset: u16, width: u8, signed: bool) -> Result<i64> {
    let start = check_span(offset, width, bytes.len())?;
    let raw = &bytes[start..start + width as usize];
    Ok(match (width, signed) {
        (1, true) => raw[0] as i8 as i64,
        (1, false) => raw[0] as i64,
        (2, true) => BigEndian::read_i16(raw) as i64,
        (2, false) => BigEndian::read_u16(raw) as i64,
        (4, true) => BigEndian::read_i32(raw) as i64,
        (4, false) => BigEndian::read_u32(raw) as i64,
        _ => unreachable!("width checked by check_span"),
    })
}

fn write_span(
    bytes: &mut [u8],
    field: &str,
    offset: u16,
    width: u8,
    signed: bool,
    value: i64,
) -> Result<()> {
    let block_len = bytes.len();
    let start = check_span(offset, width, block_len)?;
    let (min, max) = span_range(width, signed);
    if value < min || value > max {
        return Err(Error::OutOfRange { field: field.to_string(), value, min, max });
    }
    match width {
        1 => bytes[start] = value as u8,
        2 => BigEndian::write_u16(&mut bytes[start..start + 2], value as u16),
        4 => BigEndian::write_u32(&mut bytes[start..start + 4], value as u32),
        _ => unreachable!("width checked by check_span"),
    }
    Ok(())
}

macro_rules! header_block {
    ($(#[$doc:meta])* $name:ident, $len:expr, $lookup:path) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            bytes: [u8; $len],
        }

        impl $name {
            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self { bytes }
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.bytes
            }

            pub fn into_bytes(self) -> [u8; $len] {
                self.bytes
            }

            /// Read a field from the table.
            pub fn get(&self, def: &FieldDef) -> i64 {
                // Table offsets are validated by construction; a read
                // through a FieldDef cannot fail.
                read_span(&self.bytes, def.offset, def.width, def.signed)
                    .unwrap_or_default()
            }

            /// Read a named field.
            pub fn get_named(&self, name: &str) -> Result<i64> {
                let def = $lookup(name).ok_or_else(|| Error::UnknownField(name.to_string()))?;
                Ok(self.get(def))
            }

            /// Read an arbitrary byte span.
            pub fn get_at(&self, offset: u16, width: u8, signed: bool) -> Result<i64> {
                read_span(&self.bytes, offset, width, signed)
            }

            /// Write a field from the table, range-checked against its width.
            pub fn set(&mut self, def: &FieldDef, value: i64) -> Result<()> {
                write_span(&mut self.bytes, def.name, def.offset, def.width, def.signed, value)
            }

            /// Write a named field.
            pub fn set_named(&mut self, name: &str, value: i64) -> Result<()> {
                let def = $lookup(name).ok_or_else(|| Error::UnknownField(name.to_string()))?;
                self.set(def, value)
            }

            /// Write an arbitrary byte span, range-checked.
            pub fn set_at(&mut self, offset: u16, width: u8, signed: bool, value: i64) -> Result<()> {
                let field = format!("offset_{offset}");
                write_span(&mut self.bytes, &field, offset, width, signed, value)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self { bytes: [0; $len] }
            }
        }
    };
}

header_block!(
    /// Typed view over the 400-byte binary file header.
    BinaryHeader,
    BINARY_HEADER_LEN,
    binary_field
);

header_block!(
    /// Typed view over a 240-byte trace header.
    TraceHeader,
    TRACE_HEADER_LEN,
    trace_field
);

impl BinaryHeader {
    /// Number of extended textual headers announced by the file.
    ///
    /// Negative or absurd counts are clamped to zero; a value of -1
    /// ("unknown count" per revision 1) is treated as zero because the
    /// codec cannot stream an unbounded header region.
    pub fn extended_header_count(&self) -> usize {
        self.get_named("extended_textual_headers")
            .map(|v| v.max(0) as usize)
            .unwrap_or(0)
    }
}
