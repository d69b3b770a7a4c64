//! Streaming SEG-Y writer
//!
//! Mirrors the reader: regions are written in file order with exact
//! size enforcement, and trace payloads are copied verbatim. A discard
//! writer backs dry runs; it counts writes without persisting them.

use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::header::{TraceHeader, BINARY_HEADER_LEN, TRACE_HEADER_LEN};
use crate::{EXTENDED_HEADER_LEN, TEXTUAL_HEADER_LEN};

/// Streaming writer for one SEG-Y output.
pub struct SegyWriter<W: Write> {
    inner: W,
    payload_len: usize,
    traces_written: u64,
    bytes_written: u64,
}

impl SegyWriter<io::Sink> {
    /// Writer that counts writes without persisting anything.
    pub fn discard(payload_len: usize) -> Self {
        Self::new(io::sink(), payload_len)
    }
}

impl<W: Write> SegyWriter<W> {
    /// Wrap a byte sink. `payload_len` is the sample-byte count every
    /// trace must carry, derived from the binary header.
    pub fn new(inner: W, payload_len: usize) -> Self {
        Self { inner, payload_len, traces_written: 0, bytes_written: 0 }
    }

    /// Write the 3200-byte textual header.
    pub fn write_textual(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_region("textual header", TEXTUAL_HEADER_LEN, bytes)
    }

    /// Write the 400-byte binary header.
    pub fn write_binary_header(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_region("binary header", BINARY_HEADER_LEN, bytes)
    }

    /// Write the extended textual headers verbatim (multiple of 3200,
    /// possibly empty).
    pub fn write_extended(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.len() % EXTENDED_HEADER_LEN != 0 {
            return Err(Error::RegionSize {
                region: "extended textual header",
                expected: EXTENDED_HEADER_LEN,
                actual: bytes.len(),
            });
        }
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Write one trace: 240-byte header plus its untouched samples.
    pub fn write_trace(&mut self, header: &TraceHeader, samples: &[u8]) -> Result<()> {
        if samples.len() != self.payload_len {
            return Err(Error::PayloadSize {
                expected: self.payload_len,
                actual: samples.len(),
            });
        }
        self.inner.write_all(header.as_bytes())?;
        self.inner.write_all(samples)?;
        self.traces_written += 1;
        self.bytes_written += (TRACE_HEADER_LEN + samples.len()) as u64;
        Ok(())
    }

    /// Traces written so far.
    pub fn traces_written(&self) -> u64 {
        self.traces_written
    }

    /// Total bytes accepted so far (counted even in discard mode).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and hand back the underlying sink.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_region(&mut self, region: &'static str, expected: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() != expected {
            return Err(Error::RegionSize { region, expected, actual: bytes.len() });
        }
        self.inner.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }
}
