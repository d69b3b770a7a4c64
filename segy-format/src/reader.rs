//! Streaming SEG-Y reader
//!
//! Opens a file, decodes the two fixed headers plus any extended
//! textual headers, and exposes the trace records as a lazy,
//! non-restartable iterator. The trace layout (record length, trace
//! count) is derived once at open time and the remaining file size is
//! checked against it, so mid-stream truncation is the only read
//! failure the iterator itself can produce.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::header::{BinaryHeader, TraceHeader, BINARY_HEADER_LEN, TRACE_HEADER_LEN};
use crate::{bytes_per_sample, EXTENDED_HEADER_LEN, TEXTUAL_HEADER_LEN};

/// Metadata derived from the file headers at open time.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub path: PathBuf,
    pub file_size: u64,
    pub format_code: i16,
    pub bytes_per_sample: usize,
    pub sample_interval: i64,
    pub samples_per_trace: usize,
    pub extended_headers: usize,
    pub trace_count: u64,
}

impl FileSummary {
    /// Sample payload bytes per trace.
    pub fn payload_len(&self) -> usize {
        self.samples_per_trace * self.bytes_per_sample
    }

    /// Full trace record length: 240-byte header plus payload.
    pub fn record_len(&self) -> usize {
        TRACE_HEADER_LEN + self.payload_len()
    }
}

/// One trace record: decoded header plus opaque sample bytes.
#[derive(Debug, Clone)]
pub struct Trace {
    /// 0-based position within the file.
    pub index: u64,
    pub header: TraceHeader,
    pub samples: Vec<u8>,
}

/// Streaming reader over one SEG-Y file.
#[derive(Debug)]
pub struct SegyReader<R> {
    inner: R,
    textual: Vec<u8>,
    binary: BinaryHeader,
    extended: Vec<u8>,
    summary: FileSummary,
}

impl SegyReader<BufReader<File>> {
    /// Open a SEG-Y file and read its header regions.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = Self::from_reader(BufReader::new(file), file_size)?;
        reader.summary.path = path.to_path_buf();
        Ok(reader)
    }
}

impl<R: Read> SegyReader<R> {
    /// Build a reader over any byte source of known total length.
    pub fn from_reader(mut inner: R, file_size: u64) -> Result<Self> {
        let textual = read_region(&mut inner, TEXTUAL_HEADER_LEN, "textual header")?;

        let mut binary_bytes = [0u8; BINARY_HEADER_LEN];
        read_exact_region(&mut inner, &mut binary_bytes, "binary header")?;
        let binary = BinaryHeader::from_bytes(binary_bytes);

        let format_code = binary.get_named("format_code")? as i16;
        let bps = bytes_per_sample(format_code).ok_or(Error::UnknownFormatCode(format_code))?;
        let samples_per_trace = binary.get_named("samples_per_trace")?.max(0) as usize;
        let sample_interval = binary.get_named("sample_interval")?;

        let extended_headers = binary.extended_header_count();
        let extended = read_region(
            &mut inner,
            extended_headers * EXTENDED_HEADER_LEN,
            "extended textual header",
        )?;

        let header_bytes =
            (TEXTUAL_HEADER_LEN + BINARY_HEADER_LEN + extended.len()) as u64;
        if file_size < header_bytes {
            return Err(Error::TruncatedFile {
                region: "file headers",
                expected: header_bytes as usize,
                actual: file_size as usize,
            });
        }

        let trace_bytes = file_size - header_bytes;
        let record_len = (TRACE_HEADER_LEN + samples_per_trace * bps) as u64;
        let remainder = trace_bytes % record_len;
        if remainder != 0 {
            return Err(Error::InconsistentSampleCount {
                trace_bytes,
                record_len,
                remainder,
            });
        }

        let summary = FileSummary {
            path: PathBuf::new(),
            file_size,
            format_code,
            bytes_per_sample: bps,
            sample_interval,
            samples_per_trace,
            extended_headers,
            trace_count: trace_bytes / record_len,
        };
        debug!(
            traces = summary.trace_count,
            samples = samples_per_trace,
            format = format_code,
            "opened SEG-Y stream"
        );

        Ok(Self { inner, textual, binary, extended, summary })
    }

    /// Raw 3200-byte textual header.
    pub fn textual(&self) -> &[u8] {
        &self.textual
    }

    /// Decoded 400-byte binary header.
    pub fn binary_header(&self) -> &BinaryHeader {
        &self.binary
    }

    /// Raw extended textual headers (may be empty).
    pub fn extended(&self) -> &[u8] {
        &self.extended
    }

    pub fn summary(&self) -> &FileSummary {
        &self.summary
    }

    /// Lazy iterator over the trace records.
    ///
    /// Finite and non-restartable: it walks the underlying stream
    /// sequentially and yields exactly `summary().trace_count` traces
    /// unless the file was truncated underneath us.
    pub fn traces(&mut self) -> Traces<'_, R> {
        Traces { reader: self, next_index: 0 }
    }
}

/// Iterator state for [`SegyReader::traces`].
pub struct Traces<'a, R> {
    reader: &'a mut SegyReader<R>,
    next_index: u64,
}

impl<R: Read> Iterator for Traces<'_, R> {
    type Item = Result<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.reader.summary.trace_count {
            return None;
        }
        let index = self.next_index;
        self.next_index = self.reader.summary.trace_count; // poison on error

        let mut header_bytes = [0u8; TRACE_HEADER_LEN];
        if let Err(e) = read_exact_region(&mut self.reader.inner, &mut header_bytes, "trace header")
        {
            return Some(Err(e));
        }

        let payload_len = self.reader.summary.payload_len();
        let mut samples = vec![0u8; payload_len];
        if let Err(e) = read_exact_region(&mut self.reader.inner, &mut samples, "trace samples") {
            return Some(Err(e));
        }

        self.next_index = index + 1;
        Some(Ok(Trace { index, header: TraceHeader::from_bytes(header_bytes), samples }))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.reader.summary.trace_count - self.next_index) as usize;
        (left, Some(left))
    }
}

fn read_region<R: Read>(inner: &mut R, len: usize, region: &'static str) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    read_exact_region(inner, &mut buf, region)?;
    Ok(buf)
}

fn read_exact_region<R: Read>(inner: &mut R, buf: &mut [u8], region: &'static str) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match inner.read(&mut buf[filled..]) {
            Ok(0) => {
                return Err(Error::TruncatedFile {
                    region,
                    expected: buf.len(),
                    actual: filled,
                })
            }
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    Ok(())
}
