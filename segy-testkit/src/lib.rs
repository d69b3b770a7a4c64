//! Test utilities for segytool
//!
//! Builds synthetic SEG-Y byte images from scratch, without going
//! through `segy-format`, so codec tests compare against independent
//! ground truth. Header fields are poked at hard-coded byte offsets
//! straight from the SEG-Y revision 1 tables.

use std::fs;
use std::io;
use std::path::Path;

const TEXTUAL_LEN: usize = 3200;
const BINARY_LEN: usize = 400;
const TRACE_HEADER_LEN: usize = 240;
const EBCDIC_SPACE: u8 = 0x40;

/// (1-based offset, width) pairs for the binary-header fields the
/// builder knows how to set.
fn binary_offset(name: &str) -> (usize, usize) {
    match name {
        "job_id" => (1, 4),
        "line_number" => (5, 4),
        "reel_number" => (9, 4),
        "traces_per_ensemble" => (13, 2),
        "sample_interval" => (17, 2),
        "samples_per_trace" => (21, 2),
        "format_code" => (25, 2),
        "ensemble_fold" => (27, 2),
        "segy_revision" => (301, 2),
        "extended_textual_headers" => (305, 2),
        other => panic!("binary field '{other}' not known to the testkit"),
    }
}

/// (1-based offset, width) pairs for trace-header fields.
fn trace_offset(name: &str) -> (usize, usize) {
    match name {
        "trace_sequence_line" => (1, 4),
        "trace_sequence_file" => (5, 4),
        "field_record" => (9, 4),
        "ensemble_number" => (21, 4),
        "trace_id_code" => (29, 2),
        "elevation_scalar" => (69, 2),
        "coordinate_scalar" => (71, 2),
        "source_x" => (73, 4),
        "source_y" => (77, 4),
        "group_x" => (81, 4),
        "group_y" => (85, 4),
        "samples" => (115, 2),
        "sample_interval" => (117, 2),
        "cdp_x" => (181, 4),
        "cdp_y" => (185, 4),
        "inline" => (189, 4),
        "crossline" => (193, 4),
        other => panic!("trace field '{other}' not known to the testkit"),
    }
}

fn poke(block: &mut [u8], offset: usize, width: usize, value: i64) {
    let start = offset - 1;
    match width {
        2 => block[start..start + 2].copy_from_slice(&(value as i16).to_be_bytes()),
        4 => block[start..start + 4].copy_from_slice(&(value as i32).to_be_bytes()),
        _ => panic!("unsupported width {width}"),
    }
}

type TraceValueFn = Box<dyn Fn(usize) -> i64>;

/// Builder for a complete synthetic SEG-Y byte image.
///
/// Defaults: IEEE float samples (format code 5), 4000 µs interval,
/// blank EBCDIC textual header, deterministic sample-byte pattern.
pub struct SegyFileBuilder {
    trace_count: usize,
    samples_per_trace: usize,
    format_code: i16,
    sample_interval: i16,
    extended_headers: usize,
    textual: Option<Vec<u8>>,
    binary_overrides: Vec<(String, i64)>,
    trace_fields: Vec<(String, TraceValueFn)>,
}

impl SegyFileBuilder {
    pub fn new(trace_count: usize, samples_per_trace: usize) -> Self {
        Self {
            trace_count,
            samples_per_trace,
            format_code: 5,
            sample_interval: 4000,
            extended_headers: 0,
            textual: None,
            binary_overrides: Vec::new(),
            trace_fields: Vec::new(),
        }
    }

    pub fn format_code(mut self, code: i16) -> Self {
        self.format_code = code;
        self
    }

    pub fn sample_interval(mut self, interval: i16) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn extended_headers(mut self, count: usize) -> Self {
        self.extended_headers = count;
        self
    }

    /// Replace the 3200-byte textual header verbatim.
    pub fn textual(mut self, bytes: Vec<u8>) -> Self {
        assert_eq!(bytes.len(), TEXTUAL_LEN);
        self.textual = Some(bytes);
        self
    }

    /// Override a named binary-header field.
    pub fn binary_field(mut self, name: &str, value: i64) -> Self {
        self.binary_overrides.push((name.to_string(), value));
        self
    }

    /// Set a trace-header field per trace, from the 0-based trace index.
    pub fn trace_field(mut self, name: &str, value: impl Fn(usize) -> i64 + 'static) -> Self {
        self.trace_fields.push((name.to_string(), Box::new(value)));
        self
    }

    /// Bytes per sample implied by the format code.
    pub fn bytes_per_sample(&self) -> usize {
        match self.format_code {
            3 => 2,
            6 => 8,
            8 => 1,
            _ => 4,
        }
    }

    /// Deterministic sample byte at (trace, position), so payload
    /// preservation tests catch any corruption.
    pub fn sample_byte(trace: usize, pos: usize) -> u8 {
        ((trace * 31 + pos * 7 + 13) % 251) as u8
    }

    pub fn build(&self) -> Vec<u8> {
        let payload_len = self.samples_per_trace * self.bytes_per_sample();
        let total = TEXTUAL_LEN
            + BINARY_LEN
            + self.extended_headers * TEXTUAL_LEN
            + self.trace_count * (TRACE_HEADER_LEN + payload_len);
        let mut out = Vec::with_capacity(total);

        match &self.textual {
            Some(bytes) => out.extend_from_slice(bytes),
            None => out.extend(std::iter::repeat(EBCDIC_SPACE).take(TEXTUAL_LEN)),
        }

        let mut binary = [0u8; BINARY_LEN];
        {
            let (o, w) = binary_offset("sample_interval");
            poke(&mut binary, o, w, self.sample_interval as i64);
            let (o, w) = binary_offset("samples_per_trace");
            poke(&mut binary, o, w, self.samples_per_trace as i64);
            let (o, w) = binary_offset("format_code");
            poke(&mut binary, o, w, self.format_code as i64);
            let (o, w) = binary_offset("extended_textual_headers");
            poke(&mut binary, o, w, self.extended_headers as i64);
        }
        for (name, value) in &self.binary_overrides {
            let (o, w) = binary_offset(name);
            poke(&mut binary, o, w, *value);
        }
        out.extend_from_slice(&binary);

        for _ in 0..self.extended_headers {
            out.extend(std::iter::repeat(EBCDIC_SPACE).take(TEXTUAL_LEN));
        }

        for i in 0..self.trace_count {
            let mut header = [0u8; TRACE_HEADER_LEN];
            let (o, w) = trace_offset("samples");
            poke(&mut header, o, w, self.samples_per_trace as i64);
            let (o, w) = trace_offset("sample_interval");
            poke(&mut header, o, w, self.sample_interval as i64);
            for (name, value) in &self.trace_fields {
                let (o, w) = trace_offset(name);
                poke(&mut header, o, w, value(i));
            }
            out.extend_from_slice(&header);
            out.extend((0..payload_len).map(|pos| Self::sample_byte(i, pos)));
        }

        debug_assert_eq!(out.len(), total);
        out
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.build())
    }
}
