//! Integrity validation for SEG-Y files
//!
//! Three independently opt-in checks: structural consistency from the
//! file headers, per-trace coordinate bounds after applying the
//! coordinate scalar, and median/MAD outlier detection across all
//! traces. Findings stream to the report sink; the caller gets the
//! error/warning tally.

use std::io::Read;

use tracing::debug;

use segy_format::{trace_field, FieldDef, SegyReader};

use crate::error::{Error, Result};
use crate::event::{Finding, ReportSink, Severity};
use crate::plan::{CoordinateBounds, Validations};

/// The coordinate fields inspected by the range and outlier checks,
/// paired with the bound axis each one uses.
const COORDINATES: &[(&str, Axis)] = &[
    ("source_x", Axis::X),
    ("source_y", Axis::Y),
    ("group_x", Axis::X),
    ("group_y", Axis::Y),
    ("cdp_x", Axis::X),
    ("cdp_y", Axis::Y),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn bounds(self, b: &CoordinateBounds) -> (f64, f64) {
        match self {
            Axis::X => (b.x_min, b.x_max),
            Axis::Y => (b.y_min, b.y_max),
        }
    }
}

/// Error/warning tally of one validation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOutcome {
    pub errors: usize,
    pub warnings: usize,
}

impl ValidationOutcome {
    fn emit(&mut self, file: &std::path::Path, sink: &mut dyn ReportSink, finding: Finding) {
        match finding.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        sink.finding(file, &finding);
    }
}

/// Translate a reader-open failure into a structure finding, for
/// callers that validate files which may not even parse.
pub fn open_failure_finding(error: &segy_format::Error) -> Finding {
    let kind = match error {
        segy_format::Error::TruncatedFile { .. } => "truncated_file",
        segy_format::Error::InconsistentSampleCount { .. } => "inconsistent_sample_count",
        segy_format::Error::UnknownFormatCode(_) => "unknown_format_code",
        _ => "open_failed",
    };
    Finding::file(Severity::Error, kind, error.to_string(), String::new())
}

/// Run the configured checks over one open reader.
///
/// Consumes the trace stream; the caller reopens the file if it needs
/// a second pass.
pub fn run<R: Read>(
    reader: &mut SegyReader<R>,
    opts: &Validations,
    sink: &mut dyn ReportSink,
) -> Result<ValidationOutcome> {
    let mut outcome = ValidationOutcome::default();
    let file = reader.summary().path.clone();

    if opts.check_file_structure {
        structure_checks(reader, sink, &file, &mut outcome);
    }

    let bounds = if opts.check_coordinate_range {
        Some(opts.coordinate_bounds.ok_or_else(|| Error::Plan {
            path: "validations.coordinate_bounds".to_string(),
            reason: "required when check_coordinate_range is enabled".to_string(),
        })?)
    } else {
        None
    };

    if bounds.is_none() && !opts.check_coordinate_outliers {
        return Ok(outcome);
    }

    // Single pass over the traces: range findings stream out, scaled
    // coordinates accumulate for the outlier statistics.
    let scalar_def = coord_def("coordinate_scalar");
    let coord_defs: Vec<(&'static FieldDef, Axis)> = COORDINATES
        .iter()
        .map(|(name, axis)| (coord_def(name), *axis))
        .collect();

    let collect = opts.check_coordinate_outliers;
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); COORDINATES.len()];
    let mut zero_scalar_warned = false;
    let mut scalar_seen: Option<(i64, i64)> = None;

    for trace in reader.traces() {
        let trace = trace?;
        let scalar = trace.header.get(scalar_def);
        scalar_seen = Some(match scalar_seen {
            None => (scalar, scalar),
            Some((lo, hi)) => (lo.min(scalar), hi.max(scalar)),
        });
        if scalar == 0 && !zero_scalar_warned {
            zero_scalar_warned = true;
            outcome.emit(
                &file,
                sink,
                Finding::trace(
                    trace.index,
                    Severity::Warning,
                    "zero_coordinate_scalar",
                    "coordinate_scalar is 0, treated as 1".to_string(),
                    String::new(),
                ),
            );
        }
        let factor = scalar_factor(scalar);

        for (slot, (def, axis)) in coord_defs.iter().enumerate() {
            let scaled = trace.header.get(def) as f64 * factor;
            if collect {
                columns[slot].push(scaled);
            }
            if let Some(b) = &bounds {
                let (min, max) = axis.bounds(b);
                if scaled < min || scaled > max {
                    outcome.emit(
                        &file,
                        sink,
                        Finding::trace(
                            trace.index,
                            Severity::Warning,
                            "coordinate_out_of_bounds",
                            format!("{} = {scaled:.0} outside [{min}, {max}]", def.name),
                            format!("scalar {scalar}"),
                        ),
                    );
                }
            }
        }
    }

    if let Some((lo, hi)) = scalar_seen {
        if lo != hi {
            outcome.emit(
                &file,
                sink,
                Finding::file(
                    Severity::Warning,
                    "coordinate_scalar_varies",
                    "coordinate_scalar varies across traces".to_string(),
                    format!("min {lo}, max {hi}"),
                ),
            );
        }
    }

    if collect {
        for (slot, (def, _)) in coord_defs.iter().enumerate() {
            outlier_check(
                def.name,
                &columns[slot],
                opts.outlier_threshold,
                &file,
                sink,
                &mut outcome,
            );
        }
    }

    debug!(
        errors = outcome.errors,
        warnings = outcome.warnings,
        "validation finished"
    );
    Ok(outcome)
}

fn structure_checks<R: Read>(
    reader: &SegyReader<R>,
    sink: &mut dyn ReportSink,
    file: &std::path::Path,
    outcome: &mut ValidationOutcome,
) {
    let summary = reader.summary();

    // The reader already proved the trace region divides evenly and
    // the format code is recognized; what remains are the header
    // values themselves.
    if summary.file_size < 3600 {
        outcome.emit(
            file,
            sink,
            Finding::file(
                Severity::Error,
                "file_too_small",
                format!(
                    "file is {} bytes, below the 3600-byte header minimum",
                    summary.file_size
                ),
                String::new(),
            ),
        );
    }

    if summary.samples_per_trace == 0 {
        outcome.emit(
            file,
            sink,
            Finding::file(
                Severity::Error,
                "invalid_samples_per_trace",
                "samples_per_trace must be positive".to_string(),
                String::new(),
            ),
        );
    } else if summary.samples_per_trace > 100_000 {
        outcome.emit(
            file,
            sink,
            Finding::file(
                Severity::Warning,
                "suspicious_samples_per_trace",
                format!("unusually high samples_per_trace: {}", summary.samples_per_trace),
                String::new(),
            ),
        );
    }

    if summary.sample_interval <= 0 {
        outcome.emit(
            file,
            sink,
            Finding::file(
                Severity::Error,
                "invalid_sample_interval",
                format!("invalid sample interval: {} us", summary.sample_interval),
                String::new(),
            ),
        );
    }

    if summary.trace_count == 0 {
        outcome.emit(
            file,
            sink,
            Finding::file(
                Severity::Warning,
                "no_traces",
                "file contains no traces".to_string(),
                String::new(),
            ),
        );
    }
}

/// Positive scalars multiply, negative divide, zero acts as 1.
fn scalar_factor(scalar: i64) -> f64 {
    if scalar > 0 {
        scalar as f64
    } else if scalar < 0 {
        1.0 / (-scalar) as f64
    } else {
        1.0
    }
}

fn outlier_check(
    name: &str,
    values: &[f64],
    threshold: f64,
    file: &std::path::Path,
    sink: &mut dyn ReportSink,
    outcome: &mut ValidationOutcome,
) {
    if values.is_empty() {
        return;
    }
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    let mad = median(&deviations);
    let cutoff = threshold * mad;

    for (index, deviation) in deviations.iter().enumerate() {
        if *deviation > cutoff {
            outcome.emit(
                file,
                sink,
                Finding::trace(
                    index as u64,
                    Severity::Warning,
                    "coordinate_outlier",
                    format!(
                        "{name} = {:.0} deviates {deviation:.0} from median {med:.0}",
                        values[index]
                    ),
                    format!("MAD {mad:.0}, threshold {threshold}"),
                ),
            );
        }
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn coord_def(name: &str) -> &'static FieldDef {
    trace_field(name).unwrap_or_else(|| panic!("'{name}' missing from trace table"))
}
