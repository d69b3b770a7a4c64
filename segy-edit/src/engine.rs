//! Plan execution engine
//!
//! Runs one plan against one file: prepare the editors (all
//! fatal-before-streaming validation), open the file, run the
//! validator if requested, then make a single streaming pass from
//! reader to writer applying the textual, binary, and trace edits.
//! File output goes to a sibling temp file that is fsynced and
//! atomically renamed on success; any failure drops the temp file and
//! leaves the original untouched.

use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use segy_format::ebcdic;
use segy_format::{SegyReader, SegyWriter, TEXTUAL_HEADER_LEN};

use crate::binary_editor::{self, ResolvedBinaryEdit};
use crate::ebcdic_editor;
use crate::error::{Error, Result};
use crate::event::{ChangeSink, Finding, ReportSink, Severity};
use crate::plan::{EditOperation, EditPlan, OnTraceError, OutputMode};
use crate::trace_editor::TraceOps;
use crate::validator::{self, ValidationOutcome};

/// Counts reported after a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub file: PathBuf,
    pub traces_total: u64,
    pub traces_edited: u64,
    pub traces_skipped: u64,
    pub changes: u64,
    pub validation_errors: usize,
    pub validation_warnings: usize,
    /// Where the edited file landed; `None` for dry runs and discard mode.
    pub output: Option<PathBuf>,
    pub dry_run: bool,
}

/// Executes an [`EditPlan`] against files.
pub struct Engine<'a> {
    plan: &'a EditPlan,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> Engine<'a> {
    pub fn new(plan: &'a EditPlan) -> Self {
        Self { plan, cancel: None }
    }

    /// Honour a cancellation flag at trace boundaries. The in-flight
    /// trace completes, then the run stops and rolls back.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Execute the plan against one file.
    pub fn run(
        &self,
        path: &Path,
        changes: &mut dyn ChangeSink,
        report: &mut dyn ReportSink,
    ) -> Result<RunReport> {
        // Resolve everything that can fail before touching the file.
        let binary_edits = self.prepare_binary()?;
        let mut trace_ops = TraceOps::prepare(&self.plan.edits)?;
        let output = self.resolve_output(path)?;

        let validation = self.run_validations(path, report)?;
        if validation.errors > 0 && !self.plan.dry_run {
            return Err(Error::ValidationFailed { errors: validation.errors });
        }

        let mut reader = SegyReader::open(path)?;
        let payload_len = reader.summary().payload_len();
        let trace_count = reader.summary().trace_count;

        let mut stats = PassStats::default();
        let dest = match output {
            Output::Discard => {
                let mut writer = SegyWriter::discard(payload_len);
                self.stream(
                    &mut reader,
                    &mut writer,
                    &binary_edits,
                    &mut trace_ops,
                    changes,
                    report,
                    &mut stats,
                )?;
                writer.finish()?;
                None
            }
            Output::File { dir, dest } => {
                let tmp = tempfile::Builder::new()
                    .prefix(".segytool-")
                    .suffix(".part")
                    .tempfile_in(&dir)?;
                let mut writer = SegyWriter::new(BufWriter::new(tmp), payload_len);
                self.stream(
                    &mut reader,
                    &mut writer,
                    &binary_edits,
                    &mut trace_ops,
                    changes,
                    report,
                    &mut stats,
                )?;
                let buffered = writer.finish()?;
                let tmp = buffered
                    .into_inner()
                    .map_err(|e| Error::Io(e.into_error()))?;
                tmp.as_file().sync_all()?;
                tmp.persist(&dest).map_err(|e| Error::Io(e.error))?;
                debug!(dest = %dest.display(), "output persisted");
                Some(dest)
            }
        };

        for (csv_path, rows) in trace_ops.csv_row_overflow(trace_count) {
            report.finding(
                path,
                &Finding::file(
                    Severity::Warning,
                    "csv_extra_rows",
                    format!(
                        "CSV '{}' has {rows} rows for {trace_count} traces; extras ignored",
                        csv_path.display()
                    ),
                    String::new(),
                ),
            );
        }

        let report_out = RunReport {
            file: path.to_path_buf(),
            traces_total: trace_count,
            traces_edited: stats.edited,
            traces_skipped: stats.skipped,
            changes: stats.changes,
            validation_errors: validation.errors,
            validation_warnings: validation.warnings,
            output: dest,
            dry_run: self.plan.dry_run,
        };
        info!(
            file = %report_out.file.display(),
            traces = report_out.traces_total,
            edited = report_out.traces_edited,
            changes = report_out.changes,
            dry_run = report_out.dry_run,
            "plan completed"
        );
        Ok(report_out)
    }

    fn prepare_binary(&self) -> Result<Vec<ResolvedBinaryEdit>> {
        let mut resolved = Vec::new();
        for op in &self.plan.edits {
            if let EditOperation::BinaryHeader { fields } = op {
                resolved.extend(binary_editor::prepare(fields)?);
            }
        }
        Ok(resolved)
    }

    fn resolve_output(&self, path: &Path) -> Result<Output> {
        if self.plan.dry_run || self.plan.output_mode == OutputMode::Discard {
            return Ok(Output::Discard);
        }
        match self.plan.output_mode {
            OutputMode::InPlace => {
                let dir = path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                Ok(Output::File { dir, dest: path.to_path_buf() })
            }
            OutputMode::SeparateFolder => {
                let dir = self.plan.output_dir.clone().ok_or_else(|| Error::Plan {
                    path: "output_dir".to_string(),
                    reason: "required when output_mode = separate_folder".to_string(),
                })?;
                fs::create_dir_all(&dir)?;
                let name = path.file_name().ok_or_else(|| Error::Plan {
                    path: "input".to_string(),
                    reason: format!("'{}' has no file name", path.display()),
                })?;
                Ok(Output::File { dest: dir.join(name), dir })
            }
            OutputMode::Discard => unreachable!("handled above"),
        }
    }

    fn run_validations(
        &self,
        path: &Path,
        report: &mut dyn ReportSink,
    ) -> Result<ValidationOutcome> {
        if !self.plan.validations.any_enabled() {
            return Ok(ValidationOutcome::default());
        }
        let mut reader = SegyReader::open(path)?;
        validator::run(&mut reader, &self.plan.validations, report)
    }

    #[allow(clippy::too_many_arguments)]
    fn stream<R: Read, W: Write>(
        &self,
        reader: &mut SegyReader<R>,
        writer: &mut SegyWriter<W>,
        binary_edits: &[ResolvedBinaryEdit],
        trace_ops: &mut TraceOps,
        changes: &mut dyn ChangeSink,
        report: &mut dyn ReportSink,
        stats: &mut PassStats,
    ) -> Result<()> {
        let path = reader.summary().path.clone();

        // Textual header: splice re-encoded bytes over the changed
        // lines only, so untouched lines stay byte-identical even for
        // files with unusual textual content.
        let textual = self.edited_textual(reader.textual(), &path, changes, report, stats)?;
        writer.write_textual(&textual)?;

        let mut binary = reader.binary_header().clone();
        for event in binary_editor::apply(&mut binary, binary_edits)? {
            changes.change(&path, &event);
            stats.changes += 1;
        }
        writer.write_binary_header(binary.as_bytes())?;
        writer.write_extended(reader.extended())?;

        let mut warned: HashSet<(usize, &'static str)> = HashSet::new();
        for trace in reader.traces() {
            if let Some(flag) = self.cancel {
                if flag.load(Ordering::Relaxed) {
                    return Err(Error::Cancelled);
                }
            }
            let mut trace = trace?;
            match trace_ops.apply(trace.index, &mut trace.header) {
                Ok(events) => {
                    if !events.is_empty() {
                        stats.edited += 1;
                    }
                    for event in events {
                        changes.change(&path, &event);
                        stats.changes += 1;
                    }
                }
                Err(apply_error) if apply_error.error.is_per_trace() => {
                    match self.plan.on_trace_error {
                        OnTraceError::Abort => return Err(apply_error.error),
                        OnTraceError::Skip => {
                            debug!(
                                trace = trace.index,
                                error = %apply_error.error,
                                "trace skipped"
                            );
                            stats.skipped += 1;
                        }
                        OnTraceError::Warn => {
                            stats.skipped += 1;
                            if warned.insert((apply_error.op, apply_error.error.kind())) {
                                warn!(
                                    trace = trace.index,
                                    error = %apply_error.error,
                                    "trace edit failed, trace left unchanged"
                                );
                                report.finding(
                                    &path,
                                    &Finding::trace(
                                        trace.index,
                                        Severity::Warning,
                                        apply_error.error.kind(),
                                        apply_error.error.to_string(),
                                        format!("edit operation {}", apply_error.op),
                                    ),
                                );
                            }
                        }
                    }
                }
                Err(apply_error) => return Err(apply_error.error),
            }
            writer.write_trace(&trace.header, &trace.samples)?;
        }
        Ok(())
    }

    /// Apply EBCDIC edits and return the output textual-header bytes.
    fn edited_textual(
        &self,
        original: &[u8],
        path: &Path,
        changes: &mut dyn ChangeSink,
        report: &mut dyn ReportSink,
        stats: &mut PassStats,
    ) -> Result<Vec<u8>> {
        let ebcdic_edits: Vec<_> = self
            .plan
            .edits
            .iter()
            .filter_map(|op| match op {
                EditOperation::Ebcdic(edit) => Some(edit),
                _ => None,
            })
            .collect();
        if ebcdic_edits.is_empty() {
            return Ok(original.to_vec());
        }

        let encoding = ebcdic::detect_encoding(original);
        let mut lines = ebcdic::decode_lines_as(original, encoding);
        let mut all_changed = Vec::new();
        for edit in ebcdic_edits {
            let (changed, events) = ebcdic_editor::apply(&mut lines, edit)?;
            all_changed.extend(changed);
            for event in events {
                changes.change(path, &event);
                stats.changes += 1;
            }
        }

        let (encoded, warnings) = ebcdic::encode_lines(&lines, encoding);
        for warning in &warnings {
            report.finding(
                path,
                &Finding::file(
                    Severity::Warning,
                    "ebcdic_codec",
                    warning.to_string(),
                    String::new(),
                ),
            );
        }

        let mut out = original.to_vec();
        out.resize(TEXTUAL_HEADER_LEN, ebcdic::EBCDIC_SPACE);
        for line in all_changed {
            let span = line * ebcdic::COLS..(line + 1) * ebcdic::COLS;
            out[span.clone()].copy_from_slice(&encoded[span]);
        }
        Ok(out)
    }
}

enum Output {
    Discard,
    File { dir: PathBuf, dest: PathBuf },
}

#[derive(Debug, Default)]
struct PassStats {
    edited: u64,
    skipped: u64,
    changes: u64,
}
