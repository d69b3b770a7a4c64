//! Changelog and validation-report rendering
//!
//! The changelog is a CSV file with one row per field change; the
//! validation report is a CSV with one row per finding. Console
//! rendering uses a table with severity coloring.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use comfy_table::{presets, Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;

use segy_edit::{ChangeEvent, ChangeSink, Finding, FindingScope, ReportSink, Severity};

/// Quote a CSV cell when it needs it.
fn csv_cell(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row(out: &mut impl Write, cells: &[&str]) -> std::io::Result<()> {
    let row: Vec<String> = cells.iter().map(|c| csv_cell(c)).collect();
    writeln!(out, "{}", row.join(","))
}

/// CSV changelog writer: one row per change event.
pub struct ChangelogCsv {
    out: BufWriter<File>,
    rows: u64,
}

impl ChangelogCsv {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        write_row(
            &mut out,
            &["file", "timestamp", "trace_index", "region", "field", "old_value", "new_value"],
        )?;
        Ok(Self { out, rows: 0 })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> std::io::Result<()> {
        self.out.flush()
    }

    fn write(&mut self, file: &Path, event: &ChangeEvent) -> std::io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S").to_string();
        let trace = event.trace_index.map(|i| i.to_string()).unwrap_or_default();
        write_row(
            &mut self.out,
            &[
                &file.display().to_string(),
                &timestamp,
                &trace,
                event.region.name(),
                &event.field,
                &event.old_value,
                &event.new_value,
            ],
        )?;
        self.rows += 1;
        Ok(())
    }
}

impl ChangeSink for ChangelogCsv {
    fn change(&mut self, file: &Path, event: &ChangeEvent) {
        if let Err(e) = self.write(file, event) {
            tracing::error!("changelog write failed: {e}");
        }
    }
}

/// Collects findings in memory and writes the report CSV on demand.
#[derive(Default)]
pub struct FindingLog {
    pub entries: Vec<(PathBuf, Finding)>,
}

impl FindingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, f)| f.severity == Severity::Error)
            .count()
    }

    pub fn write_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        write_row(
            &mut out,
            &["file", "severity", "kind", "trace_index", "message", "context"],
        )?;
        for (file, finding) in &self.entries {
            let trace = match finding.scope {
                FindingScope::File => String::new(),
                FindingScope::Trace(i) => i.to_string(),
            };
            write_row(
                &mut out,
                &[
                    &file.display().to_string(),
                    finding.severity.name(),
                    finding.kind,
                    &trace,
                    &finding.message,
                    &finding.context,
                ],
            )?;
        }
        out.flush()
    }
}

impl ReportSink for FindingLog {
    fn finding(&mut self, file: &Path, finding: &Finding) {
        self.entries.push((file.to_path_buf(), finding.clone()));
    }
}

/// Render findings as a console table with colored severities.
pub fn render_findings(findings: &[(PathBuf, Finding)], use_color: bool) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["severity", "kind", "trace", "message"]);
    for (_, finding) in findings {
        let severity = severity_label(finding.severity, use_color);
        let trace = match finding.scope {
            FindingScope::File => "-".to_string(),
            FindingScope::Trace(i) => i.to_string(),
        };
        table.add_row([
            Cell::new(severity),
            Cell::new(finding.kind),
            Cell::new(trace),
            Cell::new(&finding.message),
        ]);
    }
    table.to_string()
}

pub fn severity_label(severity: Severity, use_color: bool) -> String {
    if !use_color {
        return severity.name().to_uppercase();
    }
    match severity {
        Severity::Error => severity.name().to_uppercase().red().to_string(),
        Severity::Warning => severity.name().to_uppercase().yellow().to_string(),
    }
}

/// Whether console output should use color.
pub fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

/// A change sink that serializes access to a shared changelog, for
/// multi-file runs on the worker pool.
pub struct SharedChangelog<'a> {
    inner: &'a Mutex<ChangelogCsv>,
}

impl<'a> SharedChangelog<'a> {
    pub fn new(inner: &'a Mutex<ChangelogCsv>) -> Self {
        Self { inner }
    }
}

impl ChangeSink for SharedChangelog<'_> {
    fn change(&mut self, file: &Path, event: &ChangeEvent) {
        if let Ok(mut log) = self.inner.lock() {
            log.change(file, event);
        }
    }
}

/// A report sink that serializes access to a shared finding log.
pub struct SharedFindings<'a> {
    inner: &'a Mutex<FindingLog>,
}

impl<'a> SharedFindings<'a> {
    pub fn new(inner: &'a Mutex<FindingLog>) -> Self {
        Self { inner }
    }
}

impl ReportSink for SharedFindings<'_> {
    fn finding(&mut self, file: &Path, finding: &Finding) {
        if let Ok(mut log) = self.inner.lock() {
            log.finding(file, finding);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segy_edit::Region;
    use tempfile::TempDir;

    #[test]
    fn csv_cell_quoting() {
        assert_eq!(csv_cell("plain"), "plain");
        assert_eq!(csv_cell("a,b"), "\"a,b\"");
        assert_eq!(csv_cell("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn changelog_rows_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("changelog.csv");
        let mut log = ChangelogCsv::create(&path).unwrap();
        log.change(
            Path::new("a.segy"),
            &ChangeEvent {
                region: Region::Trace,
                trace_index: Some(7),
                field: "source_x".to_string(),
                old_value: "100".to_string(),
                new_value: "1000".to_string(),
            },
        );
        assert_eq!(log.rows(), 1);
        log.finish().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "file,timestamp,trace_index,region,field,old_value,new_value"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("a.segy,"));
        assert!(row.ends_with(",7,trace,source_x,100,1000"));
    }

    #[test]
    fn report_csv_contains_findings() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.csv");
        let mut log = FindingLog::new();
        log.finding(
            Path::new("a.segy"),
            &Finding::trace(3, Severity::Error, "coordinate_outlier", "way off".into(), "".into()),
        );
        log.finding(
            Path::new("a.segy"),
            &Finding::file(Severity::Warning, "no_traces", "empty".into(), "".into()),
        );
        assert_eq!(log.errors(), 1);
        log.write_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("a.segy,error,coordinate_outlier,3,way off,"));
        assert!(content.contains("a.segy,warning,no_traces,,empty,"));
    }

    #[test]
    fn severity_labels() {
        assert_eq!(severity_label(Severity::Error, false), "ERROR");
        assert_eq!(severity_label(Severity::Warning, false), "WARNING");
    }
}
