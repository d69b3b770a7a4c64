//! Declarative edit plan model
//!
//! The plan is plain data: the CLI deserializes it from a TOML or JSON
//! file with serde, and every structure here rejects unknown keys so a
//! typo fails naming the offending path instead of silently doing
//! nothing. Field references are resolved against the header tables
//! when the engine prepares the plan, before any file I/O.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

/// Where edited output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Atomically replace the input file.
    InPlace,
    /// Write `output_dir/<filename>`.
    SeparateFolder,
    /// Count writes without persisting anything.
    Discard,
}

/// Recovery policy for per-trace errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnTraceError {
    /// Abort the plan, rolling back any output.
    #[default]
    Abort,
    /// Leave the failing trace unedited and continue silently.
    Skip,
    /// Leave the failing trace unedited and report a warning, at most
    /// once per (operation, error kind).
    Warn,
}

/// Rectangle of acceptable scaled coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoordinateBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Which validation checks run before editing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Validations {
    pub check_file_structure: bool,
    pub check_coordinate_range: bool,
    pub coordinate_bounds: Option<CoordinateBounds>,
    pub check_coordinate_outliers: bool,
    /// Multiple of the median absolute deviation beyond which a
    /// coordinate counts as an outlier.
    pub outlier_threshold: f64,
}

impl Default for Validations {
    fn default() -> Self {
        Self {
            check_file_structure: false,
            check_coordinate_range: false,
            coordinate_bounds: None,
            check_coordinate_outliers: false,
            outlier_threshold: 10.0,
        }
    }
}

impl Validations {
    /// Whether any check is enabled.
    pub fn any_enabled(&self) -> bool {
        self.check_file_structure || self.check_coordinate_range || self.check_coordinate_outliers
    }
}

/// EBCDIC edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EbcdicMode {
    /// Merge individual lines into the existing header.
    #[default]
    Lines,
    /// Replace all 40 lines.
    Template,
}

/// Textual-header edit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EbcdicEdit {
    #[serde(default)]
    pub mode: EbcdicMode,
    /// Line index (as a string key, "0".."39") to replacement text.
    #[serde(default)]
    pub lines: BTreeMap<String, String>,
    /// Exactly 40 lines for template mode.
    #[serde(default)]
    pub template: Option<Vec<String>>,
    /// `{{key}}` placeholder substitutions applied to template lines.
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
}

/// One binary-header field assignment. Either `name` or the explicit
/// `(offset, width, signed)` span must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinaryFieldEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub offset: Option<u16>,
    #[serde(default)]
    pub width: Option<u8>,
    #[serde(default)]
    pub signed: Option<bool>,
    pub value: i64,
}

/// One trace-header field assignment. Exactly one of `value`,
/// `expression`, `copy_from` or `csv_file` selects the edit kind,
/// mirroring the plan file syntax.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceFieldEdit {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub copy_from: Option<String>,
    #[serde(default)]
    pub csv_file: Option<PathBuf>,
    #[serde(default)]
    pub csv_column: Option<String>,
    #[serde(default)]
    pub key_column: Option<String>,
}

/// One edit operation, dispatched on the `type` key.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditOperation {
    Ebcdic(EbcdicEdit),
    BinaryHeader {
        fields: Vec<BinaryFieldEdit>,
    },
    TraceHeader {
        #[serde(default)]
        condition: Option<String>,
        fields: Vec<TraceFieldEdit>,
    },
}

/// A complete declarative edit plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditPlan {
    pub output_mode: OutputMode,
    /// Required when `output_mode = separate_folder`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub on_trace_error: OnTraceError,
    #[serde(default)]
    pub validations: Validations,
    #[serde(default)]
    pub edits: Vec<EditOperation>,
}

impl EditPlan {
    /// A plan that only validates: no edits, discard output.
    pub fn validation_only(validations: Validations) -> Self {
        Self {
            output_mode: OutputMode::Discard,
            output_dir: None,
            dry_run: true,
            on_trace_error: OnTraceError::Abort,
            validations,
            edits: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_plan_from_json() {
        let plan: EditPlan = serde_json::from_str(
            r#"{
                "output_mode": "separate_folder",
                "output_dir": "./out",
                "validations": {
                    "check_file_structure": true,
                    "check_coordinate_outliers": true
                },
                "edits": [
                    {"type": "binary_header",
                     "fields": [{"name": "sample_interval", "value": 2000}]},
                    {"type": "trace_header",
                     "condition": "trace_sequence_line > 100",
                     "fields": [
                        {"name": "cdp_x", "copy_from": "source_x"},
                        {"name": "source_x", "expression": "source_x * 10"},
                        {"name": "inline", "value": 7}
                     ]},
                    {"type": "ebcdic", "lines": {"0": "NEW LINE ONE"}}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(plan.output_mode, OutputMode::SeparateFolder);
        assert!(!plan.dry_run);
        assert_eq!(plan.on_trace_error, OnTraceError::Abort);
        assert!(plan.validations.check_file_structure);
        assert_eq!(plan.validations.outlier_threshold, 10.0);
        assert_eq!(plan.edits.len(), 3);
        match &plan.edits[1] {
            EditOperation::TraceHeader { condition, fields } => {
                assert_eq!(condition.as_deref(), Some("trace_sequence_line > 100"));
                assert_eq!(fields.len(), 3);
                assert_eq!(fields[0].copy_from.as_deref(), Some("source_x"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = serde_json::from_str::<EditPlan>(
            r#"{"output_mode": "in_place", "outptu_dir": "./x"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("outptu_dir"), "{err}");

        let err = serde_json::from_str::<EditPlan>(
            r#"{"output_mode": "in_place",
                "edits": [{"type": "binary_header",
                           "fields": [{"name": "job_id", "valu": 3}]}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("valu"), "{err}");
    }

    #[test]
    fn unknown_output_mode_rejected() {
        assert!(serde_json::from_str::<EditPlan>(r#"{"output_mode": "overwrite"}"#).is_err());
    }

    #[test]
    fn recovery_mode_parses() {
        let plan: EditPlan = serde_json::from_str(
            r#"{"output_mode": "discard", "on_trace_error": "warn"}"#,
        )
        .unwrap();
        assert_eq!(plan.on_trace_error, OnTraceError::Warn);
    }
}
