//! Error types for plan validation and execution

use thiserror::Error;

/// Result type for edit-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating or executing an edit plan
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec-level error from segy-format
    #[error(transparent)]
    Format(#[from] segy_format::Error),

    /// Plan is structurally invalid
    #[error("Invalid plan at '{path}': {reason}")]
    Plan { path: String, reason: String },

    /// Template mode requires exactly 40 lines
    #[error("EBCDIC template must have exactly 40 lines, got {actual}")]
    TemplateShape { actual: usize },

    /// Expression could not be parsed
    #[error("Syntax error in expression '{expr}': {reason}")]
    ExprSyntax { expr: String, reason: String },

    /// Identifier does not resolve to a header field or trace_index
    #[error("Unknown variable: '{0}'")]
    UnknownVariable(String),

    /// Call to a function outside the allowed set
    #[error("Unknown function: '{0}' (allowed: abs, int, float, round, min, max)")]
    UnknownFunction(String),

    /// Division (or floor division / modulo) by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// CSV has fewer rows than the file has traces
    #[error("CSV '{file}' has no row for trace {trace}")]
    CsvUnderflow { file: String, trace: u64 },

    /// Keyed CSV lookup found no row for the trace's key value
    #[error("CSV '{file}' has no row with key {key}")]
    CsvKeyMissing { file: String, key: i64 },

    /// CSV cell could not be parsed as a number
    #[error("CSV '{file}' row {row}, column '{column}': cannot parse '{value}' as a number")]
    CsvTypeError {
        file: String,
        row: usize,
        column: String,
        value: String,
    },

    /// Named column absent from the CSV header row
    #[error("CSV '{file}' has no column '{column}'")]
    CsvColumnMissing { file: String, column: String },

    /// Pre-edit validation produced error findings
    #[error("Validation failed with {errors} error finding(s)")]
    ValidationFailed { errors: usize },

    /// Execution cancelled at a trace boundary
    #[error("Cancelled")]
    Cancelled,
}

impl Error {
    /// Whether this error is recoverable per trace under the plan's
    /// `on_trace_error` policy. Everything else is fatal.
    pub fn is_per_trace(&self) -> bool {
        matches!(
            self,
            Error::Format(segy_format::Error::OutOfRange { .. })
                | Error::UnknownVariable(_)
                | Error::DivisionByZero
                | Error::CsvUnderflow { .. }
                | Error::CsvKeyMissing { .. }
                | Error::CsvTypeError { .. }
        )
    }

    /// Stable kind tag, used to deduplicate warnings.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Format(segy_format::Error::OutOfRange { .. }) => "out_of_range",
            Error::Format(_) => "format",
            Error::Plan { .. } => "plan",
            Error::TemplateShape { .. } => "template_shape",
            Error::ExprSyntax { .. } => "expr_syntax",
            Error::UnknownVariable(_) => "unknown_variable",
            Error::UnknownFunction(_) => "unknown_function",
            Error::DivisionByZero => "division_by_zero",
            Error::CsvUnderflow { .. } => "csv_underflow",
            Error::CsvKeyMissing { .. } => "csv_key_missing",
            Error::CsvTypeError { .. } => "csv_type_error",
            Error::CsvColumnMissing { .. } => "csv_column_missing",
            Error::ValidationFailed { .. } => "validation_failed",
            Error::Cancelled => "cancelled",
        }
    }
}
