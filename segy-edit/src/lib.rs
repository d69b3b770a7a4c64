//! # segy-edit
//!
//! Declarative batch editing of SEG-Y headers: a typed [`EditPlan`],
//! a sandboxed expression language over trace-header fields, structural
//! and coordinate validation, and a streaming engine that applies a
//! plan in one constant-memory pass with atomic in-place replacement.
//!
//! ## Quick Start
//!
//! ```no_run
//! use segy_edit::{Engine, EditPlan, NullSink};
//!
//! let plan: EditPlan = serde_json::from_str(r#"{
//!     "output_mode": "separate_folder",
//!     "output_dir": "./out",
//!     "edits": [
//!         {"type": "trace_header",
//!          "condition": "trace_sequence_line > 100",
//!          "fields": [{"name": "cdp_x", "copy_from": "source_x"}]}
//!     ]
//! }"#)?;
//!
//! let mut changes = NullSink;
//! let mut report = NullSink;
//! let summary = Engine::new(&plan).run("line_042.segy".as_ref(), &mut changes, &mut report)?;
//! println!("{} changes over {} traces", summary.changes, summary.traces_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary_editor;
pub mod csv;
pub mod ebcdic_editor;
pub mod engine;
pub mod error;
pub mod event;
pub mod expr;
pub mod plan;
pub mod trace_editor;
pub mod validator;

pub use engine::{Engine, RunReport};
pub use error::{Error, Result};
pub use event::{
    ChangeEvent, ChangeSink, Finding, FindingScope, MemorySink, NullSink, Region, ReportSink,
    Severity,
};
pub use expr::{Expression, Value};
pub use plan::{
    BinaryFieldEdit, CoordinateBounds, EbcdicEdit, EbcdicMode, EditOperation, EditPlan,
    OnTraceError, OutputMode, TraceFieldEdit, Validations,
};
pub use validator::ValidationOutcome;
