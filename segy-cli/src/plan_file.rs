//! Plan-file loading
//!
//! Plans deserialize through serde from TOML (the default) or JSON,
//! chosen by file extension. Unknown keys fail with the offending
//! path in the error message.

use std::fs;
use std::path::Path;

use segy_edit::{EditPlan, Error};

/// Load and deserialize an edit plan.
pub fn load(path: &Path) -> Result<EditPlan, Error> {
    let content = fs::read_to_string(path)?;
    let display = path.display().to_string();

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&content).map_err(|e| Error::Plan {
            path: display,
            reason: e.to_string(),
        })
    } else {
        toml::from_str(&content).map_err(|e| Error::Plan {
            path: display,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segy_edit::{EditOperation, OutputMode};
    use std::io::Write;

    fn plan_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn toml_plan_loads() {
        let f = plan_file(
            ".toml",
            r#"
output_mode = "separate_folder"
output_dir = "./out"

[validations]
check_file_structure = true

[[edits]]
type = "binary_header"
fields = [{ name = "sample_interval", value = 2000 }]

[[edits]]
type = "trace_header"
condition = "trace_sequence_line > 100"
fields = [
    { name = "cdp_x", copy_from = "source_x" },
    { name = "source_x", expression = "source_x * 10" },
]
"#,
        );
        let plan = load(f.path()).unwrap();
        assert_eq!(plan.output_mode, OutputMode::SeparateFolder);
        assert_eq!(plan.edits.len(), 2);
        assert!(matches!(plan.edits[1], EditOperation::TraceHeader { .. }));
    }

    #[test]
    fn json_plan_loads() {
        let f = plan_file(
            ".json",
            r#"{"output_mode": "discard",
                "edits": [{"type": "ebcdic", "lines": {"0": "HELLO"}}]}"#,
        );
        let plan = load(f.path()).unwrap();
        assert_eq!(plan.output_mode, OutputMode::Discard);
    }

    #[test]
    fn unknown_key_names_the_path() {
        let f = plan_file(".toml", "output_mode = \"discard\"\nduy_run = true\n");
        let err = load(f.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("duy_run"), "{msg}");
    }

    #[test]
    fn missing_file_is_io() {
        let err = load(Path::new("/no/such/plan.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
