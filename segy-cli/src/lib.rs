//! segytool CLI library
//!
//! Command argument types, plan-file loading, and output rendering for
//! the `segytool` binary.

pub mod commands;
pub mod plan_file;
pub mod report;

use std::path::{Path, PathBuf};

/// Process exit codes, stable across releases.
pub mod exit {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION: i32 = 1;
    pub const PLAN: i32 = 2;
    pub const IO: i32 = 3;
    pub const INTERNAL: i32 = 4;
}

/// Map an engine error to the documented exit code.
pub fn exit_code(err: &segy_edit::Error) -> i32 {
    use segy_edit::Error;
    match err {
        Error::Plan { .. }
        | Error::TemplateShape { .. }
        | Error::ExprSyntax { .. }
        | Error::UnknownVariable(_)
        | Error::UnknownFunction(_)
        | Error::Format(segy_format::Error::UnknownField(_))
        | Error::Format(segy_format::Error::SpanOutOfBounds { .. })
        | Error::Format(segy_format::Error::UnsupportedWidth(_)) => exit::PLAN,
        Error::ValidationFailed { .. } => exit::VALIDATION,
        Error::Io(_)
        | Error::Format(segy_format::Error::Io(_))
        | Error::Format(segy_format::Error::TruncatedFile { .. })
        | Error::Format(segy_format::Error::InconsistentSampleCount { .. })
        | Error::Format(segy_format::Error::UnknownFormatCode(_)) => exit::IO,
        _ => exit::INTERNAL,
    }
}

const SEGY_EXTENSIONS: &[&str] = &["segy", "sgy", "seg"];

/// Expand a file-or-directory argument into the SEG-Y files to process.
///
/// Directories are scanned non-recursively for `.segy`, `.sgy` and
/// `.seg` files, sorted by name.
pub fn discover_files(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| SEGY_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discover_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.sgy", "a.segy", "c.SEG", "notes.txt", "d.segy.bak"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let files = discover_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.segy", "b.sgy", "c.SEG"]);
    }

    #[test]
    fn discover_single_file_passthrough() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("one.segy");
        fs::write(&file, b"x").unwrap();
        assert_eq!(discover_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn exit_codes_match_error_classes() {
        let plan_err = segy_edit::Error::Plan {
            path: "x".into(),
            reason: "y".into(),
        };
        assert_eq!(exit_code(&plan_err), exit::PLAN);
        assert_eq!(
            exit_code(&segy_edit::Error::ValidationFailed { errors: 2 }),
            exit::VALIDATION
        );
        assert_eq!(
            exit_code(&segy_edit::Error::Format(
                segy_format::Error::UnknownFormatCode(9)
            )),
            exit::IO
        );
        assert_eq!(exit_code(&segy_edit::Error::DivisionByZero), exit::INTERNAL);
    }
}
