//! `segytool info`: file summary

use std::path::PathBuf;

use clap::Args;
use comfy_table::{presets, ContentArrangement, Table};

use segy_format::{trace_field, SegyReader};

use crate::{exit, exit_code};

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// SEG-Y file
    pub file: PathBuf,
}

pub fn handle(args: InfoArgs) -> i32 {
    let mut reader = match SegyReader::open(&args.file) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(&segy_edit::Error::Format(e));
        }
    };

    let summary = reader.summary().clone();
    let encoding = segy_format::ebcdic::detect_encoding(reader.textual()).name();
    let scalar = first_trace_scalar(&mut reader);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    let rows = [
        ("file", summary.path.display().to_string()),
        ("size", format!("{} bytes", summary.file_size)),
        ("textual encoding", encoding.to_string()),
        (
            "format code",
            format!("{} ({} bytes/sample)", summary.format_code, summary.bytes_per_sample),
        ),
        ("sample interval", format!("{} us", summary.sample_interval)),
        ("samples per trace", summary.samples_per_trace.to_string()),
        ("extended headers", summary.extended_headers.to_string()),
        ("traces", summary.trace_count.to_string()),
        (
            "coordinate scalar",
            scalar.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for (label, value) in rows {
        table.add_row([label.to_string(), value]);
    }
    println!("{table}");
    exit::SUCCESS
}

fn first_trace_scalar<R: std::io::Read>(reader: &mut SegyReader<R>) -> Option<i64> {
    let def = trace_field("coordinate_scalar")?;
    let trace = reader.traces().next()?.ok()?;
    Some(trace.header.get(def))
}
