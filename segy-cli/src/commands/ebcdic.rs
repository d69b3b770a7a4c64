//! `segytool ebcdic`: view or edit the textual header

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use segy_edit::{
    EbcdicEdit, EbcdicMode, EditOperation, EditPlan, Engine, MemorySink, OnTraceError, OutputMode,
    Validations,
};
use segy_format::ebcdic::{detect_encoding, decode_lines_as, format_lines};
use segy_format::SegyReader;

use crate::{exit, exit_code};

#[derive(Args, Debug)]
pub struct EbcdicArgs {
    /// SEG-Y file
    pub file: PathBuf,

    /// Display the textual header
    #[arg(long)]
    pub show: bool,

    /// Replace line N (0-based) with TEXT, as N=TEXT; repeatable
    #[arg(long = "set-line", value_name = "N=TEXT")]
    pub set_line: Vec<String>,
}

pub fn handle(args: EbcdicArgs) -> i32 {
    if args.set_line.is_empty() {
        return show(&args.file);
    }

    let mut lines = BTreeMap::new();
    for spec in &args.set_line {
        match spec.split_once('=') {
            Some((index, text)) => {
                lines.insert(index.trim().to_string(), text.to_string());
            }
            None => {
                eprintln!("Error: --set-line expects N=TEXT, got '{spec}'");
                return exit::PLAN;
            }
        }
    }

    let plan = EditPlan {
        output_mode: OutputMode::InPlace,
        output_dir: None,
        dry_run: false,
        on_trace_error: OnTraceError::Abort,
        validations: Validations::default(),
        edits: vec![EditOperation::Ebcdic(EbcdicEdit {
            mode: EbcdicMode::Lines,
            lines,
            template: None,
            replacements: BTreeMap::new(),
        })],
    };

    let mut changes = MemorySink::new();
    let mut report = MemorySink::new();
    match Engine::new(&plan).run(&args.file, &mut changes, &mut report) {
        Ok(_) => {
            println!("EBCDIC header updated: {} line(s) changed", changes.changes.len());
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code(&e)
        }
    }
}

fn show(file: &PathBuf) -> i32 {
    let reader = match SegyReader::open(file) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit::IO;
        }
    };
    let encoding = detect_encoding(reader.textual());
    let lines = decode_lines_as(reader.textual(), encoding);
    println!("File: {}", file.display());
    println!("Encoding: {}", encoding.name());
    println!();
    println!("{}", format_lines(&lines));
    exit::SUCCESS
}
