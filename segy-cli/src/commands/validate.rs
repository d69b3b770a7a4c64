//! `segytool validate`: structural and coordinate checks

use std::path::PathBuf;

use clap::Args;

use segy_edit::{validator, CoordinateBounds, ReportSink, Validations};
use segy_format::SegyReader;

use crate::report::{render_findings, use_color, FindingLog};
use crate::{discover_files, exit};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// SEG-Y file or directory of SEG-Y files
    pub path: PathBuf,

    /// Write the validation report CSV here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Coordinate bounds as x_min,x_max,y_min,y_max; enables the
    /// coordinate range check
    #[arg(long)]
    pub bounds: Option<String>,

    /// MAD multiple for the coordinate outlier check; enables it
    #[arg(long, value_name = "K")]
    pub outliers: Option<f64>,
}

pub fn handle(args: ValidateArgs) -> i32 {
    let bounds = match args.bounds.as_deref().map(parse_bounds).transpose() {
        Ok(b) => b,
        Err(reason) => {
            eprintln!("Error: --bounds {reason}");
            return exit::PLAN;
        }
    };
    let validations = Validations {
        check_file_structure: true,
        check_coordinate_range: bounds.is_some(),
        coordinate_bounds: bounds,
        check_coordinate_outliers: args.outliers.is_some(),
        outlier_threshold: args.outliers.unwrap_or(10.0),
    };

    let files = match discover_files(&args.path) {
        Ok(files) if files.is_empty() => {
            eprintln!("No SEG-Y files found under '{}'", args.path.display());
            return exit::PLAN;
        }
        Ok(files) => files,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {e}", args.path.display());
            return exit::IO;
        }
    };

    let mut log = FindingLog::new();
    for file in &files {
        println!("Validating: {}", file.display());
        let before = log.entries.len();
        match SegyReader::open(file) {
            Err(e) => {
                let finding = validator::open_failure_finding(&e);
                log.finding(file, &finding);
            }
            Ok(mut reader) => {
                if let Err(e) = validator::run(&mut reader, &validations, &mut log) {
                    eprintln!("Error: {e}");
                    return crate::exit_code(&e);
                }
            }
        }
        let count = log.entries.len() - before;
        if count == 0 {
            println!("  PASS");
        } else {
            println!("  {count} finding(s)");
        }
    }

    if !log.entries.is_empty() {
        println!("{}", render_findings(&log.entries, use_color()));
    }

    if let Some(output) = &args.output {
        if let Err(e) = log.write_csv(output) {
            eprintln!("Error: cannot write report '{}': {e}", output.display());
            return exit::IO;
        }
        println!("Report saved: {}", output.display());
    }

    if log.errors() > 0 {
        exit::VALIDATION
    } else {
        exit::SUCCESS
    }
}

fn parse_bounds(text: &str) -> Result<CoordinateBounds, String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expects 4 comma-separated numbers, got {}", parts.len()));
    }
    let mut values = [0.0f64; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
    }
    Ok(CoordinateBounds {
        x_min: values[0],
        x_max: values[1],
        y_min: values[2],
        y_max: values[3],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_parse() {
        let b = parse_bounds("0, 1000, -50,2e6").unwrap();
        assert_eq!(b.x_min, 0.0);
        assert_eq!(b.x_max, 1000.0);
        assert_eq!(b.y_min, -50.0);
        assert_eq!(b.y_max, 2_000_000.0);
        assert!(parse_bounds("1,2,3").is_err());
        assert!(parse_bounds("a,b,c,d").is_err());
    }
}
