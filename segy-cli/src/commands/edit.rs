//! `segytool edit`: apply a plan file to one or more SEG-Y files

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Args;
use owo_colors::OwoColorize;
use rayon::prelude::*;

use segy_edit::{Engine, Error, RunReport};

use crate::report::{use_color, ChangelogCsv, FindingLog, SharedChangelog, SharedFindings};
use crate::{discover_files, exit, exit_code, plan_file};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// SEG-Y file or directory of SEG-Y files
    pub path: PathBuf,

    /// Plan file (TOML or JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Preview: emit all events but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Override the plan's output directory
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Changelog CSV destination
    #[arg(long, default_value = "changelog.csv")]
    pub changelog: PathBuf,

    /// Worker pool size for multiple files
    #[arg(long, default_value_t = 1)]
    pub jobs: usize,
}

pub fn handle(args: EditArgs) -> i32 {
    let mut plan = match plan_file::load(&args.config) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(&e);
        }
    };
    if args.dry_run {
        plan.dry_run = true;
    }
    if let Some(dir) = &args.output_dir {
        plan.output_dir = Some(dir.clone());
    }

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

    println!("Plan: {}", args.config.display());
    println!("Files: {}", files.len());
    println!("Mode: {}", if plan.dry_run { "DRY RUN" } else { "APPLY" });
    println!();

    let changelog = match ChangelogCsv::create(&args.changelog) {
        Ok(log) => Mutex::new(log),
        Err(e) => {
            eprintln!("Error: cannot create changelog '{}': {e}", args.changelog.display());
            return exit::IO;
        }
    };
    let findings = Mutex::new(FindingLog::new());

    let results = run_files(&plan, &files, args.jobs.max(1), &changelog, &findings);

    let color = use_color();
    println!("=== Summary ===");
    let mut worst = exit::SUCCESS;
    for (file, result) in &results {
        match result {
            Ok(report) => {
                let status = if color {
                    "SUCCESS".green().to_string()
                } else {
                    "SUCCESS".to_string()
                };
                let dest = report
                    .output
                    .as_ref()
                    .map(|p| format!(" -> {}", p.display()))
                    .unwrap_or_default();
                println!(
                    "  {}: {status} ({} changes over {} traces{dest})",
                    file.display(),
                    report.changes,
                    report.traces_total,
                );
            }
            Err(e) => {
                let status = if color {
                    "FAILURE".red().to_string()
                } else {
                    "FAILURE".to_string()
                };
                println!("  {}: {status} ({e})", file.display());
                worst = worst.max(exit_code(e));
            }
        }
    }

    let findings = findings.into_inner().unwrap_or_default();
    if !findings.entries.is_empty() {
        println!();
        println!("{}", crate::report::render_findings(&findings.entries, color));
    }

    match changelog.into_inner() {
        Ok(log) => {
            let rows = log.rows();
            if let Err(e) = log.finish() {
                eprintln!("Error: changelog flush failed: {e}");
                return exit::IO;
            }
            println!();
            println!("Changelog saved: {} ({rows} rows)", args.changelog.display());
        }
        Err(_) => return exit::INTERNAL,
    }

    worst
}

type FileResult = (PathBuf, Result<RunReport, Error>);

fn run_files(
    plan: &segy_edit::EditPlan,
    files: &[PathBuf],
    jobs: usize,
    changelog: &Mutex<ChangelogCsv>,
    findings: &Mutex<FindingLog>,
) -> Vec<FileResult> {
    let run_one = |file: &PathBuf| -> FileResult {
        let mut changes = SharedChangelog::new(changelog);
        let mut report = SharedFindings::new(findings);
        let result = Engine::new(plan).run(file, &mut changes, &mut report);
        (file.clone(), result)
    };

    if jobs == 1 || files.len() == 1 {
        return files.iter().map(run_one).collect();
    }

    // Bounded worker pool; each worker streams its own file, the
    // sinks serialize behind the mutexes.
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build();
    match pool {
        Ok(pool) => pool.install(|| files.par_iter().map(run_one).collect()),
        Err(e) => {
            tracing::warn!("worker pool unavailable ({e}), falling back to sequential");
            files.iter().map(run_one).collect()
        }
    }
}
