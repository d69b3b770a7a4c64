use clap::{Parser, Subcommand};
use tracing::Level;

use segy_cli::commands::{ebcdic, edit, info, validate};

#[derive(Parser)]
#[command(
    name = "segytool",
    about = "Batch inspector and in-place editor for SEG-Y file headers",
    version,
    long_about = "Validates SEG-Y files for structural integrity and coordinate sanity, \
and applies declarative header edits (constants, expressions, field copies, CSV \
imports) without disturbing sample payloads."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate SEG-Y file(s) for structural and coordinate problems
    Validate(validate::ValidateArgs),

    /// Apply a plan file to SEG-Y file(s)
    Edit(edit::EditArgs),

    /// View or edit the EBCDIC textual header
    Ebcdic(ebcdic::EbcdicArgs),

    /// Show a summary of one SEG-Y file
    Info(info::InfoArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    let code = match cli.command {
        Commands::Validate(args) => validate::handle(args),
        Commands::Edit(args) => edit::handle(args),
        Commands::Ebcdic(args) => ebcdic::handle(args),
        Commands::Info(args) => info::handle(args),
    };
    std::process::exit(code);
}
