//! kdoc: a "dumb" documentation generator.
//!
//! Unlike doxygen or godoc, kdoc does not understand the code it documents.
//! It pairs doc-comment blocks with the line that follows them and writes
//! cross-linked markdown, which keeps it simple, fast, and mostly language
//! agnostic.

mod backlinks;
mod commands;
mod comment;
mod config;
mod error;
mod extract;
mod generate;
mod git;
mod ident;
mod render;
mod scanner;
mod types;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::generate::Options;

/// Command-line interface.
#[derive(Parser)]
#[command(
    name = "kdoc",
    version,
    about = "Generate markdown docs directly from source code comments"
)]
struct Cli {
    /// Where generated docs go (overrides `output_path` in kdoc.toml)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,
    /// Directory containing kdoc.toml (defaults to the working directory)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,
    /// Also scan the output directory for files to document
    #[arg(short = 's', long, global = true)]
    recurse_scan: bool,
    /// Disable git metadata collection and embedding
    #[arg(short = 'g', long, global = true)]
    no_git: bool,
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Write a default kdoc.toml, or add missing keys to an existing one
    Init,
    /// Generate markdown docs from the configured source files
    #[command(alias = "gen")]
    Generate,
    /// Generate, then regenerate whenever a source file changes
    Watch,
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("kdoc=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse arguments, dispatch the subcommand, and map errors to exit codes.
fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let options = Options {
        no_git: cli.no_git,
        output: cli.output,
        recurse_scan: cli.recurse_scan,
        root: cli.root,
    };

    let result = match cli.command {
        Commands::Init => commands::init(&options).map(|()| return ExitCode::SUCCESS),
        Commands::Generate => commands::generate(&options).map(|()| return ExitCode::SUCCESS),
        Commands::Watch => watch::run(&options),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    };
}
