//! Core CLI commands for kdoc: init and generate.

use crate::config;
use crate::error;
use crate::generate::{self, Options};

/// Create `kdoc.toml` with defaults, or fill in keys an existing one lacks.
///
/// # Errors
///
/// Returns errors from reading, parsing, or writing the config.
pub fn init(options: &Options) -> Result<(), error::Error> {
    let root = options.project_root()?;
    let path = root.join(config::CONFIG_FILE);
    let added = config::init(&root)?;

    if added.is_empty() {
        eprintln!("{} is already complete", path.display());
    } else {
        eprintln!("kdoc initialized successfully in {}", path.display());
        eprintln!("added: {}", added.join(", "));
    }
    eprintln!();
    eprintln!("edit this file to configure kdoc");
    eprintln!("or run `kdoc generate` to build docs");

    return Ok(());
}

/// Scan sources, extract docs, resolve cross-links, write markdown.
///
/// # Errors
///
/// Returns config, layout, and scan errors, and the fatal
/// no-files/nothing-parsed conditions.
pub fn generate(options: &Options) -> Result<(), error::Error> {
    let summary = generate::run(options)?;

    let skipped = summary.matched.saturating_sub(summary.parsed);
    if skipped > 0 {
        eprintln!("{skipped} of {} files could not be read", summary.matched);
    }
    eprintln!("Wrote {} of {} pages", summary.written, summary.parsed);

    return Ok(());
}
