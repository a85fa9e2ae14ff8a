//! File watcher: generates on startup, then regenerates on source changes.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands;
use crate::config::{CONFIG_FILE, Config};
use crate::error;
use crate::generate::{Layout, Options};

/// Debounce delay between filesystem events and regeneration.
const DEBOUNCE_MS: u64 = 100;

/// Decides which changed paths warrant a rebuild.
struct Relevance {
    /// Config in effect when watching started.
    config: Config,
    /// Generated pages; our own writes land here.
    output_dir: PathBuf,
    /// Whether pages under the output directory are themselves sources.
    recurse_output: bool,
}

impl Relevance {
    /// A change to a configured source file or to `kdoc.toml`.
    fn is_relevant(&self, path: &Path) -> bool {
        if !self.recurse_output && path.starts_with(&self.output_dir) {
            return false;
        }
        if is_config_file(path) {
            return true;
        }
        return self.config.language_for(path).is_some();
    }

    /// Reload the config from `project_root` if any of `paths` is `kdoc.toml`.
    ///
    /// A config that fails to load keeps the previous one in effect.
    fn refresh(&mut self, project_root: &Path, paths: &[PathBuf]) {
        if !paths.iter().any(|p| return is_config_file(p)) {
            return;
        }
        match Config::load(project_root) {
            Ok(config) => self.config = config,
            Err(e) => tracing::warn!("keeping previous watch filter, cannot reload config: {e}"),
        }
    }
}

/// Whether `path` names the config file.
fn is_config_file(path: &Path) -> bool {
    return path.file_name().is_some_and(|n| return n == CONFIG_FILE);
}

/// Create a filesystem watcher that forwards changed paths on the channel.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<Vec<PathBuf>>,
) -> Result<notify::RecommendedWatcher, error::Error> {
    let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
        {
            let _ = tx.send(event.paths);
        }
    })?;
    return Ok(watcher);
}

/// Entry point for the watch command.
///
/// Runs an initial generation, then watches the scan root (and the project
/// root, for `kdoc.toml`) and regenerates after each burst of changes.
///
/// # Errors
///
/// Returns errors from config loading, layout resolution, or watcher setup.
pub fn run(options: &Options) -> Result<ExitCode, error::Error> {
    let project_root = options.project_root()?;
    let config = Config::load(&project_root)?;
    let layout = Layout::resolve(options, &project_root, &config)?;

    tracing::info!("watch: initial generate");
    let mut last_code = run_generate(options);

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx)?;
    watcher.watch(&layout.scan_root, RecursiveMode::Recursive)?;
    if !layout.scan_root.starts_with(&layout.project_root) {
        watcher.watch(&layout.project_root, RecursiveMode::NonRecursive)?;
    }

    let mut relevance = Relevance {
        config,
        output_dir: layout.output_dir.clone(),
        recurse_output: options.recurse_scan,
    };
    eprintln!(
        "watch: monitoring {}, press Ctrl+C to stop",
        layout.scan_root.display()
    );

    while let Ok(mut changed) = rx.recv() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while let Ok(more) = rx.recv_timeout(debounce) {
            changed.extend(more);
        }
        relevance.refresh(&layout.project_root, &changed);
        if !changed.iter().any(|p| return relevance.is_relevant(p)) {
            continue;
        }
        tracing::info!("watch: change detected, regenerating");
        last_code = run_generate(options);
    }

    return Ok(last_code);
}

/// Generate once and report. Returns the exit code generate would have.
fn run_generate(options: &Options) -> ExitCode {
    return match commands::generate(options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    };
}
