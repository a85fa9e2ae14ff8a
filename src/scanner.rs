use std::path::{Component, Path, PathBuf};

use glob::{MatchOptions, Pattern};
use walkdir::{DirEntry, WalkDir};

use crate::config::{CONFIG_FILE, Config};
use crate::error::Error;

/// `*` stays within one path segment, `**` crosses them.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_leading_dot: false,
    require_literal_separator: true,
};

/// A source file selected for documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// Language tag from `extensions_to_langs`.
    pub language: String,
    /// Absolute path on disk.
    pub path: PathBuf,
}

/// What to skip while walking.
struct Exclusions {
    /// Config file, never documented.
    config_file: PathBuf,
    /// Generated docs, skipped unless recursing into them is requested.
    output_dir: Option<PathBuf>,
    /// User globs.
    patterns: Vec<Pattern>,
}

impl Exclusions {
    /// Whether a walked entry (file or directory) is excluded.
    fn excludes(&self, scan_root: &Path, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        let path = entry.path();
        if path == self.config_file {
            return true;
        }
        if self.output_dir.as_deref().is_some_and(|out| return path.starts_with(out)) {
            return true;
        }
        let rel = to_slash(path.strip_prefix(scan_root).unwrap_or(path));
        return self
            .patterns
            .iter()
            .any(|p| return p.matches_with(&rel, MATCH_OPTIONS));
    }
}

/// Walk `scan_root` and return every file with a configured extension,
/// in file-name order.
///
/// Symlinked files are collected by their link path, including dangling
/// links, so unreadable entries surface as read failures later.
///
/// Directories matching an exclusion glob are pruned. `output_dir` is
/// skipped unless `recurse_output` is set.
///
/// # Errors
///
/// Returns `Error::Glob` if an exclusion pattern is invalid.
pub fn collect_files(
    project_root: &Path,
    scan_root: &Path,
    output_dir: &Path,
    config: &Config,
    recurse_output: bool,
) -> Result<Vec<ScanTarget>, Error> {
    let patterns = config
        .scan_exclusions
        .iter()
        .map(|raw| {
            let pattern = raw.replace('\\', "/");
            return Pattern::new(&pattern).map_err(|source| {
                return Error::Glob {
                    pattern: raw.clone(),
                    source,
                };
            });
        })
        .collect::<Result<Vec<_>, _>>()?;

    let exclusions = Exclusions {
        config_file: project_root.join(CONFIG_FILE),
        output_dir: (!recurse_output).then(|| return output_dir.to_path_buf()),
        patterns,
    };

    let mut targets = Vec::new();
    let walker = WalkDir::new(scan_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| return !exclusions.excludes(scan_root, e));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("walk error: {e}");
                continue;
            },
        };
        // Symlinks are not followed by the walk; a linked file still counts,
        // a linked directory does not.
        if entry.path().is_dir() {
            continue;
        }
        let Some(language) = config.language_for(entry.path()) else {
            continue;
        };
        targets.push(ScanTarget {
            language: language.to_string(),
            path: entry.into_path(),
        });
    }

    return Ok(targets);
}

/// Page path for a source file: same relative location under `out_dir`,
/// extension replaced by `.md`.
pub fn output_path_for(scan_root: &Path, file: &Path, out_dir: &Path) -> PathBuf {
    let rel = file.strip_prefix(scan_root).unwrap_or(file);
    return out_dir.join(rel).with_extension("md");
}

/// Forward-slash rendering of a path, for globs and display.
pub fn to_slash(path: &Path) -> String {
    return path
        .components()
        .map(|c| return c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
}

/// Make `path` absolute and collapse `.` and `..` without touching the
/// filesystem. Preserves leading `..` when there is nothing left to pop.
///
/// # Errors
///
/// Returns `Error::Io` if the current directory cannot be determined.
pub fn absolute(path: &Path) -> Result<PathBuf, Error> {
    return Ok(normalize_path(&std::path::absolute(path)?));
}

/// Collapse `.` and `..` components lexically.
fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                let can_pop = matches!(
                    components.last(),
                    Some(c) if matches!(c, Component::Normal(_))
                );
                if can_pop {
                    components.pop();
                } else {
                    components.push(component);
                }
            },
            other => components.push(other),
        }
    }
    return components.iter().collect();
}
