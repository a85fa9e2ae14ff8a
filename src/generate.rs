//! The generate pipeline: scan, parse, index, resolve, write.
//!
//! Parsing and backlink resolution run one task per file on the rayon pool.
//! The link index is built in between, sequentially, once every file is
//! parsed, since a later file may define what an earlier one references.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::backlinks::{self, LinkIndex};
use crate::comment::CommentStyle;
use crate::config::Config;
use crate::error::Error;
use crate::extract;
use crate::git::{FileInfo, RepoInfo};
use crate::render;
use crate::scanner::{self, ScanTarget};
use crate::types::SourceFile;

/// Command-line switches that shape a run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Skip all git metadata.
    pub no_git: bool,
    /// Output directory override, relative to the working directory.
    pub output: Option<PathBuf>,
    /// Also document files inside the output directory.
    pub recurse_scan: bool,
    /// Directory holding `kdoc.toml`; the working directory if unset.
    pub root: Option<PathBuf>,
}

impl Options {
    /// Project root as given, or the working directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the working directory cannot be read.
    pub fn project_root(&self) -> Result<PathBuf, Error> {
        return match &self.root {
            Some(root) => Ok(root.clone()),
            None => Ok(std::env::current_dir()?),
        };
    }
}

/// Resolved, absolute directories for one run.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Where pages are written. Exists once resolved.
    pub output_dir: PathBuf,
    /// Directory holding `kdoc.toml`.
    pub project_root: PathBuf,
    /// Directory that is walked for sources.
    pub scan_root: PathBuf,
}

impl Layout {
    /// Resolve the directories for a run and create the output directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a directory does not exist or cannot be created.
    pub fn resolve(options: &Options, project_root: &Path, config: &Config) -> Result<Self, Error> {
        let project_root = project_root.canonicalize()?;
        let scan_root = config.scan_root_in(&project_root).canonicalize()?;
        let output_dir = match &options.output {
            Some(out) => scanner::absolute(out)?,
            None => scanner::absolute(&config.output_dir_in(&project_root))?,
        };
        std::fs::create_dir_all(&output_dir)?;
        let output_dir = output_dir.canonicalize()?;

        return Ok(Self {
            output_dir,
            project_root,
            scan_root,
        });
    }

    /// Page path for a source file.
    pub fn page_path(&self, source: &Path) -> PathBuf {
        return scanner::output_path_for(&self.scan_root, source, &self.output_dir);
    }

    /// Source path relative to the scan root, forward slashes.
    pub fn display_path(&self, source: &Path) -> String {
        return scanner::to_slash(source.strip_prefix(&self.scan_root).unwrap_or(source));
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    /// Files the scan collected.
    pub matched: usize,
    /// Files parsed successfully.
    pub parsed: usize,
    /// Pages written.
    pub written: usize,
}

/// Load config, lay out directories, and run the whole pipeline.
///
/// # Errors
///
/// Returns config and layout errors, `Error::NoFilesMatched` if nothing has
/// a configured extension, or `Error::NothingParsed` if every read failed.
pub fn run(options: &Options) -> Result<Summary, Error> {
    let project_root = options.project_root()?;
    let config = Config::load(&project_root)?;
    let layout = Layout::resolve(options, &project_root, &config)?;
    return run_with(options, &config, &layout);
}

/// Run the pipeline with an already resolved config and layout.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(options: &Options, config: &Config, layout: &Layout) -> Result<Summary, Error> {
    let repo = detect_repo(options, layout);

    let targets = scanner::collect_files(
        &layout.project_root,
        &layout.scan_root,
        &layout.output_dir,
        config,
        options.recurse_scan,
    )?;
    if targets.is_empty() {
        return Err(Error::NoFilesMatched {
            extensions: config.extensions(),
            root: layout.scan_root.clone(),
        });
    }
    tracing::info!(files = targets.len(), root = %layout.scan_root.display(), "scanning");

    let style = config.comment_style();
    let mut files = parse_all(&targets, &style, layout);
    if files.is_empty() {
        return Err(Error::NothingParsed {
            matched: targets.len(),
        });
    }

    if let Some(repo) = &repo {
        attach_git_info(&mut files, repo, layout);
    }

    let index = LinkIndex::build(&files, |f| return page_name(layout, &f.path));
    if index.is_empty() {
        tracing::info!("no documented elements found");
    } else {
        tracing::info!(identifiers = index.len(), "built link index");
    }

    files.par_iter_mut().for_each(|f| {
        backlinks::resolve_file(f, &index, &config.doc_comment);
    });

    let written = write_pages(&files, repo.as_ref(), config, layout);

    return Ok(Summary {
        matched: targets.len(),
        parsed: files.len(),
        written,
    });
}

/// Detect the repository once, unless git support is off.
fn detect_repo(options: &Options, layout: &Layout) -> Option<RepoInfo> {
    if options.no_git {
        return None;
    }
    let repo = RepoInfo::detect(&layout.scan_root);
    if !repo.is_repo {
        tracing::info!("not a git repository, skipping git metadata");
        return None;
    }
    if repo.owner.is_empty() {
        tracing::info!(branch = %repo.branch, "git repository detected");
    } else {
        tracing::info!(
            owner = %repo.owner,
            name = %repo.name,
            branch = %repo.branch,
            remote = %repo.remote_url,
            "git repository detected"
        );
    }
    return Some(repo);
}

/// Read and parse every target. Unreadable files are logged and dropped.
///
/// Output order matches `targets`.
fn parse_all(targets: &[ScanTarget], style: &CommentStyle, layout: &Layout) -> Vec<SourceFile> {
    return targets
        .par_iter()
        .filter_map(|target| {
            tracing::debug!(file = %layout.display_path(&target.path), "processing");
            return match read_source(target, style) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!("skipping {}: {e}", layout.display_path(&target.path));
                    None
                },
            };
        })
        .collect();
}

/// Read one target and run the extraction engine over it.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Errors
///
/// Returns `Error::FileRead` if the file cannot be read.
pub fn read_source(target: &ScanTarget, style: &CommentStyle) -> Result<SourceFile, Error> {
    let bytes = std::fs::read(&target.path).map_err(|source| {
        return Error::FileRead {
            path: target.path.clone(),
            source,
        };
    })?;
    let text = String::from_utf8_lossy(&bytes);
    return Ok(extract::parse_source(&target.path, &target.language, &text, style));
}

/// Attach per-file commit history. Files without history keep `git: None`.
fn attach_git_info(files: &mut [SourceFile], repo: &RepoInfo, layout: &Layout) {
    files.par_iter_mut().for_each(|file| {
        let rel = match file.path.strip_prefix(&repo.git_root) {
            Ok(rel) => scanner::to_slash(rel),
            Err(_) => layout.display_path(&file.path),
        };
        match FileInfo::load(repo, &rel) {
            Ok(info) => file.git = Some(info),
            Err(e) => tracing::warn!("no git info for {rel}: {e}"),
        }
    });
}

/// Base name of the page generated for `source`, used in link locations.
fn page_name(layout: &Layout, source: &Path) -> String {
    return layout
        .page_path(source)
        .file_name()
        .map_or_else(String::new, |n| return n.to_string_lossy().into_owned());
}

/// Render and write every page. Failures are logged; returns pages written.
fn write_pages(files: &[SourceFile], repo: Option<&RepoInfo>, config: &Config, layout: &Layout) -> usize {
    let mut written = 0_usize;
    for file in files {
        let page_path = layout.page_path(&file.path);
        if let Some(dir) = page_path.parent()
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            tracing::warn!("cannot create {}: {e}", dir.display());
            continue;
        }

        tracing::debug!(page = %page_path.display(), "writing");
        let content = render::render_page(file, repo, config.git_avatar_size);
        match std::fs::write(&page_path, content) {
            Ok(()) => written = written.saturating_add(1),
            Err(e) => tracing::warn!("cannot write {}: {e}", page_path.display()),
        }
    }
    return written;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (rel, content) in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
        return dir;
    }

    fn options(dir: &tempfile::TempDir) -> Options {
        return Options {
            no_git: true,
            root: Some(dir.path().to_path_buf()),
            ..Options::default()
        };
    }

    #[test]
    fn links_resolve_across_files() {
        let dir = project(&[
            ("shapes.hpp", "/// Shapes.\n\n/// A [Point] holder.\nclass Widget {\n"),
            ("geo/point.cpp", "int x;\n/// Used by [Widget].\nstruct Point {\n"),
        ]);
        let summary = run(&options(&dir)).unwrap();
        assert_eq!(
            summary,
            Summary {
                matched: 2,
                parsed: 2,
                written: 2,
            }
        );

        let shapes = std::fs::read_to_string(dir.path().join("docs/shapes.md")).unwrap();
        assert!(shapes.contains("A [Point](point.md#point) holder."));
        let point = std::fs::read_to_string(dir.path().join("docs/geo/point.md")).unwrap();
        assert!(point.contains("Used by [Widget](shapes.md#widget)."));
    }

    #[test]
    fn no_matching_files_is_fatal() {
        let dir = project(&[("readme.rs", "/// nope\nfn main() {}\n")]);
        let err = run(&options(&dir)).unwrap_err();
        assert!(matches!(err, Error::NoFilesMatched { .. }));
    }

    #[test]
    fn output_override_and_generated_pages_not_rescanned() {
        let dir = project(&[("a.c", "/// A.\nint a();\n")]);
        let out = dir.path().join("site");
        let opts = Options {
            output: Some(out.clone()),
            ..options(&dir)
        };
        run(&opts).unwrap();
        assert!(out.join("a.md").exists());
        assert!(!dir.path().join("docs").exists());

        // A source-looking file inside the output dir is ignored by default.
        std::fs::write(out.join("junk.c"), "/// Junk.\nint junk();\n").unwrap();
        assert_eq!(run(&opts).unwrap().matched, 1);

        let recursing = Options {
            recurse_scan: true,
            ..opts
        };
        assert_eq!(run(&recursing).unwrap().matched, 2);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_files_are_skipped() {
        let dir = project(&[("a.c", "/// A.\nint a();\n")]);
        std::os::unix::fs::symlink(dir.path().join("missing.c"), dir.path().join("b.c")).unwrap();

        let summary = run(&options(&dir)).unwrap();
        assert_eq!(
            summary,
            Summary {
                matched: 2,
                parsed: 1,
                written: 1,
            }
        );
        assert!(dir.path().join("docs/a.md").exists());
        assert!(!dir.path().join("docs/b.md").exists());
    }

    #[cfg(unix)]
    #[test]
    fn nothing_readable_is_fatal() {
        let dir = project(&[]);
        std::os::unix::fs::symlink(dir.path().join("missing.c"), dir.path().join("only.c")).unwrap();

        let err = run(&options(&dir)).unwrap_err();
        assert!(matches!(err, Error::NothingParsed { matched: 1 }));
    }

    #[test]
    fn config_controls_prefix_and_extensions() {
        let dir = project(&[
            ("kdoc.toml", "doc_comment = \"##\"\n\n[extensions_to_langs]\n\".py\" = \"python\"\n"),
            ("tool.py", "## Tooling.\nimport os\n## Runs it.\ndef run(x):\n"),
        ]);
        run(&options(&dir)).unwrap();
        let page = std::fs::read_to_string(dir.path().join("docs/tool.md")).unwrap();
        assert!(page.starts_with("# tool.py\n\nTooling.\n\n"));
        assert!(page.contains("#### run\n\nRuns it.\n\n```python\ndef run(x):\n```"));
    }
}
