//! Crate-level error types for kdoc.
use std::path::PathBuf;

/// Errors surfaced by the collaborators around the extraction engine.
///
/// The engine itself never fails: missing comments, signatures, or names
/// degrade silently. Everything here is about reading, writing, and the
/// outside world.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A source file exists but could not be read as text.
    #[error("cannot read {}: {source}", path.display())]
    FileRead {
        /// File that failed to read.
        path: PathBuf,
        /// The wrapped I/O error.
        source: std::io::Error,
    },

    /// A `git` invocation failed or produced unusable output.
    #[error("git {args}: {reason}")]
    Git {
        /// Space-joined arguments passed to `git`.
        args: String,
        /// Stderr or a description of what was wrong with the output.
        reason: String,
    },

    /// An exclusion pattern in the config is not a valid glob.
    #[error("invalid exclusion pattern `{pattern}`: {source}")]
    Glob {
        /// The offending pattern as written in the config.
        pattern: String,
        /// The wrapped pattern error.
        source: glob::PatternError,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// The scan found no file with a configured extension.
    #[error("no files matched extensions in {}\nconfigured extensions: {}", root.display(), extensions.join(", "))]
    NoFilesMatched {
        /// Configured extensions, sorted.
        extensions: Vec<String>,
        /// Absolute scan root that was walked.
        root: PathBuf,
    },

    /// Files were found but every one of them failed to read.
    #[error("none of the {matched} matched files could be processed")]
    NothingParsed {
        /// Number of files the scan collected.
        matched: usize,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// An existing config could not be parsed for in-place editing.
    #[error("cannot edit {}: {reason}", path.display())]
    TomlEdit {
        /// Config file being edited.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// TOML serialization failed.
    #[error("toml serialize: {0}")]
    TomlSer(
        /// The wrapped TOML serialization error.
        #[from]
        toml::ser::Error,
    ),

    /// The filesystem watcher could not be set up.
    #[error("watch: {0}")]
    Watch(
        /// The wrapped notify error.
        #[from]
        notify::Error,
    ),
}
