//! Core records produced by a scan: files, their elements, and git metadata.
use std::path::PathBuf;

use crate::git::FileInfo;

/// One scanned source file.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Documented elements in source order.
    pub elements: Vec<Element>,
    /// Commit metadata attached by the generator, never by the parser.
    pub git: Option<FileInfo>,
    /// Language tag used for fenced code blocks (e.g. `cpp`).
    pub language: String,
    /// Leading comment run of the file, prefix-stripped. May be empty.
    pub module_desc: String,
    /// Path the file was read from.
    pub path: PathBuf,
}

/// A doc-comment block paired with the line that follows it.
///
/// `id` is a heuristic and not unique: two overloads of `add` both get `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Markdown text of the comment block, lines joined with `\n`.
    pub description: String,
    /// Name used for the heading, anchor, and link index key.
    pub id: String,
    /// Trimmed signature line without a trailing `{`. Empty if none was found.
    pub signature: String,
}
