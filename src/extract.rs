//! Line-oriented extraction of module descriptions and documented elements.
//!
//! A file is a stream of lines. The leading doc-comment run is the module
//! description; every later run becomes an element paired with the first
//! non-blank, non-comment line after it.
//!
//! Indentation exclusion is applied only while searching for where a run
//! starts. Once a run is being collected, indented doc lines are part of it.

use std::path::Path;

use crate::comment::CommentStyle;
use crate::ident;
use crate::types::{Element, SourceFile};

/// Split file text into lines on `\n` only.
///
/// A trailing newline produces a trailing empty line. Carriage returns stay
/// attached and disappear when lines are trimmed.
pub fn split_lines(text: &str) -> Vec<&str> {
    return text.split('\n').collect();
}

/// Consume the leading doc-comment run of a file.
///
/// Stops at the first line that is not a doc line. With `ignore_indented`,
/// indented doc lines inside the run are skipped without ending it.
/// Returns the joined description and the unconsumed lines, starting at the
/// line that ended the run.
pub fn extract_module_description<'a, 'l>(
    lines: &'l [&'a str],
    style: &CommentStyle,
) -> (String, &'l [&'a str]) {
    let mut desc: Vec<&str> = Vec::new();
    let mut i = 0_usize;

    while let Some(&line) = lines.get(i) {
        if !style.is_doc_line(line) {
            break;
        }
        i = i.saturating_add(1);
        if style.excluded_at_boundary(line) {
            continue;
        }
        desc.push(style.strip(line));
    }

    let rest = lines.get(i..).unwrap_or_default();
    return (desc.join("\n"), rest);
}

/// Find every documented element in `lines`, in source order.
pub fn extract_elements(lines: &[&str], style: &CommentStyle) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    let mut i = 0_usize;

    while let Some(&line) = lines.get(i) {
        // Seek the start of the next run.
        if !style.is_doc_line(line) || style.excluded_at_boundary(line) {
            i = i.saturating_add(1);
            continue;
        }

        // Interior collection: plain prefix test, no indentation check.
        let mut desc: Vec<&str> = Vec::new();
        while let Some(&line) = lines.get(i) {
            if !style.is_doc_line(line) {
                break;
            }
            desc.push(style.strip(line));
            i = i.saturating_add(1);
        }

        if desc.is_empty() {
            continue;
        }

        // Blank separators and stray doc lines between the run and the code.
        while lines
            .get(i)
            .is_some_and(|l| return l.trim().is_empty() || style.is_doc_line(l))
        {
            i = i.saturating_add(1);
        }

        let mut signature = String::new();
        if let Some(&line) = lines.get(i)
            && !line.trim().is_empty()
        {
            signature = clean_signature(line);
            i = i.saturating_add(1);
        }

        let derived = ident::derive_or_synthesize(&signature, elements.len());
        tracing::trace!(id = %derived.name, rule = ?derived.rule, "element");
        elements.push(Element {
            description: desc.join("\n"),
            id: derived.name,
            signature,
        });
    }

    return elements;
}

/// Trim a signature line and drop one trailing `{` with the whitespace before it.
pub fn clean_signature(line: &str) -> String {
    let trimmed = line.trim();
    let Some(without_brace) = trimmed.strip_suffix('{') else {
        return trimmed.to_string();
    };
    return without_brace.trim_end().to_string();
}

/// Run the full per-file extraction over already-loaded text.
pub fn parse_source(path: &Path, language: &str, text: &str, style: &CommentStyle) -> SourceFile {
    let lines = split_lines(text);
    let (module_desc, rest) = extract_module_description(&lines, style);
    let elements = extract_elements(rest, style);

    tracing::debug!(
        path = %path.display(),
        elements = elements.len(),
        has_module_desc = !module_desc.is_empty(),
        "parsed"
    );

    return SourceFile {
        elements,
        git: None,
        language: language.to_string(),
        module_desc,
        path: path.to_path_buf(),
    };
}
