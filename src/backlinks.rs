//! Cross-file `[identifier]` links.
//!
//! The index is built once after every file is parsed and is read-only from
//! then on. Resolution is a plain text rewrite and is not idempotent: a
//! second pass over `[add](math.md#add)` matches `[add]` again.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::SourceFile;

/// A bracketed token: `[` then one or more non-`]` characters then `]`.
static BACKLINK: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"\[([^\]]+)\]").expect("valid regex"));

/// Heading anchor for an identifier: lowercase, spaces become hyphens.
///
/// Identifiers differing only in case share an anchor.
pub fn anchor(id: &str) -> String {
    return id.replace(' ', "-").to_lowercase();
}

/// Identifier to `<page>#<anchor>` locations, snapshotted after parsing.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    /// Identifier to location.
    locations: HashMap<String, String>,
}

impl LinkIndex {
    /// Index every element of every file.
    ///
    /// `page_name` returns the base name of the page generated for a file.
    /// When two elements share an identifier the one scanned last wins.
    pub fn build<F>(files: &[SourceFile], page_name: F) -> Self
    where
        F: Fn(&SourceFile) -> String,
    {
        let mut locations = HashMap::new();
        for file in files {
            let page = page_name(file);
            for element in &file.elements {
                let location = format!("{page}#{}", anchor(&element.id));
                locations.insert(element.id.clone(), location);
            }
        }
        return Self { locations };
    }

    /// Location for an identifier, if indexed.
    pub fn get(&self, id: &str) -> Option<&str> {
        return self.locations.get(id).map(String::as_str);
    }

    /// Number of distinct identifiers.
    pub fn len(&self) -> usize {
        return self.locations.len();
    }

    /// True if nothing was indexed.
    pub fn is_empty(&self) -> bool {
        return self.locations.is_empty();
    }
}

/// Rewrite `[id]` to `[id](location)` for every indexed `id`.
///
/// Unknown tokens are left byte-for-byte. `_prefix` is the doc-comment
/// prefix; it plays no part in matching.
pub fn resolve(desc: &str, index: &LinkIndex, _prefix: &str) -> String {
    return BACKLINK
        .replace_all(desc, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| return m.as_str());
            let Some(target) = caps.get(1).map(|m| return m.as_str()) else {
                return whole.to_string();
            };
            return match index.get(target) {
                Some(location) => format!("[{target}]({location})"),
                None => whole.to_string(),
            };
        })
        .into_owned();
}

/// Resolve the module description and every element description of a file.
pub fn resolve_file(file: &mut SourceFile, index: &LinkIndex, prefix: &str) {
    file.module_desc = resolve(&file.module_desc, index, prefix);
    for element in &mut file.elements {
        element.description = resolve(&element.description, index, prefix);
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::Element;

    impl FromIterator<(String, String)> for LinkIndex {
        fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
            return Self {
                locations: iter.into_iter().collect(),
            };
        }
    }

    fn index(pairs: &[(&str, &str)]) -> LinkIndex {
        return pairs
            .iter()
            .map(|(k, v)| return ((*k).to_string(), (*v).to_string()))
            .collect();
    }

    fn element(id: &str, description: &str) -> Element {
        return Element {
            description: description.to_string(),
            id: id.to_string(),
            signature: String::new(),
        };
    }

    #[test]
    fn known_tokens_become_links() {
        let idx = index(&[("add", "math.md#add")]);
        assert_eq!(
            resolve("See [add] and [missing].", &idx, "///"),
            "See [add](math.md#add) and [missing]."
        );
    }

    #[test]
    fn second_pass_links_again() {
        let idx = index(&[("add", "math.md#add")]);
        let once = resolve("[add]", &idx, "///");
        let twice = resolve(&once, &idx, "///");
        assert_eq!(once, "[add](math.md#add)");
        assert_eq!(twice, "[add](math.md#add)(math.md#add)");
    }

    #[test]
    fn empty_and_unclosed_brackets_untouched() {
        let idx = index(&[("add", "math.md#add")]);
        assert_eq!(resolve("[] [add", &idx, "///"), "[] [add");
        assert_eq!(resolve("arr[i]", &idx, "///"), "arr[i]");
    }

    #[test]
    fn anchors_are_lowercase_and_hyphenated() {
        assert_eq!(anchor("Widget"), "widget");
        assert_eq!(anchor("my thing"), "my-thing");
        assert_eq!(anchor("unnamed_0"), "unnamed_0");
    }

    #[test]
    fn build_uses_page_name_and_last_writer_wins() {
        let a = SourceFile {
            elements: vec![element("Widget", ""), element("add", "")],
            path: PathBuf::from("a.cpp"),
            ..SourceFile::default()
        };
        let b = SourceFile {
            elements: vec![element("add", "")],
            path: PathBuf::from("b.cpp"),
            ..SourceFile::default()
        };
        let files = vec![a, b];
        let idx = LinkIndex::build(&files, |f| {
            return f.path.with_extension("md").to_string_lossy().into_owned();
        });

        assert_eq!(idx.len(), 2);
        assert_eq!(idx.get("Widget"), Some("a.md#widget"));
        assert_eq!(idx.get("add"), Some("b.md#add"));
        assert_eq!(idx.get("missing"), None);
    }

    #[test]
    fn resolve_file_touches_module_and_elements() {
        let idx = index(&[("Widget", "w.md#widget")]);
        let mut file = SourceFile {
            elements: vec![element("f", "Makes a [Widget].")],
            module_desc: "Home of [Widget].".to_string(),
            ..SourceFile::default()
        };
        resolve_file(&mut file, &idx, "///");
        assert_eq!(file.module_desc, "Home of [Widget](w.md#widget).");
        assert_eq!(file.elements[0].description, "Makes a [Widget](w.md#widget).");
    }
}
