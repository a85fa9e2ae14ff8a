//! Doc-comment line recognition. Purely prefix based: no language knowledge.

/// How doc comments look in the scanned sources.
#[derive(Debug, Clone)]
pub struct CommentStyle {
    /// When set, doc lines indented under other code are skipped while
    /// searching for the start of a run.
    pub ignore_indented: bool,
    /// Marker that opens a doc-comment line, e.g. `///`.
    pub prefix: String,
}

impl Default for CommentStyle {
    fn default() -> Self {
        return Self {
            ignore_indented: false,
            prefix: "///".to_string(),
        };
    }
}

impl CommentStyle {
    /// Build a style from a prefix and the indentation policy.
    pub fn new(prefix: impl Into<String>, ignore_indented: bool) -> Self {
        return Self {
            ignore_indented,
            prefix: prefix.into(),
        };
    }

    /// Basic membership test: the trimmed line starts with the prefix.
    pub fn is_doc_line(&self, line: &str) -> bool {
        return line.trim().starts_with(self.prefix.as_str());
    }

    /// True for a doc line whose prefix sits after leading whitespace.
    ///
    /// Only the first occurrence of the prefix is considered, so
    /// `    /// x` is indented while `/// x` is not.
    pub fn is_indented_doc_line(&self, line: &str) -> bool {
        let Some(pos) = line.find(self.prefix.as_str()) else {
            return false;
        };
        if pos == 0 {
            return false;
        }
        return line.get(..pos).is_some_and(|lead| return lead.trim().is_empty());
    }

    /// Whether boundary search must step over this doc line instead of
    /// treating it as part of a run. Interior collection never asks this.
    pub fn excluded_at_boundary(&self, line: &str) -> bool {
        return self.ignore_indented && self.is_indented_doc_line(line);
    }

    /// Content of a doc line: trimmed, prefix removed, then at most one space.
    ///
    /// Lines that do not carry the prefix come back trimmed and otherwise
    /// untouched; callers only pass lines that passed `is_doc_line`.
    pub fn strip<'a>(&self, line: &'a str) -> &'a str {
        let trimmed = line.trim();
        let Some(content) = trimmed.strip_prefix(self.prefix.as_str()) else {
            return trimmed;
        };
        return content.strip_prefix(' ').unwrap_or(content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_line_ignores_surrounding_whitespace() {
        let style = CommentStyle::default();
        assert!(style.is_doc_line("/// hello"));
        assert!(style.is_doc_line("    /// hello   "));
        assert!(style.is_doc_line("///"));
        assert!(!style.is_doc_line("// plain comment"));
        assert!(!style.is_doc_line("int x; /// trailing"));
    }

    #[test]
    fn strip_removes_only_one_space() {
        let style = CommentStyle::default();
        assert_eq!(style.strip("/// text"), "text");
        assert_eq!(style.strip("///   indented code"), "  indented code");
        assert_eq!(style.strip("///text"), "text");
        assert_eq!(style.strip("  ///  "), "");
    }

    #[test]
    fn indentation_only_counts_leading_whitespace() {
        let style = CommentStyle::new("///", true);
        assert!(style.is_indented_doc_line("    /// nested"));
        assert!(style.is_indented_doc_line("\t/// nested"));
        assert!(!style.is_indented_doc_line("/// top level"));
        assert!(!style.is_indented_doc_line("x = 1; /// not a doc line"));
    }

    #[test]
    fn boundary_exclusion_requires_policy() {
        let lenient = CommentStyle::new("///", false);
        let strict = CommentStyle::new("///", true);
        assert!(!lenient.excluded_at_boundary("    /// nested"));
        assert!(strict.excluded_at_boundary("    /// nested"));
        assert!(!strict.excluded_at_boundary("/// top level"));
    }

    #[test]
    fn custom_prefix() {
        let style = CommentStyle::new("##", false);
        assert!(style.is_doc_line("## Section"));
        assert_eq!(style.strip("## Section"), "Section");
        assert!(!style.is_doc_line("# heading"));
    }
}
