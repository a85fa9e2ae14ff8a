//! Markdown pages for scanned files.

use std::fmt::Write as _;

use crate::backlinks::anchor;
use crate::git::{self, FileInfo, RepoInfo};
use crate::types::SourceFile;

/// Commit subjects longer than this are cut.
const MAX_SUBJECT_CHARS: usize = 60;

/// Length of a truncated subject before the ellipsis.
const TRUNCATED_SUBJECT_CHARS: usize = 57;

/// Render the documentation page for one file.
///
/// The git card is included only when the file carries history and `repo`
/// is a detected repository.
pub fn render_page(file: &SourceFile, repo: Option<&RepoInfo>, avatar_size: u32) -> String {
    let mut out = String::new();
    let base = file
        .path
        .file_name()
        .map_or_else(String::new, |n| return n.to_string_lossy().into_owned());
    let _ = write!(out, "# {base}\n\n");

    if let (Some(info), Some(repo)) = (&file.git, repo)
        && repo.is_repo
    {
        out.push_str(&render_git_card(info, repo, avatar_size));
    }

    if !file.module_desc.is_empty() {
        let _ = write!(out, "{}\n\n", file.module_desc);
    }

    if !file.elements.is_empty() {
        out.push_str("## Table of Contents\n\n");
        for element in &file.elements {
            let link_text = if element.signature.is_empty() {
                element.id.clone()
            } else {
                format!("{} `{}`", element.id, toc_signature(&element.signature))
            };
            let _ = writeln!(out, "- [{link_text}](#{})", anchor(&element.id));
        }
        out.push('\n');
    }

    for element in &file.elements {
        let _ = write!(out, "#### {}\n\n", element.id);
        if !element.description.is_empty() {
            let _ = write!(out, "{}\n\n", element.description);
        }
        let _ = write!(out, "```{}\n{}\n```\n\n", file.language, element.signature);
    }

    return out;
}

/// First line of a signature, without a trailing `{`.
fn toc_signature(signature: &str) -> &str {
    let first = signature.trim().lines().next().unwrap_or("");
    return first.strip_suffix('{').unwrap_or(first).trim();
}

/// HTML table with last update, repository, branch, history, and contributors.
fn render_git_card(info: &FileInfo, repo: &RepoInfo, avatar_size: u32) -> String {
    let mut out = String::new();
    out.push_str("<div>\n\n### File Information\n\n<table>\n<tr>\n<td>\n");

    let short: String = info.last_commit_hash.chars().take(7).collect();
    out.push_str("<strong>Last Update</strong><br/>\n");
    match git::commit_url(repo, &info.last_commit_hash) {
        Some(url) => {
            let _ = writeln!(out, "<a href=\"{url}\"><code>{short}</code></a><br/>");
        },
        None => {
            let _ = writeln!(out, "<code>{short}</code><br/>");
        },
    }
    let _ = writeln!(out, "<small>{}</small><br/>", escape_html(&info.last_commit_date));
    if !info.last_author_name.is_empty() {
        let _ = writeln!(out, "<small>by {}</small><br/>", escape_html(&info.last_author_name));
    }
    if !info.last_commit_message.is_empty() {
        let subject = truncate_subject(&info.last_commit_message);
        let _ = writeln!(out, "<em>{}</em>", escape_html(&subject));
    }
    out.push_str("</td>\n<td>\n");

    if !repo.owner.is_empty() && !repo.name.is_empty() {
        out.push_str("<strong>Repository</strong><br/>\n");
        if let Some(url) = git::file_url(repo, &info.last_commit_hash, &info.rel_path) {
            let _ = writeln!(out, "<a href=\"{url}\">{}/{}</a><br/>", repo.owner, repo.name);
        }
    }
    if !repo.branch.is_empty() {
        let _ = writeln!(out, "<strong>Branch:</strong> <code>{}</code><br/>", escape_html(&repo.branch));
    }
    if info.total_commits > 0 {
        let _ = writeln!(out, "<strong>History:</strong> {} commits", info.total_commits);
    }
    out.push_str("</td>\n</tr>\n");

    if !info.authors.is_empty() {
        out.push_str("<tr>\n<td colspan=\"2\">\n<strong>Contributors</strong><br/>\n<div>\n");
        for author in &info.authors {
            let avatar = git::avatar_url(repo, author, avatar_size);
            let name = escape_html(&author.name);
            out.push_str("<div>\n");
            let _ = writeln!(out, "<img src=\"{avatar}\" alt=\"{name}\" width=\"32\" height=\"32\" />");
            let _ = writeln!(out, "<span>{name}</span>");
            out.push_str("</div>\n");
        }
        out.push_str("</div>\n</td>\n</tr>\n");
    }

    out.push_str("</table>\n\n</div>\n\n");
    return out;
}

/// Cut subjects over 60 characters to 57 plus `...`.
fn truncate_subject(subject: &str) -> String {
    if subject.chars().count() <= MAX_SUBJECT_CHARS {
        return subject.to_string();
    }
    let mut cut: String = subject.chars().take(TRUNCATED_SUBJECT_CHARS).collect();
    cut.push_str("...");
    return cut;
}

/// Escape text placed inside HTML elements or attributes.
fn escape_html(text: &str) -> String {
    return text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
}
