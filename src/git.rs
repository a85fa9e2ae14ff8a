//! Repository and per-file commit metadata, read through the `git` executable.
//!
//! Repository facts are gathered once per run into a `RepoInfo` snapshot
//! that callers pass around explicitly.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest as _, Sha256};

use crate::error::Error;

/// `https://host/owner/repo(.git)`.
static HTTPS_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^https?://([^/]+)/([^/]+)/([^/]+?)(?:\.git)?/?$").expect("valid regex");
});

/// `git@host:owner/repo(.git)`.
static SSH_REMOTE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(?:ssh://)?git@([^:/]+)[:/]([^/]+)/([^/]+?)(?:\.git)?/?$").expect("valid regex");
});

/// `   12\tJane Doe <jane@example.com>` lines from `git shortlog -sne`.
static SHORTLOG_LINE: LazyLock<Regex> =
    LazyLock::new(|| return Regex::new(r"^\s*\d+\s+(.+?)\s+<(.+?)>$").expect("valid regex"));

/// Hosting service behind the `origin` remote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// A host whose name contains `gitea`.
    Gitea,
    /// github.com.
    GitHub,
    /// gitlab.com.
    GitLab,
    /// Recognized URL shape, unrecognized host.
    Other,
    /// No remote, or a remote URL we could not parse.
    #[default]
    Unknown,
}

/// Repository-wide facts, detected once.
#[derive(Debug, Clone, Default)]
pub struct RepoInfo {
    /// Branch checked out at detection time.
    pub branch: String,
    /// Top-level directory of the work tree.
    pub git_root: PathBuf,
    /// Host part of the remote URL.
    pub host: String,
    /// Whether the scan root is inside a git work tree at all.
    pub is_repo: bool,
    /// Repository name from the remote URL.
    pub name: String,
    /// Owner (user or group) from the remote URL.
    pub owner: String,
    /// Hosting service.
    pub provider: Provider,
    /// Raw `remote.origin.url`.
    pub remote_url: String,
}

/// A contributor to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    /// Commit email.
    pub email: String,
    /// Commit author name.
    pub name: String,
}

/// History of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// Distinct contributors in shortlog order (most commits first).
    pub authors: Vec<Author>,
    /// Name of the last commit's author.
    pub last_author_name: String,
    /// Short date (`YYYY-MM-DD`) of the last commit touching the file.
    pub last_commit_date: String,
    /// Full hash of the last commit touching the file.
    pub last_commit_hash: String,
    /// Subject line of the last commit.
    pub last_commit_message: String,
    /// Path relative to the git root, forward slashes.
    pub rel_path: String,
    /// Commits touching the file, following renames.
    pub total_commits: usize,
}

/// Run `git -C <dir> <args>` and return trimmed stdout.
///
/// # Errors
///
/// Returns `Error::Git` if git cannot be spawned, exits non-zero, or
/// writes non-UTF-8 output.
fn run_git(dir: &Path, args: &[&str]) -> Result<String, Error> {
    let joined = args.join(" ");
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            return Error::Git {
                args: joined.clone(),
                reason: e.to_string(),
            };
        })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(Error::Git {
            args: joined,
            reason: stderr.trim().to_string(),
        });
    }

    let stdout = String::from_utf8(out.stdout).map_err(|_err| {
        return Error::Git {
            args: joined.clone(),
            reason: "output is not valid UTF-8".to_string(),
        };
    })?;
    return Ok(stdout.trim().to_string());
}

impl RepoInfo {
    /// Inspect the repository containing `path`.
    ///
    /// Never fails: outside a work tree, or without `git` on `PATH`, the
    /// result has `is_repo == false`.
    pub fn detect(path: &Path) -> Self {
        let mut info = Self::default();
        if run_git(path, &["rev-parse", "--git-dir"]).is_err() {
            return info;
        }
        info.is_repo = true;

        info.git_root = run_git(path, &["rev-parse", "--show-toplevel"])
            .map_or_else(|_err| return path.to_path_buf(), PathBuf::from);

        if let Ok(branch) = run_git(path, &["rev-parse", "--abbrev-ref", "HEAD"]) {
            info.branch = branch;
        }

        let Ok(remote) = run_git(path, &["config", "--get", "remote.origin.url"]) else {
            return info;
        };
        if let Some(parsed) = parse_remote_url(&remote) {
            info.provider = parsed.provider;
            info.host = parsed.host;
            info.owner = parsed.owner;
            info.name = parsed.name;
        }
        info.remote_url = remote;

        return info;
    }

    /// True when owner and name are known, which every URL helper needs.
    fn has_coordinates(&self) -> bool {
        return self.provider != Provider::Unknown && !self.owner.is_empty() && !self.name.is_empty();
    }
}

/// Pieces of a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Host name.
    pub host: String,
    /// Repository name without `.git`.
    pub name: String,
    /// Owning user or group.
    pub owner: String,
    /// Hosting service guessed from the host.
    pub provider: Provider,
}

/// Split an https or scp-style ssh remote into host, owner, and name.
pub fn parse_remote_url(url: &str) -> Option<Remote> {
    let url = url.trim();
    let caps = HTTPS_REMOTE.captures(url).or_else(|| return SSH_REMOTE.captures(url))?;
    let host = caps.get(1)?.as_str().to_string();
    let provider = if host.contains("github.com") {
        Provider::GitHub
    } else if host.contains("gitlab.com") {
        Provider::GitLab
    } else if host.contains("gitea") {
        Provider::Gitea
    } else {
        Provider::Other
    };

    return Some(Remote {
        name: caps.get(3)?.as_str().to_string(),
        owner: caps.get(2)?.as_str().to_string(),
        host,
        provider,
    });
}

impl FileInfo {
    /// Gather history for `rel_path` (relative to the git root).
    ///
    /// Only the last-commit query is required; commit counts and
    /// contributors are best effort.
    ///
    /// # Errors
    ///
    /// Returns `Error::Git` if the last commit cannot be read or the file
    /// has no history.
    pub fn load(repo: &RepoInfo, rel_path: &str) -> Result<Self, Error> {
        let root = repo.git_root.as_path();
        let last = run_git(
            root,
            &["log", "-1", "--format=%H|%an|%ad|%s", "--date=short", "--", rel_path],
        )?;
        let mut info = parse_last_commit(&last).ok_or_else(|| {
            return Error::Git {
                args: format!("log -1 -- {rel_path}"),
                reason: "no git history for file".to_string(),
            };
        })?;
        info.rel_path = rel_path.to_string();

        if let Ok(log) = run_git(root, &["log", "--follow", "--oneline", "--", rel_path]) {
            info.total_commits = log.lines().filter(|l| return !l.trim().is_empty()).count();
        }

        if let Ok(shortlog) = run_git(root, &["shortlog", "-sne", "HEAD", "--", rel_path]) {
            info.authors = parse_shortlog(&shortlog);
        }

        return Ok(info);
    }
}

/// Parse `%H|%an|%ad|%s`. The subject may itself contain `|`.
fn parse_last_commit(line: &str) -> Option<FileInfo> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let mut parts = line.splitn(4, '|');
    return Some(FileInfo {
        last_commit_hash: parts.next()?.to_string(),
        last_author_name: parts.next()?.to_string(),
        last_commit_date: parts.next()?.to_string(),
        last_commit_message: parts.next()?.to_string(),
        ..FileInfo::default()
    });
}

/// Contributors from `git shortlog -sne`, one per email, first seen wins.
fn parse_shortlog(output: &str) -> Vec<Author> {
    let mut authors: Vec<Author> = Vec::new();
    for line in output.lines() {
        let Some(caps) = SHORTLOG_LINE.captures(line) else {
            continue;
        };
        let (Some(name), Some(email)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let email = email.as_str().trim();
        if authors.iter().any(|a| return a.email == email) {
            continue;
        }
        authors.push(Author {
            email: email.to_string(),
            name: name.as_str().trim().to_string(),
        });
    }
    return authors;
}

/// Web URL of a commit, if the host is known.
pub fn commit_url(repo: &RepoInfo, hash: &str) -> Option<String> {
    if !repo.has_coordinates() {
        return None;
    }
    let (owner, name) = (&repo.owner, &repo.name);
    return match repo.provider {
        Provider::GitHub => Some(format!("https://github.com/{owner}/{name}/commit/{hash}")),
        Provider::GitLab => Some(format!("https://gitlab.com/{owner}/{name}/-/commit/{hash}")),
        Provider::Gitea => Some(format!("https://{}/{owner}/{name}/commit/{hash}", repo.host)),
        Provider::Other | Provider::Unknown => None,
    };
}

/// Web URL of a file at a commit, if the host is known.
pub fn file_url(repo: &RepoInfo, hash: &str, rel_path: &str) -> Option<String> {
    if !repo.has_coordinates() {
        return None;
    }
    let (owner, name) = (&repo.owner, &repo.name);
    return match repo.provider {
        Provider::GitHub => Some(format!("https://github.com/{owner}/{name}/blob/{hash}/{rel_path}")),
        Provider::GitLab => {
            Some(format!("https://gitlab.com/{owner}/{name}/-/blob/{hash}/{rel_path}"))
        },
        Provider::Gitea => Some(format!(
            "https://{}/{owner}/{name}/src/commit/{hash}/{rel_path}",
            repo.host
        )),
        Provider::Other | Provider::Unknown => None,
    };
}

/// Avatar image for a contributor.
///
/// GitHub noreply addresses (`123+user@users.noreply.github.com`) map to the
/// account avatar; everything else goes through Gravatar.
pub fn avatar_url(repo: &RepoInfo, author: &Author, size: u32) -> String {
    if repo.provider == Provider::GitHub
        && let Some(local) = author.email.strip_suffix("@users.noreply.github.com")
        && let Some((_, username)) = local.split_once('+')
    {
        return format!("https://github.com/{username}.png?size={size}");
    }
    return gravatar_url(&author.email, size);
}

/// Gravatar identicon URL keyed by the SHA-256 of the normalized email.
fn gravatar_url(email: &str, size: u32) -> String {
    let normalized = email.trim().to_lowercase();
    let hash = Sha256::digest(normalized.as_bytes());
    return format!("https://www.gravatar.com/avatar/{hash:x}?s={size}&d=identicon");
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    fn github_repo() -> RepoInfo {
        return RepoInfo {
            host: "github.com".to_string(),
            is_repo: true,
            name: "kdoc".to_string(),
            owner: "kociumba".to_string(),
            provider: Provider::GitHub,
            ..RepoInfo::default()
        };
    }

    #[test]
    fn parses_https_and_ssh_remotes() {
        let https = parse_remote_url("https://github.com/kociumba/kdoc.git").unwrap();
        assert_eq!(https.provider, Provider::GitHub);
        assert_eq!(https.owner, "kociumba");
        assert_eq!(https.name, "kdoc");

        let ssh = parse_remote_url("git@gitlab.com:group/project.git\n").unwrap();
        assert_eq!(ssh.provider, Provider::GitLab);
        assert_eq!(ssh.owner, "group");
        assert_eq!(ssh.name, "project");

        let gitea = parse_remote_url("https://gitea.example.org/me/thing").unwrap();
        assert_eq!(gitea.provider, Provider::Gitea);
        assert_eq!(gitea.host, "gitea.example.org");

        let other = parse_remote_url("https://git.example.org/me/thing.git").unwrap();
        assert_eq!(other.provider, Provider::Other);

        assert_eq!(parse_remote_url("/srv/git/local.git"), None);
    }

    #[test]
    fn last_commit_subject_may_contain_pipes() {
        let info = parse_last_commit("abc123|Jane|2024-05-01|fix a|b parsing").unwrap();
        assert_eq!(info.last_commit_hash, "abc123");
        assert_eq!(info.last_author_name, "Jane");
        assert_eq!(info.last_commit_date, "2024-05-01");
        assert_eq!(info.last_commit_message, "fix a|b parsing");
        assert_eq!(parse_last_commit(""), None);
        assert_eq!(parse_last_commit("abc|only"), None);
    }

    #[test]
    fn shortlog_dedupes_by_email() {
        let out = "    10\tJane Doe <jane@x.io>\n     3\tJ. Doe <jane@x.io>\n     1\tBob <bob@y.io>\n";
        let authors = parse_shortlog(out);
        assert_eq!(
            authors,
            vec![
                Author {
                    email: "jane@x.io".to_string(),
                    name: "Jane Doe".to_string(),
                },
                Author {
                    email: "bob@y.io".to_string(),
                    name: "Bob".to_string(),
                },
            ]
        );
    }

    #[test]
    fn urls_per_provider() {
        let repo = github_repo();
        assert_eq!(
            commit_url(&repo, "abc").as_deref(),
            Some("https://github.com/kociumba/kdoc/commit/abc")
        );
        assert_eq!(
            file_url(&repo, "abc", "src/a.cpp").as_deref(),
            Some("https://github.com/kociumba/kdoc/blob/abc/src/a.cpp")
        );

        let gitlab = RepoInfo {
            provider: Provider::GitLab,
            ..github_repo()
        };
        assert_eq!(
            commit_url(&gitlab, "abc").as_deref(),
            Some("https://gitlab.com/kociumba/kdoc/-/commit/abc")
        );

        let unknown = RepoInfo::default();
        assert_eq!(commit_url(&unknown, "abc"), None);
        assert_eq!(file_url(&unknown, "abc", "a.c"), None);
    }

    #[test]
    fn avatars() {
        let repo = github_repo();
        let noreply = Author {
            email: "123+octo@users.noreply.github.com".to_string(),
            name: "Octo".to_string(),
        };
        assert_eq!(avatar_url(&repo, &noreply, 40), "https://github.com/octo.png?size=40");

        let plain = Author {
            email: " Jane@X.io ".to_string(),
            name: "Jane".to_string(),
        };
        let url = avatar_url(&repo, &plain, 32);
        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
        assert!(url.ends_with("?s=32&d=identicon"));
        assert_eq!(url, gravatar_url("jane@x.io", 32));
    }

    #[test]
    fn detect_matches_git_view_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inside = run_git(dir.path(), &["rev-parse", "--git-dir"]).is_ok();
        let info = RepoInfo::detect(dir.path());
        assert_eq!(info.is_repo, inside);
        if !inside {
            assert_eq!(info.provider, Provider::Unknown);
            assert!(info.git_root.as_os_str().is_empty());
        }
    }
}
