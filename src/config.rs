use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::comment::CommentStyle;
use crate::error::Error;

/// Name of the config file at the project root.
pub const CONFIG_FILE: &str = "kdoc.toml";

/// Project configuration loaded from `kdoc.toml`.
/// Keys missing from the file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Doc-comment marker.
    pub doc_comment: String,
    /// File extension (with the dot) to language tag.
    pub extensions_to_langs: BTreeMap<String, String>,
    /// Avatar edge length in pixels for contributor images.
    pub git_avatar_size: u32,
    /// Skip indented doc lines when looking for the start of a comment run.
    pub ignore_indented: bool,
    /// Where generated markdown goes, relative to the project root.
    pub output_path: String,
    /// Globs, relative to the scan root, of paths never scanned.
    pub scan_exclusions: Vec<String>,
    /// Directory to scan, relative to the project root.
    pub scan_root: String,
}

impl Default for Config {
    fn default() -> Self {
        let extensions_to_langs = [(".c", "c"), (".cpp", "cpp"), (".h", "cpp"), (".hpp", "cpp")]
            .into_iter()
            .map(|(ext, lang)| return (ext.to_string(), lang.to_string()))
            .collect();

        return Self {
            doc_comment: "///".to_string(),
            extensions_to_langs,
            git_avatar_size: 40,
            ignore_indented: false,
            output_path: "./docs".to_string(),
            scan_exclusions: ["*.md", "*.txt", "*.cmake", "cmake-build-*"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            scan_root: "./".to_string(),
        };
    }
}

impl Config {
    /// Load `kdoc.toml` from `root`, writing the defaults there first if the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading or creating the file fails,
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save(root)?;
                tracing::info!(path = %path.display(), "wrote default config");
                return Ok(config);
            },
            Err(e) => return Err(Error::Io(e)),
        };

        return Ok(toml::from_str(&content)?);
    }

    /// Write this config to `root/kdoc.toml`, creating `root` if needed.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlSer` if serialization fails,
    /// or `Error::Io` if the file cannot be written.
    pub fn save(&self, root: &Path) -> Result<(), Error> {
        std::fs::create_dir_all(root)?;
        let content = toml::to_string_pretty(self)?;
        std::fs::write(root.join(CONFIG_FILE), content)?;
        return Ok(());
    }

    /// Comment style used by the extraction engine.
    pub fn comment_style(&self) -> CommentStyle {
        return CommentStyle::new(self.doc_comment.clone(), self.ignore_indented);
    }

    /// Sorted list of configured extensions, for diagnostics.
    pub fn extensions(&self) -> Vec<String> {
        return self.extensions_to_langs.keys().cloned().collect();
    }

    /// Language tag for a file, looked up by its extension.
    pub fn language_for(&self, path: &Path) -> Option<&str> {
        let ext = path.extension()?.to_str()?;
        return self
            .extensions_to_langs
            .get(&format!(".{ext}"))
            .map(String::as_str);
    }

    /// Absolute-or-root-relative scan root.
    pub fn scan_root_in(&self, root: &Path) -> PathBuf {
        return resolve_under(root, &self.scan_root);
    }

    /// Absolute-or-root-relative output directory.
    pub fn output_dir_in(&self, root: &Path) -> PathBuf {
        return resolve_under(root, &self.output_path);
    }
}

/// Join a possibly relative config path onto `root`.
fn resolve_under(root: &Path, configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    return root.join(path);
}

/// Create `kdoc.toml` with defaults, or add the keys an existing file lacks.
///
/// Existing values, ordering, and comments are preserved. Returns the keys
/// that were written.
///
/// # Errors
///
/// Returns `Error::TomlEdit` if the existing file is not valid TOML,
/// `Error::TomlSer` if the defaults cannot be serialized,
/// or `Error::Io` on read/write failure.
pub fn init(root: &Path) -> Result<Vec<String>, Error> {
    let path = root.join(CONFIG_FILE);
    let existing = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io(e)),
    };

    let mut doc: toml_edit::DocumentMut = existing.parse().map_err(|e: toml_edit::TomlError| {
        return Error::TomlEdit {
            path: path.clone(),
            reason: e.to_string(),
        };
    })?;

    let defaults_text = toml::to_string_pretty(&Config::default())?;
    let defaults: toml_edit::DocumentMut =
        defaults_text.parse().map_err(|e: toml_edit::TomlError| {
            return Error::TomlEdit {
                path: path.clone(),
                reason: e.to_string(),
            };
        })?;

    let mut added = Vec::new();
    for (key, item) in defaults.iter() {
        if doc.contains_key(key) {
            continue;
        }
        doc.insert(key, item.clone());
        added.push(key.to_string());
    }

    if !added.is_empty() {
        std::fs::create_dir_all(root)?;
        std::fs::write(&path, doc.to_string())?;
    }

    return Ok(added);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());

        let reloaded = Config::load(dir.path()).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "doc_comment = \"//!\"\nignore_indented = true\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.doc_comment, "//!");
        assert!(config.ignore_indented);
        assert_eq!(config.git_avatar_size, 40);
        assert_eq!(config.output_path, "./docs");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "doc_comment = [").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn language_lookup_uses_dotted_extension() {
        let config = Config::default();
        assert_eq!(config.language_for(Path::new("src/a.hpp")), Some("cpp"));
        assert_eq!(config.language_for(Path::new("src/a.c")), Some("c"));
        assert_eq!(config.language_for(Path::new("README.md")), None);
        assert_eq!(config.language_for(Path::new("Makefile")), None);
    }

    #[test]
    fn relative_paths_resolve_under_root() {
        let config = Config::default();
        let root = Path::new("/project");
        assert_eq!(config.output_dir_in(root), Path::new("/project/./docs"));

        let absolute = Config {
            output_path: "/tmp/out".to_string(),
            ..Config::default()
        };
        assert_eq!(absolute.output_dir_in(root), Path::new("/tmp/out"));
    }

    #[test]
    fn init_keeps_user_values_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "# mine\ndoc_comment = \"##\"\n").unwrap();

        let added = init(dir.path()).unwrap();
        assert!(added.contains(&"output_path".to_string()));
        assert!(!added.contains(&"doc_comment".to_string()));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# mine\ndoc_comment = \"##\"\n"));

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.doc_comment, "##");
        assert_eq!(config.extensions_to_langs, Config::default().extensions_to_langs);

        assert!(init(dir.path()).unwrap().is_empty());
    }
}
