//! Entry resolution: glob patterns plus explicit files into an ordered manifest.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use tracing::{debug, warn};

use crate::{Error, Result};

/// Ordered, duplicate-free list of entry files relative to the project root.
///
/// Glob matches come first in pattern order, then explicit entries in
/// declaration order. A resolved manifest is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryManifest {
    entries: Vec<PathBuf>,
}

impl EntryManifest {
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathBuf> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        let path = path.clean();
        self.entries.iter().any(|entry| *entry == path)
    }
}

impl<'a> IntoIterator for &'a EntryManifest {
    type Item = &'a PathBuf;
    type IntoIter = std::slice::Iter<'a, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Expands entry declarations below a project root.
pub struct EntryResolver {
    root: PathBuf,
}

impl EntryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `glob_patterns` and `explicit` into a manifest.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPattern`] for malformed glob syntax
    /// - [`Error::EntryNotFound`] for an explicit entry that is not a file
    /// - [`Error::NoEntries`] when nothing was found at all
    pub fn resolve(&self, glob_patterns: &[String], explicit: &[PathBuf]) -> Result<EntryManifest> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for pattern in glob_patterns {
            let matches = self.expand(pattern)?;
            debug!(pattern = %pattern, matches = matches.len(), "expanded entry glob");
            for path in matches {
                if seen.insert(path.clone()) {
                    entries.push(path);
                }
            }
        }

        for entry in explicit {
            let relative = self.relative_to_root(entry);
            if !self.root.join(&relative).is_file() {
                return Err(Error::EntryNotFound(entry.clone()));
            }
            if seen.insert(relative.clone()) {
                entries.push(relative);
            }
        }

        if entries.is_empty() {
            return Err(Error::NoEntries);
        }

        debug!(entries = entries.len(), "resolved entry manifest");
        Ok(EntryManifest { entries })
    }

    /// Absolute paths under the root become root-relative so they compare
    /// equal to glob matches. Anything else is only cleaned.
    fn relative_to_root(&self, entry: &Path) -> PathBuf {
        let cleaned = entry.clean();
        if cleaned.is_absolute() {
            if let Ok(relative) = cleaned.strip_prefix(self.root.clean()) {
                return relative.to_path_buf();
            }
        }
        cleaned
    }

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let full = Path::new(&root).join(pattern);
        let paths = glob::glob(&full.to_string_lossy()).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;

        let mut matches = Vec::new();
        for item in paths {
            match item {
                Ok(path) if path.is_file() => {
                    let relative = path.strip_prefix(&self.root).unwrap_or(&path).clean();
                    matches.push(relative);
                }
                Ok(_) => {}
                Err(err) => warn!(pattern = %pattern, error = %err, "skipping unreadable glob match"),
            }
        }

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn glob_matches_precede_explicit_entries() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "vendor/b.js");
        touch(dir.path(), "vendor/a.js");
        touch(dir.path(), "app.js");

        let manifest = EntryResolver::new(dir.path())
            .resolve(&["vendor/*.js".into()], &[PathBuf::from("app.js")])
            .unwrap();

        assert_eq!(
            manifest.entries(),
            &[
                PathBuf::from("vendor/a.js"),
                PathBuf::from("vendor/b.js"),
                PathBuf::from("app.js"),
            ]
        );
    }

    #[test]
    fn duplicates_keep_first_position() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "js/app.js");
        touch(dir.path(), "js/util.js");

        let manifest = EntryResolver::new(dir.path())
            .resolve(
                &["js/*.js".into(), "js/app.js".into()],
                &[PathBuf::from("./js/app.js")],
            )
            .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries()[0], PathBuf::from("js/app.js"));
        assert!(manifest.contains(Path::new("./js/util.js")));
    }

    #[test]
    fn absolute_explicit_entry_matches_relative_glob() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "js/app.js");

        let manifest = EntryResolver::new(dir.path())
            .resolve(&["js/*.js".into()], &[dir.path().join("js/app.js")])
            .unwrap();

        assert_eq!(manifest.entries(), &[PathBuf::from("js/app.js")]);
    }

    #[test]
    fn absolute_explicit_entry_is_stored_relative() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "src/Main.elm");

        let manifest = EntryResolver::new(dir.path())
            .resolve(&[], &[dir.path().join("src/./Main.elm")])
            .unwrap();

        assert_eq!(manifest.entries(), &[PathBuf::from("src/Main.elm")]);
    }

    #[test]
    fn directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "vendor/lib.js/index.js");
        touch(dir.path(), "vendor/a.js");

        let manifest = EntryResolver::new(dir.path())
            .resolve(&["vendor/*.js".into()], &[])
            .unwrap();

        assert_eq!(manifest.entries(), &[PathBuf::from("vendor/a.js")]);
    }

    #[test]
    fn missing_explicit_entry_fails() {
        let dir = TempDir::new().unwrap();
        let err = EntryResolver::new(dir.path())
            .resolve(&[], &[PathBuf::from("js/app.js")])
            .unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(path) if path == Path::new("js/app.js")));
    }

    #[test]
    fn empty_result_is_no_entries() {
        let dir = TempDir::new().unwrap();
        let err = EntryResolver::new(dir.path())
            .resolve(&["vendor/**/*.js".into()], &[])
            .unwrap_err();
        assert!(matches!(err, Error::NoEntries));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = EntryResolver::new(dir.path())
            .resolve(&["vendor/[.js".into()], &[])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { pattern, .. } if pattern == "vendor/[.js"));
    }
}
