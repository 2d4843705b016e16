//! Source-path resolution
//!
//! Profiles name files by whatever absolute path the compiler saw; the
//! source tree handed to the engine is a set of relative paths. This module
//! bridges the two with a ladder of probes, most specific first:
//!
//! 1. exact key
//! 2. with a configured subdirectory `D`: `D/` + each suffix of the profile
//!    path (longest first, down to the basename), then the same probes under
//!    an extra `src/` prefix
//! 3. any key sharing the basename
//! 4. any key sharing the last k path components, longest k first (k ≥ 2)
//!
//! Resolution is pure and cheap; the analyzer caches the result onto each
//! `FileRecord` at load time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

/// Minimum number of trailing path components for a suffix match.
const MIN_SUFFIX_COMPONENTS: usize = 2;

/// The set of source files available for display, keyed by relative path
/// with `/` separators.
#[derive(Debug, Default)]
pub struct SourceTree {
    files: BTreeMap<String, String>,
    subdir: Option<String>,
}

impl SourceTree {
    #[must_use]
    pub fn new(files: BTreeMap<String, String>, subdir: Option<String>) -> Self {
        Self { files, subdir }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the subdirectory prefix used by the probe ladder.
    #[must_use]
    pub fn with_subdir(mut self, subdir: String) -> Self {
        self.subdir = Some(subdir);
        self
    }

    /// Walk a directory into a source tree. Files that are not valid UTF-8
    /// are skipped; they could never render as source anyway.
    ///
    /// # Errors
    /// Returns an error if the root directory cannot be read.
    pub fn from_dir(root: &Path, subdir: Option<String>) -> Result<Self> {
        let mut files = BTreeMap::new();
        collect_files(root, root, &mut files)
            .with_context(|| format!("Failed to read source directory {}", root.display()))?;
        debug!("loaded {} source file(s) from {}", files.len(), root.display());
        Ok(Self { files, subdir })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Resolve a path as spelled in the profile to file contents.
    /// `None` means every strategy missed; callers treat that as "source
    /// unavailable", never as an error.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&str> {
        if let Some(content) = self.files.get(path) {
            return Some(content);
        }

        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let basename = components.last()?;

        if let Some(subdir) = &self.subdir {
            for probe_root in [subdir.clone(), format!("src/{subdir}")] {
                for k in (MIN_SUFFIX_COMPONENTS..=components.len()).rev() {
                    let suffix = components[components.len() - k..].join("/");
                    if let Some(content) = self.files.get(&format!("{probe_root}/{suffix}")) {
                        return Some(content);
                    }
                }
                if let Some(content) = self.files.get(&format!("{probe_root}/{basename}")) {
                    return Some(content);
                }
            }
        }

        // Basename match anywhere in the tree
        if let Some((_, content)) =
            self.files.iter().find(|(key, _)| key.rsplit('/').next() == Some(basename))
        {
            return Some(content);
        }

        // Longest shared trailing components, k >= 2
        for k in (MIN_SUFFIX_COMPONENTS..components.len().max(MIN_SUFFIX_COMPONENTS)).rev() {
            let suffix = components[components.len().saturating_sub(k)..].join("/");
            let anchored = format!("/{suffix}");
            if let Some((_, content)) = self.files.iter().find(|(key, _)| {
                key.as_str() == suffix || key.ends_with(&anchored)
            }) {
                return Some(content);
            }
        }

        None
    }
}

fn collect_files(root: &Path, dir: &Path, files: &mut BTreeMap<String, String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, files)?;
        } else if let Ok(content) = fs::read_to_string(&path) {
            let relative = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.insert(relative, content);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, &str)], subdir: Option<&str>) -> SourceTree {
        let files =
            entries.iter().map(|&(k, v)| (k.to_string(), v.to_string())).collect();
        SourceTree::new(files, subdir.map(str::to_string))
    }

    #[test]
    fn test_exact_match_wins() {
        let tree = tree(&[("src/main.c", "exact")], None);
        assert_eq!(tree.resolve("src/main.c"), Some("exact"));
    }

    #[test]
    fn test_subdir_probes_suffix_before_src_mirror() {
        let tree = tree(
            &[("sub/main.c", "plain"), ("src/sub/main.c", "mirrored")],
            Some("sub"),
        );
        assert_eq!(tree.resolve("/abs/proj/src/sub/main.c"), Some("plain"));
    }

    #[test]
    fn test_subdir_src_mirror_found_when_plain_missing() {
        let tree = tree(&[("src/sub/main.c", "mirrored")], Some("sub"));
        assert_eq!(tree.resolve("/abs/proj/src/sub/main.c"), Some("mirrored"));
    }

    #[test]
    fn test_subdir_long_suffix_preferred() {
        let tree = tree(
            &[("proj/deep/io.c", "deep"), ("proj/io.c", "shallow")],
            Some("proj"),
        );
        assert_eq!(tree.resolve("/build/deep/io.c"), Some("deep"));
    }

    #[test]
    fn test_basename_fallback() {
        let tree = tree(&[("anywhere/nested/memory.c", "by-name")], None);
        assert_eq!(tree.resolve("/compile/farm/memory.c"), Some("by-name"));
    }

    #[test]
    fn test_ambiguous_basename_resolves_deterministically() {
        // Two candidates share the basename; the sorted key order decides
        let tree = tree(
            &[("checkout/hw/sim/core.c", "first"), ("checkout/other/core.c", "second")],
            None,
        );
        assert_eq!(tree.resolve("/jenkins/ws/sim/core.c"), Some("first"));
    }

    #[test]
    fn test_miss_returns_none() {
        let tree = tree(&[("a/b.c", "x")], Some("a"));
        assert_eq!(tree.resolve("/somewhere/else.c"), None);
    }

    #[test]
    fn test_from_dir_walks_relative_paths() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        let mut f = fs::File::create(dir.path().join("sub/x.c")).unwrap();
        writeln!(f, "int x;").unwrap();

        let tree = SourceTree::from_dir(dir.path(), None).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.resolve("sub/x.c"), Some("int x;\n"));
    }
}
