//! Canonical path construction with per-parent caching.
//!
//! A canonical path resolves the parent directory with `realpath` and then
//! appends the leaf name untouched, so a symbolic link is reported under its
//! own name rather than its target's. Bulk walks visit many children of the
//! same parent; caching the resolved parent keeps that to one `realpath`
//! call per directory.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Cache of resolved parent directories.
///
/// Entries go stale when directories are renamed, so callers clear the
/// cache between commands.
#[derive(Debug, Default)]
pub struct CanonicalPathCache {
    parents: HashMap<PathBuf, PathBuf>,
}

impl CanonicalPathCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical form of `path`.
    ///
    /// Paths without a usable leaf (`/`, or ending in `.` or `..`) are
    /// resolved as a whole.
    pub fn canonicalize(&mut self, path: &Path) -> io::Result<PathBuf> {
        let Some((parent, leaf)) = split_leaf(path) else {
            return fs::canonicalize(path);
        };
        let resolved = self.resolve_parent(parent)?;
        Ok(resolved.join(leaf))
    }

    fn resolve_parent(&mut self, parent: &Path) -> io::Result<PathBuf> {
        if let Some(cached) = self.parents.get(parent) {
            return Ok(cached.clone());
        }

        let lookup = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let resolved = fs::canonicalize(lookup)?;
        self.parents.insert(parent.to_path_buf(), resolved.clone());
        Ok(resolved)
    }

    /// Clears all cached parents.
    pub fn clear(&mut self) {
        self.parents.clear();
    }
}

fn split_leaf(path: &Path) -> Option<(&Path, &OsStr)> {
    match path.components().next_back()? {
        Component::Normal(_) => Some((path.parent()?, path.file_name()?)),
        _ => None,
    }
}
