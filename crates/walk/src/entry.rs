use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// One visited entry.
#[derive(Debug)]
pub struct WalkEntry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) metadata: Metadata,
    pub(crate) is_root: bool,
}

impl WalkEntry {
    /// Path to open or stat: the root joined with [`Self::relative_path`].
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Path below the root. Empty for the root itself.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// `lstat` result in a physical walk. In a logical walk this is the
    /// target's `stat` unless the link is dead.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// `true` for the entry the walk started from.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.is_root
    }
}
