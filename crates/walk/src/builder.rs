use crate::error::WalkError;
use crate::walker::Walker;
use std::path::PathBuf;

/// Options for one traversal.
///
/// The defaults describe a physical pre-order walk that crosses device
/// boundaries freely. The root is always the first or last entry.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    pub(crate) root: PathBuf,
    pub(crate) follow_symlinks: bool,
    pub(crate) same_file_system: bool,
    pub(crate) contents_first: bool,
}

impl WalkBuilder {
    /// Starts a description of a walk over `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            follow_symlinks: false,
            same_file_system: false,
            contents_first: false,
        }
    }

    /// Walks logically when `true`.
    ///
    /// Links are then reported with their target's metadata under the link's
    /// own path, and linked directories are entered. A dangling link keeps its
    /// `lstat` metadata.
    #[must_use]
    pub const fn follow_symlinks(mut self, logical: bool) -> Self {
        self.follow_symlinks = logical;
        self
    }

    /// Drops entries whose device differs from the root's.
    #[must_use]
    pub const fn same_file_system(mut self, one_device: bool) -> Self {
        self.same_file_system = one_device;
        self
    }

    /// Yields a directory only after everything beneath it.
    #[must_use]
    pub const fn contents_first(mut self, post_order: bool) -> Self {
        self.contents_first = post_order;
        self
    }

    /// Stats the root and returns the iterator.
    ///
    /// # Errors
    ///
    /// Returns [`WalkError::Root`] when the root cannot be stat'ed.
    pub fn build(self) -> Result<Walker, WalkError> {
        Walker::new(self)
    }
}
