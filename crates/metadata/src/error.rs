use std::io;
use std::path::{Path, PathBuf};

/// A syscall on an entry failed while its metadata was read or changed.
#[derive(Debug, thiserror::Error)]
#[error("failed to {action} '{}': {source}", .path.display())]
pub struct MetadataError {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: io::Error,
}

impl MetadataError {
    /// Wraps `source`, raised while performing `action` on `path`.
    pub fn new(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// What was being done, phrased to follow "failed to".
    #[must_use]
    pub const fn context(&self) -> &'static str {
        self.action
    }

    /// Entry the action was applied to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drops the context and returns the OS error.
    #[must_use]
    pub fn into_io_error(self) -> io::Error {
        self.source
    }
}
