use std::io;
use std::path::{Path, PathBuf};

/// Failure while walking a tree.
///
/// Every variant names the path that failed and keeps the OS error so callers
/// can report its errno.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    /// The root could not be stat'ed, so no walk took place.
    #[error("cannot stat walk root '{}': {source}", .path.display())]
    Root {
        /// Root given to the builder.
        path: PathBuf,
        /// Error from `stat`/`lstat`.
        #[source]
        source: io::Error,
    },
    /// A directory could not be opened or one of its entries not read.
    #[error("cannot list directory '{}': {source}", .path.display())]
    ListDirectory {
        /// Directory being listed.
        path: PathBuf,
        /// Error from `opendir`/`readdir`.
        #[source]
        source: io::Error,
    },
    /// An entry vanished or could not be stat'ed after it was listed.
    #[error("cannot stat '{}' while walking: {source}", .path.display())]
    Entry {
        /// Entry that failed.
        path: PathBuf,
        /// Error from `stat`/`lstat`.
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    /// Path the failure is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Root { path, .. } | Self::ListDirectory { path, .. } | Self::Entry { path, .. } => {
                path
            }
        }
    }

    /// Unwraps the OS error, dropping the path.
    #[must_use]
    pub fn into_io_error(self) -> io::Error {
        match self {
            Self::Root { source, .. }
            | Self::ListDirectory { source, .. }
            | Self::Entry { source, .. } => source,
        }
    }
}
