use std::fs;
use std::io::{self, Write};
use std::path::Path;

use logging::targets::COPY;
use metadata::MetadataMask;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, IoResultExt};

impl Engine {
    /// `make-dir`: creates `path` and any missing ancestors.
    ///
    /// Each directory created is reported top-down. When `path` already was
    /// a directory its current metadata is reported instead, so repeating the
    /// command yields the same final line.
    pub fn make_dir(&mut self, path: &Path, out: &mut dyn Write) -> EngineResult<()> {
        if !self.create_missing_dirs(path, out)? {
            self.report(path, MetadataMask::CREATED, out)?;
        }
        Ok(())
    }

    /// Creates every missing directory up to and including `path`.
    ///
    /// Returns `true` when `path` itself was created.
    pub(crate) fn create_missing_dirs(
        &mut self,
        path: &Path,
        out: &mut dyn Write,
    ) -> EngineResult<bool> {
        let mut missing = Vec::new();
        let mut cursor = Some(path);
        while let Some(dir) = cursor.filter(|dir| !dir.as_os_str().is_empty()) {
            match fs::metadata(dir) {
                Ok(metadata) if metadata.is_dir() => break,
                Ok(_) => {
                    let errno = if dir == path { libc::EEXIST } else { libc::ENOTDIR };
                    return Err(EngineError::status_error("create directory", dir, errno));
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    missing.push(dir);
                    cursor = dir.parent();
                }
                Err(error) => return Err(error).with_path("stat", dir),
            }
        }

        self.create_dirs(path, &missing, out)
    }

    /// Creates `missing` deepest-last, reporting each directory this call
    /// created. Returns `true` when `path` was among them.
    fn create_dirs(
        &mut self,
        path: &Path,
        missing: &[&Path],
        out: &mut dyn Write,
    ) -> EngineResult<bool> {
        let mut created_target = false;
        for &dir in missing.iter().rev() {
            match fs::create_dir(dir) {
                Ok(()) => {
                    debug!(target: COPY, path = %dir.display(), "directory created");
                    self.report(dir, MetadataMask::CREATED, out)?;
                    created_target |= dir == path;
                }
                // Lost a race with another creator; the directory is there.
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {
                    debug!(target: COPY, path = %dir.display(), "directory appeared concurrently");
                }
                Err(error) => return Err(error).with_path("create directory", dir),
            }
        }
        Ok(created_target)
    }
}
