use std::fs;
use std::io::Write;
use std::path::Path;

use logging::targets::COPY;
use metadata::MetadataMask;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult, IoResultExt};
use crate::paths::entry_exists;

impl Engine {
    /// `move`: renames `from` to `to`.
    ///
    /// Writes the canonical source and destination paths, then the moved
    /// entry, or every entry below it when it is a directory.
    ///
    /// The existence check and the rename are separate steps. A concurrent
    /// creator of `to` between them is overwritten; callers serialize moves
    /// that may collide.
    pub fn rename(
        &mut self,
        from: &Path,
        to: &Path,
        allow_overwrite: bool,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        if !allow_overwrite && entry_exists(to) {
            return Err(EngineError::status_error("move", to, libc::EEXIST));
        }
        let from_real = self.serializer.canonical_path(from)?;
        fs::symlink_metadata(from).with_path("stat", from)?;

        fs::rename(from, to).with_path("move", from)?;
        debug!(target: COPY, from = %from.display(), to = %to.display(), "entry moved");

        // Parents resolved before the rename may now point elsewhere.
        self.serializer.begin_command();
        let to_real = self.serializer.canonical_path(to)?;
        Self::report_path(&from_real, out)?;
        Self::report_path(&to_real, out)?;

        let metadata = fs::symlink_metadata(to).with_path("stat", to)?;
        if metadata.is_dir() {
            self.walk_tree(to, MetadataMask::MOVED, out)
        } else {
            self.report(to, MetadataMask::MOVED, out)
        }
    }
}
