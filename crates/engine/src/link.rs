use std::fs;
use std::io::Write;
use std::os::unix::fs::symlink;
use std::path::Path;

use metadata::MetadataMask;

use crate::engine::Engine;
use crate::error::{EngineResult, IoResultExt};

impl Engine {
    /// `symlink`: creates `link_path` pointing at `target`.
    ///
    /// `target` must exist. A relative target is checked against the
    /// directory that will hold the link, since that is how it resolves.
    pub fn symlink(&mut self, target: &Path, link_path: &Path, out: &mut dyn Write) -> EngineResult<()> {
        let resolved = match link_path.parent() {
            Some(parent) if target.is_relative() => parent.join(target),
            _ => target.to_path_buf(),
        };
        fs::metadata(&resolved).with_path("stat", &resolved)?;

        symlink(target, link_path).with_path("create symlink", link_path)?;
        self.report(link_path, MetadataMask::CREATED, out)
    }
}
