use std::fs;
use std::io::Write;
use std::path::Path;

use logging::targets::DELETE;
use metadata::MetadataMask;
use tracing::{debug, trace};
use walk::WalkBuilder;

use crate::engine::{Engine, emit};
use crate::error::{EngineResult, FirstError, IoResultExt};

impl Engine {
    /// `delete`: removes `path` and everything below it, children first.
    ///
    /// Links are removed, never followed. Each removed entry is reported.
    /// Succeeds when at least one entry was removed; otherwise returns the
    /// first failure.
    pub fn delete(&mut self, path: &Path, out: &mut dyn Write) -> EngineResult<()> {
        let walker = WalkBuilder::new(path).contents_first(true).build()?;
        let mut first = FirstError::default();
        let mut removed = 0usize;

        for item in walker {
            let entry = match item {
                Ok(entry) => entry,
                Err(error) => {
                    first.record(error.into())?;
                    continue;
                }
            };

            let target = entry.full_path();
            // Serialized up front: the canonical path needs the entry to exist.
            let line =
                self.serializer
                    .serialize_metadata(target, entry.metadata(), MetadataMask::DELETED);
            let result = if entry.metadata().is_dir() {
                fs::remove_dir(target)
            } else {
                fs::remove_file(target)
            };

            match result.with_path("remove", target) {
                Ok(()) => {
                    trace!(target: DELETE, path = %target.display(), "removed");
                    removed += 1;
                    emit(out, &line)?;
                }
                Err(error) => first.record(error)?,
            }
        }

        debug!(target: DELETE, path = %path.display(), removed, "delete finished");
        if removed > 0 {
            Ok(())
        } else {
            first.into_result()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{MetadataExt, PermissionsExt};
    use test_support::{TestTree, output_lines};

    #[test]
    fn removes_children_before_parents() {
        let tree = TestTree::new().expect("tree");
        tree.file("root/a/inner", b"x").expect("inner");
        tree.file("root/b", b"y").expect("b");
        let root = tree.join("root");

        let mut out = Vec::new();
        Engine::new().delete(&root, &mut out).expect("delete");

        assert!(fs::symlink_metadata(&root).is_err());
        let types: Vec<char> = output_lines(&out)
            .iter()
            .filter_map(|line| line.chars().next())
            .collect();
        assert_eq!(types, vec!['F', 'D', 'F', 'D']);
    }

    #[test]
    fn links_are_removed_not_followed() {
        let tree = TestTree::new().expect("tree");
        let outside = tree.file("outside/keep", b"k").expect("keep");
        tree.dir("root").expect("root");
        tree.symlink(tree.join("outside"), "root/link").expect("link");

        let mut out = Vec::new();
        Engine::new()
            .delete(&tree.join("root"), &mut out)
            .expect("delete");
        assert!(outside.exists());
        assert_eq!(output_lines(&out).len(), 2);
    }

    #[test]
    fn missing_path_is_enoent() {
        let tree = TestTree::new().expect("tree");
        let error = Engine::new()
            .delete(&tree.join("absent"), &mut Vec::new())
            .expect_err("missing");
        assert_eq!(error.status(), Some(-libc::ENOENT));
    }

    #[test]
    fn partial_removal_still_succeeds() {
        if fs::metadata("/proc/self").map_or(true, |metadata| metadata.uid() == 0) {
            return;
        }
        let tree = TestTree::new().expect("tree");
        tree.file("root/locked/inner", b"x").expect("inner");
        tree.file("root/free", b"y").expect("free");
        let locked = tree.join("root/locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).expect("lock");

        let mut out = Vec::new();
        let result = Engine::new().delete(&tree.join("root"), &mut out);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock");

        result.expect("something was removed");
        assert!(!tree.join("root/free").exists());
        assert!(tree.join("root/locked/inner").exists());
        assert_eq!(output_lines(&out).len(), 1);
    }
}
