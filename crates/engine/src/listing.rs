use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use logging::targets::WALK;
use metadata::MetadataMask;
use tracing::warn;
use walk::WalkBuilder;

use crate::engine::{Engine, emit};
use crate::error::{EngineResult, FirstError, IoResultExt};

impl Engine {
    /// `list-directory`: reports the immediate children of `path` in name
    /// order.
    ///
    /// Children are not followed, so links are reported as links. A child
    /// that vanishes or cannot be inspected is skipped.
    pub fn list_directory(
        &mut self,
        path: &Path,
        mask: MetadataMask,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let mask = mask.or_default(MetadataMask::LIST_DEFAULT);
        fs::metadata(path).with_path("stat", path)?;

        let mut names = fs::read_dir(path)
            .and_then(|entries| {
                entries
                    .map(|entry| entry.map(|entry| entry.file_name()))
                    .collect::<io::Result<Vec<OsString>>>()
            })
            .with_path("read directory", path)?;
        names.sort();

        for name in names {
            let child = path.join(&name);
            match fs::symlink_metadata(&child) {
                Ok(metadata) => {
                    let line = self.serializer.serialize_metadata(&child, &metadata, mask);
                    emit(out, &line)?;
                }
                Err(error) => {
                    warn!(target: WALK, path = %child.display(), %error, "skipping unreadable entry");
                }
            }
        }
        Ok(())
    }

    /// `stat`: reports `path` itself without following a final link.
    pub fn stat(&mut self, path: &Path, mask: MetadataMask, out: &mut dyn Write) -> EngineResult<()> {
        self.report(path, mask.or_default(MetadataMask::LIST_DEFAULT), out)
    }

    /// `tree`: reports `path` and everything below it.
    ///
    /// Links are followed but the walk never leaves the device `path` is on.
    pub fn tree(&mut self, path: &Path, mask: MetadataMask, out: &mut dyn Write) -> EngineResult<()> {
        self.walk_tree(path, mask.or_default(MetadataMask::TREE_DEFAULT), out)
    }

    pub(crate) fn walk_tree(
        &mut self,
        path: &Path,
        mask: MetadataMask,
        out: &mut dyn Write,
    ) -> EngineResult<()> {
        let walker = WalkBuilder::new(path)
            .follow_symlinks(true)
            .same_file_system(true)
            .build()?;
        let mut first = FirstError::default();

        for item in walker {
            // The walker stats through links; lines describe the entry itself.
            let result: EngineResult<Vec<u8>> = match item {
                Ok(entry) => self
                    .serializer
                    .stat_line(entry.full_path(), mask)
                    .map_err(Into::into),
                Err(error) => Err(error.into()),
            };
            match result {
                Ok(line) => emit(out, &line)?,
                Err(error) => first.record(error)?,
            }
        }
        first.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{TestTree, output_lines};

    fn sample() -> TestTree {
        let tree = TestTree::new().expect("tree");
        tree.file("root/file.txt", b"12345").expect("file");
        tree.dir("root/sub").expect("sub");
        tree.symlink("file.txt", "root/link").expect("link");
        tree
    }

    #[test]
    fn lists_three_children_in_name_order() {
        let tree = sample();
        let mask = MetadataMask::EMPTY.with(metadata::Category::FileType).with(metadata::Category::IsLink);

        let mut out = Vec::new();
        Engine::new()
            .list_directory(&tree.join("root"), mask, &mut out)
            .expect("list");
        assert_eq!(output_lines(&out), vec!["F,0", "F,1", "D,0"]);
    }

    #[test]
    fn default_mask_applies_when_empty() {
        let tree = sample();
        let mut engine = Engine::new();

        let mut implicit = Vec::new();
        engine
            .list_directory(&tree.join("root"), MetadataMask::EMPTY, &mut implicit)
            .expect("implicit");
        let mut explicit = Vec::new();
        engine
            .list_directory(&tree.join("root"), MetadataMask::LIST_DEFAULT, &mut explicit)
            .expect("explicit");
        assert_eq!(implicit, explicit);
    }

    #[test]
    fn listing_missing_directory_is_enoent() {
        let tree = TestTree::new().expect("tree");
        let mut out = Vec::new();
        let error = Engine::new()
            .list_directory(&tree.join("absent"), MetadataMask::EMPTY, &mut out)
            .expect_err("missing");
        assert_eq!(error.status(), Some(-libc::ENOENT));
    }

    #[test]
    fn listing_a_file_is_enotdir() {
        let tree = sample();
        let mut out = Vec::new();
        let error = Engine::new()
            .list_directory(&tree.join("root/file.txt"), MetadataMask::EMPTY, &mut out)
            .expect_err("not a directory");
        assert_eq!(error.status(), Some(-libc::ENOTDIR));
    }

    #[test]
    fn stat_reports_size() {
        let tree = sample();
        let mask = MetadataMask::EMPTY.with(metadata::Category::Size);
        let mut out = Vec::new();
        Engine::new()
            .stat(&tree.join("root/file.txt"), mask, &mut out)
            .expect("stat");
        assert_eq!(out, b"5\n");
    }

    #[test]
    fn stat_missing_is_enoent() {
        let tree = TestTree::new().expect("tree");
        let mut out = Vec::new();
        let error = Engine::new()
            .stat(&tree.join("absent"), MetadataMask::EMPTY, &mut out)
            .expect_err("missing");
        assert_eq!(error.status(), Some(-libc::ENOENT));
        assert!(out.is_empty());
    }

    #[test]
    fn tree_visits_root_then_children_in_order() {
        let tree = sample();
        tree.file("root/sub/inner", b"").expect("inner");
        let mask = MetadataMask::EMPTY.with(metadata::Category::RawPath);

        let mut out = Vec::new();
        Engine::new()
            .tree(&tree.join("root"), mask, &mut out)
            .expect("tree");

        let root = tree.join("root");
        let expected: Vec<String> = ["", "/file.txt", "/link", "/sub", "/sub/inner"]
            .iter()
            .map(|suffix| format!("{}{suffix}", root.display()))
            .collect();
        assert_eq!(output_lines(&out), expected);
    }

    #[test]
    fn tree_reports_links_as_links() {
        let tree = sample();
        let mask = MetadataMask::EMPTY.with(metadata::Category::IsLink);
        let mut out = Vec::new();
        Engine::new()
            .tree(&tree.join("root"), mask, &mut out)
            .expect("tree");
        assert_eq!(output_lines(&out), vec!["0", "0", "1", "0"]);
    }
}
