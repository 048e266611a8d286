//! Symbolic link classification.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// What a symbolic link ultimately points at.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolvedKind {
    /// A regular file or any other non-directory.
    File,
    /// A directory.
    Directory,
    /// Nothing: the chain ends at a missing entry or loops.
    Dead,
}

/// Result of following a link to its final target.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinkInfo {
    /// Classification of the final target.
    pub kind: ResolvedKind,
    /// The link itself.
    pub source: PathBuf,
    /// Canonical target for live links, the raw link text for dead ones.
    pub target: PathBuf,
    /// Inode of the final target, `0` for dead links.
    pub target_inode: u64,
}

impl LinkInfo {
    /// Follows `path` through every link in the chain.
    ///
    /// Fails only when the link itself cannot be read. Missing targets and
    /// loops produce a [`ResolvedKind::Dead`] result.
    pub fn resolve(path: &Path) -> io::Result<Self> {
        let raw_target = fs::read_link(path)?;
        let resolved = fs::canonicalize(path).and_then(|target| {
            let metadata = fs::metadata(&target)?;
            Ok((target, metadata))
        });

        Ok(match resolved {
            Ok((target, metadata)) => Self {
                kind: if metadata.is_dir() {
                    ResolvedKind::Directory
                } else {
                    ResolvedKind::File
                },
                source: path.to_path_buf(),
                target,
                target_inode: metadata.ino(),
            },
            Err(_) => Self {
                kind: ResolvedKind::Dead,
                source: path.to_path_buf(),
                target: raw_target,
                target_inode: 0,
            },
        })
    }

    /// Returns `true` when the chain ends at an existing entry.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self.kind, ResolvedKind::Dead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::TestTree;

    #[test]
    fn link_to_file_resolves_to_file() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("data.txt", b"x").expect("file");
        let link = tree.symlink(&file, "link").expect("link");

        let info = LinkInfo::resolve(&link).expect("resolve");
        assert_eq!(info.kind, ResolvedKind::File);
        assert_eq!(info.target, fs::canonicalize(&file).expect("canonical"));
        assert_eq!(info.target_inode, fs::metadata(&file).expect("stat").ino());
        assert!(info.is_live());
    }

    #[test]
    fn chained_links_resolve_to_final_directory() {
        let tree = TestTree::new().expect("tree");
        let dir = tree.dir("real").expect("dir");
        tree.symlink(&dir, "first").expect("first");
        let second = tree.symlink("first", "second").expect("second");

        let info = LinkInfo::resolve(&second).expect("resolve");
        assert_eq!(info.kind, ResolvedKind::Directory);
        assert_eq!(info.target, fs::canonicalize(&dir).expect("canonical"));
    }

    #[test]
    fn dangling_link_is_dead_and_keeps_raw_text() {
        let tree = TestTree::new().expect("tree");
        let link = tree.symlink("missing/target", "dangling").expect("link");

        let info = LinkInfo::resolve(&link).expect("resolve");
        assert_eq!(info.kind, ResolvedKind::Dead);
        assert_eq!(info.target, PathBuf::from("missing/target"));
        assert_eq!(info.target_inode, 0);
    }

    #[test]
    fn looping_links_are_dead() {
        let tree = TestTree::new().expect("tree");
        tree.symlink("b", "a").expect("a");
        let b = tree.symlink("a", "b").expect("b");

        assert_eq!(LinkInfo::resolve(&b).expect("resolve").kind, ResolvedKind::Dead);
    }

    #[test]
    fn regular_file_is_not_a_link() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("plain", b"").expect("file");
        assert!(LinkInfo::resolve(&file).is_err());
    }
}
