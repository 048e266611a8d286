//! Mask-driven metadata lines.

use std::fs::{self, Metadata};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use platform::NameCache;
use tracing::debug;

use crate::line::MetadataLine;
use crate::link::{LinkInfo, ResolvedKind};
use crate::mask::{Category, MetadataMask};
use crate::path_cache::CanonicalPathCache;
use crate::posix_acl::{self, Principal};
use crate::{MetadataError, xattr};

/// Kind of entry as reported in the file-type field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryType {
    /// Regular file, or anything that is neither a directory nor a dead link.
    File,
    /// Directory, or a link that resolves to one.
    Directory,
    /// Link whose chain does not end at an existing entry.
    DeadLink,
}

impl EntryType {
    /// Wire label.
    #[must_use]
    pub const fn label(self) -> u8 {
        match self {
            Self::File => b'F',
            Self::Directory => b'D',
            Self::DeadLink => b'L',
        }
    }
}

/// Flattened view of one entry, taken from its `lstat` result.
#[derive(Clone, Debug)]
pub struct TreeItem<'a> {
    /// Path as requested or visited.
    pub path: &'a Path,
    /// Type after following links.
    pub entry_type: EntryType,
    /// Link details when the entry itself is a symbolic link.
    pub link: Option<LinkInfo>,
    /// Full `st_mode`.
    pub mode: u32,
    /// Owning user id.
    pub uid: u32,
    /// Owning group id.
    pub gid: u32,
    /// Size in bytes.
    pub size: u64,
    /// Access time, epoch seconds.
    pub atime: i64,
    /// Modification time, epoch seconds.
    pub mtime: i64,
    /// Status change time, epoch seconds.
    pub ctime: i64,
    /// Inode number.
    pub inode: u64,
}

impl<'a> TreeItem<'a> {
    /// Builds an item from non-following metadata, resolving links.
    pub fn from_metadata(path: &'a Path, metadata: &Metadata) -> Self {
        let link = if metadata.file_type().is_symlink() {
            match LinkInfo::resolve(path) {
                Ok(info) => Some(info),
                Err(error) => {
                    debug!(target: logging::targets::WALK, path = %path.display(), %error, "link unreadable");
                    None
                }
            }
        } else {
            None
        };

        let entry_type = match &link {
            Some(info) => match info.kind {
                ResolvedKind::Directory => EntryType::Directory,
                ResolvedKind::File => EntryType::File,
                ResolvedKind::Dead => EntryType::DeadLink,
            },
            None if metadata.is_dir() => EntryType::Directory,
            None if metadata.file_type().is_symlink() => EntryType::DeadLink,
            None => EntryType::File,
        };

        Self {
            path,
            entry_type,
            link,
            mode: metadata.mode(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: metadata.size(),
            atime: metadata.atime(),
            mtime: metadata.mtime(),
            ctime: metadata.ctime(),
            inode: metadata.ino(),
        }
    }

    /// Returns `true` when the entry itself is a symbolic link.
    #[must_use]
    pub const fn is_link(&self) -> bool {
        self.link.is_some() || matches!(self.entry_type, EntryType::DeadLink)
    }
}

type Emitter = fn(&mut EntrySerializer, &TreeItem<'_>, &mut MetadataLine);

/// Field writers in emission order. Each category appears exactly once.
const EMITTERS: [(Category, Emitter); 17] = [
    (Category::FileType, emit_file_type),
    (Category::IsLink, emit_is_link),
    (Category::LinkTarget, emit_link_target),
    (Category::LinkInode, emit_link_inode),
    (Category::UnixMode, emit_unix_mode),
    (Category::Owner, emit_owner),
    (Category::Group, emit_group),
    (Category::Timestamps, emit_timestamps),
    (Category::CanonicalPath, emit_canonical_path),
    (Category::RawPath, emit_raw_path),
    (Category::Inode, emit_inode),
    (Category::Size, emit_size),
    (Category::Shares, emit_shares),
    (Category::Annotations, emit_annotations),
    (Category::Checksum, emit_checksum),
    (Category::Sensitivity, emit_sensitivity),
    (Category::ExtendedOwner, emit_extended_owner),
];

/// Encodes entries as metadata lines.
///
/// Owns the name and canonical-path caches for the session.
#[derive(Debug, Default)]
pub struct EntrySerializer {
    names: NameCache,
    paths: CanonicalPathCache,
}

impl EntrySerializer {
    /// Creates a serializer with empty caches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets resolved parents. Called between commands since renames
    /// invalidate them.
    pub fn begin_command(&mut self) {
        self.paths.clear();
    }

    /// Encodes `item` under `mask`.
    pub fn serialize(&mut self, item: &TreeItem<'_>, mask: MetadataMask) -> Vec<u8> {
        let mut line = MetadataLine::new();
        for (category, emit) in EMITTERS {
            if mask.contains(category) {
                emit(self, item, &mut line);
            }
        }
        line.finish()
    }

    /// Encodes an entry from its `lstat` result.
    pub fn serialize_metadata(
        &mut self,
        path: &Path,
        metadata: &Metadata,
        mask: MetadataMask,
    ) -> Vec<u8> {
        let item = TreeItem::from_metadata(path, metadata);
        self.serialize(&item, mask)
    }

    /// `lstat`s `path` and encodes it.
    pub fn stat_line(&mut self, path: &Path, mask: MetadataMask) -> Result<Vec<u8>, MetadataError> {
        let metadata = fs::symlink_metadata(path)
            .map_err(|error| MetadataError::new("stat", path, error))?;
        Ok(self.serialize_metadata(path, &metadata, mask))
    }

    /// Canonical form of `path`, used by commands that echo resolved paths.
    pub fn canonical_path(&mut self, path: &Path) -> Result<std::path::PathBuf, MetadataError> {
        self.paths
            .canonicalize(path)
            .map_err(|error| MetadataError::new("resolve", path, error))
    }
}

fn emit_file_type(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_char(item.entry_type.label());
}

fn emit_is_link(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_char(if item.is_link() { b'1' } else { b'0' });
}

fn emit_link_target(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    let target = item
        .link
        .as_ref()
        .map_or(&[][..], |info| info.target.as_os_str().as_bytes());
    line.push_text(target);
}

fn emit_link_inode(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_display(item.link.as_ref().map_or(0, |info| info.target_inode));
}

fn emit_unix_mode(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_display(item.mode & 0o7777);
}

fn emit_owner(serializer: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_text(serializer.names.user_name(item.uid).as_bytes());
}

fn emit_group(serializer: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_text(serializer.names.group_name(item.gid).as_bytes());
}

fn emit_timestamps(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_display(item.atime);
    line.push_display(item.mtime);
    line.push_display(item.ctime);
}

fn emit_canonical_path(
    serializer: &mut EntrySerializer,
    item: &TreeItem<'_>,
    line: &mut MetadataLine,
) {
    match serializer.paths.canonicalize(item.path) {
        Ok(canonical) => line.push_text(canonical.as_os_str().as_bytes()),
        Err(error) => {
            debug!(target: logging::targets::WALK, path = %item.path.display(), %error, "canonical path unavailable");
            line.push_text(item.path.as_os_str().as_bytes());
        }
    }
}

fn emit_raw_path(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_text(item.path.as_os_str().as_bytes());
}

fn emit_inode(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_display(item.inode);
}

fn emit_size(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_display(item.size);
}

fn emit_shares(serializer: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    let shares: Vec<_> = match posix_acl::read_access_acl(item.path) {
        Ok(Some(acl)) => acl.shares().collect(),
        Ok(None) => Vec::new(),
        Err(error) => {
            debug!(target: logging::targets::XATTR, %error, "shares unavailable");
            Vec::new()
        }
    };

    line.push_display(shares.len());
    for share in shares {
        let principal = match share.principal {
            Principal::User(uid) => serializer.names.user_name(uid),
            Principal::Group(gid) => serializer.names.group_name(gid),
        };
        line.push_text(principal.as_bytes());
        line.push_display(share.bits.as_raw());
    }
}

fn emit_annotations(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    line.push_text(&xattr::annotations(item.path));
}

fn emit_checksum(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    let checksum = xattr::read_for_display(item.path, xattr::CHECKSUM).unwrap_or_default();
    let kind = xattr::read_for_display(item.path, xattr::CHECKSUM_TYPE).unwrap_or_default();
    line.push_text(&checksum);
    line.push_text(&kind);
}

fn emit_sensitivity(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    let label = xattr::read_for_display(item.path, xattr::SENSITIVITY)
        .unwrap_or_else(|| xattr::DEFAULT_SENSITIVITY.as_bytes().to_vec());
    line.push_text(&label);
}

fn emit_extended_owner(_: &mut EntrySerializer, item: &TreeItem<'_>, line: &mut MetadataLine) {
    let owner = xattr::read_for_display(item.path, xattr::OWNER).unwrap_or_default();
    line.push_text(&owner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use test_support::{TestTree, xattrs_supported};

    fn fields(line: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(line).expect("utf8");
        let text = text.strip_suffix('\n').expect("terminated");
        text.split(',').map(str::to_owned).collect()
    }

    #[test]
    fn emitters_cover_every_category_in_order() {
        let order: Vec<_> = EMITTERS.iter().map(|(category, _)| *category).collect();
        assert_eq!(order, Category::ALL.to_vec());
    }

    #[test]
    fn empty_mask_yields_empty_line() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"abc").expect("file");
        let mut serializer = EntrySerializer::new();
        let line = serializer.stat_line(&file, MetadataMask::EMPTY).expect("stat");
        assert_eq!(line, b"\n");
    }

    #[test]
    fn basic_fields_follow_mask_order() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"abcd").expect("file");
        let metadata = fs::symlink_metadata(&file).expect("lstat");

        let mask = MetadataMask::EMPTY
            .with(Category::Size)
            .with(Category::FileType)
            .with(Category::Inode)
            .with(Category::RawPath);
        let mut serializer = EntrySerializer::new();
        let line = serializer.serialize_metadata(&file, &metadata, mask);

        assert_eq!(
            fields(&line),
            vec![
                "F".to_owned(),
                file.display().to_string(),
                metadata.ino().to_string(),
                "4".to_owned(),
            ]
        );
    }

    #[test]
    fn directory_reports_mode_and_timestamps() {
        let tree = TestTree::new().expect("tree");
        let dir = tree.dir("d").expect("dir");
        let metadata = fs::symlink_metadata(&dir).expect("lstat");

        let mask = MetadataMask::EMPTY
            .with(Category::FileType)
            .with(Category::UnixMode)
            .with(Category::Timestamps);
        let mut serializer = EntrySerializer::new();
        let got = fields(&serializer.serialize_metadata(&dir, &metadata, mask));

        assert_eq!(got[0], "D");
        assert_eq!(got[1], (metadata.mode() & 0o7777).to_string());
        assert_eq!(got[2], metadata.atime().to_string());
        assert_eq!(got[3], metadata.mtime().to_string());
        assert_eq!(got[4], metadata.ctime().to_string());
    }

    #[test]
    fn link_fields_describe_resolved_target() {
        let tree = TestTree::new().expect("tree");
        let target = tree.file("target", b"x").expect("file");
        let link = tree.symlink(&target, "link").expect("link");

        let mask = MetadataMask::EMPTY
            .with(Category::FileType)
            .with(Category::IsLink)
            .with(Category::LinkTarget)
            .with(Category::LinkInode);
        let mut serializer = EntrySerializer::new();
        let got = fields(&serializer.stat_line(&link, mask).expect("stat"));

        let canonical = fs::canonicalize(&target).expect("canonical");
        let inode = fs::metadata(&target).expect("stat").ino();
        assert_eq!(
            got,
            vec![
                "F".to_owned(),
                "1".to_owned(),
                canonical.display().to_string(),
                inode.to_string(),
            ]
        );
    }

    #[test]
    fn dead_link_is_labelled_l() {
        let tree = TestTree::new().expect("tree");
        let link = tree.symlink("nowhere", "dead").expect("link");
        let mask = MetadataMask::EMPTY
            .with(Category::FileType)
            .with(Category::IsLink)
            .with(Category::LinkTarget)
            .with(Category::LinkInode);
        let mut serializer = EntrySerializer::new();
        let got = fields(&serializer.stat_line(&link, mask).expect("stat"));
        assert_eq!(got, vec!["L", "1", "nowhere", "0"]);
    }

    #[test]
    fn plain_file_has_empty_link_fields() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("plain", b"").expect("file");
        let mask = MetadataMask::EMPTY
            .with(Category::IsLink)
            .with(Category::LinkTarget)
            .with(Category::LinkInode);
        let mut serializer = EntrySerializer::new();
        let got = fields(&serializer.stat_line(&file, mask).expect("stat"));
        assert_eq!(got, vec!["0", "", "0"]);
    }

    #[test]
    fn canonical_path_keeps_link_leaf() {
        let tree = TestTree::new().expect("tree");
        let real = tree.dir("real").expect("dir");
        tree.symlink(&real, "alias").expect("alias");
        tree.file("real/f", b"").expect("file");

        let mask = MetadataMask::EMPTY.with(Category::CanonicalPath);
        let mut serializer = EntrySerializer::new();
        let got = fields(
            &serializer
                .stat_line(&tree.join("alias/f"), mask)
                .expect("stat"),
        );
        let expected = fs::canonicalize(&real).expect("canonical").join("f");
        assert_eq!(got, vec![expected.display().to_string()]);
    }

    #[test]
    fn sensitivity_defaults_to_confidential() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        let mask = MetadataMask::EMPTY.with(Category::Sensitivity);
        let mut serializer = EntrySerializer::new();
        assert_eq!(
            serializer.stat_line(&file, mask).expect("stat"),
            b"CONFIDENTIAL\n"
        );
    }

    #[test]
    fn xattr_categories_read_user_attributes() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        if !xattrs_supported(&file) {
            eprintln!("xattrs not supported, skipping test");
            return;
        }
        xattr::set(&file, OsStr::new(xattr::CHECKSUM), b"abc123", true).expect("checksum");
        xattr::set(&file, OsStr::new(xattr::CHECKSUM_TYPE), b"MD5", true).expect("type");
        xattr::set(&file, OsStr::new(xattr::SENSITIVITY), b"PUBLIC", true).expect("label");
        xattr::set(&file, OsStr::new(xattr::OWNER), b"alice", true).expect("owner");
        xattr::set(&file, OsStr::new("user.annotate1"), b"note,one", true).expect("note");

        let mask = MetadataMask::EMPTY
            .with(Category::Annotations)
            .with(Category::Checksum)
            .with(Category::Sensitivity)
            .with(Category::ExtendedOwner);
        let mut serializer = EntrySerializer::new();
        let line = serializer.stat_line(&file, mask).expect("stat");
        assert_eq!(line, b"note\\,one,abc123,MD5,PUBLIC,alice\n");
    }

    #[test]
    fn shares_without_acl_report_zero() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        let mask = MetadataMask::EMPTY.with(Category::Shares);
        let mut serializer = EntrySerializer::new();
        assert_eq!(serializer.stat_line(&file, mask).expect("stat"), b"0\n");
    }

    #[test]
    fn unknown_owner_is_numeric() {
        let tree = TestTree::new().expect("tree");
        let file = tree.file("f", b"").expect("file");
        let metadata = fs::symlink_metadata(&file).expect("lstat");
        let mut item = TreeItem::from_metadata(&file, &metadata);
        item.uid = 3_999_999_999;
        let mut serializer = EntrySerializer::new();
        let line = serializer.serialize(&item, MetadataMask::EMPTY.with(Category::Owner));
        assert_eq!(line, b"3999999999\n");
    }

    #[test]
    fn missing_entry_fails_to_stat() {
        let tree = TestTree::new().expect("tree");
        let mut serializer = EntrySerializer::new();
        let error = serializer
            .stat_line(&tree.join("absent"), MetadataMask::ALL)
            .expect_err("absent");
        assert_eq!(error.into_io_error().raw_os_error(), Some(libc::ENOENT));
    }
}
