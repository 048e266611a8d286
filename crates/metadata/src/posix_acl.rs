//! POSIX access ACL decoding for share reporting.
//!
//! Linux exposes the access ACL of an entry through the
//! `system.posix_acl_access` extended attribute. Only the named user and
//! named group entries matter here: they are the grants that go beyond the
//! owner/group/other permission bits.
//!
//! # Wire Format
//!
//! All integers are little-endian.
//!
//! - Header (4 bytes): version, always 2
//! - Entries (8 bytes each): tag (2 bytes), permissions (2 bytes), id (4 bytes)
//!
//! Entries without an id (`USER_OBJ`, `GROUP_OBJ`, `MASK`, `OTHER`) carry
//! `u32::MAX` in the id field.

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use crate::MetadataError;

/// The extended attribute name for the access ACL.
pub const ACCESS_ACL_XATTR: &str = "system.posix_acl_access";

const ACL_VERSION: u32 = 2;
const HEADER_LEN: usize = 4;
const ENTRY_LEN: usize = 8;

/// ACL entry tag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AclTag {
    /// Permissions of the owning user.
    UserObj = 0x01,
    /// A named user.
    User = 0x02,
    /// Permissions of the owning group.
    GroupObj = 0x04,
    /// A named group.
    Group = 0x08,
    /// Upper bound for group-class entries.
    Mask = 0x10,
    /// Everyone else.
    Other = 0x20,
}

impl TryFrom<u16> for AclTag {
    type Error = io::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::UserObj),
            0x02 => Ok(Self::User),
            0x04 => Ok(Self::GroupObj),
            0x08 => Ok(Self::Group),
            0x10 => Ok(Self::Mask),
            0x20 => Ok(Self::Other),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid POSIX ACL tag: {value:#x}"),
            )),
        }
    }
}

/// A single decoded ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclEntry {
    /// Entry kind.
    pub tag: AclTag,
    /// `rwx` bits: read 4, write 2, execute 1.
    pub perm: u16,
    /// User or group id for named entries.
    pub id: u32,
}

/// Share permission bits as reported on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareBits(u8);

impl ShareBits {
    /// The principal is a group.
    pub const IS_GROUP: u8 = 1;
    /// Read access.
    pub const READ: u8 = 2;
    /// Write access.
    pub const WRITE: u8 = 4;
    /// Execute or search access.
    pub const EXECUTE: u8 = 8;

    /// Raw value.
    #[must_use]
    pub const fn as_raw(self) -> u8 {
        self.0
    }

    /// Checks if a bit is set.
    #[must_use]
    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Principal of a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// A user id.
    User(u32),
    /// A group id.
    Group(u32),
}

/// One user or group grant from an ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareEntry {
    /// Who the grant applies to.
    pub principal: Principal,
    /// What the grant allows.
    pub bits: ShareBits,
}

impl AclEntry {
    /// Converts named user and group entries into shares.
    #[must_use]
    pub fn share(&self) -> Option<ShareEntry> {
        let (principal, group_bit) = match self.tag {
            AclTag::User => (Principal::User(self.id), 0),
            AclTag::Group => (Principal::Group(self.id), ShareBits::IS_GROUP),
            _ => return None,
        };
        let mut bits = group_bit;
        if self.perm & 4 != 0 {
            bits |= ShareBits::READ;
        }
        if self.perm & 2 != 0 {
            bits |= ShareBits::WRITE;
        }
        if self.perm & 1 != 0 {
            bits |= ShareBits::EXECUTE;
        }
        Some(ShareEntry {
            principal,
            bits: ShareBits(bits),
        })
    }
}

/// A decoded access ACL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosixAcl {
    /// Entries in stored order.
    pub entries: Vec<AclEntry>,
}

impl PosixAcl {
    /// Parses the binary attribute value.
    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let header: [u8; HEADER_LEN] = data
            .get(..HEADER_LEN)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "truncated ACL header"))?;
        let version = u32::from_le_bytes(header);
        if version != ACL_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported POSIX ACL version: {version}"),
            ));
        }

        let body = &data[HEADER_LEN..];
        if body.len() % ENTRY_LEN != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated ACL entry",
            ));
        }

        let entries = body
            .chunks_exact(ENTRY_LEN)
            .map(|chunk| {
                let tag = u16::from_le_bytes([chunk[0], chunk[1]]);
                let perm = u16::from_le_bytes([chunk[2], chunk[3]]);
                let id = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
                Ok(AclEntry {
                    tag: AclTag::try_from(tag)?,
                    perm,
                    id,
                })
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Named user and group grants in stored order.
    pub fn shares(&self) -> impl Iterator<Item = ShareEntry> + '_ {
        self.entries.iter().filter_map(AclEntry::share)
    }
}

/// Reads the access ACL of `path`.
///
/// Returns `None` if the entry has no extended ACL or the filesystem doesn't
/// support ACLs.
pub fn read_access_acl(path: &Path) -> Result<Option<PosixAcl>, MetadataError> {
    match xattr::get_deref(path, OsStr::new(ACCESS_ACL_XATTR)) {
        Ok(Some(data)) => {
            let acl = PosixAcl::from_bytes(&data)
                .map_err(|e| MetadataError::new("parse POSIX ACL", path, e))?;
            Ok(Some(acl))
        }
        Ok(None) => Ok(None),
        Err(e) => {
            // Absent or unsupported ACLs mean no extended ACL.
            let kind = e.kind();
            if kind == io::ErrorKind::Unsupported
                || e.raw_os_error() == Some(libc::EOPNOTSUPP)
                || e.raw_os_error() == Some(libc::ENOTSUP)
            {
                Ok(None)
            } else {
                Err(MetadataError::new("read POSIX ACL", path, e))
            }
        }
    }
}
