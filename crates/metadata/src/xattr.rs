//! Extended attribute access.
//!
//! Every call follows symbolic links: the helper reports and edits the
//! attributes of the entry a path names, never those of an intermediate link.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use rustix::fs::XattrFlags;
use tracing::debug;

use crate::error::MetadataError;

/// Attribute holding the content checksum.
pub const CHECKSUM: &str = "user.checksum";
/// Attribute naming the checksum algorithm.
pub const CHECKSUM_TYPE: &str = "user.checksum_type";
/// Attribute holding the sensitivity label.
pub const SENSITIVITY: &str = "user.sensitivity";
/// Attribute holding the application-level owner.
pub const OWNER: &str = "user.owner";
/// Prefix shared by every annotation attribute.
pub const ANNOTATION_PREFIX: &str = "user.annotate";

/// Label reported when [`SENSITIVITY`] is absent.
pub const DEFAULT_SENSITIVITY: &str = "CONFIDENTIAL";

#[cfg(any(target_os = "linux", target_os = "android"))]
const NO_ATTRIBUTE: i32 = libc::ENODATA;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const NO_ATTRIBUTE: i32 = libc::ENOATTR;

/// Whether a listed name belongs to a namespace the caller may see.
///
/// On Linux unprivileged callers see `user.*` and root sees everything but
/// `system.*`. Elsewhere every name is visible.
fn visible(name: &OsStr) -> bool {
    if cfg!(not(target_os = "linux")) {
        return true;
    }
    let name = name.as_encoded_bytes();
    if effective_root() {
        !name.starts_with(b"system.")
    } else {
        name.starts_with(b"user.")
    }
}

/// The euid does not change after the one-time privilege drop.
fn effective_root() -> bool {
    static ROOT: OnceLock<bool> = OnceLock::new();
    *ROOT.get_or_init(|| rustix::process::geteuid().is_root())
}

fn failed(action: &'static str, path: &Path, error: io::Error) -> MetadataError {
    MetadataError::new(action, path, error)
}

/// Names of the attributes set on `path`, in the order the kernel reports them.
pub fn list_names(path: &Path) -> Result<Vec<OsString>, MetadataError> {
    let names = xattr::list_deref(path)
        .map_err(|error| failed("list extended attributes", path, error))?;
    Ok(names.filter(|name| visible(name)).collect())
}

/// Reads `name`, returning `None` when it is not set.
pub fn read(path: &Path, name: &OsStr) -> Result<Option<Vec<u8>>, MetadataError> {
    xattr::get_deref(path, name)
        .map_err(|error| failed("read extended attribute", path, error))
}

/// Reads `name`, failing with `ENODATA` when it is not set.
pub fn get(path: &Path, name: &OsStr) -> Result<Vec<u8>, MetadataError> {
    read(path, name)?.ok_or_else(|| {
        failed(
            "read extended attribute",
            path,
            io::Error::from_raw_os_error(NO_ATTRIBUTE),
        )
    })
}

/// Writes `name`. Without `overwrite` the call fails with `EEXIST` when the
/// attribute is already set.
pub fn set(path: &Path, name: &OsStr, value: &[u8], overwrite: bool) -> Result<(), MetadataError> {
    let flags = if overwrite {
        XattrFlags::empty()
    } else {
        XattrFlags::CREATE
    };
    rustix::fs::setxattr(path, name, value, flags)
        .map_err(|errno| failed("write extended attribute", path, errno.into()))
}

/// Removes `name`.
pub fn remove(path: &Path, name: &OsStr) -> Result<(), MetadataError> {
    xattr::remove_deref(path, name)
        .map_err(|error| failed("remove extended attribute", path, error))
}

/// Reads an attribute for display. Failures are logged and read as absent.
pub(crate) fn read_for_display(path: &Path, name: &str) -> Option<Vec<u8>> {
    match read(path, OsStr::new(name)) {
        Ok(value) => value,
        Err(error) => {
            debug!(target: logging::targets::XATTR, %error, "attribute unavailable");
            None
        }
    }
}

/// Concatenates the values of every annotation attribute in name order.
pub(crate) fn annotations(path: &Path) -> Vec<u8> {
    let mut names = match list_names(path) {
        Ok(names) => names,
        Err(error) => {
            debug!(target: logging::targets::XATTR, %error, "annotations unavailable");
            return Vec::new();
        }
    };
    names.retain(|name| name.to_string_lossy().starts_with(ANNOTATION_PREFIX));
    names.sort();

    let mut joined = Vec::new();
    for name in &names {
        if let Ok(Some(value)) = read(path, name) {
            joined.extend_from_slice(&value);
        }
    }
    joined
}
