//! Path argument rules and resolution helpers.

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::error::ContractViolation;

/// Paths of this many bytes or more are rejected.
pub const PATH_MAX: usize = 4096;

/// Converts a path argument line into a path, enforcing the protocol rules.
pub fn validate_path(bytes: &[u8]) -> Result<PathBuf, ContractViolation> {
    if bytes.len() >= PATH_MAX {
        return Err(ContractViolation::PathTooLong {
            len: bytes.len(),
            limit: PATH_MAX,
        });
    }
    if bytes.contains(&b'\n') {
        return Err(ContractViolation::PathContainsNewline);
    }
    if bytes.contains(&0) {
        return Err(ContractViolation::PathContainsNul);
    }
    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

/// Resolves `path` even when trailing components do not exist yet.
///
/// The longest existing ancestor is canonicalized and the missing tail is
/// appended as given.
pub fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut tail = Vec::new();
    let mut cursor = absolute.as_path();
    loop {
        match fs::canonicalize(cursor) {
            Ok(mut resolved) => {
                for component in tail.iter().rev() {
                    resolved.push(component);
                }
                return Ok(resolved);
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                let Some(name) = cursor.file_name() else {
                    return Err(error);
                };
                tail.push(name.to_os_string());
                cursor = match cursor.parent() {
                    Some(parent) => parent,
                    None => return Err(error),
                };
            }
            Err(error) => return Err(error),
        }
    }
}

/// Returns `true` when `inner` equals `outer` or lies below it.
pub fn is_within(inner: &Path, outer: &Path) -> bool {
    inner.starts_with(outer)
}

/// Whether anything exists at `path`, without following a final link.
pub(crate) fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
