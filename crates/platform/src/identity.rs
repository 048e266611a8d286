//! User and group name resolution through NSS.

use std::collections::HashMap;

use nix::unistd::{Gid, Group, Uid, User};

/// Looks up the login name for `uid`.
pub fn lookup_user_name(uid: u32) -> Option<String> {
    User::from_uid(Uid::from_raw(uid))
        .ok()
        .flatten()
        .map(|user| user.name)
}

/// Looks up the group name for `gid`.
pub fn lookup_group_name(gid: u32) -> Option<String> {
    Group::from_gid(Gid::from_raw(gid))
        .ok()
        .flatten()
        .map(|group| group.name)
}

/// Memoises id-to-name lookups for the lifetime of a session.
///
/// Ids without a database entry resolve to their decimal form so callers
/// always have something to print.
#[derive(Debug, Default)]
pub struct NameCache {
    users: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl NameCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of `uid`, or its number when unknown.
    pub fn user_name(&mut self, uid: u32) -> &str {
        self.users
            .entry(uid)
            .or_insert_with(|| lookup_user_name(uid).unwrap_or_else(|| uid.to_string()))
    }

    /// Name of `gid`, or its number when unknown.
    pub fn group_name(&mut self, gid: u32) -> &str {
        self.groups
            .entry(gid)
            .or_insert_with(|| lookup_group_name(gid).unwrap_or_else(|| gid.to_string()))
    }
}
