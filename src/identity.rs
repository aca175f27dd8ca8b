use nix::unistd::{Gid, Group, Uid, User};

use crate::error::ParseError;

/// The requested ownership of a path. A [None] field means that attribute is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OwnershipSpec {
    pub user: Option<u32>,
    pub group: Option<u32>,
}

impl OwnershipSpec {
    /// Whether any ownership change was requested at all.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.user.is_some() || self.group.is_some()
    }
}

/// An [IdentityDatabase] maps user and group names to numeric IDs and back. It is the only place the
/// crate performs name-service lookups, so that parsing and reporting can be exercised against a
/// fixed set of identities.
pub trait IdentityDatabase {
    /// Look up the UID of the user with the given name.
    fn user_id(&self, name: &str) -> Option<u32>;

    /// Look up the GID of the group with the given name.
    fn group_id(&self, name: &str) -> Option<u32>;

    /// Look up the name of the user with the given UID.
    fn user_name(&self, uid: u32) -> Option<String>;

    /// Look up the name of the group with the given GID.
    fn group_name(&self, gid: u32) -> Option<String>;
}

/// An [IdentityDatabase] backed by the system passwd and group databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentityDatabase;

impl IdentityDatabase for SystemIdentityDatabase {
    fn user_id(&self, name: &str) -> Option<u32> {
        User::from_name(name).ok().flatten().map(|user| user.uid.as_raw())
    }

    fn group_id(&self, name: &str) -> Option<u32> {
        Group::from_name(name).ok().flatten().map(|group| group.gid.as_raw())
    }

    fn user_name(&self, uid: u32) -> Option<String> {
        User::from_uid(Uid::from_raw(uid)).ok().flatten().map(|user| user.name)
    }

    fn group_name(&self, gid: u32) -> Option<String> {
        Group::from_gid(Gid::from_raw(gid)).ok().flatten().map(|group| group.name)
    }
}

/// Resolve an `[OWNER][:[GROUP]]` specification into an [OwnershipSpec]. Each non-empty side is first
/// looked up by name and then parsed as a decimal ID.
pub fn resolve_ownership(spec: &str, database: &impl IdentityDatabase) -> Result<OwnershipSpec, ParseError> {
    let (owner, group) = match spec.split_once(':') {
        Some((owner, group)) => (owner, Some(group)),
        None => (spec, None),
    };

    let user = match owner {
        "" if group.is_some() => None,
        owner => Some(
            database
                .user_id(owner)
                .or_else(|| parse_id(owner))
                .ok_or_else(|| ParseError::InvalidUser(owner.to_string()))?,
        ),
    };

    let group = match group {
        None | Some("") => None,
        Some(group) => Some(
            database
                .group_id(group)
                .or_else(|| parse_id(group))
                .ok_or_else(|| ParseError::InvalidGroup(group.to_string()))?,
        ),
    };

    Ok(OwnershipSpec { user, group })
}

fn parse_id(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    // (uid_t)-1 is what chown reads as "leave unchanged", so it can never name an owner
    text.parse().ok().filter(|&id| id != u32::MAX)
}
