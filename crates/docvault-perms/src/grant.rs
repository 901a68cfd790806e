//! Permissions and grant rows.
//!
//! A permission is a point in a small dominance lattice; a grant binds a
//! permission to a (document, grantee) pair, optionally time-bounded and
//! optionally re-delegable.

use serde::{Deserialize, Serialize};
use std::fmt;

use docvault_core::{CoreError, DocumentName, Grantee};

/// A document permission.
///
/// `Owner` dominates everything. `Both` is a historical combined variant
/// that subsumes `Read` and `Write`; it still appears in stored grants and
/// the lattice treats it as a first-class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    /// May check the document out.
    Read,
    /// May overwrite the document.
    Write,
    /// Historical combined variant: read and write.
    Both,
    /// Full control, including delete and granting ownership.
    Owner,
}

impl Permission {
    /// Every permission variant, in lattice order.
    pub const ALL: [Permission; 4] = [
        Permission::Read,
        Permission::Write,
        Permission::Both,
        Permission::Owner,
    ];

    /// Dominance relation of the lattice.
    ///
    /// `a.dominates(b)` means holding `a` confers everything `b` confers.
    /// Reflexive; `Owner` is the top element.
    pub fn dominates(&self, other: Permission) -> bool {
        match self {
            Permission::Owner => true,
            Permission::Both => matches!(
                other,
                Permission::Read | Permission::Write | Permission::Both
            ),
            Permission::Read => other == Permission::Read,
            Permission::Write => other == Permission::Write,
        }
    }

    /// Whether this permission confers read access.
    pub fn implies_read(&self) -> bool {
        self.dominates(Permission::Read)
    }

    /// Whether this permission confers write access.
    pub fn implies_write(&self) -> bool {
        self.dominates(Permission::Write)
    }

    /// Storage encoding of this permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "READ",
            Permission::Write => "WRITE",
            Permission::Both => "BOTH",
            Permission::Owner => "OWNER",
        }
    }

    /// Decode a permission from its storage encoding.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "READ" => Ok(Permission::Read),
            "WRITE" => Ok(Permission::Write),
            "BOTH" => Ok(Permission::Both),
            "OWNER" => Ok(Permission::Owner),
            other => Err(CoreError::UnknownPermission(other.to_string())),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    bits: u8,
}

impl PermissionSet {
    /// The empty set.
    pub const EMPTY: Self = Self { bits: 0 };

    fn bit(permission: Permission) -> u8 {
        match permission {
            Permission::Read => 1 << 0,
            Permission::Write => 1 << 1,
            Permission::Both => 1 << 2,
            Permission::Owner => 1 << 3,
        }
    }

    /// Create an empty set.
    pub fn new() -> Self {
        Self::EMPTY
    }

    /// Check membership.
    pub fn contains(&self, permission: Permission) -> bool {
        self.bits & Self::bit(permission) != 0
    }

    /// Insert a permission.
    pub fn insert(&mut self, permission: Permission) {
        self.bits |= Self::bit(permission);
    }

    /// Builder-style insertion.
    pub fn with(mut self, permission: Permission) -> Self {
        self.insert(permission);
        self
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Iterate the members in lattice order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL.into_iter().filter(|p| self.contains(*p))
    }

    /// Whether any member confers read access.
    pub fn implies_read(&self) -> bool {
        self.iter().any(|p| p.implies_read())
    }

    /// Whether any member confers write access.
    pub fn implies_write(&self) -> bool {
        self.iter().any(|p| p.implies_write())
    }

    /// Whether the set contains `Owner`.
    pub fn has_owner(&self) -> bool {
        self.contains(Permission::Owner)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

impl From<Permission> for PermissionSet {
    fn from(permission: Permission) -> Self {
        Self::new().with(permission)
    }
}

/// A persisted permission grant.
///
/// Multiple grants may coexist for the same (document, grantee); effective
/// rights are the union of the currently valid ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// The document the grant applies to.
    pub document: DocumentName,

    /// Who holds the grant.
    pub grantee: Grantee,

    /// The granted permission.
    pub permission: Permission,

    /// When the grant expires (Unix milliseconds). `None` means permanent.
    pub expires_at: Option<i64>,

    /// Whether the holder may re-delegate this permission.
    pub can_propagate: bool,
}

impl Grant {
    /// The grant every uploader receives on first upload: permanent
    /// ownership with the right to re-delegate.
    pub fn uploader(document: DocumentName, uploader: Grantee) -> Self {
        Self {
            document,
            grantee: uploader,
            permission: Permission::Owner,
            expires_at: None,
            can_propagate: true,
        }
    }

    /// Check whether this grant is valid at `now`.
    pub fn is_valid(&self, now: i64) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > now,
        }
    }

    /// Remaining lifetime at `now` in milliseconds; `None` for permanent
    /// grants.
    pub fn remaining_millis(&self, now: i64) -> Option<i64> {
        self.expires_at.map(|expiry| expiry - now)
    }
}
