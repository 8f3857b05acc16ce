//! # Permissions
//!
//! Core permission types for the RBAC system. Permissions form a closed
//! enumerated set; roles grant fixed subsets of it (see [`crate::grants`]).

use serde::{Deserialize, Serialize};
use std::collections::hash_set;
use std::collections::HashSet;

/// A capability a role can grant.
///
/// Every guarded operation in the platform names exactly one permission.
/// The set is closed: adding a capability means adding a variant here and a
/// row to the grant table, both of which are checked exhaustively.
///
/// # Example
///
/// ```
/// use wrench_rbac::Permission;
///
/// assert_eq!(Permission::OwnershipTransfer.as_str(), "ownership:transfer");
/// assert_eq!(Permission::parse("user:read"), Some(Permission::UserRead));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// View members of the organization.
    UserRead,

    /// Edit member profile data (other than one's own).
    UserWrite,

    /// Soft-delete members.
    UserDelete,

    /// Edit organization attributes.
    OrgWrite,

    /// Change member roles (below owner).
    RoleChange,

    /// Issue membership invitations.
    MemberInvite,

    /// Transfer organization ownership.
    OwnershipTransfer,
}

impl Permission {
    /// Get the string representation of the permission.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserRead => "user:read",
            Permission::UserWrite => "user:write",
            Permission::UserDelete => "user:delete",
            Permission::OrgWrite => "org:write",
            Permission::RoleChange => "role:change",
            Permission::MemberInvite => "member:invite",
            Permission::OwnershipTransfer => "ownership:transfer",
        }
    }

    /// Parse permission from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - The permission string (e.g. "user:read")
    ///
    /// # Returns
    ///
    /// `Some(Permission)` if valid, `None` otherwise
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user:read" => Some(Permission::UserRead),
            "user:write" => Some(Permission::UserWrite),
            "user:delete" => Some(Permission::UserDelete),
            "org:write" => Some(Permission::OrgWrite),
            "role:change" => Some(Permission::RoleChange),
            "member:invite" => Some(Permission::MemberInvite),
            "ownership:transfer" => Some(Permission::OwnershipTransfer),
            _ => None,
        }
    }

    /// All permissions in the system.
    pub fn all() -> [Permission; 7] {
        [
            Permission::UserRead,
            Permission::UserWrite,
            Permission::UserDelete,
            Permission::OrgWrite,
            Permission::RoleChange,
            Permission::MemberInvite,
            Permission::OwnershipTransfer,
        ]
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A set of permissions granted to a role.
///
/// # Example
///
/// ```
/// use wrench_rbac::{Permission, PermissionSet};
///
/// let mut set = PermissionSet::new();
/// set.insert(Permission::UserRead);
///
/// assert!(set.has(Permission::UserRead));
/// assert!(!set.has(Permission::UserDelete));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a permission to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Check if the set contains a permission.
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for permission in &other.permissions {
            self.permissions.insert(*permission);
        }
    }

    /// Check if this set contains every permission of another set.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        other.permissions.is_subset(&self.permissions)
    }

    /// Iterate over the permissions in the set.
    pub fn iter(&self) -> hash_set::Iter<'_, Permission> {
        self.permissions.iter()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}
