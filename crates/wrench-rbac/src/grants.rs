//! # Grant table
//!
//! The total mapping from roles to permission sets. The match is exhaustive
//! over [`Role`], so adding a role without deciding its grants is a compile
//! error, and the superset chain (owner ⊇ admin ⊇ user) is encoded by
//! construction: each tier starts from the tier below and only ever adds.

use wrench_org::Role;

use crate::permissions::{Permission, PermissionSet};

/// The permission set a role grants.
///
/// Pure lookup with no failure modes.
///
/// # Example
///
/// ```
/// use wrench_org::Role;
/// use wrench_rbac::{permissions_for, Permission};
///
/// assert!(permissions_for(Role::Owner).has(Permission::OwnershipTransfer));
/// assert!(!permissions_for(Role::Admin).has(Permission::OwnershipTransfer));
/// assert!(!permissions_for(Role::User).has(Permission::MemberInvite));
/// ```
pub fn permissions_for(role: Role) -> PermissionSet {
    match role {
        Role::User => PermissionSet::from_iter([Permission::UserRead]),
        Role::Admin => {
            let mut set = permissions_for(Role::User);
            set.insert(Permission::UserWrite);
            set.insert(Permission::UserDelete);
            set.insert(Permission::OrgWrite);
            set.insert(Permission::RoleChange);
            set.insert(Permission::MemberInvite);
            set
        }
        Role::Owner => {
            let mut set = permissions_for(Role::Admin);
            set.insert(Permission::OwnershipTransfer);
            set
        }
    }
}
