//! Authorization guard
//!
//! The single choke point where a principal's role is checked against the
//! permission an operation requires. Synchronous and idempotent; all I/O
//! happened upstream in the resolver.

use wrench_rbac::{permissions_for, Permission};

use crate::error::{AuthError, AuthResult};
use crate::principal::Principal;

/// Require a permission, returning the principal on success.
///
/// Returning the principal lets call sites chain the check with the
/// organization scoping that must follow it:
///
/// ```
/// use uuid::Uuid;
/// use wrench_auth::{require, Principal};
/// use wrench_org::Role;
/// use wrench_rbac::Permission;
///
/// let principal = Principal::new(Uuid::now_v7(), Uuid::now_v7(), Role::Admin);
/// let actor = require(&principal, Permission::MemberInvite).unwrap();
/// let scope = actor.organization_id; // all queries scoped to this
///
/// assert!(require(&principal, Permission::OwnershipTransfer).is_err());
/// ```
///
/// # Errors
///
/// [`AuthError::Forbidden`] carrying the missing permission when the
/// principal's role does not grant it.
pub fn require(principal: &Principal, permission: Permission) -> AuthResult<&Principal> {
    if permissions_for(principal.role).has(permission) {
        Ok(principal)
    } else {
        Err(AuthError::Forbidden { permission })
    }
}
