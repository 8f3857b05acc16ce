//! # Wrench RBAC (Role-Based Access Control)
//!
//! This crate provides role-based access control for the Wrench platform:
//! the closed permission set and the total role-to-permission grant table.
//!
//! ## Overview
//!
//! The wrench-rbac crate handles:
//! - **Permissions**: The closed set of capabilities operations are guarded by
//! - **Permission Sets**: Collections of permissions granted to roles
//! - **Grants**: The exhaustive `permissions_for(Role)` lookup
//!
//! ## Architecture
//!
//! ```text
//! Role ──permissions_for──▶ PermissionSet
//!
//!   user  = { user:read }
//!   admin = user  ∪ { user:write, user:delete, org:write,
//!                     role:change, member:invite }
//!   owner = admin ∪ { ownership:transfer }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wrench_org::Role;
//! use wrench_rbac::{permissions_for, Permission};
//!
//! let grants = permissions_for(Role::Admin);
//! assert!(grants.has(Permission::MemberInvite));
//! assert!(!grants.has(Permission::OwnershipTransfer));
//! ```
//!
//! ## Integration with wrench-auth
//!
//! The authorization guard in `wrench-auth` evaluates
//! `permissions_for(principal.role)` against the permission an operation
//! requires and returns a typed denial naming the missing permission.

pub mod grants;
pub mod permissions;

// Re-export main types
pub use grants::permissions_for;
pub use permissions::{Permission, PermissionSet};
