//! # Wrench Organization Models
//!
//! This crate provides the multi-tenant membership domain model for the
//! Wrench platform, shared by the web application and its background
//! services.
//!
//! ## Overview
//!
//! The wrench-org crate defines:
//! - **Organizations**: Tenant entities that own all membership state
//! - **Members**: Per-organization profiles with soft-delete tombstones
//! - **Roles**: The closed user/admin/owner hierarchy
//! - **Invitations**: Time-bounded membership offers with lazy expiry
//!
//! ## Architecture
//!
//! ```text
//! Organization
//!   ├─ Member (role, soft-delete tombstone, CAS version)
//!   └─ Invitation (pending → accepted | expired)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use uuid::Uuid;
//! use wrench_org::{Member, Organization, Role};
//!
//! let org = Organization::new("Northside Auto");
//!
//! let account_id = Uuid::now_v7();
//! let owner = Member::new(
//!     account_id,
//!     org.id,
//!     Role::Owner,
//!     "Ana",
//!     "Reyes",
//!     "areyes",
//!     "ana@example.com",
//! );
//! assert!(owner.is_active());
//! ```
//!
//! ## Cross-Crate Integration
//!
//! This crate is designed to work with:
//! - `wrench-rbac`: Role-to-permission grant table
//! - `wrench-auth`: Principal resolution and authorization guard
//! - `wrench-members`: Storage traits and the membership/invitation engine

pub mod invitation;
pub mod member;
pub mod organization;
pub mod roles;

// Re-export main types for convenience
pub use invitation::{Invitation, InvitationStatus, ProfileHints};
pub use member::Member;
pub use organization::Organization;
pub use roles::{ParseRoleError, Role};
