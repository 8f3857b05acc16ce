//! # Wrench Authentication
//!
//! This crate provides principal resolution and the authorization guard for
//! the Wrench platform.
//!
//! ## Overview
//!
//! The wrench-auth crate handles:
//! - **Principals**: The resolved identity + organization + role of a request
//! - **Identity Provider**: Black-box collaborator trait for accounts and
//!   sessions (with an in-memory implementation for tests and
//!   single-process use)
//! - **Resolution**: Bearer token → session → active membership → principal
//! - **Guard**: Permission checks against the `wrench-rbac` grant table
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrench_auth::{require, PrincipalResolver};
//! use wrench_rbac::Permission;
//!
//! let resolver = PrincipalResolver::new(identity_provider, membership_store);
//!
//! let principal = resolver.resolve(bearer_token).await?;
//! let actor = require(&principal, Permission::MemberInvite)?;
//! // every downstream query is scoped by actor.organization_id
//! ```
//!
//! ## Error Taxonomy
//!
//! `AuthError` distinguishes the cases transports must keep apart:
//! missing authentication (401), orphaned account / insufficient
//! permission (403), and retryable backend unavailability (503). Denials
//! are expected outcomes and are never logged as bugs.
//!
//! ## Cross-Crate Integration
//!
//! This crate integrates with:
//! - `wrench-org`: Role definitions carried on principals
//! - `wrench-rbac`: The grant table the guard evaluates
//! - `wrench-members`: Implements `ProfileLookup` over its member store

pub mod error;
pub mod guard;
pub mod principal;
pub mod resolver;

// Re-export main types
pub use error::{AuthError, AuthResult};
pub use guard::require;
pub use principal::{
    AccountSession, IdentityProvider, MembershipRecord, MemoryIdentityProvider, Principal,
    ProfileLookup,
};
pub use resolver::PrincipalResolver;
