//! # Wrench Membership Engine
//!
//! This crate provides the membership store, invitation lifecycle, and
//! ownership transfer protocol for the Wrench platform.
//!
//! ## Overview
//!
//! The wrench-members crate handles:
//! - **Storage traits**: Organization-scoped persistence contracts with
//!   compare-and-swap semantics (`MemberStore`, `InvitationStore`,
//!   `OrganizationStore`, `DirectoryStore`)
//! - **Member directory**: Listing, profile updates, role changes, soft
//!   deletion, and ownership transfer with last-owner protection
//! - **Invitation engine**: The pending → accepted | expired state machine
//!   with lazy expiry and atomic acceptance
//! - **Notifications**: Best-effort invitation and welcome emails
//! - **In-memory store**: A full `DirectoryStore` implementation for tests
//!   and single-process use
//!
//! ## Architecture
//!
//! ```text
//! request ─▶ PrincipalResolver ─▶ require(permission)
//!                                       │
//!              ┌────────────────────────┼──────────────────┐
//!              ▼                        ▼                  ▼
//!       MemberDirectory         InvitationService      (reads)
//!        role change             invite / accept
//!        soft delete             lazy expiry
//!        ownership transfer      best-effort email
//!              │                        │
//!              └────────▶ DirectoryStore ◀────────┘
//!                  (version CAS + atomic accept)
//! ```
//!
//! ## Concurrency
//!
//! Every operation is request-driven and runs to completion; there is no
//! background scheduler. The races that matter are closed structurally:
//!
//! - Last-owner checks and ownership transfer re-read and re-decide on
//!   version conflicts; the store rejects writes against stale rows.
//! - Duplicate invitations die on the store's unique-pending constraint.
//! - Double accepts are decided by the store's atomic accept; exactly one
//!   caller wins, the other observes a typed denial.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrench_members::{
//!     InvitationConfig, InvitationService, MemberDirectory, MemoryDirectory, NullNotifier,
//! };
//!
//! let store = MemoryDirectory::new();
//! let directory = MemberDirectory::new(store.clone());
//! let invitations = InvitationService::new(
//!     store.clone(),
//!     identity_provider,
//!     NullNotifier,
//!     InvitationConfig::default(),
//! );
//!
//! let invitation = invitations
//!     .invite(&actor, "new@example.com", Role::User, ProfileHints::default())
//!     .await?;
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod invitations;
pub mod memory;
pub mod notify;
pub mod storage;

// Configuration exports
pub use config::InvitationConfig;

// Error exports
pub use error::{DirectoryError, StorageError};

// Service exports
pub use directory::{MemberDirectory, MemberUpdate, OrganizationUpdate};
pub use invitations::{InvitationService, NewMemberDetails};

// Storage exports
pub use memory::MemoryDirectory;
pub use storage::{DirectoryStore, InvitationStore, MemberStore, OrganizationStore};

// Notification exports
pub use notify::{Notifier, NotifyError, NullNotifier, RecordingNotifier, SentNotification};
