//! Storage traits for members, invitations, and organizations.
//!
//! Implementations back these traits with a relational store; the engine
//! only ever talks to them. Two contracts carry the subsystem's
//! concurrency guarantees and must hold for every implementation:
//!
//! - **Version CAS**: every member write compares the caller's `version`
//!   against the stored one and fails with [`StorageError::Conflict`] on a
//!   mismatch. The engine re-reads and re-decides on conflict, so
//!   count-then-act sequences (last-owner checks, ownership transfer) are
//!   never applied against stale state.
//! - **Active filter**: reads only ever return members whose `deleted_at`
//!   is unset. The filter lives here and nowhere else; callers must not
//!   re-implement it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use wrench_org::{Invitation, Member, Organization};

use crate::error::StorageError;

/// Storage operations over member profiles.
///
/// All queries are scoped by `organization_id`, passed explicitly by the
/// caller from a guarded principal.
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a new member.
    ///
    /// Fails with [`StorageError::Duplicate`] if an active member with the
    /// same email or username already exists in the organization.
    async fn insert_member(&self, member: &Member) -> Result<(), StorageError>;

    /// Get an active member by id.
    async fn get_active(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Member>, StorageError>;

    /// Find an active member by email.
    async fn find_active_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Member>, StorageError>;

    /// Find an active member by username.
    async fn find_active_by_username(
        &self,
        organization_id: Uuid,
        username: &str,
    ) -> Result<Option<Member>, StorageError>;

    /// List active members, ordered by first name then last name.
    async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Member>, StorageError>;

    /// Write a member back, compare-and-swapping on `version`.
    ///
    /// Returns the stored copy with its version bumped. Fails with
    /// [`StorageError::Conflict`] if the stored version moved, and
    /// [`StorageError::NotFound`] if the member is missing or soft-deleted.
    /// Soft deletion itself is an update that sets `deleted_at`.
    async fn update_member(&self, member: &Member) -> Result<Member, StorageError>;

    /// Write two members of the same organization as one atomic unit.
    ///
    /// Both versions are checked before either row changes; a transient
    /// in-between state is never observable. Used by ownership transfer.
    async fn update_member_pair(
        &self,
        first: &Member,
        second: &Member,
    ) -> Result<(), StorageError>;

    /// Count active members holding the owner role.
    async fn count_active_owners(&self, organization_id: Uuid) -> Result<u32, StorageError>;
}

/// Storage operations over invitations.
#[async_trait]
pub trait InvitationStore: Send + Sync {
    /// Persist a new pending invitation.
    ///
    /// Fails with [`StorageError::Duplicate`] if a pending, unexpired
    /// invitation already exists for the same (organization, email) pair.
    /// A lapsed pending invitation does not count against the uniqueness
    /// rule; implementations may persist its `Expired` transition when they
    /// observe it.
    async fn create_invitation(&self, invitation: &Invitation) -> Result<(), StorageError>;

    /// Find an invitation by id.
    async fn find_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, StorageError>;

    /// Find an invitation by its accept token.
    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, StorageError>;

    /// Find the stored-pending invitation for an email, if any.
    ///
    /// Returns invitations whose *stored* status is pending; the caller
    /// applies lazy expiry.
    async fn find_pending_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, StorageError>;

    /// List stored-pending invitations for an organization.
    async fn list_pending(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StorageError>;

    /// Count stored-pending invitations for an organization.
    async fn count_pending(&self, organization_id: Uuid) -> Result<u32, StorageError> {
        Ok(self.list_pending(organization_id).await?.len() as u32)
    }

    /// Opportunistically persist the pending → expired transition.
    ///
    /// A no-op if the invitation is no longer pending. Correctness never
    /// depends on this write; lazy expiry is applied on every read path.
    async fn mark_expired(&self, invitation_id: Uuid) -> Result<(), StorageError>;
}

/// Storage operations over organizations.
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Insert a new organization.
    async fn insert_organization(&self, organization: &Organization) -> Result<(), StorageError>;

    /// Find an organization by id.
    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, StorageError>;

    /// Write an organization back.
    async fn update_organization(&self, organization: &Organization) -> Result<(), StorageError>;
}

/// The full persistence surface the engine runs against.
///
/// Beyond the per-entity traits, this carries the one compound primitive
/// the invitation state machine needs from persistence: acceptance as a
/// single atomic unit.
#[async_trait]
pub trait DirectoryStore: MemberStore + InvitationStore + OrganizationStore {
    /// Atomically consume a pending invitation and create its member.
    ///
    /// In one unit: verify the invitation is still pending and unexpired at
    /// `now` (compare-and-swap, not a prior read), insert `member`, and
    /// transition the invitation to accepted with `accepted_at = now`.
    ///
    /// Fails with [`StorageError::Conflict`] if the invitation is no longer
    /// acceptable (a concurrent accept won, or it lapsed), with
    /// [`StorageError::Duplicate`] if an active member already exists for
    /// the email or username, and with [`StorageError::NotFound`] if the
    /// invitation does not exist. On any failure no state changes.
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        member: &Member,
        now: DateTime<Utc>,
    ) -> Result<Invitation, StorageError>;
}
