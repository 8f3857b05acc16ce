//! Invitation domain model
//!
//! An invitation is a time-bounded offer of membership in one organization.
//! Its lifecycle is a small forward-only state machine: `pending` is the
//! only initial state, `accepted` and `expired` are terminal.
//!
//! Expiry is *lazy*: an invitation past its deadline is treated as expired
//! wherever its validity matters, whether or not the stored status was ever
//! rewritten. `effective_status` is the single function every read path
//! consults; persisting the transition is an optional optimization, never a
//! correctness requirement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// Lifecycle state of an invitation.
///
/// Transitions only move forward: `Pending -> Accepted` or
/// `Pending -> Expired`. Terminal states never change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Open for acceptance until the expiry deadline
    Pending,

    /// Consumed; a member was created from this invitation
    Accepted,

    /// The expiry deadline passed before acceptance
    Expired,
}

impl InvitationStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
        }
    }

    /// Check whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Optional profile prefill carried on an invitation.
///
/// Hints are advisory: they seed the signup form for the invited person,
/// who supplies the authoritative details at acceptance time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileHints {
    /// Suggested first name
    pub first_name: Option<String>,

    /// Suggested last name
    pub last_name: Option<String>,

    /// Suggested username
    pub username: Option<String>,

    /// Suggested phone number
    pub phone: Option<String>,
}

/// A pending offer of membership in an organization.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
/// use wrench_org::{Invitation, InvitationStatus, ProfileHints, Role};
///
/// let now = Utc::now();
/// let invitation = Invitation::new(
///     Uuid::now_v7(),
///     "new@example.com",
///     Role::User,
///     Uuid::now_v7(),
///     "secret-token",
///     now + Duration::days(7),
///     ProfileHints::default(),
/// );
/// assert_eq!(invitation.effective_status(now), InvitationStatus::Pending);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Unique invitation id
    pub id: Uuid,

    /// Organization the invitation admits into
    pub organization_id: Uuid,

    /// Invitee email address
    pub email: String,

    /// Role granted on acceptance
    pub role: Role,

    /// Stored lifecycle state; see `effective_status` for the lazy-expiry view
    pub status: InvitationStatus,

    /// Secret accept token embedded in the invitation email
    pub token: String,

    /// Member who issued the invitation
    pub inviter_id: Uuid,

    /// Profile prefill for the signup form
    #[serde(default)]
    pub hints: ProfileHints,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,

    /// Deadline after which the invitation can no longer be accepted
    pub expires_at: DateTime<Utc>,

    /// When the invitation was accepted, if it was
    pub accepted_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Creates a new pending invitation.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The organization the invitation admits into
    /// * `email` - Invitee email address
    /// * `role` - Role granted on acceptance
    /// * `inviter_id` - Member who issued the invitation
    /// * `token` - Secret accept token
    /// * `expires_at` - Acceptance deadline
    /// * `hints` - Profile prefill for the signup form
    pub fn new(
        organization_id: Uuid,
        email: impl Into<String>,
        role: Role,
        inviter_id: Uuid,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        hints: ProfileHints,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            organization_id,
            email: email.into(),
            role,
            status: InvitationStatus::Pending,
            token: token.into(),
            inviter_id,
            hints,
            created_at: Utc::now(),
            expires_at,
            accepted_at: None,
        }
    }

    /// Check whether a still-pending invitation has lapsed.
    ///
    /// Terminal invitations are never "expired" by this predicate; an
    /// accepted invitation stays accepted regardless of the clock.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.expires_at
    }

    /// The status this invitation is in once lazy expiry is applied.
    ///
    /// Every read path that gates on invitation validity must consult this
    /// rather than the stored `status` alone.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        if self.is_expired(now) {
            InvitationStatus::Expired
        } else {
            self.status
        }
    }

    /// Check whether the invitation can still be accepted at `now`.
    pub fn is_acceptable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}
