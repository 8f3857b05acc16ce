//! Invitation engine.
//!
//! The invitation state machine: issuing offers, resolving them with lazy
//! expiry, and turning an accepted offer into an account plus a member
//! profile.
//!
//! Acceptance runs in two steps with different failure semantics:
//!
//! 1. Account provisioning at the identity provider. If this fails nothing
//!    has happened and the same invitation can be retried.
//! 2. The store's atomic accept: member insert + invitation transition in
//!    one unit, conditioned on the invitation still being pending at write
//!    time. Losing that compare-and-swap (a concurrent accept won) leaves
//!    an orphaned identity behind, which the system prefers over a
//!    half-created membership; the loss is logged and surfaced as a typed
//!    denial.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use wrench_auth::{require, IdentityProvider, Principal};
use wrench_org::{Invitation, InvitationStatus, Member, ProfileHints, Role};
use wrench_rbac::Permission;

use crate::config::InvitationConfig;
use crate::error::{DirectoryError, Result, StorageError};
use crate::notify::{send_invitation_best_effort, send_welcome_best_effort, Notifier};
use crate::storage::DirectoryStore;

/// Details supplied by the invited person at acceptance time.
///
/// These are authoritative; the invitation's [`ProfileHints`] only prefill
/// the signup form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMemberDetails {
    /// Password for the new account
    pub password: String,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Username, unique within the organization
    pub username: String,

    /// Contact phone number
    pub phone: Option<String>,
}

/// Invitation service - the invitation lifecycle over its collaborators.
///
/// # Example
///
/// ```rust,ignore
/// use wrench_members::{InvitationConfig, InvitationService, MemoryDirectory, NullNotifier};
///
/// let service = InvitationService::new(
///     store,
///     identity_provider,
///     NullNotifier,
///     InvitationConfig::default(),
/// );
///
/// let invitation = service
///     .invite(&principal, "new@example.com", Role::User, ProfileHints::default())
///     .await?;
/// let member = service.accept(invitation.id, details).await?;
/// ```
pub struct InvitationService<S, I, N>
where
    S: DirectoryStore,
    I: IdentityProvider,
    N: Notifier,
{
    store: S,
    identity: I,
    notifier: N,
    config: InvitationConfig,
}

impl<S, I, N> InvitationService<S, I, N>
where
    S: DirectoryStore,
    I: IdentityProvider,
    N: Notifier,
{
    /// Create a new invitation service.
    pub fn new(store: S, identity: I, notifier: N, config: InvitationConfig) -> Self {
        Self {
            store,
            identity,
            notifier,
            config,
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &InvitationConfig {
        &self.config
    }

    /// Issue an invitation to join the actor's organization.
    ///
    /// The invitation email is sent best-effort; delivery failure is logged
    /// and does not fail the operation.
    #[instrument(skip(self, actor, hints), fields(organization_id = %actor.organization_id))]
    pub async fn invite(
        &self,
        actor: &Principal,
        email: &str,
        role: Role,
        hints: ProfileHints,
    ) -> Result<Invitation> {
        let actor = require(actor, Permission::MemberInvite)?;
        if role == Role::Owner {
            return Err(DirectoryError::OwnershipTransferRequired);
        }

        let email = email.trim().to_ascii_lowercase();
        if !is_valid_email(&email) {
            return Err(DirectoryError::InvalidEmail(email));
        }

        let organization = self
            .store
            .find_organization(actor.organization_id)
            .await?
            .ok_or(DirectoryError::OrganizationNotFound)?;

        if self
            .store
            .find_active_by_email(actor.organization_id, &email)
            .await?
            .is_some()
        {
            return Err(DirectoryError::DuplicateMember);
        }
        if let Some(username) = &hints.username {
            if self
                .store
                .find_active_by_username(actor.organization_id, username)
                .await?
                .is_some()
            {
                return Err(DirectoryError::DuplicateMember);
            }
        }

        let now = Utc::now();
        if let Some(existing) = self
            .store
            .find_pending_by_email(actor.organization_id, &email)
            .await?
        {
            if !existing.is_expired(now) {
                return Err(DirectoryError::DuplicateInvitation);
            }
            // Lapsed; persist the observed expiry and fall through.
            if let Err(err) = self.store.mark_expired(existing.id).await {
                warn!(invitation_id = %existing.id, %err, "failed to persist lazy expiry");
            }
        }

        let pending = self.store.count_pending(actor.organization_id).await?;
        if pending >= self.config.max_pending_per_org {
            return Err(DirectoryError::PendingInvitationLimit {
                limit: self.config.max_pending_per_org,
            });
        }

        let invitation = Invitation::new(
            actor.organization_id,
            email,
            role,
            actor.user_id,
            generate_accept_token(self.config.token_bytes),
            now + self.config.expiry(),
            hints,
        );

        // The unique-pending constraint closes the race two concurrent
        // invites would otherwise win together.
        match self.store.create_invitation(&invitation).await {
            Ok(()) => {}
            Err(StorageError::Duplicate(_)) => return Err(DirectoryError::DuplicateInvitation),
            Err(err) => return Err(err.into()),
        }

        info!(
            invitation_id = %invitation.id,
            email = %invitation.email,
            role = %role,
            "invitation created"
        );

        send_invitation_best_effort(
            &self.notifier,
            &invitation.email,
            &organization.name,
            role,
            &invitation.token,
        )
        .await;

        Ok(invitation)
    }

    /// Look up an invitation by id, applying lazy expiry.
    ///
    /// A pending invitation past its deadline is reported expired even if
    /// no write ever marked it so; the transition is persisted
    /// opportunistically but nothing depends on that write.
    pub async fn resolve(&self, invitation_id: Uuid) -> Result<Invitation> {
        let invitation = self
            .store
            .find_invitation(invitation_id)
            .await?
            .ok_or(DirectoryError::InvitationNotFound)?;
        Ok(self.apply_lazy_expiry(invitation).await)
    }

    /// Look up an invitation by its accept token, applying lazy expiry.
    pub async fn resolve_by_token(&self, token: &str) -> Result<Invitation> {
        let invitation = self
            .store
            .find_invitation_by_token(token)
            .await?
            .ok_or(DirectoryError::InvitationNotFound)?;
        Ok(self.apply_lazy_expiry(invitation).await)
    }

    /// List open invitations for the actor's organization.
    pub async fn list_pending(&self, actor: &Principal) -> Result<Vec<Invitation>> {
        let actor = require(actor, Permission::MemberInvite)?;
        let now = Utc::now();
        let pending = self.store.list_pending(actor.organization_id).await?;
        Ok(pending
            .into_iter()
            .filter(|i| !i.is_expired(now))
            .collect())
    }

    /// Accept an invitation, creating the account and member profile.
    ///
    /// On success the invitation is accepted exactly once; a concurrent
    /// second accept observes [`DirectoryError::InvalidInvitation`]. The
    /// welcome email is best-effort.
    #[instrument(skip(self, details))]
    pub async fn accept(&self, invitation_id: Uuid, details: NewMemberDetails) -> Result<Member> {
        let now = Utc::now();

        let invitation = self
            .store
            .find_invitation(invitation_id)
            .await?
            .ok_or(DirectoryError::InvalidInvitation)?;
        match invitation.effective_status(now) {
            InvitationStatus::Pending => {}
            InvitationStatus::Expired => {
                if let Err(err) = self.store.mark_expired(invitation.id).await {
                    warn!(invitation_id = %invitation.id, %err, "failed to persist lazy expiry");
                }
                return Err(DirectoryError::ExpiredInvitation);
            }
            InvitationStatus::Accepted => return Err(DirectoryError::InvalidInvitation),
        }

        let organization_id = invitation.organization_id;
        if self
            .store
            .find_active_by_email(organization_id, &invitation.email)
            .await?
            .is_some()
        {
            return Err(DirectoryError::DuplicateMember);
        }
        if self
            .store
            .find_active_by_username(organization_id, &details.username)
            .await?
            .is_some()
        {
            return Err(DirectoryError::DuplicateMember);
        }

        // Step 1: provision the account. Failure here leaves no state
        // behind and the invitation stays acceptable.
        let display_name = format!("{} {}", details.first_name, details.last_name);
        let account_id = self
            .identity
            .create_account(&invitation.email, &details.password, &display_name)
            .await
            .map_err(|err| DirectoryError::AccountCreation(err.to_string()))?;

        let mut member = Member::new(
            account_id,
            organization_id,
            invitation.role,
            details.first_name,
            details.last_name,
            details.username,
            invitation.email.clone(),
        );
        member.phone = details.phone;

        // Step 2: member insert + status transition as one unit,
        // conditioned on the invitation still being pending at write time.
        match self
            .store
            .accept_invitation(invitation.id, &member, now)
            .await
        {
            Ok(accepted) => {
                info!(
                    invitation_id = %accepted.id,
                    member_id = %member.id,
                    organization_id = %organization_id,
                    "invitation accepted"
                );
                if let Some(organization) =
                    self.store.find_organization(organization_id).await.ok().flatten()
                {
                    send_welcome_best_effort(
                        &self.notifier,
                        &member.email,
                        &member.full_name(),
                        &organization.name,
                    )
                    .await;
                }
                Ok(member)
            }
            Err(StorageError::Conflict) => {
                warn!(
                    invitation_id = %invitation.id,
                    account_id = %account_id,
                    "accept lost to a concurrent transition; account left orphaned"
                );
                match self.store.find_invitation(invitation.id).await? {
                    Some(current) if current.is_expired(now) => {
                        Err(DirectoryError::ExpiredInvitation)
                    }
                    _ => Err(DirectoryError::InvalidInvitation),
                }
            }
            Err(StorageError::Duplicate(_)) => {
                warn!(
                    invitation_id = %invitation.id,
                    account_id = %account_id,
                    "member already exists; account left orphaned"
                );
                Err(DirectoryError::DuplicateMember)
            }
            Err(StorageError::NotFound) => Err(DirectoryError::InvalidInvitation),
            Err(err) => {
                error!(
                    invitation_id = %invitation.id,
                    account_id = %account_id,
                    %err,
                    "membership creation failed after account provisioning"
                );
                Err(DirectoryError::AccountCreation(format!(
                    "membership creation failed after account provisioning: {err}"
                )))
            }
        }
    }

    async fn apply_lazy_expiry(&self, mut invitation: Invitation) -> Invitation {
        let now = Utc::now();
        if invitation.is_expired(now) {
            if let Err(err) = self.store.mark_expired(invitation.id).await {
                warn!(invitation_id = %invitation.id, %err, "failed to persist lazy expiry");
            }
            invitation.status = InvitationStatus::Expired;
        }
        invitation
    }
}

/// Generate a URL-safe secret accept token.
fn generate_accept_token(bytes: usize) -> String {
    use base64::Engine;
    use rand::Rng;

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(&mut buf[..]);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

/// Basic email format validation.
///
/// Not RFC 5322 compliant; catches obvious formatting errors before an
/// invitation is persisted against the address.
fn is_valid_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}
