//! Membership and invitation error types.
//!
//! Business-rule violations (duplicates, expiry, last-owner, authorization)
//! are expected outcomes and surface as distinct typed variants; storage
//! trouble is a separate retryable kind and is never collapsed into a
//! business denial.

use thiserror::Error;
use wrench_auth::AuthError;

/// Errors surfaced by storage implementations.
///
/// These are mechanical outcomes of the persistence layer; the engine maps
/// them into the business taxonomy where a business meaning exists
/// (e.g. a unique-constraint `Duplicate` on invitation insert becomes
/// [`DirectoryError::DuplicateInvitation`]).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The addressed record does not exist (or is soft-deleted).
    #[error("Record not found")]
    NotFound,

    /// A compare-and-swap write lost to a concurrent modification.
    #[error("Concurrent modification detected")]
    Conflict,

    /// A unique constraint was violated.
    #[error("Unique constraint violated: {0}")]
    Duplicate(String),

    /// The backend is unreachable or timed out; retryable.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Check if the caller may usefully retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Conflict | StorageError::Unavailable(_))
    }
}

/// Errors that can occur during membership and invitation operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Authentication or authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The addressed member is not an active member of the organization.
    #[error("Member not found")]
    MemberNotFound,

    /// The organization record is missing.
    #[error("Organization not found")]
    OrganizationNotFound,

    /// The addressed invitation does not exist.
    #[error("Invitation not found")]
    InvitationNotFound,

    /// A pending, unexpired invitation already exists for this email.
    #[error("A pending invitation already exists for this email")]
    DuplicateInvitation,

    /// An active member already exists for this email or username.
    #[error("An active member already exists for this email or username")]
    DuplicateMember,

    /// The invitation is not open for acceptance (missing or already
    /// accepted).
    #[error("Invitation is not open for acceptance")]
    InvalidInvitation,

    /// The invitation lapsed before acceptance.
    #[error("Invitation has expired")]
    ExpiredInvitation,

    /// The email address is not syntactically valid.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// The organization has reached its pending-invitation limit.
    #[error("Maximum pending invitations reached ({limit})")]
    PendingInvitationLimit {
        /// The configured limit.
        limit: u32,
    },

    /// The operation would leave the organization without an owner.
    #[error("Operation would leave the organization without an owner")]
    LastOwner,

    /// The ownership-transfer target is unusable.
    #[error("Invalid transfer target: {0}")]
    InvalidTarget(&'static str),

    /// The owner role only moves through an ownership transfer.
    #[error("Owner role changes require an ownership transfer")]
    OwnershipTransferRequired,

    /// The identity provider failed while provisioning the account, or
    /// membership creation failed after the account was provisioned.
    /// Retryable: the duplicate-member check makes re-invoking accept safe.
    #[error("Account provisioning failed: {0}")]
    AccountCreation(String),

    /// Storage failure; retryable, distinct from every business denial.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for membership and invitation operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;

impl DirectoryError {
    /// Check if the caller may usefully retry the operation.
    ///
    /// Business denials are never retryable; they require a different
    /// action (a new invitation, an ownership transfer first, etc).
    pub fn is_retryable(&self) -> bool {
        match self {
            DirectoryError::Auth(err) => err.is_retryable(),
            DirectoryError::AccountCreation(_) => true,
            DirectoryError::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            DirectoryError::Auth(err) => err.status_code(),
            DirectoryError::MemberNotFound
            | DirectoryError::OrganizationNotFound
            | DirectoryError::InvitationNotFound => 404,
            DirectoryError::DuplicateInvitation
            | DirectoryError::DuplicateMember
            | DirectoryError::InvalidInvitation
            | DirectoryError::LastOwner
            | DirectoryError::InvalidTarget(_)
            | DirectoryError::OwnershipTransferRequired
            | DirectoryError::PendingInvitationLimit { .. } => 409,
            DirectoryError::ExpiredInvitation => 410,
            DirectoryError::InvalidEmail(_) => 422,
            DirectoryError::AccountCreation(_) => 502,
            DirectoryError::Storage(_) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            DirectoryError::Auth(err) => err.error_code(),
            DirectoryError::MemberNotFound => "MEMBER_NOT_FOUND",
            DirectoryError::OrganizationNotFound => "ORGANIZATION_NOT_FOUND",
            DirectoryError::InvitationNotFound => "INVITATION_NOT_FOUND",
            DirectoryError::DuplicateInvitation => "DUPLICATE_INVITATION",
            DirectoryError::DuplicateMember => "DUPLICATE_MEMBER",
            DirectoryError::InvalidInvitation => "INVALID_INVITATION",
            DirectoryError::ExpiredInvitation => "EXPIRED_INVITATION",
            DirectoryError::InvalidEmail(_) => "INVALID_EMAIL",
            DirectoryError::PendingInvitationLimit { .. } => "PENDING_INVITATION_LIMIT",
            DirectoryError::LastOwner => "LAST_OWNER",
            DirectoryError::InvalidTarget(_) => "INVALID_TARGET",
            DirectoryError::OwnershipTransferRequired => "OWNERSHIP_TRANSFER_REQUIRED",
            DirectoryError::AccountCreation(_) => "ACCOUNT_CREATION_FAILED",
            DirectoryError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_denials_are_not_retryable() {
        assert!(!DirectoryError::DuplicateInvitation.is_retryable());
        assert!(!DirectoryError::LastOwner.is_retryable());
        assert!(!DirectoryError::ExpiredInvitation.is_retryable());
    }

    #[test]
    fn test_infrastructure_errors_are_retryable() {
        assert!(DirectoryError::Storage(StorageError::Unavailable("down".into())).is_retryable());
        assert!(DirectoryError::AccountCreation("timeout".into()).is_retryable());
        assert!(!DirectoryError::Storage(StorageError::NotFound).is_retryable());
    }

    #[test]
    fn test_error_codes_are_distinct_for_taxonomy() {
        let errs = [
            DirectoryError::DuplicateInvitation,
            DirectoryError::DuplicateMember,
            DirectoryError::InvalidInvitation,
            DirectoryError::ExpiredInvitation,
            DirectoryError::LastOwner,
            DirectoryError::AccountCreation("x".into()),
            DirectoryError::Storage(StorageError::Unavailable("x".into())),
        ];
        let codes: std::collections::HashSet<_> =
            errs.iter().map(|e| e.error_code()).collect();
        assert_eq!(codes.len(), errs.len());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(DirectoryError::ExpiredInvitation.status_code(), 410);
        assert_eq!(DirectoryError::LastOwner.status_code(), 409);
        assert_eq!(
            DirectoryError::Storage(StorageError::Unavailable("down".into())).status_code(),
            503
        );
    }
}
