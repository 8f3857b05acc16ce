//! Error types for authentication and authorization
//!
//! This module defines the error kinds the principal resolver and
//! authorization guard can surface. Denials are expected outcomes returned
//! as values; only `Unavailable` indicates infrastructure trouble.

use thiserror::Error;
use wrench_rbac::Permission;

/// Authentication and authorization error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No valid session or identity is attached to the request
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Authenticated identity has no active membership in any organization
    #[error("No active membership for this account")]
    ProfileNotFound,

    /// Authenticated but the role does not grant the required permission
    #[error("Forbidden: missing {permission} permission")]
    Forbidden {
        /// The permission the operation required
        permission: Permission,
    },

    /// Identity provider or lookup backend failure; retryable
    #[error("Identity backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Denials are expected and should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Unavailable(_))
    }

    /// Check if the caller may usefully retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Unavailable(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::AuthenticationRequired => 401,
            AuthError::ProfileNotFound => 403,
            AuthError::Forbidden { .. } => 403,
            AuthError::Unavailable(_) => 503,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            AuthError::ProfileNotFound => "PROFILE_NOT_FOUND",
            AuthError::Forbidden { .. } => "FORBIDDEN",
            AuthError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denials_are_not_server_errors() {
        assert!(!AuthError::AuthenticationRequired.is_server_error());
        assert!(!AuthError::Forbidden {
            permission: Permission::UserRead
        }
        .is_server_error());
        assert!(AuthError::Unavailable("down".into()).is_server_error());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::AuthenticationRequired.status_code(), 401);
        assert_eq!(AuthError::ProfileNotFound.status_code(), 403);
        assert_eq!(AuthError::Unavailable("down".into()).status_code(), 503);
    }

    #[test]
    fn test_forbidden_names_missing_permission() {
        let err = AuthError::Forbidden {
            permission: Permission::OwnershipTransfer,
        };
        assert!(err.to_string().contains("ownership:transfer"));
    }
}
