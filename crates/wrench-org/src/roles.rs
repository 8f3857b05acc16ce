//! Role definitions
//!
//! This module defines the closed role hierarchy for organization members.
//! Roles are a fixed set; role-to-permission mapping lives in `wrench-rbac`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A member's role within an organization.
///
/// Roles are hierarchical, with each role inheriting the authority of lower
/// roles. The hierarchy is: User < Admin < Owner.
///
/// Exactly one active member per organization holds the Owner role at any
/// time; the Owner role can only move between members through an ownership
/// transfer, never through a plain role change.
///
/// # Examples
///
/// ```
/// use wrench_org::Role;
///
/// let role = Role::Admin;
/// assert!(role.can_manage_members());
/// assert!(!role.can_transfer_ownership());
///
/// assert!(Role::Owner > Role::Admin);
/// assert!(Role::Admin > Role::User);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular member with read access to the organization directory
    User = 1,

    /// Can manage members, invitations, and organization details
    Admin = 2,

    /// Full organization control, including ownership transfer
    Owner = 3,
}

impl Role {
    /// Check if this role has admin privileges.
    ///
    /// # Returns
    ///
    /// `true` for Admin and Owner roles
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    /// Check if this role can manage members.
    ///
    /// This includes inviting, removing, and changing member roles.
    ///
    /// # Returns
    ///
    /// `true` for Admin and Owner roles
    pub fn can_manage_members(&self) -> bool {
        *self >= Role::Admin
    }

    /// Check if this role can transfer organization ownership.
    ///
    /// # Returns
    ///
    /// `true` only for the Owner role
    pub fn can_transfer_ownership(&self) -> bool {
        *self >= Role::Owner
    }

    /// Parse role from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(Role)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use wrench_org::Role;
    ///
    /// assert_eq!(Role::parse("admin"), Some(Role::Admin));
    /// assert_eq!(Role::parse("OWNER"), Some(Role::Owner));
    /// assert_eq!(Role::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Get string representation of the role.
    ///
    /// # Returns
    ///
    /// Lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Get a human-readable display name for the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use wrench_org::Role;
    ///
    /// assert_eq!(Role::Admin.display_name(), "Admin");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
            Self::Owner => "Owner",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid role: '{}' (expected: user, admin, or owner)",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| ParseRoleError {
            invalid_value: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(Role::Owner > Role::Admin);
        assert!(Role::Admin > Role::User);
    }

    #[test]
    fn test_role_predicates() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::Owner.is_admin());

        assert!(!Role::User.can_manage_members());
        assert!(Role::Admin.can_manage_members());

        assert!(!Role::Admin.can_transfer_ownership());
        assert!(Role::Owner.can_transfer_ownership());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("Owner"), Some(Role::Owner));
        assert_eq!(Role::parse("invalid"), None);
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("owner".parse::<Role>().unwrap(), Role::Owner);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Owner.display_name(), "Owner");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::Admin);
    }
}
