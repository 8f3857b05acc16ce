//! Member domain model
//!
//! A member is a person's profile inside exactly one organization. Members
//! are never hard-deleted; removal sets a tombstone timestamp and the member
//! disappears from every active-scoped query and permission grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::Role;

/// A member profile linking a person to an organization.
///
/// The id is assigned by the identity provider at account creation time; the
/// profile carries everything else the application knows about the person
/// inside their organization.
///
/// The `version` field is an optimistic-concurrency token: stores compare it
/// on every write and reject stale updates, which is what keeps the
/// count-then-act sequences (last-owner checks, ownership transfer) safe
/// under concurrent edits.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use wrench_org::{Member, Role};
///
/// let account_id = Uuid::now_v7();
/// let org_id = Uuid::now_v7();
/// let member = Member::new(account_id, org_id, Role::User, "Ana", "Reyes", "areyes", "ana@example.com");
/// assert!(member.is_active());
/// assert_eq!(member.full_name(), "Ana Reyes");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Account id assigned by the identity provider
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// Username, unique within the organization
    pub username: String,

    /// Email address, unique within the organization
    pub email: String,

    /// Contact phone number
    pub phone: Option<String>,

    /// Street address
    pub street: Option<String>,

    /// City
    pub city: Option<String>,

    /// State or region
    pub region: Option<String>,

    /// Postal code
    pub postal_code: Option<String>,

    /// Role within the organization
    pub role: Role,

    /// Soft-delete tombstone; `None` while the member is active
    pub deleted_at: Option<DateTime<Utc>>,

    /// When the member was created
    pub created_at: DateTime<Utc>,

    /// When the member was last updated
    pub updated_at: DateTime<Utc>,

    /// Optimistic-concurrency token, bumped by the store on every write
    #[serde(default)]
    pub version: u64,
}

impl Member {
    /// Creates a new active member.
    ///
    /// # Arguments
    ///
    /// * `id` - Account id from the identity provider
    /// * `organization_id` - The owning organization
    /// * `role` - The member's role
    /// * `first_name` / `last_name` - Display name parts
    /// * `username` - Unique within the organization
    /// * `email` - Unique within the organization
    pub fn new(
        id: Uuid,
        organization_id: Uuid,
        role: Role,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            organization_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            phone: None,
            street: None,
            city: None,
            region: None,
            postal_code: None,
            role,
            deleted_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Set the contact phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Check whether the member is active (not soft-deleted).
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// The member's full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_member() -> Member {
        Member::new(
            Uuid::now_v7(),
            Uuid::now_v7(),
            Role::User,
            "Ana",
            "Reyes",
            "areyes",
            "ana@example.com",
        )
    }

    #[test]
    fn test_member_creation() {
        let member = sample_member();

        assert!(member.is_active());
        assert_eq!(member.role, Role::User);
        assert_eq!(member.version, 0);
        assert_eq!(member.full_name(), "Ana Reyes");
    }

    #[test]
    fn test_member_with_phone() {
        let member = sample_member().with_phone("555-0101");
        assert_eq!(member.phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn test_soft_deleted_member_is_inactive() {
        let mut member = sample_member();
        member.deleted_at = Some(Utc::now());
        assert!(!member.is_active());
    }
}
