//! In-memory directory store.
//!
//! This is suitable for single-process applications and testing. All
//! mutations run under one write lock, which is what makes the compound
//! contracts of [`DirectoryStore`] hold; a relational implementation gets
//! the same guarantees from transactions plus the `version` column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use wrench_auth::{AuthResult, MembershipRecord, ProfileLookup};
use wrench_org::{Invitation, InvitationStatus, Member, Organization};

use crate::error::StorageError;
use crate::storage::{DirectoryStore, InvitationStore, MemberStore, OrganizationStore};

struct Inner {
    organizations: HashMap<Uuid, Organization>,
    // (organization_id, member_id) -> member
    members: HashMap<(Uuid, Uuid), Member>,
    invitations: HashMap<Uuid, Invitation>,
    // token -> invitation id
    invitation_tokens: HashMap<String, Uuid>,
}

impl Inner {
    fn active_members(&self, organization_id: Uuid) -> impl Iterator<Item = &Member> {
        self.members
            .values()
            .filter(move |m| m.organization_id == organization_id && m.is_active())
    }

    fn has_active_with_identity(
        &self,
        organization_id: Uuid,
        email: &str,
        username: &str,
        excluding: Option<Uuid>,
    ) -> bool {
        self.active_members(organization_id).any(|m| {
            Some(m.id) != excluding
                && (m.email.eq_ignore_ascii_case(email)
                    || m.username.eq_ignore_ascii_case(username))
        })
    }
}

/// In-memory store implementing all directory storage traits.
///
/// Cloning shares the same underlying data.
#[derive(Clone)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryDirectory {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                organizations: HashMap::new(),
                members: HashMap::new(),
                invitations: HashMap::new(),
                invitation_tokens: HashMap::new(),
            })),
        }
    }
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberStore for MemoryDirectory {
    async fn insert_member(&self, member: &Member) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let key = (member.organization_id, member.id);
        if inner.members.contains_key(&key) {
            return Err(StorageError::Duplicate("member id".into()));
        }
        if inner.has_active_with_identity(
            member.organization_id,
            &member.email,
            &member.username,
            None,
        ) {
            return Err(StorageError::Duplicate("member email or username".into()));
        }
        inner.members.insert(key, member.clone());
        Ok(())
    }

    async fn get_active(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
    ) -> Result<Option<Member>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .members
            .get(&(organization_id, member_id))
            .filter(|m| m.is_active())
            .cloned())
    }

    async fn find_active_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Member>, StorageError> {
        let inner = self.inner.read().await;
        let result = inner
            .active_members(organization_id)
            .find(|m| m.email.eq_ignore_ascii_case(email))
            .cloned();
        Ok(result)
    }

    async fn find_active_by_username(
        &self,
        organization_id: Uuid,
        username: &str,
    ) -> Result<Option<Member>, StorageError> {
        let inner = self.inner.read().await;
        let result = inner
            .active_members(organization_id)
            .find(|m| m.username.eq_ignore_ascii_case(username))
            .cloned();
        Ok(result)
    }

    async fn list_active(&self, organization_id: Uuid) -> Result<Vec<Member>, StorageError> {
        let inner = self.inner.read().await;
        let mut members: Vec<Member> = inner.active_members(organization_id).cloned().collect();
        members.sort_by(|a, b| {
            (a.first_name.to_lowercase(), a.last_name.to_lowercase())
                .cmp(&(b.first_name.to_lowercase(), b.last_name.to_lowercase()))
        });
        Ok(members)
    }

    async fn update_member(&self, member: &Member) -> Result<Member, StorageError> {
        let mut inner = self.inner.write().await;
        let key = (member.organization_id, member.id);

        let stored = inner.members.get(&key).ok_or(StorageError::NotFound)?;
        if !stored.is_active() {
            return Err(StorageError::NotFound);
        }
        if stored.version != member.version {
            return Err(StorageError::Conflict);
        }
        // A username or email change must not collide with another member.
        if inner.has_active_with_identity(
            member.organization_id,
            &member.email,
            &member.username,
            Some(member.id),
        ) {
            return Err(StorageError::Duplicate("member email or username".into()));
        }

        let mut updated = member.clone();
        updated.version = member.version + 1;
        updated.updated_at = Utc::now();
        inner.members.insert(key, updated.clone());
        Ok(updated)
    }

    async fn update_member_pair(
        &self,
        first: &Member,
        second: &Member,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;

        // Check both rows before touching either.
        for m in [first, second] {
            let stored = inner
                .members
                .get(&(m.organization_id, m.id))
                .ok_or(StorageError::NotFound)?;
            if !stored.is_active() {
                return Err(StorageError::NotFound);
            }
            if stored.version != m.version {
                return Err(StorageError::Conflict);
            }
        }

        let now = Utc::now();
        for m in [first, second] {
            let mut updated = m.clone();
            updated.version = m.version + 1;
            updated.updated_at = now;
            inner.members.insert((m.organization_id, m.id), updated);
        }
        Ok(())
    }

    async fn count_active_owners(&self, organization_id: Uuid) -> Result<u32, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .active_members(organization_id)
            .filter(|m| m.role == wrench_org::Role::Owner)
            .count() as u32)
    }
}

#[async_trait]
impl InvitationStore for MemoryDirectory {
    async fn create_invitation(&self, invitation: &Invitation) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.invitations.contains_key(&invitation.id) {
            return Err(StorageError::Duplicate("invitation id".into()));
        }

        let now = Utc::now();
        let stale: Option<Uuid> = match inner.invitations.values().find(|i| {
            i.organization_id == invitation.organization_id
                && i.status == InvitationStatus::Pending
                && i.email.eq_ignore_ascii_case(&invitation.email)
        }) {
            Some(existing) if !existing.is_expired(now) => {
                return Err(StorageError::Duplicate("pending invitation".into()));
            }
            Some(existing) => Some(existing.id),
            None => None,
        };
        // A lapsed pending invitation does not block a new one; persist its
        // expiry now that it has been observed.
        if let Some(id) = stale {
            if let Some(existing) = inner.invitations.get_mut(&id) {
                existing.status = InvitationStatus::Expired;
            }
        }

        inner
            .invitation_tokens
            .insert(invitation.token.clone(), invitation.id);
        inner.invitations.insert(invitation.id, invitation.clone());
        Ok(())
    }

    async fn find_invitation(
        &self,
        invitation_id: Uuid,
    ) -> Result<Option<Invitation>, StorageError> {
        Ok(self.inner.read().await.invitations.get(&invitation_id).cloned())
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Invitation>, StorageError> {
        let inner = self.inner.read().await;
        match inner.invitation_tokens.get(token) {
            Some(id) => Ok(inner.invitations.get(id).cloned()),
            None => Ok(None),
        }
    }

    async fn find_pending_by_email(
        &self,
        organization_id: Uuid,
        email: &str,
    ) -> Result<Option<Invitation>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invitations
            .values()
            .find(|i| {
                i.organization_id == organization_id
                    && i.status == InvitationStatus::Pending
                    && i.email.eq_ignore_ascii_case(email)
            })
            .cloned())
    }

    async fn list_pending(&self, organization_id: Uuid) -> Result<Vec<Invitation>, StorageError> {
        let inner = self.inner.read().await;
        let mut pending: Vec<Invitation> = inner
            .invitations
            .values()
            .filter(|i| {
                i.organization_id == organization_id && i.status == InvitationStatus::Pending
            })
            .cloned()
            .collect();
        pending.sort_by_key(|i| i.created_at);
        Ok(pending)
    }

    async fn mark_expired(&self, invitation_id: Uuid) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if let Some(invitation) = inner.invitations.get_mut(&invitation_id) {
            if invitation.status == InvitationStatus::Pending {
                invitation.status = InvitationStatus::Expired;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationStore for MemoryDirectory {
    async fn insert_organization(&self, organization: &Organization) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.organizations.contains_key(&organization.id) {
            return Err(StorageError::Duplicate("organization id".into()));
        }
        inner
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }

    async fn find_organization(
        &self,
        organization_id: Uuid,
    ) -> Result<Option<Organization>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .organizations
            .get(&organization_id)
            .cloned())
    }

    async fn update_organization(&self, organization: &Organization) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if !inner.organizations.contains_key(&organization.id) {
            return Err(StorageError::NotFound);
        }
        inner
            .organizations
            .insert(organization.id, organization.clone());
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn accept_invitation(
        &self,
        invitation_id: Uuid,
        member: &Member,
        now: DateTime<Utc>,
    ) -> Result<Invitation, StorageError> {
        let mut inner = self.inner.write().await;

        let invitation = inner
            .invitations
            .get(&invitation_id)
            .ok_or(StorageError::NotFound)?;
        if invitation.status != InvitationStatus::Pending {
            return Err(StorageError::Conflict);
        }
        if now > invitation.expires_at {
            // Persist the observed expiry, then report the CAS loss.
            if let Some(invitation) = inner.invitations.get_mut(&invitation_id) {
                invitation.status = InvitationStatus::Expired;
            }
            return Err(StorageError::Conflict);
        }

        let key = (member.organization_id, member.id);
        if inner.members.contains_key(&key)
            || inner.has_active_with_identity(
                member.organization_id,
                &member.email,
                &member.username,
                None,
            )
        {
            return Err(StorageError::Duplicate("member email or username".into()));
        }

        inner.members.insert(key, member.clone());
        let invitation = inner
            .invitations
            .get_mut(&invitation_id)
            .ok_or(StorageError::NotFound)?;
        invitation.status = InvitationStatus::Accepted;
        invitation.accepted_at = Some(now);
        Ok(invitation.clone())
    }
}

#[async_trait]
impl ProfileLookup for MemoryDirectory {
    async fn find_active_membership(&self, user_id: Uuid) -> AuthResult<Option<MembershipRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .members
            .values()
            .find(|m| m.id == user_id && m.is_active())
            .map(|m| MembershipRecord {
                member_id: m.id,
                organization_id: m.organization_id,
                role: m.role,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use wrench_org::{ProfileHints, Role};

    fn member(org: Uuid, role: Role, first: &str, last: &str, user: &str) -> Member {
        Member::new(
            Uuid::now_v7(),
            org,
            role,
            first,
            last,
            user,
            format!("{user}@example.com"),
        )
    }

    fn invitation(org: Uuid, email: &str, expires_at: DateTime<Utc>) -> Invitation {
        Invitation::new(
            org,
            email,
            Role::User,
            Uuid::now_v7(),
            Uuid::now_v7().to_string(),
            expires_at,
            ProfileHints::default(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_list_ordered() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();

        store
            .insert_member(&member(org, Role::Owner, "Zoe", "Adams", "zadams"))
            .await
            .unwrap();
        store
            .insert_member(&member(org, Role::User, "Ana", "Reyes", "areyes"))
            .await
            .unwrap();
        store
            .insert_member(&member(org, Role::User, "Ana", "Brown", "abrown"))
            .await
            .unwrap();

        let listed = store.list_active(org).await.unwrap();
        let names: Vec<String> = listed.iter().map(Member::full_name).collect();
        assert_eq!(names, vec!["Ana Brown", "Ana Reyes", "Zoe Adams"]);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();

        store
            .insert_member(&member(org, Role::Owner, "Ana", "Reyes", "areyes"))
            .await
            .unwrap();

        let mut dup = member(org, Role::User, "Another", "Ana", "other");
        dup.email = "AREYES@example.com".into();
        let err = store.insert_member(&dup).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_member_disappears_from_reads() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let m = member(org, Role::User, "Ana", "Reyes", "areyes");
        store.insert_member(&m).await.unwrap();

        let mut deleted = store.get_active(org, m.id).await.unwrap().unwrap();
        deleted.deleted_at = Some(Utc::now());
        store.update_member(&deleted).await.unwrap();

        assert!(store.get_active(org, m.id).await.unwrap().is_none());
        assert!(store
            .find_active_by_email(org, &m.email)
            .await
            .unwrap()
            .is_none());
        assert!(store.list_active(org).await.unwrap().is_empty());
        // A tombstone cannot be mutated again.
        let err = store.update_member(&deleted).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_version_cas_rejects_stale_writes() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let m = member(org, Role::User, "Ana", "Reyes", "areyes");
        store.insert_member(&m).await.unwrap();

        let fresh = store.get_active(org, m.id).await.unwrap().unwrap();
        let mut first = fresh.clone();
        first.phone = Some("555-0101".into());
        let stored = store.update_member(&first).await.unwrap();
        assert_eq!(stored.version, fresh.version + 1);

        // Same base version again: stale.
        let mut second = fresh;
        second.phone = Some("555-0202".into());
        let err = store.update_member(&second).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn test_create_invitation_unique_pending() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let now = Utc::now();

        store
            .create_invitation(&invitation(org, "new@example.com", now + Duration::days(7)))
            .await
            .unwrap();
        let err = store
            .create_invitation(&invitation(org, "new@example.com", now + Duration::days(7)))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_lapsed_pending_does_not_block_new_invitation() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let now = Utc::now();

        let stale = invitation(org, "new@example.com", now - Duration::seconds(1));
        store.create_invitation(&stale).await.unwrap();

        store
            .create_invitation(&invitation(org, "new@example.com", now + Duration::days(7)))
            .await
            .unwrap();

        // The stale one was opportunistically expired.
        let stored = store.find_invitation(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn test_accept_invitation_is_single_shot() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let now = Utc::now();
        let inv = invitation(org, "new@example.com", now + Duration::days(7));
        store.create_invitation(&inv).await.unwrap();

        let m = Member::new(
            Uuid::now_v7(),
            org,
            Role::User,
            "Ana",
            "Reyes",
            "areyes",
            "new@example.com",
        );
        let accepted = store.accept_invitation(inv.id, &m, now).await.unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.accepted_at, Some(now));

        let other = Member::new(
            Uuid::now_v7(),
            org,
            Role::User,
            "Bob",
            "Reyes",
            "breyes",
            "new2@example.com",
        );
        let err = store.accept_invitation(inv.id, &other, now).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn test_profile_lookup_ignores_tombstones() {
        let store = MemoryDirectory::new();
        let org = Uuid::now_v7();
        let m = member(org, Role::Admin, "Ana", "Reyes", "areyes");
        store.insert_member(&m).await.unwrap();

        let record = store.find_active_membership(m.id).await.unwrap().unwrap();
        assert_eq!(record.organization_id, org);
        assert_eq!(record.role, Role::Admin);

        let mut deleted = store.get_active(org, m.id).await.unwrap().unwrap();
        deleted.deleted_at = Some(Utc::now());
        store.update_member(&deleted).await.unwrap();

        assert!(store.find_active_membership(m.id).await.unwrap().is_none());
    }
}
