//! Member directory operations.
//!
//! High-level membership operations with permission checks, the last-owner
//! protection rule, and the ownership transfer protocol. Every operation
//! takes an already-resolved [`Principal`] and scopes all storage access to
//! the principal's organization.
//!
//! Mutations follow an optimistic read → decide → compare-and-swap shape:
//! the store rejects writes against stale versions, and the operation
//! re-reads and re-decides on conflict. The decision (including owner
//! counting) is therefore never applied to state that moved underneath it.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use wrench_auth::{require, Principal};
use wrench_org::{Member, Organization, Role};
use wrench_rbac::Permission;

use crate::error::{DirectoryError, Result, StorageError};
use crate::storage::DirectoryStore;

/// How many times a conflicted compare-and-swap is re-attempted before the
/// conflict is surfaced to the caller as retryable.
const MAX_CAS_ATTEMPTS: u32 = 3;

/// Partial update of a member's non-role profile fields.
///
/// Role and organization are deliberately absent: roles change only through
/// [`MemberDirectory::change_role`] or an ownership transfer, and members
/// never move between organizations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberUpdate {
    /// New first name
    pub first_name: Option<String>,

    /// New last name
    pub last_name: Option<String>,

    /// New username (unique within the organization)
    pub username: Option<String>,

    /// New phone number
    pub phone: Option<String>,

    /// New street address
    pub street: Option<String>,

    /// New city
    pub city: Option<String>,

    /// New state or region
    pub region: Option<String>,

    /// New postal code
    pub postal_code: Option<String>,
}

impl MemberUpdate {
    fn apply(&self, member: &mut Member) {
        if let Some(first_name) = &self.first_name {
            member.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            member.last_name = last_name.clone();
        }
        if let Some(username) = &self.username {
            member.username = username.clone();
        }
        if let Some(phone) = &self.phone {
            member.phone = Some(phone.clone());
        }
        if let Some(street) = &self.street {
            member.street = Some(street.clone());
        }
        if let Some(city) = &self.city {
            member.city = Some(city.clone());
        }
        if let Some(region) = &self.region {
            member.region = Some(region.clone());
        }
        if let Some(postal_code) = &self.postal_code {
            member.postal_code = Some(postal_code.clone());
        }
    }
}

/// Partial update of organization attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    /// New display name
    pub name: Option<String>,

    /// New registered business name
    pub business_name: Option<String>,

    /// New street address
    pub street: Option<String>,

    /// New city
    pub city: Option<String>,

    /// New state or region
    pub region: Option<String>,

    /// New postal code
    pub postal_code: Option<String>,

    /// New phone number
    pub phone: Option<String>,

    /// New website URL
    pub website: Option<String>,
}

impl OrganizationUpdate {
    fn apply(&self, organization: &mut Organization) {
        if let Some(name) = &self.name {
            organization.name = name.clone();
        }
        if let Some(business_name) = &self.business_name {
            organization.business_name = Some(business_name.clone());
        }
        if let Some(street) = &self.street {
            organization.street = Some(street.clone());
        }
        if let Some(city) = &self.city {
            organization.city = Some(city.clone());
        }
        if let Some(region) = &self.region {
            organization.region = Some(region.clone());
        }
        if let Some(postal_code) = &self.postal_code {
            organization.postal_code = Some(postal_code.clone());
        }
        if let Some(phone) = &self.phone {
            organization.phone = Some(phone.clone());
        }
        if let Some(website) = &self.website {
            organization.website = Some(website.clone());
        }
    }
}

/// Member directory - membership operations with permission checks.
///
/// # Example
///
/// ```rust,ignore
/// use wrench_members::{MemberDirectory, MemoryDirectory};
///
/// let directory = MemberDirectory::new(MemoryDirectory::new());
///
/// let members = directory.list_members(&principal).await?;
/// directory.change_role(&principal, member_id, Role::Admin).await?;
/// ```
pub struct MemberDirectory<S>
where
    S: DirectoryStore,
{
    store: S,
}

impl<S> MemberDirectory<S>
where
    S: DirectoryStore,
{
    /// Create a new member directory over a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// List active members of the actor's organization, ordered by first
    /// name then last name.
    pub async fn list_members(&self, actor: &Principal) -> Result<Vec<Member>> {
        let actor = require(actor, Permission::UserRead)?;
        Ok(self.store.list_active(actor.organization_id).await?)
    }

    /// Get an active member of the actor's organization.
    pub async fn get_member(&self, actor: &Principal, member_id: Uuid) -> Result<Member> {
        let actor = require(actor, Permission::UserRead)?;
        self.store
            .get_active(actor.organization_id, member_id)
            .await?
            .ok_or(DirectoryError::MemberNotFound)
    }

    /// Update a member's non-role profile fields.
    ///
    /// Members may always edit their own profile; editing anyone else
    /// requires the user-write permission.
    #[instrument(skip(self, actor, update), fields(organization_id = %actor.organization_id))]
    pub async fn update_member_info(
        &self,
        actor: &Principal,
        member_id: Uuid,
        update: MemberUpdate,
    ) -> Result<Member> {
        if !actor.is_self(member_id) {
            require(actor, Permission::UserWrite)?;
        }

        let mut attempts = 0;
        loop {
            let mut member = self
                .store
                .get_active(actor.organization_id, member_id)
                .await?
                .ok_or(DirectoryError::MemberNotFound)?;
            update.apply(&mut member);

            match self.store.update_member(&member).await {
                Ok(updated) => {
                    debug!(member_id = %member_id, "member info updated");
                    return Ok(updated);
                }
                Err(StorageError::Conflict) if attempts < MAX_CAS_ATTEMPTS => attempts += 1,
                Err(StorageError::Duplicate(_)) => return Err(DirectoryError::DuplicateMember),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Change a member's role.
    ///
    /// The owner role never moves through this operation: promoting to
    /// owner requires an ownership transfer, and demoting the sole owner is
    /// rejected outright.
    #[instrument(skip(self, actor), fields(organization_id = %actor.organization_id))]
    pub async fn change_role(
        &self,
        actor: &Principal,
        member_id: Uuid,
        new_role: Role,
    ) -> Result<Member> {
        require(actor, Permission::RoleChange)?;
        if new_role == Role::Owner {
            return Err(DirectoryError::OwnershipTransferRequired);
        }

        let mut attempts = 0;
        loop {
            let mut member = self
                .store
                .get_active(actor.organization_id, member_id)
                .await?
                .ok_or(DirectoryError::MemberNotFound)?;
            if member.role == new_role {
                return Ok(member);
            }
            if member.role == Role::Owner {
                // Demotion would drop the owner count; with a single owner
                // per organization that count is about to reach zero.
                let owners = self
                    .store
                    .count_active_owners(actor.organization_id)
                    .await?;
                if owners <= 1 {
                    return Err(DirectoryError::LastOwner);
                }
            }
            member.role = new_role;

            match self.store.update_member(&member).await {
                Ok(updated) => {
                    info!(member_id = %member_id, role = %new_role, "member role changed");
                    return Ok(updated);
                }
                Err(StorageError::Conflict) if attempts < MAX_CAS_ATTEMPTS => attempts += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Soft-delete a member.
    ///
    /// The tombstone removes the member from every subsequent query and
    /// permission grant; the row itself is never hard-deleted. Deleting the
    /// organization's sole owner is rejected.
    #[instrument(skip(self, actor), fields(organization_id = %actor.organization_id))]
    pub async fn delete_member(&self, actor: &Principal, member_id: Uuid) -> Result<()> {
        require(actor, Permission::UserDelete)?;

        let mut attempts = 0;
        loop {
            let mut member = self
                .store
                .get_active(actor.organization_id, member_id)
                .await?
                .ok_or(DirectoryError::MemberNotFound)?;
            if member.role == Role::Owner {
                let owners = self
                    .store
                    .count_active_owners(actor.organization_id)
                    .await?;
                if owners <= 1 {
                    return Err(DirectoryError::LastOwner);
                }
            }
            member.deleted_at = Some(chrono::Utc::now());

            match self.store.update_member(&member).await {
                Ok(_) => {
                    info!(member_id = %member_id, "member soft-deleted");
                    return Ok(());
                }
                Err(StorageError::Conflict) if attempts < MAX_CAS_ATTEMPTS => attempts += 1,
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Transfer organization ownership to another member.
    ///
    /// Applied as one atomic unit: the current owner becomes admin and the
    /// target becomes owner. The organization has exactly one owner before
    /// and after; no transient state with zero or two owners is ever
    /// observable. Irreversible: handing ownership back requires the new
    /// owner to initiate a fresh transfer.
    #[instrument(skip(self, actor), fields(organization_id = %actor.organization_id))]
    pub async fn transfer_ownership(
        &self,
        actor: &Principal,
        target_member_id: Uuid,
    ) -> Result<()> {
        require(actor, Permission::OwnershipTransfer)?;
        if actor.is_self(target_member_id) {
            return Err(DirectoryError::InvalidTarget(
                "cannot transfer ownership to yourself",
            ));
        }

        let mut attempts = 0;
        loop {
            // Re-read the actor's own row: the principal may be stale if
            // ownership moved since it was resolved.
            let mut current_owner = self
                .store
                .get_active(actor.organization_id, actor.user_id)
                .await?
                .ok_or(DirectoryError::MemberNotFound)?;
            if current_owner.role != Role::Owner {
                return Err(wrench_auth::AuthError::Forbidden {
                    permission: Permission::OwnershipTransfer,
                }
                .into());
            }

            let mut target = self
                .store
                .get_active(actor.organization_id, target_member_id)
                .await?
                .ok_or(DirectoryError::InvalidTarget(
                    "target is not an active member of this organization",
                ))?;

            current_owner.role = Role::Admin;
            target.role = Role::Owner;

            match self.store.update_member_pair(&current_owner, &target).await {
                Ok(()) => {
                    info!(
                        new_owner = %target_member_id,
                        former_owner = %actor.user_id,
                        "ownership transferred"
                    );
                    return Ok(());
                }
                Err(StorageError::Conflict) if attempts < MAX_CAS_ATTEMPTS => attempts += 1,
                Err(StorageError::NotFound) => {
                    return Err(DirectoryError::InvalidTarget(
                        "target is not an active member of this organization",
                    ))
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Update attributes of the actor's organization.
    #[instrument(skip(self, actor, update), fields(organization_id = %actor.organization_id))]
    pub async fn update_organization(
        &self,
        actor: &Principal,
        update: OrganizationUpdate,
    ) -> Result<Organization> {
        require(actor, Permission::OrgWrite)?;

        let mut organization = self
            .store
            .find_organization(actor.organization_id)
            .await?
            .ok_or(DirectoryError::OrganizationNotFound)?;
        update.apply(&mut organization);
        organization.touch();

        self.store.update_organization(&organization).await?;
        debug!("organization updated");
        Ok(organization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDirectory;
    use crate::storage::{MemberStore, OrganizationStore};
    use wrench_auth::AuthError;

    struct Fixture {
        directory: MemberDirectory<MemoryDirectory>,
        organization: Organization,
        owner: Principal,
        admin: Principal,
        user: Principal,
    }

    async fn fixture() -> Fixture {
        let store = MemoryDirectory::new();
        let organization = Organization::new("Northside Auto");
        store.insert_organization(&organization).await.unwrap();

        let mut principals = Vec::new();
        for (role, first, last, username) in [
            (Role::Owner, "Olive", "Nguyen", "onguyen"),
            (Role::Admin, "Ana", "Reyes", "areyes"),
            (Role::User, "Ural", "Smith", "usmith"),
        ] {
            let member = Member::new(
                Uuid::now_v7(),
                organization.id,
                role,
                first,
                last,
                username,
                format!("{username}@example.com"),
            );
            store.insert_member(&member).await.unwrap();
            principals.push(Principal::new(member.id, organization.id, role));
        }
        let user = principals.pop().unwrap();
        let admin = principals.pop().unwrap();
        let owner = principals.pop().unwrap();

        Fixture {
            directory: MemberDirectory::new(store),
            organization,
            owner,
            admin,
            user,
        }
    }

    #[tokio::test]
    async fn test_list_members_requires_read() {
        let fx = fixture().await;
        let members = fx.directory.list_members(&fx.user).await.unwrap();
        assert_eq!(members.len(), 3);
    }

    #[tokio::test]
    async fn test_self_service_info_update() {
        let fx = fixture().await;
        let update = MemberUpdate {
            phone: Some("555-0101".into()),
            ..Default::default()
        };
        let updated = fx
            .directory
            .update_member_info(&fx.user, fx.user.user_id, update)
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_plain_user_cannot_edit_others() {
        let fx = fixture().await;
        let err = fx
            .directory
            .update_member_info(&fx.user, fx.admin.user_id, MemberUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Auth(AuthError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_username_collision_on_update() {
        let fx = fixture().await;
        let update = MemberUpdate {
            username: Some("areyes".into()),
            ..Default::default()
        };
        let err = fx
            .directory
            .update_member_info(&fx.user, fx.user.user_id, update)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateMember));
    }

    #[tokio::test]
    async fn test_change_role_promotion_and_demotion() {
        let fx = fixture().await;

        let promoted = fx
            .directory
            .change_role(&fx.owner, fx.user.user_id, Role::Admin)
            .await
            .unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let demoted = fx
            .directory
            .change_role(&fx.admin, fx.user.user_id, Role::User)
            .await
            .unwrap();
        assert_eq!(demoted.role, Role::User);
    }

    #[tokio::test]
    async fn test_promotion_to_owner_requires_transfer() {
        let fx = fixture().await;
        let err = fx
            .directory
            .change_role(&fx.owner, fx.admin.user_id, Role::Owner)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::OwnershipTransferRequired));
    }

    #[tokio::test]
    async fn test_demoting_sole_owner_is_rejected() {
        let fx = fixture().await;
        let err = fx
            .directory
            .change_role(&fx.admin, fx.owner.user_id, Role::User)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::LastOwner));
    }

    #[tokio::test]
    async fn test_deleting_sole_owner_is_rejected() {
        let fx = fixture().await;
        let err = fx
            .directory
            .delete_member(&fx.admin, fx.owner.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::LastOwner));

        let owners = fx
            .directory
            .store()
            .count_active_owners(fx.organization.id)
            .await
            .unwrap();
        assert_eq!(owners, 1);
    }

    #[tokio::test]
    async fn test_transfer_then_delete_former_owner() {
        let fx = fixture().await;

        fx.directory
            .transfer_ownership(&fx.owner, fx.admin.user_id)
            .await
            .unwrap();

        let new_owner = fx
            .directory
            .get_member(&fx.user, fx.admin.user_id)
            .await
            .unwrap();
        assert_eq!(new_owner.role, Role::Owner);

        // The former owner is now admin and can be deleted.
        let new_owner_principal = Principal::new(fx.admin.user_id, fx.organization.id, Role::Owner);
        fx.directory
            .delete_member(&new_owner_principal, fx.owner.user_id)
            .await
            .unwrap();

        let owners = fx
            .directory
            .store()
            .count_active_owners(fx.organization.id)
            .await
            .unwrap();
        assert_eq!(owners, 1);
    }

    #[tokio::test]
    async fn test_transfer_by_admin_is_forbidden() {
        let fx = fixture().await;
        let err = fx
            .directory
            .transfer_ownership(&fx.admin, fx.user.user_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Auth(AuthError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_transfer_to_self_is_invalid() {
        let fx = fixture().await;
        let err = fx
            .directory
            .transfer_ownership(&fx.owner, fx.owner.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidTarget(_)));
    }

    #[tokio::test]
    async fn test_transfer_with_stale_principal_is_forbidden() {
        let fx = fixture().await;
        fx.directory
            .transfer_ownership(&fx.owner, fx.admin.user_id)
            .await
            .unwrap();

        // The old principal still claims the owner role, but the row says
        // otherwise; the fresh-row re-check wins.
        let err = fx
            .directory
            .transfer_ownership(&fx.owner, fx.user.user_id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Auth(AuthError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_organization() {
        let fx = fixture().await;
        let update = OrganizationUpdate {
            phone: Some("555-0134".into()),
            website: Some("https://northside.example.com".into()),
            ..Default::default()
        };
        let updated = fx
            .directory
            .update_organization(&fx.admin, update)
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0134"));

        let err = fx
            .directory
            .update_organization(&fx.user, OrganizationUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Auth(AuthError::Forbidden { .. })
        ));
    }
}
