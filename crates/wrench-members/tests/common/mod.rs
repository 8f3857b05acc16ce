//! Shared test fixtures for the membership engine.

#![allow(dead_code)]

use uuid::Uuid;

use wrench_auth::{MemoryIdentityProvider, Principal};
use wrench_members::{
    InvitationConfig, InvitationService, MemberDirectory, MemberStore, MemoryDirectory,
    OrganizationStore, RecordingNotifier,
};
use wrench_org::{Member, Organization, Role};

/// A fully wired engine over shared in-memory collaborators.
pub struct TestEnv {
    pub store: MemoryDirectory,
    pub identity: MemoryIdentityProvider,
    pub notifier: RecordingNotifier,
    pub directory: MemberDirectory<MemoryDirectory>,
    pub invitations: InvitationService<MemoryDirectory, MemoryIdentityProvider, RecordingNotifier>,
    pub organization: Organization,
    pub owner: Principal,
    pub admin: Principal,
    pub user: Principal,
}

/// Build an environment with one organization seeded with an owner, an
/// admin, and a regular user.
pub async fn env() -> TestEnv {
    env_with_config(InvitationConfig::default()).await
}

/// Same as [`env`] but with a custom invitation configuration.
pub async fn env_with_config(config: InvitationConfig) -> TestEnv {
    let store = MemoryDirectory::new();
    let identity = MemoryIdentityProvider::new();
    let notifier = RecordingNotifier::new();

    let organization = Organization::new("Northside Auto");
    store.insert_organization(&organization).await.unwrap();

    let owner = seed_member(&store, organization.id, Role::Owner, "Olive", "Nguyen", "onguyen").await;
    let admin = seed_member(&store, organization.id, Role::Admin, "Ana", "Reyes", "areyes").await;
    let user = seed_member(&store, organization.id, Role::User, "Ural", "Smith", "usmith").await;

    TestEnv {
        directory: MemberDirectory::new(store.clone()),
        invitations: InvitationService::new(
            store.clone(),
            identity.clone(),
            notifier.clone(),
            config,
        ),
        store,
        identity,
        notifier,
        organization,
        owner,
        admin,
        user,
    }
}

/// Insert an active member directly and return their principal.
pub async fn seed_member(
    store: &MemoryDirectory,
    organization_id: Uuid,
    role: Role,
    first: &str,
    last: &str,
    username: &str,
) -> Principal {
    let member = Member::new(
        Uuid::now_v7(),
        organization_id,
        role,
        first,
        last,
        username,
        format!("{username}@example.com"),
    );
    store.insert_member(&member).await.unwrap();
    Principal::new(member.id, organization_id, role)
}

/// A stable snapshot of all active memberships, for before/after
/// no-mutation assertions.
pub async fn membership_snapshot(
    store: &MemoryDirectory,
    organization_id: Uuid,
) -> Vec<(Uuid, Role)> {
    store
        .list_active(organization_id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| (m.id, m.role))
        .collect()
}
