//! Principal resolution
//!
//! Turns an inbound bearer token into a [`Principal`] by consulting the
//! identity provider for the session and the membership lookup for the
//! account's organization and role. Read-only; no session state is held
//! anywhere in the process.

use crate::error::{AuthError, AuthResult};
use crate::principal::{IdentityProvider, Principal, ProfileLookup};

/// Resolves request identities into principals.
///
/// # Examples
///
/// ```rust,ignore
/// let resolver = PrincipalResolver::new(identity_provider, membership_store);
/// let principal = resolver.resolve(bearer_token).await?;
/// ```
pub struct PrincipalResolver<I, L> {
    identity: I,
    profiles: L,
}

impl<I, L> PrincipalResolver<I, L>
where
    I: IdentityProvider,
    L: ProfileLookup,
{
    /// Create a new resolver over its two collaborators.
    pub fn new(identity: I, profiles: L) -> Self {
        Self { identity, profiles }
    }

    /// Resolve a bearer token into a principal.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthenticationRequired`] if the token maps to no
    ///   active session
    /// - [`AuthError::ProfileNotFound`] if the authenticated account has no
    ///   active membership (an orphaned account is "no access", not a crash)
    pub async fn resolve(&self, token: &str) -> AuthResult<Principal> {
        let session = self
            .identity
            .session(token)
            .await?
            .ok_or(AuthError::AuthenticationRequired)?;

        let membership = self
            .profiles
            .find_active_membership(session.account_id)
            .await?
            .ok_or(AuthError::ProfileNotFound)?;

        Ok(Principal::new(
            membership.member_id,
            membership.organization_id,
            membership.role,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::{MembershipRecord, MemoryIdentityProvider};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use uuid::Uuid;
    use wrench_org::Role;

    #[derive(Default, Clone)]
    struct MapLookup {
        memberships: HashMap<Uuid, MembershipRecord>,
    }

    #[async_trait]
    impl ProfileLookup for MapLookup {
        async fn find_active_membership(
            &self,
            user_id: Uuid,
        ) -> AuthResult<Option<MembershipRecord>> {
            Ok(self.memberships.get(&user_id).copied())
        }
    }

    #[tokio::test]
    async fn test_resolve_happy_path() {
        let identity = MemoryIdentityProvider::new();
        let account_id = identity.register_account("ana@example.com").await;
        let token = identity.issue_session(account_id).await.unwrap();

        let organization_id = Uuid::now_v7();
        let mut lookup = MapLookup::default();
        lookup.memberships.insert(
            account_id,
            MembershipRecord {
                member_id: account_id,
                organization_id,
                role: Role::Admin,
            },
        );

        let resolver = PrincipalResolver::new(identity, lookup);
        let principal = resolver.resolve(&token).await.unwrap();

        assert_eq!(principal.user_id, account_id);
        assert_eq!(principal.organization_id, organization_id);
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_missing_session_is_authentication_error() {
        let resolver = PrincipalResolver::new(MemoryIdentityProvider::new(), MapLookup::default());

        let err = resolver.resolve("no-such-token").await.unwrap_err();
        assert!(matches!(err, AuthError::AuthenticationRequired));
    }

    #[tokio::test]
    async fn test_orphaned_account_is_profile_not_found() {
        let identity = MemoryIdentityProvider::new();
        let account_id = identity.register_account("ghost@example.com").await;
        let token = identity.issue_session(account_id).await.unwrap();

        let resolver = PrincipalResolver::new(identity, MapLookup::default());
        let err = resolver.resolve(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::ProfileNotFound));
    }
}
