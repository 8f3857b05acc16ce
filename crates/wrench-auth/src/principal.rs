//! Principals and identity collaborators
//!
//! This module defines the resolved request identity (`Principal`) and the
//! two collaborator traits the resolver needs: the black-box identity
//! provider and the membership lookup. No process-wide session state exists;
//! a principal is resolved per request and passed explicitly through every
//! call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use wrench_org::Role;

use crate::error::{AuthError, AuthResult};

/// The resolved identity making a request.
///
/// A principal carries everything downstream operations need to authorize
/// and scope their work: who is acting, for which organization, and with
/// what role. Every store query downstream must be scoped by
/// `organization_id` taken from a principal, never from client input.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use wrench_auth::Principal;
/// use wrench_org::Role;
///
/// let principal = Principal::new(Uuid::now_v7(), Uuid::now_v7(), Role::Admin);
/// assert_eq!(principal.role, Role::Admin);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    /// Member/account id of the actor
    pub user_id: Uuid,

    /// Organization the actor belongs to
    pub organization_id: Uuid,

    /// The actor's role in that organization
    pub role: Role,
}

impl Principal {
    /// Creates a new principal.
    pub fn new(user_id: Uuid, organization_id: Uuid, role: Role) -> Self {
        Self {
            user_id,
            organization_id,
            role,
        }
    }

    /// Check whether the principal is acting on their own membership.
    pub fn is_self(&self, member_id: Uuid) -> bool {
        self.user_id == member_id
    }
}

/// An authenticated session as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSession {
    /// Account id the session belongs to
    pub account_id: Uuid,

    /// Email the account was registered with
    pub email: String,
}

/// A member's organization membership as seen by the resolver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Member id (same as the account id)
    pub member_id: Uuid,

    /// Organization the member belongs to
    pub organization_id: Uuid,

    /// The member's role
    pub role: Role,
}

/// Black-box identity provider collaborator.
///
/// The platform treats authentication as a service: it can create accounts
/// and turn bearer tokens into sessions, and nothing else about it is
/// assumed.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account, returning the new account id.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> AuthResult<Uuid>;

    /// Resolve a bearer token into a session, if one is active.
    async fn session(&self, token: &str) -> AuthResult<Option<AccountSession>>;
}

/// Read-only membership lookup used by the principal resolver.
///
/// Implemented by the membership store; must only ever return active
/// (non-deleted) memberships.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// Find the active membership for an account, if any.
    async fn find_active_membership(&self, user_id: Uuid) -> AuthResult<Option<MembershipRecord>>;
}

struct MemoryIdentityInner {
    // email -> account id, for duplicate detection
    accounts_by_email: HashMap<String, Uuid>,
    accounts: HashMap<Uuid, String>,
    sessions: HashMap<String, AccountSession>,
}

/// In-memory identity provider.
///
/// This is suitable for single-process applications and testing. Cloning
/// shares the same underlying data.
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    inner: Arc<RwLock<MemoryIdentityInner>>,
}

impl MemoryIdentityProvider {
    /// Create an empty in-memory identity provider.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryIdentityInner {
                accounts_by_email: HashMap::new(),
                accounts: HashMap::new(),
                sessions: HashMap::new(),
            })),
        }
    }

    /// Register an account directly (for test setup), returning its id.
    pub async fn register_account(&self, email: &str) -> Uuid {
        let account_id = Uuid::now_v7();
        let mut inner = self.inner.write().await;
        inner
            .accounts_by_email
            .insert(email.to_string(), account_id);
        inner.accounts.insert(account_id, email.to_string());
        account_id
    }

    /// Issue a session token for an existing account.
    pub async fn issue_session(&self, account_id: Uuid) -> AuthResult<String> {
        let mut inner = self.inner.write().await;
        let email = inner
            .accounts
            .get(&account_id)
            .cloned()
            .ok_or_else(|| AuthError::Unavailable("unknown account".into()))?;
        let token = Uuid::now_v7().to_string();
        inner.sessions.insert(
            token.clone(),
            AccountSession { account_id, email },
        );
        Ok(token)
    }

    /// Invalidate a session token.
    pub async fn revoke_session(&self, token: &str) {
        self.inner.write().await.sessions.remove(token);
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        _password: &str,
        _display_name: &str,
    ) -> AuthResult<Uuid> {
        let mut inner = self.inner.write().await;
        if inner.accounts_by_email.contains_key(email) {
            return Err(AuthError::Unavailable(format!(
                "account already exists for {email}"
            )));
        }
        let account_id = Uuid::now_v7();
        inner
            .accounts_by_email
            .insert(email.to_string(), account_id);
        inner.accounts.insert(account_id, email.to_string());
        Ok(account_id)
    }

    async fn session(&self, token: &str) -> AuthResult<Option<AccountSession>> {
        Ok(self.inner.read().await.sessions.get(token).cloned())
    }
}
