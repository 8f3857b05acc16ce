//! Invitation configuration.

use chrono::Duration;

/// Configuration for invitation management.
///
/// # Example
///
/// ```rust
/// use wrench_members::InvitationConfig;
///
/// let config = InvitationConfig::new()
///     .expiry_days(14)
///     .max_pending_per_org(100);
/// assert_eq!(config.expiry_days, 14);
/// ```
#[derive(Clone, Debug)]
pub struct InvitationConfig {
    /// Days until an invitation expires.
    pub expiry_days: i64,

    /// Length of the generated accept token, in random bytes.
    pub token_bytes: usize,

    /// Maximum pending invitations per organization.
    pub max_pending_per_org: u32,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            token_bytes: 32,
            max_pending_per_org: 50,
        }
    }
}

impl InvitationConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set invitation expiry time in days.
    #[must_use]
    pub fn expiry_days(mut self, days: i64) -> Self {
        self.expiry_days = days;
        self
    }

    /// Set maximum pending invitations per organization.
    #[must_use]
    pub fn max_pending_per_org(mut self, max: u32) -> Self {
        self.max_pending_per_org = max;
        self
    }

    /// Get the expiry window as a duration.
    #[must_use]
    pub fn expiry(&self) -> Duration {
        Duration::days(self.expiry_days)
    }
}
