//! Notification collaborator.
//!
//! Outbound email is best-effort: delivery failure is logged and never
//! fails the operation that triggered it.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

use wrench_org::Role;

/// Notification delivery failure.
#[derive(Debug, Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound notification collaborator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send an invitation email carrying the accept token.
    async fn send_invitation(
        &self,
        email: &str,
        organization_name: &str,
        role: Role,
        token: &str,
    ) -> Result<(), NotifyError>;

    /// Send a welcome email after an invitation is accepted.
    async fn send_welcome(
        &self,
        email: &str,
        name: &str,
        organization_name: &str,
    ) -> Result<(), NotifyError>;
}

/// Send an invitation email, logging failure instead of propagating it.
pub(crate) async fn send_invitation_best_effort<N: Notifier>(
    notifier: &N,
    email: &str,
    organization_name: &str,
    role: Role,
    token: &str,
) {
    if let Err(err) = notifier
        .send_invitation(email, organization_name, role, token)
        .await
    {
        warn!(email, %err, "invitation email delivery failed");
    }
}

/// Send a welcome email, logging failure instead of propagating it.
pub(crate) async fn send_welcome_best_effort<N: Notifier>(
    notifier: &N,
    email: &str,
    name: &str,
    organization_name: &str,
) {
    if let Err(err) = notifier.send_welcome(email, name, organization_name).await {
        warn!(email, %err, "welcome email delivery failed");
    }
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_invitation(
        &self,
        _email: &str,
        _organization_name: &str,
        _role: Role,
        _token: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn send_welcome(
        &self,
        _email: &str,
        _name: &str,
        _organization_name: &str,
    ) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// A notification captured by [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentNotification {
    /// An invitation email.
    Invitation {
        /// Recipient address.
        email: String,
        /// Inviting organization.
        organization_name: String,
        /// Role offered.
        role: Role,
    },
    /// A welcome email.
    Welcome {
        /// Recipient address.
        email: String,
        /// Recipient display name.
        name: String,
        /// Organization joined.
        organization_name: String,
    },
}

/// Notifier that records every send (for tests), optionally failing.
///
/// Cloning shares the same underlying data.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentNotification>>>,
    failing: Arc<std::sync::atomic::AtomicBool>,
}

impl RecordingNotifier {
    /// Create a new recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail. Failed sends are not recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Everything sent so far.
    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }

    fn check_failing(&self) -> Result<(), NotifyError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            Err(NotifyError("smtp connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_invitation(
        &self,
        email: &str,
        organization_name: &str,
        role: Role,
        _token: &str,
    ) -> Result<(), NotifyError> {
        self.check_failing()?;
        self.sent.lock().await.push(SentNotification::Invitation {
            email: email.to_string(),
            organization_name: organization_name.to_string(),
            role,
        });
        Ok(())
    }

    async fn send_welcome(
        &self,
        email: &str,
        name: &str,
        organization_name: &str,
    ) -> Result<(), NotifyError> {
        self.check_failing()?;
        self.sent.lock().await.push(SentNotification::Welcome {
            email: email.to_string(),
            name: name.to_string(),
            organization_name: organization_name.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_notifier_captures_sends() {
        let notifier = RecordingNotifier::new();
        notifier
            .send_invitation("new@example.com", "Northside Auto", Role::User, "tok")
            .await
            .unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], SentNotification::Invitation { email, .. } if email == "new@example.com"));
    }

    #[tokio::test]
    async fn test_failing_notifier_errors() {
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);

        let err = notifier
            .send_welcome("new@example.com", "Ana Reyes", "Northside Auto")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("smtp"));
        assert!(notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_best_effort_send_swallows_failure() {
        let notifier = RecordingNotifier::new();
        notifier.set_failing(true);
        // Must not panic or propagate.
        send_welcome_best_effort(&notifier, "new@example.com", "Ana", "Northside Auto").await;
    }
}
