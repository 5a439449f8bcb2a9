//! Session Store Gateway port
//!
//! Defines the interface to the authority that owns session records.
//! Every change is a whole-record mutation applied by the store; clients
//! only observe the results through a subscription.

use async_trait::async_trait;
use dialogos_domain::{DomainError, Mutation, MutationOutcome, Session, SessionId, SessionInit};
use thiserror::Error;
use tokio::sync::watch;

/// Errors that can occur during store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Transient connectivity failure; the caller may retry with backoff
    #[error("Session store unavailable: {0}")]
    Unavailable(String),

    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Session already exists: {0}")]
    AlreadyExists(SessionId),

    /// The session rules refused the mutation; the record is unchanged
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    pub fn domain_error(&self) -> Option<&DomainError> {
        match self {
            StoreError::Rejected(e) => Some(e),
            _ => None,
        }
    }
}

/// Live view of one session record.
///
/// Dropping the subscription unsubscribes.
pub struct SessionSubscription {
    receiver: watch::Receiver<Session>,
}

impl SessionSubscription {
    pub fn new(receiver: watch::Receiver<Session>) -> Self {
        Self { receiver }
    }

    /// The most recently delivered record.
    pub fn current(&self) -> Session {
        self.receiver.borrow().clone()
    }

    /// Wait for the next committed version of the record.
    pub async fn changed(&mut self) -> Result<Session, StoreError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StoreError::Unavailable("subscription closed".to_string()))?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

/// Gateway to the canonical session records
///
/// Implementations apply each [`Mutation`] atomically against the current
/// record and publish the new record to subscribers on commit.
#[async_trait]
pub trait SessionStoreGateway: Send + Sync {
    /// Create a record; returns the assigned id (or the fixed one in `init.id`)
    async fn create_session(&self, init: SessionInit) -> Result<SessionId, StoreError>;

    async fn load_session(&self, id: &SessionId) -> Result<Session, StoreError>;

    async fn subscribe(&self, id: &SessionId) -> Result<SessionSubscription, StoreError>;

    /// Apply one mutation as a whole-record update
    async fn apply_mutation(
        &self,
        id: &SessionId,
        mutation: Mutation,
    ) -> Result<MutationOutcome, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogos_domain::SessionPhase;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("offline".to_string()).is_retryable());
        assert!(!StoreError::NotFound(SessionId::new("s1")).is_retryable());
        let rejected = StoreError::from(DomainError::SafetyPauseActive);
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.domain_error(), Some(&DomainError::SafetyPauseActive));
    }

    #[tokio::test]
    async fn test_subscription_delivers_new_record() {
        let session = Session::create(
            SessionId::new("s1"),
            SessionInit::new("Practice", "host", "Hana"),
            chrono::Utc::now(),
        )
        .unwrap();
        let (sender, receiver) = watch::channel(session.clone());
        let mut subscription = SessionSubscription::new(receiver);

        let mut next = session;
        next.phase = SessionPhase::TopicSelection;
        sender.send_replace(next);

        let delivered = subscription.changed().await.unwrap();
        assert_eq!(delivered.phase, SessionPhase::TopicSelection);
        assert_eq!(subscription.current().phase, SessionPhase::TopicSelection);

        drop(sender);
        assert!(subscription.changed().await.is_err());
    }
}
