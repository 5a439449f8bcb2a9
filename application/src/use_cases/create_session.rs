//! Create session use case
//!
//! Turns a host's creation form into a [`SessionInit`] using the session
//! policy defaults and registers it with the store.

use crate::config::SessionPolicyConfig;
use crate::ports::session_store::{SessionStoreGateway, StoreError};
use dialogos_domain::{HostRole, SessionId, SessionInit, UserId};
use std::sync::Arc;
use tracing::info;

/// Input for the CreateSession use case.
#[derive(Debug, Clone)]
pub struct CreateSessionInput {
    pub name: String,
    pub host_id: UserId,
    pub host_name: String,
    pub host_role: HostRole,
    /// Round length; the policy default applies when `None`
    pub round_minutes: Option<u32>,
    pub topic: Option<String>,
    pub topic_suggestions: Vec<String>,
}

impl CreateSessionInput {
    pub fn new(
        name: impl Into<String>,
        host_id: impl Into<UserId>,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host_id: host_id.into(),
            host_name: host_name.into(),
            host_role: HostRole::Participant,
            round_minutes: None,
            topic: None,
            topic_suggestions: Vec::new(),
        }
    }

    pub fn with_host_role(mut self, role: HostRole) -> Self {
        self.host_role = role;
        self
    }

    pub fn with_round_minutes(mut self, minutes: u32) -> Self {
        self.round_minutes = Some(minutes);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_topic_suggestions(mut self, topics: Vec<String>) -> Self {
        self.topic_suggestions = topics;
        self
    }
}

pub struct CreateSessionUseCase {
    store: Arc<dyn SessionStoreGateway>,
    policy: SessionPolicyConfig,
}

impl CreateSessionUseCase {
    pub fn new(store: Arc<dyn SessionStoreGateway>, policy: SessionPolicyConfig) -> Self {
        Self { store, policy }
    }

    pub async fn execute(&self, input: CreateSessionInput) -> Result<SessionId, StoreError> {
        let mut init = SessionInit::new(input.name, input.host_id, input.host_name)
            .with_host_role(input.host_role)
            .with_topic_suggestions(input.topic_suggestions);
        if let Some(topic) = input.topic {
            init = init.with_topic(topic);
        }
        let init = self.policy.apply_to(init, input.round_minutes);
        init.validate()?;

        let id = self.store.create_session(init).await?;
        info!("Created session {}", id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::session_store::SessionSubscription;
    use async_trait::async_trait;
    use dialogos_domain::{Mutation, MutationOutcome, Session};
    use std::sync::Mutex;

    struct RecordingStore {
        created: Mutex<Vec<SessionInit>>,
    }

    #[async_trait]
    impl SessionStoreGateway for RecordingStore {
        async fn create_session(&self, init: SessionInit) -> Result<SessionId, StoreError> {
            self.created.lock().unwrap().push(init);
            Ok(SessionId::new("created"))
        }

        async fn load_session(&self, id: &SessionId) -> Result<Session, StoreError> {
            Err(StoreError::NotFound(id.clone()))
        }

        async fn subscribe(&self, id: &SessionId) -> Result<SessionSubscription, StoreError> {
            Err(StoreError::NotFound(id.clone()))
        }

        async fn apply_mutation(
            &self,
            id: &SessionId,
            _mutation: Mutation,
        ) -> Result<MutationOutcome, StoreError> {
            Err(StoreError::NotFound(id.clone()))
        }
    }

    fn use_case() -> (Arc<RecordingStore>, CreateSessionUseCase) {
        let store = Arc::new(RecordingStore {
            created: Mutex::new(Vec::new()),
        });
        let use_case = CreateSessionUseCase::new(store.clone(), SessionPolicyConfig::default());
        (store, use_case)
    }

    #[tokio::test]
    async fn test_policy_defaults_are_applied() {
        let (store, use_case) = use_case();
        let input = CreateSessionInput::new("Practice", "host", "Hana").with_topic("Trust");
        let id = use_case.execute(input).await.unwrap();

        assert_eq!(id, SessionId::new("created"));
        let created = store.created.lock().unwrap();
        assert_eq!(created[0].round_minutes, 5);
        assert_eq!(created[0].max_participants, 5);
        assert_eq!(created[0].topic, "Trust");
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        let (store, use_case) = use_case();
        let input = CreateSessionInput::new("Practice", "host", "Hana").with_round_minutes(90);
        let result = use_case.execute(input).await;

        assert!(matches!(result, Err(StoreError::Rejected(_))));
        assert!(store.created.lock().unwrap().is_empty());
    }
}
