//! Per-participant session client
//!
//! [`SessionClient`] is what one participant's device holds: their
//! identity, the session id, the store and their own video transport.
//! Each operation is one round-trip through the store; the client keeps no
//! optimistic phase or role state of its own.
//!
//! Phase-advancing operations carry a [`PhaseGuard`] built from the last
//! record this client observed, so two devices racing on the same button
//! advance the session once.

use crate::ports::session_store::{SessionStoreGateway, SessionSubscription, StoreError};
use crate::ports::video_call::{VideoCallController, VideoCallError, disable_video};
use crate::use_cases::resolve_partition::{PartitionOutcome, ResolvePartitionUseCase};
use dialogos_domain::{
    ConnectionStatus, Mutation, MutationOutcome, PartitionStrategy, PhaseGuard, Role, Session,
    SessionChange, SessionId, SessionOp, SessionView, SuggestionId, UserId,
};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Video(#[from] VideoCallError),
}

impl SessionClientError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionClientError::Store(e) if e.is_retryable())
    }
}

pub struct SessionClient {
    store: Arc<dyn SessionStoreGateway>,
    video: Arc<dyn VideoCallController>,
    session_id: SessionId,
    user: UserId,
    /// Phase and round of the last record this client saw
    seen: Mutex<Option<PhaseGuard>>,
}

impl SessionClient {
    pub fn new(
        store: Arc<dyn SessionStoreGateway>,
        video: Arc<dyn VideoCallController>,
        session_id: SessionId,
        user: impl Into<UserId>,
    ) -> Self {
        Self {
            store,
            video,
            session_id,
            user: user.into(),
            seen: Mutex::new(None),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    // ==================== Observation ====================

    /// Record what the user is looking at; later guards are built from it.
    pub fn observe(&self, session: &Session) {
        if let Ok(mut seen) = self.seen.lock() {
            *seen = Some(PhaseGuard::new(session.phase, session.round));
        }
    }

    pub async fn load(&self) -> Result<Session, SessionClientError> {
        let session = self.store.load_session(&self.session_id).await?;
        self.observe(&session);
        Ok(session)
    }

    /// Current projection for this participant.
    pub async fn view(&self) -> Result<SessionView, SessionClientError> {
        let session = self.load().await?;
        Ok(SessionView::project(&session, &self.user, chrono::Utc::now()))
    }

    pub async fn subscribe(&self) -> Result<SessionSubscription, SessionClientError> {
        Ok(self.store.subscribe(&self.session_id).await?)
    }

    // ==================== Lobby ====================

    pub async fn join(&self, display_name: &str) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::JoinSession {
            display_name: display_name.to_string(),
        })
        .await
    }

    pub async fn leave(&self) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::LeaveSession).await
    }

    /// Pick a role for yourself in the lobby.
    pub async fn choose_role(&self, role: Role) -> Result<MutationOutcome, SessionClientError> {
        self.assign_role(self.user.clone(), role).await
    }

    /// Set someone's lobby role (host, or yourself).
    pub async fn assign_role(
        &self,
        target: UserId,
        role: Role,
    ) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::SetParticipantRole { target, role }).await
    }

    pub async fn report_connection(
        &self,
        status: ConnectionStatus,
    ) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::SetConnectionStatus { status }).await
    }

    pub async fn resolve_partition(
        &self,
        strategy: PartitionStrategy,
    ) -> Result<PartitionOutcome, SessionClientError> {
        let use_case = ResolvePartitionUseCase::new(Arc::clone(&self.store));
        Ok(use_case
            .execute(&self.session_id, &self.user, strategy)
            .await?)
    }

    // ==================== Topics ====================

    pub async fn suggest_topic(&self, text: &str) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::AddTopicSuggestion {
            text: text.to_string(),
        })
        .await
    }

    pub async fn vote_topic(
        &self,
        suggestion: SuggestionId,
    ) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::VoteTopic { suggestion }).await
    }

    // ==================== Phase control (host) ====================

    pub async fn start(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::StartSession).await
    }

    pub async fn select_topic(
        &self,
        suggestion: Option<SuggestionId>,
    ) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::SelectTopic { suggestion }).await
    }

    pub async fn complete_hello_check_in(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::CompleteHelloCheckIn).await
    }

    pub async fn complete_round(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::CompleteRound).await
    }

    pub async fn complete_scribe_feedback(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::CompleteScribeFeedback).await
    }

    pub async fn continue_rounds(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::ContinueRounds).await
    }

    pub async fn start_free_dialogue(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::StartFreeDialogue).await
    }

    pub async fn end_session(&self) -> Result<MutationOutcome, SessionClientError> {
        self.advance(SessionOp::EndSession).await
    }

    // ==================== Scribe ====================

    pub async fn submit_scribe_notes(
        &self,
        notes: &str,
    ) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::SubmitScribeNotes {
            notes: notes.to_string(),
        })
        .await
    }

    // ==================== Safety ====================

    /// Pause the session. On commit the caller's own camera goes off;
    /// a camera failure is logged and does not undo the pause.
    pub async fn request_safety_timeout(&self) -> Result<MutationOutcome, SessionClientError> {
        let outcome = self.send(SessionOp::RequestSafetyTimeout).await?;
        if let MutationOutcome::Applied(SessionChange::SafetyStarted { by }) = &outcome
            && by == &self.user
            && let Err(e) = disable_video(self.video.as_ref()).await
        {
            warn!("Could not disable video for {}: {}", self.user, e);
        }
        Ok(outcome)
    }

    pub async fn end_safety_timeout(&self) -> Result<MutationOutcome, SessionClientError> {
        self.send(SessionOp::EndSafetyTimeout).await
    }

    // ==================== Call transport ====================

    pub async fn toggle_video(&self) -> Result<bool, SessionClientError> {
        Ok(self.video.toggle_video().await?)
    }

    pub async fn toggle_mute(&self) -> Result<bool, SessionClientError> {
        Ok(self.video.toggle_mute().await?)
    }

    // ==================== Internals ====================

    async fn send(&self, op: SessionOp) -> Result<MutationOutcome, SessionClientError> {
        self.submit(Mutation::new(self.user.clone(), op)).await
    }

    /// Send a phase-advancing operation guarded by the last observed phase.
    async fn advance(&self, op: SessionOp) -> Result<MutationOutcome, SessionClientError> {
        let seen = self.seen.lock().ok().and_then(|seen| *seen);
        let guard = match seen {
            Some(guard) => guard,
            None => {
                let session = self.load().await?;
                PhaseGuard::new(session.phase, session.round)
            }
        };
        self.submit(Mutation::new(self.user.clone(), op).guarded(guard))
            .await
    }

    async fn submit(&self, mutation: Mutation) -> Result<MutationOutcome, SessionClientError> {
        let name = mutation.op.name();
        match self.store.apply_mutation(&self.session_id, mutation).await {
            Ok(outcome) => {
                match &outcome {
                    MutationOutcome::Applied(change) => {
                        if let SessionChange::PhaseChanged { to, round, .. } = change
                            && let Ok(mut seen) = self.seen.lock()
                        {
                            *seen = Some(PhaseGuard::new(*to, *round));
                        }
                        info!("{} by {}: {:?}", name, self.user, change);
                    }
                    MutationOutcome::Unchanged(reason) => {
                        debug!("{} by {} left the session unchanged: {:?}", name, self.user, reason);
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!("{} by {} failed: {}", name, self.user, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::video_call::NoVideoCall;
    use async_trait::async_trait;
    use dialogos_domain::{
        DomainError, NoOpReason, SafetyEndPolicy, SessionInit, SessionPhase,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Store that keeps records in a map, with an offline switch.
    #[derive(Default)]
    struct MapStore {
        sessions: Mutex<HashMap<SessionId, Session>>,
        offline: AtomicBool,
    }

    impl MapStore {
        fn check_online(&self) -> Result<(), StoreError> {
            if self.offline.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SessionStoreGateway for MapStore {
        async fn create_session(&self, init: SessionInit) -> Result<SessionId, StoreError> {
            self.check_online()?;
            let id = init.id.clone().unwrap_or_else(|| SessionId::new("s1"));
            let session = Session::create(id.clone(), init, chrono::Utc::now())?;
            self.sessions.lock().unwrap().insert(id.clone(), session);
            Ok(id)
        }

        async fn load_session(&self, id: &SessionId) -> Result<Session, StoreError> {
            self.check_online()?;
            self.sessions
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        }

        async fn subscribe(&self, id: &SessionId) -> Result<SessionSubscription, StoreError> {
            Err(StoreError::NotFound(id.clone()))
        }

        async fn apply_mutation(
            &self,
            id: &SessionId,
            mutation: Mutation,
        ) -> Result<MutationOutcome, StoreError> {
            self.check_online()?;
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            let mut next = session.clone();
            let outcome = next.apply(&mutation, chrono::Utc::now())?;
            *session = next;
            Ok(outcome)
        }
    }

    struct MockVideo {
        enabled: AtomicBool,
        toggles: AtomicUsize,
    }

    impl MockVideo {
        fn on() -> Self {
            Self {
                enabled: AtomicBool::new(true),
                toggles: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VideoCallController for MockVideo {
        async fn toggle_video(&self) -> Result<bool, VideoCallError> {
            self.toggles.fetch_add(1, Ordering::SeqCst);
            Ok(!self.enabled.fetch_xor(true, Ordering::SeqCst))
        }

        async fn toggle_mute(&self) -> Result<bool, VideoCallError> {
            Ok(true)
        }

        fn is_video_enabled(&self) -> bool {
            self.enabled.load(Ordering::SeqCst)
        }

        fn connection_state(&self) -> ConnectionStatus {
            ConnectionStatus::Good
        }
    }

    async fn setup(
        policy: SafetyEndPolicy,
    ) -> (Arc<MapStore>, SessionClient, SessionClient, Arc<MockVideo>) {
        let store = Arc::new(MapStore::default());
        let init = SessionInit::new("Practice", "host", "Hana").with_safety_end_policy(policy);
        let id = store.create_session(init).await.unwrap();

        let host = SessionClient::new(store.clone(), Arc::new(NoVideoCall), id.clone(), "host");
        let video = Arc::new(MockVideo::on());
        let guest = SessionClient::new(store.clone(), video.clone(), id, "b");
        guest.join("Bo").await.unwrap();
        (store, host, guest, video)
    }

    async fn to_listening(host: &SessionClient) {
        host.start().await.unwrap();
        host.select_topic(None).await.unwrap();
        host.complete_hello_check_in().await.unwrap();
    }

    #[tokio::test]
    async fn test_pair_session_walkthrough() {
        let (_store, host, guest, _video) = setup(SafetyEndPolicy::RequesterOnly).await;
        to_listening(&host).await;

        let view = guest.view().await.unwrap();
        assert_eq!(view.phase, SessionPhase::Listening);
        assert_eq!(view.my_role, Some(Role::Listener));

        host.complete_round().await.unwrap();
        host.complete_scribe_feedback().await.unwrap();
        let view = guest.view().await.unwrap();
        assert_eq!(view.round, 2);
        assert_eq!(view.my_role, Some(Role::Speaker));

        host.complete_round().await.unwrap();
        assert_eq!(host.view().await.unwrap().phase, SessionPhase::Completion);
    }

    #[tokio::test]
    async fn test_duplicate_advance_from_two_devices_is_noop() {
        let (store, host, _guest, _video) = setup(SafetyEndPolicy::RequesterOnly).await;
        to_listening(&host).await;

        // a second device of the host that saw the same listening round
        let other_device = SessionClient::new(
            store.clone(),
            Arc::new(NoVideoCall),
            host.session_id().clone(),
            "host",
        );
        other_device.load().await.unwrap();

        assert!(host.complete_round().await.unwrap().is_applied());
        assert_eq!(
            other_device.complete_round().await.unwrap(),
            MutationOutcome::Unchanged(NoOpReason::StaleGuard)
        );
        let session = host.load().await.unwrap();
        assert_eq!(session.phase, SessionPhase::Transition);
        assert_eq!(session.round, 1);
    }

    #[tokio::test]
    async fn test_guest_cannot_advance() {
        let (_store, host, guest, _video) = setup(SafetyEndPolicy::RequesterOnly).await;
        to_listening(&host).await;

        let err = guest.complete_round().await.unwrap_err();
        assert!(matches!(
            err,
            SessionClientError::Store(StoreError::Rejected(
                DomainError::UnauthorizedOperation { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_safety_request_disables_own_video_once() {
        let (_store, host, guest, video) = setup(SafetyEndPolicy::RequesterOnly).await;
        to_listening(&host).await;

        guest.request_safety_timeout().await.unwrap();
        assert!(!video.is_video_enabled());

        let second = host.request_safety_timeout().await.unwrap();
        assert_eq!(
            second,
            MutationOutcome::Unchanged(NoOpReason::SafetyAlreadyActive)
        );
        assert_eq!(video.toggles.load(Ordering::SeqCst), 1);

        let err = host.complete_round().await.unwrap_err();
        assert!(matches!(
            err,
            SessionClientError::Store(StoreError::Rejected(DomainError::SafetyPauseActive))
        ));

        assert!(host.end_safety_timeout().await.is_err());
        guest.end_safety_timeout().await.unwrap();
        assert!(host.complete_round().await.unwrap().is_applied());
    }

    #[tokio::test]
    async fn test_host_may_end_pause_when_policy_allows() {
        let (_store, host, guest, _video) = setup(SafetyEndPolicy::RequesterOrHost).await;
        to_listening(&host).await;

        guest.request_safety_timeout().await.unwrap();
        let view = host.view().await.unwrap();
        assert!(view.safety.can_end);
        assert!(host.end_safety_timeout().await.unwrap().is_applied());
    }

    #[tokio::test]
    async fn test_store_outage_is_retryable() {
        let (store, host, _guest, _video) = setup(SafetyEndPolicy::RequesterOnly).await;
        store.offline.store(true, Ordering::SeqCst);

        let err = host.start().await.unwrap_err();
        assert!(err.is_retryable());

        store.offline.store(false, Ordering::SeqCst);
        assert!(host.start().await.unwrap().is_applied());
    }

    #[tokio::test]
    async fn test_topic_flow() {
        let (_store, host, guest, _video) = setup(SafetyEndPolicy::RequesterOnly).await;
        guest.suggest_topic("Listening without fixing").await.unwrap();
        host.suggest_topic("Belonging").await.unwrap();

        let first = guest.view().await.unwrap().topics[0].id.clone();
        host.vote_topic(first.clone()).await.unwrap();
        assert_eq!(
            host.vote_topic(first).await.unwrap(),
            MutationOutcome::Unchanged(NoOpReason::AlreadyVoted)
        );

        host.start().await.unwrap();
        host.select_topic(None).await.unwrap();
        assert_eq!(host.view().await.unwrap().topic, "Listening without fixing");
    }
}
