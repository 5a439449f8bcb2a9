//! Deferred transition → listening advance.
//!
//! One watcher task per session follows the record through a
//! subscription. Whenever the record sits in `transition` with no safety
//! pause, a timer keyed by the phase and round is armed; any change of
//! that identity (manual advance, pause, end of session) cancels it. When
//! the timer fires it sends a guarded `CompleteScribeFeedback` as the
//! system actor, so a timer racing a manual advance is a no-op.

use dialogos_application::{SessionStoreGateway, StoreError};
use dialogos_domain::{
    Mutation, MutationOutcome, PhaseGuard, Session, SessionId, SessionOp, SessionPhase,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const RETRY_BACKOFF_START: Duration = Duration::from_secs(1);
const RETRY_BACKOFF_MAX: Duration = Duration::from_secs(30);

pub struct AutoAdvanceScheduler {
    store: Arc<dyn SessionStoreGateway>,
    delay: Duration,
    shutdown: CancellationToken,
}

struct ArmedTimer {
    guard: PhaseGuard,
    token: CancellationToken,
}

impl AutoAdvanceScheduler {
    pub fn new(store: Arc<dyn SessionStoreGateway>, delay: Duration) -> Self {
        Self {
            store,
            delay,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start following `session_id`. The watcher ends when the session's
    /// subscription closes or the scheduler shuts down.
    pub async fn watch(&self, session_id: SessionId) -> Result<JoinHandle<()>, StoreError> {
        let mut subscription = self.store.subscribe(&session_id).await?;
        let store = Arc::clone(&self.store);
        let delay = self.delay;
        let shutdown = self.shutdown.child_token();
        debug!("Watching session {} for auto-advance", session_id);

        Ok(tokio::spawn(async move {
            let mut armed: Option<ArmedTimer> = None;
            let mut current = subscription.current();

            loop {
                Self::reconcile(&store, &session_id, &current, delay, &shutdown, &mut armed);
                if current.phase.is_terminal() {
                    break;
                }

                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    next = subscription.changed() => match next {
                        Ok(session) => current = session,
                        Err(_) => break,
                    },
                }
            }

            if let Some(timer) = armed.take() {
                timer.token.cancel();
            }
            debug!("Stopped watching session {}", session_id);
        }))
    }

    /// Cancel every watcher and pending timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Keep exactly one timer armed for the record's current identity.
    fn reconcile(
        store: &Arc<dyn SessionStoreGateway>,
        session_id: &SessionId,
        session: &Session,
        delay: Duration,
        shutdown: &CancellationToken,
        armed: &mut Option<ArmedTimer>,
    ) {
        let wanted = (session.phase == SessionPhase::Transition && !session.safety.is_active())
            .then(|| PhaseGuard::new(session.phase, session.round));

        if let Some(timer) = armed.as_ref()
            && Some(timer.guard) == wanted
        {
            return;
        }

        if let Some(timer) = armed.take() {
            debug!(
                "Session {}: auto-advance for round {} cancelled",
                session_id, timer.guard.round
            );
            timer.token.cancel();
        }

        if let Some(guard) = wanted {
            debug!(
                "Session {}: auto-advance for round {} armed ({:?})",
                session_id, guard.round, delay
            );
            let token = shutdown.child_token();
            tokio::spawn(Self::fire_after(
                Arc::clone(store),
                session_id.clone(),
                guard,
                delay,
                token.clone(),
            ));
            *armed = Some(ArmedTimer { guard, token });
        }
    }

    /// Sleep out the delay, then commit the advance. An unavailable store
    /// is retried with growing backoff until the commit lands or the timer
    /// is cancelled; the guard keeps a late retry from double-advancing.
    async fn fire_after(
        store: Arc<dyn SessionStoreGateway>,
        session_id: SessionId,
        guard: PhaseGuard,
        delay: Duration,
        token: CancellationToken,
    ) {
        let mut wait = delay;
        let mut backoff = RETRY_BACKOFF_START;

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }

            let mutation = Mutation::system(SessionOp::CompleteScribeFeedback).guarded(guard);
            match store.apply_mutation(&session_id, mutation).await {
                Ok(MutationOutcome::Applied(_)) => {
                    info!("Session {}: auto-advanced past round {}", session_id, guard.round);
                    return;
                }
                Ok(MutationOutcome::Unchanged(reason)) => {
                    debug!("Session {}: auto-advance skipped ({:?})", session_id, reason);
                    return;
                }
                Err(e) if e.is_retryable() => {
                    warn!(
                        "Session {}: auto-advance failed, retrying in {:?}: {}",
                        session_id, backoff, e
                    );
                    wait = backoff;
                    backoff = (backoff * 2).min(RETRY_BACKOFF_MAX);
                }
                Err(e) => {
                    warn!("Session {}: auto-advance failed: {}", session_id, e);
                    return;
                }
            }
        }
    }
}

impl Drop for AutoAdvanceScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySessionStore;
    use dialogos_domain::{SessionInit, UserId};

    const DELAY: Duration = Duration::from_secs(3);

    async fn session_in_transition() -> (Arc<InMemorySessionStore>, SessionId) {
        let store = Arc::new(InMemorySessionStore::new());
        let id = store
            .create_session(SessionInit::new("Practice", "host", "Hana"))
            .await
            .unwrap();
        let steps = [
            ("b", SessionOp::JoinSession { display_name: "Bo".to_string() }),
            ("host", SessionOp::StartSession),
            ("host", SessionOp::SelectTopic { suggestion: None }),
            ("host", SessionOp::CompleteHelloCheckIn),
            ("host", SessionOp::CompleteRound),
        ];
        for (actor, op) in steps {
            store
                .apply_mutation(&id, Mutation::new(UserId::new(actor), op))
                .await
                .unwrap();
        }
        (store, id)
    }

    async fn phase_and_round(store: &InMemorySessionStore, id: &SessionId) -> (SessionPhase, u32) {
        let session = store.load_session(id).await.unwrap();
        (session.phase, session.round)
    }

    #[tokio::test(start_paused = true)]
    async fn test_advances_after_delay() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Transition, 1));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Listening, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_safety_pause_cancels_and_rearms() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        store
            .apply_mutation(&id, Mutation::new(UserId::new("b"), SessionOp::RequestSafetyTimeout))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Transition, 1));

        store
            .apply_mutation(&id, Mutation::new(UserId::new("b"), SessionOp::EndSafetyTimeout))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Listening, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_advance_wins_without_double_advance() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        store
            .apply_mutation(
                &id,
                Mutation::new(UserId::new("host"), SessionOp::CompleteScribeFeedback),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Listening, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_pending_timer() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        let handle = scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(1)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Transition, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_when_store_is_briefly_unavailable() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        store.set_offline(true);
        // the timer fires while the store is down
        tokio::time::sleep(Duration::from_secs(2)).await;
        store.set_offline(false);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(phase_and_round(&store, &id).await, (SessionPhase::Listening, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_after_manual_advance() {
        let (store, id) = session_in_transition().await;
        let scheduler = AutoAdvanceScheduler::new(store.clone(), DELAY);
        scheduler.watch(id.clone()).await.unwrap();

        tokio::time::sleep(Duration::from_secs(2)).await;
        store.set_offline(true);
        // between the failed fire and the first retry
        tokio::time::sleep(Duration::from_millis(1500)).await;
        store.set_offline(false);
        store
            .apply_mutation(
                &id,
                Mutation::new(UserId::new("host"), SessionOp::CompleteScribeFeedback),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(60)).await;
        let session = store.load_session(&id).await.unwrap();
        assert_eq!((session.phase, session.round), (SessionPhase::Listening, 2));
        assert_eq!(
            session
                .phase_history
                .iter()
                .filter(|h| h.to == SessionPhase::Listening)
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_watch_unknown_session_fails() {
        let store = Arc::new(InMemorySessionStore::new());
        let scheduler = AutoAdvanceScheduler::new(store, DELAY);
        assert!(scheduler.watch(SessionId::new("missing")).await.is_err());
    }
}
