//! In-process authoritative session store.
//!
//! Each record lives behind one mutex. A mutation is applied to a copy of
//! the record and swapped in only when the session rules accept it, so a
//! refused mutation never leaves a partial update. Committed records are
//! published to subscribers through a `watch` channel per session.

use async_trait::async_trait;
use dialogos_application::{
    NoSessionEventLogger, SessionEvent, SessionEventLogger, SessionStoreGateway,
    SessionSubscription, StoreError,
};
use dialogos_domain::{Mutation, MutationOutcome, Session, SessionId, SessionInit};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

struct StoredSession {
    record: Session,
    publisher: watch::Sender<Session>,
}

pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, StoredSession>>,
    logger: Arc<dyn SessionEventLogger>,
    offline: AtomicBool,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            logger: Arc::new(NoSessionEventLogger),
            offline: AtomicBool::new(false),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn SessionEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Simulate a connectivity loss; every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, StoredSession>>, StoreError> {
        self.sessions
            .lock()
            .map_err(|_| StoreError::Unavailable("session table poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStoreGateway for InMemorySessionStore {
    async fn create_session(&self, init: SessionInit) -> Result<SessionId, StoreError> {
        self.ensure_online()?;
        let id = init
            .id
            .clone()
            .unwrap_or_else(|| SessionId::new(uuid::Uuid::new_v4().to_string()));

        let mut sessions = self.lock()?;
        if sessions.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }

        let record = Session::create(id.clone(), init, chrono::Utc::now())?;
        let (publisher, _) = watch::channel(record.clone());
        self.logger.log(SessionEvent::new(
            "session_created",
            id.clone(),
            serde_json::json!({
                "name": record.name,
                "host": record.host_id,
                "parent": record.parent,
            }),
        ));
        sessions.insert(id.clone(), StoredSession { record, publisher });

        info!("Session {} created", id);
        Ok(id)
    }

    async fn load_session(&self, id: &SessionId) -> Result<Session, StoreError> {
        self.ensure_online()?;
        self.lock()?
            .get(id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn subscribe(&self, id: &SessionId) -> Result<SessionSubscription, StoreError> {
        self.ensure_online()?;
        let sessions = self.lock()?;
        let stored = sessions
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        debug!("New subscriber for session {}", id);
        Ok(SessionSubscription::new(stored.publisher.subscribe()))
    }

    async fn apply_mutation(
        &self,
        id: &SessionId,
        mutation: Mutation,
    ) -> Result<MutationOutcome, StoreError> {
        self.ensure_online()?;
        let mut sessions = self.lock()?;
        let stored = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let mut next = stored.record.clone();
        let outcome = match next.apply(&mutation, chrono::Utc::now()) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Session {}: {} by {} rejected: {}", id, mutation.op.name(), mutation.actor, e);
                self.logger.log(SessionEvent::new(
                    "mutation_rejected",
                    id.clone(),
                    serde_json::json!({
                        "actor": mutation.actor.to_string(),
                        "op": mutation.op,
                        "error": e.to_string(),
                    }),
                ));
                return Err(e.into());
            }
        };

        if let MutationOutcome::Applied(change) = &outcome {
            next.version = stored.record.version + 1;
            stored.record = next;
            stored.publisher.send_replace(stored.record.clone());
            info!(
                "Session {} v{}: {} by {} ({} round {})",
                id,
                stored.record.version,
                mutation.op.name(),
                mutation.actor,
                stored.record.phase,
                stored.record.round
            );
            self.logger.log(SessionEvent::new(
                "mutation_applied",
                id.clone(),
                serde_json::json!({
                    "version": stored.record.version,
                    "actor": mutation.actor.to_string(),
                    "op": mutation.op,
                    "change": change,
                }),
            ));
        } else {
            debug!("Session {}: {} by {} was a no-op", id, mutation.op.name(), mutation.actor);
        }

        Ok(outcome)
    }
}
