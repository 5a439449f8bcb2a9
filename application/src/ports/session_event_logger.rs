//! Port for the structured session audit trail.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port records every committed or
//! refused mutation in a machine-readable format (JSONL).

use dialogos_domain::SessionId;
use serde_json::Value;

/// A structured event about one session.
pub struct SessionEvent {
    /// Event type identifier (e.g., "session_created", "mutation_applied").
    pub event_type: &'static str,
    pub session_id: SessionId,
    /// Event-specific fields.
    pub payload: Value,
}

impl SessionEvent {
    pub fn new(event_type: &'static str, session_id: SessionId, payload: Value) -> Self {
        Self {
            event_type,
            session_id,
            payload,
        }
    }
}

/// Port for logging session events to a structured log.
///
/// `log` is synchronous and infallible; logging failures are ignored.
pub trait SessionEventLogger: Send + Sync {
    fn log(&self, event: SessionEvent);
}

/// No-op implementation for tests and when the audit log is disabled.
pub struct NoSessionEventLogger;

impl SessionEventLogger for NoSessionEventLogger {
    fn log(&self, _event: SessionEvent) {}
}
