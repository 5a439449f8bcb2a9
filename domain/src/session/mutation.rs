//! Operations on a session record
//!
//! Every change to a session travels as a [`Mutation`]: who asks, an
//! optional compare-and-set guard, and the operation itself. The store
//! applies it as one whole-record update.

use crate::core::ids::{SuggestionId, UserId};
use crate::partition::{GroupConfiguration, PartitionStrategy};
use crate::session::participant::ConnectionStatus;
use crate::session::phase::{PhaseGuard, SessionPhase};
use crate::session::role::Role;
use serde::{Deserialize, Serialize};

/// Originator of a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    User(UserId),
    /// The store's own scheduler (deferred auto-advance)
    System,
}

impl Actor {
    pub fn user(&self) -> Option<&UserId> {
        match self {
            Actor::User(id) => Some(id),
            Actor::System => None,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::User(id) => write!(f, "{}", id),
            Actor::System => write!(f, "system"),
        }
    }
}

impl From<UserId> for Actor {
    fn from(id: UserId) -> Self {
        Actor::User(id)
    }
}

/// Operation vocabulary of the session core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionOp {
    JoinSession { display_name: String },
    LeaveSession,
    SetParticipantRole { target: UserId, role: Role },
    SetConnectionStatus { status: ConnectionStatus },
    StartSession,
    SelectTopic { suggestion: Option<SuggestionId> },
    CompleteHelloCheckIn,
    CompleteRound,
    SubmitScribeNotes { notes: String },
    CompleteScribeFeedback,
    ContinueRounds,
    StartFreeDialogue,
    EndSession,
    RequestSafetyTimeout,
    EndSafetyTimeout,
    AddTopicSuggestion { text: String },
    VoteTopic { suggestion: SuggestionId },
    ResolveGroupPartition { strategy: PartitionStrategy },
}

impl SessionOp {
    /// Human-readable verb phrase used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            SessionOp::JoinSession { .. } => "join session",
            SessionOp::LeaveSession => "leave session",
            SessionOp::SetParticipantRole { .. } => "set participant role",
            SessionOp::SetConnectionStatus { .. } => "set connection status",
            SessionOp::StartSession => "start session",
            SessionOp::SelectTopic { .. } => "select topic",
            SessionOp::CompleteHelloCheckIn => "complete hello check-in",
            SessionOp::CompleteRound => "complete round",
            SessionOp::SubmitScribeNotes { .. } => "submit scribe notes",
            SessionOp::CompleteScribeFeedback => "complete scribe feedback",
            SessionOp::ContinueRounds => "continue rounds",
            SessionOp::StartFreeDialogue => "start free dialogue",
            SessionOp::EndSession => "end session",
            SessionOp::RequestSafetyTimeout => "request safety timeout",
            SessionOp::EndSafetyTimeout => "end safety timeout",
            SessionOp::AddTopicSuggestion { .. } => "add topic suggestion",
            SessionOp::VoteTopic { .. } => "vote for topic",
            SessionOp::ResolveGroupPartition { .. } => "resolve group partition",
        }
    }

    /// Host-only operations. The scheduler may also run
    /// `CompleteScribeFeedback` on the host's behalf.
    pub fn requires_host(&self) -> bool {
        matches!(
            self,
            SessionOp::StartSession
                | SessionOp::SelectTopic { .. }
                | SessionOp::CompleteHelloCheckIn
                | SessionOp::CompleteRound
                | SessionOp::CompleteScribeFeedback
                | SessionOp::ContinueRounds
                | SessionOp::StartFreeDialogue
                | SessionOp::EndSession
                | SessionOp::ResolveGroupPartition { .. }
        )
    }

    /// Operations that move rounds forward and are blocked by a safety pause.
    pub fn advances_rounds(&self) -> bool {
        matches!(
            self,
            SessionOp::CompleteHelloCheckIn
                | SessionOp::CompleteRound
                | SessionOp::CompleteScribeFeedback
                | SessionOp::ContinueRounds
        )
    }
}

/// A requested change to one session record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub actor: Actor,
    /// Expected phase and round; a mismatch turns the call into a no-op
    pub guard: Option<PhaseGuard>,
    pub op: SessionOp,
}

impl Mutation {
    pub fn new(actor: impl Into<Actor>, op: SessionOp) -> Self {
        Self {
            actor: actor.into(),
            guard: None,
            op,
        }
    }

    pub fn system(op: SessionOp) -> Self {
        Self::new(Actor::System, op)
    }

    pub fn guarded(mut self, guard: PhaseGuard) -> Self {
        self.guard = Some(guard);
        self
    }
}

/// What a committed mutation changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", content = "data", rename_all = "snake_case")]
pub enum SessionChange {
    ParticipantJoined(UserId),
    ParticipantLeft(UserId),
    RoleChanged { user: UserId, role: Role },
    ConnectionChanged { user: UserId, status: ConnectionStatus },
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
        round: u32,
    },
    ScribeNotesSaved,
    SafetyStarted { by: UserId },
    SafetyEnded { by: UserId },
    SuggestionAdded(SuggestionId),
    VoteCounted(SuggestionId),
    PartitionResolved(GroupConfiguration),
}

/// Why a mutation left the record untouched without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    /// The guard no longer matches: another client already advanced
    StaleGuard,
    AlreadyJoined,
    RoleUnchanged,
    ConnectionUnchanged,
    SafetyAlreadyActive,
    SafetyNotActive,
    AlreadyVoted,
}

/// Successful result of applying a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied(SessionChange),
    Unchanged(NoOpReason),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_only_operations() {
        assert!(SessionOp::CompleteRound.requires_host());
        assert!(SessionOp::EndSession.requires_host());
        assert!(!SessionOp::RequestSafetyTimeout.requires_host());
        assert!(
            !SessionOp::AddTopicSuggestion {
                text: "x".to_string()
            }
            .requires_host()
        );
    }

    #[test]
    fn test_round_advancing_operations() {
        assert!(SessionOp::CompleteRound.advances_rounds());
        assert!(SessionOp::CompleteScribeFeedback.advances_rounds());
        assert!(!SessionOp::EndSession.advances_rounds());
        assert!(!SessionOp::EndSafetyTimeout.advances_rounds());
    }

    #[test]
    fn test_mutation_serializes_with_op_tag() {
        let mutation = Mutation::new(UserId::new("u1"), SessionOp::CompleteRound)
            .guarded(PhaseGuard::new(SessionPhase::Listening, 1));
        let json = serde_json::to_value(&mutation).unwrap();
        assert_eq!(json["op"]["op"], "complete_round");
        assert_eq!(json["guard"]["phase"], "listening");
    }

    #[test]
    fn test_outcome_serializes_for_audit_log() {
        let outcome = MutationOutcome::Applied(SessionChange::SafetyStarted {
            by: UserId::new("u1"),
        });
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "applied");
        assert_eq!(json["detail"]["change"], "safety_started");
        assert_eq!(json["detail"]["data"]["by"], "u1");

        let noop = serde_json::to_value(MutationOutcome::Unchanged(NoOpReason::StaleGuard)).unwrap();
        assert_eq!(noop["detail"], "stale_guard");
    }
}
