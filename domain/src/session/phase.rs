//! Session phases and lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of a practice session
///
/// ```text
/// initialization → topic-selection → hello-checkin → listening ⇄ transition
///                                                        ↓
///                             listening ← completion → free-dialogue → reflection
///                                             ↓
///                                         reflection
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionPhase {
    /// Lobby: participants join, pick roles, suggest topics
    #[default]
    Initialization,
    TopicSelection,
    #[serde(rename = "hello-checkin")]
    HelloCheckIn,
    /// A round is running
    Listening,
    /// Scribe-feedback review between two rounds
    Transition,
    /// All rounds of the cycle are done
    Completion,
    FreeDialogue,
    /// Session ended
    Reflection,
}

impl SessionPhase {
    pub fn allowed_transitions(&self) -> &'static [SessionPhase] {
        use SessionPhase::*;
        match self {
            Initialization => &[TopicSelection],
            TopicSelection => &[HelloCheckIn],
            HelloCheckIn => &[Listening],
            Listening => &[Transition, Completion],
            Transition => &[Listening],
            Completion => &[Listening, FreeDialogue, Reflection],
            FreeDialogue => &[Reflection],
            Reflection => &[],
        }
    }

    pub fn can_transition_to(&self, target: SessionPhase) -> bool {
        self.allowed_transitions().contains(&target)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Reflection)
    }

    /// Phases in which round progression is gated by the safety overlay.
    pub fn is_round_phase(&self) -> bool {
        matches!(self, SessionPhase::Listening | SessionPhase::Transition)
    }

    /// Phases that still accept topic suggestions and votes.
    pub fn accepts_topics(&self) -> bool {
        matches!(
            self,
            SessionPhase::Initialization | SessionPhase::TopicSelection
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Initialization => "initialization",
            SessionPhase::TopicSelection => "topic-selection",
            SessionPhase::HelloCheckIn => "hello-checkin",
            SessionPhase::Listening => "listening",
            SessionPhase::Transition => "transition",
            SessionPhase::Completion => "completion",
            SessionPhase::FreeDialogue => "free-dialogue",
            SessionPhase::Reflection => "reflection",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionPhase::Initialization => "Lobby",
            SessionPhase::TopicSelection => "Topic Selection",
            SessionPhase::HelloCheckIn => "Hello Check-in",
            SessionPhase::Listening => "Listening Round",
            SessionPhase::Transition => "Scribe Feedback",
            SessionPhase::Completion => "Rounds Complete",
            SessionPhase::FreeDialogue => "Free Dialogue",
            SessionPhase::Reflection => "Reflection",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of the session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Waiting,
    Active,
    Completed,
}

/// Compare-and-set precondition carried by phase-advancing operations.
///
/// A guard that no longer matches the record marks the call as a duplicate
/// (someone else already advanced), which is applied as a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseGuard {
    pub phase: SessionPhase,
    pub round: u32,
}

impl PhaseGuard {
    pub fn new(phase: SessionPhase, round: u32) -> Self {
        Self { phase, round }
    }
}

/// One entry of the session's phase history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub round: u32,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_line_transitions() {
        assert!(SessionPhase::Initialization.can_transition_to(SessionPhase::TopicSelection));
        assert!(SessionPhase::TopicSelection.can_transition_to(SessionPhase::HelloCheckIn));
        assert!(SessionPhase::HelloCheckIn.can_transition_to(SessionPhase::Listening));
        assert!(SessionPhase::Listening.can_transition_to(SessionPhase::Transition));
        assert!(SessionPhase::Transition.can_transition_to(SessionPhase::Listening));
        assert!(SessionPhase::Listening.can_transition_to(SessionPhase::Completion));
    }

    #[test]
    fn test_completion_branches() {
        let completion = SessionPhase::Completion;
        assert!(completion.can_transition_to(SessionPhase::Listening));
        assert!(completion.can_transition_to(SessionPhase::FreeDialogue));
        assert!(completion.can_transition_to(SessionPhase::Reflection));
        assert!(!completion.can_transition_to(SessionPhase::Transition));
    }

    #[test]
    fn test_reflection_is_terminal() {
        assert!(SessionPhase::Reflection.is_terminal());
        assert!(SessionPhase::Reflection.allowed_transitions().is_empty());
    }

    #[test]
    fn test_phase_serde_names() {
        let json = serde_json::to_string(&SessionPhase::HelloCheckIn).unwrap();
        assert_eq!(json, "\"hello-checkin\"");
        let json = serde_json::to_string(&SessionPhase::FreeDialogue).unwrap();
        assert_eq!(json, "\"free-dialogue\"");
    }
}
