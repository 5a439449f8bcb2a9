//! Domain error types

use crate::core::ids::{SuggestionId, UserId};
use crate::session::phase::SessionPhase;
use crate::session::role::Role;
use thiserror::Error;

/// Domain-level errors
///
/// Every variant leaves the session record unchanged. A second safety
/// timeout request is deliberately absent: it is a no-op, not an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Cannot {operation} during the {phase} phase")]
    InvalidPhaseTransition {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("{actor} is not allowed to {operation}")]
    UnauthorizedOperation {
        operation: &'static str,
        actor: String,
    },

    #[error("Role rotation is undefined for {active} active participants (supported: 2 to 5)")]
    RoleRotationUndefined { active: usize },

    #[error("Group partition has already been resolved")]
    GroupPartitionAlreadyResolved,

    #[error("Five active participants: the group partition must be resolved first")]
    GroupPartitionRequired,

    #[error("Session was split into sub-sessions; operate on those instead")]
    SessionPartitioned,

    #[error("A safety timeout is active; round progression is paused")]
    SafetyPauseActive,

    #[error("Participant not found: {0}")]
    ParticipantNotFound(UserId),

    #[error("Topic suggestion not found: {0}")]
    SuggestionNotFound(SuggestionId),

    #[error("Session is full ({max} participants)")]
    SessionFull { max: usize },

    #[error("Role not available: {0}")]
    RoleUnavailable(Role),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    /// Errors caused by the session's phase rather than by the caller.
    ///
    /// Such operations may succeed when retried from a valid phase.
    pub fn is_phase_related(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidPhaseTransition { .. } | DomainError::SafetyPauseActive
        )
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, DomainError::UnauthorizedOperation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_phase_transition_display() {
        let error = DomainError::InvalidPhaseTransition {
            operation: "complete round",
            phase: SessionPhase::HelloCheckIn,
        };
        assert_eq!(
            error.to_string(),
            "Cannot complete round during the hello-checkin phase"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(DomainError::SafetyPauseActive.is_phase_related());
        assert!(!DomainError::GroupPartitionAlreadyResolved.is_phase_related());
        assert!(
            DomainError::UnauthorizedOperation {
                operation: "end session",
                actor: "user-2".to_string(),
            }
            .is_unauthorized()
        );
    }
}
