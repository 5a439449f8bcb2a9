//! Domain layer for dialogos
//!
//! This crate contains the session rules: phases, roles, safety pauses,
//! topics and group partitioning. It has no dependencies on
//! infrastructure or presentation concerns, and no clock of its own;
//! every time-dependent operation takes `now` from the caller.
//!
//! # Core Concepts
//!
//! ## Rounds
//!
//! A session walks through check-in, a number of listening rounds with a
//! short scribe-feedback transition between them, and a closing phase.
//! Roles rotate every round so each active participant speaks once.
//!
//! ## Safety timeout
//!
//! Any active participant can pause the session. The pause is an overlay:
//! the phase does not change, but rounds cannot advance and the round
//! timer is frozen until the requester ends it.
//!
//! ## Five-person groups
//!
//! Five active participants either split into a pair and a trio, each
//! with its own sub-session, or stay together with two rotating observers.

pub mod config;
pub mod core;
pub mod partition;
pub mod rotation;
pub mod safety;
pub mod session;
pub mod topic;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{
    error::DomainError,
    ids::{SessionId, SuggestionId, UserId},
};
pub use partition::{
    GroupConfiguration, ObserverStrategy, PartitionResolver, PartitionStrategy, Subgroup,
};
pub use rotation::RotationPolicy;
pub use safety::{RoundClock, SafetyEndPolicy, SafetyTimeoutState};
pub use session::{
    entities::{HostRole, Session, SessionInit, SessionType},
    mutation::{Actor, Mutation, MutationOutcome, NoOpReason, SessionChange, SessionOp},
    participant::{ConnectionStatus, Participant},
    phase::{PhaseGuard, PhaseTransition, SessionPhase, SessionStatus},
    role::Role,
    view::{ParticipantView, SafetyView, SessionView},
};
pub use topic::{TopicBoard, TopicSuggestion, VoteOutcome};
