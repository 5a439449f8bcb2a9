//! Session phase state machine
//!
//! [`Session::apply`] validates a [`Mutation`] against authority, the
//! compare-and-set guard and the current phase, in that order, and only
//! then changes the record. A rejected mutation leaves the record exactly
//! as it was.

use crate::core::error::DomainError;
use crate::core::ids::UserId;
use crate::partition::{PartitionResolver, PartitionStrategy};
use crate::rotation::RotationPolicy;
use crate::safety::{RoundClock, SafetyEndOutcome, SafetyRequestOutcome};
use crate::session::entities::Session;
use crate::session::mutation::{
    Actor, Mutation, MutationOutcome, NoOpReason, SessionChange, SessionOp,
};
use crate::session::participant::{ConnectionStatus, Participant};
use crate::session::phase::{PhaseTransition, SessionPhase, SessionStatus};
use crate::session::role::Role;
use crate::topic::VoteOutcome;
use chrono::{DateTime, Utc};

impl Session {
    /// Apply one mutation at time `now`.
    pub fn apply(
        &mut self,
        mutation: &Mutation,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, DomainError> {
        let op = &mutation.op;
        self.authorize(&mutation.actor, op)?;

        if let Some(guard) = mutation.guard
            && (guard.phase != self.phase || guard.round != self.round)
        {
            return Ok(MutationOutcome::Unchanged(NoOpReason::StaleGuard));
        }

        if op.advances_rounds() && self.safety.is_active() {
            // a call from the wrong phase reports the phase error, not the pause
            self.require_phase(op, Self::phases_for(op))?;
            return Err(DomainError::SafetyPauseActive);
        }

        match op {
            SessionOp::JoinSession { display_name } => {
                let user = self.user_of(&mutation.actor, op)?;
                self.join(op, user, display_name)
            }
            SessionOp::LeaveSession => {
                let user = self.user_of(&mutation.actor, op)?;
                self.leave(op, user)
            }
            SessionOp::SetParticipantRole { target, role } => {
                let actor = self.user_of(&mutation.actor, op)?;
                self.set_role(op, actor, target, *role)
            }
            SessionOp::SetConnectionStatus { status } => {
                let user = self.user_of(&mutation.actor, op)?;
                self.set_connection(user, *status)
            }
            SessionOp::StartSession => self.start(op, now),
            SessionOp::SelectTopic { suggestion } => {
                self.require_phase(op, &[SessionPhase::TopicSelection])?;
                if let Some(id) = suggestion {
                    let chosen = self
                        .topics
                        .get(id)
                        .ok_or_else(|| DomainError::SuggestionNotFound(id.clone()))?;
                    self.topic = chosen.text.clone();
                } else if let Some(winner) = self.topics.winner() {
                    self.topic = winner.text.clone();
                }
                Ok(self.enter(SessionPhase::HelloCheckIn, now))
            }
            SessionOp::CompleteHelloCheckIn => {
                self.require_phase(op, &[SessionPhase::HelloCheckIn])?;
                Ok(self.enter(SessionPhase::Listening, now))
            }
            SessionOp::CompleteRound => self.complete_round(op, now),
            SessionOp::SubmitScribeNotes { notes } => {
                let actor = self.user_of(&mutation.actor, op)?;
                self.require_phase(op, &[SessionPhase::Listening, SessionPhase::Transition])?;
                if self.role_of(actor) != Some(Role::Scribe) {
                    return Err(self.unauthorized(op, &mutation.actor));
                }
                self.scribe_notes = notes.clone();
                Ok(MutationOutcome::Applied(SessionChange::ScribeNotesSaved))
            }
            SessionOp::CompleteScribeFeedback => self.advance_round(op, now),
            SessionOp::ContinueRounds => {
                self.require_phase(op, &[SessionPhase::Completion])?;
                let policy = self.rotation_policy()?;
                self.round = 1;
                self.rotate_roles(policy);
                Ok(self.enter(SessionPhase::Listening, now))
            }
            SessionOp::StartFreeDialogue => {
                self.require_phase(op, &[SessionPhase::Completion])?;
                Ok(self.enter(SessionPhase::FreeDialogue, now))
            }
            SessionOp::EndSession => {
                self.require_phase(op, &[SessionPhase::Completion, SessionPhase::FreeDialogue])?;
                self.status = SessionStatus::Completed;
                Ok(self.enter(SessionPhase::Reflection, now))
            }
            SessionOp::RequestSafetyTimeout => {
                let actor = self.user_of(&mutation.actor, op)?.clone();
                Ok(match self.safety.request(actor.clone(), now) {
                    SafetyRequestOutcome::Started => {
                        MutationOutcome::Applied(SessionChange::SafetyStarted { by: actor })
                    }
                    SafetyRequestOutcome::AlreadyActive => {
                        MutationOutcome::Unchanged(NoOpReason::SafetyAlreadyActive)
                    }
                })
            }
            SessionOp::EndSafetyTimeout => {
                let actor = self.user_of(&mutation.actor, op)?.clone();
                let is_host = self.is_host(&actor);
                match self.safety.end(&actor, is_host, self.safety_end_policy)? {
                    SafetyEndOutcome::Ended { started_at } => {
                        self.clock.settle_pause(started_at, now);
                        Ok(MutationOutcome::Applied(SessionChange::SafetyEnded { by: actor }))
                    }
                    SafetyEndOutcome::NotActive => {
                        Ok(MutationOutcome::Unchanged(NoOpReason::SafetyNotActive))
                    }
                }
            }
            SessionOp::AddTopicSuggestion { text } => {
                let actor = self.user_of(&mutation.actor, op)?.clone();
                self.require_topic_phase(op)?;
                let id = self.topics.add(text, actor, now)?;
                Ok(MutationOutcome::Applied(SessionChange::SuggestionAdded(id)))
            }
            SessionOp::VoteTopic { suggestion } => {
                let actor = self.user_of(&mutation.actor, op)?.clone();
                self.require_topic_phase(op)?;
                Ok(match self.topics.vote(suggestion, actor)? {
                    VoteOutcome::Counted => {
                        MutationOutcome::Applied(SessionChange::VoteCounted(suggestion.clone()))
                    }
                    VoteOutcome::AlreadyVoted => {
                        MutationOutcome::Unchanged(NoOpReason::AlreadyVoted)
                    }
                })
            }
            SessionOp::ResolveGroupPartition { strategy } => self.resolve_partition(op, *strategy),
        }
    }

    // ==================== Preconditions ====================

    /// Host authority, and membership for participant operations.
    ///
    /// The session host may act without being a member (sub-sessions, a
    /// passive host still votes on topics).
    fn authorize(&self, actor: &Actor, op: &SessionOp) -> Result<(), DomainError> {
        if op.requires_host() {
            let allowed = match actor {
                Actor::User(id) => self.is_host(id),
                Actor::System => matches!(op, SessionOp::CompleteScribeFeedback),
            };
            return if allowed {
                Ok(())
            } else {
                Err(self.unauthorized(op, actor))
            };
        }

        let Actor::User(user) = actor else {
            return Err(self.unauthorized(op, actor));
        };

        match op {
            SessionOp::JoinSession { .. } => Ok(()),
            SessionOp::AddTopicSuggestion { .. } | SessionOp::VoteTopic { .. }
                if self.is_host(user) =>
            {
                Ok(())
            }
            SessionOp::EndSafetyTimeout if self.is_host(user) => Ok(()),
            SessionOp::RequestSafetyTimeout => {
                let participant = self.member(user)?;
                if participant.is_passive() {
                    Err(self.unauthorized(op, actor))
                } else {
                    Ok(())
                }
            }
            _ => self.member(user).map(|_| ()),
        }
    }

    fn member(&self, user: &UserId) -> Result<&Participant, DomainError> {
        self.participant(user)
            .ok_or_else(|| DomainError::ParticipantNotFound(user.clone()))
    }

    fn user_of<'a>(&self, actor: &'a Actor, op: &SessionOp) -> Result<&'a UserId, DomainError> {
        actor.user().ok_or_else(|| self.unauthorized(op, actor))
    }

    fn unauthorized(&self, op: &SessionOp, actor: &Actor) -> DomainError {
        DomainError::UnauthorizedOperation {
            operation: op.name(),
            actor: actor.to_string(),
        }
    }

    fn require_phase(&self, op: &SessionOp, allowed: &[SessionPhase]) -> Result<(), DomainError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(DomainError::InvalidPhaseTransition {
                operation: op.name(),
                phase: self.phase,
            })
        }
    }

    fn require_topic_phase(&self, op: &SessionOp) -> Result<(), DomainError> {
        if self.phase.accepts_topics() {
            Ok(())
        } else {
            Err(DomainError::InvalidPhaseTransition {
                operation: op.name(),
                phase: self.phase,
            })
        }
    }

    fn phases_for(op: &SessionOp) -> &'static [SessionPhase] {
        match op {
            SessionOp::CompleteHelloCheckIn => &[SessionPhase::HelloCheckIn],
            SessionOp::CompleteRound => &[SessionPhase::Listening],
            SessionOp::CompleteScribeFeedback => &[SessionPhase::Transition],
            SessionOp::ContinueRounds => &[SessionPhase::Completion],
            _ => &[],
        }
    }

    /// Membership is frozen once a partition is committed.
    fn require_open_lobby(&self, op: &SessionOp) -> Result<(), DomainError> {
        self.require_phase(op, &[SessionPhase::Initialization])?;
        if self.group_configuration.is_some() {
            return Err(DomainError::GroupPartitionAlreadyResolved);
        }
        Ok(())
    }

    // ==================== Lobby ====================

    fn join(
        &mut self,
        op: &SessionOp,
        user: &UserId,
        display_name: &str,
    ) -> Result<MutationOutcome, DomainError> {
        if self.participant(user).is_some() {
            return Ok(MutationOutcome::Unchanged(NoOpReason::AlreadyJoined));
        }
        self.require_open_lobby(op)?;

        let name = display_name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput(
                "display name cannot be empty".to_string(),
            ));
        }
        if self.participants.len() >= self.max_participants {
            return Err(DomainError::SessionFull {
                max: self.max_participants,
            });
        }

        self.participants.push(Participant::new(user.clone(), name));
        Ok(MutationOutcome::Applied(SessionChange::ParticipantJoined(
            user.clone(),
        )))
    }

    fn leave(&mut self, op: &SessionOp, user: &UserId) -> Result<MutationOutcome, DomainError> {
        self.require_open_lobby(op)?;
        if self.is_host(user) {
            return Err(self.unauthorized(op, &Actor::User(user.clone())));
        }
        // only the requester can end their own pause under the default policy
        if self.safety.is_requested_by(user) {
            return Err(DomainError::SafetyPauseActive);
        }
        self.participants.retain(|p| &p.id != user);
        Ok(MutationOutcome::Applied(SessionChange::ParticipantLeft(
            user.clone(),
        )))
    }

    fn set_role(
        &mut self,
        op: &SessionOp,
        actor: &UserId,
        target: &UserId,
        role: Role,
    ) -> Result<MutationOutcome, DomainError> {
        if actor != target && !self.is_host(actor) {
            return Err(self.unauthorized(op, &Actor::User(actor.clone())));
        }
        self.require_open_lobby(op)?;

        let current = self.member(target)?;
        if current.is_passive() {
            return Err(self.unauthorized(op, &Actor::User(actor.clone())));
        }
        if current.role == Some(role) {
            return Ok(MutationOutcome::Unchanged(NoOpReason::RoleUnchanged));
        }
        if !self.available_roles().contains(&role) {
            return Err(DomainError::RoleUnavailable(role));
        }

        if let Some(participant) = self.participants.iter_mut().find(|p| &p.id == target) {
            participant.role = Some(role);
        }
        Ok(MutationOutcome::Applied(SessionChange::RoleChanged {
            user: target.clone(),
            role,
        }))
    }

    fn set_connection(
        &mut self,
        user: &UserId,
        status: ConnectionStatus,
    ) -> Result<MutationOutcome, DomainError> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| &p.id == user)
            .ok_or_else(|| DomainError::ParticipantNotFound(user.clone()))?;
        if participant.connection == status {
            return Ok(MutationOutcome::Unchanged(NoOpReason::ConnectionUnchanged));
        }
        participant.connection = status;
        Ok(MutationOutcome::Applied(SessionChange::ConnectionChanged {
            user: user.clone(),
            status,
        }))
    }

    fn resolve_partition(
        &mut self,
        op: &SessionOp,
        strategy: PartitionStrategy,
    ) -> Result<MutationOutcome, DomainError> {
        if self.group_configuration.is_some() {
            return Err(DomainError::GroupPartitionAlreadyResolved);
        }
        self.require_phase(op, &[SessionPhase::Initialization])?;

        let config = PartitionResolver::resolve(&self.id, &self.participants, None, strategy)?;
        self.group_configuration = Some(config.clone());
        Ok(MutationOutcome::Applied(SessionChange::PartitionResolved(
            config,
        )))
    }

    // ==================== Phases ====================

    fn start(&mut self, op: &SessionOp, now: DateTime<Utc>) -> Result<MutationOutcome, DomainError> {
        self.require_phase(op, &[SessionPhase::Initialization])?;
        if self.participants.len() < self.min_participants {
            return Err(DomainError::InvalidInput(format!(
                "at least {} participants are required to start",
                self.min_participants
            )));
        }

        let policy = self.rotation_policy()?;
        let seats = policy.assign_seats(&self.participants)?;
        for (participant, seat) in self.participants.iter_mut().zip(seats) {
            participant.seat = seat;
        }
        self.round = 1;
        self.rotate_roles(policy);
        self.status = SessionStatus::Active;
        Ok(self.enter(SessionPhase::TopicSelection, now))
    }

    fn complete_round(
        &mut self,
        op: &SessionOp,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, DomainError> {
        self.require_phase(op, &[SessionPhase::Listening])?;
        let total = self.rotation_policy()?.total_rounds();

        if self.round >= total {
            self.accumulate_scribe_notes();
            Ok(self.enter(SessionPhase::Completion, now))
        } else {
            Ok(self.enter(SessionPhase::Transition, now))
        }
    }

    /// Leave scribe-feedback review: next round, next roles.
    fn advance_round(
        &mut self,
        op: &SessionOp,
        now: DateTime<Utc>,
    ) -> Result<MutationOutcome, DomainError> {
        self.require_phase(op, &[SessionPhase::Transition])?;
        let policy = self.rotation_policy()?;

        self.accumulate_scribe_notes();
        self.round += 1;
        self.rotate_roles(policy);
        Ok(self.enter(SessionPhase::Listening, now))
    }

    fn rotate_roles(&mut self, policy: RotationPolicy) {
        let round = self.round;
        for participant in self.participants.iter_mut() {
            if participant.is_passive() {
                continue;
            }
            participant.role = Some(match participant.seat {
                Some(seat) => policy.role_for_seat(seat, round),
                None => policy.next_role(participant.role),
            });
        }
    }

    fn accumulate_scribe_notes(&mut self) {
        let notes = std::mem::take(&mut self.scribe_notes);
        let notes = notes.trim();
        if notes.is_empty() {
            return;
        }
        if !self.accumulated_scribe_notes.is_empty() {
            self.accumulated_scribe_notes.push_str("\n\n");
        }
        self.accumulated_scribe_notes
            .push_str(&format!("--- Round {} ---\n{}", self.round, notes));
    }

    fn enter(&mut self, to: SessionPhase, now: DateTime<Utc>) -> MutationOutcome {
        let from = self.phase;
        debug_assert!(from.can_transition_to(to), "{from} -> {to}");
        self.phase = to;
        self.clock = RoundClock::start(now);
        self.phase_history.push(PhaseTransition {
            from,
            to,
            round: self.round,
            at: now,
        });
        MutationOutcome::Applied(SessionChange::PhaseChanged {
            from,
            to,
            round: self.round,
        })
    }
}
