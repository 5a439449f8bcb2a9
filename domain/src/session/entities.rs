//! Session domain entities

use crate::core::error::DomainError;
use crate::core::ids::{SessionId, UserId};
use crate::partition::GroupConfiguration;
use crate::rotation::RotationPolicy;
use crate::safety::{RoundClock, SafetyEndPolicy, SafetyTimeoutState};
use crate::session::participant::{Participant, active_count};
use crate::session::phase::{PhaseTransition, SessionPhase, SessionStatus};
use crate::session::role::Role;
use crate::topic::TopicBoard;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Smallest group that can rotate roles.
pub const MIN_PARTICIPANTS: usize = 2;
/// Five rotating participants plus one passive observer.
pub const MAX_PARTICIPANTS: usize = 6;
pub const DEFAULT_MAX_PARTICIPANTS: usize = 5;
/// Upper bound for a single round, in minutes.
pub const MAX_ROUND_MINUTES: u32 = 60;

/// How the host takes part in their own session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostRole {
    /// Host rotates through roles like everyone else
    #[default]
    Participant,
    /// Host watches without ever taking an active role
    ObserverPermanent,
}

impl std::str::FromStr for HostRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "participant" => Ok(HostRole::Participant),
            "observer-permanent" | "observer" => Ok(HostRole::ObserverPermanent),
            other => Err(format!(
                "Unknown host role: {}. Valid: participant, observer-permanent",
                other
            )),
        }
    }
}

/// Medium of the session. In-person sessions are handled elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    #[default]
    Video,
}

/// Parameters for creating a session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInit {
    /// Fixed id (sub-sessions); the store assigns one when `None`
    pub id: Option<SessionId>,
    pub name: String,
    pub round_minutes: u32,
    pub topic: String,
    pub host_id: UserId,
    pub host_name: String,
    pub host_role: HostRole,
    pub session_type: SessionType,
    pub min_participants: usize,
    pub max_participants: usize,
    pub safety_end_policy: SafetyEndPolicy,
    /// Topics the host proposes up front
    pub topic_suggestions: Vec<String>,
    /// Pre-seeded members (sub-sessions); the host is seeded when empty
    pub participants: Vec<Participant>,
    pub parent: Option<SessionId>,
}

impl SessionInit {
    pub fn new(
        name: impl Into<String>,
        host_id: impl Into<UserId>,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            round_minutes: 5,
            topic: String::new(),
            host_id: host_id.into(),
            host_name: host_name.into(),
            host_role: HostRole::Participant,
            session_type: SessionType::Video,
            min_participants: MIN_PARTICIPANTS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            safety_end_policy: SafetyEndPolicy::default(),
            topic_suggestions: Vec::new(),
            participants: Vec::new(),
            parent: None,
        }
    }

    pub fn with_round_minutes(mut self, minutes: u32) -> Self {
        self.round_minutes = minutes;
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_host_role(mut self, role: HostRole) -> Self {
        self.host_role = role;
        self
    }

    pub fn with_participant_limits(mut self, min: usize, max: usize) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    pub fn with_safety_end_policy(mut self, policy: SafetyEndPolicy) -> Self {
        self.safety_end_policy = policy;
        self
    }

    pub fn with_topic_suggestions(mut self, topics: Vec<String>) -> Self {
        self.topic_suggestions = topics;
        self
    }

    /// Init for one half of a split session.
    ///
    /// Members keep their lobby data but start without seat or role; the
    /// sub-session inherits host, topic and timing from the parent.
    pub fn subgroup_of(parent: &Session, index: usize, members: &[UserId]) -> Self {
        let participants = parent
            .participants
            .iter()
            .filter(|p| members.contains(&p.id))
            .map(|p| {
                let mut member = p.clone();
                member.seat = None;
                if !member.is_passive() {
                    member.role = None;
                }
                member
            })
            .collect();

        Self {
            id: Some(parent.id.subgroup(index)),
            name: format!("{} (group {})", parent.name, index),
            round_minutes: parent.round_minutes,
            topic: parent.topic.clone(),
            host_id: parent.host_id.clone(),
            host_name: parent.host_name.clone(),
            host_role: parent.host_role,
            session_type: parent.session_type,
            min_participants: MIN_PARTICIPANTS,
            max_participants: members.len(),
            safety_end_policy: parent.safety_end_policy,
            topic_suggestions: Vec::new(),
            participants,
            parent: Some(parent.id.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "session name cannot be empty".to_string(),
            ));
        }
        if self.round_minutes == 0 || self.round_minutes > MAX_ROUND_MINUTES {
            return Err(DomainError::InvalidInput(format!(
                "round duration must be between 1 and {} minutes",
                MAX_ROUND_MINUTES
            )));
        }
        if self.min_participants < MIN_PARTICIPANTS
            || self.max_participants > MAX_PARTICIPANTS
            || self.min_participants > self.max_participants
        {
            return Err(DomainError::InvalidInput(format!(
                "participant limits {}..={} are outside {}..={}",
                self.min_participants,
                self.max_participants,
                MIN_PARTICIPANTS,
                MAX_PARTICIPANTS
            )));
        }
        Ok(())
    }
}

/// One practice session: the canonical record shared by every client (Aggregate root)
///
/// Only [`Session::apply`] changes a committed
/// record; the store bumps `version` on every commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub round_minutes: u32,
    pub topic: String,
    pub host_id: UserId,
    pub host_name: String,
    pub host_role: HostRole,
    pub session_type: SessionType,
    pub status: SessionStatus,
    pub phase: SessionPhase,
    pub round: u32,
    pub participants: Vec<Participant>,
    pub topics: TopicBoard,
    pub group_configuration: Option<GroupConfiguration>,
    pub parent: Option<SessionId>,
    pub safety: SafetyTimeoutState,
    pub safety_end_policy: SafetyEndPolicy,
    pub min_participants: usize,
    pub max_participants: usize,
    pub clock: RoundClock,
    /// Notes of the current round's scribe, not yet accumulated
    #[serde(default)]
    pub scribe_notes: String,
    #[serde(default)]
    pub accumulated_scribe_notes: String,
    #[serde(default)]
    pub phase_history: Vec<PhaseTransition>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub version: u64,
}

impl Session {
    /// Build a new record in `initialization` from `init`.
    pub fn create(id: SessionId, init: SessionInit, now: DateTime<Utc>) -> Result<Self, DomainError> {
        init.validate()?;

        let participants = if init.participants.is_empty() {
            let host = Participant::new(init.host_id.clone(), init.host_name.clone());
            match init.host_role {
                HostRole::Participant => vec![host],
                HostRole::ObserverPermanent => vec![host.with_role(Role::ObserverPermanent)],
            }
        } else {
            init.participants
        };

        let mut topics = TopicBoard::new();
        for text in init.topic_suggestions.iter().filter(|t| !t.trim().is_empty()) {
            topics.add(text, init.host_id.clone(), now)?;
        }

        Ok(Self {
            id,
            name: init.name.trim().to_string(),
            round_minutes: init.round_minutes,
            topic: init.topic.trim().to_string(),
            host_id: init.host_id,
            host_name: init.host_name,
            host_role: init.host_role,
            session_type: init.session_type,
            status: SessionStatus::Waiting,
            phase: SessionPhase::Initialization,
            round: 1,
            participants,
            topics,
            group_configuration: None,
            parent: init.parent,
            safety: SafetyTimeoutState::default(),
            safety_end_policy: init.safety_end_policy,
            min_participants: init.min_participants,
            max_participants: init.max_participants,
            clock: RoundClock::start(now),
            scribe_notes: String::new(),
            accumulated_scribe_notes: String::new(),
            phase_history: Vec::new(),
            created_at: now,
            version: 0,
        })
    }

    pub fn is_host(&self, user: &UserId) -> bool {
        &self.host_id == user
    }

    pub fn participant(&self, user: &UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id == user)
    }

    pub fn role_of(&self, user: &UserId) -> Option<Role> {
        self.participant(user).and_then(|p| p.role)
    }

    pub fn holder_of(&self, role: Role) -> Option<&Participant> {
        self.participants.iter().find(|p| p.role == Some(role))
    }

    pub fn active_count(&self) -> usize {
        active_count(&self.participants)
    }

    pub fn is_partitioned(&self) -> bool {
        self.group_configuration
            .as_ref()
            .is_some_and(GroupConfiguration::is_split)
    }

    /// Needs the host's split/together decision before it can start.
    pub fn needs_partition(&self) -> bool {
        self.group_configuration.is_none() && self.active_count() == 5
    }

    /// Rotation policy for the current membership and partition decision.
    pub fn rotation_policy(&self) -> Result<RotationPolicy, DomainError> {
        match &self.group_configuration {
            Some(GroupConfiguration::Split { .. }) => Err(DomainError::SessionPartitioned),
            Some(GroupConfiguration::Together { .. }) if self.active_count() == 5 => {
                Ok(RotationPolicy::FiveTogether)
            }
            _ => RotationPolicy::for_active_count(self.active_count()),
        }
    }

    pub fn total_rounds(&self) -> Option<u32> {
        self.rotation_policy().ok().map(|p| p.total_rounds())
    }

    /// Roles a participant can still pick in the lobby.
    ///
    /// Active roles not yet taken, plus the passive observer role which is
    /// never exclusive.
    pub fn available_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = Role::ACTIVE
            .iter()
            .copied()
            .filter(|role| self.holder_of(*role).is_none())
            .collect();
        roles.push(Role::ObserverPermanent);
        roles
    }

    pub fn round_length(&self) -> Duration {
        Duration::minutes(i64::from(self.round_minutes))
    }

    /// Remaining time of the running round, frozen while paused.
    pub fn round_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.phase == SessionPhase::Listening)
            .then(|| self.clock.remaining(self.round_length(), &self.safety, now))
    }
}
