//! Safety timeout state

use crate::core::error::DomainError;
use crate::core::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may end an active safety timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyEndPolicy {
    /// Only the participant who asked for the pause
    #[default]
    RequesterOnly,
    /// The requester or the host (covers a requester who disconnected)
    RequesterOrHost,
}

impl std::str::FromStr for SafetyEndPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "requester-only" | "requester" => Ok(SafetyEndPolicy::RequesterOnly),
            "requester-or-host" | "host" => Ok(SafetyEndPolicy::RequesterOrHost),
            other => Err(format!(
                "Unknown safety end policy: {}. Valid: requester-only, requester-or-host",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyRequestOutcome {
    Started,
    /// Another request is already active; first requester wins
    AlreadyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyEndOutcome {
    /// Pause cleared; carries the instant it had started
    Ended { started_at: DateTime<Utc> },
    NotActive,
}

/// Session-wide pause overlay.
///
/// Fields are private so that `active == false` always implies an empty
/// requester and start time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyTimeoutState {
    active: bool,
    requested_by: Option<UserId>,
    started_at: Option<DateTime<Utc>>,
}

impl SafetyTimeoutState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn requested_by(&self) -> Option<&UserId> {
        self.requested_by.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn is_requested_by(&self, user: &UserId) -> bool {
        self.active && self.requested_by.as_ref() == Some(user)
    }

    /// Start a pause unless one is already running.
    pub fn request(&mut self, by: UserId, at: DateTime<Utc>) -> SafetyRequestOutcome {
        if self.active {
            return SafetyRequestOutcome::AlreadyActive;
        }
        self.active = true;
        self.requested_by = Some(by);
        self.started_at = Some(at);
        SafetyRequestOutcome::Started
    }

    /// Whether `actor` may end the current pause under `policy`.
    pub fn can_end(&self, actor: &UserId, actor_is_host: bool, policy: SafetyEndPolicy) -> bool {
        if !self.active {
            return false;
        }
        match policy {
            SafetyEndPolicy::RequesterOnly => self.is_requested_by(actor),
            SafetyEndPolicy::RequesterOrHost => self.is_requested_by(actor) || actor_is_host,
        }
    }

    /// Clear all three fields at once.
    pub fn end(
        &mut self,
        actor: &UserId,
        actor_is_host: bool,
        policy: SafetyEndPolicy,
    ) -> Result<SafetyEndOutcome, DomainError> {
        if !self.active {
            return Ok(SafetyEndOutcome::NotActive);
        }
        if !self.can_end(actor, actor_is_host, policy) {
            return Err(DomainError::UnauthorizedOperation {
                operation: "end safety timeout",
                actor: actor.to_string(),
            });
        }
        let started_at = self.started_at.take().unwrap_or_default();
        self.active = false;
        self.requested_by = None;
        Ok(SafetyEndOutcome::Ended { started_at })
    }
}
