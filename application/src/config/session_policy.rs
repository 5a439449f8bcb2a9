//! Session policy: defaults for new sessions and store-side timing.
//!
//! These are application-layer concerns: the domain enforces the hard
//! limits, this decides what a host gets when they do not choose.

use dialogos_domain::session::entities::{DEFAULT_MAX_PARTICIPANTS, MAX_ROUND_MINUTES, MIN_PARTICIPANTS};
use dialogos_domain::{SafetyEndPolicy, SessionInit};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round lengths offered by the session creation form, in minutes.
pub const SUGGESTED_ROUND_MINUTES: [u32; 4] = [2, 5, 7, 10];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicyConfig {
    /// Delay before the store leaves scribe-feedback review on its own.
    pub transition_auto_advance: Duration,
    pub default_round_minutes: u32,
    pub min_participants: usize,
    pub max_participants: usize,
    pub safety_end: SafetyEndPolicy,
}

impl Default for SessionPolicyConfig {
    fn default() -> Self {
        Self {
            transition_auto_advance: Duration::from_secs(3),
            default_round_minutes: 5,
            min_participants: MIN_PARTICIPANTS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            safety_end: SafetyEndPolicy::RequesterOnly,
        }
    }
}

impl SessionPolicyConfig {
    // ==================== Builder Methods ====================

    pub fn with_transition_auto_advance(mut self, delay: Duration) -> Self {
        self.transition_auto_advance = delay;
        self
    }

    pub fn with_default_round_minutes(mut self, minutes: u32) -> Self {
        self.default_round_minutes = minutes;
        self
    }

    pub fn with_participant_limits(mut self, min: usize, max: usize) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    pub fn with_safety_end(mut self, policy: SafetyEndPolicy) -> Self {
        self.safety_end = policy;
        self
    }

    // ==================== Queries ====================

    pub fn is_allowed_round_minutes(minutes: u32) -> bool {
        (1..=MAX_ROUND_MINUTES).contains(&minutes)
    }

    /// Fill the policy-owned fields of a new session's init.
    pub fn apply_to(&self, init: SessionInit, round_minutes: Option<u32>) -> SessionInit {
        init.with_round_minutes(round_minutes.unwrap_or(self.default_round_minutes))
            .with_participant_limits(self.min_participants, self.max_participants)
            .with_safety_end_policy(self.safety_end)
    }
}
