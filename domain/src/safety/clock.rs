//! Round clock with pause accounting

use crate::safety::overlay::SafetyTimeoutState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Timing of the current phase.
///
/// Stored on the session record so every client derives the same
/// remaining time. Time spent under a safety pause is excluded, which
/// freezes the countdown instead of shortening the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundClock {
    pub phase_started_at: DateTime<Utc>,
    /// Paused time already settled in this phase, in milliseconds
    pub paused_ms: i64,
}

impl RoundClock {
    pub fn start(at: DateTime<Utc>) -> Self {
        Self {
            phase_started_at: at,
            paused_ms: 0,
        }
    }

    /// Settle a finished pause that ran from `from` to `to`.
    pub fn settle_pause(&mut self, from: DateTime<Utc>, to: DateTime<Utc>) {
        let from = from.max(self.phase_started_at);
        if to > from {
            self.paused_ms += (to - from).num_milliseconds();
        }
    }

    /// Unpaused time spent in the current phase.
    pub fn elapsed(&self, safety: &SafetyTimeoutState, now: DateTime<Utc>) -> Duration {
        let mut paused = Duration::milliseconds(self.paused_ms);
        if let Some(started) = safety.started_at().filter(|_| safety.is_active()) {
            let started = started.max(self.phase_started_at);
            if now > started {
                paused += now - started;
            }
        }
        let elapsed = (now - self.phase_started_at) - paused;
        elapsed.max(Duration::zero())
    }

    /// Time left of a round lasting `length`, never negative.
    pub fn remaining(
        &self,
        length: Duration,
        safety: &SafetyTimeoutState,
        now: DateTime<Utc>,
    ) -> Duration {
        (length - self.elapsed(safety, now)).max(Duration::zero())
    }
}
