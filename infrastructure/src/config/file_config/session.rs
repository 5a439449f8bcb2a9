//! Session configuration from TOML (`[session]` section)

use dialogos_domain::session::entities::{
    DEFAULT_MAX_PARTICIPANTS, MAX_PARTICIPANTS, MAX_ROUND_MINUTES, MIN_PARTICIPANTS,
};
use dialogos_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};

/// Raw session configuration from TOML
///
/// # Example
///
/// ```toml
/// [session]
/// default_round_minutes = 5
/// transition_auto_advance_secs = 3
/// min_participants = 2
/// max_participants = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub default_round_minutes: u32,
    /// Seconds before the scribe-feedback review ends on its own
    pub transition_auto_advance_secs: u64,
    pub min_participants: usize,
    pub max_participants: usize,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            default_round_minutes: 5,
            transition_auto_advance_secs: 3,
            min_participants: MIN_PARTICIPANTS,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        }
    }
}

impl FileSessionConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.default_round_minutes == 0 || self.default_round_minutes > MAX_ROUND_MINUTES {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::OutOfRange {
                    field: "session.default_round_minutes".to_string(),
                },
                message: format!(
                    "session.default_round_minutes must be between 1 and {}, got {}",
                    MAX_ROUND_MINUTES, self.default_round_minutes
                ),
            });
        }

        if self.min_participants < MIN_PARTICIPANTS
            || self.max_participants > MAX_PARTICIPANTS
            || self.min_participants > self.max_participants
        {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::ParticipantLimitsInvalid,
                message: format!(
                    "session participant limits {}..={} must lie within {}..={}",
                    self.min_participants,
                    self.max_participants,
                    MIN_PARTICIPANTS,
                    MAX_PARTICIPANTS
                ),
            });
        }

        if self.transition_auto_advance_secs == 0 {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::AutoAdvanceDisabled,
                message: "session.transition_auto_advance_secs is 0; scribe feedback will be skipped"
                    .to_string(),
            });
        }

        issues
    }
}
