//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod logging;
mod output;
mod safety;
mod session;

pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use safety::FileSafetyConfig;
pub use session::FileSessionConfig;

use dialogos_application::SessionPolicyConfig;
use dialogos_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Defaults for new sessions and store timing
    pub session: FileSessionConfig,
    /// Safety timeout settings
    pub safety: FileSafetyConfig,
    /// Audit log settings
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.session.validate());
        issues.extend(self.safety.parse_end_policy().1);
        issues
    }

    /// Convert to the application's session policy.
    ///
    /// Invalid enum values fall back to their defaults; call [`validate`](Self::validate)
    /// first to surface them.
    pub fn to_session_policy(&self) -> SessionPolicyConfig {
        SessionPolicyConfig::default()
            .with_default_round_minutes(self.session.default_round_minutes)
            .with_participant_limits(self.session.min_participants, self.session.max_participants)
            .with_transition_auto_advance(Duration::from_secs(
                self.session.transition_auto_advance_secs,
            ))
            .with_safety_end(self.safety.parse_end_policy().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogos_domain::{OutputFormat, SafetyEndPolicy};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[session]
default_round_minutes = 7
transition_auto_advance_secs = 5
max_participants = 6

[safety]
end_policy = "requester-or-host"

[logging]
audit_log = "/var/log/dialogos.jsonl"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.default_round_minutes, 7);
        assert_eq!(config.session.max_participants, 6);
        assert_eq!(config.session.min_participants, 2);
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(config.validate().is_empty());

        let policy = config.to_session_policy();
        assert_eq!(policy.default_round_minutes, 7);
        assert_eq!(policy.transition_auto_advance, Duration::from_secs(5));
        assert_eq!(policy.safety_end, SafetyEndPolicy::RequesterOrHost);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[session]
default_round_minutes = 2
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.default_round_minutes, 2);
        // Defaults should apply
        assert_eq!(config.session.transition_auto_advance_secs, 3);
        assert!(config.output.color);
        assert!(config.logging.audit_log.is_none());
    }

    #[test]
    fn test_default_config_matches_policy_defaults() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.to_session_policy(), SessionPolicyConfig::default());
    }

    #[test]
    fn test_validate_collects_all_sections() {
        let toml_str = r#"
[session]
max_participants = 9

[safety]
end_policy = "whoever"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues.iter().filter(|i| i.is_error()).count(), 1);
    }
}
