//! Safety configuration from TOML (`[safety]` section)

use dialogos_domain::{ConfigIssue, ConfigIssueCode, SafetyEndPolicy, Severity};
use serde::{Deserialize, Serialize};

/// Raw safety configuration from TOML
///
/// ```toml
/// [safety]
/// end_policy = "requester-only"   # or "requester-or-host"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSafetyConfig {
    pub end_policy: String,
}

impl Default for FileSafetyConfig {
    fn default() -> Self {
        Self {
            end_policy: "requester-only".to_string(),
        }
    }
}

impl FileSafetyConfig {
    /// Parse end_policy, falling back to requester-only with a warning.
    pub fn parse_end_policy(&self) -> (SafetyEndPolicy, Vec<ConfigIssue>) {
        match self.end_policy.parse::<SafetyEndPolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "safety.end_policy".to_string(),
                        value: self.end_policy.clone(),
                        valid_values: vec![
                            "requester-only".to_string(),
                            "requester-or-host".to_string(),
                        ],
                    },
                    message: format!(
                        "safety.end_policy: unknown value '{}', falling back to 'requester-only'",
                        self.end_policy
                    ),
                };
                (SafetyEndPolicy::default(), vec![issue])
            }
        }
    }
}
