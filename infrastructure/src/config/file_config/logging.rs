//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
///
/// ```toml
/// [logging]
/// audit_log = "~/.local/share/dialogos/sessions.jsonl"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL audit trail of every session mutation; disabled when unset
    pub audit_log: Option<String>,
}

impl FileLoggingConfig {
    /// Audit log path with a leading `~/` expanded to the home directory.
    pub fn audit_log_path(&self) -> Option<PathBuf> {
        let raw = self.audit_log.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        assert!(FileLoggingConfig::default().audit_log_path().is_none());
    }

    #[test]
    fn test_plain_path_is_kept() {
        let config = FileLoggingConfig {
            audit_log: Some("/tmp/dialogos.jsonl".to_string()),
        };
        assert_eq!(
            config.audit_log_path(),
            Some(PathBuf::from("/tmp/dialogos.jsonl"))
        );
    }
}
