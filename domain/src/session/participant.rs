//! Session participants

use crate::core::ids::UserId;
use crate::session::role::Role;
use serde::{Deserialize, Serialize};

/// Media connection quality as reported by the participant's client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Good,
    Poor,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Good => "good",
            ConnectionStatus::Poor => "poor",
            ConnectionStatus::Disconnected => "disconnected",
        };
        write!(f, "{}", s)
    }
}

/// A member of a session.
///
/// `seat` is assigned when the session starts and fixes the participant's
/// position in the rotation cycle; passive observers never get one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: UserId,
    pub display_name: String,
    pub role: Option<Role>,
    #[serde(default)]
    pub seat: Option<usize>,
    #[serde(default)]
    pub connection: ConnectionStatus,
}

impl Participant {
    pub fn new(id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            role: None,
            seat: None,
            connection: ConnectionStatus::default(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Permanent observers never rotate and do not count towards rounds.
    pub fn is_passive(&self) -> bool {
        self.role.is_some_and(|r| r.is_passive())
    }

    pub fn is_active(&self) -> bool {
        !self.is_passive()
    }
}

/// Number of participants that take part in rotation.
pub fn active_count(participants: &[Participant]) -> usize {
    participants.iter().filter(|p| p.is_active()).count()
}
