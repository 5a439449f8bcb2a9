//! Participant roles

use serde::{Deserialize, Serialize};

/// Role a participant holds during a round.
///
/// A closed set: rotation and partition logic match on it exhaustively.
/// "No role yet" is modelled as `Option<Role>::None` on the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Speaker,
    Listener,
    Scribe,
    /// Observes for one round, then rotates back into the active roles
    ObserverTemporary,
    /// Never rotates and is excluded from round counts
    ObserverPermanent,
}

impl Role {
    /// Roles that take part in rotation, in lobby display order.
    pub const ACTIVE: [Role; 4] = [
        Role::Speaker,
        Role::Listener,
        Role::Scribe,
        Role::ObserverTemporary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Speaker => "speaker",
            Role::Listener => "listener",
            Role::Scribe => "scribe",
            Role::ObserverTemporary => "observer-temporary",
            Role::ObserverPermanent => "observer-permanent",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Speaker => "Speaker",
            Role::Listener => "Listener",
            Role::Scribe => "Scribe",
            Role::ObserverTemporary => "Observer",
            Role::ObserverPermanent => "Passive Observer",
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_passive()
    }

    pub fn is_passive(&self) -> bool {
        matches!(self, Role::ObserverPermanent)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speaker" => Ok(Role::Speaker),
            "listener" => Ok(Role::Listener),
            "scribe" => Ok(Role::Scribe),
            "observer-temporary" | "observer" => Ok(Role::ObserverTemporary),
            "observer-permanent" | "passive" => Ok(Role::ObserverPermanent),
            other => Err(format!(
                "Unknown role: {}. Valid: speaker, listener, scribe, observer-temporary, observer-permanent",
                other
            )),
        }
    }
}
