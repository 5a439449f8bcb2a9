//! Identifier value objects
//!
//! Ids are opaque strings assigned by the session store (sessions), the
//! identity provider (users) or the session record itself (suggestions).

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of one canonical session record.
    SessionId
);

string_id!(
    /// Identifier of an authenticated user (participant or host).
    UserId
);

string_id!(
    /// Identifier of a topic suggestion, unique within its session.
    SuggestionId
);

impl SessionId {
    /// Id of the `index`-th (1-based) sub-session created by a split partition.
    ///
    /// Deterministic so that any client can finish an interrupted split
    /// without producing duplicates.
    pub fn subgroup(&self, index: usize) -> SessionId {
        SessionId(format!("{}-g{}", self.0, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subgroup_ids_are_deterministic() {
        let parent = SessionId::new("abc");
        assert_eq!(parent.subgroup(1).as_str(), "abc-g1");
        assert_eq!(parent.subgroup(2), SessionId::new("abc-g2"));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = UserId::new("user-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
        let back: UserId = serde_json::from_str("\"user-1\"").unwrap();
        assert_eq!(back, id);
    }
}
