//! Per-viewer projection of a session record
//!
//! Every client renders from the same record; a [`SessionView`] is what
//! one participant sees of it at a given instant.

use crate::core::ids::{SessionId, UserId};
use crate::partition::{GroupConfiguration, Subgroup};
use crate::session::entities::Session;
use crate::session::phase::{SessionPhase, SessionStatus};
use crate::session::role::Role;
use crate::topic::TopicSuggestion;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};

/// Safety overlay as seen by one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SafetyView {
    pub active: bool,
    pub requested_by: Option<UserId>,
    pub requested_by_me: bool,
    /// Viewer may end the pause under the session's end policy
    pub can_end: bool,
    /// The requester's own video is off while the pause is theirs
    pub video_disabled: bool,
}

/// One row of the participant list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: UserId,
    pub display_name: String,
    pub role: Option<Role>,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub name: String,
    pub topic: String,
    pub status: SessionStatus,
    pub phase: SessionPhase,
    pub round: u32,
    pub total_rounds: Option<u32>,
    pub viewer: UserId,
    pub is_host: bool,
    pub my_role: Option<Role>,
    pub participants: Vec<ParticipantView>,
    pub available_roles: Vec<Role>,
    pub safety: SafetyView,
    pub topics: Vec<TopicSuggestion>,
    #[serde(rename = "round_remaining_secs", serialize_with = "as_seconds")]
    pub round_remaining: Option<Duration>,
    pub timer_frozen: bool,
    pub partition: Option<GroupConfiguration>,
    pub my_subgroup: Option<Subgroup>,
    pub accumulated_scribe_notes: String,
}

impl SessionView {
    pub fn project(session: &Session, viewer: &UserId, now: DateTime<Utc>) -> Self {
        let is_host = session.is_host(viewer);
        let safety = &session.safety;
        let requested_by_me = safety.is_requested_by(viewer);

        Self {
            session_id: session.id.clone(),
            name: session.name.clone(),
            topic: session.topic.clone(),
            status: session.status,
            phase: session.phase,
            round: session.round,
            total_rounds: session.total_rounds(),
            viewer: viewer.clone(),
            is_host,
            my_role: session.role_of(viewer),
            participants: session
                .participants
                .iter()
                .map(|p| ParticipantView {
                    id: p.id.clone(),
                    display_name: p.display_name.clone(),
                    role: p.role,
                    is_host: session.is_host(&p.id),
                })
                .collect(),
            available_roles: session.available_roles(),
            safety: SafetyView {
                active: safety.is_active(),
                requested_by: safety.requested_by().cloned(),
                requested_by_me,
                can_end: safety.can_end(viewer, is_host, session.safety_end_policy),
                video_disabled: requested_by_me,
            },
            topics: session.topics.ranked().into_iter().cloned().collect(),
            round_remaining: session.round_remaining(now),
            timer_frozen: safety.is_active() && session.phase == SessionPhase::Listening,
            partition: session.group_configuration.clone(),
            my_subgroup: session
                .group_configuration
                .as_ref()
                .and_then(|config| config.subgroup_of(viewer))
                .cloned(),
            accumulated_scribe_notes: session.accumulated_scribe_notes.clone(),
        }
    }

    /// Display name of whoever holds `role` this round.
    pub fn holder_name(&self, role: Role) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.role == Some(role))
            .map(|p| p.display_name.as_str())
    }
}

fn as_seconds<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
    value.map(|d| d.num_seconds()).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::entities::SessionInit;
    use crate::session::mutation::{Mutation, SessionOp};

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn listening_session() -> Session {
        let mut session = Session::create(
            SessionId::new("s1"),
            SessionInit::new("Practice", "host", "Hana"),
            t(0),
        )
        .unwrap();
        let steps = [
            ("b", SessionOp::JoinSession { display_name: "Bo".to_string() }),
            ("host", SessionOp::StartSession),
            ("host", SessionOp::SelectTopic { suggestion: None }),
            ("host", SessionOp::CompleteHelloCheckIn),
        ];
        for (actor, op) in steps {
            session
                .apply(&Mutation::new(UserId::new(actor), op), t(0))
                .unwrap();
        }
        session
    }

    #[test]
    fn test_view_shows_own_role() {
        let session = listening_session();
        let view = SessionView::project(&session, &UserId::new("b"), t(30));
        assert_eq!(view.my_role, Some(Role::Listener));
        assert!(!view.is_host);
        assert_eq!(view.total_rounds, Some(2));
        assert_eq!(view.holder_name(Role::Speaker), Some("Hana"));
        assert_eq!(view.round_remaining, Some(Duration::seconds(270)));
    }

    #[test]
    fn test_safety_view_differs_per_viewer() {
        let mut session = listening_session();
        session
            .apply(
                &Mutation::new(UserId::new("b"), SessionOp::RequestSafetyTimeout),
                t(10),
            )
            .unwrap();

        let requester = SessionView::project(&session, &UserId::new("b"), t(20));
        assert!(requester.safety.active);
        assert!(requester.safety.can_end);
        assert!(requester.safety.video_disabled);
        assert!(requester.timer_frozen);

        let host = SessionView::project(&session, &UserId::new("host"), t(20));
        assert!(host.safety.active);
        assert!(!host.safety.can_end);
        assert!(!host.safety.video_disabled);
        assert_eq!(host.safety.requested_by, Some(UserId::new("b")));
    }

    #[test]
    fn test_view_serializes_remaining_seconds() {
        let session = listening_session();
        let view = SessionView::project(&session, &UserId::new("host"), t(60));
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["round_remaining_secs"], 240);
        assert_eq!(json["phase"], "listening");
        assert_eq!(json["my_role"], "speaker");
    }
}
