//! Topic suggestion board

use crate::core::error::DomainError;
use crate::core::ids::{SuggestionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a suggestion, in characters.
pub const MAX_TOPIC_CHARS: usize = 200;

/// A topic proposed by a participant
///
/// `votes` always equals `voters.len()`; the proposer's own vote is
/// counted on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSuggestion {
    pub id: SuggestionId,
    pub text: String,
    pub proposed_by: UserId,
    pub created_at: DateTime<Utc>,
    pub votes: u32,
    pub voters: Vec<UserId>,
}

impl TopicSuggestion {
    pub fn has_voted(&self, user: &UserId) -> bool {
        self.voters.contains(user)
    }
}

/// Result of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Counted,
    /// The user had already voted; nothing changed
    AlreadyVoted,
}

/// Ordered collection of topic suggestions (insertion order).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicBoard {
    suggestions: Vec<TopicSuggestion>,
}

impl TopicBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.suggestions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty()
    }

    pub fn get(&self, id: &SuggestionId) -> Option<&TopicSuggestion> {
        self.suggestions.iter().find(|s| &s.id == id)
    }

    /// Suggestions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TopicSuggestion> {
        self.suggestions.iter()
    }

    /// Id for the next suggestion; unique within the board.
    pub fn next_id(&self) -> SuggestionId {
        SuggestionId::new(format!("suggestion-{}", self.suggestions.len() + 1))
    }

    /// Append a suggestion carrying the proposer's vote.
    ///
    /// Duplicate texts are allowed. Text is trimmed and must be non-empty.
    pub fn add(
        &mut self,
        text: &str,
        by: UserId,
        at: DateTime<Utc>,
    ) -> Result<SuggestionId, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidInput(
                "topic suggestion cannot be empty".to_string(),
            ));
        }
        if text.chars().count() > MAX_TOPIC_CHARS {
            return Err(DomainError::InvalidInput(format!(
                "topic suggestion exceeds {} characters",
                MAX_TOPIC_CHARS
            )));
        }

        let id = self.next_id();
        self.suggestions.push(TopicSuggestion {
            id: id.clone(),
            text: text.to_string(),
            proposed_by: by.clone(),
            created_at: at,
            votes: 1,
            voters: vec![by],
        });
        Ok(id)
    }

    /// Record `by`'s vote. Voting twice is a no-op; votes cannot be retracted.
    pub fn vote(&mut self, id: &SuggestionId, by: UserId) -> Result<VoteOutcome, DomainError> {
        let suggestion = self
            .suggestions
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| DomainError::SuggestionNotFound(id.clone()))?;

        if suggestion.has_voted(&by) {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        suggestion.voters.push(by);
        suggestion.votes = suggestion.voters.len() as u32;
        Ok(VoteOutcome::Counted)
    }

    /// Suggestions by vote count descending; ties keep insertion order.
    pub fn ranked(&self) -> Vec<&TopicSuggestion> {
        let mut ranked: Vec<&TopicSuggestion> = self.suggestions.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }

    /// Top `limit` suggestions, for word-cloud style displays.
    pub fn leading(&self, limit: usize) -> Vec<&TopicSuggestion> {
        let mut ranked = self.ranked();
        ranked.truncate(limit);
        ranked
    }

    pub fn winner(&self) -> Option<&TopicSuggestion> {
        self.ranked().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_add_counts_proposer_vote() {
        let mut board = TopicBoard::new();
        let id = board.add("  Listening at work ", UserId::new("u1"), now()).unwrap();
        let suggestion = board.get(&id).unwrap();
        assert_eq!(suggestion.text, "Listening at work");
        assert_eq!(suggestion.votes, 1);
        assert_eq!(suggestion.voters, vec![UserId::new("u1")]);
    }

    #[test]
    fn test_duplicate_texts_allowed() {
        let mut board = TopicBoard::new();
        let a = board.add("Family", UserId::new("u1"), now()).unwrap();
        let b = board.add("Family", UserId::new("u2"), now()).unwrap();
        assert_ne!(a, b);
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_empty_suggestion_rejected() {
        let mut board = TopicBoard::new();
        assert!(matches!(
            board.add("   ", UserId::new("u1"), now()),
            Err(DomainError::InvalidInput(_))
        ));
        assert!(board.is_empty());
    }

    #[test]
    fn test_vote_is_idempotent() {
        let mut board = TopicBoard::new();
        let id = board.add("Grief", UserId::new("u1"), now()).unwrap();

        assert_eq!(board.vote(&id, UserId::new("u2")).unwrap(), VoteOutcome::Counted);
        assert_eq!(
            board.vote(&id, UserId::new("u2")).unwrap(),
            VoteOutcome::AlreadyVoted
        );

        let suggestion = board.get(&id).unwrap();
        assert_eq!(suggestion.votes, 2);
        assert_eq!(
            suggestion.voters.iter().filter(|v| v.as_str() == "u2").count(),
            1
        );
        assert_eq!(suggestion.votes as usize, suggestion.voters.len());
    }

    #[test]
    fn test_proposer_vote_again_is_noop() {
        let mut board = TopicBoard::new();
        let id = board.add("Grief", UserId::new("u1"), now()).unwrap();
        assert_eq!(
            board.vote(&id, UserId::new("u1")).unwrap(),
            VoteOutcome::AlreadyVoted
        );
        assert_eq!(board.get(&id).unwrap().votes, 1);
    }

    #[test]
    fn test_vote_unknown_suggestion() {
        let mut board = TopicBoard::new();
        let missing = SuggestionId::new("suggestion-9");
        assert_eq!(
            board.vote(&missing, UserId::new("u1")),
            Err(DomainError::SuggestionNotFound(missing))
        );
    }

    #[test]
    fn test_ranked_is_stable() {
        let mut board = TopicBoard::new();
        let first = board.add("First", UserId::new("u1"), now()).unwrap();
        let second = board.add("Second", UserId::new("u2"), now()).unwrap();
        let third = board.add("Third", UserId::new("u3"), now()).unwrap();
        board.vote(&third, UserId::new("u1")).unwrap();

        let ranked: Vec<_> = board.ranked().iter().map(|s| s.id.clone()).collect();
        assert_eq!(ranked, vec![third.clone(), first, second]);
        assert_eq!(board.winner().unwrap().id, third);
        assert_eq!(board.leading(1).len(), 1);
    }
}
