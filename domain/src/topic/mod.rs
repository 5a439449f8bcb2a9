//! Topic consensus domain
//!
//! Participants suggest topics and vote for them before the session starts;
//! the leading suggestion seeds the session topic.

pub mod board;

pub use board::{TopicBoard, TopicSuggestion, VoteOutcome};
