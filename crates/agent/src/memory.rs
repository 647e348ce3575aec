//! Bounded conversation memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    pub answered_at: DateTime<Utc>,
}

/// The most recent turns of a conversation, oldest first.
///
/// Holds at most `capacity` turns; appending to a full history evicts the
/// oldest turn.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationHistory {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record a turn finished now, evicting the oldest one when full.
    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push_at(question, answer, Utc::now());
    }

    pub fn push_at(
        &mut self,
        question: impl Into<String>,
        answer: impl Into<String>,
        answered_at: DateTime<Utc>,
    ) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(ConversationTurn {
            question: question.into(),
            answer: answer.into(),
            answered_at,
        });
    }

    /// When the latest turn was answered.
    pub fn last_answered_at(&self) -> Option<DateTime<Utc>> {
        self.turns.back().map(|turn| turn.answered_at)
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Render for the answer prompt: `User: <q>\nAssistant: <a>\n` per turn.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("User: {}\nAssistant: {}\n", turn.question, turn.answer))
            .collect()
    }
}

/// A conversation: an id plus its history.
///
/// The pipeline takes `&mut Session`, so one session is only ever advanced by
/// one question at a time.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    history: ConversationHistory,
}

impl Session {
    /// New session with a random id.
    pub fn new(history_capacity: usize) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), history_capacity)
    }

    pub fn with_id(id: impl Into<String>, history_capacity: usize) -> Self {
        Self {
            id: id.into(),
            history: ConversationHistory::new(history_capacity),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub(crate) fn record(&mut self, question: &str, answer: &str, answered_at: DateTime<Utc>) {
        self.history.push_at(question, answer, answered_at);
    }

    /// Forget every turn but keep the id.
    pub fn reset(&mut self) {
        self.history.clear();
    }
}
