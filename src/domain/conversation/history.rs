//! Conversation history - ordered message store plus summarization state.

use serde::{Deserialize, Serialize};

use super::{Message, Role};
use crate::domain::foundation::Timestamp;

/// Ordered record of a conversation.
///
/// # Invariants
///
/// - `messages` are in insertion order with non-decreasing timestamps
/// - `summary` and `last_summarized_at` are only set by [`apply_summary`]
/// - `total_turns` counts completed user→assistant pairs
///
/// # Turn counting
///
/// A turn completes on a user→assistant role transition. Several user
/// messages in a row open a single pending turn, and only the first
/// assistant reply after them completes it. System messages never affect
/// turn counting.
///
/// [`apply_summary`]: ConversationHistory::apply_summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<Message>,
    summary: Option<String>,
    last_summarized_at: Option<Timestamp>,
    total_turns: u32,
    turns_at_last_summary: u32,
    /// Index of the first message not yet covered by `summary`.
    unsummarized_from: usize,
    awaiting_reply: bool,
}

impl ConversationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, returning true when it completed a turn.
    pub fn append(&mut self, message: Message) -> bool {
        let completed = match message.role() {
            Role::User => {
                self.awaiting_reply = true;
                false
            }
            Role::Assistant if self.awaiting_reply => {
                self.awaiting_reply = false;
                self.total_turns += 1;
                true
            }
            Role::Assistant | Role::System => false,
        };

        self.messages.push(message);
        completed
    }

    /// Returns a timestamp for the next append that keeps ordering intact.
    pub fn next_timestamp(&self) -> Timestamp {
        let now = Timestamp::now();
        match self.messages.last() {
            Some(last) => now.not_before(*last.timestamp()),
            None => now,
        }
    }

    /// Replaces summarized messages with `summary`, keeping the `keep_recent`
    /// most recent messages verbatim.
    pub fn apply_summary(&mut self, summary: String, summarized_at: Timestamp, keep_recent: usize) {
        let drop_count = self.messages.len().saturating_sub(keep_recent);
        self.messages.drain(..drop_count);

        self.summary = Some(summary);
        self.last_summarized_at = Some(summarized_at);
        self.turns_at_last_summary = self.total_turns;
        self.unsummarized_from = self.messages.len();
    }

    /// Clears everything back to the initial empty state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages appended since the last summarization (all, if none yet).
    pub fn unsummarized_messages(&self) -> &[Message] {
        &self.messages[self.unsummarized_from.min(self.messages.len())..]
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn last_summarized_at(&self) -> Option<&Timestamp> {
        self.last_summarized_at.as_ref()
    }

    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    /// Turn count recorded by the most recent summarization (0 if none).
    pub fn turns_at_last_summary(&self) -> u32 {
        self.turns_at_last_summary
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
