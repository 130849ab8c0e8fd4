//! Read-time truncation of conversation messages.
//!
//! Truncation picks which messages are presented to a model. It works on a
//! borrowed slice and returns a suffix of it, so stored history is never
//! modified; only summarization changes what is stored.

use serde::{Deserialize, Serialize};

use super::{Message, Role};

/// Strategy for trimming messages before they are sent to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Keep the last `turns` turns.
    ByTurns { turns: usize },
    /// Keep the most recent messages whose combined length fits `max_chars`.
    ByLength { max_chars: usize },
    /// Apply `ByTurns` first, then `ByLength` to the result.
    Hybrid { turns: usize, max_chars: usize },
}

impl TruncationPolicy {
    pub fn by_turns(turns: usize) -> Self {
        Self::ByTurns { turns }
    }

    pub fn by_length(max_chars: usize) -> Self {
        Self::ByLength { max_chars }
    }

    pub fn hybrid(turns: usize, max_chars: usize) -> Self {
        Self::Hybrid { turns, max_chars }
    }

    /// Returns the surviving suffix of `messages`.
    pub fn apply<'a>(&self, messages: &'a [Message]) -> &'a [Message] {
        match *self {
            Self::ByTurns { turns } => keep_last_turns(messages, turns),
            Self::ByLength { max_chars } => keep_within_length(messages, max_chars),
            Self::Hybrid { turns, max_chars } => {
                keep_within_length(keep_last_turns(messages, turns), max_chars)
            }
        }
    }
}

/// Start indices of completed turns, oldest first.
///
/// Uses the same rule as turn counting in the history: a turn opens at the
/// first user message after a completed turn and completes at the next
/// assistant message. System messages never open or complete a turn.
fn completed_turn_starts(messages: &[Message]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut open: Option<usize> = None;

    for (index, message) in messages.iter().enumerate() {
        match message.role() {
            Role::User => {
                open.get_or_insert(index);
            }
            Role::Assistant => {
                if let Some(start) = open.take() {
                    starts.push(start);
                }
            }
            Role::System => {}
        }
    }

    starts
}

/// Keeps the last `turns` completed turns plus anything after them, such as a
/// user message still awaiting its reply.
fn keep_last_turns(messages: &[Message], turns: usize) -> &[Message] {
    if turns == 0 {
        return &messages[messages.len()..];
    }

    let starts = completed_turn_starts(messages);
    match starts.len().checked_sub(turns) {
        Some(first) => &messages[starts[first]..],
        None => messages,
    }
}

fn keep_within_length(messages: &[Message], max_chars: usize) -> &[Message] {
    let mut total = 0usize;
    let mut start = messages.len();

    for (index, message) in messages.iter().enumerate().rev() {
        let len = message.char_len();
        // The most recent message always survives, even if it alone is too long.
        if start != messages.len() && total + len > max_chars {
            break;
        }
        total += len;
        start = index;
    }

    &messages[start..]
}
