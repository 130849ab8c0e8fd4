//! Periodic summarization: when to summarize and what to send.

use super::{ConversationHistory, Message, Role};

/// Fixed instruction sent with every summarization request.
pub const SUMMARY_INSTRUCTION: &str =
    "You condense conversations. Produce a concise summary preserving names, facts, and commitments.";

/// Default number of completed turns between summarizations.
pub const DEFAULT_SUMMARIZATION_THRESHOLD: u32 = 5;

/// Default number of most recent messages kept verbatim after summarizing.
pub const DEFAULT_KEEP_RECENT_MESSAGES: usize = 2;

/// Decides whether the history is due for summarization.
///
/// Fires when `total_turns` is a positive multiple of the threshold and no
/// summarization has been recorded at that turn count yet, so it fires once
/// per multiple rather than on every message after the threshold is crossed.
/// A threshold of zero disables the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizationTrigger {
    threshold: u32,
}

impl SummarizationTrigger {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn should_summarize(&self, history: &ConversationHistory) -> bool {
        let turns = history.total_turns();
        self.threshold > 0
            && turns > 0
            && turns % self.threshold == 0
            && history.turns_at_last_summary() != turns
    }
}

impl Default for SummarizationTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_SUMMARIZATION_THRESHOLD)
    }
}

/// Summarization settings for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummarizationPolicy {
    pub trigger: SummarizationTrigger,
    /// Messages kept verbatim after a summary replaces the rest.
    pub keep_recent_messages: usize,
    /// Summarize inside `add_message` as soon as the trigger fires.
    pub auto_summarize: bool,
}

impl SummarizationPolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            trigger: SummarizationTrigger::new(threshold),
            ..Self::default()
        }
    }

    pub fn with_keep_recent_messages(mut self, keep: usize) -> Self {
        self.keep_recent_messages = keep;
        self
    }

    pub fn with_auto_summarize(mut self, enabled: bool) -> Self {
        self.auto_summarize = enabled;
        self
    }
}

impl Default for SummarizationPolicy {
    fn default() -> Self {
        Self {
            trigger: SummarizationTrigger::default(),
            keep_recent_messages: DEFAULT_KEEP_RECENT_MESSAGES,
            auto_summarize: true,
        }
    }
}

/// Renders the part of a conversation that still needs summarizing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPrompt {
    /// Instruction for the model.
    pub instruction: &'static str,
    /// Transcript (and earlier summary, if any) to condense.
    pub transcript: String,
}

impl SummaryPrompt {
    /// Builds a prompt from the history, or `None` when nothing is new.
    pub fn from_history(history: &ConversationHistory) -> Option<Self> {
        let fresh = history.unsummarized_messages();
        if fresh.is_empty() {
            return None;
        }

        let mut transcript = String::new();
        if let Some(previous) = history.summary() {
            transcript.push_str("Summary of the earlier conversation:\n");
            transcript.push_str(previous);
            transcript.push_str("\n\n");
        }
        transcript.push_str("Conversation:\n");
        transcript.push_str(&render_transcript(fresh));

        Some(Self {
            instruction: SUMMARY_INSTRUCTION,
            transcript,
        })
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::System => "System",
    }
}

fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", speaker(m.role()), m.content()))
        .collect::<Vec<_>>()
        .join("\n")
}
