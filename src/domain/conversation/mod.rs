//! Conversation domain module.
//!
//! Ordered message history with turn counting, read-time truncation and the
//! periodic summarization trigger.

mod errors;
mod history;
mod message;
mod summarization;
mod truncation;

pub use errors::ConversationError;
pub use history::ConversationHistory;
pub use message::{Message, Metadata, Role};
pub use summarization::{
    SummarizationPolicy, SummarizationTrigger, SummaryPrompt, DEFAULT_KEEP_RECENT_MESSAGES,
    DEFAULT_SUMMARIZATION_THRESHOLD, SUMMARY_INSTRUCTION,
};
pub use truncation::TruncationPolicy;
