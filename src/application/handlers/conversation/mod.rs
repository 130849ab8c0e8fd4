//! Conversation handlers.
//!
//! Owns message history, turn counting and summarization for one conversation.

mod context_manager;

pub use context_manager::{ConversationContextManager, ConversationStats, MessageAdded};
