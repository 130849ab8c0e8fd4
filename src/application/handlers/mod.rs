//! Application handlers.
//!
//! Orchestrate domain operations against the AI provider port.

pub mod conversation;
pub mod extraction;

pub use conversation::{ConversationContextManager, ConversationStats, MessageAdded};
pub use extraction::InformationExtractor;
