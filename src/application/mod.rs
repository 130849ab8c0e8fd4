//! Application layer - Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Conversation context management and information extraction are
//! independent; both depend only on the `AIProvider` port.

pub mod handlers;

pub use handlers::{
    ConversationContextManager, ConversationStats, InformationExtractor, MessageAdded,
};
