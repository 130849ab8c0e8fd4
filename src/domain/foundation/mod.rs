//! Foundation module - Shared domain primitives.
//!
//! Contains the value objects and identifiers shared by the
//! conversation and extraction modules.

mod ids;
mod timestamp;

pub use ids::{ConversationId, MessageId};
pub use timestamp::Timestamp;
