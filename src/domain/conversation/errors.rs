//! Conversation error types.

use thiserror::Error;

/// Errors raised by conversation operations.
///
/// `InvalidRole` and `EmptyContent` are caller mistakes and are always
/// reported before any state changes. `SummarizationFailed` means the model
/// collaborator could not produce a summary; the stored history is left as it
/// was before the attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("invalid role '{0}': expected one of user, assistant, system")]
    InvalidRole(String),

    #[error("message content cannot be empty")]
    EmptyContent,

    #[error("summarization failed: {0}")]
    SummarizationFailed(String),
}

impl ConversationError {
    /// Creates a summarization failure.
    pub fn summarization_failed(reason: impl Into<String>) -> Self {
        Self::SummarizationFailed(reason.into())
    }

    /// Returns true for errors caused by invalid caller input.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidRole(_) | Self::EmptyContent)
    }
}
