//! Message entity for conversations.
//!
//! Messages are immutable records of user/assistant exchanges within a conversation.
//! Each message has a role (user/assistant/system), content, timestamp and
//! free-form metadata.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConversationError;
use crate::domain::foundation::{MessageId, Timestamp};

/// Open, string-keyed metadata attached to a message.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions (typically invisible to user).
    System,
    /// User input.
    User,
    /// AI assistant response.
    Assistant,
}

impl Role {
    /// Returns the lowercase wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Returns true if this is a user-visible role.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ConversationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(ConversationError::InvalidRole(other.to_string())),
        }
    }
}

/// An immutable message within a conversation.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `content` is non-empty after trimming (validated at construction)
/// - `timestamp` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
    timestamp: Timestamp,
    #[serde(default)]
    metadata: Metadata,
}

impl Message {
    /// Creates a new message stamped with the current time.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if content is empty or whitespace-only
    pub fn new(role: Role, content: impl Into<String>) -> Result<Self, ConversationError> {
        Self::with_metadata(role, content, Metadata::new(), Timestamp::now())
    }

    /// Creates a message with explicit metadata and timestamp.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if content is empty or whitespace-only
    pub fn with_metadata(
        role: Role,
        content: impl Into<String>,
        metadata: Metadata,
        timestamp: Timestamp,
    ) -> Result<Self, ConversationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ConversationError::EmptyContent);
        }

        Ok(Self {
            id: MessageId::new(),
            role,
            content,
            timestamp,
            metadata,
        })
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Result<Self, ConversationError> {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Result<Self, ConversationError> {
        Self::new(Role::Assistant, content)
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Result<Self, ConversationError> {
        Self::new(Role::System, content)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Length of the content in characters (Unicode scalar values).
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
