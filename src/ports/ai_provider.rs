//! AI Provider Port - Interface for LLM provider integrations.
//!
//! This port abstracts the model collaborator used for summarization and
//! information extraction. The core only needs two capabilities: free-text
//! completion and a forced function call returning structured arguments.
//!
//! # Design
//!
//! - Provider-agnostic message format
//! - Token usage reported per call
//! - Error types for common failure modes (rate limits, auth, network, etc.)
//! - Retries are the adapter's concern, never the caller's
//!
//! # Example
//!
//! ```ignore
//! let request = CompletionRequest::new(RequestMetadata::for_conversation(id))
//!     .with_system_prompt(SUMMARY_INSTRUCTION)
//!     .with_message(MessageRole::User, transcript);
//! let summary = provider.complete(request).await?.content;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::conversation::{self, Role};
use crate::domain::foundation::ConversationId;

/// Model collaborator used by summarization and extraction.
///
/// Implementations connect to an external model service and translate
/// between the provider-specific API and these request/response types.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Generate a free-text completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Force the model to call `request.function` and return its arguments.
    async fn call_function(
        &self,
        request: FunctionCallRequest,
    ) -> Result<FunctionCallResponse, AIError>;

    /// Name, model and whether function calling works.
    fn provider_info(&self) -> ProviderInfo;
}

/// Free-text completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt to guide model behavior.
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Sampling temperature; summaries and extraction use low values.
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl CompletionRequest {
    pub fn new(metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
            metadata,
        }
    }

    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    /// Replaces the conversation messages.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Function the model is asked to call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments.
    pub parameters: Value,
}

impl FunctionDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Converts to the OpenAI `tools` entry format.
    pub fn to_openai_format(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Request for a forced function call.
#[derive(Debug, Clone)]
pub struct FunctionCallRequest {
    pub messages: Vec<Message>,
    pub function: FunctionDefinition,
    pub temperature: Option<f32>,
    pub metadata: RequestMetadata,
}

impl FunctionCallRequest {
    pub fn new(function: FunctionDefinition, metadata: RequestMetadata) -> Self {
        Self {
            messages: Vec::new(),
            function,
            temperature: None,
            metadata,
        }
    }

    pub fn with_message(mut self, role: MessageRole, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Structured output of a function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCallResponse {
    /// Name of the function the model called.
    pub function_name: String,
    /// Raw argument text as produced by the model (expected to be a JSON object).
    pub arguments: String,
    pub usage: TokenUsage,
    pub model: String,
}

/// Message in the `{role, content}` shape providers accept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

impl From<&conversation::Message> for Message {
    fn from(message: &conversation::Message) -> Self {
        Self::new(message.role().into(), message.content())
    }
}

/// Provider-side role; mirrors the domain `Role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl From<Role> for MessageRole {
    fn from(role: Role) -> Self {
        match role {
            Role::System => Self::System,
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

/// Correlates provider calls with a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    /// Conversation the request belongs to.
    pub conversation_id: ConversationId,
    pub trace_id: String,
}

impl RequestMetadata {
    pub fn new(conversation_id: ConversationId, trace_id: impl Into<String>) -> Self {
        Self {
            conversation_id,
            trace_id: trace_id.into(),
        }
    }

    /// Metadata with a freshly generated trace id.
    pub fn for_conversation(conversation_id: ConversationId) -> Self {
        Self::new(conversation_id, uuid::Uuid::new_v4().to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: FinishReason,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// prompt + completion
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// Why generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Hit max_tokens limit.
    Length,
    /// The model called a tool/function.
    ToolCalls,
    /// Content was filtered for safety.
    ContentFilter,
}

/// Identity of a provider implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name (e.g., "groq", "openai").
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Whether function/tool calling is supported.
    pub supports_functions: bool,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            supports_functions: false,
        }
    }

    pub fn with_functions(mut self, supports: bool) -> Self {
        self.supports_functions = supports;
        self
    }
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u32,
    },

    /// Context (prompt + history) exceeds model limit.
    #[error("context too long: {0}")]
    ContextTooLong(String),

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered {
        reason: String,
    },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable {
        message: String,
    },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model does not support function calling.
    #[error("function calling not supported by {model}")]
    FunctionsUnsupported {
        /// Model that rejected the call.
        model: String,
    },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        timeout_secs: u32,
    },
}

impl AIError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Adapters retry these; everything else fails immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable { .. }
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}
