//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Model collaborator for completions and function calls
//! - `ExtractionValidator` - Checks extracted data against its schema

mod ai_provider;
mod schema_validator;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, FunctionCallRequest,
    FunctionCallResponse, FunctionDefinition, Message, MessageRole, ProviderInfo, RequestMetadata,
    TokenUsage,
};
pub use schema_validator::{ExtractionValidator, SchemaValidationError};
