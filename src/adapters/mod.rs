//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `ai` - Model providers (mock, OpenAI-compatible HTTP)
//! - `validation` - Extraction schema validation

pub mod ai;
pub mod validation;

pub use ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use validation::JsonSchemaValidator;
