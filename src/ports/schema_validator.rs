//! Schema Validator Port - Extraction output validation interface.
//!
//! This port defines the contract for checking an extracted field mapping
//! against the extraction schema. The application layer depends on this
//! trait, while adapters (like JsonSchemaValidator) provide the implementation.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::extraction::ExtractionSchema;

/// Port for validating extracted data against its schema.
///
/// # Contract
///
/// Implementations must:
/// - Check only the fields that are present (absent fields never fail)
/// - Report every violation, not just the first
/// - Expose the schema they validate against
///
/// # Usage
///
/// ```rust,ignore
/// let validator: &dyn ExtractionValidator = &JsonSchemaValidator::new();
///
/// if let Err(err) = validator.validate(&data) {
///     for message in err.messages() {
///         println!("{message}");
///     }
/// }
/// ```
pub trait ExtractionValidator: Send + Sync {
    /// Validate present fields of `data`.
    ///
    /// Returns `Ok(())` if every present field satisfies its constraints.
    fn validate(&self, data: &Map<String, Value>) -> Result<(), SchemaValidationError>;

    /// The schema this validator enforces.
    fn schema(&self) -> &ExtractionSchema;
}

/// Per-field schema violations.
///
/// Display renders `"<field>: <constraint>"`, which is the form recorded in
/// an extraction result's validation errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaValidationError {
    #[error("{field}: is required")]
    MissingRequired { field: String },

    #[error("{field}: expected {expected}, got {actual}")]
    InvalidType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("{field}: must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("{field}: must be a valid {format}")]
    InvalidFormat { field: String, format: String },

    #[error("{field}: does not match pattern {pattern}")]
    PatternMismatch { field: String, pattern: String },

    #[error("{field}: not defined in schema")]
    UnknownField { field: String },

    #[error("{}", join_messages(.0))]
    Multiple(Vec<SchemaValidationError>),
}

fn join_messages(errors: &[SchemaValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchemaValidationError {
    /// Returns true if this error contains multiple validation failures.
    pub fn is_multiple(&self) -> bool {
        matches!(self, SchemaValidationError::Multiple(_))
    }

    /// Get the count of validation errors.
    pub fn error_count(&self) -> usize {
        match self {
            SchemaValidationError::Multiple(errors) => errors.len(),
            _ => 1,
        }
    }

    /// One human-readable message per violation, in report order.
    pub fn messages(&self) -> Vec<String> {
        match self {
            SchemaValidationError::Multiple(errors) => {
                errors.iter().flat_map(|e| e.messages()).collect()
            }
            single => vec![single.to_string()],
        }
    }

    /// Folds a list of violations into one error, or `None` if empty.
    pub fn collect(mut errors: Vec<SchemaValidationError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(SchemaValidationError::Multiple(errors)),
        }
    }
}
