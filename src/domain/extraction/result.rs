//! Outcome of one extraction call.

use serde::Serialize;
use serde_json::{Map, Value};

use super::ExtractionError;
use crate::domain::foundation::Timestamp;

/// Structured facts pulled from chat text, with their validation outcome.
///
/// # Invariants
///
/// - `confidence_score` is within `[0.0, 1.0]`
/// - `is_valid()` holds exactly when `validation_errors` is empty
/// - absent fields are missing from `extracted_data`, never empty strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    extracted_data: Map<String, Value>,
    confidence_score: f64,
    validation_errors: Vec<String>,
    raw_response: Option<String>,
    extraction_timestamp: Timestamp,
}

impl ExtractionResult {
    /// Creates a result stamped with the current time.
    ///
    /// # Errors
    ///
    /// - `InvalidConfidence` if `confidence_score` is outside `[0.0, 1.0]` or NaN
    pub fn new(
        extracted_data: Map<String, Value>,
        confidence_score: f64,
        validation_errors: Vec<String>,
        raw_response: Option<String>,
    ) -> Result<Self, ExtractionError> {
        if !(0.0..=1.0).contains(&confidence_score) {
            return Err(ExtractionError::InvalidConfidence(confidence_score));
        }

        Ok(Self {
            extracted_data,
            confidence_score,
            validation_errors,
            raw_response,
            extraction_timestamp: Timestamp::now(),
        })
    }

    /// A result carrying no data, zero confidence and `error` as its only message.
    pub fn failed(error: &ExtractionError, raw_response: Option<String>) -> Self {
        Self {
            extracted_data: Map::new(),
            confidence_score: 0.0,
            validation_errors: vec![error.to_string()],
            raw_response,
            extraction_timestamp: Timestamp::now(),
        }
    }

    pub fn extracted_data(&self) -> &Map<String, Value> {
        &self.extracted_data
    }

    pub fn confidence_score(&self) -> f64 {
        self.confidence_score
    }

    pub fn validation_errors(&self) -> &[String] {
        &self.validation_errors
    }

    /// The model's structured output as received, for diagnostics.
    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    pub fn extraction_timestamp(&self) -> &Timestamp {
        &self.extraction_timestamp
    }

    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    /// True if at least one field carries a non-empty value.
    pub fn has_data(&self) -> bool {
        self.extracted_data.values().any(is_present)
    }

    /// Names of fields with non-empty values.
    pub fn extracted_fields(&self) -> Vec<&str> {
        self.extracted_data
            .iter()
            .filter(|(_, v)| is_present(v))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extracted_data.get(field)
    }
}

/// Null and blank strings count as "not mentioned".
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}
