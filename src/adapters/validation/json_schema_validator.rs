//! JSON Schema Validator - Implementation of ExtractionValidator.
//!
//! Validates extracted field mappings against the declarative extraction
//! schema without an external JSON-Schema engine. Only the constraint kinds
//! the schema can express are checked: type, email format, regex pattern and
//! integer bounds.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::domain::extraction::{is_present, ExtractionSchema, FieldFormat, FieldSpec, FieldType};
use crate::ports::{ExtractionValidator, SchemaValidationError};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
        .unwrap_or_else(|e| panic!("email pattern must compile: {}", e))
});

/// Schema-driven validator implementation.
///
/// # Thread Safety
///
/// This struct is `Send + Sync` and can be shared across threads.
pub struct JsonSchemaValidator {
    schema: &'static ExtractionSchema,
    /// Compiled field patterns, keyed by field name.
    patterns: HashMap<&'static str, Regex>,
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSchemaValidator {
    /// Create a validator for the contact-information schema.
    pub fn new() -> Self {
        Self::for_schema(ExtractionSchema::contact_info())
    }

    /// Create a validator for an arbitrary static schema.
    pub fn for_schema(schema: &'static ExtractionSchema) -> Self {
        let patterns = schema
            .fields()
            .iter()
            .filter_map(|spec| {
                let pattern = spec.pattern?;
                match Regex::new(pattern) {
                    Ok(regex) => Some((spec.name, regex)),
                    Err(e) => {
                        tracing::warn!(field = spec.name, error = %e, "Skipping invalid field pattern");
                        None
                    }
                }
            })
            .collect();

        Self { schema, patterns }
    }

    fn validate_field(&self, spec: &FieldSpec, value: &Value, errors: &mut Vec<SchemaValidationError>) {
        match spec.field_type {
            FieldType::String => self.validate_string(spec, value, errors),
            FieldType::Integer => Self::validate_integer(spec, value, errors),
        }
    }

    fn validate_string(&self, spec: &FieldSpec, value: &Value, errors: &mut Vec<SchemaValidationError>) {
        let Some(text) = value.as_str() else {
            errors.push(Self::invalid_type(spec, value));
            return;
        };

        if let Some(format) = spec.format {
            let matches = match format {
                FieldFormat::Email => EMAIL_REGEX.is_match(text),
            };
            if !matches {
                errors.push(SchemaValidationError::InvalidFormat {
                    field: spec.name.to_string(),
                    format: format.as_str().to_string(),
                });
            }
        }

        if let Some(regex) = self.patterns.get(spec.name) {
            if !regex.is_match(text) {
                errors.push(SchemaValidationError::PatternMismatch {
                    field: spec.name.to_string(),
                    pattern: regex.as_str().to_string(),
                });
            }
        }
    }

    fn validate_integer(spec: &FieldSpec, value: &Value, errors: &mut Vec<SchemaValidationError>) {
        let Some(number) = Self::as_integer(value) else {
            errors.push(Self::invalid_type(spec, value));
            return;
        };

        let below = spec.minimum.is_some_and(|min| number < min);
        let above = spec.maximum.is_some_and(|max| number > max);
        if below || above {
            errors.push(SchemaValidationError::OutOfRange {
                field: spec.name.to_string(),
                value: number.to_string(),
                min: spec.minimum.map_or_else(|| "-inf".to_string(), |m| m.to_string()),
                max: spec.maximum.map_or_else(|| "inf".to_string(), |m| m.to_string()),
            });
        }
    }

    /// Integers, including floats with no fractional part (`28.0`).
    fn as_integer(value: &Value) -> Option<i64> {
        if let Some(n) = value.as_i64() {
            return Some(n);
        }
        let f = value.as_f64()?;
        (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then_some(f as i64)
    }

    fn invalid_type(spec: &FieldSpec, value: &Value) -> SchemaValidationError {
        SchemaValidationError::InvalidType {
            field: spec.name.to_string(),
            expected: spec.field_type.as_str().to_string(),
            actual: Self::type_name(value),
        }
    }

    fn type_name(value: &Value) -> String {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
        .to_string()
    }
}

impl ExtractionValidator for JsonSchemaValidator {
    fn validate(&self, data: &Map<String, Value>) -> Result<(), SchemaValidationError> {
        let mut errors = Vec::new();

        // Schema order keeps messages stable regardless of map ordering.
        for spec in self.schema.fields() {
            match data.get(spec.name).filter(|v| is_present(v)) {
                Some(value) => self.validate_field(spec, value, &mut errors),
                None if spec.required => errors.push(SchemaValidationError::MissingRequired {
                    field: spec.name.to_string(),
                }),
                None => {}
            }
        }

        for key in data.keys() {
            if self.schema.field(key).is_none() {
                errors.push(SchemaValidationError::UnknownField { field: key.clone() });
            }
        }

        match SchemaValidationError::collect(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn schema(&self) -> &ExtractionSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> JsonSchemaValidator {
        JsonSchemaValidator::new()
    }

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn messages(value: Value) -> Vec<String> {
        validator()
            .validate(&data(value))
            .err()
            .map(|e| e.messages())
            .unwrap_or_default()
    }

    mod valid_input {
        use super::*;

        #[test]
        fn accepts_full_contact() {
            let result = validator().validate(&data(json!({
                "name": "Sarah Johnson",
                "email": "sarah@email.com",
                "phone": "+1-555-0123",
                "location": "New York City",
                "age": 28
            })));
            assert!(result.is_ok());
        }

        #[test]
        fn accepts_empty_mapping() {
            assert!(validator().validate(&Map::new()).is_ok());
        }

        #[test]
        fn absent_null_and_blank_fields_never_fail() {
            assert!(messages(json!({"email": null, "phone": "", "age": null})).is_empty());
        }

        #[test]
        fn accepts_age_bounds_and_whole_floats() {
            assert!(messages(json!({"age": 0})).is_empty());
            assert!(messages(json!({"age": 150})).is_empty());
            assert!(messages(json!({"age": 28.0})).is_empty());
        }

        #[test]
        fn accepts_phone_with_parentheses_and_spaces() {
            assert!(messages(json!({"phone": "(555) 123 4567"})).is_empty());
        }
    }

    mod violations {
        use super::*;

        #[test]
        fn age_out_of_range_names_field_and_bounds() {
            assert_eq!(
                messages(json!({"age": 200})),
                vec!["age: must be between 0 and 150, got 200".to_string()]
            );
        }

        #[test]
        fn negative_age_is_out_of_range() {
            assert_eq!(messages(json!({"age": -1})).len(), 1);
        }

        #[test]
        fn age_as_string_is_wrong_type() {
            assert_eq!(
                messages(json!({"age": "28"})),
                vec!["age: expected integer, got string".to_string()]
            );
        }

        #[test]
        fn fractional_age_is_wrong_type() {
            assert_eq!(
                messages(json!({"age": 28.5})),
                vec!["age: expected integer, got number".to_string()]
            );
        }

        #[test]
        fn bad_email_format() {
            assert_eq!(
                messages(json!({"email": "not-an-email"})),
                vec!["email: must be a valid email".to_string()]
            );
        }

        #[test]
        fn phone_with_letters_mismatches_pattern() {
            let msgs = messages(json!({"phone": "call me maybe"}));
            assert_eq!(msgs.len(), 1);
            assert!(msgs[0].starts_with("phone: does not match pattern"));
        }

        #[test]
        fn unknown_field_is_reported() {
            assert_eq!(
                messages(json!({"ssn": "123"})),
                vec!["ssn: not defined in schema".to_string()]
            );
        }

        #[test]
        fn reports_every_violation_in_schema_order() {
            let msgs = messages(json!({"age": 200, "email": "nope", "name": 42}));
            assert_eq!(msgs.len(), 3);
            assert!(msgs[0].starts_with("name:"));
            assert!(msgs[1].starts_with("email:"));
            assert!(msgs[2].starts_with("age:"));
        }
    }

    #[test]
    fn exposes_contact_schema() {
        assert_eq!(validator().schema().function_name(), "extract_contact_information");
    }
}
