//! Declarative extraction schema.
//!
//! The contact-information schema is fixed for the life of the process and
//! shared through a lazily built static.

use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

/// JSON type of an extractable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// Named string formats understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
}

impl FieldFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
        }
    }
}

/// Constraints for one schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub field_type: FieldType,
    pub description: &'static str,
    pub format: Option<FieldFormat>,
    pub pattern: Option<&'static str>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
    pub required: bool,
}

impl FieldSpec {
    fn new(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            field_type,
            description,
            format: None,
            pattern: None,
            minimum: None,
            maximum: None,
            required: false,
        }
    }

    fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }

    fn with_pattern(mut self, pattern: &'static str) -> Self {
        self.pattern = Some(pattern);
        self
    }

    fn with_bounds(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn to_json(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(self.field_type.as_str()));
        property.insert("description".to_string(), json!(self.description));
        if let Some(format) = self.format {
            property.insert("format".to_string(), json!(format.as_str()));
        }
        if let Some(pattern) = self.pattern {
            property.insert("pattern".to_string(), json!(pattern));
        }
        if let Some(minimum) = self.minimum {
            property.insert("minimum".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            property.insert("maximum".to_string(), json!(maximum));
        }
        Value::Object(property)
    }
}

/// Description of the fields an extraction call may return.
///
/// Every field is optional: the contract is "extract what is present,
/// validate what is extracted". Fields outside the schema are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSchema {
    function_name: &'static str,
    description: &'static str,
    fields: Vec<FieldSpec>,
    json: Value,
}

static CONTACT_INFO: Lazy<ExtractionSchema> = Lazy::new(|| {
    ExtractionSchema::new(
        "extract_contact_information",
        "Extract contact information mentioned in the conversation. \
         Omit any field that is not stated.",
        vec![
            FieldSpec::new("name", FieldType::String, "Full name of the person"),
            FieldSpec::new("email", FieldType::String, "Email address")
                .with_format(FieldFormat::Email),
            FieldSpec::new("phone", FieldType::String, "Phone number")
                .with_pattern(r"^[0-9+\-() ]+$"),
            FieldSpec::new("location", FieldType::String, "City, region or country"),
            FieldSpec::new("age", FieldType::Integer, "Age in years").with_bounds(0, 150),
        ],
    )
});

impl ExtractionSchema {
    fn new(function_name: &'static str, description: &'static str, fields: Vec<FieldSpec>) -> Self {
        let json = render(&fields);
        Self {
            function_name,
            description,
            fields,
            json,
        }
    }

    /// The process-wide contact-information schema.
    pub fn contact_info() -> &'static ExtractionSchema {
        &CONTACT_INFO
    }

    /// Name of the function the model is asked to call.
    pub fn function_name(&self) -> &'static str {
        self.function_name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Field specs in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Names of the required fields (empty for the contact schema).
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// The schema as a JSON-Schema object, suitable as function parameters.
    pub fn json_schema(&self) -> &Value {
        &self.json
    }
}

fn render(fields: &[FieldSpec]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|f| (f.name.to_string(), f.to_json()))
        .collect();
    let required: Vec<&str> = fields.iter().filter(|f| f.required).map(|f| f.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}
