//! Validation Adapters - Schema validation implementations.
//!
//! Contains the adapter that checks extracted data against the extraction schema.

mod json_schema_validator;

pub use json_schema_validator::JsonSchemaValidator;
