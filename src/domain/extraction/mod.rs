//! Extraction domain module.
//!
//! The fixed contact-information schema and the result of one extraction call.

mod errors;
mod result;
mod schema;

pub use errors::ExtractionError;
pub use result::ExtractionResult;
pub(crate) use result::is_present;
pub use schema::{ExtractionSchema, FieldFormat, FieldSpec, FieldType};
