//! Extraction error types.

use thiserror::Error;

/// Errors raised while extracting structured information.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// The model collaborator could not be reached or refused the call.
    #[error("extraction call failed: {0}")]
    ExtractionCall(String),

    /// The collaborator answered, but not with the expected field mapping.
    #[error("malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("confidence score must be between 0.0 and 1.0, got {0}")]
    InvalidConfidence(f64),
}

impl ExtractionError {
    pub fn call(reason: impl Into<String>) -> Self {
        Self::ExtractionCall(reason.into())
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse(reason.into())
    }

    /// Returns true if the collaborator itself failed (worth retrying).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ExtractionCall(_))
    }
}
