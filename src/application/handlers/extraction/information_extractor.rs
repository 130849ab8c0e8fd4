//! InformationExtractor - schema-constrained extraction via function calling.
//!
//! Asks the model to call the schema's function with whatever contact details
//! the text states, then validates what came back. Transport failures and
//! malformed payloads degrade to an error-bearing [`ExtractionResult`] so
//! batch callers always get a result back.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::extraction::{is_present, ExtractionError, ExtractionResult};
use crate::domain::foundation::ConversationId;
use crate::ports::{
    AIProvider, ExtractionValidator, FunctionCallRequest, FunctionCallResponse,
    FunctionDefinition, MessageRole, RequestMetadata,
};

/// Instruction sent ahead of the text to extract from.
const EXTRACTION_INSTRUCTION: &str = "Extract the contact information stated in the user's text \
     by calling the provided function. Include only fields that are explicitly mentioned; \
     omit anything that is not stated.";

/// Low temperature for deterministic extraction.
const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Orchestrates one function-call extraction per input text.
pub struct InformationExtractor {
    provider: Arc<dyn AIProvider>,
    validator: Arc<dyn ExtractionValidator>,
    conversation_id: ConversationId,
}

impl InformationExtractor {
    /// Creates an extractor checking model output with `validator`.
    pub fn new(provider: Arc<dyn AIProvider>, validator: Arc<dyn ExtractionValidator>) -> Self {
        Self {
            provider,
            validator,
            conversation_id: ConversationId::new(),
        }
    }

    /// Tags provider requests with an existing conversation.
    pub fn with_conversation_id(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = conversation_id;
        self
    }

    /// Extracts contact information, never failing outward.
    ///
    /// A transport failure yields a result with no data, zero confidence and
    /// the error as its only validation message.
    pub async fn extract_information(&self, chat_text: &str) -> ExtractionResult {
        match self.try_extract_information(chat_text).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    conversation_id = %self.conversation_id,
                    error = %err,
                    "Extraction call failed"
                );
                ExtractionResult::failed(&err, None)
            }
        }
    }

    /// Extracts contact information, surfacing transport failures.
    ///
    /// # Errors
    ///
    /// - `ExtractionCall` if the provider call fails
    ///
    /// Malformed payloads still produce an `Ok` result carrying the error.
    pub async fn try_extract_information(
        &self,
        chat_text: &str,
    ) -> Result<ExtractionResult, ExtractionError> {
        let request = FunctionCallRequest::new(
            self.function_definition(),
            RequestMetadata::for_conversation(self.conversation_id),
        )
        .with_message(MessageRole::System, EXTRACTION_INSTRUCTION)
        .with_message(MessageRole::User, chat_text)
        .with_temperature(EXTRACTION_TEMPERATURE);

        let response = self
            .provider
            .call_function(request)
            .await
            .map_err(|e| ExtractionError::call(e.to_string()))?;

        let data = match self.parse_arguments(&response) {
            Ok(data) => data,
            Err(err) => {
                warn!(
                    conversation_id = %self.conversation_id,
                    function = %response.function_name,
                    error = %err,
                    "Malformed extraction response"
                );
                return Ok(ExtractionResult::failed(&err, Some(response.arguments)));
            }
        };

        let confidence = self.confidence(&data);
        let errors = self.validate_extraction(&data);

        debug!(
            conversation_id = %self.conversation_id,
            fields = data.len(),
            confidence,
            violations = errors.len(),
            "Extraction completed"
        );

        ExtractionResult::new(data, confidence, errors, Some(response.arguments))
    }

    /// Checks present fields against the schema; one message per violation.
    pub fn validate_extraction(&self, extracted_data: &Map<String, Value>) -> Vec<String> {
        match self.validator.validate(extracted_data) {
            Ok(()) => Vec::new(),
            Err(err) => err.messages(),
        }
    }

    /// The JSON schema sent to the model as function parameters.
    pub fn get_extraction_schema(&self) -> Value {
        self.validator.schema().json_schema().clone()
    }

    /// The function definition sent with every extraction request.
    pub fn function_definition(&self) -> FunctionDefinition {
        let schema = self.validator.schema();
        FunctionDefinition::new(
            schema.function_name(),
            schema.description(),
            schema.json_schema().clone(),
        )
    }

    /// Parses raw arguments into present schema fields.
    fn parse_arguments(
        &self,
        response: &FunctionCallResponse,
    ) -> Result<Map<String, Value>, ExtractionError> {
        let schema = self.validator.schema();

        if response.function_name != schema.function_name() {
            return Err(ExtractionError::malformed(format!(
                "expected a call to {}, got {}",
                schema.function_name(),
                response.function_name
            )));
        }

        let parsed: Value = serde_json::from_str(&response.arguments)
            .map_err(|e| ExtractionError::malformed(format!("arguments are not valid JSON: {}", e)))?;

        let Value::Object(fields) = parsed else {
            return Err(ExtractionError::malformed("arguments are not a JSON object"));
        };

        if let Some(unknown) = fields.keys().find(|k| schema.field(k).is_none()) {
            return Err(ExtractionError::malformed(format!(
                "field '{}' is not part of the schema",
                unknown
            )));
        }

        Ok(fields.into_iter().filter(|(_, v)| is_present(v)).collect())
    }

    fn confidence(&self, data: &Map<String, Value>) -> f64 {
        let total = self.validator.schema().field_count();
        if total == 0 {
            return 0.0;
        }
        (data.len() as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::adapters::validation::JsonSchemaValidator;
    use serde_json::json;

    const FUNCTION: &str = "extract_contact_information";

    fn extractor(provider: &MockAIProvider) -> InformationExtractor {
        InformationExtractor::new(Arc::new(provider.clone()), Arc::new(JsonSchemaValidator::new()))
    }

    fn responding(arguments: Value) -> MockAIProvider {
        MockAIProvider::new().with_function_call(FUNCTION, arguments.to_string())
    }

    mod successful_extraction {
        use super::*;

        #[tokio::test]
        async fn sarah_johnson_scenario() {
            let provider = responding(json!({
                "name": "Sarah Johnson",
                "email": "sarah@email.com",
                "phone": "+1-555-0123",
                "age": 28
            }));

            let result = extractor(&provider)
                .extract_information(
                    "Hi, I'm Sarah Johnson. Email sarah@email.com, phone +1-555-0123, age 28",
                )
                .await;

            assert_eq!(result.get("name"), Some(&json!("Sarah Johnson")));
            assert_eq!(result.get("email"), Some(&json!("sarah@email.com")));
            assert_eq!(result.get("phone"), Some(&json!("+1-555-0123")));
            assert_eq!(result.get("age"), Some(&json!(28)));
            assert_eq!(result.get("location"), None);
            assert!(result.is_valid());
            assert!((result.confidence_score() - 0.8).abs() < f64::EPSILON);
        }

        #[tokio::test]
        async fn null_and_blank_fields_are_absent() {
            let provider = responding(json!({"name": "Li", "email": null, "location": ""}));

            let result = extractor(&provider).extract_information("I'm Li").await;

            assert_eq!(result.extracted_fields(), vec!["name"]);
            assert!(!result.extracted_data().contains_key("email"));
            assert!(!result.extracted_data().contains_key("location"));
            assert!((result.confidence_score() - 0.2).abs() < f64::EPSILON);
        }

        #[tokio::test]
        async fn nothing_mentioned_gives_zero_confidence() {
            let provider = responding(json!({}));

            let result = extractor(&provider).extract_information("Nice weather").await;

            assert!(result.is_valid());
            assert!(!result.has_data());
            assert_eq!(result.confidence_score(), 0.0);
        }

        #[tokio::test]
        async fn keeps_raw_arguments() {
            let provider = MockAIProvider::new().with_function_call(FUNCTION, r#"{"name":"Al"}"#);

            let result = extractor(&provider).extract_information("Al here").await;

            assert_eq!(result.raw_response(), Some(r#"{"name":"Al"}"#));
        }
    }

    mod partial_validity {
        use super::*;

        #[tokio::test]
        async fn age_out_of_range_is_reported_and_kept() {
            let provider = responding(json!({"name": "Old Tom", "age": 200}));

            let result = extractor(&provider).extract_information("Tom, 200 years").await;

            assert!(!result.is_valid());
            assert_eq!(result.validation_errors().len(), 1);
            let message = &result.validation_errors()[0];
            assert!(message.contains("age"));
            assert!(message.contains("0") && message.contains("150"));
            assert_eq!(result.get("name"), Some(&json!("Old Tom")));
            assert_eq!(result.get("age"), Some(&json!(200)));
            assert!((result.confidence_score() - 0.4).abs() < f64::EPSILON);
        }

        #[tokio::test]
        async fn invalid_email_is_reported() {
            let provider = responding(json!({"email": "sarah-at-email"}));

            let result = extractor(&provider).extract_information("mail me").await;

            assert_eq!(
                result.validation_errors(),
                &["email: must be a valid email".to_string()]
            );
        }
    }

    mod degraded_results {
        use super::*;

        #[tokio::test]
        async fn transport_failure_degrades_to_result() {
            let provider = MockAIProvider::new()
                .with_function_error(MockError::Unavailable { message: "down".into() });

            let result = extractor(&provider).extract_information("text").await;

            assert!(!result.has_data());
            assert_eq!(result.confidence_score(), 0.0);
            assert_eq!(result.validation_errors().len(), 1);
            assert!(result.validation_errors()[0].contains("extraction call failed"));
        }

        #[tokio::test]
        async fn try_extract_surfaces_transport_failure() {
            let provider =
                MockAIProvider::new().with_function_error(MockError::AuthenticationFailed);

            let err = extractor(&provider).try_extract_information("text").await.unwrap_err();

            assert!(err.is_transport());
        }

        #[tokio::test]
        async fn unparsable_arguments_are_malformed() {
            let provider = MockAIProvider::new().with_function_call(FUNCTION, "{not json");

            let result = extractor(&provider).try_extract_information("text").await.unwrap();

            assert!(!result.has_data());
            assert_eq!(result.confidence_score(), 0.0);
            assert!(result.validation_errors()[0].starts_with("malformed extraction response"));
            assert_eq!(result.raw_response(), Some("{not json"));
        }

        #[tokio::test]
        async fn non_object_arguments_are_malformed() {
            let provider = MockAIProvider::new().with_function_call(FUNCTION, "[1, 2]");

            let result = extractor(&provider).extract_information("text").await;

            assert!(result.validation_errors()[0].contains("not a JSON object"));
        }

        #[tokio::test]
        async fn unknown_fields_are_malformed() {
            let provider = responding(json!({"name": "Jo", "ssn": "123-45-6789"}));

            let result = extractor(&provider).extract_information("text").await;

            assert!(!result.has_data());
            assert!(result.validation_errors()[0].contains("ssn"));
        }

        #[tokio::test]
        async fn wrong_function_name_is_malformed() {
            let provider = MockAIProvider::new().with_function_call("get_weather", "{}");

            let result = extractor(&provider).extract_information("text").await;

            assert!(result.validation_errors()[0].contains("get_weather"));
        }
    }

    mod injected_validator {
        use super::*;
        use crate::domain::extraction::ExtractionSchema;
        use crate::ports::SchemaValidationError;

        /// Requires a name on every extraction.
        struct NameRequired;

        impl ExtractionValidator for NameRequired {
            fn validate(&self, data: &Map<String, Value>) -> Result<(), SchemaValidationError> {
                if data.contains_key("name") {
                    Ok(())
                } else {
                    Err(SchemaValidationError::MissingRequired {
                        field: "name".to_string(),
                    })
                }
            }

            fn schema(&self) -> &ExtractionSchema {
                ExtractionSchema::contact_info()
            }
        }

        #[tokio::test]
        async fn uses_the_validator_it_was_given() {
            let provider = responding(json!({"age": 30}));
            let extractor =
                InformationExtractor::new(Arc::new(provider), Arc::new(NameRequired));

            let result = extractor.extract_information("I'm 30").await;

            assert_eq!(result.validation_errors(), &["name: is required".to_string()]);
            assert_eq!(result.get("age"), Some(&json!(30)));
        }
    }

    mod schema {
        use super::*;

        #[tokio::test]
        async fn provider_receives_schema_verbatim() {
            let provider = responding(json!({}));
            let extractor = extractor(&provider);

            extractor.extract_information("Hi, I'm Sam").await;

            let requests = provider.function_requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].function.name, FUNCTION);
            assert_eq!(requests[0].function.parameters, extractor.get_extraction_schema());
            assert_eq!(requests[0].messages[1].content, "Hi, I'm Sam");
        }

        #[test]
        fn schema_declares_all_fields_optional() {
            let provider = MockAIProvider::new();
            let schema = extractor(&provider).get_extraction_schema();

            assert_eq!(schema["required"], json!([]));
            assert_eq!(schema["additionalProperties"], json!(false));
            assert_eq!(schema["properties"].as_object().map(|p| p.len()), Some(5));
        }

        #[test]
        fn validate_extraction_checks_only_present_fields() {
            let provider = MockAIProvider::new();
            let extractor = extractor(&provider);

            let data = json!({"age": 200, "email": null});
            let errors = extractor.validate_extraction(data.as_object().unwrap());

            assert_eq!(errors, vec!["age: must be between 0 and 150, got 200".to_string()]);
        }
    }
}
