//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing tests to run without calling real AI APIs.
//!
//! # Features
//!
//! - Pre-configured completions and function-call results
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("Alice asked about her order.")
//!     .with_function_call("extract_contact_information", r#"{"name":"Alice"}"#);
//!
//! let summary = provider.complete(request).await?;
//! assert_eq!(summary.content, "Alice asked about her order.");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, FunctionCallRequest,
    FunctionCallResponse, ProviderInfo, TokenUsage,
};

/// Mock AI provider for testing.
///
/// Completions and function calls are served from separate queues so a test
/// can script summarization and extraction independently.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Queued results for `complete` (consumed in order).
    completions: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Queued results for `call_function` (consumed in order).
    function_calls: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Completion { content: String, usage: TokenUsage },
    /// Return a function call with raw argument text.
    FunctionCall { name: String, arguments: String },
    /// Return an error.
    Error(MockError),
}

/// A request observed by the mock.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    Completion(CompletionRequest),
    FunctionCall(FunctionCallRequest),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate context too long.
    ContextTooLong { message: String },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContextTooLong { message } => AIError::ContextTooLong(message),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            completions: Arc::new(Mutex::new(VecDeque::new())),
            function_calls: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1").with_functions(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a successful completion.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        locked(&self.completions).push_back(MockResponse::Completion {
            content: content.into(),
            usage: TokenUsage::new(10, 20),
        });
        self
    }

    /// Queues a completion failure.
    pub fn with_error(self, error: MockError) -> Self {
        locked(&self.completions).push_back(MockResponse::Error(error));
        self
    }

    /// Queues a function call with raw argument text.
    pub fn with_function_call(self, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        locked(&self.function_calls).push_back(MockResponse::FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        });
        self
    }

    /// Queues a function-call failure.
    pub fn with_function_error(self, error: MockError) -> Self {
        locked(&self.function_calls).push_back(MockResponse::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<RecordedCall> {
        locked(&self.calls).clone()
    }

    /// Returns the recorded completion requests.
    pub fn completion_requests(&self) -> Vec<CompletionRequest> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Completion(request) => Some(request.clone()),
                RecordedCall::FunctionCall(_) => None,
            })
            .collect()
    }

    /// Returns the recorded function-call requests.
    pub fn function_requests(&self) -> Vec<FunctionCallRequest> {
        locked(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RecordedCall::FunctionCall(request) => Some(request.clone()),
                RecordedCall::Completion(_) => None,
            })
            .collect()
    }

    /// Clears the call history.
    pub fn clear_calls(&self) {
        locked(&self.calls).clear();
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        locked(&self.calls).push(RecordedCall::Completion(request));
        self.simulate_latency().await;

        let next = locked(&self.completions).pop_front();
        match next {
            Some(MockResponse::Completion { content, usage }) => Ok(CompletionResponse {
                content,
                usage,
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            Some(MockResponse::Error(err)) => Err(err.into()),
            Some(MockResponse::FunctionCall { name, .. }) => Err(AIError::InvalidRequest(
                format!("mock queued a function call ({name}) for a completion"),
            )),
            None => Ok(CompletionResponse {
                content: "Mock response".to_string(),
                usage: TokenUsage::new(5, 10),
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
        }
    }

    async fn call_function(
        &self,
        request: FunctionCallRequest,
    ) -> Result<FunctionCallResponse, AIError> {
        let default_name = request.function.name.clone();
        locked(&self.calls).push(RecordedCall::FunctionCall(request));
        self.simulate_latency().await;

        if !self.info.supports_functions {
            return Err(AIError::FunctionsUnsupported {
                model: self.info.model.clone(),
            });
        }

        let next = locked(&self.function_calls).pop_front();
        match next {
            Some(MockResponse::FunctionCall { name, arguments }) => Ok(FunctionCallResponse {
                function_name: name,
                arguments,
                usage: TokenUsage::new(20, 15),
                model: self.info.model.clone(),
            }),
            Some(MockResponse::Error(err)) => Err(err.into()),
            Some(MockResponse::Completion { .. }) => Err(AIError::InvalidRequest(
                "mock queued a completion for a function call".to_string(),
            )),
            None => Ok(FunctionCallResponse {
                function_name: default_name,
                arguments: "{}".to_string(),
                usage: TokenUsage::zero(),
                model: self.info.model.clone(),
            }),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ConversationId;
    use crate::ports::{FunctionDefinition, MessageRole, RequestMetadata};
    use serde_json::json;

    fn test_metadata() -> RequestMetadata {
        RequestMetadata::new(ConversationId::new(), "trace-123")
    }

    fn test_request() -> CompletionRequest {
        CompletionRequest::new(test_metadata()).with_message(MessageRole::User, "Hello")
    }

    fn function_request() -> FunctionCallRequest {
        FunctionCallRequest::new(
            FunctionDefinition::new("extract", "Extract", json!({"type": "object"})),
            test_metadata(),
        )
        .with_message(MessageRole::User, "I'm Bob")
    }

    mod completions {
        use super::*;

        #[tokio::test]
        async fn returns_configured_response() {
            let provider = MockAIProvider::new().with_response("Hello from mock!");

            let response = provider.complete(test_request()).await.unwrap();

            assert_eq!(response.content, "Hello from mock!");
            assert_eq!(response.model, "mock-model-1");
            assert_eq!(response.finish_reason, FinishReason::Stop);
        }

        #[tokio::test]
        async fn returns_responses_in_order() {
            let provider = MockAIProvider::new().with_response("First").with_response("Second");

            let r1 = provider.complete(test_request()).await.unwrap();
            let r2 = provider.complete(test_request()).await.unwrap();

            assert_eq!(r1.content, "First");
            assert_eq!(r2.content, "Second");
        }

        #[tokio::test]
        async fn returns_default_after_exhausted() {
            let provider = MockAIProvider::new().with_response("Only one");

            provider.complete(test_request()).await.unwrap();
            let r2 = provider.complete(test_request()).await.unwrap();

            assert_eq!(r2.content, "Mock response");
        }

        #[tokio::test]
        async fn returns_configured_error() {
            let provider =
                MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });

            let err = provider.complete(test_request()).await.unwrap_err();

            assert!(err.is_retryable());
            assert_eq!(err, AIError::RateLimited { retry_after_secs: 30 });
        }
    }

    mod function_calls {
        use super::*;

        #[tokio::test]
        async fn returns_configured_arguments() {
            let provider =
                MockAIProvider::new().with_function_call("extract", r#"{"name":"Bob"}"#);

            let response = provider.call_function(function_request()).await.unwrap();

            assert_eq!(response.function_name, "extract");
            assert_eq!(response.arguments, r#"{"name":"Bob"}"#);
        }

        #[tokio::test]
        async fn defaults_to_empty_object_for_requested_function() {
            let provider = MockAIProvider::new();

            let response = provider.call_function(function_request()).await.unwrap();

            assert_eq!(response.function_name, "extract");
            assert_eq!(response.arguments, "{}");
        }

        #[tokio::test]
        async fn queues_are_independent() {
            let provider = MockAIProvider::new()
                .with_response("summary")
                .with_function_call("extract", "{}");

            provider.call_function(function_request()).await.unwrap();
            let completion = provider.complete(test_request()).await.unwrap();

            assert_eq!(completion.content, "summary");
        }

        #[tokio::test]
        async fn returns_configured_error() {
            let provider = MockAIProvider::new()
                .with_function_error(MockError::Unavailable { message: "down".into() });

            let err = provider.call_function(function_request()).await.unwrap_err();
            assert!(matches!(err, AIError::Unavailable { .. }));
        }

        #[tokio::test]
        async fn rejects_when_functions_unsupported() {
            let provider = MockAIProvider::new()
                .with_provider_info(ProviderInfo::new("plain", "plain-1").with_functions(false));

            let err = provider.call_function(function_request()).await.unwrap_err();
            assert_eq!(err, AIError::FunctionsUnsupported { model: "plain-1".into() });
        }
    }

    #[tokio::test]
    async fn tracks_calls_by_kind() {
        let provider = MockAIProvider::new();

        provider.complete(test_request()).await.unwrap();
        provider.call_function(function_request()).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.completion_requests().len(), 1);
        let functions = provider.function_requests();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].messages[0].content, "I'm Bob");

        provider.clear_calls();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn respects_delay() {
        let provider = MockAIProvider::new()
            .with_response("Delayed response")
            .with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.complete(test_request()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::ContextTooLong { message: "big".into() }.into();
        assert_eq!(err, AIError::ContextTooLong("big".into()));

        let err: AIError = MockError::AuthenticationFailed.into();
        assert_eq!(err, AIError::AuthenticationFailed);

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert_eq!(err, AIError::Timeout { timeout_secs: 30 });
    }
}
