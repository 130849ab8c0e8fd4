//! OpenAI-compatible Provider - Implementation of AIProvider over `/chat/completions`.
//!
//! Works with any endpoint that speaks the OpenAI chat-completions protocol.
//! Defaults target Groq's OpenAI-compatible API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("llama-3.1-8b-instant")
//!     .with_base_url("https://api.groq.com/openai/v1");
//!
//! let provider = OpenAIProvider::new(config)?;
//! ```
//!
//! # Function calling
//!
//! `call_function` sends the function as the only entry in `tools` and forces
//! it through `tool_choice`, then returns the raw argument text of the first
//! tool call.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, FunctionCallRequest,
    FunctionCallResponse, Message, MessageRole, ProviderInfo, TokenUsage,
};

/// Default endpoint (Groq's OpenAI-compatible API).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Configuration for the OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles per retry).
    pub backoff_base: Duration,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            backoff_base: Duration::from_secs(1),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff base delay.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Exposes the API key (for making requests).
    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Delay before retry number `retry_count` (0-based): base, 2x base, 4x base, ...
    fn backoff_delay(&self, retry_count: u32) -> Duration {
        self.backoff_base * (1u32 << retry_count.min(16))
    }
}

/// OpenAI-compatible API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a new provider with the given configuration.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailed` if the API key is blank
    /// - `InvalidRequest` if the HTTP client cannot be built
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        if config.api_key().trim().is_empty() {
            return Err(AIError::AuthenticationFailed);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::InvalidRequest(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Builds the chat completions endpoint URL.
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Converts a completion request to the wire format.
    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        if let Some(ref prompt) = request.system_prompt {
            messages.push(OpenAIMessage::new("system", prompt.clone()));
        }
        messages.extend(request.messages.iter().map(OpenAIMessage::from));

        OpenAIRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: None,
            tool_choice: None,
        }
    }

    /// Converts a function-call request to the wire format.
    fn to_openai_function_request(&self, request: &FunctionCallRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            max_tokens: None,
            temperature: request.temperature,
            tools: Some(vec![request.function.to_openai_format()]),
            tool_choice: Some(json!({
                "type": "function",
                "function": { "name": request.function.name },
            })),
        }
    }

    /// Sends a request body to the completions endpoint.
    async fn send_request(&self, body: &OpenAIRequest) -> Result<Response, AIError> {
        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    /// Parses the API response status and handles errors.
    async fn handle_response_status(&self, response: Response) -> Result<Response, AIError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());
        let error_body = response.text().await.unwrap_or_default();

        match (Self::status_error(status.as_u16(), error_body), retry_after) {
            (AIError::RateLimited { .. }, Some(secs)) => Err(AIError::rate_limited(secs)),
            (err, _) => Err(err),
        }
    }

    /// Maps a non-success HTTP status to an AIError.
    fn status_error(status: u16, error_body: String) -> AIError {
        match status {
            401 | 403 => AIError::AuthenticationFailed,
            429 => AIError::rate_limited(Self::parse_retry_after(&error_body)),
            400 => {
                if error_body.contains("maximum context length")
                    || error_body.contains("context_length_exceeded")
                {
                    AIError::ContextTooLong(error_body)
                } else if error_body.contains("does not support tools")
                    || error_body.contains("tool_use_failed")
                {
                    AIError::InvalidRequest(format!("function call rejected: {}", error_body))
                } else {
                    AIError::InvalidRequest(error_body)
                }
            }
            500..=599 => AIError::unavailable(format!("Server error {}: {}", status, error_body)),
            _ => AIError::network(format!("Unexpected status {}: {}", status, error_body)),
        }
    }

    /// Parses retry-after from an error body, defaulting to 30 seconds.
    fn parse_retry_after(error_body: &str) -> u32 {
        serde_json::from_str::<Value>(error_body)
            .ok()
            .and_then(|parsed| {
                let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
                let idx = message.find("try again in ")?;
                let rest = &message[idx + 13..];
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                digits.parse::<u32>().ok()
            })
            .unwrap_or(30)
    }

    /// Sends with retry and exponential backoff, returning the parsed body.
    async fn execute(&self, body: &OpenAIRequest) -> Result<OpenAIResponse, AIError> {
        let mut retry_count = 0;

        loop {
            let attempt = async {
                let response = self.send_request(body).await?;
                let response = self.handle_response_status(response).await?;
                response
                    .json::<OpenAIResponse>()
                    .await
                    .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))
            }
            .await;

            match attempt {
                Ok(parsed) => return Ok(parsed),
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    let delay = self.retry_delay(&err, retry_count);
                    tracing::warn!(
                        error = %err,
                        retry = retry_count + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying model request"
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Backoff for `retry_count`, stretched to the server's hint on rate limits.
    fn retry_delay(&self, err: &AIError, retry_count: u32) -> Duration {
        let backoff = self.config.backoff_delay(retry_count);
        match err {
            AIError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(u64::from(*retry_after_secs)))
            }
            _ => backoff,
        }
    }

    fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse, AIError> {
        let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let finish_reason = parse_finish_reason(choice.finish_reason.as_deref());
        let content = choice.message.content.unwrap_or_default();
        if finish_reason == FinishReason::ContentFilter && content.trim().is_empty() {
            return Err(AIError::content_filtered("completion blocked by provider content filter"));
        }

        Ok(CompletionResponse {
            content,
            usage,
            model: response.model,
            finish_reason,
        })
    }

    fn into_function_call(response: OpenAIResponse) -> Result<FunctionCallResponse, AIError> {
        let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        let call = choice
            .message
            .tool_calls
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| AIError::parse("Response contains no tool call"))?;

        Ok(FunctionCallResponse {
            function_name: call.function.name,
            arguments: call.function.arguments,
            usage,
            model: response.model,
        })
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        tracing::debug!(
            model = %self.config.model,
            conversation_id = %request.metadata.conversation_id,
            trace_id = %request.metadata.trace_id,
            messages = request.messages.len(),
            "Requesting completion"
        );

        let body = self.to_openai_request(&request);
        let response = self.execute(&body).await?;
        Self::into_completion(response)
    }

    async fn call_function(
        &self,
        request: FunctionCallRequest,
    ) -> Result<FunctionCallResponse, AIError> {
        tracing::debug!(
            model = %self.config.model,
            function = %request.function.name,
            conversation_id = %request.metadata.conversation_id,
            trace_id = %request.metadata.trace_id,
            "Requesting function call"
        );

        let body = self.to_openai_function_request(&request);
        let response = self.execute(&body).await?;
        Self::into_function_call(response)
    }

    fn provider_info(&self) -> ProviderInfo {
        let name = if self.config.base_url.contains("groq.com") {
            "groq"
        } else {
            "openai"
        };
        ProviderInfo::new(name, &self.config.model).with_functions(true)
    }
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl OpenAIMessage {
    fn new(role: &'static str, content: String) -> Self {
        Self { role, content }
    }
}

impl From<&Message> for OpenAIMessage {
    fn from(message: &Message) -> Self {
        let role = match message.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        Self::new(role, message.content.clone())
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIToolCall {
    function: OpenAIFunctionCall,
}

#[derive(Debug, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<OpenAIUsage> for TokenUsage {
    fn from(usage: OpenAIUsage) -> Self {
        TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
    }
}
