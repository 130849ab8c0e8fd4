//! Integration tests for conversation context and extraction.
//!
//! Drives the public API end to end with the mock provider:
//! 1. A conversation grows until the summarization trigger fires
//! 2. Older history is replaced by the summary and recent messages survive
//! 3. Contact details are extracted from the same chat text

use std::sync::Arc;

use serde_json::json;

use conversation_context::adapters::ai::{MockAIProvider, MockError};
use conversation_context::adapters::JsonSchemaValidator;
use conversation_context::application::{ConversationContextManager, InformationExtractor};
use conversation_context::domain::conversation::{Role, SummarizationPolicy, TruncationPolicy};
use conversation_context::ports::MessageRole;

// =============================================================================
// Test Infrastructure
// =============================================================================

async fn chat(manager: &mut ConversationContextManager, from: usize, turns: usize) {
    for i in from..from + turns {
        manager
            .add_user_message(format!("user says {}", i))
            .await
            .expect("user message should be accepted");
        manager
            .add_assistant_message(format!("assistant replies {}", i))
            .await
            .expect("assistant message should be accepted");
    }
}

fn contact_extractor(provider: MockAIProvider) -> InformationExtractor {
    InformationExtractor::new(Arc::new(provider), Arc::new(JsonSchemaValidator::new()))
}

// =============================================================================
// Conversation Context
// =============================================================================

#[tokio::test]
async fn summarizes_after_threshold_and_keeps_recent_messages() {
    let provider = MockAIProvider::new().with_response("User chatted about the weather.");
    let policy = SummarizationPolicy::new(3).with_keep_recent_messages(2);
    let mut manager = ConversationContextManager::new(Arc::new(provider.clone()), policy);

    chat(&mut manager, 0, 2).await;
    assert!(manager.history().summary().is_none());
    assert_eq!(manager.conversation_history().len(), 4);

    chat(&mut manager, 2, 1).await;

    assert_eq!(
        manager.history().summary(),
        Some("User chatted about the weather.")
    );
    assert_eq!(provider.completion_requests().len(), 1);

    let context = manager.get_context(None);
    assert_eq!(context.len(), 3);
    assert_eq!(context[0].role(), Role::System);
    assert!(context[0].content().contains("User chatted about the weather."));
    assert_eq!(context[1].content(), "user says 2");
    assert_eq!(context[2].content(), "assistant replies 2");

    let stats = manager.stats();
    assert_eq!(stats.total_turns, 3);
    assert!(stats.has_summary);
    assert!(!stats.should_summarize);
}

#[tokio::test]
async fn summary_request_carries_transcript() {
    let provider = MockAIProvider::new().with_response("summary");
    let mut manager =
        ConversationContextManager::new(Arc::new(provider.clone()), SummarizationPolicy::new(1));

    manager.add_user_message("My name is Sarah").await.unwrap();
    manager.add_assistant_message("Hello Sarah").await.unwrap();

    let requests = provider.completion_requests();
    assert_eq!(requests.len(), 1);
    let transcript = &requests[0].messages[0];
    assert_eq!(transcript.role, MessageRole::User);
    assert!(transcript.content.contains("User: My name is Sarah"));
    assert!(transcript.content.contains("Assistant: Hello Sarah"));
}

#[tokio::test]
async fn rendered_context_respects_truncation() {
    let provider = MockAIProvider::new();
    let policy = SummarizationPolicy::new(0);
    let mut manager = ConversationContextManager::new(Arc::new(provider), policy);

    chat(&mut manager, 0, 4).await;

    let rendered = manager.render_for_model(Some(TruncationPolicy::by_turns(1)));
    assert_eq!(rendered.len(), 2);
    assert_eq!(rendered[0].role, MessageRole::User);
    assert_eq!(rendered[0].content, "user says 3");
    assert_eq!(manager.conversation_history().len(), 8);
}

#[tokio::test]
async fn rendered_context_keeps_message_awaiting_reply() {
    let mut manager =
        ConversationContextManager::new(Arc::new(MockAIProvider::new()), SummarizationPolicy::new(0));

    chat(&mut manager, 0, 3).await;
    manager.add_user_message("are you there?").await.unwrap();

    let rendered = manager.render_for_model(Some(TruncationPolicy::by_turns(1)));
    let contents: Vec<&str> = rendered.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["user says 2", "assistant replies 2", "are you there?"]);
}

#[tokio::test]
async fn invalid_role_is_rejected_without_side_effects() {
    let mut manager =
        ConversationContextManager::new(Arc::new(MockAIProvider::new()), SummarizationPolicy::default());

    let result = manager
        .add_message_str("moderator", "hello", Default::default())
        .await;

    assert!(result.is_err());
    assert!(manager.conversation_history().is_empty());
}

// =============================================================================
// Information Extraction
// =============================================================================

#[tokio::test]
async fn extracts_contact_details_from_chat() {
    let provider = MockAIProvider::new().with_function_call(
        "extract_contact_information",
        json!({
            "name": "Sarah Johnson",
            "email": "sarah@email.com",
            "phone": "+1-555-0123",
            "location": "New York City",
            "age": 28
        })
        .to_string(),
    );
    let extractor = contact_extractor(provider);

    let result = extractor
        .extract_information(
            "I'm Sarah Johnson from New York City, 28, sarah@email.com, +1-555-0123",
        )
        .await;

    assert!(result.is_valid());
    assert_eq!(result.confidence_score(), 1.0);
    assert_eq!(result.extracted_fields().len(), 5);
}

#[tokio::test]
async fn extraction_survives_provider_outage() {
    let provider = MockAIProvider::new().with_function_error(
        MockError::Network {
            message: "connection reset".to_string(),
        },
    );
    let extractor = contact_extractor(provider);

    let result = extractor.extract_information("anything").await;

    assert!(!result.has_data());
    assert_eq!(result.confidence_score(), 0.0);
    assert_eq!(result.validation_errors().len(), 1);
}
