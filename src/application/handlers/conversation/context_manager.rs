//! ConversationContextManager - bounded conversation context with summarization.
//!
//! Stores messages, counts turns, and condenses older history through the
//! model collaborator once every `threshold` completed turns.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::conversation::{
    ConversationError, ConversationHistory, Message, Metadata, Role, SummarizationPolicy,
    SummaryPrompt, TruncationPolicy,
};
use crate::domain::foundation::{ConversationId, MessageId, Timestamp};
use crate::ports::{self, AIProvider, CompletionRequest, MessageRole, RequestMetadata};

/// Temperature used for summaries; low for consistent output.
const SUMMARY_TEMPERATURE: f32 = 0.1;

/// Upper bound on generated summary length.
const SUMMARY_MAX_TOKENS: u32 = 500;

/// Outcome of adding a message.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageAdded {
    /// ID of the stored message.
    pub message_id: MessageId,
    /// The message completed a user→assistant turn.
    pub turn_completed: bool,
    /// Automatic summarization ran and replaced older history.
    pub summarized: bool,
    /// Automatic summarization was due but failed; history kept as is.
    pub summarization_error: Option<ConversationError>,
}

/// Snapshot of the manager's counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationStats {
    pub message_count: usize,
    pub total_turns: u32,
    pub has_summary: bool,
    pub should_summarize: bool,
    pub summarization_threshold: u32,
    pub last_summarized_at: Option<Timestamp>,
}

/// Public orchestrator for one conversation's context.
///
/// Mutating operations take `&mut self`; wrap the manager in a lock to share
/// it between tasks.
pub struct ConversationContextManager {
    id: ConversationId,
    provider: Arc<dyn AIProvider>,
    policy: SummarizationPolicy,
    history: ConversationHistory,
}

impl ConversationContextManager {
    /// Creates a manager with an empty history.
    pub fn new(provider: Arc<dyn AIProvider>, policy: SummarizationPolicy) -> Self {
        Self {
            id: ConversationId::new(),
            provider,
            policy,
            history: ConversationHistory::new(),
        }
    }

    /// Uses a caller-chosen conversation id (carried in request metadata).
    pub fn with_id(mut self, id: ConversationId) -> Self {
        self.id = id;
        self
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn policy(&self) -> &SummarizationPolicy {
        &self.policy
    }

    /// Appends a message and, when due, summarizes older history.
    ///
    /// # Errors
    ///
    /// - `EmptyContent` if content is blank; history is left untouched
    ///
    /// A failed automatic summarization does not fail the call: the message
    /// stays appended and the error is reported in [`MessageAdded`].
    pub async fn add_message(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Result<MessageAdded, ConversationError> {
        let message =
            Message::with_metadata(role, content, metadata, self.history.next_timestamp())?;
        let message_id = *message.id();
        let turn_completed = self.history.append(message);

        debug!(
            conversation_id = %self.id,
            message_id = %message_id,
            role = %role,
            total_turns = self.history.total_turns(),
            "Message added"
        );

        let mut outcome = MessageAdded {
            message_id,
            turn_completed,
            summarized: false,
            summarization_error: None,
        };

        if self.policy.auto_summarize && self.should_summarize() {
            match self.summarize_and_replace().await {
                Ok(_) => outcome.summarized = true,
                Err(err) => {
                    warn!(
                        conversation_id = %self.id,
                        total_turns = self.history.total_turns(),
                        error = %err,
                        "Automatic summarization failed; keeping full history"
                    );
                    outcome.summarization_error = Some(err);
                }
            }
        }

        Ok(outcome)
    }

    /// Like [`add_message`](Self::add_message), with the role given by name.
    ///
    /// # Errors
    ///
    /// - `InvalidRole` if `role` is not `user`, `assistant` or `system`
    /// - `EmptyContent` if content is blank
    pub async fn add_message_str(
        &mut self,
        role: &str,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> Result<MessageAdded, ConversationError> {
        let role = Role::from_str(role)?;
        self.add_message(role, content, metadata).await
    }

    pub async fn add_user_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<MessageAdded, ConversationError> {
        self.add_message(Role::User, content, Metadata::new()).await
    }

    pub async fn add_assistant_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<MessageAdded, ConversationError> {
        self.add_message(Role::Assistant, content, Metadata::new()).await
    }

    pub async fn add_system_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<MessageAdded, ConversationError> {
        self.add_message(Role::System, content, Metadata::new()).await
    }

    /// Messages to present to a model.
    ///
    /// A stored summary comes first as a system message tagged
    /// `kind = "summary"`. `truncation` applies to stored messages only.
    pub fn get_context(&self, truncation: Option<TruncationPolicy>) -> Vec<Message> {
        let stored = self.history.messages();
        let kept = match truncation {
            Some(policy) => policy.apply(stored),
            None => stored,
        };

        let mut context = Vec::with_capacity(kept.len() + 1);
        context.extend(self.summary_message());
        context.extend_from_slice(kept);
        context
    }

    /// [`get_context`](Self::get_context) in provider message format.
    pub fn render_for_model(&self, truncation: Option<TruncationPolicy>) -> Vec<ports::Message> {
        self.get_context(truncation)
            .iter()
            .map(ports::Message::from)
            .collect()
    }

    /// True when the turn count has reached a new multiple of the threshold.
    pub fn should_summarize(&self) -> bool {
        self.policy.trigger.should_summarize(&self.history)
    }

    /// Summarizes now, regardless of the trigger.
    ///
    /// # Errors
    ///
    /// - `SummarizationFailed` if nothing is new since the last summary, the
    ///   provider fails, or it returns empty text; history is left untouched
    pub async fn force_summarize(&mut self) -> Result<String, ConversationError> {
        self.summarize_and_replace().await
    }

    /// Clears messages, summary and counters.
    pub fn reset_history(&mut self) {
        self.history.reset();
        info!(conversation_id = %self.id, "Conversation history reset");
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Stored messages in conversation order.
    pub fn conversation_history(&self) -> &[Message] {
        self.history.messages()
    }

    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            message_count: self.history.len(),
            total_turns: self.history.total_turns(),
            has_summary: self.history.summary().is_some(),
            should_summarize: self.should_summarize(),
            summarization_threshold: self.policy.trigger.threshold(),
            last_summarized_at: self.history.last_summarized_at().copied(),
        }
    }

    fn summary_message(&self) -> Option<Message> {
        let summary = self.history.summary()?;
        // Never later than the stored messages it precedes.
        let at = self
            .history
            .messages()
            .first()
            .map(|m| *m.timestamp())
            .or_else(|| self.history.last_summarized_at().copied())
            .unwrap_or_else(Timestamp::now);

        let mut metadata = Metadata::new();
        metadata.insert("kind".to_string(), json!("summary"));

        Message::with_metadata(
            Role::System,
            format!("Summary of the earlier conversation: {}", summary),
            metadata,
            at,
        )
        .ok()
    }

    async fn summarize_and_replace(&mut self) -> Result<String, ConversationError> {
        let prompt = SummaryPrompt::from_history(&self.history)
            .ok_or_else(|| ConversationError::summarization_failed("nothing to summarize"))?;
        let covered = self.history.unsummarized_messages().len();

        let request = CompletionRequest::new(RequestMetadata::for_conversation(self.id))
            .with_system_prompt(prompt.instruction)
            .with_message(MessageRole::User, prompt.transcript)
            .with_temperature(SUMMARY_TEMPERATURE)
            .with_max_tokens(SUMMARY_MAX_TOKENS);

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| ConversationError::summarization_failed(e.to_string()))?;

        let summary = response.content.trim().to_string();
        if summary.is_empty() {
            return Err(ConversationError::summarization_failed(
                "provider returned an empty summary",
            ));
        }

        self.history.apply_summary(
            summary.clone(),
            Timestamp::now(),
            self.policy.keep_recent_messages,
        );

        info!(
            conversation_id = %self.id,
            total_turns = self.history.total_turns(),
            summarized_messages = covered,
            retained_messages = self.history.len(),
            "Conversation summarized"
        );

        Ok(summary)
    }
}
