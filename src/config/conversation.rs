//! Conversation context configuration

use serde::Deserialize;

use crate::domain::conversation::{
    SummarizationPolicy, DEFAULT_KEEP_RECENT_MESSAGES, DEFAULT_SUMMARIZATION_THRESHOLD,
};

/// Summarization settings applied to new context managers
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Completed turns between summaries (0 disables the trigger)
    #[serde(default = "default_threshold")]
    pub summarization_threshold: u32,

    /// Most recent messages kept verbatim after a summary
    #[serde(default = "default_keep_recent")]
    pub keep_recent_messages: usize,

    /// Summarize inside `add_message` when the trigger fires
    #[serde(default = "default_auto_summarize")]
    pub auto_summarize: bool,
}

impl ConversationConfig {
    pub fn summarization_policy(&self) -> SummarizationPolicy {
        SummarizationPolicy::from(self)
    }
}

impl From<&ConversationConfig> for SummarizationPolicy {
    fn from(config: &ConversationConfig) -> Self {
        SummarizationPolicy::new(config.summarization_threshold)
            .with_keep_recent_messages(config.keep_recent_messages)
            .with_auto_summarize(config.auto_summarize)
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            summarization_threshold: default_threshold(),
            keep_recent_messages: default_keep_recent(),
            auto_summarize: default_auto_summarize(),
        }
    }
}

fn default_threshold() -> u32 {
    DEFAULT_SUMMARIZATION_THRESHOLD
}

fn default_keep_recent() -> usize {
    DEFAULT_KEEP_RECENT_MESSAGES
}

fn default_auto_summarize() -> bool {
    true
}
