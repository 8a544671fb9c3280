pub mod ollama;

use serde::{Deserialize, Serialize};

pub use ollama::{OllamaBackend, OllamaConfig};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// A conversational completion service.
///
/// Every call carries the full conversation; implementations keep no history of their own.
pub trait ChatBackend {
    fn name(&self) -> &str;

    /// Sends `messages` and returns the assistant reply.
    fn chat(&self, messages: &[ChatMessage], temperature: f32) -> anyhow::Result<String>;

    /// Stops the backend process, if this backend knows how.
    fn shutdown(&self) -> anyhow::Result<()>;
}

#[cfg(test)]
pub(crate) mod mock;
