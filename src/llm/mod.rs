//! Chat-completion endpoint.
//!
//! Provides the [`CompletionClient`] trait and an OpenAI-compatible HTTP
//! implementation. Clients are constructed once at startup and passed to the
//! components that need them.

pub mod openai;

use serde::{Deserialize, Serialize};

use crate::error::EndpointError;

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Text in, text out.
///
/// All methods block the caller until the endpoint answers. Callers in async
/// contexts should use `tokio::task::spawn_blocking`.
pub trait CompletionClient: Send + Sync {
    /// Send the messages and return the first choice's content, trimmed.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, EndpointError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// Create the completion client from config.
pub fn create_client(
    config: &crate::config::LlmConfig,
    api_key: &str,
) -> anyhow::Result<openai::OpenAiCompletionClient> {
    openai::OpenAiCompletionClient::new(api_key, &config.chat_model, &config.base_url)
}
