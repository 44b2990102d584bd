//! The critique step: one completion call per pass.

use std::sync::Arc;

use crate::error::EndpointError;
use crate::llm::{ChatMessage, CompletionClient};

/// Instructions sent as the system message on every critique call.
pub const CRITIQUE_TEMPLATE: &str = "\
You are an expert prompt engineer reviewing a prompt written by a user.
Respond using exactly these sections, in this order:

Clarity rating: <a single integer from 1 to 10>
Specific issues:
1. <issue>
2. <issue>
3. <issue>
Suggestions:
1. <suggestion>
2. <suggestion>
3. <suggestion>
Rewritten prompt:
<one fully rewritten prompt that fixes the issues>

List exactly three issues and exactly three suggestions. Do not add any other sections.";

/// Sends a prompt for review and returns the raw critique text.
#[derive(Clone)]
pub struct Critic {
    client: Arc<dyn CompletionClient>,
    template: String,
}

impl Critic {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            template: CRITIQUE_TEMPLATE.to_string(),
        }
    }

    /// Replace the built-in instructions.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Review `prompt`, with `memory_context` prepended verbatim to the user message.
    ///
    /// Endpoint errors are returned as-is; nothing is retried.
    pub fn critique(&self, prompt: &str, memory_context: &str) -> Result<String, EndpointError> {
        let messages = [
            ChatMessage::system(self.template.as_str()),
            ChatMessage::user(format!("{memory_context}{prompt}")),
        ];
        let reply = self.client.complete(&messages)?;
        Ok(reply.trim().to_string())
    }
}
