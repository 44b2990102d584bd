//! OpenAI-compatible `/v1/chat/completions` client over blocking HTTP.

use anyhow::Context;
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;

use super::{ChatMessage, CompletionClient};
use crate::error::EndpointError;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

pub struct OpenAiCompletionClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiCompletionClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl CompletionClient for OpenAiCompletionClient {
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, EndpointError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;
        if !status.is_success() {
            return Err(EndpointError::from_status(status.as_u16(), text));
        }

        parse_chat_response(&text)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull `choices[0].message.content` out of a response body.
fn parse_chat_response(body: &str) -> Result<String, EndpointError> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| EndpointError::MalformedResponse(format!("invalid JSON: {e}")))?;

    json["choices"]
        .as_array()
        .and_then(|choices| choices.first())
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(|content| content.trim().to_string())
        .ok_or_else(|| EndpointError::MalformedResponse(format!("no message content in {json}")))
}
