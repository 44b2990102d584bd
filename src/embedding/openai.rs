//! OpenAI-compatible `/v1/embeddings` provider over blocking HTTP.

use anyhow::Context;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::EndpointError;

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

pub struct OpenAiEmbeddingProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiEmbeddingProvider {
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

impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EndpointError> {
        self.embed_batch(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| EndpointError::MalformedResponse("empty embedding data".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EndpointError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

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

        let vectors = parse_embedding_response(&text)?;
        if vectors.len() != texts.len() {
            return Err(EndpointError::MalformedResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }

        tracing::debug!(
            model = %self.model,
            count = vectors.len(),
            dims = vectors.first().map(Vec::len).unwrap_or(0),
            "embeddings received"
        );
        Ok(vectors)
    }
}

/// Decode `data[*].embedding`, ordered by `index` when the endpoint reports it.
fn parse_embedding_response(body: &str) -> Result<Vec<Vec<f32>>, EndpointError> {
    let mut parsed: EmbeddingResponse = serde_json::from_str(body)
        .map_err(|e| EndpointError::MalformedResponse(format!("invalid embedding body: {e}")))?;

    if parsed.data.iter().all(|d| d.index.is_some()) {
        parsed.data.sort_by_key(|d| d.index);
    }
    Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
}
