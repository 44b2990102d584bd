//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait and an OpenAI-compatible
//! implementation (`text-embedding-3-small`, 1536 dimensions). The provider is
//! created via [`create_provider`] from configuration.

pub mod openai;

use crate::error::EndpointError;

/// Number of dimensions in the embedding vectors (text-embedding-3-small).
pub const EMBEDDING_DIM: usize = 1536;

/// Trait for embedding text into vectors.
///
/// All methods are synchronous and block on the network. Callers in async
/// contexts should use `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EndpointError>;

    /// Embed a batch of text strings. Implementations may override for batched requests.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EndpointError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Return the number of dimensions this provider produces.
    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Create an embedding provider from config.
///
/// Currently only `"openai"` is supported.
pub fn create_provider(
    llm: &crate::config::LlmConfig,
    config: &crate::config::EmbeddingConfig,
    api_key: &str,
) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "openai" => {
            let provider =
                openai::OpenAiEmbeddingProvider::new(api_key, &config.model, &llm.base_url)?;
            Ok(Box::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: openai"),
    }
}

/// Euclidean (L2) norm of a vector.
pub fn vector_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_of_known_vector() {
        assert!((vector_norm(&[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(vector_norm(&[]), 0.0);
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let llm = crate::config::LlmConfig::default();
        let config = crate::config::EmbeddingConfig {
            provider: "local".into(),
            model: "x".into(),
        };
        let err = create_provider(&llm, &config, "key").err().unwrap();
        assert!(err.to_string().contains("unknown embedding provider"));
    }
}
