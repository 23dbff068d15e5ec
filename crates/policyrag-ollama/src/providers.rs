//! Trait implementations backed by the Ollama client.

use std::time::Duration;

use async_trait::async_trait;
use policyrag_core::config::OllamaSettings;
use policyrag_core::error::{RagError, Result};
use policyrag_core::traits::{EmbeddingProvider, LanguageModel};
use tracing::info;

use crate::client::OllamaClient;

/// Embedding capability over `/api/embed`. Requests are split into
/// sub-batches of `batch_size` and processed sequentially so result order
/// always matches input order.
pub struct OllamaEmbedding {
    client: OllamaClient,
    model: String,
    dimension: usize,
    batch_size: usize,
    timeout: Duration,
    id: String,
}

impl OllamaEmbedding {
    pub fn new(
        client: OllamaClient,
        model: &str,
        dimension: usize,
        batch_size: usize,
        timeout: Duration,
    ) -> Self {
        let id = format!("ollama:{model}:d{dimension}");
        Self {
            client,
            model: model.to_string(),
            dimension,
            batch_size: batch_size.max(1),
            timeout,
            id,
        }
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        let client = OllamaClient::new(&settings.base_url)?;
        Ok(Self::new(
            client,
            &settings.embed_model,
            settings.embed_dimension,
            settings.embed_batch_size,
            Duration::from_secs(settings.embed_timeout_secs),
        ))
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<()> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                    provider: self.id.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.client.embed(&self.model, batch, self.timeout).await?;
            self.check_dimensions(&vectors)?;
            out.extend(vectors);
        }
        Ok(out)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .client
            .embed(&self.model, &[text.to_string()], self.timeout)
            .await?;
        self.check_dimensions(&vectors)?;
        vectors.pop().ok_or_else(|| RagError::UnknownServiceFailure {
            detail: "embedding service returned an empty batch".to_string(),
        })
    }
}

/// Language-model capability over `/api/generate`.
pub struct OllamaGenerator {
    client: OllamaClient,
    model: String,
    timeout: Duration,
    id: String,
}

impl OllamaGenerator {
    pub fn new(client: OllamaClient, model: &str, timeout: Duration) -> Self {
        let id = format!("ollama:{model}");
        Self {
            client,
            model: model.to_string(),
            timeout,
            id,
        }
    }

    pub fn from_settings(settings: &OllamaSettings) -> Result<Self> {
        let client = OllamaClient::new(&settings.base_url)?;
        Ok(Self::new(
            client,
            &settings.llm_model,
            Duration::from_secs(settings.generate_timeout_secs),
        ))
    }
}

#[async_trait]
impl LanguageModel for OllamaGenerator {
    fn id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.client.generate(&self.model, prompt, self.timeout).await
    }
}

/// Opt-in switch for the deterministic hashing embedder, for offline runs
/// and CI where no model server is available.
pub fn use_offline_embeddings() -> bool {
    std::env::var("APP_USE_HASH_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the configured embedding provider, honoring the offline switch.
pub fn default_embedding_provider(
    settings: &OllamaSettings,
) -> Result<std::sync::Arc<dyn EmbeddingProvider>> {
    if use_offline_embeddings() {
        info!("using deterministic hash embeddings (offline mode)");
        return Ok(std::sync::Arc::new(crate::hashing::HashEmbedding::new(
            settings.embed_dimension,
        )));
    }
    Ok(std::sync::Arc::new(OllamaEmbedding::from_settings(settings)?))
}
