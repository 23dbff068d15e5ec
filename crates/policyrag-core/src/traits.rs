//! Seams between the pipeline and its external capabilities.

use crate::error::Result;
use crate::types::{IndexedEntry, ScoredChunk};
use async_trait::async_trait;

/// External embedding capability. One provider instance is configured per
/// index lifetime and reused identically at build and query time; mixing
/// providers against one index degrades retrieval and is rejected by the
/// manifest dimension check at load time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `ollama:bge-m3:d1024`).
    fn id(&self) -> &str;
    /// Embedding dimensionality, constant for the provider's lifetime.
    fn dimension(&self) -> usize;
    /// Embed a batch of texts, preserving input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Embed a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

/// External language-model capability. Implementations own the request
/// timeout and surface every transport failure through the `RagError`
/// taxonomy.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Vector index backend. Search is side-effect free and safe for concurrent
/// readers; `upsert` is only ever driven by the index manager.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert entries, replacing any with a matching chunk id.
    async fn upsert(&mut self, entries: Vec<IndexedEntry>) -> Result<()>;
    /// Top-k nearest entries by descending similarity. Ties keep insertion
    /// order; `top_k` beyond the corpus size is capped, not an error.
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;
    /// Flush state to durable storage. A write-through backend may no-op.
    async fn persist(&self) -> Result<()>;
    /// Number of stored entries.
    async fn len(&self) -> Result<usize>;
}
