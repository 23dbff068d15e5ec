//! Top-K retrieval over the vector store.

use std::sync::Arc;

use tracing::debug;

use policyrag_core::error::Result;
use policyrag_core::traits::{EmbeddingProvider, VectorStore};
use policyrag_core::types::ScoredChunk;

/// Embeds the query with the same provider the index was built with, asks
/// the store for the top-k entries, then drops everything below the
/// similarity cutoff. An empty result set means "no relevant context" and is
/// never an error.
pub struct Retriever {
    store: Box<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    similarity_cutoff: Option<f32>,
}

impl Retriever {
    pub fn new(
        store: Box<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        similarity_cutoff: Option<f32>,
    ) -> Self {
        Self {
            store,
            embedder,
            top_k: top_k.max(1),
            similarity_cutoff,
        }
    }

    pub async fn retrieve(&self, query_text: &str) -> Result<Vec<ScoredChunk>> {
        let query_vector = self.embedder.embed_query(query_text).await?;
        let hits = self.store.search(&query_vector, self.top_k).await?;
        let kept = match self.similarity_cutoff {
            Some(cutoff) => {
                let before = hits.len();
                let mut kept: Vec<ScoredChunk> =
                    hits.into_iter().filter(|h| h.score >= cutoff).collect();
                for (rank, hit) in kept.iter_mut().enumerate() {
                    hit.rank = rank;
                }
                if kept.len() < before {
                    debug!(
                        dropped = before - kept.len(),
                        cutoff = %cutoff,
                        "similarity cutoff removed results"
                    );
                }
                kept
            }
            None => hits,
        };
        Ok(kept)
    }
}
