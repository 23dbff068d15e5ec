//! Deterministic token-hash embeddings.
//!
//! A normalized bag-of-words vector: each token hashes into one of `dim`
//! buckets, accumulated counts are L2-normalized. Not semantically
//! meaningful, but deterministic and dimension-stable, which is what offline
//! runs and tests need. Tokens are lowercased and stripped of punctuation so
//! "NLP?" and "(NLP)" land in the same bucket.

use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use policyrag_core::error::Result;
use policyrag_core::traits::EmbeddingProvider;
use twox_hash::XxHash64;

pub struct HashEmbedding {
    dimension: usize,
    id: String,
}

impl HashEmbedding {
    pub fn new(dimension: usize) -> Self {
        let id = format!("hash:d{dimension}");
        Self { dimension, id }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let normalized: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if normalized.is_empty() {
                continue;
            }
            let mut hasher = XxHash64::with_seed(0);
            normalized.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dimension;
            let jitter = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += 1.0 + jitter * 0.01;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedding {
    fn id(&self) -> &str {
        &self.id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vectors_are_deterministic_and_unit_length() {
        let embedder = HashEmbedding::new(256);
        let a = embedder.embed_query("credit policy thresholds").await.unwrap();
        let b = embedder.embed_query("credit policy thresholds").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn punctuation_and_case_do_not_change_the_vector() {
        let embedder = HashEmbedding::new(128);
        let a = embedder.embed_query("What is NLP?").await.unwrap();
        let b = embedder.embed_query("what is (nlp)").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher_than_disjoint() {
        let embedder = HashEmbedding::new(256);
        let query = embedder.embed_query("underwriting checklist").await.unwrap();
        let close = embedder
            .embed_query("the underwriting checklist has five steps")
            .await
            .unwrap();
        let far = embedder
            .embed_query("completely unrelated gardening notes")
            .await
            .unwrap();
        let dot = |x: &[f32], y: &[f32]| -> f32 { x.iter().zip(y).map(|(a, b)| a * b).sum() };
        assert!(dot(&query, &close) > dot(&query, &far));
    }
}
