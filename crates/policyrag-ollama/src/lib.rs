//! policyrag-ollama
//!
//! HTTP providers for the embedding and language-model capabilities, speaking
//! the Ollama wire protocol, plus the failure translator applied at that
//! boundary and a deterministic hashing embedder for offline runs and tests.

pub mod client;
pub mod failure;
pub mod hashing;
pub mod providers;

pub use client::OllamaClient;
pub use hashing::HashEmbedding;
pub use providers::{
    default_embedding_provider, use_offline_embeddings, OllamaEmbedding, OllamaGenerator,
};
