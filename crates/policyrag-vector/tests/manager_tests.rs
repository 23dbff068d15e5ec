use std::fs;
use std::path::Path;
use std::sync::Arc;

use policyrag_core::chunker::ChunkPolicy;
use policyrag_core::config::VectorBackend;
use policyrag_core::error::RagError;
use policyrag_core::traits::{EmbeddingProvider, VectorStore};
use policyrag_ollama::HashEmbedding;
use policyrag_vector::{IndexConfig, IndexManager};
use tempfile::TempDir;

const AI_OVERVIEW: &str = "\
Artificial Intelligence and Machine Learning\n\n\
Artificial Intelligence (AI) is a branch of computer science that aims to create \
intelligent machines that can simulate human thinking capability and behavior.\n\
Machine Learning (ML) is a subset of AI that enables systems to learn and improve \
from experience without being explicitly programmed.\n\
Deep Learning uses neural networks with multiple layers to progressively extract \
higher-level features from raw input.\n\
Applications include healthcare diagnosis, fraud detection, autonomous vehicles, \
recommendation systems and virtual assistants.\n";

const NLP_BASICS: &str = "\
Natural Language Processing\n\n\
Natural Language Processing (NLP) is a branch of artificial intelligence, and NLP \
helps computers understand, interpret and manipulate human language.\n\
NLP draws from computational linguistics; NLP fills the gap between human \
communication and computer understanding.\n\
Key NLP tasks include text classification, and NLP also covers named entity \
recognition, sentiment analysis and machine translation.\n\
Modern NLP heavily relies on transformer models, and NLP benchmarks show strong \
performance across many NLP tasks.\n";

fn write_sample_documents(dir: &Path) {
    fs::write(dir.join("ai_overview.txt"), AI_OVERVIEW).unwrap();
    fs::write(dir.join("nlp_basics.txt"), NLP_BASICS).unwrap();
}

fn manager(index_dir: &Path, dimension: usize, policy: ChunkPolicy) -> IndexManager {
    IndexManager::new(
        IndexConfig {
            backend: VectorBackend::Flat,
            dir: index_dir.to_path_buf(),
            collection: "credit_policies".to_string(),
            embed_batch_size: 8,
        },
        policy,
        Arc::new(HashEmbedding::new(dimension)),
    )
}

#[tokio::test]
async fn empty_directory_builds_nothing() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let handle = mgr.build(docs.path(), true, false).await.unwrap();
    assert!(handle.is_none());
}

#[tokio::test]
async fn missing_directory_builds_nothing() {
    let index = TempDir::new().unwrap();
    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let handle = mgr
        .build(Path::new("/nonexistent/documents"), true, false)
        .await
        .unwrap();
    assert!(handle.is_none());
}

#[tokio::test]
async fn nlp_query_retrieves_only_the_nlp_document() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_sample_documents(docs.path());

    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let handle = mgr.build(docs.path(), true, false).await.unwrap().unwrap();

    let query = mgr.embedder().embed_query("What is NLP?").await.unwrap();
    let hits = handle.store.search(&query, 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    for hit in &hits {
        assert_eq!(hit.chunk.doc_id, "nlp_basics", "hit: {:?}", hit.chunk.id);
    }
}

#[tokio::test]
async fn building_twice_is_deterministic() {
    let docs = TempDir::new().unwrap();
    write_sample_documents(docs.path());
    let policy = ChunkPolicy::new(200, 20).unwrap();

    let index_a = TempDir::new().unwrap();
    let index_b = TempDir::new().unwrap();
    let mgr_a = manager(index_a.path(), 256, policy);
    let mgr_b = manager(index_b.path(), 256, policy);

    let handle_a = mgr_a.build(docs.path(), true, false).await.unwrap().unwrap();
    let handle_b = mgr_b.build(docs.path(), true, false).await.unwrap().unwrap();

    let query = mgr_a.embedder().embed_query("machine learning").await.unwrap();
    let ids_a: Vec<String> = handle_a
        .store
        .search(&query, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.chunk.id)
        .collect();
    let ids_b: Vec<String> = handle_b
        .store
        .search(&query, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|h| h.chunk.id)
        .collect();
    assert_eq!(ids_a, ids_b);
}

#[tokio::test]
async fn persisted_index_loads_with_identical_results() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_sample_documents(docs.path());

    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let built = mgr.build(docs.path(), true, true).await.unwrap().unwrap();

    let query = mgr.embedder().embed_query("What is NLP?").await.unwrap();
    let before: Vec<(String, f32)> = built
        .store
        .search(&query, 4)
        .await
        .unwrap()
        .into_iter()
        .map(|h| (h.chunk.id, h.score))
        .collect();

    let loaded = mgr.load().await.unwrap();
    assert_eq!(loaded.manifest.total_chunks, built.manifest.total_chunks);
    let after: Vec<(String, f32)> = loaded
        .store
        .search(&query, 4)
        .await
        .unwrap()
        .into_iter()
        .map(|h| (h.chunk.id, h.score))
        .collect();

    assert_eq!(before.len(), after.len());
    for ((id_a, score_a), (id_b, score_b)) in before.iter().zip(&after) {
        assert_eq!(id_a, id_b);
        assert!((score_a - score_b).abs() < 1e-6);
    }
}

#[tokio::test]
async fn load_without_a_build_is_index_not_found() {
    let index = TempDir::new().unwrap();
    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let err = mgr.load().await.unwrap_err();
    assert!(matches!(err, RagError::IndexNotFound { .. }));
}

#[tokio::test]
async fn load_with_a_different_dimension_is_rejected() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_sample_documents(docs.path());

    let builder = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    builder.build(docs.path(), true, true).await.unwrap().unwrap();

    let mismatched = manager(index.path(), 128, ChunkPolicy::new(200, 20).unwrap());
    let err = mismatched.load().await.unwrap_err();
    assert!(matches!(
        err,
        RagError::DimensionMismatch { expected: 256, actual: 128, .. }
    ));
}

#[tokio::test]
async fn rebuild_replaces_the_persisted_index() {
    let docs = TempDir::new().unwrap();
    let index = TempDir::new().unwrap();
    write_sample_documents(docs.path());

    let mgr = manager(index.path(), 256, ChunkPolicy::new(200, 20).unwrap());
    let first = mgr.build(docs.path(), true, true).await.unwrap().unwrap();

    // Shrink the corpus, rebuild, and confirm the new index reflects it.
    fs::remove_file(docs.path().join("ai_overview.txt")).unwrap();
    let second = mgr.rebuild(docs.path(), true).await.unwrap().unwrap();
    assert!(second.manifest.total_chunks < first.manifest.total_chunks);

    let stats = mgr.stats(&second).await;
    assert_eq!(stats.total_chunks, second.manifest.total_chunks);
    assert_eq!(stats.backend, "flat");
}
