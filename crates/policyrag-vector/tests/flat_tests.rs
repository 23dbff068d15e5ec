use policyrag_core::error::RagError;
use policyrag_core::traits::VectorStore;
use policyrag_core::types::{DocKind, DocumentChunk, IndexedEntry};
use policyrag_vector::FlatStore;
use tempfile::TempDir;

fn entry(id: &str, vector: Vec<f32>) -> IndexedEntry {
    IndexedEntry {
        chunk: DocumentChunk {
            id: id.to_string(),
            doc_id: id.split(':').next().unwrap().to_string(),
            doc_path: format!("/tmp/{id}.txt"),
            kind: DocKind::Text,
            content: format!("content of {id}"),
            chunk_index: 0,
            total_chunks: 1,
            chunk_size: 512,
            chunk_overlap: 80,
        },
        vector,
    }
}

#[tokio::test]
async fn search_orders_by_descending_similarity() {
    let mut store = FlatStore::new();
    store
        .upsert(vec![
            entry("far:0", vec![0.0, 1.0]),
            entry("near:0", vec![1.0, 0.0]),
            entry("mid:0", vec![0.7, 0.7]),
        ])
        .await
        .unwrap();

    let hits = store.search(&[1.0, 0.0], 3).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, ["near:0", "mid:0", "far:0"]);
    assert!(hits[0].score > hits[1].score);
    assert_eq!(hits[0].rank, 0);
    assert_eq!(hits[2].rank, 2);
}

#[tokio::test]
async fn ties_keep_insertion_order() {
    let mut store = FlatStore::new();
    store
        .upsert(vec![
            entry("first:0", vec![1.0, 0.0]),
            entry("second:0", vec![1.0, 0.0]),
            entry("third:0", vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    let hits = store.search(&[1.0, 0.0], 3).await.unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.chunk.id.as_str()).collect();
    assert_eq!(ids, ["first:0", "second:0", "third:0"]);
}

#[tokio::test]
async fn top_k_beyond_corpus_size_is_capped() {
    let mut store = FlatStore::new();
    store
        .upsert(vec![entry("a:0", vec![1.0, 0.0]), entry("b:0", vec![0.0, 1.0])])
        .await
        .unwrap();

    let hits = store.search(&[1.0, 0.0], 50).await.unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn duplicate_id_replaces_the_entry() {
    let mut store = FlatStore::new();
    store.upsert(vec![entry("a:0", vec![1.0, 0.0])]).await.unwrap();
    store.upsert(vec![entry("a:0", vec![0.0, 1.0])]).await.unwrap();

    assert_eq!(store.len().await.unwrap(), 1);
    let hits = store.search(&[0.0, 1.0], 1).await.unwrap();
    assert!(hits[0].score > 0.99);
}

#[tokio::test]
async fn mixing_dimensions_is_rejected() {
    let mut store = FlatStore::new();
    store.upsert(vec![entry("a:0", vec![1.0, 0.0])]).await.unwrap();
    let err = store
        .upsert(vec![entry("b:0", vec![1.0, 0.0, 0.0])])
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3, .. }));
}

#[tokio::test]
async fn persist_then_open_round_trips_search_results() {
    let tmp = TempDir::new().unwrap();
    let mut store = FlatStore::with_dir(tmp.path());
    store
        .upsert(vec![
            entry("a:0", vec![0.9, 0.1]),
            entry("b:0", vec![0.1, 0.9]),
            entry("c:0", vec![0.6, 0.4]),
        ])
        .await
        .unwrap();
    store.persist().await.unwrap();

    let before = store.search(&[1.0, 0.0], 3).await.unwrap();
    let reopened = FlatStore::open(tmp.path()).unwrap();
    let after = reopened.search(&[1.0, 0.0], 3).await.unwrap();

    assert_eq!(before.len(), after.len());
    for (x, y) in before.iter().zip(&after) {
        assert_eq!(x.chunk.id, y.chunk.id);
        assert!((x.score - y.score).abs() < 1e-6);
    }
}

#[tokio::test]
async fn opening_a_missing_index_is_index_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = FlatStore::open(&tmp.path().join("empty")).unwrap_err();
    assert!(matches!(err, RagError::IndexNotFound { .. }));
}
