use policyrag_core::traits::VectorStore;
use policyrag_core::types::{DocKind, DocumentChunk, IndexedEntry};
use policyrag_vector::LanceStore;
use tempfile::TempDir;

fn entry(id: &str, vector: Vec<f32>) -> IndexedEntry {
    IndexedEntry {
        chunk: DocumentChunk {
            id: id.to_string(),
            doc_id: "doc".to_string(),
            doc_path: "/tmp/doc.txt".to_string(),
            kind: DocKind::Text,
            content: format!("chunk {id}"),
            chunk_index: 0,
            total_chunks: 4,
            chunk_size: 512,
            chunk_overlap: 80,
        },
        vector,
    }
}

#[tokio::test]
async fn upsert_search_and_reopen_round_trip() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let dim = 8usize;

    let mut store = LanceStore::open(tmp.path(), "credit_policies", dim).await?;
    let mut base = vec![0.0f32; dim];
    base[0] = 1.0;
    let mut other = vec![0.0f32; dim];
    other[1] = 1.0;
    store
        .upsert(vec![
            entry("doc:0", base.clone()),
            entry("doc:1", other.clone()),
        ])
        .await?;
    assert_eq!(store.len().await?, 2);

    let hits = store.search(&base, 2).await?;
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].chunk.id, "doc:0");
    assert!(hits[0].score > hits[1].score);

    // Opening the same collection again is idempotent and sees the data.
    let reopened = LanceStore::open(tmp.path(), "credit_policies", dim).await?;
    assert_eq!(reopened.len().await?, 2);
    let hits = reopened.search(&base, 5).await?;
    assert_eq!(hits.len(), 2, "top_k beyond corpus size is capped");
    assert_eq!(hits[0].chunk.id, "doc:0");

    // Upsert with an existing id replaces instead of appending.
    let mut moved = vec![0.0f32; dim];
    moved[2] = 1.0;
    let mut writable = reopened;
    writable.upsert(vec![entry("doc:1", moved)]).await?;
    assert_eq!(writable.len().await?, 2);

    Ok(())
}

#[tokio::test]
async fn drop_collection_removes_the_data() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let dim = 4usize;
    let mut store = LanceStore::open(tmp.path(), "credit_policies", dim).await?;
    store.upsert(vec![entry("doc:0", vec![1.0, 0.0, 0.0, 0.0])]).await?;
    store.drop_collection().await?;

    let fresh = LanceStore::open(tmp.path(), "credit_policies", dim).await?;
    assert_eq!(fresh.len().await?, 0);
    Ok(())
}
