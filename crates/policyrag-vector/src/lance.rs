//! LanceDB collection backend.
//!
//! Storage and similarity search are delegated to a named table under the
//! index directory; the table is the source of truth and there is no
//! in-memory mirror. Opening is get-or-create and idempotent: an already
//! existing collection is reused as-is.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow_array::{
    Float32Array, FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{connect, Connection, DistanceType};
use tracing::debug;

use policyrag_core::error::{RagError, Result};
use policyrag_core::traits::VectorStore;
use policyrag_core::types::{DocKind, DocumentChunk, IndexedEntry, ScoredChunk};

use crate::schema::build_arrow_schema;

pub struct LanceStore {
    conn: Connection,
    table_name: String,
    dimension: usize,
    location: PathBuf,
}

fn store_err(context: &str, err: impl std::fmt::Display) -> RagError {
    RagError::Operation(format!("{context}: {err}"))
}

impl LanceStore {
    /// Connect to the database under `dir` and get-or-create the named
    /// collection with the given embedding dimension.
    pub async fn open(dir: &Path, collection: &str, dimension: usize) -> Result<Self> {
        let conn = connect(dir.to_string_lossy().as_ref())
            .execute()
            .await
            .map_err(|e| store_err("opening lance database", e))?;
        let store = Self {
            conn,
            table_name: collection.to_string(),
            dimension,
            location: dir.to_path_buf(),
        };
        store.ensure_table().await?;
        Ok(store)
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        self.conn
            .table_names()
            .execute()
            .await
            .map_err(|e| store_err("listing collections", e))
    }

    /// Create the collection if it does not exist yet. Safe to call when it
    /// already does.
    async fn ensure_table(&self) -> Result<()> {
        let names = self.table_names().await?;
        if names.contains(&self.table_name) {
            return Ok(());
        }
        let schema = build_arrow_schema(self.dimension as i32);
        let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
        self.conn
            .create_table(&self.table_name, Box::new(iter))
            .execute()
            .await
            .map_err(|e| store_err("creating collection", e))?;
        debug!(collection = %self.table_name, "created lance collection");
        Ok(())
    }

    /// Drop the collection. Used by rebuild; missing table is not an error.
    pub async fn drop_collection(&self) -> Result<()> {
        let names = self.table_names().await?;
        if !names.contains(&self.table_name) {
            return Ok(());
        }
        self.conn
            .drop_table(&self.table_name, &[])
            .await
            .map_err(|e| store_err("dropping collection", e))?;
        Ok(())
    }

    fn entries_to_record_batch(&self, entries: &[IndexedEntry]) -> Result<RecordBatch> {
        let schema = build_arrow_schema(self.dimension as i32);
        let mut ids = Vec::new();
        let mut doc_ids = Vec::new();
        let mut doc_paths = Vec::new();
        let mut kinds = Vec::new();
        let mut contents = Vec::new();
        let mut chunk_indices = Vec::new();
        let mut total_chunks = Vec::new();
        let mut chunk_sizes = Vec::new();
        let mut chunk_overlaps = Vec::new();
        let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::new();
        for entry in entries {
            let chunk = &entry.chunk;
            ids.push(chunk.id.clone());
            doc_ids.push(chunk.doc_id.clone());
            doc_paths.push(chunk.doc_path.clone());
            kinds.push(chunk.kind.as_str().to_string());
            contents.push(chunk.content.clone());
            chunk_indices.push(chunk.chunk_index as i32);
            total_chunks.push(chunk.total_chunks as i32);
            chunk_sizes.push(chunk.chunk_size as i32);
            chunk_overlaps.push(chunk.chunk_overlap as i32);
            vectors.push(Some(entry.vector.iter().map(|&x| Some(x)).collect()));
        }
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(doc_ids)),
                Arc::new(StringArray::from(doc_paths)),
                Arc::new(StringArray::from(kinds)),
                Arc::new(StringArray::from(contents)),
                Arc::new(Int32Array::from(chunk_indices)),
                Arc::new(Int32Array::from(total_chunks)),
                Arc::new(Int32Array::from(chunk_sizes)),
                Arc::new(Int32Array::from(chunk_overlaps)),
                Arc::new(FixedSizeListArray::from_iter_primitive::<
                    arrow_array::types::Float32Type,
                    _,
                    _,
                >(vectors.into_iter(), self.dimension as i32)),
            ],
        )
        .map_err(|e| store_err("building record batch", e))
    }
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| RagError::Operation(format!("collection is missing column '{name}'")))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| RagError::Operation(format!("collection is missing column '{name}'")))
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn upsert(&mut self, entries: Vec<IndexedEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        for entry in &entries {
            if entry.vector.len() != self.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimension,
                    actual: entry.vector.len(),
                    provider: "lance store upsert".to_string(),
                });
            }
        }
        let batch = self.entries_to_record_batch(&entries)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        let table = self
            .conn
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| store_err("opening collection", e))?;
        let mut merge = table.merge_insert(&["id"]);
        merge
            .when_matched_update_all(None)
            .when_not_matched_insert_all();
        merge
            .execute(reader)
            .await
            .map_err(|e| store_err("upserting entries", e))?;
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if query_vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
                provider: "lance store query".to_string(),
            });
        }
        let table = self
            .conn
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| store_err("opening collection", e))?;
        let mut stream = table
            .vector_search(query_vector.to_vec())
            .map_err(|e| store_err("building vector query", e))?
            .distance_type(DistanceType::Cosine)
            .limit(top_k)
            .execute()
            .await
            .map_err(|e| store_err("running vector query", e))?;

        let mut hits: Vec<(usize, f32, DocumentChunk)> = Vec::new();
        let mut insertion = 0usize;
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| store_err("reading result batch", e))?
        {
            let ids = string_column(&batch, "id")?;
            let doc_ids = string_column(&batch, "doc_id")?;
            let doc_paths = string_column(&batch, "doc_path")?;
            let kinds = string_column(&batch, "kind")?;
            let contents = string_column(&batch, "content")?;
            let chunk_indices = int_column(&batch, "chunk_index")?;
            let totals = int_column(&batch, "total_chunks")?;
            let sizes = int_column(&batch, "chunk_size")?;
            let overlaps = int_column(&batch, "chunk_overlap")?;
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());
            for i in 0..batch.num_rows() {
                // Cosine distance is 1 - similarity.
                let score = distances.map_or(0.5, |d| 1.0 - d.value(i));
                let chunk = DocumentChunk {
                    id: ids.value(i).to_string(),
                    doc_id: doc_ids.value(i).to_string(),
                    doc_path: doc_paths.value(i).to_string(),
                    kind: DocKind::parse(kinds.value(i)),
                    content: contents.value(i).to_string(),
                    chunk_index: chunk_indices.value(i) as usize,
                    total_chunks: totals.value(i) as usize,
                    chunk_size: sizes.value(i) as usize,
                    chunk_overlap: overlaps.value(i) as usize,
                };
                hits.push((insertion, score, chunk));
                insertion += 1;
            }
        }
        // Stable order: similarity descending, insertion order on ties.
        hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(hits
            .into_iter()
            .take(top_k)
            .enumerate()
            .map(|(rank, (_, score, chunk))| ScoredChunk { chunk, score, rank })
            .collect())
    }

    async fn persist(&self) -> Result<()> {
        // Write-through backend; the collection is already durable.
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let table = self
            .conn
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| store_err("opening collection", e))?;
        let mut stream = table
            .query()
            .select(Select::columns(&["id"]))
            .execute()
            .await
            .map_err(|e| store_err("scanning collection", e))?;
        let mut count = 0usize;
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| store_err("reading scan batch", e))?
        {
            count += batch.num_rows();
        }
        Ok(count)
    }
}
