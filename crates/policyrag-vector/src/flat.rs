//! Brute-force in-process vector index.
//!
//! Keeps every entry in memory and scores a query against the full matrix,
//! O(n·d) per search. Right for small corpora and for tests. Persists as two
//! parallel JSON artifacts under the index directory: the raw vector matrix
//! and the document store.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use policyrag_core::error::{RagError, Result};
use policyrag_core::traits::VectorStore;
use policyrag_core::types::{DocumentChunk, IndexedEntry, ScoredChunk};

pub const VECTORS_FILE: &str = "vectors.json";
pub const DOCSTORE_FILE: &str = "docstore.json";

pub struct FlatStore {
    entries: Vec<IndexedEntry>,
    by_id: HashMap<String, usize>,
    dimension: Option<usize>,
    dir: Option<PathBuf>,
}

impl FlatStore {
    /// Ephemeral store with no persistence location.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_id: HashMap::new(),
            dimension: None,
            dir: None,
        }
    }

    /// Store that persists its artifacts under `dir`.
    pub fn with_dir(dir: &Path) -> Self {
        let mut store = Self::new();
        store.dir = Some(dir.to_path_buf());
        store
    }

    /// Re-open previously persisted artifacts. `IndexNotFound` when either
    /// artifact is missing.
    pub fn open(dir: &Path) -> Result<Self> {
        let vectors_path = dir.join(VECTORS_FILE);
        let docstore_path = dir.join(DOCSTORE_FILE);
        if !vectors_path.exists() || !docstore_path.exists() {
            return Err(RagError::IndexNotFound {
                location: dir.to_path_buf(),
            });
        }
        let vectors: Vec<Vec<f32>> = serde_json::from_str(&fs::read_to_string(vectors_path)?)
            .map_err(|e| RagError::Operation(format!("corrupt vector matrix: {e}")))?;
        let chunks: Vec<DocumentChunk> = serde_json::from_str(&fs::read_to_string(docstore_path)?)
            .map_err(|e| RagError::Operation(format!("corrupt document store: {e}")))?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Operation(format!(
                "vector matrix ({}) and document store ({}) disagree in length",
                vectors.len(),
                chunks.len()
            )));
        }
        let mut store = Self::with_dir(dir);
        let entries = vectors
            .into_iter()
            .zip(chunks)
            .map(|(vector, chunk)| IndexedEntry { chunk, vector })
            .collect();
        store.insert_all(entries)?;
        debug!(count = store.entries.len(), dir = %dir.display(), "opened flat index");
        Ok(store)
    }

    fn insert_all(&mut self, entries: Vec<IndexedEntry>) -> Result<()> {
        for entry in entries {
            let dim = entry.vector.len();
            match self.dimension {
                None => self.dimension = Some(dim),
                Some(expected) if expected != dim => {
                    return Err(RagError::DimensionMismatch {
                        expected,
                        actual: dim,
                        provider: "flat store upsert".to_string(),
                    });
                }
                Some(_) => {}
            }
            match self.by_id.get(&entry.chunk.id) {
                Some(&idx) => self.entries[idx] = entry,
                None => {
                    self.by_id.insert(entry.chunk.id.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        Ok(())
    }

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        let mut dot = 0f32;
        let mut norm_a = 0f32;
        let mut norm_b = 0f32;
        for (x, y) in a.iter().zip(b) {
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        let denom = (norm_a.sqrt() * norm_b.sqrt()).max(1e-12);
        dot / denom
    }
}

impl Default for FlatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for FlatStore {
    async fn upsert(&mut self, entries: Vec<IndexedEntry>) -> Result<()> {
        self.insert_all(entries)
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if let Some(expected) = self.dimension {
            if query_vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                    provider: "flat store query".to_string(),
                });
            }
        }
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, Self::cosine(query_vector, &entry.vector)))
            .collect();
        // Stable sort keeps insertion order on score ties.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k.min(self.entries.len()));
        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(rank, (idx, score))| ScoredChunk {
                chunk: self.entries[idx].chunk.clone(),
                score,
                rank,
            })
            .collect())
    }

    async fn persist(&self) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Err(RagError::Operation(
                "flat store has no persistence directory".to_string(),
            ));
        };
        fs::create_dir_all(dir)?;
        let vectors: Vec<&Vec<f32>> = self.entries.iter().map(|e| &e.vector).collect();
        let chunks: Vec<&DocumentChunk> = self.entries.iter().map(|e| &e.chunk).collect();
        fs::write(dir.join(VECTORS_FILE), serde_json::to_string(&vectors)?)?;
        fs::write(dir.join(DOCSTORE_FILE), serde_json::to_string(&chunks)?)?;
        debug!(count = self.entries.len(), dir = %dir.display(), "persisted flat index");
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }
}
