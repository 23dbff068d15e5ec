//! Index-structure descriptor persisted next to the index artifacts.
//!
//! The manifest records which embedding provider built the index and under
//! what chunk policy, so a later load can refuse a provider whose dimension
//! disagrees with the stored vectors instead of silently degrading
//! retrieval quality.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use policyrag_core::error::{RagError, Result};
use policyrag_core::traits::EmbeddingProvider;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexManifest {
    pub embedder_id: String,
    pub dimension: usize,
    pub backend: String,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub total_chunks: usize,
    pub built_at_ms: i64,
}

impl IndexManifest {
    pub fn new(
        embedder: &dyn EmbeddingProvider,
        backend: &str,
        collection: &str,
        chunk_size: usize,
        chunk_overlap: usize,
        total_chunks: usize,
    ) -> Self {
        Self {
            embedder_id: embedder.id().to_string(),
            dimension: embedder.dimension(),
            backend: backend.to_string(),
            collection: collection.to_string(),
            chunk_size,
            chunk_overlap,
            total_chunks,
            built_at_ms: Utc::now().timestamp_millis(),
        }
    }

    pub fn path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(dir), json)?;
        Ok(())
    }

    /// Load the manifest, or `IndexNotFound` when no index was ever
    /// persisted at `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = Self::path(dir);
        if !path.exists() {
            return Err(RagError::IndexNotFound {
                location: dir.to_path_buf(),
            });
        }
        let json = fs::read_to_string(path)?;
        let manifest: IndexManifest = serde_json::from_str(&json)
            .map_err(|e| RagError::Operation(format!("corrupt index manifest: {e}")))?;
        Ok(manifest)
    }

    /// Refuse an embedding provider whose dimension disagrees with the one
    /// the index was built with.
    pub fn check_provider(&self, embedder: &dyn EmbeddingProvider) -> Result<()> {
        if embedder.dimension() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: embedder.dimension(),
                provider: embedder.id().to_string(),
            });
        }
        Ok(())
    }
}
