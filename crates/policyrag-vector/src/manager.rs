//! Build, load, rebuild and introspect the vector index.
//!
//! The manager is the only writer of index artifacts. One embedding provider
//! instance is fixed for the whole build so every vector lives in one space;
//! the same provider must be supplied again at load time, which the manifest
//! dimension check enforces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use policyrag_core::chunker::{split_documents, ChunkPolicy};
use policyrag_core::config::{AppConfig, VectorBackend};
use policyrag_core::error::{RagError, Result};
use policyrag_core::loader::load_documents;
use policyrag_core::traits::{EmbeddingProvider, VectorStore};
use policyrag_core::types::{Document, IndexStats, IndexedEntry};

use crate::flat::FlatStore;
use crate::lance::LanceStore;
use crate::manifest::IndexManifest;

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub backend: VectorBackend,
    pub dir: PathBuf,
    pub collection: String,
    pub embed_batch_size: usize,
}

impl IndexConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            backend: config.index.backend,
            dir: config.index_dir(),
            collection: config.index.collection.clone(),
            embed_batch_size: config.ollama.embed_batch_size,
        }
    }

    fn backend_name(&self) -> &'static str {
        match self.backend {
            VectorBackend::Flat => "flat",
            VectorBackend::Lance => "lance",
        }
    }
}

/// A built or loaded index: the store plus its descriptor.
pub struct IndexHandle {
    pub store: Box<dyn VectorStore>,
    pub manifest: IndexManifest,
}

pub struct IndexManager {
    config: IndexConfig,
    policy: ChunkPolicy,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IndexManager {
    pub fn new(
        config: IndexConfig,
        policy: ChunkPolicy,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            config,
            policy,
            embedder,
        }
    }

    pub fn embedder(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedder)
    }

    /// Load documents from `documents_dir`, chunk, embed and store them.
    /// Returns `Ok(None)` when there is nothing to index so the caller can
    /// seed sample content or abort.
    pub async fn build(
        &self,
        documents_dir: &Path,
        recursive: bool,
        persist: bool,
    ) -> Result<Option<IndexHandle>> {
        let documents = load_documents(documents_dir, recursive)?;
        if documents.is_empty() {
            warn!(dir = %documents_dir.display(), "no documents to index");
            return Ok(None);
        }
        self.build_from_documents(&documents, persist).await
    }

    /// Build from an already loaded document set.
    pub async fn build_from_documents(
        &self,
        documents: &[Document],
        persist: bool,
    ) -> Result<Option<IndexHandle>> {
        let chunks = split_documents(documents, self.policy);
        if chunks.is_empty() {
            warn!("documents produced no chunks");
            return Ok(None);
        }
        info!(
            chunks = chunks.len(),
            backend = self.config.backend_name(),
            "building index"
        );

        let pb = ProgressBar::new(chunks.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        let mut entries = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.embed_batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(RagError::UnknownServiceFailure {
                    detail: format!(
                        "embedding provider returned {} vectors for {} chunks",
                        vectors.len(),
                        batch.len()
                    ),
                });
            }
            for (chunk, vector) in batch.iter().cloned().zip(vectors) {
                entries.push(IndexedEntry { chunk, vector });
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        let total = entries.len();
        let mut store = self.create_store(persist).await?;
        store.upsert(entries).await?;

        let manifest = IndexManifest::new(
            self.embedder.as_ref(),
            self.config.backend_name(),
            &self.config.collection,
            self.policy.chunk_size,
            self.policy.chunk_overlap,
            total,
        );
        if persist {
            store.persist().await?;
            manifest.save(&self.config.dir)?;
            info!(dir = %self.config.dir.display(), total, "index persisted");
        }
        Ok(Some(IndexHandle { store, manifest }))
    }

    /// Re-open a previously persisted index. `IndexNotFound` signals "build
    /// needed"; `DimensionMismatch` means the configured embedding model
    /// does not match the one the index was built with.
    pub async fn load(&self) -> Result<IndexHandle> {
        let manifest = IndexManifest::load(&self.config.dir)?;
        manifest.check_provider(self.embedder.as_ref())?;
        if manifest.embedder_id != self.embedder.id() {
            warn!(
                built_with = %manifest.embedder_id,
                configured = %self.embedder.id(),
                "embedding provider differs from the one that built the index; \
                 retrieval quality may degrade"
            );
        }
        let store: Box<dyn VectorStore> = match manifest.backend.as_str() {
            "flat" => Box::new(FlatStore::open(&self.config.dir)?),
            "lance" => Box::new(
                LanceStore::open(&self.config.dir, &manifest.collection, manifest.dimension)
                    .await?,
            ),
            other => {
                return Err(RagError::Operation(format!(
                    "manifest names unknown backend '{other}'"
                )))
            }
        };
        info!(dir = %self.config.dir.display(), backend = %manifest.backend, "index loaded");
        Ok(IndexHandle { store, manifest })
    }

    /// Delete persisted artifacts, then build fresh. If the build fails
    /// after deletion the system is left with no index; callers requiring
    /// continuity should build into a separate location and swap.
    pub async fn rebuild(
        &self,
        documents_dir: &Path,
        recursive: bool,
    ) -> Result<Option<IndexHandle>> {
        info!(dir = %self.config.dir.display(), "rebuilding index");
        self.delete_artifacts().await?;
        self.build(documents_dir, recursive, true).await
    }

    /// Read-only introspection; degrades to a default record on internal
    /// failure instead of propagating errors.
    pub async fn stats(&self, handle: &IndexHandle) -> IndexStats {
        let backend = handle.manifest.backend.clone();
        let location = self.config.dir.display().to_string();
        match handle.store.len().await {
            Ok(total_chunks) => IndexStats {
                total_chunks,
                backend,
                location,
            },
            Err(err) => {
                error!(error = %err, "failed to read index stats");
                IndexStats::default()
            }
        }
    }

    async fn create_store(&self, persist: bool) -> Result<Box<dyn VectorStore>> {
        match self.config.backend {
            VectorBackend::Flat => {
                if persist {
                    Ok(Box::new(FlatStore::with_dir(&self.config.dir)))
                } else {
                    Ok(Box::new(FlatStore::new()))
                }
            }
            VectorBackend::Lance => Ok(Box::new(
                LanceStore::open(
                    &self.config.dir,
                    &self.config.collection,
                    self.embedder.dimension(),
                )
                .await?,
            )),
        }
    }

    async fn delete_artifacts(&self) -> Result<()> {
        match self.config.backend {
            VectorBackend::Flat => {
                for file in [
                    crate::flat::VECTORS_FILE,
                    crate::flat::DOCSTORE_FILE,
                    crate::manifest::MANIFEST_FILE,
                ] {
                    let path = self.config.dir.join(file);
                    if path.exists() {
                        std::fs::remove_file(path)?;
                    }
                }
            }
            VectorBackend::Lance => {
                let store = LanceStore::open(
                    &self.config.dir,
                    &self.config.collection,
                    self.embedder.dimension(),
                )
                .await?;
                store.drop_collection().await?;
                let manifest_path = IndexManifest::path(&self.config.dir);
                if manifest_path.exists() {
                    std::fs::remove_file(manifest_path)?;
                }
            }
        }
        Ok(())
    }
}
