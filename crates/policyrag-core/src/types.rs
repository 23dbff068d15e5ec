//! Domain types shared by the indexing and query pipelines.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub type ChunkId = String;

/// Source document kind, decided from the file extension at load time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Text,
    Pdf,
    Delimited,
    Spreadsheet,
    WordProcessing,
}

impl DocKind {
    /// Wire name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            DocKind::Text => "text",
            DocKind::Pdf => "pdf",
            DocKind::Delimited => "delimited",
            DocKind::Spreadsheet => "spreadsheet",
            DocKind::WordProcessing => "word_processing",
        }
    }

    /// Lenient parse for values read back from storage.
    pub fn parse(value: &str) -> Self {
        match value {
            "pdf" => DocKind::Pdf,
            "delimited" => DocKind::Delimited,
            "spreadsheet" => DocKind::Spreadsheet,
            "word_processing" => DocKind::WordProcessing,
            _ => DocKind::Text,
        }
    }
}

/// A raw document as loaded from disk. Immutable once loaded; the index
/// manager owns all documents for the duration of a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identity (file stem).
    pub doc_id: String,
    /// Original path to the source file.
    pub doc_path: PathBuf,
    pub kind: DocKind,
    pub text: String,
}

/// A chunk of a source document that is independently embedded and indexed.
///
/// `id` is `"{doc_id}:{chunk_index}"` and is stable across rebuilds of the
/// same corpus with the same chunk policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub kind: DocKind,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Chunk policy under which this chunk was produced.
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

/// One entry of the vector index: a chunk together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// A retrieval hit. `score` is a 0..1 normalized similarity, higher is
/// better. `rank` is the position within one result set, starting at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
    pub rank: usize,
}

/// Strategy for folding retrieved chunks into one model-generated answer.
/// The mode changes how many model calls are made and how context is packed,
/// never the output schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Pack chunks into the fewest prompt-fitting blocks; one call per block.
    Compact,
    /// One call per chunk, refining the running answer each time.
    Refine,
    /// Summarize groupwise until a single answer remains.
    TreeSummarize,
}

impl Default for ResponseMode {
    fn default() -> Self {
        ResponseMode::Compact
    }
}

/// Read-only index introspection record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub backend: String,
    pub location: String,
}

/// Aggregate statistics over a loaded document set, printed after ingest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentSummary {
    pub total_documents: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub by_extension: std::collections::BTreeMap<String, usize>,
}

impl DocumentSummary {
    pub fn of(documents: &[Document]) -> Self {
        let mut summary = Self::default();
        summary.total_documents = documents.len();
        for doc in documents {
            summary.total_characters += doc.text.chars().count();
            summary.total_words += doc.text.split_whitespace().count();
            let ext = doc
                .doc_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("none")
                .to_lowercase();
            *summary.by_extension.entry(ext).or_insert(0) += 1;
        }
        summary
    }
}
