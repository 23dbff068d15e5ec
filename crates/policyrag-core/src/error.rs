//! Closed error taxonomy for the pipeline.
//!
//! Every failure that can cross a crate boundary is one of these variants.
//! Transport-level errors from the model server are translated into the
//! `Service*` variants at the provider boundary and never reach callers as
//! raw socket or HTTP errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Recoverable: the caller may seed sample content or abort.
    #[error("no documents found under {}", dir.display())]
    NoDocumentsFound { dir: PathBuf },

    /// Recoverable: signals "build needed", not a fatal condition.
    #[error("no persisted index at {}; build one first", location.display())]
    IndexNotFound { location: PathBuf },

    #[error(
        "embedding dimension mismatch: index was built with dimension {expected}, \
         provider '{provider}' produces {actual}; check the embedding model name \
         matches your build"
    )]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        provider: String,
    },

    #[error(
        "cannot reach the model server at {endpoint}; verify it is running and \
         reachable at the configured address"
    )]
    ServiceUnreachable { endpoint: String },

    #[error(
        "request to the model server at {endpoint} timed out after {seconds}s; \
         check that the server is responsive and retry"
    )]
    ServiceTimeout { endpoint: String, seconds: u64 },

    #[error("model '{model}' was not found on the server; pull it first")]
    ModelNotFound { model: String },

    #[error("model server returned HTTP {status} from {endpoint}")]
    ServiceError { status: u16, endpoint: String },

    #[error("unexpected model service failure: {detail}")]
    UnknownServiceFailure { detail: String },

    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("model output contained malformed JSON: {0}")]
    MalformedJson(String),

    /// Every failing field, not just the first.
    #[error("structured answer failed validation: {}", violations.join("; "))]
    SchemaViolation { violations: Vec<String> },

    #[error("operation failed: {0}")]
    Operation(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// True for conditions a caller is expected to handle by building or
    /// seeding rather than surfacing to the user as a hard failure.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RagError::NoDocumentsFound { .. } | RagError::IndexNotFound { .. }
        )
    }
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Operation(err.to_string())
    }
}

impl From<serde_json::Error> for RagError {
    fn from(err: serde_json::Error) -> Self {
        RagError::Operation(err.to_string())
    }
}
