//! policyrag-vector
//!
//! The two vector index backends (flat in-process, LanceDB collection), the
//! persisted-index manifest, and the index manager that orchestrates
//! build / load / rebuild / stats.

pub mod flat;
pub mod lance;
pub mod manager;
pub mod manifest;
pub mod schema;

pub use flat::FlatStore;
pub use lance::LanceStore;
pub use manager::{IndexConfig, IndexHandle, IndexManager};
pub use manifest::IndexManifest;
