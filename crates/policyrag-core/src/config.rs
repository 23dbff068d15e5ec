//! Configuration loader and path helpers.
//!
//! Figment merges `config.toml` + `config.<env>.toml` + `APP_*` environment
//! variables (nested keys separated by `__`, e.g. `APP_OLLAMA__BASE_URL`).
//! The merged profile extracts into the typed [`AppConfig`].

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};
use crate::types::ResponseMode;

/// Vector index backend, a closed set selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Brute-force in-process matrix, persisted as JSON artifacts.
    Flat,
    /// Named LanceDB collection under the index directory.
    Lance,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub llm_model: String,
    pub embed_model: String,
    pub embed_dimension: usize,
    pub embed_batch_size: usize,
    pub generate_timeout_secs: u64,
    pub embed_timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            llm_model: "qwen3:8b".to_string(),
            embed_model: "bge-m3".to_string(),
            embed_dimension: 1024,
            embed_batch_size: 32,
            generate_timeout_secs: 120,
            embed_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub documents_dir: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            documents_dir: "./data/documents".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub backend: VectorBackend,
    pub dir: String,
    pub collection: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Lance,
            dir: "./storage/index".to_string(),
            collection: "credit_policies".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 80,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub top_k: usize,
    pub response_mode: ResponseMode,
    pub similarity_cutoff: Option<f32>,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            response_mode: ResponseMode::Compact,
            similarity_cutoff: Some(0.7),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ollama: OllamaSettings,
    pub data: DataSettings,
    pub index: IndexSettings,
    pub chunking: ChunkingSettings,
    pub query: QuerySettings,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config: AppConfig = figment()
            .extract()
            .map_err(|e| RagError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(RagError::InvalidConfig(
                "chunking.chunk_size must be positive".to_string(),
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(RagError::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if let Some(cutoff) = self.query.similarity_cutoff {
            if !(0.0..=1.0).contains(&cutoff) {
                return Err(RagError::InvalidConfig(format!(
                    "query.similarity_cutoff ({cutoff}) must be within 0.0..=1.0"
                )));
            }
        }
        if self.ollama.embed_batch_size == 0 {
            return Err(RagError::InvalidConfig(
                "ollama.embed_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn documents_dir(&self) -> PathBuf {
        expand_path(&self.data.documents_dir)
    }

    pub fn index_dir(&self) -> PathBuf {
        expand_path(&self.index.dir)
    }
}

fn figment() -> Figment {
    let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
    let mut figment = Figment::new().merge(Toml::file("config.toml"));
    match env_name.as_str() {
        "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
        "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
        "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
        _ => {}
    }
    figment.merge(Env::prefixed("APP_").split("__"))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after
/// expansion. If `p` is absolute, it's returned as-is.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() {
        p
    } else {
        base.join(p)
    }
}
