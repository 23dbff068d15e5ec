//! Thin HTTP client for the Ollama API.
//!
//! Endpoints used: `/api/embed` (batch embedding), `/api/generate`
//! (single-shot completion, streaming disabled), `/api/tags` (installed
//! models, used by the doctor binary). Timeouts are per request; callers
//! choose shorter budgets for embedding than for generation.

use std::time::Duration;

use policyrag_core::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::failure::{translate_decode_error, translate_request_error, translate_status};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TaggedModel>,
}

#[derive(Deserialize)]
struct TaggedModel {
    name: String,
}

impl OllamaClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RagError::UnknownServiceFailure {
                detail: format!("building HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Embed a batch of texts, preserving input order.
    pub async fn embed(
        &self,
        model: &str,
        input: &[String],
        timeout: Duration,
    ) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        debug!(model, count = input.len(), "embedding batch");
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&EmbedRequest { model, input })
            .send()
            .await
            .map_err(|e| translate_request_error(e, &self.base_url, timeout.as_secs()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(translate_status(status, &self.base_url, model));
        }
        let body: EmbedResponse = response.json().await.map_err(translate_decode_error)?;
        if body.embeddings.len() != input.len() {
            return Err(RagError::UnknownServiceFailure {
                detail: format!(
                    "embedding count mismatch: sent {}, received {}",
                    input.len(),
                    body.embeddings.len()
                ),
            });
        }
        Ok(body.embeddings)
    }

    /// Single-shot completion with streaming disabled.
    pub async fn generate(&self, model: &str, prompt: &str, timeout: Duration) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        debug!(model, prompt_chars = prompt.len(), "generate");
        let response = self
            .http
            .post(&url)
            .timeout(timeout)
            .json(&GenerateRequest {
                model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| translate_request_error(e, &self.base_url, timeout.as_secs()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(translate_status(status, &self.base_url, model));
        }
        let body: GenerateResponse = response.json().await.map_err(translate_decode_error)?;
        Ok(body.response)
    }

    /// Names of models installed on the server.
    pub async fn tags(&self, timeout: Duration) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| translate_request_error(e, &self.base_url, timeout.as_secs()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RagError::ServiceError {
                status: status.as_u16(),
                endpoint: self.base_url.clone(),
            });
        }
        let body: TagsResponse = response.json().await.map_err(translate_decode_error)?;
        Ok(body.models.into_iter().map(|m| m.name).collect())
    }
}
