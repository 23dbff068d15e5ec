//! Query engine and the case-explanation assistant.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use policyrag_core::answer::StructuredAnswer;
use policyrag_core::error::Result;
use policyrag_core::types::ScoredChunk;

use crate::extract::extract_structured_answer;
use crate::prompt::structured_case_prompt;
use crate::retriever::Retriever;
use crate::synthesize::ResponseSynthesizer;

const PREVIEW_CHARS: usize = 200;

/// Where an answer came from: chunk preview, source path and similarity.
#[derive(Debug, Clone, Serialize)]
pub struct SourceAttribution {
    pub doc_id: String,
    pub doc_path: String,
    pub preview: String,
    pub score: f32,
}

impl SourceAttribution {
    fn from_chunk(hit: &ScoredChunk) -> Self {
        let mut preview: String = hit.chunk.content.chars().take(PREVIEW_CHARS).collect();
        if hit.chunk.content.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        Self {
            doc_id: hit.chunk.doc_id.clone(),
            doc_path: hit.chunk.doc_path.clone(),
            preview,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
}

/// Retrieve-then-synthesize over one loaded index.
pub struct QueryEngine {
    retriever: Retriever,
    synthesizer: ResponseSynthesizer,
}

impl QueryEngine {
    pub fn new(retriever: Retriever, synthesizer: ResponseSynthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Answer a free-form question with source attribution.
    pub async fn query(&self, question: &str) -> Result<QueryResponse> {
        info!(question, "querying index");
        let hits = self.retriever.retrieve(question).await?;
        let answer = self.synthesizer.synthesize(question, &hits).await?;
        Ok(QueryResponse {
            question: question.to_string(),
            answer,
            sources: hits.iter().map(SourceAttribution::from_chunk).collect(),
        })
    }

    pub(crate) async fn retrieve(&self, question: &str) -> Result<Vec<ScoredChunk>> {
        self.retriever.retrieve(question).await
    }

    pub(crate) async fn synthesize(
        &self,
        prompt: &str,
        hits: &[ScoredChunk],
    ) -> Result<String> {
        self.synthesizer.synthesize(prompt, hits).await
    }
}

/// A validated case explanation with its supporting sources.
#[derive(Debug, Clone, Serialize)]
pub struct CaseExplanation {
    pub answer: StructuredAnswer,
    pub sources: Vec<SourceAttribution>,
}

/// Explains an upstream credit decision against the policy corpus,
/// returning only schema-validated answers.
pub struct CaseAssistant {
    engine: QueryEngine,
}

impl CaseAssistant {
    pub fn new(engine: QueryEngine) -> Self {
        Self { engine }
    }

    /// Retrieval runs on the user question alone; the full structured
    /// prompt (schema contract + decision payload) is used for synthesis.
    pub async fn explain_case(
        &self,
        question: &str,
        decision_json: &Value,
    ) -> Result<CaseExplanation> {
        info!(question, "explaining case");
        let hits = self.engine.retrieve(question).await?;
        let prompt = structured_case_prompt(question, decision_json);
        let raw = self.engine.synthesize(&prompt, &hits).await?;
        let answer = extract_structured_answer(&raw)?;
        Ok(CaseExplanation {
            answer,
            sources: hits.iter().map(SourceAttribution::from_chunk).collect(),
        })
    }
}
