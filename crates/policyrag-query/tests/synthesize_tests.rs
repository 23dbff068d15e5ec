use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use policyrag_core::error::Result;
use policyrag_core::traits::LanguageModel;
use policyrag_core::types::{DocKind, DocumentChunk, ResponseMode, ScoredChunk};
use policyrag_query::ResponseSynthesizer;

/// Records every prompt and replies with a canned answer per call.
struct ScriptedLm {
    calls: Mutex<Vec<String>>,
}

impl ScriptedLm {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLm {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(prompt.to_string());
        Ok(format!("answer #{}", calls.len()))
    }
}

fn hit(id: usize, content: &str) -> ScoredChunk {
    ScoredChunk {
        chunk: DocumentChunk {
            id: format!("doc:{id}"),
            doc_id: "doc".to_string(),
            doc_path: "/tmp/doc.txt".to_string(),
            kind: DocKind::Text,
            content: content.to_string(),
            chunk_index: id,
            total_chunks: 4,
            chunk_size: 512,
            chunk_overlap: 80,
        },
        score: 0.9,
        rank: id,
    }
}

fn four_hits() -> Vec<ScoredChunk> {
    vec![
        hit(0, "alpha alpha alpha alpha"),
        hit(1, "bravo bravo bravo bravo"),
        hit(2, "charlie charlie charlie"),
        hit(3, "delta delta delta delta"),
    ]
}

#[tokio::test]
async fn compact_packs_chunks_into_fewer_calls() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::Compact)
        .with_context_budget(60);
    synthesizer.synthesize("q", &four_hits()).await.unwrap();
    let compact_calls = lm.prompts().len();

    let lm_refine = ScriptedLm::new();
    let refine = ResponseSynthesizer::new(lm_refine.clone(), ResponseMode::Refine)
        .with_context_budget(60);
    refine.synthesize("q", &four_hits()).await.unwrap();

    assert!(compact_calls < lm_refine.prompts().len());
}

#[tokio::test]
async fn refine_makes_one_call_per_chunk() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::Refine);
    let answer = synthesizer.synthesize("q", &four_hits()).await.unwrap();

    let prompts = lm.prompts();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].contains("Context information is below"));
    for refine_prompt in &prompts[1..] {
        assert!(refine_prompt.contains("refine the existing answer"));
    }
    // The final answer is the last refinement.
    assert_eq!(answer, "answer #4");
}

#[tokio::test]
async fn refine_threads_the_running_answer_through() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::Refine);
    synthesizer.synthesize("q", &four_hits()).await.unwrap();
    let prompts = lm.prompts();
    assert!(prompts[1].contains("answer #1"));
    assert!(prompts[2].contains("answer #2"));
    assert!(prompts[3].contains("answer #3"));
}

#[tokio::test]
async fn tree_summarize_reduces_to_a_single_answer() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::TreeSummarize)
        .with_context_budget(30);
    let answer = synthesizer.synthesize("q", &four_hits()).await.unwrap();
    let prompts = lm.prompts();
    // Leaf round plus at least one reduction round.
    assert!(prompts.len() > 2);
    assert_eq!(answer, format!("answer #{}", prompts.len()));
}

#[tokio::test]
async fn single_chunk_needs_a_single_call_in_every_mode() {
    for mode in [
        ResponseMode::Compact,
        ResponseMode::Refine,
        ResponseMode::TreeSummarize,
    ] {
        let lm = ScriptedLm::new();
        let synthesizer = ResponseSynthesizer::new(lm.clone(), mode);
        synthesizer
            .synthesize("q", &[hit(0, "only chunk")])
            .await
            .unwrap();
        assert_eq!(lm.prompts().len(), 1, "mode {mode:?}");
    }
}

#[tokio::test]
async fn empty_retrieval_still_asks_the_model_once() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::Compact);
    synthesizer.synthesize("q", &[]).await.unwrap();
    let prompts = lm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("No relevant context was retrieved"));
}

#[tokio::test]
async fn the_query_appears_in_every_prompt() {
    let lm = ScriptedLm::new();
    let synthesizer = ResponseSynthesizer::new(lm.clone(), ResponseMode::Refine);
    synthesizer
        .synthesize("what is the maximum loan tenor?", &four_hits())
        .await
        .unwrap();
    for prompt in lm.prompts() {
        assert!(prompt.contains("what is the maximum loan tenor?"));
    }
}
