//! Response synthesis: folding retrieved chunks into one model answer.
//!
//! The mode decides how many model calls are made and how context is packed;
//! it never changes the expected answer format. The language-model trait is
//! the single point where the external capability is invoked, so every
//! transport failure arrives here already translated.

use std::sync::Arc;

use tracing::debug;

use policyrag_core::error::Result;
use policyrag_core::traits::LanguageModel;
use policyrag_core::types::{ResponseMode, ScoredChunk};

use crate::prompt::{context_answer_prompt, refine_prompt, NO_CONTEXT_BLOCK};

/// Character budget for one packed context block. Roughly tracks a
/// few-thousand-token prompt window with room for instructions.
pub const DEFAULT_CONTEXT_CHARS: usize = 12_000;

pub struct ResponseSynthesizer {
    llm: Arc<dyn LanguageModel>,
    mode: ResponseMode,
    context_chars: usize,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LanguageModel>, mode: ResponseMode) -> Self {
        Self {
            llm,
            mode,
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }

    /// Override the per-block context budget (mainly for tests).
    pub fn with_context_budget(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars.max(1);
        self
    }

    pub fn mode(&self) -> ResponseMode {
        self.mode
    }

    /// Produce one answer text for `query` from the retrieved chunks.
    pub async fn synthesize(&self, query: &str, chunks: &[ScoredChunk]) -> Result<String> {
        if chunks.is_empty() {
            let prompt = context_answer_prompt(NO_CONTEXT_BLOCK, query);
            return self.llm.complete(&prompt).await;
        }
        let texts: Vec<&str> = chunks.iter().map(|c| c.chunk.content.as_str()).collect();
        match self.mode {
            ResponseMode::Compact => {
                let blocks = pack_blocks(&texts, self.context_chars);
                self.answer_then_refine(query, &blocks).await
            }
            ResponseMode::Refine => {
                let blocks: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
                self.answer_then_refine(query, &blocks).await
            }
            ResponseMode::TreeSummarize => self.tree_summarize(query, &texts).await,
        }
    }

    /// Answer with the first block, then fold each remaining block into the
    /// running answer.
    async fn answer_then_refine(&self, query: &str, blocks: &[String]) -> Result<String> {
        debug!(blocks = blocks.len(), mode = ?self.mode, "synthesizing");
        let mut answer = self
            .llm
            .complete(&context_answer_prompt(&blocks[0], query))
            .await?;
        for block in &blocks[1..] {
            answer = self
                .llm
                .complete(&refine_prompt(query, &answer, block))
                .await?;
        }
        Ok(answer)
    }

    /// Reduce groupwise: answer per pack, then treat the intermediate
    /// answers as new context until one remains.
    async fn tree_summarize(&self, query: &str, texts: &[&str]) -> Result<String> {
        let mut layer: Vec<String> = {
            let packs = pack_blocks(texts, self.context_chars);
            let mut answers = Vec::with_capacity(packs.len());
            for pack in &packs {
                answers.push(
                    self.llm
                        .complete(&context_answer_prompt(pack, query))
                        .await?,
                );
            }
            answers
        };
        while layer.len() > 1 {
            let refs: Vec<&str> = layer.iter().map(String::as_str).collect();
            let packs = pack_blocks_min_two(&refs, self.context_chars);
            let mut next = Vec::with_capacity(packs.len());
            for pack in &packs {
                next.push(
                    self.llm
                        .complete(&context_answer_prompt(pack, query))
                        .await?,
                );
            }
            if next.len() >= layer.len() {
                // Budget too small to reduce further; fall back to folding.
                return self.answer_then_refine(query, &layer).await;
            }
            layer = next;
        }
        Ok(layer.remove(0))
    }
}

/// Greedily pack texts into the fewest blocks fitting the budget. A single
/// text longer than the budget gets its own block.
fn pack_blocks(texts: &[&str], budget: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    for text in texts {
        let sep = if current.is_empty() { 0 } else { 2 };
        if !current.is_empty() && current.len() + sep + text.len() > budget {
            blocks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(text);
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Pack with at least two texts per block so every reduction round shrinks
/// the layer, regardless of budget.
fn pack_blocks_min_two(texts: &[&str], budget: usize) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    let mut members = 0usize;
    for text in texts {
        if members >= 2 && current.len() + 2 + text.len() > budget {
            blocks.push(std::mem::take(&mut current));
            members = 0;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(text);
        members += 1;
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}
