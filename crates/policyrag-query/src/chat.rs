//! Chat engines over the query pipeline.
//!
//! `condense_question` rewrites each follow-up into a standalone question
//! using the transcript before retrieving, so retrieval always sees full
//! context. `simple` answers from the transcript alone with no document
//! grounding.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use policyrag_core::error::Result;
use policyrag_core::traits::LanguageModel;

use crate::engine::{QueryEngine, SourceAttribution};
use crate::prompt::{condense_question_prompt, simple_chat_prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    CondenseQuestion,
    Simple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceAttribution>,
    /// The question retrieval actually ran on (after condensing), if any.
    pub standalone_question: Option<String>,
}

pub struct ChatEngine {
    llm: Arc<dyn LanguageModel>,
    engine: Option<QueryEngine>,
    mode: ChatMode,
    history: Vec<ChatTurn>,
}

impl ChatEngine {
    /// Document-grounded chat: follow-ups are condensed, then answered
    /// through the query engine.
    pub fn condense_question(llm: Arc<dyn LanguageModel>, engine: QueryEngine) -> Self {
        Self {
            llm,
            engine: Some(engine),
            mode: ChatMode::CondenseQuestion,
            history: Vec::new(),
        }
    }

    /// Ungrounded chat straight against the language model.
    pub fn simple(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            engine: None,
            mode: ChatMode::Simple,
            history: Vec::new(),
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub async fn chat(&mut self, message: &str) -> Result<ChatResponse> {
        info!(mode = ?self.mode, "chat turn");
        let response = match (&self.mode, &self.engine) {
            (ChatMode::CondenseQuestion, Some(engine)) => {
                let standalone = if self.history.is_empty() {
                    message.to_string()
                } else {
                    let transcript = self.transcript();
                    let condensed = self
                        .llm
                        .complete(&condense_question_prompt(&transcript, message))
                        .await?;
                    condensed.trim().to_string()
                };
                debug!(standalone = %standalone, "condensed question");
                let answered = engine.query(&standalone).await?;
                ChatResponse {
                    answer: answered.answer,
                    sources: answered.sources,
                    standalone_question: Some(standalone),
                }
            }
            _ => {
                let transcript = self.transcript();
                let answer = self
                    .llm
                    .complete(&simple_chat_prompt(&transcript, message))
                    .await?;
                ChatResponse {
                    answer,
                    sources: Vec::new(),
                    standalone_question: None,
                }
            }
        };
        self.history.push(ChatTurn {
            role: "user".to_string(),
            content: message.to_string(),
        });
        self.history.push(ChatTurn {
            role: "assistant".to_string(),
            content: response.answer.clone(),
        });
        Ok(response)
    }

    fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|turn| {
                let speaker = if turn.role == "user" { "Human" } else { "Assistant" };
                format!("{speaker}: {}", turn.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Persist the transcript as JSON for the CLI session.
    pub fn save_history(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.history)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Restore a transcript saved by `save_history`. A missing file leaves
    /// the history empty.
    pub fn load_history(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let json = std::fs::read_to_string(path)?;
        self.history = serde_json::from_str(&json)?;
        Ok(())
    }
}
