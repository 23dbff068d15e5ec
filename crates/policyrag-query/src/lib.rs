//! policyrag-query
//!
//! Query-time half of the pipeline: retrieval with a similarity cutoff,
//! response synthesis against the language-model boundary, strict
//! structured-answer extraction, chat engines and query suggestions.

pub mod chat;
pub mod engine;
pub mod extract;
pub mod prompt;
pub mod retriever;
pub mod suggest;
pub mod synthesize;

pub use chat::{ChatEngine, ChatMode, ChatTurn};
pub use engine::{CaseAssistant, CaseExplanation, QueryEngine, QueryResponse, SourceAttribution};
pub use extract::extract_structured_answer;
pub use retriever::Retriever;
pub use synthesize::ResponseSynthesizer;
