//! Prompt templates for the language-model boundary.

use serde_json::Value;

/// Contract for the structured underwriting answer. The model must reply
/// with only a JSON object in the documented schema, must not invent policy
/// thresholds, and must prefer `need_more_info`/`review` over fabrication
/// when evidence is absent.
pub const STRUCTURED_ANSWER_INSTRUCTIONS: &str = r#"You are a Credit Underwriting Assistant.
You MUST answer ONLY in valid JSON matching this schema:
{
  "summary": string,
  "decision": "approve"|"decline"|"need_more_info"|"review",
  "reasons": [{"type":"rule"|"model"|"policy","text":string,"evidence":[{"doc_title":string,"version":string|null,"section":string|null,"page":number|null}]}],
  "missing_info": [string],
  "next_actions": [string],
  "customer_message_draft": string|null,
  "risk_note": string|null
}

Rules:
- Do NOT invent policy thresholds. If not found, say need_more_info or review and explain what is missing.
- Reasons must be consistent with provided decision_json.
- Evidence must cite retrieved documents when referencing policies or rules. If no evidence, leave evidence=[] and avoid quoting numbers."#;

/// Full prompt for explaining one case, combining the schema contract, the
/// upstream decision payload and the user's question.
pub fn structured_case_prompt(question: &str, decision_json: &Value) -> String {
    format!(
        "{STRUCTURED_ANSWER_INSTRUCTIONS}\n\ndecision_json:\n{decision_json}\n\nUser question:\n{question}\n"
    )
}

/// First-pass answer over a context block.
pub fn context_answer_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {query}\n\
         Answer:"
    )
}

/// Refinement pass: fold additional context into an existing answer without
/// changing its required format.
pub fn refine_prompt(query: &str, existing_answer: &str, context: &str) -> String {
    format!(
        "The original query is as follows: {query}\n\
         We have provided an existing answer: {existing_answer}\n\
         We have the opportunity to refine the existing answer with some more context below.\n\
         ---------------------\n\
         {context}\n\
         ---------------------\n\
         Given the new context, refine the original answer to better answer the query, \
         keeping the required answer format. If the context isn't useful, return the \
         existing answer unchanged.\n\
         Refined Answer:"
    )
}

/// Rewrite a follow-up message into a standalone question using the
/// conversation so far.
pub fn condense_question_prompt(transcript: &str, follow_up: &str) -> String {
    format!(
        "Given a conversation (between Human and Assistant) and a follow up message from \
         Human, rewrite the message to be a standalone question that captures all relevant \
         context from the conversation.\n\n\
         <Chat History>\n\
         {transcript}\n\n\
         <Follow Up Message>\n\
         {follow_up}\n\n\
         <Standalone question>"
    )
}

/// Transcript answer prompt for ungrounded chat.
pub fn simple_chat_prompt(transcript: &str, message: &str) -> String {
    format!(
        "You are a helpful assistant. Continue the conversation.\n\n\
         <Chat History>\n\
         {transcript}\n\n\
         Human: {message}\n\
         Assistant:"
    )
}

/// Ask for query suggestions on a topic, one per line.
pub fn suggestions_prompt(topic: &str, count: usize) -> String {
    format!(
        "Based on the topic \"{topic}\", generate {count} specific and useful questions \
         that would be good for querying a document database. Make the questions specific \
         and actionable.\n\n\
         Format each question on a new line."
    )
}

/// Context placeholder when retrieval returned nothing above the cutoff.
pub const NO_CONTEXT_BLOCK: &str =
    "No relevant context was retrieved from the document corpus for this query.";
