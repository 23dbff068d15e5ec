//! Strict extraction of the structured answer from model output.
//!
//! Models like to wrap the JSON object in commentary; the extractor takes
//! the largest top-level brace-delimited span (first `{` to last `}`),
//! parses it, and validates it against the answer schema, reporting every
//! failing field. Malformed output is always a hard failure: no semantic
//! repair, no best-effort coercion.

use serde_json::Value;

use policyrag_core::answer::{Decision, ReasonKind, StructuredAnswer};
use policyrag_core::error::{RagError, Result};

/// The largest top-level JSON object substring, or `NoJsonFound`.
pub fn extract_json_span(text: &str) -> Result<&str> {
    let start = text.find('{').ok_or(RagError::NoJsonFound)?;
    let end = text.rfind('}').ok_or(RagError::NoJsonFound)?;
    if end < start {
        return Err(RagError::NoJsonFound);
    }
    Ok(&text[start..=end])
}

/// Extract, parse and validate a structured answer.
pub fn extract_structured_answer(text: &str) -> Result<StructuredAnswer> {
    let span = extract_json_span(text)?;
    let value: Value =
        serde_json::from_str(span).map_err(|e| RagError::MalformedJson(e.to_string()))?;
    let violations = validate(&value);
    if !violations.is_empty() {
        return Err(RagError::SchemaViolation { violations });
    }
    serde_json::from_value(value).map_err(|e| RagError::SchemaViolation {
        violations: vec![e.to_string()],
    })
}

/// Collect every schema violation in the candidate object.
fn validate(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    let Some(object) = value.as_object() else {
        return vec!["root: must be a JSON object".to_string()];
    };

    match object.get("summary") {
        Some(Value::String(_)) => {}
        Some(_) => violations.push("summary: must be a string".to_string()),
        None => violations.push("summary: required field is missing".to_string()),
    }

    match object.get("decision") {
        Some(Value::String(decision)) => {
            if !Decision::ALLOWED.contains(&decision.as_str()) {
                violations.push(format!(
                    "decision: must be one of {} (got \"{decision}\")",
                    Decision::ALLOWED.join("|")
                ));
            }
        }
        Some(_) => violations.push("decision: must be a string".to_string()),
        None => violations.push("decision: required field is missing".to_string()),
    }

    match object.get("reasons") {
        Some(Value::Array(reasons)) => {
            for (i, reason) in reasons.iter().enumerate() {
                validate_reason(reason, i, &mut violations);
            }
        }
        Some(_) => violations.push("reasons: must be an array".to_string()),
        None => violations.push("reasons: required field is missing".to_string()),
    }

    for field in ["missing_info", "next_actions"] {
        match object.get(field) {
            None => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        violations.push(format!("{field}[{i}]: must be a string"));
                    }
                }
            }
            Some(_) => violations.push(format!("{field}: must be an array of strings")),
        }
    }

    for field in ["customer_message_draft", "risk_note"] {
        if let Some(item) = object.get(field) {
            if !item.is_string() && !item.is_null() {
                violations.push(format!("{field}: must be a string or null"));
            }
        }
    }

    violations
}

fn validate_reason(reason: &Value, index: usize, violations: &mut Vec<String>) {
    let Some(object) = reason.as_object() else {
        violations.push(format!("reasons[{index}]: must be an object"));
        return;
    };
    match object.get("type") {
        Some(Value::String(kind)) => {
            if !ReasonKind::ALLOWED.contains(&kind.as_str()) {
                violations.push(format!(
                    "reasons[{index}].type: must be one of {} (got \"{kind}\")",
                    ReasonKind::ALLOWED.join("|")
                ));
            }
        }
        Some(_) => violations.push(format!("reasons[{index}].type: must be a string")),
        None => violations.push(format!("reasons[{index}].type: required field is missing")),
    }
    match object.get("text") {
        Some(Value::String(_)) => {}
        Some(_) => violations.push(format!("reasons[{index}].text: must be a string")),
        None => violations.push(format!("reasons[{index}].text: required field is missing")),
    }
    match object.get("evidence") {
        None => {}
        Some(Value::Array(items)) => {
            for (j, item) in items.iter().enumerate() {
                let Some(evidence) = item.as_object() else {
                    violations.push(format!("reasons[{index}].evidence[{j}]: must be an object"));
                    continue;
                };
                match evidence.get("doc_title") {
                    Some(Value::String(_)) => {}
                    Some(_) => violations.push(format!(
                        "reasons[{index}].evidence[{j}].doc_title: must be a string"
                    )),
                    None => violations.push(format!(
                        "reasons[{index}].evidence[{j}].doc_title: required field is missing"
                    )),
                }
                if let Some(page) = evidence.get("page") {
                    if !page.is_i64() && !page.is_u64() && !page.is_null() {
                        violations.push(format!(
                            "reasons[{index}].evidence[{j}].page: must be an integer or null"
                        ));
                    }
                }
                for optional in ["version", "section"] {
                    if let Some(v) = evidence.get(optional) {
                        if !v.is_string() && !v.is_null() {
                            violations.push(format!(
                                "reasons[{index}].evidence[{j}].{optional}: must be a string or null"
                            ));
                        }
                    }
                }
            }
        }
        Some(_) => violations.push(format!("reasons[{index}].evidence: must be an array")),
    }
}
