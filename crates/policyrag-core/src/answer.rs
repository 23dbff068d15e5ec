//! The schema-validated decision object produced at the end of the pipeline.
//!
//! A credit decision must never be inferred from malformed data: parsing and
//! validation of model output against these types is strict, and partial or
//! best-effort answers are rejected upstream.

use serde::{Deserialize, Serialize};

/// Final routing decision for a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approve,
    Decline,
    NeedMoreInfo,
    Review,
}

impl Decision {
    /// Accepted wire values, used in validation messages.
    pub const ALLOWED: [&'static str; 4] = ["approve", "decline", "need_more_info", "review"];
}

/// Origin of a reason: a hard rule, the statistical model, or a written
/// policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonKind {
    Rule,
    Model,
    Policy,
}

impl ReasonKind {
    pub const ALLOWED: [&'static str; 3] = ["rule", "model", "policy"];
}

/// A citation into the retrieved document set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub doc_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reason {
    #[serde(rename = "type")]
    pub kind: ReasonKind,
    pub text: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

/// The validated answer object. Field names are the wire format the model
/// is instructed to emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    pub summary: String,
    pub decision: Decision,
    pub reasons: Vec<Reason>,
    #[serde(default)]
    pub missing_info: Vec<String>,
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_message_draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_wire_names_are_snake_case() {
        let json = serde_json::to_string(&Decision::NeedMoreInfo).unwrap();
        assert_eq!(json, "\"need_more_info\"");
        let back: Decision = serde_json::from_str("\"review\"").unwrap();
        assert_eq!(back, Decision::Review);
    }

    #[test]
    fn answer_round_trips_with_optional_fields_absent() {
        let answer = StructuredAnswer {
            summary: "thin file, income unverified".to_string(),
            decision: Decision::NeedMoreInfo,
            reasons: vec![Reason {
                kind: ReasonKind::Policy,
                text: "income documents missing".to_string(),
                evidence: vec![],
            }],
            missing_info: vec!["payslips".to_string()],
            next_actions: vec![],
            customer_message_draft: None,
            risk_note: None,
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert!(json.get("customer_message_draft").is_none());
        let back: StructuredAnswer = serde_json::from_value(json).unwrap();
        assert_eq!(back, answer);
    }
}
