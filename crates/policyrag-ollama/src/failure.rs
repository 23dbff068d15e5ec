//! Translation of transport failures into the closed error taxonomy.
//!
//! Every error a reqwest call can produce is classified here; nothing below
//! this layer reaches callers as a raw socket or HTTP error. Messages name
//! the configured endpoint and the next diagnostic step. Credentials never
//! appear: the detail string is taken from the error with its URL stripped,
//! and only the bare endpoint is echoed back.

use policyrag_core::error::RagError;
use reqwest::StatusCode;

/// Classify a failed request. Total over the reqwest error surface.
pub fn translate_request_error(err: reqwest::Error, endpoint: &str, timeout_secs: u64) -> RagError {
    if err.is_timeout() {
        return RagError::ServiceTimeout {
            endpoint: endpoint.to_string(),
            seconds: timeout_secs,
        };
    }
    if err.is_connect() {
        return RagError::ServiceUnreachable {
            endpoint: endpoint.to_string(),
        };
    }
    RagError::UnknownServiceFailure {
        detail: err.without_url().to_string(),
    }
}

/// Classify a non-success HTTP status from a model endpoint. 404 means the
/// named model is not available on the server.
pub fn translate_status(status: StatusCode, endpoint: &str, model: &str) -> RagError {
    if status == StatusCode::NOT_FOUND {
        return RagError::ModelNotFound {
            model: model.to_string(),
        };
    }
    RagError::ServiceError {
        status: status.as_u16(),
        endpoint: endpoint.to_string(),
    }
}

/// Classify a response-body decode failure.
pub fn translate_decode_error(err: reqwest::Error) -> RagError {
    RagError::UnknownServiceFailure {
        detail: format!("unexpected response body: {}", err.without_url()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_model() {
        let err = translate_status(StatusCode::NOT_FOUND, "http://localhost:11434", "qwen3:8b");
        match err {
            RagError::ModelNotFound { model } => assert_eq!(model, "qwen3:8b"),
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn other_statuses_report_code_and_endpoint() {
        let err = translate_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "http://localhost:11434",
            "qwen3:8b",
        );
        match err {
            RagError::ServiceError { status, endpoint } => {
                assert_eq!(status, 500);
                assert_eq!(endpoint, "http://localhost:11434");
            }
            other => panic!("expected ServiceError, got {other:?}"),
        }
    }

    #[test]
    fn messages_name_a_diagnostic_step() {
        let unreachable = RagError::ServiceUnreachable {
            endpoint: "http://localhost:11434".to_string(),
        };
        assert!(unreachable.to_string().contains("verify it is running"));

        let timeout = RagError::ServiceTimeout {
            endpoint: "http://localhost:11434".to_string(),
            seconds: 120,
        };
        assert!(timeout.to_string().contains("retry"));
    }
}
