use std::net::TcpListener;
use std::time::Duration;

use policyrag_core::error::RagError;
use policyrag_ollama::OllamaClient;

/// Bind then drop a listener so the port is free but nothing accepts on it.
fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

#[tokio::test]
async fn connection_refused_surfaces_as_service_unreachable() {
    let endpoint = refused_endpoint();
    let client = OllamaClient::new(&endpoint).unwrap();
    let err = client
        .generate("qwen3:8b", "hello", Duration::from_secs(5))
        .await
        .unwrap_err();
    match err {
        RagError::ServiceUnreachable { endpoint: reported } => {
            assert_eq!(reported, endpoint);
        }
        other => panic!("expected ServiceUnreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn embedding_failures_use_the_same_taxonomy() {
    let endpoint = refused_endpoint();
    let client = OllamaClient::new(&endpoint).unwrap();
    let err = client
        .embed("bge-m3", &["text".to_string()], Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::ServiceUnreachable { .. }));
}

#[tokio::test]
async fn error_messages_do_not_leak_raw_transport_details() {
    let endpoint = refused_endpoint();
    let client = OllamaClient::new(&endpoint).unwrap();
    let err = client
        .generate("qwen3:8b", "hello", Duration::from_secs(5))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("verify it is running"));
    assert!(!message.to_lowercase().contains("os error"));
}
