//! HTTP provider clients against a local one-shot responder

use loglens::agent::{output_schema, ChatMessage, LanguageModel, OpenAiChatModel};
use loglens::config::{Credentials, EmbeddingsSection, LlmSection};
use loglens::embeddings::{EmbeddingEngine, OpenAiEmbedder};
use loglens::{Error, ProviderError};
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;

/// What the responder saw
struct CapturedRequest {
    method: String,
    path: String,
    authorization: Option<String>,
    body: Value,
}

/// Serve exactly one HTTP response and report the request that produced it
fn serve_once(status: u16, body: Value) -> (String, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let captured = loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);

            let mut headers = [httparse::EMPTY_HEADER; 32];
            let mut request = httparse::Request::new(&mut headers);
            let Ok(httparse::Status::Complete(header_len)) = request.parse(&buf) else {
                continue;
            };

            let header = |name: &str| {
                request
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .map(|h| String::from_utf8_lossy(h.value).to_string())
            };
            let content_length: usize = header("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            if buf.len() < header_len + content_length {
                continue;
            }

            break CapturedRequest {
                method: request.method.unwrap_or_default().to_string(),
                path: request.path.unwrap_or_default().to_string(),
                authorization: header("authorization"),
                body: serde_json::from_slice(&buf[header_len..header_len + content_length])
                    .unwrap_or(Value::Null),
            };
        };

        let payload = body.to_string();
        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            payload.len(),
            payload
        );
        stream.write_all(response.as_bytes()).unwrap();
        let _ = tx.send(captured);
    });

    (base_url, rx)
}

fn embeddings_config(base_url: &str, dimensions: usize) -> EmbeddingsSection {
    EmbeddingsSection {
        base_url: base_url.to_string(),
        dimensions,
        timeout_secs: 5,
        ..Default::default()
    }
}

fn llm_config(base_url: &str) -> LlmSection {
    LlmSection {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    }
}

#[test]
fn test_embeddings_request_and_reordering() {
    let (base_url, rx) = serve_once(
        200,
        json!({
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0, 0.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0, 0.0]}
            ],
            "model": "text-embedding-ada-002"
        }),
    );

    let mut embedder =
        OpenAiEmbedder::new(&embeddings_config(&base_url, 3), Credentials::new("sk-test")).unwrap();
    let vectors = embedder
        .embed_batch(&["first".to_string(), "second".to_string()])
        .unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]);

    let request = rx.recv().unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/v1/embeddings");
    assert_eq!(request.authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(request.body["model"], "text-embedding-ada-002");
    assert_eq!(request.body["input"], json!(["first", "second"]));
    assert!(request.body.get("dimensions").is_none());
}

#[test]
fn test_resizable_model_requests_configured_dimensions() {
    let (base_url, rx) = serve_once(
        200,
        json!({"data": [{"index": 0, "embedding": [0.6, 0.8]}]}),
    );

    let config = EmbeddingsSection {
        model: "text-embedding-3-small".to_string(),
        ..embeddings_config(&base_url, 2)
    };
    let mut embedder = OpenAiEmbedder::new(&config, Credentials::new("sk-test")).unwrap();
    assert_eq!(embedder.embed("hello").unwrap(), vec![0.6, 0.8]);

    let request = rx.recv().unwrap();
    assert_eq!(request.body["model"], "text-embedding-3-small");
    assert_eq!(request.body["dimensions"], 2);
}

#[test]
fn test_embeddings_wrong_dimension_is_invalid_response() {
    let (base_url, _rx) = serve_once(
        200,
        json!({"data": [{"index": 0, "embedding": [1.0, 0.0]}]}),
    );

    let mut embedder =
        OpenAiEmbedder::new(&embeddings_config(&base_url, 3), Credentials::new("sk-test")).unwrap();
    let err = embedder.embed("hello").unwrap_err();
    assert!(matches!(
        err,
        Error::Provider(ProviderError::InvalidResponse(_))
    ));
}

#[test]
fn test_unauthorized_is_authentication_error() {
    let (base_url, _rx) = serve_once(
        401,
        json!({"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}),
    );

    let mut embedder =
        OpenAiEmbedder::new(&embeddings_config(&base_url, 3), Credentials::new("bad")).unwrap();
    match embedder.embed("hello") {
        Err(Error::Provider(ProviderError::Authentication(message))) => {
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[test]
fn test_rate_limit_is_classified() {
    let (base_url, _rx) = serve_once(429, json!({"error": {"message": "slow down"}}));

    let model = OpenAiChatModel::new(&llm_config(&base_url), Credentials::new("sk-test")).unwrap();
    let err = model
        .complete(&[ChatMessage::user("hi")], &output_schema())
        .unwrap_err();
    assert_eq!(err, ProviderError::RateLimited("slow down".into()));
}

#[test]
fn test_chat_completion_sends_schema() {
    let (base_url, rx) = serve_once(
        200,
        json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "{\"answer\":\"ok\",\"relevant_logs\":[],\"total_logs_analyzed\":1}"},
                "finish_reason": "stop"
            }]
        }),
    );

    let model = OpenAiChatModel::new(&llm_config(&base_url), Credentials::new("sk-test")).unwrap();
    let content = model
        .complete(
            &[ChatMessage::system("sys"), ChatMessage::user("question")],
            &output_schema(),
        )
        .unwrap();
    assert!(content.contains("\"answer\":\"ok\""));

    let request = rx.recv().unwrap();
    assert_eq!(request.path, "/v1/chat/completions");
    assert_eq!(request.body["model"], "gpt-4o");
    assert_eq!(request.body["messages"][0]["role"], "system");
    assert_eq!(request.body["messages"][1]["content"], "question");
    assert_eq!(request.body["response_format"]["type"], "json_schema");
    assert_eq!(
        request.body["response_format"]["json_schema"]["name"],
        "log_analysis_response"
    );
}

#[test]
fn test_unreachable_host_is_network_error() {
    // Nothing listens on the discard port
    let config = llm_config("http://127.0.0.1:9/v1");
    let model = OpenAiChatModel::new(&config, Credentials::new("sk-test")).unwrap();

    let err = model
        .complete(&[ChatMessage::user("hi")], &output_schema())
        .unwrap_err();
    assert!(
        matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)),
        "got {:?}",
        err
    );
}
