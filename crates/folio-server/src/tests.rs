use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use folio_core::{
    ChatMessage, ChatProvider, ChunkingConfig, EmbeddingProvider, Error, OnChunk, Progress,
    RateLimitConfig, Result, ServerConfig,
};
use folio_rag::{Ingestor, MemoryVectorStore, RagChat};

use crate::{AppState, RateLimiter, RequestLimits};

struct FakeEmbedding {
    fail: bool,
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedding {
    fn name(&self) -> &'static str {
        "fake"
    }
    fn dimension(&self) -> usize {
        3
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(Error::Embedding("connection refused".into()));
        }
        Ok(vec![1.0, 0.0, 0.0])
    }
    async fn embed_batch(
        &self,
        texts: &[String],
        _on_progress: Progress<'_>,
    ) -> Result<Vec<Vec<f32>>> {
        if self.fail {
            return Err(Error::Embedding("connection refused".into()));
        }
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
    }
}

struct FakeChat {
    fail: bool,
}

#[async_trait]
impl ChatProvider for FakeChat {
    fn name(&self) -> &'static str {
        "fake"
    }
    async fn generate(
        &self,
        _system: &str,
        _history: &[ChatMessage],
        _user: &str,
    ) -> Result<String> {
        if self.fail {
            return Err(Error::Chat(
                "Anthropic error 401 Unauthorized: invalid x-api-key".into(),
            ));
        }
        Ok("hello from the model".to_string())
    }
    async fn generate_stream(
        &self,
        _system: &str,
        _history: &[ChatMessage],
        _user: &str,
        on_chunk: OnChunk<'_>,
    ) -> Result<()> {
        if self.fail {
            return Err(Error::Chat(
                "Anthropic error 401 Unauthorized: invalid x-api-key".into(),
            ));
        }
        on_chunk("hello");
        Ok(())
    }
}

fn app_with(embedding_fails: bool, chat_fails: bool, max_requests: usize) -> Router {
    let embeddings = Arc::new(FakeEmbedding {
        fail: embedding_fails,
    });
    let store = Arc::new(MemoryVectorStore::ephemeral());
    let engine = Arc::new(RagChat::new(
        embeddings.clone(),
        store.clone(),
        Arc::new(FakeChat { fail: chat_fails }),
        5,
        "Ada Example",
    ));
    let ingestor = Arc::new(Ingestor::new(
        embeddings,
        store,
        ChunkingConfig {
            chunk_size: 500,
            overlap: 100,
        },
    ));
    let state = AppState {
        engine,
        ingestor,
        limiter: Arc::new(RateLimiter::new(&RateLimitConfig {
            window_ms: 60_000,
            max_requests,
        })),
        limits: RequestLimits {
            max_message_length: 2000,
            max_history_length: 50,
        },
    };
    crate::router(
        state,
        &ServerConfig {
            bind_addr: "127.0.0.1:0".into(),
            allowed_origins: Vec::new(),
        },
    )
}

fn app() -> Router {
    app_with(false, false, 10)
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "1.2.3.4")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_provider() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "fake");
}

#[tokio::test]
async fn test_chat_happy_path() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "What do you work on?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["response"], "hello from the model");
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_rejects_oversized_message() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "x".repeat(2001) })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("too long"));
}

#[tokio::test]
async fn test_chat_rejects_oversized_history() {
    let history: Vec<Value> = (0..51)
        .map(|i| json!({ "role": if i % 2 == 0 { "user" } else { "assistant" }, "content": "x" }))
        .collect();
    let response = app()
        .oneshot(chat_request(json!({ "message": "hi", "history": history })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_eleventh_request_is_rate_limited() {
    let app = app();
    for _ in 0..10 {
        let response = app
            .clone()
            .oneshot(chat_request(json!({ "message": "hi there" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app
        .oneshot(chat_request(json!({ "message": "hi there" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_upstream_outage_maps_to_503() {
    let response = app_with(true, false, 10)
        .oneshot(chat_request(json!({ "message": "hi there" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_chat_backend_failure_never_reaches_client() {
    let response = app_with(false, true, 10)
        .oneshot(chat_request(json!({ "message": "hi there" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("temporarily unavailable"), "{message}");
    assert!(!message.contains("401"), "{message}");
    assert!(!message.contains("Anthropic"), "{message}");
}

#[tokio::test]
async fn test_chat_rejects_unknown_history_role() {
    let response = app()
        .oneshot(chat_request(json!({
            "message": "hi",
            "history": [{ "role": "wizard", "content": "x" }]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_streamed_chat_ends_with_done() {
    let response = app()
        .oneshot(chat_request(json!({ "message": "hi", "stream": true })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8(bytes.to_vec()).unwrap();
    let hello = body.find(r#"data: {"text":"hello"}"#).unwrap();
    let done = body.find("data: [DONE]").unwrap();
    assert!(hello < done);
}

#[tokio::test]
async fn test_ingest_reports_counts() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "documents": [{
                            "path": "_projects/folio.md",
                            "content": "---\ntitle: Folio\n---\nA portfolio chat assistant \
                                        project with enough text to produce a chunk."
                        }]
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["records"], 1);
    assert_eq!(body["documents"][0]["chunks"], 1);
}

#[tokio::test]
async fn test_ingest_rejects_empty_payload() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ingest")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "documents": [] }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
