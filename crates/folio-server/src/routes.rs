//! HTTP handlers
//!
//! Three endpoints: the public `/chat` (JSON or SSE), the `/health`
//! probe, and the administrative `/ingest`. All errors come back as
//! `{ "error": ... }` with a status that distinguishes caller mistakes
//! from upstream outages.

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio_stream::wrappers::UnboundedReceiverStream;

use folio_core::{ChatMessage, DocumentKind, Error, LoadedDocument};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    documents: Vec<IngestDocument>,
}

#[derive(Debug, Deserialize)]
pub struct IngestDocument {
    path: String,
    content: String,
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn error_response(err: &Error) -> Response {
    let status = if err.is_upstream() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    tracing::error!(step = err.step(), error = %err, "request failed");
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

/// Rate-limit key: proxy-reported client first, then the peer address
fn client_key(headers: &HeaderMap, peer: Option<&SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|a| a.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "provider": state.engine.provider_name(),
    }))
}

pub async fn chat(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let key = client_key(&headers, connect_info.as_ref().map(|c| &c.0));
    if !state.limiter.check(&key) {
        tracing::warn!(client = %key, "rate limited");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": "Too many requests, slow down." })),
        )
            .into_response();
    }

    // Bodies that fail to parse (unknown roles included) are the
    // caller's mistake, not a server error
    let Json(request) = match payload {
        Ok(json) => json,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "malformed chat request");
            return bad_request("malformed request body");
        }
    };

    let message = request.message.trim();
    if message.is_empty() {
        return bad_request("message must not be empty");
    }
    if message.chars().count() > state.limits.max_message_length {
        return bad_request("message is too long");
    }
    if request.history.len() > state.limits.max_history_length {
        return bad_request("history is too long");
    }

    if request.stream {
        return chat_stream(state, request.message, request.history);
    }

    match state.engine.answer(&request.message, &request.history).await {
        Ok(response) => Json(json!({ "response": response })).into_response(),
        Err(err) => error_response(&err),
    }
}

/// SSE stream of `{ "text": ... }` events, terminated by a `[DONE]`
/// sentinel. The pipeline runs in a spawned task; failures after the
/// stream has started are reported as an in-band error event.
fn chat_stream(state: AppState, message: String, history: Vec<ChatMessage>) -> Response {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    tokio::spawn(async move {
        let sender = tx.clone();
        let mut on_chunk = move |chunk: &str| {
            let _ = sender.send(Event::default().data(json!({ "text": chunk }).to_string()));
        };
        let result = state
            .engine
            .answer_stream(&message, &history, &mut on_chunk)
            .await;
        if let Err(err) = result {
            tracing::error!(step = err.step(), error = %err, "stream failed");
            let _ = tx.send(Event::default().data(json!({ "error": err.to_string() }).to_string()));
        }
        let _ = tx.send(Event::default().data("[DONE]"));
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<Event, std::convert::Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

fn kind_for_path(path: &str) -> DocumentKind {
    match std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("md") | Some("markdown") => DocumentKind::Markdown,
        Some("pdf") => DocumentKind::Pdf,
        Some("docx") => DocumentKind::Docx,
        _ => DocumentKind::Text,
    }
}

pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Response {
    if request.documents.is_empty() {
        return bad_request("documents must not be empty");
    }

    let documents: Vec<LoadedDocument> = request
        .documents
        .into_iter()
        .map(|d| LoadedDocument {
            kind: kind_for_path(&d.path),
            filename: d.path,
            content: d.content,
        })
        .collect();

    match state.ingestor.run(&documents, None).await {
        Ok(report) => Json(json!({
            "documents": report.documents,
            "chunks": report.chunks,
            "records": report.records,
            "approxBytes": report.approx_bytes,
        }))
        .into_response(),
        Err(err) => error_response(&err),
    }
}
