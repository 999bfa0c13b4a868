//! HTTP surface for the folio chat pipeline
//!
//! A small axum app around the RAG engine: `/chat` for visitors,
//! `/health` for probes, `/ingest` for corpus administration. The server
//! keeps no conversation state; clients resend their history on every
//! request.

mod rate_limit;
mod routes;

#[cfg(test)]
mod tests;

pub use rate_limit::RateLimiter;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use folio_core::{ChatConfig, Result, ServerConfig};
use folio_rag::{Ingestor, RagChat};
use tower_http::cors::{Any, CorsLayer};

/// Per-request validation limits, lifted out of the chat config
#[derive(Debug, Clone)]
pub struct RequestLimits {
    pub max_message_length: usize,
    pub max_history_length: usize,
}

impl From<&ChatConfig> for RequestLimits {
    fn from(config: &ChatConfig) -> Self {
        Self {
            max_message_length: config.max_message_length,
            max_history_length: config.max_history_length,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RagChat>,
    pub ingestor: Arc<Ingestor>,
    pub limiter: Arc<RateLimiter>,
    pub limits: RequestLimits,
}

/// Cross-origin policy from the configured allow-list; an empty list
/// means a local setup and allows any origin
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    layer.allow_origin(origins)
}

pub fn router(state: AppState, server_config: &ServerConfig) -> Router {
    Router::new()
        .route("/chat", post(routes::chat))
        .route("/health", get(routes::health))
        .route("/ingest", post(routes::ingest))
        .layer(cors_layer(&server_config.allowed_origins))
        .with_state(state)
}

/// Bind and serve until the task is aborted
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let app = router(state, config);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "folio server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
