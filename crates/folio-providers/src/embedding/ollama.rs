//! Ollama embedding backend (local model server)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use folio_core::{with_retry, EmbeddingProvider, Error, Progress, Result};

const DIMENSION: usize = 768; // nomic-embed-text

/// Delay between sequential calls so a local server isn't flooded
const PACING_MS: u64 = 50;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Embeddings via a local Ollama server. No native batch endpoint, so
/// `embed_batch` issues paced sequential calls.
pub struct OllamaEmbedding {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedding {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            model,
        })
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&EmbedRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Embedding(format!(
                "Ollama error: {}",
                response.status()
            )));
        }

        let data: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Ollama response parse failed: {}", e)))?;

        Ok(data.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedding {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        with_retry(|| self.embed_once(text)).await
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        on_progress: Progress<'_>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, text) in texts.iter().enumerate() {
            embeddings.push(self.embed(text).await?);

            if let Some(progress) = on_progress {
                progress(i + 1, texts.len());
            }
            if i + 1 < texts.len() {
                tokio::time::sleep(Duration::from_millis(PACING_MS)).await;
            }
        }

        Ok(embeddings)
    }
}
