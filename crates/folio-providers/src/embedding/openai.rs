//! OpenAI embedding backend (hosted API)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use folio_core::{with_retry, EmbeddingProvider, Error, Progress, Result};

const API_URL: &str = "https://api.openai.com/v1/embeddings";
const DIMENSION: usize = 1536; // text-embedding-3-small

/// Inputs per batch request; large corpora are split into sub-batches
const MAX_BATCH_SIZE: usize = 100;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

/// Embeddings via the OpenAI API, which supports true batch calls
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiEmbedding {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn embed_inputs(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(API_URL)
            .bearer_auth(&self.api_key)
            .json(&EmbedRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Embedding(format!(
                "OpenAI error {}: {}",
                status, body
            )));
        }

        let data: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("OpenAI response parse failed: {}", e)))?;

        if data.data.len() != inputs.len() {
            return Err(Error::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                data.data.len(),
                inputs.len()
            )));
        }

        Ok(data.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_string()];
        let mut vectors = with_retry(|| self.embed_inputs(&input)).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::Embedding("OpenAI returned no embedding".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        on_progress: Progress<'_>,
    ) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());

        for (i, sub_batch) in texts.chunks(MAX_BATCH_SIZE).enumerate() {
            let vectors = with_retry(|| self.embed_inputs(sub_batch)).await?;
            embeddings.extend(vectors);

            if let Some(progress) = on_progress {
                let done = (i * MAX_BATCH_SIZE + sub_batch.len()).min(texts.len());
                progress(done, texts.len());
            }
        }

        Ok(embeddings)
    }
}
