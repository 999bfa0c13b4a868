//! Supabase pgvector store
//!
//! Talks to the PostgREST API of a Supabase project. The `documents`
//! table holds id, content, metadata, and an `embedding` vector column;
//! similarity search goes through the `match_documents` SQL function so
//! the distance math runs next to the data.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

use folio_core::{ChunkRecord, Error, Progress, Result, SearchResult, VectorStore};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SupabaseVectorStore {
    client: reqwest::Client,
    base_url: String,
    key: String,
    threshold: f32,
    batch_size: usize,
}

#[derive(Serialize)]
struct DocumentRow<'a> {
    id: &'a str,
    content: &'a str,
    metadata: &'a BTreeMap<String, String>,
    embedding: &'a [f32],
}

#[derive(Deserialize)]
struct MatchRow {
    id: String,
    content: String,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    similarity: f32,
}

impl SupabaseVectorStore {
    pub fn new(url: &str, key: &str, threshold: f32, batch_size: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            threshold,
            batch_size,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.key)
            .header("Authorization", format!("Bearer {}", self.key))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(Error::VectorStore(format!("supabase {}: {}", status, body)))
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn init(&self, _dimension: usize) -> Result<()> {
        // Schema is managed by migrations on the Supabase side
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord], on_progress: Progress<'_>) -> Result<()> {
        let mut done = 0usize;
        for (batch_no, batch) in records.chunks(self.batch_size.max(1)).enumerate() {
            let rows: Vec<DocumentRow<'_>> = batch
                .iter()
                .map(|r| DocumentRow {
                    id: &r.id,
                    content: &r.text,
                    metadata: &r.metadata,
                    embedding: &r.embedding,
                })
                .collect();

            let response = self
                .request(reqwest::Method::POST, "/rest/v1/documents?on_conflict=id")
                .header("Prefer", "resolution=merge-duplicates")
                .json(&rows)
                .send()
                .await
                .map_err(|e| {
                    Error::VectorStore(format!("upsert failed at batch {}: {}", batch_no + 1, e))
                })?;
            Self::check(response).await.map_err(|e| {
                Error::VectorStore(format!("upsert failed at batch {}: {}", batch_no + 1, e))
            })?;

            done += batch.len();
            if let Some(progress) = on_progress {
                progress(done, records.len());
            }
        }
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .request(reqwest::Method::POST, "/rest/v1/rpc/match_documents")
            .json(&json!({
                "query_embedding": embedding,
                "match_count": top_k,
                "match_threshold": self.threshold,
            }))
            .send()
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        let rows: Vec<MatchRow> = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| SearchResult {
                id: row.id,
                score: row.similarity,
                text: row.content,
                metadata: row.metadata,
            })
            .collect())
    }

    async fn delete_all(&self) -> Result<()> {
        // PostgREST refuses an unfiltered DELETE; neq matches every row
        let response = self
            .request(reqwest::Method::DELETE, "/rest/v1/documents?id=neq.")
            .send()
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Self::check(response).await?;
        tracing::warn!("supabase documents table cleared");
        Ok(())
    }

    async fn ping(&self) -> bool {
        let response = self
            .request(reqwest::Method::GET, "/rest/v1/documents?select=id&limit=1")
            .send()
            .await;
        matches!(response, Ok(r) if r.status().is_success())
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .request(reqwest::Method::GET, "/rest/v1/documents?select=id")
            .header("Prefer", "count=exact")
            .header("Range", "0-0")
            .send()
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        let response = Self::check(response).await?;

        // content-range: 0-0/42 -- the total sits after the slash
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        Ok(total)
    }
}
