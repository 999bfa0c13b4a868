//! Qdrant vector store
//!
//! One collection, cosine distance. Chunk ids are strings, but Qdrant
//! point ids must be integers or UUIDs, so each point id is a UUID derived
//! deterministically from the chunk id -- re-upserting the same chunk
//! always hits the same point. The original chunk id travels in the
//! payload.

use async_trait::async_trait;
use qdrant_client::qdrant::{
    value::Kind, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    Filter, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use std::collections::{BTreeMap, HashMap};

use folio_core::{ChunkRecord, Error, Progress, Result, SearchResult, VectorStore};

pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    threshold: f32,
    batch_size: usize,
}

/// Deterministic UUID-shaped point id from a chunk id
fn point_uuid(chunk_id: &str) -> String {
    let digest = md5::compute(chunk_id);
    let b = digest.0;
    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        b[8], b[9], b[10], b[11], b[12], b[13], b[14], b[15]
    )
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

impl QdrantVectorStore {
    pub fn new(url: &str, collection: &str, threshold: f32, batch_size: usize) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(Self {
            client,
            collection: collection.to_string(),
            threshold,
            batch_size,
        })
    }

    fn to_point(record: &ChunkRecord) -> PointStruct {
        let mut payload = Payload::new();
        payload.insert("chunk_id", record.id.clone());
        payload.insert("content", record.text.clone());
        for (key, value) in &record.metadata {
            payload.insert(key.clone(), value.clone());
        }
        PointStruct::new(point_uuid(&record.id), record.embedding.clone(), payload)
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn init(&self, dimension: usize) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| Error::VectorStore(e.to_string()))?;
            tracing::info!(collection = %self.collection, dimension, "created qdrant collection");
        }
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord], on_progress: Progress<'_>) -> Result<()> {
        let mut done = 0usize;
        for (batch_no, batch) in records.chunks(self.batch_size.max(1)).enumerate() {
            let points: Vec<PointStruct> = batch.iter().map(Self::to_point).collect();
            self.client
                .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
                .await
                .map_err(|e| {
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
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true)
                    .score_threshold(self.threshold),
            )
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;

        let mut results = Vec::with_capacity(response.result.len());
        for point in response.result {
            let id = payload_str(&point.payload, "chunk_id").unwrap_or_default();
            let text = payload_str(&point.payload, "content").unwrap_or_default();
            let mut metadata = BTreeMap::new();
            for (key, value) in &point.payload {
                if key == "chunk_id" || key == "content" {
                    continue;
                }
                if let Some(Kind::StringValue(s)) = &value.kind {
                    metadata.insert(key.clone(), s.clone());
                }
            }
            results.push(SearchResult {
                id,
                score: point.score,
                text,
                metadata,
            });
        }
        Ok(results)
    }

    async fn delete_all(&self) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Filter::default())
                    .wait(true),
            )
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        tracing::warn!(collection = %self.collection, "qdrant collection cleared");
        Ok(())
    }

    async fn ping(&self) -> bool {
        self.client.health_check().await.is_ok()
    }

    async fn count(&self) -> Result<usize> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(|e| Error::VectorStore(e.to_string()))?;
        Ok(response.result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_uuid_is_stable_and_shaped() {
        let a = point_uuid("resume-0-abc123def456");
        let b = point_uuid("resume-0-abc123def456");
        assert_eq!(a, b);
        assert_eq!(a.len(), 36);
        assert_eq!(a.matches('-').count(), 4);
    }

    #[test]
    fn test_point_uuid_differs_per_chunk() {
        assert_ne!(point_uuid("a-0-111111111111"), point_uuid("a-1-222222222222"));
    }
}
