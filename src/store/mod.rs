//! In-memory retention store for ingested health documents.
//!
//! Holds a rolling window of ingested datasets together with their chunk
//! embeddings. This is a working context for the coordinator, not a
//! production store: nothing is persisted.

use crate::gateway::{EmbeddingModel, GatewayError};
use crate::models::{GroupedRecords, MetricRecord};
use chrono::{DateTime, Months, Utc};
use serde::Serialize;
use tracing::{debug, info};

/// Records per embedding chunk.
pub const EMBED_CHUNK_SIZE: usize = 100;

/// Rolling retention horizon in months.
pub const RETENTION_MONTHS: u32 = 6;

/// One ingested dataset with its chunk embeddings.
///
/// Embeddings live inside the document they were computed from, so
/// documents and embeddings always evict in lockstep.
#[derive(Debug, Clone)]
pub struct RetainedDocument {
    pub ingested_at: DateTime<Utc>,
    pub payload: GroupedRecords,
    pub embeddings: Vec<Vec<f32>>,
}

/// Bounded store of recently ingested documents.
///
/// Single-writer: only the ingest path mutates the store. Shared use must
/// go through a mutex (the HTTP server wraps it in `tokio::sync::Mutex`).
#[derive(Debug, Default)]
pub struct RetentionStore {
    documents: Vec<RetainedDocument>,
}

#[derive(Serialize)]
struct ChunkEntry<'a> {
    metric: &'a str,
    #[serde(flatten)]
    record: &'a MetricRecord,
}

impl RetentionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a dataset: embed its records in fixed-size chunks, append
    /// the document, then evict everything older than the retention
    /// horizon relative to `now`.
    pub async fn ingest<E: EmbeddingModel>(
        &mut self,
        embedder: &E,
        payload: GroupedRecords,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let entries: Vec<ChunkEntry<'_>> = payload
            .iter()
            .flat_map(|(metric, records)| {
                records.iter().map(move |record| ChunkEntry {
                    metric: metric.as_str(),
                    record,
                })
            })
            .collect();

        let mut embeddings = Vec::new();
        for chunk in entries.chunks(EMBED_CHUNK_SIZE) {
            let input = serde_json::to_string(chunk).unwrap_or_default();
            embeddings.push(embedder.embed(&input).await?);
        }
        debug!(
            "Embedded {} records in {} chunks",
            entries.len(),
            embeddings.len()
        );
        drop(entries);

        self.documents.push(RetainedDocument {
            ingested_at: now,
            payload,
            embeddings,
        });
        self.evict(now);

        info!("Retention store holds {} documents", self.documents.len());
        Ok(())
    }

    /// Drop documents older than the retention horizon.
    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now
            .checked_sub_months(Months::new(RETENTION_MONTHS))
            .unwrap_or(now);
        self.documents.retain(|doc| doc.ingested_at > cutoff);
    }

    /// The payload of the most recently ingested document, if any.
    pub fn current_context(&self) -> Option<&GroupedRecords> {
        self.documents.last().map(|doc| &doc.payload)
    }

    #[allow(dead_code)] // Utility accessor
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[allow(dead_code)] // Utility accessor
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total embedding vectors held across all retained documents.
    #[allow(dead_code)] // Utility accessor
    pub fn embedding_count(&self) -> usize {
        self.documents.iter().map(|doc| doc.embeddings.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricValue;

    /// Deterministic embedder that never leaves the process.
    struct StubEmbedder;

    impl EmbeddingModel for StubEmbedder {
        async fn embed(&self, input: &str) -> Result<Vec<f32>, GatewayError> {
            Ok(vec![input.len() as f32, 1.0, 0.0])
        }
    }

    fn payload_with(count: usize) -> GroupedRecords {
        let records = (0..count)
            .map(|i| MetricRecord {
                value: MetricValue::Number(i as f64),
                start_date: "2024-11-10 08:00:00 +0000".to_string(),
                end_date: "2024-11-10 08:01:00 +0000".to_string(),
            })
            .collect();
        GroupedRecords::from([("heart_rate".to_string(), records)])
    }

    #[test]
    fn test_ingest_keeps_latest_as_current_context() {
        tokio_test::block_on(async {
            let mut store = RetentionStore::new();
            let now = Utc::now();

            store
                .ingest(&StubEmbedder, payload_with(1), now)
                .await
                .unwrap();
            store
                .ingest(&StubEmbedder, payload_with(3), now)
                .await
                .unwrap();

            let context = store.current_context().unwrap();
            assert_eq!(context["heart_rate"].len(), 3);
            assert_eq!(store.len(), 2);
        });
    }

    #[test]
    fn test_chunked_embedding_batches_of_100() {
        tokio_test::block_on(async {
            let mut store = RetentionStore::new();

            store
                .ingest(&StubEmbedder, payload_with(250), Utc::now())
                .await
                .unwrap();

            // 250 records -> chunks of 100, 100, 50.
            assert_eq!(store.embedding_count(), 3);
        });
    }

    #[test]
    fn test_eviction_drops_documents_past_six_months() {
        tokio_test::block_on(async {
            let mut store = RetentionStore::new();
            let now = Utc::now();
            let seven_months_ago = now.checked_sub_months(Months::new(7)).unwrap();
            let one_month_ago = now.checked_sub_months(Months::new(1)).unwrap();

            store
                .ingest(&StubEmbedder, payload_with(1), seven_months_ago)
                .await
                .unwrap();
            store
                .ingest(&StubEmbedder, payload_with(2), one_month_ago)
                .await
                .unwrap();
            // Any later ingest sweeps relative to its own "now".
            store
                .ingest(&StubEmbedder, payload_with(5), now)
                .await
                .unwrap();

            assert_eq!(store.len(), 2);
            assert_eq!(store.current_context().unwrap()["heart_rate"].len(), 5);
        });
    }

    #[test]
    fn test_embeddings_evict_with_their_documents() {
        tokio_test::block_on(async {
            let mut store = RetentionStore::new();
            let now = Utc::now();
            let old = now.checked_sub_months(Months::new(8)).unwrap();

            store
                .ingest(&StubEmbedder, payload_with(150), old)
                .await
                .unwrap();
            assert_eq!(store.embedding_count(), 2);

            store
                .ingest(&StubEmbedder, payload_with(10), now)
                .await
                .unwrap();

            assert_eq!(store.len(), 1);
            assert_eq!(store.embedding_count(), 1);
        });
    }

    #[test]
    fn test_empty_payload_ingests_with_no_embeddings() {
        tokio_test::block_on(async {
            let mut store = RetentionStore::new();

            store
                .ingest(&StubEmbedder, GroupedRecords::new(), Utc::now())
                .await
                .unwrap();

            assert!(!store.is_empty());
            assert_eq!(store.len(), 1);
            assert_eq!(store.embedding_count(), 0);
        });
    }
}
