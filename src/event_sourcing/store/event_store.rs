use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

// ============================================================================
// Event Store - Append-Only Streams of Stored Events
// ============================================================================
//
// A store keeps one stream per aggregate id.
//
// Contract:
// 1. Appends are atomic: a batch lands completely or not at all
// 2. Appends are gapless: the first record of an aggregate continues its
//    stream at current version + 1, the rest follow contiguously
// 3. A conflicting append is rejected, never merged
// 4. Streams replay in version order
//
// ============================================================================

/// One persisted event. `state` holds the encoded (and possibly compressed)
/// event; `topic` travels alongside for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub originator_id: Uuid,
    pub originator_version: u64,
    pub topic: String,
    pub state: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Concurrency conflict on aggregate {aggregate_id}: expected version {expected}, got {actual}")]
    Conflict {
        aggregate_id: Uuid,
        expected: u64,
        actual: u64,
    },

    #[error("Cannot append empty event list")]
    EmptyBatch,
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch atomically. Records of one aggregate must continue its
    /// stream without gaps.
    async fn append(&self, records: Vec<StoredEvent>) -> Result<(), StoreError>;

    /// Stream of one aggregate in version order; empty when unknown.
    async fn load(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, StoreError>;

    /// Version of the last stored event, 0 when the aggregate is unknown.
    async fn current_version(&self, aggregate_id: Uuid) -> Result<u64, StoreError>;
}

/// Process-local store. The gapless check and the append happen under one
/// write lock.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    streams: RwLock<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aggregates with at least one stored event.
    pub async fn aggregate_count(&self) -> usize {
        self.streams.read().await.len()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, records: Vec<StoredEvent>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Err(StoreError::EmptyBatch);
        }

        let mut batches: BTreeMap<Uuid, Vec<StoredEvent>> = BTreeMap::new();
        for record in records {
            batches.entry(record.originator_id).or_default().push(record);
        }

        let mut streams = self.streams.write().await;

        // Check every stream before touching any of them
        for (aggregate_id, batch) in &batches {
            let mut expected = streams
                .get(aggregate_id)
                .and_then(|stream| stream.last())
                .map_or(0, |last| last.originator_version)
                + 1;

            for record in batch {
                if record.originator_version != expected {
                    tracing::warn!(
                        aggregate_id = %aggregate_id,
                        expected_version = expected,
                        actual_version = record.originator_version,
                        "Rejected append with version conflict"
                    );
                    return Err(StoreError::Conflict {
                        aggregate_id: *aggregate_id,
                        expected,
                        actual: record.originator_version,
                    });
                }
                expected += 1;
            }
        }

        for (aggregate_id, batch) in batches {
            let event_count = batch.len();
            let stream = streams.entry(aggregate_id).or_default();
            stream.extend(batch);

            tracing::info!(
                aggregate_id = %aggregate_id,
                new_version = stream.len() as u64,
                event_count = event_count,
                "✅ Appended events to event store"
            );
        }

        Ok(())
    }

    async fn load(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, StoreError> {
        let events = self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default();

        tracing::debug!(
            aggregate_id = %aggregate_id,
            event_count = events.len(),
            "Loaded events"
        );
        Ok(events)
    }

    async fn current_version(&self, aggregate_id: Uuid) -> Result<u64, StoreError> {
        Ok(self
            .streams
            .read()
            .await
            .get(&aggregate_id)
            .and_then(|stream| stream.last())
            .map_or(0, |last| last.originator_version))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
