use std::sync::Arc;

use uuid::Uuid;

use super::event_store::{EventStore, StoreError};
use super::mapper::{Mapper, MapperError};
use crate::event_sourcing::core::{Aggregate, EventError};

// ============================================================================
// Repository - Unit of Work Boundary for One Aggregate Type
// ============================================================================
//
// save: map pending -> append -> drain
// get:  load -> map -> rehydrate
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Aggregate not found: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Event(#[from] EventError),
}

impl RepositoryError {
    /// True when another writer got there first; reload and retry.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RepositoryError::Store(StoreError::Conflict { .. })
                | RepositoryError::Event(EventError::Version(_))
        )
    }
}

pub struct Repository<A: Aggregate> {
    store: Arc<dyn EventStore>,
    mapper: Mapper<A::Event>,
}

impl<A: Aggregate> Clone for Repository<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mapper: self.mapper.clone(),
        }
    }
}

impl<A> Repository<A>
where
    A: Aggregate + Send,
{
    pub fn new(store: Arc<dyn EventStore>, mapper: Mapper<A::Event>) -> Self {
        Self { store, mapper }
    }

    /// Appends the aggregate's pending events as one batch and drains them
    /// once the append succeeds. On error the events stay pending.
    /// Returns the number of events written.
    pub async fn save(&self, aggregate: &mut A) -> Result<usize, RepositoryError> {
        if aggregate.pending_events().is_empty() {
            return Ok(0);
        }

        let records = aggregate
            .pending_events()
            .iter()
            .map(|event| self.mapper.to_stored(event))
            .collect::<Result<Vec<_>, _>>()?;
        let event_count = records.len();

        self.store.append(records).await?;
        aggregate.drain_pending();

        tracing::debug!(
            aggregate_id = %aggregate.id(),
            new_version = aggregate.version(),
            event_count = event_count,
            "Saved aggregate"
        );
        Ok(event_count)
    }

    /// Rebuilds an aggregate from its stored history. The first record that
    /// fails to map stops the load.
    pub async fn get(&self, aggregate_id: Uuid) -> Result<A, RepositoryError> {
        let records = self.store.load(aggregate_id).await?;
        if records.is_empty() {
            return Err(RepositoryError::NotFound(aggregate_id));
        }

        let events = records
            .into_iter()
            .map(|record| self.mapper.from_stored(record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(A::rehydrate(events)?)
    }

    pub async fn exists(&self, aggregate_id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.store.current_version(aggregate_id).await? > 0)
    }
}
