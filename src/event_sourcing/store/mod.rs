// ============================================================================
// Event Sourcing Store - Persistence Collaborators
// ============================================================================
//
// Everything here consumes the core's contract from the outside: the core
// itself never touches a store.
//
// ============================================================================

pub mod event_store;
pub mod mapper;
pub mod repository;

pub use event_store::{EventStore, InMemoryEventStore, StoreError, StoredEvent};
pub use mapper::{Mapper, MapperError};
pub use repository::{Repository, RepositoryError};
