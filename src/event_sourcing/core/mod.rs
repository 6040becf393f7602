// ============================================================================
// Event Sourcing Core - Aggregates, Events and the Fold
// ============================================================================
//
// Synchronous and in-memory. Nothing here logs or performs I/O; errors are
// returned to the caller as they happen.
//
// ============================================================================

pub mod aggregate;
pub mod errors;
pub mod event;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aggregate::{Aggregate, AggregateHeader};
pub use errors::{AggregateError, ConstructionError, EventError, VersionError};
pub use event::{construct, DomainEvent, Event, EventKind, Fields};
