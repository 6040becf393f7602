// ============================================================================
// Event Sourcing Core
// ============================================================================
//
// - event_sourcing: aggregates, events, the type-preserving transcoder,
//   compression and the store collaborators
// - domain: the bank account aggregate built on top of it
//
// ============================================================================

pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod utils;
