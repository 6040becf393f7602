use uuid::Uuid;

use crate::event_sourcing::transcoding::TranscodingError;

// ============================================================================
// Core Errors - Event Construction and Fold Failures
// ============================================================================

/// A fold was attempted with a non-contiguous version.
///
/// The only conflict signal in the core. Callers recover by reloading the
/// aggregate and retrying the command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Version conflict on aggregate {originator_id}: expected version {expected}, event has {actual}")]
pub struct VersionError {
    pub originator_id: Uuid,
    pub expected: u64,
    pub actual: u64,
}

/// Event built with fields its kind does not accept. Always a caller bug.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    #[error("Unable to construct event {kind}: unexpected field `{field}`")]
    UnexpectedField { kind: &'static str, field: String },

    /// The kind declares a field that collides with an event header field.
    #[error("Unable to construct event {kind}: field `{field}` is reserved for the event header")]
    ReservedField { kind: &'static str, field: &'static str },

    #[error("Unable to construct event {kind}: {source}")]
    InvalidField {
        kind: &'static str,
        #[source]
        source: TranscodingError,
    },
}

impl ConstructionError {
    /// Name of the offending field, when one can be named.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConstructionError::UnexpectedField { field, .. } => Some(field),
            ConstructionError::ReservedField { field, .. } => Some(field),
            ConstructionError::InvalidField { source, .. } => match source {
                TranscodingError::MissingField { field, .. } => Some(field),
                _ => None,
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error("Event from aggregate {actual} cannot be applied to aggregate {expected}")]
    OriginatorMismatch { expected: Uuid, actual: Uuid },

    /// A Created event after version 1, or any other kind at version 1.
    #[error("Event {topic} cannot be applied at version {version}")]
    UnexpectedKind { topic: &'static str, version: u64 },

    #[error("Cannot rehydrate an aggregate from an empty event history")]
    EmptyHistory,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Event(#[from] EventError),
}
