use std::mem;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{AggregateError, EventError};
use super::event::{construct, DomainEvent, Event, EventKind, Fields};

// ============================================================================
// Aggregate Root Pattern - Event Sourcing Core
// ============================================================================
//
// Key Principles:
// 1. State is derived from events (not stored directly)
// 2. Commands check preconditions, then trigger exactly one event
// 3. Every change flows through `Event::mutate`
// 4. New events wait in a pending queue until the caller drains them
//
// ============================================================================

/// Identity, version bookkeeping and the pending queue shared by every
/// aggregate. Only the fold can change it.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateHeader<E> {
    id: Uuid,
    version: u64,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
    pending: Vec<Event<E>>,
}

impl<E> AggregateHeader<E> {
    pub(super) fn new(id: Uuid, created_on: DateTime<Utc>) -> Self {
        Self {
            id,
            version: 1,
            created_on,
            modified_on: created_on,
            pending: Vec::new(),
        }
    }

    pub(super) fn advance(&mut self, version: u64, modified_on: DateTime<Utc>) {
        self.version = version;
        self.modified_on = modified_on;
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    pub fn modified_on(&self) -> DateTime<Utc> {
        self.modified_on
    }
}

/// Generic aggregate trait - all event-sourced aggregates implement this.
///
/// Implementors own an [`AggregateHeader`] and supply the two apply
/// behaviours: building the initial state from the Created event, and
/// updating state for every later event. Version checks live in the fold, so
/// neither behaviour needs to repeat them.
pub trait Aggregate: Sized {
    type Event: DomainEvent;

    fn header(&self) -> &AggregateHeader<Self::Event>;

    fn header_mut(&mut self) -> &mut AggregateHeader<Self::Event>;

    /// Builds the initial state. `event` is always the Created variant.
    fn created(header: AggregateHeader<Self::Event>, event: &Self::Event)
        -> Result<Self, EventError>;

    /// Updates state for any event after the first.
    fn apply(&mut self, event: &Self::Event);

    fn id(&self) -> Uuid {
        self.header().id()
    }

    fn version(&self) -> u64 {
        self.header().version()
    }

    fn created_on(&self) -> DateTime<Utc> {
        self.header().created_on()
    }

    fn modified_on(&self) -> DateTime<Utc> {
        self.header().modified_on()
    }

    fn pending_events(&self) -> &[Event<Self::Event>] {
        &self.header().pending
    }

    /// Creation factory: folds a version 1 event of kind `K` onto empty state.
    /// The new aggregate's pending queue holds that event.
    fn create<K>(id: Uuid, fields: Fields) -> Result<Self, AggregateError>
    where
        K: EventKind<Event = Self::Event>,
    {
        let payload = construct::<K>(fields)?.into_event();
        let event = Event::new(id, 1, payload);

        let mut aggregate = event.create_aggregate::<Self>()?;
        aggregate.header_mut().pending.push(event);
        Ok(aggregate)
    }

    /// Builds the next event of kind `K`, folds it in place and queues it.
    fn trigger<K>(&mut self, fields: Fields) -> Result<(), AggregateError>
    where
        K: EventKind<Event = Self::Event>,
    {
        let payload = construct::<K>(fields)?.into_event();
        let event = Event::new(self.id(), self.version() + 1, payload);

        event.apply_to(self)?;
        self.header_mut().pending.push(event);
        Ok(())
    }

    /// Returns the pending events in the order they were triggered and
    /// empties the queue.
    fn drain_pending(&mut self) -> Vec<Event<Self::Event>> {
        mem::take(&mut self.header_mut().pending)
    }

    /// Replays stored history. Nothing is queued and no command preconditions
    /// run.
    fn rehydrate<I>(events: I) -> Result<Self, EventError>
    where
        I: IntoIterator<Item = Event<Self::Event>>,
    {
        let mut aggregate = None;
        for event in events {
            aggregate = Some(event.mutate(aggregate)?);
        }
        aggregate.ok_or(EventError::EmptyHistory)
    }
}
