//! Minimal aggregate shared by the core and store tests.

use super::aggregate::{Aggregate, AggregateHeader};
use super::errors::EventError;
use super::event::{DomainEvent, EventKind};
use crate::event_sourcing::transcoding::{ObjectState, Record, TopicRegistry, TranscodingError};

#[derive(Debug, Clone, PartialEq)]
pub struct Started {
    pub label: String,
}

crate::impl_record!(Started, "tests.tally#Tally.Started", { label });

#[derive(Debug, Clone, PartialEq)]
pub struct Incremented {
    pub by: i64,
}

crate::impl_record!(Incremented, "tests.tally#Tally.Incremented", { by });

#[derive(Debug, Clone, PartialEq)]
pub enum TallyEvent {
    Started(Started),
    Incremented(Incremented),
}

impl From<Started> for TallyEvent {
    fn from(event: Started) -> Self {
        TallyEvent::Started(event)
    }
}

impl From<Incremented> for TallyEvent {
    fn from(event: Incremented) -> Self {
        TallyEvent::Incremented(event)
    }
}

impl EventKind for Started {
    type Event = TallyEvent;

    fn into_event(self) -> TallyEvent {
        TallyEvent::Started(self)
    }
}

impl EventKind for Incremented {
    type Event = TallyEvent;

    fn into_event(self) -> TallyEvent {
        TallyEvent::Incremented(self)
    }
}

impl DomainEvent for TallyEvent {
    fn topic(&self) -> &'static str {
        match self {
            TallyEvent::Started(_) => Started::TOPIC,
            TallyEvent::Incremented(_) => Incremented::TOPIC,
        }
    }

    fn is_created(&self) -> bool {
        matches!(self, TallyEvent::Started(_))
    }

    fn to_state(&self) -> ObjectState {
        match self {
            TallyEvent::Started(e) => e.to_state(),
            TallyEvent::Incremented(e) => e.to_state(),
        }
    }

    fn from_state(topic: &str, state: ObjectState) -> Result<Self, TranscodingError> {
        match topic {
            t if t == Started::TOPIC => Started::from_state(state).map(Into::into),
            t if t == Incremented::TOPIC => Incremented::from_state(state).map(Into::into),
            other => Err(TranscodingError::resolution(other, "not a Tally event")),
        }
    }

    fn register_topics(registry: &mut TopicRegistry) -> Result<(), TranscodingError> {
        registry.register::<Started>()?.register::<Incremented>()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    header: AggregateHeader<TallyEvent>,
    pub label: String,
    pub count: i64,
}

impl Aggregate for Tally {
    type Event = TallyEvent;

    fn header(&self) -> &AggregateHeader<TallyEvent> {
        &self.header
    }

    fn header_mut(&mut self) -> &mut AggregateHeader<TallyEvent> {
        &mut self.header
    }

    fn created(header: AggregateHeader<TallyEvent>, event: &TallyEvent) -> Result<Self, EventError> {
        match event {
            TallyEvent::Started(started) => Ok(Self {
                header,
                label: started.label.clone(),
                count: 0,
            }),
            other => Err(EventError::UnexpectedKind {
                topic: other.topic(),
                version: 1,
            }),
        }
    }

    fn apply(&mut self, event: &TallyEvent) {
        match event {
            TallyEvent::Started(_) => {}
            TallyEvent::Incremented(e) => self.count += e.by,
        }
    }
}
