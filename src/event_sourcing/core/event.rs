use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use super::aggregate::{Aggregate, AggregateHeader};
use super::errors::{ConstructionError, EventError, VersionError};
use crate::event_sourcing::transcoding::{
    take_field, FromValue, ObjectState, Record, ToValue, TopicRegistry, TranscodingError, Value,
};

// ============================================================================
// Domain Events - Immutable, Versioned Facts
// ============================================================================
//
// An `Event<E>` carries the originator id, the version it produces and the
// time it happened, around a payload `E` drawn from the aggregate's closed
// set of event variants. Folding an event advances an aggregate by exactly
// one version.
//
// ============================================================================

pub const ORIGINATOR_ID: &str = "originator_id";
pub const ORIGINATOR_VERSION: &str = "originator_version";
pub const TIMESTAMP: &str = "timestamp";

const HEADER_FIELDS: [&str; 3] = [ORIGINATOR_ID, ORIGINATOR_VERSION, TIMESTAMP];

/// Keyword fields used to construct an event kind.
pub type Fields = ObjectState;

/// Builds [`Fields`] from `name => value` pairs.
///
/// ```ignore
/// let fields = fields! { "amount" => amount, "transaction_id" => None::<Uuid> };
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::event_sourcing::core::Fields::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut fields = $crate::event_sourcing::core::Fields::new();
        $(
            fields.insert(
                ::std::string::String::from($name),
                $crate::event_sourcing::transcoding::ToValue::to_value(&$value),
            );
        )+
        fields
    }};
}

/// The closed set of event variants of one aggregate type.
pub trait DomainEvent: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// Topic of the variant, e.g. `domain.bank_account#BankAccount.Opened`.
    fn topic(&self) -> &'static str;

    /// True for the one variant that may start an aggregate.
    fn is_created(&self) -> bool;

    fn to_state(&self) -> ObjectState;

    /// Rebuilds a variant from stored state without re-running any checks.
    fn from_state(topic: &str, state: ObjectState) -> Result<Self, TranscodingError>;

    /// Registers the topic of every variant.
    fn register_topics(registry: &mut TopicRegistry) -> Result<(), TranscodingError>;
}

/// One variant of a [`DomainEvent`], constructible from keyword fields.
pub trait EventKind: Record {
    type Event: DomainEvent;

    fn into_event(self) -> Self::Event;
}

/// Builds an event kind from keyword fields.
///
/// Kinds that declare a header field are rejected, then fields the kind does
/// not declare, before anything else.
pub fn construct<K: EventKind>(fields: Fields) -> Result<K, ConstructionError> {
    if let Some(field) = HEADER_FIELDS.iter().copied().find(|header| K::FIELDS.contains(header)) {
        return Err(ConstructionError::ReservedField {
            kind: K::TOPIC,
            field,
        });
    }
    if let Some(field) = fields.keys().find(|key| !K::FIELDS.contains(&key.as_str())) {
        return Err(ConstructionError::UnexpectedField {
            kind: K::TOPIC,
            field: field.clone(),
        });
    }

    K::from_state(fields).map_err(|source| ConstructionError::InvalidField {
        kind: K::TOPIC,
        source,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    originator_id: Uuid,
    originator_version: u64,
    timestamp: DateTime<Utc>,
    payload: E,
}

impl<E: DomainEvent> Event<E> {
    /// Timestamped now.
    pub fn new(originator_id: Uuid, originator_version: u64, payload: E) -> Self {
        Self::with_timestamp(originator_id, originator_version, Utc::now(), payload)
    }

    /// The timestamp is truncated to the microsecond precision of the wire
    /// format.

    pub fn with_timestamp(
        originator_id: Uuid,
        originator_version: u64,
        timestamp: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            originator_id,
            originator_version,
            timestamp: timestamp.trunc_subsecs(6),
            payload,
        }
    }

    pub fn originator_id(&self) -> Uuid {
        self.originator_id
    }

    pub fn originator_version(&self) -> u64 {
        self.originator_version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn topic(&self) -> &'static str {
        self.payload.topic()
    }

    /// The fold primitive: starts an aggregate when none is given, otherwise
    /// advances the given one.
    pub fn mutate<A>(&self, aggregate: Option<A>) -> Result<A, EventError>
    where
        A: Aggregate<Event = E>,
    {
        match aggregate {
            None => self.create_aggregate(),
            Some(mut aggregate) => {
                self.apply_to(&mut aggregate)?;
                Ok(aggregate)
            }
        }
    }

    /// First fold. Requires version 1 and the Created variant.
    pub fn create_aggregate<A>(&self) -> Result<A, EventError>
    where
        A: Aggregate<Event = E>,
    {
        self.check_version(1)?;
        if !self.payload.is_created() {
            return Err(EventError::UnexpectedKind {
                topic: self.topic(),
                version: self.originator_version,
            });
        }

        let header = AggregateHeader::new(self.originator_id, self.timestamp);
        A::created(header, &self.payload)
    }

    /// In-place fold. On error the aggregate is left untouched.
    pub fn apply_to<A>(&self, aggregate: &mut A) -> Result<(), EventError>
    where
        A: Aggregate<Event = E>,
    {
        if self.originator_id != aggregate.id() {
            return Err(EventError::OriginatorMismatch {
                expected: aggregate.id(),
                actual: self.originator_id,
            });
        }
        self.check_version(aggregate.version() + 1)?;
        if self.payload.is_created() {
            return Err(EventError::UnexpectedKind {
                topic: self.topic(),
                version: self.originator_version,
            });
        }

        aggregate
            .header_mut()
            .advance(self.originator_version, self.timestamp);
        aggregate.apply(&self.payload);
        Ok(())
    }

    fn check_version(&self, expected: u64) -> Result<(), VersionError> {
        if self.originator_version == expected {
            Ok(())
        } else {
            Err(VersionError {
                originator_id: self.originator_id,
                expected,
                actual: self.originator_version,
            })
        }
    }
}

// Events travel as `__class__` values: the variant's topic, with the header
// fields flattened into the variant's own state.
impl<E: DomainEvent> ToValue for Event<E> {
    fn to_value(&self) -> Value {
        let mut state = self.payload.to_state();
        state.insert(ORIGINATOR_ID.to_string(), self.originator_id.to_value());
        state.insert(
            ORIGINATOR_VERSION.to_string(),
            self.originator_version.to_value(),
        );
        state.insert(TIMESTAMP.to_string(), self.timestamp.to_value());

        Value::Object {
            topic: self.topic().to_string(),
            state,
        }
    }
}

impl<E: DomainEvent> FromValue for Event<E> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        let (topic, mut state) = match value {
            Value::Object { topic, state } => (topic, state),
            other => {
                return Err(TranscodingError::TypeMismatch {
                    expected: "event object".to_string(),
                    found: other.kind().to_string(),
                })
            }
        };

        let originator_id = take_field(&mut state, &topic, ORIGINATOR_ID)?;
        let originator_version = take_field(&mut state, &topic, ORIGINATOR_VERSION)?;
        let timestamp = take_field(&mut state, &topic, TIMESTAMP)?;
        let payload = E::from_state(&topic, state)?;

        Ok(Self {
            originator_id,
            originator_version,
            timestamp,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::core::fixtures::{Incremented, Started, Tally, TallyEvent};
    use crate::event_sourcing::transcoding::Transcoder;

    fn started(id: Uuid) -> Event<TallyEvent> {
        Event::new(
            id,
            1,
            TallyEvent::Started(Started {
                label: "visits".to_string(),
            }),
        )
    }

    fn incremented(id: Uuid, version: u64, by: i64) -> Event<TallyEvent> {
        Event::new(id, version, TallyEvent::Incremented(Incremented { by }))
    }

    #[test]
    fn test_timestamp_has_microsecond_precision() {
        let event = started(Uuid::new_v4());
        assert_eq!(event.timestamp().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_mutate_none_creates_aggregate() {
        let id = Uuid::new_v4();
        let event = started(id);

        let tally: Tally = event.mutate(None).unwrap();
        assert_eq!(tally.id(), id);
        assert_eq!(tally.version(), 1);
        assert_eq!(tally.created_on(), event.timestamp());
        assert_eq!(tally.modified_on(), event.timestamp());
        assert_eq!(tally.label, "visits");
    }

    #[test]
    fn test_mutate_requires_version_one_for_first_event() {
        let id = Uuid::new_v4();
        let event = Event::new(
            id,
            2,
            TallyEvent::Started(Started {
                label: "late".to_string(),
            }),
        );

        let result = event.mutate::<Tally>(None);
        assert!(matches!(
            result,
            Err(EventError::Version(VersionError { expected: 1, actual: 2, .. }))
        ));
    }

    #[test]
    fn test_first_event_must_be_created_kind() {
        let result = incremented(Uuid::new_v4(), 1, 5).mutate::<Tally>(None);
        assert!(matches!(result, Err(EventError::UnexpectedKind { version: 1, .. })));
    }

    #[test]
    fn test_created_kind_rejected_after_first_event() {
        let id = Uuid::new_v4();
        let mut tally: Tally = started(id).mutate(None).unwrap();

        let again = Event::new(
            id,
            2,
            TallyEvent::Started(Started {
                label: "again".to_string(),
            }),
        );
        assert!(matches!(
            again.apply_to(&mut tally),
            Err(EventError::UnexpectedKind { version: 2, .. })
        ));
        assert_eq!(tally.version(), 1);
    }

    #[test]
    fn test_non_contiguous_versions_always_fail() {
        let id = Uuid::new_v4();
        let mut tally: Tally = started(id).mutate(None).unwrap();
        incremented(id, 2, 1).apply_to(&mut tally).unwrap();

        for version in [0, 1, 2, 4, 5, 100] {
            let before = tally.clone();
            let result = incremented(id, version, 1).apply_to(&mut tally);
            assert!(
                matches!(result, Err(EventError::Version(VersionError { expected: 3, .. }))),
                "version {version} should conflict"
            );
            assert_eq!(tally, before);
        }
    }

    #[test]
    fn test_apply_to_rejects_event_of_other_aggregate() {
        let id = Uuid::new_v4();
        let mut tally: Tally = started(id).mutate(None).unwrap();
        let before = tally.clone();

        let foreign = incremented(Uuid::new_v4(), 2, 1);
        assert!(matches!(
            foreign.apply_to(&mut tally),
            Err(EventError::OriginatorMismatch { expected, .. }) if expected == id
        ));
        assert_eq!(tally, before);
    }

    #[test]
    fn test_with_timestamp_truncates_to_microseconds() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T09:30:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = Event::with_timestamp(
            Uuid::new_v4(),
            1,
            at,
            TallyEvent::Incremented(Incremented { by: 1 }),
        );
        assert_eq!(event.timestamp().timestamp_subsec_nanos(), 123_456_000);
    }

    #[test]
    fn test_apply_to_advances_version_and_modified_on() {
        let id = Uuid::new_v4();
        let first = started(id);
        let mut tally: Tally = first.mutate(None).unwrap();

        let second = incremented(id, 2, 3);
        let tally_after = second.mutate(Some(tally.clone())).unwrap();
        second.apply_to(&mut tally).unwrap();

        assert_eq!(tally, tally_after);
        assert_eq!(tally.version(), 2);
        assert_eq!(tally.count, 3);
        assert_eq!(tally.created_on(), first.timestamp());
        assert_eq!(tally.modified_on(), second.timestamp());
    }

    #[test]
    fn test_construct_rejects_undeclared_field() {
        let result = construct::<Started>(crate::fields! {
            "label" => "visits",
            "colour" => "blue",
        });

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::UnexpectedField { ref field, .. } if field == "colour"
        ));
        assert_eq!(err.field(), Some("colour"));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Stamped {
        timestamp: i64,
    }

    crate::impl_record!(Stamped, "tests.tally#Tally.Stamped", { timestamp });

    impl EventKind for Stamped {
        type Event = TallyEvent;

        fn into_event(self) -> TallyEvent {
            TallyEvent::Incremented(Incremented { by: self.timestamp })
        }
    }

    #[test]
    fn test_construct_rejects_kind_declaring_header_field() {
        let err = construct::<Stamped>(crate::fields! { "timestamp" => 1i64 }).unwrap_err();
        assert!(matches!(
            err,
            ConstructionError::ReservedField { field: TIMESTAMP, .. }
        ));
        assert_eq!(err.field(), Some(TIMESTAMP));
    }

    #[test]
    fn test_construct_rejects_missing_and_mistyped_fields() {
        let missing = construct::<Started>(crate::fields! {}).unwrap_err();
        assert!(matches!(missing, ConstructionError::InvalidField { .. }));
        assert_eq!(missing.field(), Some("label"));

        let mistyped = construct::<Incremented>(crate::fields! { "by" => "three" }).unwrap_err();
        assert!(matches!(
            mistyped,
            ConstructionError::InvalidField {
                source: TranscodingError::TypeMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_event_round_trips_through_transcoder() {
        let mut registry = TopicRegistry::new();
        TallyEvent::register_topics(&mut registry).unwrap();
        let transcoder = Transcoder::new(registry);

        let event = incremented(Uuid::new_v4(), 7, -2);
        let text = transcoder.encode(&event).unwrap();
        assert!(text.starts_with(r#"{"__class__": {"state": {"by": -2, "originator_id": {"UUID": "#));
        assert!(text.ends_with(r#""topic": "tests.tally#Tally.Incremented"}}"#));

        let decoded: Event<TallyEvent> = transcoder.decode_as(&text).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_event_from_value_requires_header_fields() {
        let value = Incremented { by: 1 }.to_value();
        let result = Event::<TallyEvent>::from_value(value);
        assert!(matches!(
            result,
            Err(TranscodingError::MissingField { ref field, .. }) if field == ORIGINATOR_ID
        ));
    }
}
