use super::codec::FromValue;
use super::error::TranscodingError;
use super::value::{ObjectState, Value};

// ============================================================================
// Custom Types - Named-Attribute Records and Positional Records
// ============================================================================
//
// Custom types declare a stable topic and how they map to and from state.
// Rebuilding from state never runs constructor-time validation: it replays
// values that were already accepted once.
//
// ============================================================================

/// A type with named attributes, encoded under `"__class__"`.
pub trait Record: Sized {
    /// `<module/path>#<nested qualified name>`
    const TOPIC: &'static str;

    /// Attribute names the type declares.
    const FIELDS: &'static [&'static str];

    fn to_state(&self) -> ObjectState;

    fn from_state(state: ObjectState) -> Result<Self, TranscodingError>;
}

/// A type with positional fields, encoded under `"__tuple__"`.
pub trait TupleRecord: Sized {
    const TOPIC: &'static str;
    const ARITY: usize;

    fn to_items(&self) -> Vec<Value>;

    fn from_items(items: Vec<Value>) -> Result<Self, TranscodingError>;
}

/// Removes and converts one attribute from a record state.
pub fn take_field<T: FromValue>(
    state: &mut ObjectState,
    topic: &str,
    field: &str,
) -> Result<T, TranscodingError> {
    match state.remove(field) {
        Some(value) => T::from_value(value),
        None => T::missing().ok_or_else(|| TranscodingError::MissingField {
            topic: topic.to_string(),
            field: field.to_string(),
        }),
    }
}

/// Unwraps the state of an object value, checking its topic.
pub fn into_state(value: Value, topic: &str) -> Result<ObjectState, TranscodingError> {
    match value {
        Value::Object { topic: found, state } if found == topic => Ok(state),
        Value::Object { topic: found, .. } => Err(TranscodingError::mismatch(topic, found)),
        other => Err(TranscodingError::mismatch(topic, other.kind())),
    }
}

/// Implements [`Record`], `ToValue` and `FromValue` for a struct with named fields.
///
/// ```ignore
/// impl_record!(Deposit, "billing.ledger#Ledger.Deposit", { amount, reference });
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty, $topic:expr, { $($field:ident),* $(,)? }) => {
        impl $crate::event_sourcing::transcoding::Record for $ty {
            const TOPIC: &'static str = $topic;
            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn to_state(&self) -> $crate::event_sourcing::transcoding::ObjectState {
                #[allow(unused_mut)]
                let mut state = $crate::event_sourcing::transcoding::ObjectState::new();
                $(
                    state.insert(
                        stringify!($field).to_string(),
                        $crate::event_sourcing::transcoding::ToValue::to_value(&self.$field),
                    );
                )*
                state
            }

            #[allow(unused_mut, unused_variables)]
            fn from_state(
                mut state: $crate::event_sourcing::transcoding::ObjectState,
            ) -> ::std::result::Result<Self, $crate::event_sourcing::transcoding::TranscodingError> {
                Ok(Self {
                    $(
                        $field: $crate::event_sourcing::transcoding::take_field(
                            &mut state,
                            <Self as $crate::event_sourcing::transcoding::Record>::TOPIC,
                            stringify!($field),
                        )?,
                    )*
                })
            }
        }

        impl $crate::event_sourcing::transcoding::ToValue for $ty {
            fn to_value(&self) -> $crate::event_sourcing::transcoding::Value {
                $crate::event_sourcing::transcoding::Value::Object {
                    topic: <Self as $crate::event_sourcing::transcoding::Record>::TOPIC.to_string(),
                    state: $crate::event_sourcing::transcoding::Record::to_state(self),
                }
            }
        }

        impl $crate::event_sourcing::transcoding::FromValue for $ty {
            fn from_value(
                value: $crate::event_sourcing::transcoding::Value,
            ) -> ::std::result::Result<Self, $crate::event_sourcing::transcoding::TranscodingError> {
                let state = $crate::event_sourcing::transcoding::into_state(
                    value,
                    <Self as $crate::event_sourcing::transcoding::Record>::TOPIC,
                )?;
                <Self as $crate::event_sourcing::transcoding::Record>::from_state(state)
            }
        }
    };
}

/// Implements [`TupleRecord`], `ToValue` and `FromValue` for a tuple struct.
///
/// ```ignore
/// impl_tuple_record!(Coordinates, "maps.geo#Coordinates", (0, 1));
/// ```
#[macro_export]
macro_rules! impl_tuple_record {
    ($ty:ty, $topic:expr, ($($index:tt),+ $(,)?)) => {
        impl $crate::event_sourcing::transcoding::TupleRecord for $ty {
            const TOPIC: &'static str = $topic;
            const ARITY: usize = [$($index),+].len();

            fn to_items(&self) -> ::std::vec::Vec<$crate::event_sourcing::transcoding::Value> {
                vec![$($crate::event_sourcing::transcoding::ToValue::to_value(&self.$index)),+]
            }

            fn from_items(
                items: ::std::vec::Vec<$crate::event_sourcing::transcoding::Value>,
            ) -> ::std::result::Result<Self, $crate::event_sourcing::transcoding::TranscodingError> {
                let mut items = items.into_iter();
                Ok(Self($(
                    $crate::event_sourcing::transcoding::take_item(
                        &mut items,
                        <Self as $crate::event_sourcing::transcoding::TupleRecord>::TOPIC,
                        $index,
                    )?
                ),+))
            }
        }

        impl $crate::event_sourcing::transcoding::ToValue for $ty {
            fn to_value(&self) -> $crate::event_sourcing::transcoding::Value {
                $crate::event_sourcing::transcoding::Value::Tuple {
                    topic: <Self as $crate::event_sourcing::transcoding::TupleRecord>::TOPIC.to_string(),
                    items: $crate::event_sourcing::transcoding::TupleRecord::to_items(self),
                }
            }
        }

        impl $crate::event_sourcing::transcoding::FromValue for $ty {
            fn from_value(
                value: $crate::event_sourcing::transcoding::Value,
            ) -> ::std::result::Result<Self, $crate::event_sourcing::transcoding::TranscodingError> {
                let items = $crate::event_sourcing::transcoding::into_items(
                    value,
                    <Self as $crate::event_sourcing::transcoding::TupleRecord>::TOPIC,
                    <Self as $crate::event_sourcing::transcoding::TupleRecord>::ARITY,
                )?;
                <Self as $crate::event_sourcing::transcoding::TupleRecord>::from_items(items)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_sourcing::transcoding::{FromValue, ToValue};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[derive(Debug, Clone, PartialEq)]
    struct Reading {
        sensor: String,
        level: Decimal,
        note: Option<String>,
    }

    crate::impl_record!(Reading, "tests.record#Reading", { sensor, level, note });

    #[derive(Debug, Clone, PartialEq)]
    struct Span(i64, i64);

    crate::impl_tuple_record!(Span, "tests.record#Span", (0, 1));

    #[test]
    fn test_record_declares_fields_and_topic() {
        assert_eq!(Reading::TOPIC, "tests.record#Reading");
        assert_eq!(Reading::FIELDS, &["sensor", "level", "note"]);
        assert_eq!(Span::ARITY, 2);
    }

    #[test]
    fn test_record_value_conversion() {
        let reading = Reading {
            sensor: "north".to_string(),
            level: Decimal::from_str("1.50").unwrap(),
            note: None,
        };

        let value = reading.to_value();
        assert_eq!(value.topic(), Some("tests.record#Reading"));
        assert_eq!(Reading::from_value(value).unwrap(), reading);
    }

    #[test]
    fn test_optional_field_may_be_absent() {
        let mut state = ObjectState::new();
        state.insert("sensor".to_string(), Value::from("south"));
        state.insert(
            "level".to_string(),
            Value::Decimal(Decimal::from_str("2").unwrap()),
        );

        let reading = Reading::from_state(state).unwrap();
        assert_eq!(reading.note, None);
    }

    #[test]
    fn test_missing_required_field() {
        let mut state = ObjectState::new();
        state.insert("sensor".to_string(), Value::from("south"));

        let result = Reading::from_state(state);
        assert!(matches!(
            result,
            Err(TranscodingError::MissingField { ref field, .. }) if field == "level"
        ));
    }

    #[test]
    fn test_wrong_topic_is_rejected() {
        let value = Value::Object {
            topic: "tests.record#Other".to_string(),
            state: ObjectState::new(),
        };
        assert!(matches!(
            Reading::from_value(value),
            Err(TranscodingError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_tuple_record_conversion() {
        let span = Span(3, 9);
        let value = span.to_value();
        assert!(matches!(value, Value::Tuple { ref items, .. } if items.len() == 2));
        assert_eq!(Span::from_value(value).unwrap(), span);
    }
}
