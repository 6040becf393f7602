use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::TranscodingError;
use super::registry::TUPLE_TOPIC;
use super::value::Value;

// ============================================================================
// Typed Conversions into and out of the Value Model
// ============================================================================

/// Converts a typed value into the transcoder's value model.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Rebuilds a typed value from the transcoder's value model.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, TranscodingError>;

    /// Value used when a record state omits this field entirely.
    fn missing() -> Option<Self> {
        None
    }
}

fn mismatch<T>(expected: &str, found: &Value) -> Result<T, TranscodingError> {
    Err(TranscodingError::mismatch(expected, found.kind()))
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        Ok(value)
    }
}

// --- Primitives ---

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::String(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl ToValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Int(i) => Ok(i),
            other => mismatch("i64", &other),
        }
    }
}

impl ToValue for i32 {
    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Int(i) => i32::try_from(i)
                .map_err(|_| TranscodingError::mismatch("i32", format!("integer {i}"))),
            other => mismatch("i32", &other),
        }
    }
}

impl ToValue for u32 {
    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }
}

impl FromValue for u32 {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Int(i) => u32::try_from(i)
                .map_err(|_| TranscodingError::mismatch("u32", format!("integer {i}"))),
            other => mismatch("u32", &other),
        }
    }
}

impl ToValue for u64 {
    fn to_value(&self) -> Value {
        Value::from_u64(*self)
    }
}

impl FromValue for u64 {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Int(i) => u64::try_from(i)
                .map_err(|_| TranscodingError::mismatch("u64", format!("integer {i}"))),
            Value::UInt(u) => Ok(u),
            other => mismatch("u64", &other),
        }
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => mismatch("f64", &other),
        }
    }
}

// --- Dates and times ---

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => mismatch("naive datetime", &other),
        }
    }
}

impl ToValue for DateTime<FixedOffset> {
    fn to_value(&self) -> Value {
        Value::DateTimeOffset(*self)
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::DateTimeOffset(dt) => Ok(dt),
            other => mismatch("datetime", &other),
        }
    }
}

impl ToValue for DateTime<Utc> {
    fn to_value(&self) -> Value {
        Value::DateTimeOffset(DateTime::<FixedOffset>::from(*self))
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::DateTimeOffset(dt) => Ok(dt.with_timezone(&Utc)),
            other => mismatch("datetime", &other),
        }
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Date(d) => Ok(d),
            other => mismatch("date", &other),
        }
    }
}

impl ToValue for NaiveTime {
    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Time(t) => Ok(t),
            other => mismatch("time", &other),
        }
    }
}

// --- Decimals and identifiers ---

impl ToValue for Decimal {
    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Decimal(d) => Ok(d),
            other => mismatch("decimal", &other),
        }
    }
}

impl ToValue for Uuid {
    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Uuid(u) => Ok(u),
            other => mismatch("uuid", &other),
        }
    }
}

// --- Containers ---

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn missing() -> Option<Self> {
        Some(None)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("list", &other),
        }
    }
}

impl<T: ToValue> ToValue for VecDeque<T> {
    fn to_value(&self) -> Value {
        Value::Deque(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for VecDeque<T> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Deque(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("deque", &other),
        }
    }
}

impl<T: ToValue> ToValue for BTreeMap<String, T> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, TranscodingError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((key, T::from_value(value)?)))
                .collect(),
            other => mismatch("map", &other),
        }
    }
}

// --- Plain tuples ---

/// Unwraps the items of a tuple value, checking its topic and arity.
pub fn into_items(value: Value, topic: &str, arity: usize) -> Result<Vec<Value>, TranscodingError> {
    match value {
        Value::Tuple { topic: found, items } if found == topic => {
            if items.len() == arity {
                Ok(items)
            } else {
                Err(TranscodingError::mismatch(
                    format!("{topic} with {arity} items"),
                    format!("{} items", items.len()),
                ))
            }
        }
        Value::Tuple { topic: found, .. } => Err(TranscodingError::mismatch(topic, found)),
        other => mismatch(topic, &other),
    }
}

/// Takes the next positional item of a tuple.
pub fn take_item<T: FromValue>(
    items: &mut std::vec::IntoIter<Value>,
    topic: &str,
    position: usize,
) -> Result<T, TranscodingError> {
    match items.next() {
        Some(value) => T::from_value(value),
        None => Err(TranscodingError::MissingField {
            topic: topic.to_string(),
            field: position.to_string(),
        }),
    }
}

macro_rules! impl_std_tuple {
    ($arity:expr; $($name:ident $index:tt),+) => {
        impl<$($name: ToValue),+> ToValue for ($($name,)+) {
            fn to_value(&self) -> Value {
                Value::Tuple {
                    topic: TUPLE_TOPIC.to_string(),
                    items: vec![$(self.$index.to_value()),+],
                }
            }
        }

        impl<$($name: FromValue),+> FromValue for ($($name,)+) {
            fn from_value(value: Value) -> Result<Self, TranscodingError> {
                let mut items = into_items(value, TUPLE_TOPIC, $arity)?.into_iter();
                Ok(($(take_item::<$name>(&mut items, TUPLE_TOPIC, $index)?,)+))
            }
        }
    };
}

impl_std_tuple!(1; A 0);
impl_std_tuple!(2; A 0, B 1);
impl_std_tuple!(3; A 0, B 1, C 2);
impl_std_tuple!(4; A 0, B 1, C 2, D 3);
