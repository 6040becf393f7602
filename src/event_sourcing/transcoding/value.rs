use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

// ============================================================================
// Value - Self-Describing Data Model of the Transcoder
// ============================================================================
//
// Every value the transcoder can carry. Plain JSON kinds pass through
// unchanged; every other kind is written as a single reserved-key wrapper.
//
// ============================================================================

/// Named attributes of a record, kept sorted by name.
pub type ObjectState = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    /// Only used for integers above `i64::MAX`.
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),

    // Wrapped kinds
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    Decimal(Decimal),
    Uuid(Uuid),
    Tuple { topic: String, items: Vec<Value> },
    Object { topic: String, state: ObjectState },
    Deque(VecDeque<Value>),
}

impl Value {
    /// Normalizes unsigned integers so that equal numbers have one representation.
    pub fn from_u64(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(signed) => Value::Int(signed),
            Err(_) => Value::UInt(value),
        }
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::DateTime(_) => "naive datetime",
            Value::DateTimeOffset(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Tuple { .. } => "tuple",
            Value::Object { .. } => "object",
            Value::Deque(_) => "deque",
        }
    }

    /// Topic of a tuple or object value.
    pub fn topic(&self) -> Option<&str> {
        match self {
            Value::Tuple { topic, .. } | Value::Object { topic, .. } => Some(topic),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
