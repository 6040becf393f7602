use std::collections::{BTreeMap, VecDeque};
use std::io;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Number, Value as Json};
use uuid::Uuid;

use super::codec::{FromValue, ToValue};
use super::error::TranscodingError;
use super::registry::{Shape, TopicRegistry};
use super::value::{ObjectState, Value};

// ============================================================================
// Transcoder - Canonical JSON Encoding with Type Fidelity
// ============================================================================
//
// Wire format: plain JSON kinds pass through, every other kind becomes an
// object with exactly one reserved key. Keys are sorted and separators are
// ", " and ": " so equal values always produce byte-identical text.
//
// ============================================================================

pub const DATETIME_KEY: &str = "ISO8601_datetime";
pub const DATE_KEY: &str = "ISO8601_date";
pub const TIME_KEY: &str = "ISO8601_time";
pub const DECIMAL_KEY: &str = "__decimal__";
pub const UUID_KEY: &str = "UUID";
pub const TUPLE_KEY: &str = "__tuple__";
pub const CLASS_KEY: &str = "__class__";
pub const DEQUE_KEY: &str = "__deque__";

pub const RESERVED_KEYS: [&str; 8] = [
    DATETIME_KEY,
    DATE_KEY,
    TIME_KEY,
    DECIMAL_KEY,
    UUID_KEY,
    TUPLE_KEY,
    CLASS_KEY,
    DEQUE_KEY,
];

const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
const OFFSET_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%z";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.6f";

const NAIVE_DATETIME_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f";
const OFFSET_DATETIME_PARSE: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const TIME_PARSE: &str = "%H:%M:%S%.f";

fn reserved_key(key: &str) -> Option<&'static str> {
    RESERVED_KEYS.iter().copied().find(|reserved| *reserved == key)
}

/// Encodes and decodes values. Cheap to clone; clones share the registry.
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    registry: Arc<TopicRegistry>,
}

impl Transcoder {
    pub fn new(registry: TopicRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    pub fn encode<T: ToValue + ?Sized>(&self, value: &T) -> Result<String, TranscodingError> {
        self.encode_value(&value.to_value())
    }

    pub fn encode_value(&self, value: &Value) -> Result<String, TranscodingError> {
        let json = self.to_json(value)?;

        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, CanonicalFormatter);
        json.serialize(&mut serializer)
            .map_err(|e| TranscodingError::encode(value.kind(), e.to_string()))?;

        String::from_utf8(out).map_err(|e| TranscodingError::encode(value.kind(), e.to_string()))
    }

    pub fn decode(&self, text: &str) -> Result<Value, TranscodingError> {
        let json: Json = serde_json::from_str(text)?;
        self.from_json(json)
    }

    pub fn decode_as<T: FromValue>(&self, text: &str) -> Result<T, TranscodingError> {
        T::from_value(self.decode(text)?)
    }

    // ------------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------------

    fn to_json(&self, value: &Value) -> Result<Json, TranscodingError> {
        let json = match value {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::UInt(u) => Json::from(*u),
            Value::Float(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| TranscodingError::encode("f64", format!("{f} is not finite")))?,
            Value::String(s) => Json::String(s.clone()),
            Value::List(items) => Json::Array(self.to_json_items(items.iter())?),
            Value::Map(entries) => {
                if entries.len() == 1 {
                    if let Some(key) = entries.keys().find_map(|k| reserved_key(k)) {
                        return Err(TranscodingError::encode(
                            "map",
                            format!("a map whose only key is {key:?} would decode as a different kind"),
                        ));
                    }
                }
                Json::Object(self.to_json_entries(entries)?)
            }
            Value::DateTime(dt) => {
                check_micros("NaiveDateTime", dt.nanosecond())?;
                wrap(
                    DATETIME_KEY,
                    Json::String(dt.format(NAIVE_DATETIME_FORMAT).to_string()),
                )
            }
            Value::DateTimeOffset(dt) => {
                check_micros("DateTime", dt.nanosecond())?;
                let offset = dt.offset().local_minus_utc();
                if offset % 60 != 0 {
                    return Err(TranscodingError::encode(
                        "DateTime",
                        format!("offset of {offset}s is not a whole number of minutes"),
                    ));
                }
                wrap(
                    DATETIME_KEY,
                    Json::String(dt.format(OFFSET_DATETIME_FORMAT).to_string()),
                )
            }
            Value::Date(d) => wrap(DATE_KEY, Json::String(d.format(DATE_FORMAT).to_string())),
            Value::Time(t) => {
                check_micros("NaiveTime", t.nanosecond())?;
                wrap(TIME_KEY, Json::String(t.format(TIME_FORMAT).to_string()))
            }
            Value::Decimal(d) => wrap(DECIMAL_KEY, Json::String(d.to_string())),
            Value::Uuid(u) => wrap(UUID_KEY, Json::String(u.simple().to_string())),
            Value::Tuple { topic, items } => {
                self.check_encodable(topic, Some(items.len()))?;
                let state = Json::Array(self.to_json_items(items.iter())?);
                wrap(TUPLE_KEY, topic_body(state, topic))
            }
            Value::Object { topic, state } => {
                self.check_encodable(topic, None)?;
                let state = Json::Object(self.to_json_entries(state)?);
                wrap(CLASS_KEY, topic_body(state, topic))
            }
            Value::Deque(items) => wrap(DEQUE_KEY, Json::Array(self.to_json_items(items.iter())?)),
        };
        Ok(json)
    }

    fn to_json_items<'a>(
        &self,
        items: impl Iterator<Item = &'a Value>,
    ) -> Result<Vec<Json>, TranscodingError> {
        items.map(|item| self.to_json(item)).collect()
    }

    fn to_json_entries(
        &self,
        entries: &BTreeMap<String, Value>,
    ) -> Result<Map<String, Json>, TranscodingError> {
        let mut map = Map::new();
        for (key, value) in entries {
            map.insert(key.clone(), self.to_json(value)?);
        }
        Ok(map)
    }

    /// A custom type can only be encoded if its topic would resolve on decode.
    fn check_encodable(&self, topic: &str, arity: Option<usize>) -> Result<(), TranscodingError> {
        let shape = self
            .registry
            .resolve(topic)
            .map_err(|e| TranscodingError::encode(topic, e.to_string()))?;

        match (shape, arity) {
            (Shape::Record, None) => Ok(()),
            (Shape::Tuple { arity: None }, Some(_)) => Ok(()),
            (Shape::Tuple { arity: Some(expected) }, Some(actual)) if expected == actual => Ok(()),
            (shape, _) => Err(TranscodingError::encode(
                topic,
                format!("value does not match registered shape {shape:?}"),
            )),
        }
    }

    // ------------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------------

    fn from_json(&self, json: Json) -> Result<Value, TranscodingError> {
        match json {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(b)),
            Json::Number(n) => number_value(&n),
            Json::String(s) => Ok(Value::String(s)),
            Json::Array(items) => Ok(Value::List(self.from_json_items(items)?)),
            Json::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(key) = map.keys().find_map(|k| reserved_key(k)) {
                        if let Some(inner) = map.remove(key) {
                            return self.decode_wrapper(key, inner);
                        }
                    }
                }
                Ok(Value::Map(self.from_json_entries(map)?))
            }
        }
    }

    fn from_json_items(&self, items: Vec<Json>) -> Result<Vec<Value>, TranscodingError> {
        items.into_iter().map(|item| self.from_json(item)).collect()
    }

    fn from_json_entries(&self, map: Map<String, Json>) -> Result<ObjectState, TranscodingError> {
        map.into_iter()
            .map(|(key, value)| Ok((key, self.from_json(value)?)))
            .collect()
    }

    fn decode_wrapper(&self, key: &'static str, inner: Json) -> Result<Value, TranscodingError> {
        match key {
            DATETIME_KEY => {
                let text = expect_string(key, inner)?;
                if let Ok(dt) = DateTime::parse_from_str(&text, OFFSET_DATETIME_PARSE) {
                    return Ok(Value::DateTimeOffset(dt));
                }
                NaiveDateTime::parse_from_str(&text, NAIVE_DATETIME_PARSE)
                    .map(Value::DateTime)
                    .map_err(|e| TranscodingError::malformed(key, format!("{text:?}: {e}")))
            }
            DATE_KEY => {
                let text = expect_string(key, inner)?;
                NaiveDate::parse_from_str(&text, DATE_FORMAT)
                    .map(Value::Date)
                    .map_err(|e| TranscodingError::malformed(key, format!("{text:?}: {e}")))
            }
            TIME_KEY => {
                let text = expect_string(key, inner)?;
                NaiveTime::parse_from_str(&text, TIME_PARSE)
                    .map(Value::Time)
                    .map_err(|e| TranscodingError::malformed(key, format!("{text:?}: {e}")))
            }
            DECIMAL_KEY => {
                let text = expect_string(key, inner)?;
                Decimal::from_str_exact(&text)
                    .map(Value::Decimal)
                    .map_err(|e| TranscodingError::malformed(key, format!("{text:?}: {e}")))
            }
            UUID_KEY => {
                let text = expect_string(key, inner)?;
                Uuid::parse_str(&text)
                    .map(Value::Uuid)
                    .map_err(|e| TranscodingError::malformed(key, format!("{text:?}: {e}")))
            }
            DEQUE_KEY => match inner {
                Json::Array(items) => Ok(Value::Deque(
                    self.from_json_items(items)?.into_iter().collect::<VecDeque<_>>(),
                )),
                other => Err(TranscodingError::malformed(key, format!("expected array, got {other}"))),
            },
            TUPLE_KEY => {
                let (topic, state) = split_topic_body(key, inner)?;
                let Json::Array(items) = state else {
                    return Err(TranscodingError::malformed(key, "state must be an array"));
                };
                match self.registry.resolve(&topic)? {
                    Shape::Tuple { arity: Some(arity) } if arity != items.len() => {
                        Err(TranscodingError::resolution(
                            topic,
                            format!("registered with {arity} items, got {}", items.len()),
                        ))
                    }
                    Shape::Tuple { .. } => Ok(Value::Tuple {
                        items: self.from_json_items(items)?,
                        topic,
                    }),
                    Shape::Record => Err(TranscodingError::resolution(topic, "registered as a record")),
                }
            }
            CLASS_KEY => {
                let (topic, state) = split_topic_body(key, inner)?;
                let Json::Object(attributes) = state else {
                    return Err(TranscodingError::malformed(key, "state must be an object"));
                };
                match self.registry.resolve(&topic)? {
                    Shape::Record => Ok(Value::Object {
                        state: self.from_json_entries(attributes)?,
                        topic,
                    }),
                    Shape::Tuple { .. } => Err(TranscodingError::resolution(topic, "registered as a tuple")),
                }
            }
            _ => Err(TranscodingError::malformed(key, "unknown reserved key")),
        }
    }
}

fn wrap(key: &str, inner: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), inner);
    Json::Object(map)
}

/// `{"state": ..., "topic": ...}`, inserted in key order.
fn topic_body(state: Json, topic: &str) -> Json {
    let mut body = Map::new();
    body.insert("state".to_string(), state);
    body.insert("topic".to_string(), Json::String(topic.to_string()));
    Json::Object(body)
}

fn split_topic_body(key: &'static str, inner: Json) -> Result<(String, Json), TranscodingError> {
    let Json::Object(mut body) = inner else {
        return Err(TranscodingError::malformed(key, "expected an object with state and topic"));
    };
    let topic = match body.remove("topic") {
        Some(Json::String(topic)) => topic,
        _ => return Err(TranscodingError::malformed(key, "missing topic")),
    };
    let state = body
        .remove("state")
        .ok_or_else(|| TranscodingError::malformed(key, "missing state"))?;
    Ok((topic, state))
}

/// The wire carries six fractional digits.
fn check_micros(type_name: &str, nanos: u32) -> Result<(), TranscodingError> {
    if nanos % 1_000 != 0 {
        return Err(TranscodingError::encode(
            type_name,
            format!("{nanos}ns is finer than microsecond precision"),
        ));
    }
    Ok(())
}

fn expect_string(key: &'static str, inner: Json) -> Result<String, TranscodingError> {
    match inner {
        Json::String(text) => Ok(text),
        other => Err(TranscodingError::malformed(key, format!("expected string, got {other}"))),
    }
}

fn number_value(n: &Number) -> Result<Value, TranscodingError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Value::UInt(u));
    }
    n.as_f64()
        .map(Value::Float)
        .ok_or_else(|| TranscodingError::malformed("number", n.to_string()))
}

/// Compact JSON with `", "` and `": "` separators.
struct CanonicalFormatter;

impl serde_json::ser::Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}
