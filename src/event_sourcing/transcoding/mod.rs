// ============================================================================
// Transcoding - Type-Preserving JSON Codec
// ============================================================================
//
// Converts values, events included, to canonical JSON text and back.
// Custom types are tagged with a topic and resolved through an explicit
// registry instead of a fixed schema.
//
// ============================================================================

mod codec;
mod error;
mod record;
mod registry;
mod transcoder;
mod value;

pub use codec::{into_items, take_item, FromValue, ToValue};
pub use error::TranscodingError;
pub use record::{into_state, take_field, Record, TupleRecord};
pub use registry::{Shape, Topic, TopicRegistry, TUPLE_TOPIC};
pub use transcoder::{
    Transcoder, CLASS_KEY, DATETIME_KEY, DATE_KEY, DECIMAL_KEY, DEQUE_KEY, RESERVED_KEYS,
    TIME_KEY, TUPLE_KEY, UUID_KEY,
};
pub use value::{ObjectState, Value};
