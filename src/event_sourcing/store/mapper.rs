use std::marker::PhantomData;
use std::sync::Arc;

use uuid::Uuid;

use super::event_store::StoredEvent;
use crate::event_sourcing::compressor::{CompressionError, Compressor};
use crate::event_sourcing::core::{DomainEvent, Event};
use crate::event_sourcing::transcoding::{TopicRegistry, Transcoder, TranscodingError};

// ============================================================================
// Mapper - Events to Stored Records and Back
// ============================================================================
//
// Write path: encode -> compress
// Read path:  decompress -> decode
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    #[error(transparent)]
    Transcoding(#[from] TranscodingError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("Stored event is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// The decoded event disagrees with the record it was stored under.
    #[error("Stored record {originator_id} v{originator_version} holds a different event")]
    HeaderMismatch {
        originator_id: Uuid,
        originator_version: u64,
    },
}

pub struct Mapper<E> {
    transcoder: Transcoder,
    compressor: Option<Arc<dyn Compressor>>,
    _event: PhantomData<fn() -> E>,
}

impl<E> Clone for Mapper<E> {
    fn clone(&self) -> Self {
        Self {
            transcoder: self.transcoder.clone(),
            compressor: self.compressor.clone(),
            _event: PhantomData,
        }
    }
}

impl<E: DomainEvent> Mapper<E> {
    pub fn new(transcoder: Transcoder) -> Self {
        Self {
            transcoder,
            compressor: None,
            _event: PhantomData,
        }
    }

    /// Mapper whose registry holds exactly the topics of `E`.
    pub fn for_events() -> Result<Self, TranscodingError> {
        let mut registry = TopicRegistry::new();
        E::register_topics(&mut registry)?;
        Ok(Self::new(Transcoder::new(registry)))
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn Compressor>) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn is_compressed(&self) -> bool {
        self.compressor.is_some()
    }

    pub fn to_stored(&self, event: &Event<E>) -> Result<StoredEvent, MapperError> {
        let text = self.transcoder.encode(event)?;
        let state = match &self.compressor {
            Some(compressor) => compressor.compress(text.as_bytes())?,
            None => text.into_bytes(),
        };

        Ok(StoredEvent {
            originator_id: event.originator_id(),
            originator_version: event.originator_version(),
            topic: event.topic().to_string(),
            state,
        })
    }

    pub fn from_stored(&self, record: StoredEvent) -> Result<Event<E>, MapperError> {
        let bytes = match &self.compressor {
            Some(compressor) => compressor.decompress(&record.state)?,
            None => record.state,
        };

        let text = String::from_utf8(bytes)?;
        let event: Event<E> = self.transcoder.decode_as(&text)?;

        if event.originator_id() != record.originator_id
            || event.originator_version() != record.originator_version
        {
            return Err(MapperError::HeaderMismatch {
                originator_id: record.originator_id,
                originator_version: record.originator_version,
            });
        }

        Ok(event)
    }
}
