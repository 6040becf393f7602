// ============================================================================
// Event Sourcing Infrastructure
// ============================================================================
//
// Generic, reusable event sourcing infrastructure.
// Domain-specific code is in src/domain/
//
// ============================================================================

pub mod compressor;
pub mod core;
pub mod store;
pub mod transcoding;

pub use self::compressor::{CompressionError, Compressor, ZlibCompressor};
pub use self::core::*;
pub use self::store::*;
pub use self::transcoding::{FromValue, ToValue, Transcoder, TranscodingError};
