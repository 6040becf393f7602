use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

// ============================================================================
// Compressor - Optional Symmetric Byte Transform
// ============================================================================
//
// Sits after encoding on the write path and before decoding on the read
// path. Never looks at what the bytes mean.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),

    #[error("Decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
}

pub trait Compressor: Send + Sync {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// zlib (deflate) compressor.
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: Compression,
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl ZlibCompressor {
    /// Level 0 (store only) to 9 (best); values above 9 are clamped.
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    pub fn level(&self) -> u32 {
        self.level.level()
    }
}

impl Compressor for ZlibCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data).map_err(CompressionError::Compress)?;
        encoder.finish().map_err(CompressionError::Compress)
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        let mut decoder = ZlibDecoder::new(data);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(CompressionError::Decompress)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_including_empty() {
        let compressor = ZlibCompressor::default();
        let inputs: Vec<Vec<u8>> = vec![
            Vec::new(),
            b"a".to_vec(),
            br#"{"__class__": {"state": {}, "topic": "a#B"}}"#.to_vec(),
            (0..=255u8).cycle().take(10_000).collect(),
        ];

        for input in inputs {
            let compressed = compressor.compress(&input).unwrap();
            assert_eq!(compressor.decompress(&compressed).unwrap(), input);
        }
    }

    #[test]
    fn test_repetitive_input_shrinks() {
        let compressor = ZlibCompressor::with_level(9);
        let input = b"balance ".repeat(512);
        let compressed = compressor.compress(&input).unwrap();
        assert!(compressed.len() < input.len() / 10);
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(ZlibCompressor::with_level(42).level(), 9);
        assert_eq!(ZlibCompressor::default().level(), 6);
    }

    #[test]
    fn test_corrupt_input_fails() {
        let compressor = ZlibCompressor::default();
        let result = compressor.decompress(b"definitely not zlib");
        assert!(matches!(result, Err(CompressionError::Decompress(_))));
    }

    #[test]
    fn test_usable_as_trait_object() {
        let compressor: Box<dyn Compressor> = Box::new(ZlibCompressor::with_level(1));
        let compressed = compressor.compress(b"payload").unwrap();
        assert_eq!(compressor.decompress(&compressed).unwrap(), b"payload");
    }
}
