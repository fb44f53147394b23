//! Zstandard handler (compression code 50000)
//!
//! The level is fixed when the handler is built; register a codec built
//! with [`ZstdHandler::with_level`] to change it for a registry.

use log::trace;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

const DEFAULT_LEVEL: i32 = 9;

pub struct ZstdHandler {
    level: i32,
}

impl ZstdHandler {
    pub fn new() -> Self {
        ZstdHandler { level: DEFAULT_LEVEL }
    }

    /// Handler compressing at `level`, clamped to 1..=22
    pub fn with_level(level: i32) -> Self {
        ZstdHandler { level: level.clamp(1, 22) }
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let decoded = zstd::decode_all(data)
            .map_err(|e| TiffError::CodecError(format!("ZSTD: Decoding error: {}", e)))?;
        trace!("ZSTD: {} bytes decoded to {}", data.len(), decoded.len());
        Ok(decoded)
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        zstd::encode_all(data, self.level)
            .map_err(|e| TiffError::CodecError(format!("ZSTD: Encoding error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn scheme(&self) -> u16 {
        compression::ZSTD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(ZstdHandler::with_level(40).level(), 22);
        assert_eq!(ZstdHandler::with_level(0).level(), 1);
        assert_eq!(ZstdHandler::default().level(), DEFAULT_LEVEL);
    }

    #[test]
    fn test_zstd_round_trip() {
        let handler = ZstdHandler::with_level(3);
        let data = b"strip strip strip strip".repeat(20);
        let packed = handler.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(handler.decompress(&packed).unwrap(), data);
        assert!(handler.decompress(&[]).unwrap().is_empty());
    }
}
