//! Handler for Deflate compressed data

use std::io::{Read, Write};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// Zlib compression handler
///
/// Serves both the registered Adobe Deflate code (8) and the older
/// pre-registration code (32946); the stream format is the same.
pub struct DeflateHandler {
    scheme: u16,
    level: Compression,
}

impl DeflateHandler {
    /// Adobe Deflate (compression code 8)
    pub fn adobe() -> Self {
        DeflateHandler { scheme: compression::DEFLATE, level: Compression::default() }
    }

    /// Deflate under the legacy code 32946
    pub fn legacy() -> Self {
        DeflateHandler { scheme: compression::DEFLATE_OLD, level: Compression::default() }
    }

    /// Same scheme with an explicit zlib level (0-9)
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Compression::new(level.min(9));
        self
    }
}

impl CompressionHandler for DeflateHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed_data = Vec::new();
        match decoder.read_to_end(&mut decompressed_data) {
            Ok(_) => Ok(decompressed_data),
            Err(e) => Err(TiffError::CodecError(format!("Decoding error: {}", e))),
        }
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    fn name(&self) -> &'static str {
        if self.scheme == compression::DEFLATE {
            "AdobeDeflate"
        } else {
            "Deflate"
        }
    }

    fn scheme(&self) -> u16 {
        self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deflate_round_trip() {
        let handler = DeflateHandler::adobe().with_level(9);
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 7) as u8).collect();
        let packed = handler.compress(&data).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(handler.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = DeflateHandler::legacy().decompress(&[1, 2, 3, 4]).unwrap_err();
        assert!(matches!(err, TiffError::CodecError(_)));
    }
}
