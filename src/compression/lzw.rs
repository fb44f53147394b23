//! Handler for LZW compressed data

use weezl::decode::Decoder;
use weezl::encode::Encoder;
use weezl::BitOrder;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;

/// TIFF-flavoured LZW handler (compression code 5)
///
/// Codes are packed most significant bit first and the code width grows
/// one code early, as TIFF writers have always done.
pub struct LzwHandler;

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut decoder = Decoder::with_tiff_size_switch(BitOrder::Msb, 8);
        decoder
            .decode(data)
            .map_err(|e| TiffError::CodecError(format!("LZW decoding error: {}", e)))
    }

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>> {
        let mut encoder = Encoder::with_tiff_size_switch(BitOrder::Msb, 8);
        encoder
            .encode(data)
            .map_err(|e| TiffError::CodecError(format!("LZW encoding error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn scheme(&self) -> u16 {
        compression::LZW
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzw_round_trip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i / 3) as u8).collect();
        let packed = LzwHandler.compress(&data).unwrap();
        assert_eq!(LzwHandler.decompress(&packed).unwrap(), data);
    }
}
