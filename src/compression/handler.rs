//! Whole-block compressors

use crate::tiff::errors::TiffResult;

/// A compressor that only sees complete strips or tiles.
///
/// Rows, predictors and byte order are handled by [`BlockCodec`], which
/// turns a handler into a full [`Codec`](super::codec::Codec).
///
/// [`BlockCodec`]: super::block::BlockCodec
pub trait CompressionHandler: Send + Sync {
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Name reported by the codec built from this handler
    fn name(&self) -> &'static str;

    /// Value of the Compression field for data this handler produces
    fn scheme(&self) -> u16;
}
