//! Codec for uncompressed data (compression code 1)

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::codec::{Codec, CodecSetup, DecodedBlock};

/// Passes data through unchanged
#[derive(Default)]
pub struct NoneCodec {
    row_size: usize,
    decoded: DecodedBlock,
}

impl NoneCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for NoneCodec {
    fn scheme(&self) -> u16 {
        compression::NONE
    }

    fn name(&self) -> &str {
        "None"
    }

    fn setup_decode(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.row_size = setup.row_size()?;
        Ok(())
    }

    fn pre_decode(&mut self, raw: Vec<u8>, _sample: u16) -> TiffResult<()> {
        self.decoded.reset(raw);
        Ok(())
    }

    fn decode_row(&mut self, out: &mut [u8], _sample: u16) -> TiffResult<()> {
        self.decoded.take(out, "None")
    }

    fn encode_row(&mut self, data: &[u8], out: &mut Vec<u8>, _sample: u16) -> TiffResult<()> {
        out.extend_from_slice(data);
        Ok(())
    }

    fn seek(&mut self, rows: u32) -> TiffResult<()> {
        let bytes = (rows as usize)
            .checked_mul(self.row_size)
            .ok_or(TiffError::Overflow("seek"))?;
        self.decoded.skip(bytes, "None")
    }

    fn cleanup(&mut self) {
        self.decoded.clear();
    }
}
