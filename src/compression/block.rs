//! Codec adapter for whole-block compressors
//!
//! Decompresses a strip or tile in one go on `pre_decode`, then hands out
//! rows. Encoded rows are collected and compressed on `post_encode`. The
//! horizontal differencing predictor runs on the decoded side.

use log::debug;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::tiff::catalog::FieldInfo;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::{FieldCount, TagType};
use super::codec::{Codec, CodecSetup, DecodedBlock};
use super::handler::CompressionHandler;
use super::predictor::PredictorState;

/// [`Codec`] built from a [`CompressionHandler`]
pub struct BlockCodec<H: CompressionHandler> {
    handler: H,
    byte_order: Box<dyn ByteOrderHandler>,
    predictor: Option<PredictorState>,
    row_size: usize,
    decoded: DecodedBlock,
    pending: Vec<u8>,
}

impl<H: CompressionHandler> BlockCodec<H> {
    pub fn new(handler: H) -> Self {
        BlockCodec {
            handler,
            byte_order: ByteOrder::host().create_handler(),
            predictor: None,
            row_size: 0,
            decoded: DecodedBlock::default(),
            pending: Vec::new(),
        }
    }

    fn configure(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.byte_order = setup.byte_order.create_handler();
        self.row_size = setup.row_size()?;
        self.predictor = PredictorState::from_directory(setup.dir, self.row_size)?;
        Ok(())
    }
}

impl<H: CompressionHandler> Codec for BlockCodec<H> {
    fn scheme(&self) -> u16 {
        self.handler.scheme()
    }

    fn name(&self) -> &str {
        self.handler.name()
    }

    fn fields(&self) -> Vec<FieldInfo> {
        vec![FieldInfo::custom(
            tags::PREDICTOR,
            TagType::Short,
            FieldCount::Fixed(1),
            FieldCount::Fixed(1),
            "Predictor",
        )]
    }

    fn setup_decode(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.configure(setup)
    }

    fn pre_decode(&mut self, raw: Vec<u8>, _sample: u16) -> TiffResult<()> {
        let decoded = self.handler.decompress(&raw)?;
        debug!("{}: {} bytes decoded to {}", self.handler.name(), raw.len(), decoded.len());
        self.decoded.reset(decoded);
        Ok(())
    }

    fn decode_row(&mut self, out: &mut [u8], _sample: u16) -> TiffResult<()> {
        self.decoded.take(out, self.handler.name())?;
        if let Some(predictor) = &self.predictor {
            predictor.accumulate(out, self.byte_order.as_ref())?;
        }
        Ok(())
    }

    fn setup_encode(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.configure(setup)
    }

    fn pre_encode(&mut self, _sample: u16) -> TiffResult<()> {
        self.pending.clear();
        Ok(())
    }

    fn encode_row(&mut self, data: &[u8], _out: &mut Vec<u8>, _sample: u16) -> TiffResult<()> {
        let start = self.pending.len();
        self.pending.extend_from_slice(data);
        if let Some(predictor) = &self.predictor {
            predictor.difference(&mut self.pending[start..], self.byte_order.as_ref())?;
        }
        Ok(())
    }

    fn post_encode(&mut self, out: &mut Vec<u8>) -> TiffResult<()> {
        let packed = self.handler.compress(&self.pending)?;
        out.extend_from_slice(&packed);
        self.pending.clear();
        Ok(())
    }

    fn seek(&mut self, rows: u32) -> TiffResult<()> {
        let bytes = (rows as usize)
            .checked_mul(self.row_size)
            .ok_or(TiffError::Overflow("seek"))?;
        self.decoded.skip(bytes, self.handler.name())
    }

    fn cleanup(&mut self) {
        self.decoded.clear();
        self.pending = Vec::new();
        self.predictor = None;
    }
}
