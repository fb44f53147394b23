//! Placeholder codec for schemes without an implementation

use crate::tiff::errors::{TiffError, TiffResult};
use super::codec::Codec;

/// Fails every encode and decode for a known but unavailable scheme
pub struct NotConfiguredCodec {
    scheme: u16,
    name: String,
}

impl NotConfiguredCodec {
    pub fn new(scheme: u16, name: impl Into<String>) -> Self {
        NotConfiguredCodec { scheme, name: name.into() }
    }

    fn error(&self) -> TiffError {
        TiffError::CodecNotConfigured { scheme: self.scheme, name: self.name.clone() }
    }
}

impl Codec for NotConfiguredCodec {
    fn scheme(&self) -> u16 {
        self.scheme
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn can_encode(&self) -> bool {
        false
    }

    fn can_decode(&self) -> bool {
        false
    }

    fn pre_decode(&mut self, _raw: Vec<u8>, _sample: u16) -> TiffResult<()> {
        Err(self.error())
    }

    fn decode_row(&mut self, _out: &mut [u8], _sample: u16) -> TiffResult<()> {
        Err(self.error())
    }

    fn encode_row(&mut self, _data: &[u8], _out: &mut Vec<u8>, _sample: u16) -> TiffResult<()> {
        Err(self.error())
    }
}
