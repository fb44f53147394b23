//! Codec lifecycle contract
//!
//! A session owns one [`Codec`] for the scheme named by the current
//! directory's Compression field. Decoding runs
//! `setup_decode -> pre_decode -> decode_*`, encoding runs
//! `setup_encode -> pre_encode -> encode_* -> post_encode`, and `cleanup`
//! is called whenever the session leaves the directory.
//!
//! Buffers handed to a codec are in file byte order. Byte swapping of
//! samples happens in the session around the codec calls.

use crate::io::byte_order::ByteOrder;
use crate::tiff::catalog::FieldInfo;
use crate::tiff::directory::Directory;
use crate::tiff::errors::{TiffError, TiffResult};

/// What a codec may inspect while preparing for a directory
pub struct CodecSetup<'a> {
    pub dir: &'a Directory,
    pub byte_order: ByteOrder,
}

impl CodecSetup<'_> {
    /// Bytes in one row of a strip or tile for the directory's layout
    pub fn row_size(&self) -> TiffResult<usize> {
        let size = if self.dir.is_tiled() {
            self.dir.tile_row_size()?
        } else {
            self.dir.scanline_size()?
        };
        crate::tiff::geometry::to_usize(size, "row_size")
    }
}

/// One compression scheme's encode/decode behaviour
pub trait Codec: Send {
    /// Compression scheme code
    fn scheme(&self) -> u16;

    fn name(&self) -> &str;

    fn can_encode(&self) -> bool {
        true
    }

    fn can_decode(&self) -> bool {
        true
    }

    /// Codec-private catalog entries, merged when the codec is selected
    fn fields(&self) -> Vec<FieldInfo> {
        Vec::new()
    }

    /// True if the codec applies FillOrder itself
    fn handles_fill_order(&self) -> bool {
        false
    }

    /// Adjusts fields after a directory has been read
    fn fixup_tags(&mut self, _dir: &mut Directory) -> TiffResult<()> {
        Ok(())
    }

    fn setup_decode(&mut self, _setup: &CodecSetup<'_>) -> TiffResult<()> {
        Ok(())
    }

    /// Starts decoding the raw contents of one strip or tile
    fn pre_decode(&mut self, raw: Vec<u8>, sample: u16) -> TiffResult<()>;

    /// Fills `out` with the next decoded rows
    fn decode_row(&mut self, out: &mut [u8], sample: u16) -> TiffResult<()>;

    fn decode_strip(&mut self, out: &mut [u8], sample: u16) -> TiffResult<()> {
        self.decode_row(out, sample)
    }

    fn decode_tile(&mut self, out: &mut [u8], sample: u16) -> TiffResult<()> {
        self.decode_row(out, sample)
    }

    fn setup_encode(&mut self, _setup: &CodecSetup<'_>) -> TiffResult<()> {
        Ok(())
    }

    /// Starts encoding a new strip or tile
    fn pre_encode(&mut self, _sample: u16) -> TiffResult<()> {
        Ok(())
    }

    /// Encodes whole rows, appending any output to `out`
    fn encode_row(&mut self, data: &[u8], out: &mut Vec<u8>, sample: u16) -> TiffResult<()>;

    fn encode_strip(&mut self, data: &[u8], out: &mut Vec<u8>, sample: u16) -> TiffResult<()> {
        self.encode_row(data, out, sample)
    }

    fn encode_tile(&mut self, data: &[u8], out: &mut Vec<u8>, sample: u16) -> TiffResult<()> {
        self.encode_row(data, out, sample)
    }

    /// Flushes whatever the codec still buffers for the current strip or tile
    fn post_encode(&mut self, _out: &mut Vec<u8>) -> TiffResult<()> {
        Ok(())
    }

    /// Skips `rows` decoded rows
    fn seek(&mut self, _rows: u32) -> TiffResult<()> {
        Err(TiffError::CodecError(
            "Compression algorithm does not support random access".to_string(),
        ))
    }

    /// Releases directory-scoped state
    fn cleanup(&mut self) {}

    /// Rows per strip when the caller did not choose one
    fn default_strip_size(&self, dir: &Directory, request: u32) -> TiffResult<u32> {
        dir.default_strip_size(request)
    }

    /// Tile size when the caller did not choose one
    fn default_tile_size(&self, width: u32, length: u32) -> (u32, u32) {
        Directory::default_tile_size(width, length)
    }
}

/// Decoded bytes waiting to be handed out row by row
#[derive(Debug, Default)]
pub(crate) struct DecodedBlock {
    data: Vec<u8>,
    pos: usize,
}

impl DecodedBlock {
    pub(crate) fn reset(&mut self, data: Vec<u8>) {
        self.data = data;
        self.pos = 0;
    }

    pub(crate) fn clear(&mut self) {
        self.data = Vec::new();
        self.pos = 0;
    }

    /// Copies the next `out.len()` bytes into `out`
    pub(crate) fn take(&mut self, out: &mut [u8], name: &str) -> TiffResult<()> {
        let end = self.pos + out.len();
        if end > self.data.len() {
            return Err(TiffError::CodecError(format!(
                "{}: Not enough data, short {} bytes",
                name,
                end - self.data.len()
            )));
        }
        out.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    /// Skips `bytes` decoded bytes
    pub(crate) fn skip(&mut self, bytes: usize, name: &str) -> TiffResult<()> {
        let end = self.pos.saturating_add(bytes);
        if end > self.data.len() {
            return Err(TiffError::CodecError(format!("{}: Seek past end of data", name)));
        }
        self.pos = end;
        Ok(())
    }
}
