//! Strip, tile and scanline access
//!
//! Raw access moves strip bytes as stored. Encoded access runs the codec
//! lifecycle and normalises the result: bit order is fixed before decoding
//! and multi-byte samples are swapped to host order after it (and back to
//! file order on a copy before encoding).

use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom, Write};

use log::trace;

use crate::compression::CodecSetup;
use crate::io::seekable::TiffStream;
use crate::tiff::constants::{fill_order, planar_config};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::file::{CoderState, Mode, TiffFile};
use crate::tiff::geometry::to_usize;
use crate::utils::swab::{reverse_bits, swab_samples};

impl<S: TiffStream> TiffFile<S> {
    fn check_read(&self, tiles: bool) -> TiffResult<()> {
        if self.mode == Mode::Write {
            return Err(TiffError::UsageError("File not open for reading".to_string()));
        }
        if tiles != self.dir.is_tiled() {
            let message = if tiles {
                "Can not read tiles from a striped image"
            } else {
                "Can not read scanlines from a tiled image"
            };
            return Err(TiffError::UsageError(message.to_string()));
        }
        Ok(())
    }

    fn check_block_index(&self, index: u32, tiles: bool) -> TiffResult<()> {
        if index >= self.dir.nstrips {
            return Err(TiffError::GeometryError(format!(
                "{}: {} out of range, max {}",
                index,
                if tiles { "Tile" } else { "Strip" },
                self.dir.nstrips
            )));
        }
        Ok(())
    }

    fn ensure_decode(&mut self) -> TiffResult<()> {
        if !self.codec.can_decode() {
            return Err(TiffError::CodecNotConfigured {
                scheme: self.dir.compression,
                name: self.codec.name().to_string(),
            });
        }
        if self.coder != CoderState::Decode {
            let setup = CodecSetup { dir: &self.dir, byte_order: self.byte_order };
            self.codec.setup_decode(&setup)?;
            self.coder = CoderState::Decode;
        }
        Ok(())
    }

    fn ensure_encode(&mut self) -> TiffResult<()> {
        if !self.codec.can_encode() {
            return Err(TiffError::CodecNotConfigured {
                scheme: self.dir.compression,
                name: self.codec.name().to_string(),
            });
        }
        if self.coder != CoderState::Encode {
            let setup = CodecSetup { dir: &self.dir, byte_order: self.byte_order };
            self.codec.setup_encode(&setup)?;
            self.coder = CoderState::Encode;
        }
        Ok(())
    }

    /// Sample plane a strip or tile belongs to
    fn block_sample(&self, index: u32) -> u16 {
        if self.dir.planar_config == planar_config::PLANAR && self.dir.strips_per_image > 0 {
            (index / self.dir.strips_per_image) as u16
        } else {
            0
        }
    }

    /// First row of strip `strip` within its plane
    fn strip_first_row(&self, strip: u32) -> u32 {
        let spi = self.dir.strips_per_image.max(1);
        let row = u64::from(strip % spi) * u64::from(self.dir.rows_per_strip);
        u32::try_from(row).unwrap_or(u32::MAX)
    }

    /// Rows held by strip `strip`
    fn strip_rows(&self, strip: u32) -> u32 {
        let rps = self.dir.rows_per_strip.min(self.dir.image_length);
        let first = self.strip_first_row(strip);
        self.dir.image_length.saturating_sub(first).min(rps)
    }

    /// Reads the stored bytes of strip or tile `index`
    fn read_block(&mut self, index: u32, tiles: bool) -> TiffResult<Vec<u8>> {
        self.check_block_index(index, tiles)?;
        let count = self.dir.raw_strip_size(index)?;
        let offset = self.dir.strip_offsets[index as usize];

        let available = self.file_size()?.saturating_sub(offset);
        if available < count {
            return Err(TiffError::FormatError(format!(
                "Read error on {} {}; got {} bytes, expected {}",
                if tiles { "tile" } else { "strip" },
                index,
                available,
                count
            )));
        }

        let mut data = vec![0u8; to_usize(count, "read_block")?];
        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.read_exact(&mut data)?;
        trace!("Read {} bytes of block {} at {:#x}", count, index, offset);
        Ok(data)
    }

    /// Loads strip or tile `index` into the decoder
    fn fill_block(&mut self, index: u32, tiles: bool) -> TiffResult<()> {
        self.ensure_decode()?;
        let mut raw = self.read_block(index, tiles)?;
        if self.dir.fill_order == fill_order::LSB_TO_MSB && !self.codec.handles_fill_order() {
            reverse_bits(&mut raw);
        }
        let sample = self.block_sample(index);
        self.codec.pre_decode(raw, sample)?;
        if tiles {
            self.cursor.tile = Some(index);
            self.cursor.strip = None;
        } else {
            self.cursor.strip = Some(index);
            self.cursor.tile = None;
            self.cursor.row = self.strip_first_row(index);
        }
        Ok(())
    }

    /// Width of the byte swap applied to decoded samples, if any
    fn swab_width(&self) -> Option<usize> {
        if !self.byte_order.needs_swap() {
            return None;
        }
        match self.dir.bits_per_sample {
            16 => Some(2),
            24 => Some(3),
            32 => Some(4),
            64 | 128 => Some(8),
            _ => None,
        }
    }

    fn swab_decoded(&self, buf: &mut [u8]) {
        if let Some(width) = self.swab_width() {
            swab_samples(buf, width);
        }
    }

    /// Samples in file byte order, copying only when a swap is needed
    fn swab_for_encode<'a>(&self, data: &'a [u8]) -> Cow<'a, [u8]> {
        match self.swab_width() {
            Some(width) => {
                let mut copy = data.to_vec();
                swab_samples(&mut copy, width);
                Cow::Owned(copy)
            }
            None => Cow::Borrowed(data),
        }
    }

    // ---- reading ----

    /// Stored bytes of a strip, undecoded
    pub fn read_raw_strip(&mut self, strip: u32) -> TiffResult<Vec<u8>> {
        self.check_read(false)?;
        self.read_block(strip, false)
    }

    /// Stored bytes of a tile, undecoded
    pub fn read_raw_tile(&mut self, tile: u32) -> TiffResult<Vec<u8>> {
        self.check_read(true)?;
        self.read_block(tile, true)
    }

    /// Decodes strip `strip` into `buf`.
    ///
    /// At most `buf.len()` bytes are produced; returns the number written.
    pub fn read_encoded_strip(&mut self, strip: u32, buf: &mut [u8]) -> TiffResult<usize> {
        self.check_read(false)?;
        self.check_block_index(strip, false)?;
        let rows = self.strip_rows(strip);
        let size = to_usize(self.dir.vstrip_size(rows)?, "read_encoded_strip")?;
        let n = size.min(buf.len());

        self.fill_block(strip, false)?;
        let sample = self.block_sample(strip);
        self.codec.decode_strip(&mut buf[..n], sample)?;
        self.swab_decoded(&mut buf[..n]);
        self.cursor.strip = None;
        Ok(n)
    }

    /// Decodes a whole strip into a new buffer
    pub fn read_strip(&mut self, strip: u32) -> TiffResult<Vec<u8>> {
        self.check_read(false)?;
        self.check_block_index(strip, false)?;
        let rows = self.strip_rows(strip);
        let mut buf = vec![0u8; to_usize(self.dir.vstrip_size(rows)?, "read_strip")?];
        let n = self.read_encoded_strip(strip, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Decodes tile `tile` into `buf`; returns the number of bytes written
    pub fn read_encoded_tile(&mut self, tile: u32, buf: &mut [u8]) -> TiffResult<usize> {
        self.check_read(true)?;
        self.check_block_index(tile, true)?;
        let size = to_usize(self.dir.tile_size()?, "read_encoded_tile")?;
        let n = size.min(buf.len());

        self.fill_block(tile, true)?;
        let sample = self.block_sample(tile);
        self.codec.decode_tile(&mut buf[..n], sample)?;
        self.swab_decoded(&mut buf[..n]);
        self.cursor.tile = None;
        Ok(n)
    }

    /// Decodes the tile holding pixel (x, y, z) of plane `sample`
    pub fn read_tile(&mut self, x: u32, y: u32, z: u32, sample: u16) -> TiffResult<Vec<u8>> {
        self.check_read(true)?;
        self.dir.check_tile(x, y, z, sample)?;
        let tile = self.dir.compute_tile(x, y, z, sample)?;
        let mut buf = vec![0u8; to_usize(self.dir.tile_size()?, "read_tile")?];
        let n = self.read_encoded_tile(tile, &mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Decodes row `row` of plane `sample` into `buf`.
    ///
    /// Rows are decoded sequentially within a strip: reading ahead skips
    /// with the codec's seek, reading backwards restarts the strip.
    pub fn read_scanline(&mut self, buf: &mut [u8], row: u32, sample: u16) -> TiffResult<()> {
        self.check_read(false)?;
        if row >= self.dir.image_length {
            return Err(TiffError::GeometryError(format!(
                "{}: Row out of range, max {}",
                row, self.dir.image_length
            )));
        }
        let strip = self.dir.compute_strip(row, sample)?;
        self.check_block_index(strip, false)?;

        let size = to_usize(self.dir.scanline_size()?, "read_scanline")?;
        if buf.len() < size {
            return Err(TiffError::UsageError(format!(
                "Scanline buffer holds {} bytes, {} needed",
                buf.len(),
                size
            )));
        }

        if self.cursor.strip != Some(strip) || row < self.cursor.row {
            self.fill_block(strip, false)?;
        }
        if row > self.cursor.row {
            self.codec.seek(row - self.cursor.row)?;
            self.cursor.row = row;
        }

        self.codec.decode_row(&mut buf[..size], sample)?;
        self.swab_decoded(&mut buf[..size]);
        self.cursor.row += 1;
        Ok(())
    }

    // ---- writing ----

    /// Extends the strip arrays so `strip` exists (contiguous images only)
    fn grow_strips(&mut self, strip: u32) -> TiffResult<()> {
        if strip < self.dir.nstrips {
            return Ok(());
        }
        if self.dir.planar_config == planar_config::PLANAR {
            return Err(TiffError::UsageError(
                "Can not grow image by strips when using separate planes".to_string(),
            ));
        }
        let nstrips = strip
            .checked_add(1)
            .ok_or(TiffError::Overflow("grow_strips"))?;
        self.dir.strip_offsets.resize(nstrips as usize, 0);
        self.dir.strip_byte_counts.resize(nstrips as usize, 0);
        self.dir.nstrips = nstrips;
        self.dir.strips_per_image = nstrips;
        Ok(())
    }

    /// Writes `data` as the contents of strip or tile `index`.
    ///
    /// The old location is reused when the new data fits, otherwise the
    /// data goes to the end of the file.
    fn append_to_strip(&mut self, index: u32, data: &[u8]) -> TiffResult<()> {
        let i = index as usize;
        let old_offset = self.dir.strip_offsets[i];
        let old_count = self.dir.strip_byte_counts[i];
        let len = data.len() as u64;

        let offset = if old_offset != 0 && len <= old_count {
            old_offset
        } else {
            self.file_size()?
        };
        let end = offset.checked_add(len).ok_or(TiffError::Overflow("append_to_strip"))?;
        if !self.big_tiff && end > u64::from(u32::MAX) {
            return Err(TiffError::Overflow("Maximum TIFF file size exceeded"));
        }

        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.write_all(data)?;
        self.dir.strip_offsets[i] = offset;
        self.dir.strip_byte_counts[i] = len;
        self.dirty = true;
        trace!("Wrote {} bytes of block {} at {:#x}", len, index, offset);
        Ok(())
    }

    /// Finishes encoder output and fixes bit order before it is stored
    fn finish_block(&mut self, out: &mut Vec<u8>) -> TiffResult<()> {
        self.codec.post_encode(out)?;
        if self.dir.fill_order == fill_order::LSB_TO_MSB && !self.codec.handles_fill_order() {
            reverse_bits(out);
        }
        Ok(())
    }

    /// Writes pending scanline output of the current strip
    pub(crate) fn flush_data(&mut self) -> TiffResult<()> {
        let Some(strip) = self.cursor.pending_strip.take() else {
            return Ok(());
        };
        let mut out = std::mem::take(&mut self.cursor.pending);
        self.finish_block(&mut out)?;
        self.append_to_strip(strip, &out)
    }

    /// Stores `data` as strip `strip` without encoding
    pub fn write_raw_strip(&mut self, strip: u32, data: &[u8]) -> TiffResult<usize> {
        self.write_check(false)?;
        self.flush_data()?;
        self.grow_strips(strip)?;
        self.append_to_strip(strip, data)?;
        Ok(data.len())
    }

    /// Stores `data` as tile `tile` without encoding
    pub fn write_raw_tile(&mut self, tile: u32, data: &[u8]) -> TiffResult<usize> {
        self.write_check(true)?;
        self.check_block_index(tile, true)?;
        self.append_to_strip(tile, data)?;
        Ok(data.len())
    }

    /// Encodes `data` as strip `strip`
    pub fn write_encoded_strip(&mut self, strip: u32, data: &[u8]) -> TiffResult<usize> {
        self.write_check(false)?;
        self.flush_data()?;
        self.grow_strips(strip)?;
        self.ensure_encode()?;

        let sample = self.block_sample(strip);
        self.cursor.row = self.strip_first_row(strip);
        self.codec.pre_encode(sample)?;
        let samples = self.swab_for_encode(data);
        let mut out = Vec::new();
        self.codec.encode_strip(&samples, &mut out, sample)?;
        self.finish_block(&mut out)?;
        self.append_to_strip(strip, &out)?;
        Ok(data.len())
    }

    /// Encodes `data` as tile `tile`; data beyond one tile is ignored
    pub fn write_encoded_tile(&mut self, tile: u32, data: &[u8]) -> TiffResult<usize> {
        self.write_check(true)?;
        self.check_block_index(tile, true)?;
        self.ensure_encode()?;

        let size = to_usize(self.dir.tile_size()?, "write_encoded_tile")?;
        let data = &data[..data.len().min(size)];
        let sample = self.block_sample(tile);
        self.codec.pre_encode(sample)?;
        let samples = self.swab_for_encode(data);
        let mut out = Vec::new();
        self.codec.encode_tile(&samples, &mut out, sample)?;
        self.finish_block(&mut out)?;
        self.append_to_strip(tile, &out)?;
        Ok(data.len())
    }

    /// Encodes the tile holding pixel (x, y, z) of plane `sample`
    pub fn write_tile(&mut self, data: &[u8], x: u32, y: u32, z: u32, sample: u16) -> TiffResult<usize> {
        self.dir.check_tile(x, y, z, sample)?;
        let tile = self.dir.compute_tile(x, y, z, sample)?;
        self.write_encoded_tile(tile, data)
    }

    /// Encodes row `row` of plane `sample`.
    ///
    /// Rows must arrive in order within a strip. Writing past the image
    /// length grows the image (contiguous images only).
    pub fn write_scanline(&mut self, buf: &[u8], row: u32, sample: u16) -> TiffResult<()> {
        self.write_check(false)?;
        self.ensure_encode()?;

        if row >= self.dir.image_length {
            if self.dir.planar_config == planar_config::PLANAR {
                return Err(TiffError::UsageError(
                    "Can not change \"ImageLength\" when using separate planes".to_string(),
                ));
            }
            self.dir.image_length = row.checked_add(1).ok_or(TiffError::Overflow("write_scanline"))?;
            self.dirty = true;
        }

        let strip = self.dir.compute_strip(row, sample)?;
        self.grow_strips(strip)?;

        if self.cursor.pending_strip != Some(strip) {
            self.flush_data()?;
            let sample = self.block_sample(strip);
            self.codec.pre_encode(sample)?;
            self.cursor.pending_strip = Some(strip);
            self.cursor.row = self.strip_first_row(strip);
        }
        if row != self.cursor.row {
            return Err(TiffError::UsageError(format!(
                "Scanline {} out of order, expected {}",
                row, self.cursor.row
            )));
        }

        let size = to_usize(self.dir.scanline_size()?, "write_scanline")?;
        if buf.len() < size {
            return Err(TiffError::UsageError(format!(
                "Scanline buffer holds {} bytes, {} needed",
                buf.len(),
                size
            )));
        }
        let samples = self.swab_for_encode(&buf[..size]);
        let mut pending = std::mem::take(&mut self.cursor.pending);
        let result = self.codec.encode_row(&samples, &mut pending, sample);
        self.cursor.pending = pending;
        result?;
        self.cursor.row += 1;

        let strip_end = u64::from(self.strip_first_row(strip)) + u64::from(self.dir.rows_per_strip);
        if u64::from(self.cursor.row) >= strip_end {
            self.flush_data()?;
        }
        Ok(())
    }
}
