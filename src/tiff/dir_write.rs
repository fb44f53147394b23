//! Directory writing
//!
//! Directories are always written at the end of the file, followed by their
//! out-of-line values. A directory that already exists on disk is relocated
//! rather than overwritten in place, and the link pointing at it patched.

use std::collections::HashSet;
use std::io::{Seek, SeekFrom, Write};

use log::{debug, info};

use crate::io::seekable::TiffStream;
use crate::tiff::constants::{header, limits, planar_config, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::file::{CoderState, Mode, TiffFile};
use crate::tiff::types::{Field, TagType};
use crate::tiff::value::TagValue;
use crate::utils::string_utils::latin1_encode;

/// An entry ready to be serialised
#[derive(Debug)]
struct OutEntry {
    tag: u16,
    tag_type: TagType,
    count: u64,
    data: Vec<u8>,
}

/// SHORT when the value fits, LONG otherwise
fn short_or_long(value: u32) -> (TagType, TagValue) {
    match u16::try_from(value) {
        Ok(v) => (TagType::Short, TagValue::Short(v)),
        Err(_) => (TagType::Long, TagValue::Long(value)),
    }
}

fn per_sample<T: Clone>(value: T, spp: u16) -> Vec<T> {
    vec![value; usize::from(spp.max(1))]
}

impl<S: TiffStream> TiffFile<S> {
    pub(crate) fn check_writable(&self) -> TiffResult<()> {
        if self.mode == Mode::Read {
            return Err(TiffError::UsageError("File not open for writing".to_string()));
        }
        Ok(())
    }

    /// Allocates empty strip arrays for the current layout
    pub(crate) fn setup_strips(&mut self) -> TiffResult<()> {
        let tiled = self.dir.is_tiled();
        let nstrips = if tiled {
            self.dir.number_of_tiles()?
        } else {
            self.dir.number_of_strips()?
        };
        if nstrips == 0 {
            return Err(TiffError::GeometryError(format!(
                "Cannot handle zero number of {}",
                if tiled { "tiles" } else { "strips" }
            )));
        }
        self.dir.nstrips = nstrips;
        self.dir.strips_per_image = if self.dir.planar_config == planar_config::PLANAR {
            nstrips / u32::from(self.dir.samples_per_pixel.max(1))
        } else {
            nstrips
        };
        self.dir.strip_offsets = vec![0; nstrips as usize];
        self.dir.strip_byte_counts = vec![0; nstrips as usize];
        self.dir.mark(Field::StripOffsets);
        self.dir.mark(Field::StripByteCounts);
        Ok(())
    }

    /// Verifies the directory is ready for pixel data
    pub(crate) fn write_check(&mut self, tiles: bool) -> TiffResult<()> {
        self.check_writable()?;
        if tiles != self.dir.is_tiled() {
            let message = if tiles {
                "Can not write tiles to a striped image"
            } else {
                "Can not write scanlines to a tiled image"
            };
            return Err(TiffError::UsageError(message.to_string()));
        }
        if !self.dir.is_set(Field::ImageDimensions) {
            return Err(TiffError::UsageError("Must set \"ImageWidth\" before writing data".to_string()));
        }
        if self.dir.samples_per_pixel == 1 {
            self.dir.planar_config = planar_config::CHUNKY;
        } else if !self.dir.is_set(Field::PlanarConfig) {
            return Err(TiffError::UsageError(
                "Must set \"PlanarConfiguration\" before writing data".to_string(),
            ));
        }
        if !self.dir.is_set(Field::StripOffsets) {
            self.setup_strips()?;
        }
        self.been_writing = true;
        Ok(())
    }

    /// Entries for every present field, sorted by tag
    fn collect_entries(&self) -> TiffResult<Vec<OutEntry>> {
        let d = &self.dir;
        let spp = d.samples_per_pixel;
        let tiled = d.is_tiled();
        let mut values: Vec<(u16, TagType, TagValue)> = Vec::new();
        let mut push = |tag: u16, typed: (TagType, TagValue)| values.push((tag, typed.0, typed.1));

        for field in d.fields_set().iter() {
            match field {
                Field::ImageDimensions => {
                    push(tags::IMAGE_WIDTH, short_or_long(d.image_width));
                    push(tags::IMAGE_LENGTH, short_or_long(d.image_length));
                }
                Field::TileDimensions => {
                    push(tags::TILE_WIDTH, short_or_long(d.tile_width));
                    push(tags::TILE_LENGTH, short_or_long(d.tile_length));
                }
                Field::Resolution => {
                    push(tags::X_RESOLUTION, (TagType::Rational, TagValue::Float(d.x_resolution)));
                    push(tags::Y_RESOLUTION, (TagType::Rational, TagValue::Float(d.y_resolution)));
                }
                Field::Position => {
                    push(tags::X_POSITION, (TagType::Rational, TagValue::Float(d.x_position)));
                    push(tags::Y_POSITION, (TagType::Rational, TagValue::Float(d.y_position)));
                }
                Field::SubfileType => push(tags::NEW_SUBFILE_TYPE, (TagType::Long, TagValue::Long(d.subfile_type))),
                Field::BitsPerSample => push(
                    tags::BITS_PER_SAMPLE,
                    (TagType::Short, TagValue::Shorts(per_sample(d.bits_per_sample, spp))),
                ),
                Field::Compression => push(tags::COMPRESSION, (TagType::Short, TagValue::Short(d.compression))),
                Field::Photometric => push(
                    tags::PHOTOMETRIC_INTERPRETATION,
                    (TagType::Short, TagValue::Short(d.photometric)),
                ),
                Field::Threshholding => push(tags::THRESHHOLDING, (TagType::Short, TagValue::Short(d.threshholding))),
                Field::FillOrder => push(tags::FILL_ORDER, (TagType::Short, TagValue::Short(d.fill_order))),
                Field::Orientation => push(tags::ORIENTATION, (TagType::Short, TagValue::Short(d.orientation))),
                Field::SamplesPerPixel => push(tags::SAMPLES_PER_PIXEL, (TagType::Short, TagValue::Short(spp))),
                Field::RowsPerStrip => push(tags::ROWS_PER_STRIP, short_or_long(d.rows_per_strip)),
                Field::MinSampleValue => push(
                    tags::MIN_SAMPLE_VALUE,
                    (TagType::Short, TagValue::Shorts(per_sample(d.min_sample_value, spp))),
                ),
                Field::MaxSampleValue => push(
                    tags::MAX_SAMPLE_VALUE,
                    (TagType::Short, TagValue::Shorts(per_sample(d.max_sample_value, spp))),
                ),
                Field::PlanarConfig => push(
                    tags::PLANAR_CONFIGURATION,
                    (TagType::Short, TagValue::Short(d.planar_config)),
                ),
                Field::ResolutionUnit => push(
                    tags::RESOLUTION_UNIT,
                    (TagType::Short, TagValue::Short(d.resolution_unit)),
                ),
                Field::PageNumber => push(tags::PAGE_NUMBER, (TagType::Short, TagValue::Shorts(d.page_number.to_vec()))),
                Field::HalftoneHints => push(
                    tags::HALFTONE_HINTS,
                    (TagType::Short, TagValue::Shorts(d.halftone_hints.to_vec())),
                ),
                Field::YCbCrSubsampling => push(
                    tags::YCBCR_SUBSAMPLING,
                    (TagType::Short, TagValue::Shorts(d.ycbcr_subsampling.to_vec())),
                ),
                Field::YCbCrPositioning => push(
                    tags::YCBCR_POSITIONING,
                    (TagType::Short, TagValue::Short(d.ycbcr_positioning)),
                ),
                Field::StripOffsets | Field::StripByteCounts => {
                    let (array, tag, name) = match (field, tiled) {
                        (Field::StripOffsets, false) => (&d.strip_offsets, tags::STRIP_OFFSETS, "StripOffsets"),
                        (Field::StripOffsets, true) => (&d.strip_offsets, tags::TILE_OFFSETS, "TileOffsets"),
                        (_, false) => (&d.strip_byte_counts, tags::STRIP_BYTE_COUNTS, "StripByteCounts"),
                        (_, true) => (&d.strip_byte_counts, tags::TILE_BYTE_COUNTS, "TileByteCounts"),
                    };
                    if self.big_tiff {
                        push(tag, (TagType::Long8, TagValue::Long8s(array.clone())));
                    } else {
                        if array.iter().any(|&v| v > u64::from(u32::MAX)) {
                            debug!("{} does not fit classic TIFF", name);
                            return Err(TiffError::Overflow("strip array exceeds 32-bit classic TIFF range"));
                        }
                        let longs = array.iter().map(|&v| v as u32).collect();
                        push(tag, (TagType::Long, TagValue::Longs(longs)));
                    }
                }
                Field::ColorMap => {
                    let all: Vec<u16> = d.colormap.iter().flatten().copied().collect();
                    push(tags::COLOR_MAP, (TagType::Short, TagValue::Shorts(all)));
                }
                Field::TransferFunction => {
                    let all: Vec<u16> = d.transfer_function.iter().flatten().copied().collect();
                    push(tags::TRANSFER_FUNCTION, (TagType::Short, TagValue::Shorts(all)));
                }
                Field::ExtraSamples => {
                    if !d.extra_samples.is_empty() {
                        push(tags::EXTRA_SAMPLES, (TagType::Short, TagValue::Shorts(d.extra_samples.clone())));
                    }
                }
                Field::SampleFormat => push(
                    tags::SAMPLE_FORMAT,
                    (TagType::Short, TagValue::Shorts(per_sample(d.sample_format, spp))),
                ),
                Field::SMinSampleValue => push(
                    tags::SMIN_SAMPLE_VALUE,
                    (TagType::Double, TagValue::Doubles(per_sample(d.smin_sample_value, spp))),
                ),
                Field::SMaxSampleValue => push(
                    tags::SMAX_SAMPLE_VALUE,
                    (TagType::Double, TagValue::Doubles(per_sample(d.smax_sample_value, spp))),
                ),
                Field::ImageDepth => push(tags::IMAGE_DEPTH, (TagType::Long, TagValue::Long(d.image_depth))),
                Field::TileDepth => push(tags::TILE_DEPTH, (TagType::Long, TagValue::Long(d.tile_depth))),
                Field::RefBlackWhite => push(
                    tags::REFERENCE_BLACK_WHITE,
                    (TagType::Rational, TagValue::Floats(d.ref_black_white.to_vec())),
                ),
                Field::InkNames => {
                    let mut bytes = Vec::new();
                    for name in &d.ink_names {
                        bytes.extend(latin1_encode(name));
                        bytes.push(0);
                    }
                    push(tags::INK_NAMES, (TagType::Ascii, TagValue::Bytes(bytes)));
                }
                Field::SubIfd => {
                    let kind = if self.big_tiff { TagType::Ifd8 } else { TagType::Ifd };
                    push(tags::SUB_IFD, (kind, TagValue::Long8s(d.sub_ifds.clone())));
                }
            }
        }

        for custom in &d.custom_values {
            let info = &custom.info;
            let tag_type = if info.field_type == TagType::Any {
                custom.value.natural_type()
            } else {
                info.field_type
            };
            if tag_type.is_big_only() && !self.big_tiff {
                return Err(TiffError::field(
                    info.tag,
                    &info.name,
                    format!("{} values can only be written to BigTIFF files", tag_type),
                ));
            }
            values.push((info.tag, tag_type, custom.value.clone()));
        }

        let mut entries = Vec::with_capacity(values.len());
        for (tag, tag_type, value) in values {
            let (data, count) = value.encode(tag_type, self.handler.as_ref()).ok_or_else(|| {
                TiffError::field(tag, &tag.to_string(), format!("cannot encode {} as {}", value, tag_type))
            })?;
            entries.push(OutEntry { tag, tag_type, count, data });
        }
        entries.sort_by_key(|e| e.tag);
        entries.dedup_by_key(|e| e.tag);
        Ok(entries)
    }

    /// Position of the first-directory offset in the header
    fn header_link_position(&self) -> u64 {
        if self.big_tiff {
            header::BIG_HEADER_SIZE - u64::from(header::BIGTIFF_OFFSET_SIZE)
        } else {
            header::CLASSIC_HEADER_SIZE - 4
        }
    }

    /// File position of the link that holds `target`, starting from the
    /// header. `target == 0` finds the end of the chain.
    fn find_link_to(&mut self, target: u64) -> TiffResult<u64> {
        let mut position = self.header_link_position();
        let mut offset = self.first_dir_offset;
        let mut seen = HashSet::new();
        while offset != target {
            if offset == 0 {
                return Err(TiffError::FormatError(format!(
                    "Cannot find link to directory at {:#x}",
                    target
                )));
            }
            if !seen.insert(offset) {
                return Err(TiffError::DirectoryLoop { offset, index: seen.len() as u32 });
            }
            position = self.link_position(offset)?;
            self.stream.seek(SeekFrom::Start(position))?;
            offset = if self.big_tiff {
                self.handler.read_u64(&mut self.stream)?
            } else {
                u64::from(self.handler.read_u32(&mut self.stream)?)
            };
        }
        Ok(position)
    }

    /// Position of the next-directory link of the directory at `offset`
    fn link_position(&mut self, offset: u64) -> TiffResult<u64> {
        self.stream.seek(SeekFrom::Start(offset))?;
        let (count, count_size, entry_size) = if self.big_tiff {
            (self.handler.read_u64(&mut self.stream)?, 8, 20)
        } else {
            (u64::from(self.handler.read_u16(&mut self.stream)?), 2, 12)
        };
        if count > limits::MAX_DIRECTORY_ENTRIES {
            return Err(TiffError::FormatError(
                "Sanity check on directory count failed, this is probably not a valid IFD offset".to_string(),
            ));
        }
        Ok(offset + count_size + count * entry_size)
    }

    /// Writes an offset at `position`; the header slot also updates the
    /// session's first directory offset
    fn write_offset_at(&mut self, position: u64, value: u64) -> TiffResult<()> {
        self.stream.seek(SeekFrom::Start(position))?;
        if self.big_tiff {
            self.handler.write_u64(&mut self.stream, value)?;
        } else {
            let value = u32::try_from(value).map_err(|_| TiffError::Overflow("Maximum TIFF file size exceeded"))?;
            self.handler.write_u32(&mut self.stream, value)?;
        }
        if position == self.header_link_position() {
            self.first_dir_offset = value;
        }
        Ok(())
    }

    /// Serialises the current directory at the end of the file and links it
    /// into the chain. Returns its offset.
    fn emit_directory(&mut self) -> TiffResult<u64> {
        if !self.dir.is_set(Field::ImageDimensions) {
            return Err(TiffError::MissingRequired("ImageWidth".to_string()));
        }
        if !self.dir.is_set(Field::StripOffsets) {
            self.setup_strips()?;
        }

        let entries = self.collect_entries()?;
        let big = self.big_tiff;
        let (count_size, entry_size, slot_size) = if big { (8u64, 20u64, 8u64) } else { (2, 12, 4) };
        let dir_size = count_size + entries.len() as u64 * entry_size + slot_size;

        let end = self.file_size()?;
        let dir_offset = (end + 1) & !1;
        let mut data_offset = dir_offset + dir_size;

        let relocating = self.cur_dir_offset != 0;
        let next = if relocating { self.next_dir_offset } else { 0 };

        let h = self.handler.as_ref();
        let mut dir_bytes = vec![0u8; dir_size as usize];
        let mut extra: Vec<u8> = Vec::new();
        if big {
            h.put_u64(&mut dir_bytes[0..8], entries.len() as u64);
        } else {
            h.put_u16(&mut dir_bytes[0..2], entries.len() as u16);
        }

        for (i, entry) in entries.iter().enumerate() {
            let at = (count_size + i as u64 * entry_size) as usize;
            let slot_at = at + if big { 12 } else { 8 };
            h.put_u16(&mut dir_bytes[at..at + 2], entry.tag);
            h.put_u16(&mut dir_bytes[at + 2..at + 4], entry.tag_type.code());
            if big {
                h.put_u64(&mut dir_bytes[at + 4..at + 12], entry.count);
            } else {
                let count = u32::try_from(entry.count).map_err(|_| TiffError::Overflow("directory entry count"))?;
                h.put_u32(&mut dir_bytes[at + 4..at + 8], count);
            }

            if entry.data.len() as u64 <= slot_size {
                dir_bytes[slot_at..slot_at + entry.data.len()].copy_from_slice(&entry.data);
            } else {
                if big {
                    h.put_u64(&mut dir_bytes[slot_at..slot_at + 8], data_offset);
                } else {
                    let offset = u32::try_from(data_offset).map_err(|_| TiffError::Overflow("Maximum TIFF file size exceeded"))?;
                    h.put_u32(&mut dir_bytes[slot_at..slot_at + 4], offset);
                }
                extra.extend_from_slice(&entry.data);
                data_offset += entry.data.len() as u64;
                if data_offset & 1 != 0 {
                    extra.push(0);
                    data_offset += 1;
                }
            }
        }

        let link_at = (dir_size - slot_size) as usize;
        if big {
            h.put_u64(&mut dir_bytes[link_at..], next);
        } else {
            let next = u32::try_from(next).map_err(|_| TiffError::Overflow("Maximum TIFF file size exceeded"))?;
            h.put_u32(&mut dir_bytes[link_at..], next);
        }
        if !big && data_offset > u64::from(u32::MAX) {
            return Err(TiffError::Overflow("Maximum TIFF file size exceeded"));
        }

        self.stream.seek(SeekFrom::Start(dir_offset))?;
        self.stream.write_all(&dir_bytes)?;
        self.stream.write_all(&extra)?;

        let link = if relocating {
            self.find_link_to(self.cur_dir_offset)?
        } else {
            self.find_link_to(0)?
        };
        self.write_offset_at(link, dir_offset)?;

        if let Some(index) = self.cur_dir {
            self.chain.check(index, dir_offset);
        }
        debug!(
            "Wrote directory with {} entries at {:#x}{}",
            entries.len(),
            dir_offset,
            if relocating { " (relocated)" } else { "" }
        );
        self.cur_dir_offset = dir_offset;
        self.dirty = false;
        Ok(dir_offset)
    }

    /// Completes any pending strip and shuts the encoder down
    fn finish_image(&mut self) -> TiffResult<()> {
        self.flush_data()?;
        self.codec.cleanup();
        self.coder = CoderState::Idle;
        Ok(())
    }

    /// Writes the current directory and starts a new, empty one.
    ///
    /// A directory read from or already written to the file is relocated to
    /// the end of the file and the link pointing at it is updated.
    pub fn write_directory(&mut self) -> TiffResult<u64> {
        self.check_writable()?;
        self.finish_image()?;
        let offset = self.emit_directory()?;
        let index = self.cur_dir.map_or(0, |i| i + 1);
        self.reset_directory();
        self.cur_dir = Some(index);
        self.cur_dir_offset = 0;
        self.next_dir_offset = 0;
        info!("Directory {} written at {:#x}", index.saturating_sub(1), offset);
        Ok(offset)
    }

    /// Writes the current directory without leaving it.
    ///
    /// Lets a file being written stay readable; the next checkpoint or
    /// write relocates the directory again.
    pub fn checkpoint_directory(&mut self) -> TiffResult<u64> {
        self.check_writable()?;
        self.emit_directory()
    }

    /// Moves a directory already in the file to its end, typically after
    /// it grew, and patches the link to it
    pub fn rewrite_directory(&mut self) -> TiffResult<u64> {
        if self.cur_dir_offset == 0 {
            debug!("Directory not on disk yet, writing it");
        }
        self.write_directory()
    }

    /// Starts a new, empty directory to be appended to the chain
    pub fn create_directory(&mut self) -> TiffResult<()> {
        self.check_writable()?;
        self.finish_image()?;
        let count = self.number_of_directories()?;
        self.reset_directory();
        self.cur_dir = Some(count);
        self.cur_dir_offset = 0;
        self.next_dir_offset = 0;
        Ok(())
    }

    /// Removes directory `n` (0-based) from the main chain.
    ///
    /// Its data stays in the file but is no longer reachable. The session
    /// is left before the first directory.
    pub fn unlink_directory(&mut self, n: u32) -> TiffResult<()> {
        self.check_writable()?;
        let mut position = self.header_link_position();
        let mut offset = self.first_dir_offset;
        let mut seen = HashSet::new();
        for _ in 0..n {
            if offset == 0 {
                break;
            }
            if !seen.insert(offset) {
                return Err(TiffError::DirectoryLoop { offset, index: seen.len() as u32 });
            }
            position = self.link_position(offset)?;
            offset = self.read_next_link(offset)?;
        }
        if offset == 0 {
            return Err(TiffError::UsageError(format!("Directory {} does not exist", n)));
        }

        let next = self.read_next_link(offset)?;
        self.write_offset_at(position, next)?;

        self.codec.cleanup();
        self.reset_directory();
        self.chain.clear();
        self.in_sub_chain = false;
        self.cur_dir = None;
        self.cur_dir_offset = 0;
        self.next_dir_offset = self.first_dir_offset;
        info!("Unlinked directory {} at {:#x}", n, offset);
        Ok(())
    }

    /// Writes the directory if it changed and flushes the stream.
    ///
    /// Scanline output of an unfinished strip stays pending.
    pub fn flush(&mut self) -> TiffResult<()> {
        if self.mode != Mode::Read && self.dirty && self.dir.is_set(Field::ImageDimensions) {
            self.checkpoint_directory()?;
        }
        self.stream.flush()?;
        Ok(())
    }

    /// Finishes the session and returns the stream.
    ///
    /// A directory with unwritten changes or data is written first.
    pub fn close(mut self) -> TiffResult<S> {
        if self.mode != Mode::Read {
            let pending = self.dirty || self.been_writing || self.cursor.pending_strip.is_some();
            if pending && self.dir.is_set(Field::ImageDimensions) {
                self.write_directory()?;
            }
            self.stream.flush()?;
        }
        Ok(self.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_or_long() {
        assert_eq!(short_or_long(100), (TagType::Short, TagValue::Short(100)));
        assert_eq!(short_or_long(70000), (TagType::Long, TagValue::Long(70000)));
    }

    #[test]
    fn test_per_sample() {
        assert_eq!(per_sample(8u16, 3), vec![8, 8, 8]);
        assert_eq!(per_sample(8u16, 0), vec![8]);
    }
}
