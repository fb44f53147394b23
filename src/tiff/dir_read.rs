//! Directory reading
//!
//! Turns the raw entries of an IFD into a [`Directory`]. Entries are
//! resolved against the session catalog in several passes: SamplesPerPixel
//! and Compression first (the codec must be known before codec-private tags
//! can be recognised), then the fields that decide the strip layout, then
//! everything else. A set of tolerance rules for common encoder mistakes
//! runs once all fields are in.

use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use log::{debug, trace};

use crate::compression::is_field_valid_for_codec;
use crate::io::seekable::TiffStream;
use crate::tiff::catalog::{FieldInfo, TagCatalog};
use crate::tiff::constants::{compression, exif_tags, limits, photometric, planar_config, tags};
use crate::tiff::directory::{Directory, FieldContext};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::file::{field_context, TiffFile};
use crate::tiff::geometry::to_usize;
use crate::tiff::options::{CodecPolicy, TiffOptions};
use crate::tiff::types::{Field, FieldBit, FieldCount, TagType};
use crate::tiff::value::TagValue;
use crate::utils::tiff_code_translators::compression_code_to_name;

const MODULE: &str = "read_directory";

/// A directory entry as stored in the file
#[derive(Debug, Clone)]
pub(crate) struct RawEntry {
    pub tag: u16,
    pub type_code: u16,
    pub count: u64,
    /// Inline value or offset to it, in file byte order
    pub slot: [u8; 8],
    /// Catalog entry this raw entry resolved to, `None` once consumed or ignored
    resolved: Option<Resolved>,
    /// Taken care of by the SamplesPerPixel/Compression pre-pass
    handled: bool,
}

#[derive(Debug, Clone)]
struct Resolved {
    tag_type: TagType,
    info: Arc<FieldInfo>,
}

fn warn(options: &TiffOptions, message: &str) {
    options.sink.warning(Some(&options.name), MODULE, message);
}

/// Colour channels implied by a photometric interpretation, 0 if unknown
fn max_color_channels(photometric: u16) -> u16 {
    match photometric {
        photometric::WHITE_IS_ZERO
        | photometric::BLACK_IS_ZERO
        | photometric::PALETTE
        | photometric::TRANSPARENCY_MASK
        | photometric::LOGL => 1,
        photometric::RGB
        | photometric::CIELAB
        | photometric::ICCLAB
        | photometric::ITULAB
        | photometric::LOGLUV
        | photometric::YCBCR => 3,
        photometric::CMYK => 4,
        _ => 0,
    }
}

/// Finds the catalog entry for a raw entry.
///
/// Unknown tags get an anonymous catalog entry. Entries with an unknown
/// data type, an incompatible data type, an ignored catalog entry or a tag
/// private to another codec resolve to `None` with a warning.
fn resolve_entry(
    options: &TiffOptions,
    catalog: &mut TagCatalog,
    cursor: &mut usize,
    entry: &RawEntry,
    scheme: Option<u16>,
) -> Option<Resolved> {
    let tag = entry.tag;
    let Some(tag_type) = TagType::from_code(entry.type_code) else {
        warn(options, &format!("Unknown data type {} for tag {}; tag ignored", entry.type_code, tag));
        return None;
    };

    let info = if catalog.seek_tag(tag, cursor) {
        // A known tag only accepts the types its catalog entries list
        match catalog.find(tag, tag_type) {
            Some(info) => info,
            None => match catalog.get(*cursor).cloned() {
                Some(first) if first.is_anonymous() => catalog.merge_anonymous(tag, tag_type),
                first => {
                    let name = first.map(|f| f.name.to_string()).unwrap_or_default();
                    warn(options, &format!("Wrong data type {} for \"{}\"; tag ignored", tag_type, name));
                    return None;
                }
            },
        }
    } else {
        warn(options, &format!("Unknown field with tag {} ({:#x}) encountered", tag, tag));
        catalog.merge_anonymous(tag, tag_type)
    };

    if info.bit == FieldBit::Ignore {
        warn(options, &format!("Ignoring \"{}\" tag", info.name));
        return None;
    }
    if let Some(scheme) = scheme {
        if !is_field_valid_for_codec(tag, scheme) {
            warn(
                options,
                &format!(
                    "\"{}\" tag is not valid for compression scheme {}; tag ignored",
                    info.name, scheme
                ),
            );
            return None;
        }
    }
    Some(Resolved { tag_type, info })
}

/// Widens byte-sized integers so later conversions treat them as numbers
/// rather than raw bytes
fn widen_bytes(value: TagValue, target: TagType) -> TagValue {
    if matches!(target, TagType::Byte | TagType::SByte | TagType::Undefined | TagType::Ascii | TagType::Any) {
        return value;
    }
    match value {
        TagValue::Bytes(v) => TagValue::Shorts(v.into_iter().map(u16::from).collect()),
        TagValue::SBytes(v) => TagValue::SShorts(v.into_iter().map(i16::from).collect()),
        other => other,
    }
}

impl<S: TiffStream> TiffFile<S> {
    fn slot_size(&self) -> u64 {
        if self.big_tiff {
            8
        } else {
            4
        }
    }

    fn read_dir_count(&mut self) -> std::io::Result<u64> {
        if self.big_tiff {
            self.handler.read_u64(&mut self.stream)
        } else {
            self.handler.read_u16(&mut self.stream).map(u64::from)
        }
    }

    fn read_link(&mut self) -> std::io::Result<u64> {
        if self.big_tiff {
            self.handler.read_u64(&mut self.stream)
        } else {
            self.handler.read_u32(&mut self.stream).map(u64::from)
        }
    }

    fn entry_size(&self) -> u64 {
        if self.big_tiff {
            20
        } else {
            12
        }
    }

    /// Reads the next-directory link of the directory at `offset`
    pub(crate) fn read_next_link(&mut self, offset: u64) -> TiffResult<u64> {
        self.stream.seek(SeekFrom::Start(offset))?;
        let count = self
            .read_dir_count()
            .map_err(|_| TiffError::FormatError("Can not read TIFF directory count".to_string()))?;
        if count > limits::MAX_DIRECTORY_ENTRIES {
            return Err(TiffError::FormatError(
                "Sanity check on directory count failed, this is probably not a valid IFD offset".to_string(),
            ));
        }
        let skip = count * self.entry_size();
        self.stream.seek(SeekFrom::Current(skip as i64))?;
        self.read_link()
            .map_err(|_| TiffError::FormatError("Can not read TIFF directory link".to_string()))
    }

    /// Reads the entries and next link of the directory at `offset`
    fn fetch_raw_directory(&mut self, offset: u64) -> TiffResult<(Vec<RawEntry>, u64)> {
        self.stream
            .seek(SeekFrom::Start(offset))
            .map_err(|_| TiffError::FormatError("Seek error accessing TIFF directory".to_string()))?;
        let count = self
            .read_dir_count()
            .map_err(|_| TiffError::FormatError("Can not read TIFF directory count".to_string()))?;
        if count > limits::MAX_DIRECTORY_ENTRIES {
            return Err(TiffError::FormatError(
                "Sanity check on directory count failed, this is probably not a valid IFD offset".to_string(),
            ));
        }

        let entry_size = self.entry_size() as usize;
        let mut buf = vec![0u8; count as usize * entry_size];
        self.stream
            .read_exact(&mut buf)
            .map_err(|_| TiffError::FormatError("Can not read TIFF directory".to_string()))?;

        let h = self.handler.as_ref();
        let entries = buf
            .chunks_exact(entry_size)
            .map(|raw| {
                let mut slot = [0u8; 8];
                let count = if self.big_tiff {
                    slot.copy_from_slice(&raw[12..20]);
                    h.get_u64(&raw[4..12])
                } else {
                    slot[..4].copy_from_slice(&raw[8..12]);
                    u64::from(h.get_u32(&raw[4..8]))
                };
                RawEntry {
                    tag: h.get_u16(&raw[0..2]),
                    type_code: h.get_u16(&raw[2..4]),
                    count,
                    slot,
                    resolved: None,
                    handled: false,
                }
            })
            .collect();

        let next = match self.read_link() {
            Ok(next) => next,
            Err(_) => {
                warn(&self.options, "Can not read next directory link, assuming last directory");
                0
            }
        };
        trace!("Directory at {:#x}: {} entries, next {:#x}", offset, count, next);
        Ok((entries, next))
    }

    /// Bytes of `count` elements of `tag_type` held by `entry`
    fn entry_bytes(&mut self, entry: &RawEntry, tag_type: TagType, count: u64) -> TiffResult<Vec<u8>> {
        let size = count
            .checked_mul(tag_type.size() as u64)
            .ok_or(TiffError::Overflow("directory entry size"))?;
        if size <= self.slot_size() {
            return Ok(entry.slot[..size as usize].to_vec());
        }

        let offset = if self.big_tiff {
            self.handler.get_u64(&entry.slot)
        } else {
            u64::from(self.handler.get_u32(&entry.slot))
        };
        let file_size = self.file_size()?;
        if offset.checked_add(size).map_or(true, |end| end > file_size) {
            return Err(TiffError::FormatError(format!(
                "Cannot read value of tag {} at offset {:#x}: {} bytes beyond end of file",
                entry.tag, offset, size
            )));
        }

        let mut data = vec![0u8; to_usize(size, "directory entry size")?];
        self.stream.seek(SeekFrom::Start(offset))?;
        self.stream.read_exact(&mut data)?;
        Ok(data)
    }

    /// Decodes `count` elements of a resolved entry
    fn decode_entry(&mut self, entry: &RawEntry, resolved: &Resolved, count: u64) -> TiffResult<TagValue> {
        let tag_type = resolved.tag_type;
        let bytes = self.entry_bytes(entry, tag_type, count)?;

        if tag_type == TagType::Ascii {
            // NUL separated list
            if entry.tag == tags::INK_NAMES {
                return Ok(TagValue::Bytes(bytes));
            }
            if bytes.last().map_or(false, |&b| b != 0) {
                warn(
                    &self.options,
                    &format!("ASCII value for tag \"{}\" does not end in null byte", resolved.info.name),
                );
            }
            let content = match bytes.iter().rposition(|&b| b != 0) {
                Some(last) => &bytes[..=last],
                None => &bytes[..0],
            };
            if content.contains(&0) {
                warn(
                    &self.options,
                    &format!(
                        "ASCII value for tag \"{}\" contains null byte in value; value truncated at the first null",
                        resolved.info.name
                    ),
                );
            }
        }

        let len = to_usize(count, "directory entry count")?;
        let value = TagValue::decode(tag_type, len, &bytes, self.handler.as_ref())?;
        Ok(widen_bytes(value, resolved.info.field_type))
    }

    /// Decodes an entry after checking its count against the catalog.
    ///
    /// Returns `None` (with a warning) when the count rules out the entry.
    fn fetch_value(&mut self, entry: &RawEntry, resolved: &Resolved, spp: u16) -> TiffResult<Option<TagValue>> {
        let info = &resolved.info;
        let mut count = entry.count;
        if resolved.tag_type != TagType::Ascii {
            match info.read_count {
                FieldCount::Fixed(_) | FieldCount::PerSample => {
                    let expected = info.read_count.expected(spp).unwrap_or(count);
                    if count < expected {
                        warn(&self.options, &format!("Incorrect count for \"{}\"; tag ignored", info.name));
                        return Ok(None);
                    }
                    if count > expected {
                        warn(&self.options, &format!("Incorrect count for \"{}\"; tag trimmed", info.name));
                        count = expected;
                    }
                }
                FieldCount::Variable if count > u64::from(u16::MAX) => {
                    warn(&self.options, &format!("Incorrect count for \"{}\"; tag ignored", info.name));
                    return Ok(None);
                }
                FieldCount::Variable32 if count > u64::from(u32::MAX) => {
                    warn(&self.options, &format!("Incorrect count for \"{}\"; tag ignored", info.name));
                    return Ok(None);
                }
                _ => {}
            }
        }
        self.decode_entry(entry, resolved, count).map(Some)
    }

    /// Applies a value read from the file to the current directory
    fn apply_read(&mut self, info: Arc<FieldInfo>, value: TagValue) -> TiffResult<()> {
        let ctx: FieldContext<'_> = field_context(&self.catalog, &self.options, true);
        self.dir.apply_field(&ctx, info, value)
    }

    /// Warns on unsorted and duplicate entries, then sorts and deduplicates
    fn sort_entries(&self, entries: &mut Vec<RawEntry>) {
        if entries.windows(2).any(|w| w[0].tag > w[1].tag) {
            warn(&self.options, "Invalid TIFF directory; tags are not sorted in ascending order");
            entries.sort_by_key(|e| e.tag);
        }
        let before = entries.len();
        entries.dedup_by(|later, first| {
            if later.tag == first.tag {
                warn(
                    &self.options,
                    &format!("Duplicate field tag {} in directory; later entry ignored", later.tag),
                );
                true
            } else {
                false
            }
        });
        if entries.len() != before {
            debug!("Dropped {} duplicate entries", before - entries.len());
        }
    }

    /// Reads the directory at `offset` into the session
    pub(crate) fn read_directory_at(&mut self, offset: u64) -> TiffResult<()> {
        self.reset_directory();
        self.cur_dir_offset = offset;

        let (mut entries, next) = self.fetch_raw_directory(offset)?;
        self.next_dir_offset = next;
        self.sort_entries(&mut entries);

        self.read_samples_per_pixel(&mut entries)?;
        self.read_compression(&mut entries)?;

        let scheme = self.dir.compression;
        let mut cursor = 0;
        for entry in entries.iter_mut().filter(|e| !e.handled) {
            entry.resolved = resolve_entry(&self.options, &mut self.catalog, &mut cursor, entry, Some(scheme));
        }

        let spp = self.dir.samples_per_pixel;
        let mut offsets = None;
        let mut byte_counts = None;
        for i in 0..entries.len() {
            let Some(resolved) = entries[i].resolved.clone() else { continue };
            match entries[i].tag {
                tags::IMAGE_WIDTH
                | tags::IMAGE_LENGTH
                | tags::IMAGE_DEPTH
                | tags::TILE_WIDTH
                | tags::TILE_LENGTH
                | tags::TILE_DEPTH
                | tags::PLANAR_CONFIGURATION
                | tags::ROWS_PER_STRIP
                | tags::EXTRA_SAMPLES => {
                    if let Some(value) = self.fetch_value(&entries[i], &resolved, spp)? {
                        self.apply_read(resolved.info, value)?;
                    }
                }
                tags::STRIP_OFFSETS | tags::TILE_OFFSETS => offsets = Some((i, resolved)),
                tags::STRIP_BYTE_COUNTS | tags::TILE_BYTE_COUNTS => byte_counts = Some((i, resolved)),
                _ => continue,
            }
            entries[i].resolved = None;
        }

        // Old JPEG files with separate planes but a single strip are really contiguous
        if self.dir.compression == compression::JPEG_OLD && self.dir.planar_config == planar_config::PLANAR {
            if let Some((i, _)) = &byte_counts {
                if entries[*i].count == 1 {
                    warn(
                        &self.options,
                        "Planarconfig tag value assumed incorrect, assuming data is contig instead of chunky",
                    );
                    self.dir.planar_config = planar_config::CHUNKY;
                }
            }
        }

        if !self.dir.is_set(Field::ImageDimensions) {
            return Err(TiffError::MissingRequired("ImageLength".to_string()));
        }
        self.setup_strip_layout()?;

        let tiled = self.dir.is_tiled();
        let nstrips = self.dir.nstrips;
        match offsets {
            Some((i, resolved)) => {
                self.dir.strip_offsets = self.fetch_strip_array(&entries[i], &resolved, nstrips)?;
                self.dir.mark(Field::StripOffsets);
            }
            None if self.dir.compression == compression::JPEG_OLD && !tiled && nstrips == 1 => {
                self.dir.strip_offsets = vec![0];
                self.dir.mark(Field::StripOffsets);
            }
            None => {
                let name = if tiled { "TileOffsets" } else { "StripOffsets" };
                return Err(TiffError::MissingRequired(name.to_string()));
            }
        }
        if let Some((i, resolved)) = byte_counts {
            self.dir.strip_byte_counts = self.fetch_strip_array(&entries[i], &resolved, nstrips)?;
            self.dir.mark(Field::StripByteCounts);
        }

        for i in 0..entries.len() {
            let Some(resolved) = entries[i].resolved.take() else { continue };
            match entries[i].tag {
                tags::BITS_PER_SAMPLE
                | tags::DATA_TYPE
                | tags::SAMPLE_FORMAT
                | tags::MIN_SAMPLE_VALUE
                | tags::MAX_SAMPLE_VALUE => {
                    let spp = self.dir.samples_per_pixel;
                    if let Some(value) = self.fetch_value(&entries[i], &resolved, spp)? {
                        self.apply_read(resolved.info, value)?;
                    }
                }
                tags::COLOR_MAP | tags::TRANSFER_FUNCTION => self.read_curves(&entries[i], &resolved),
                _ => self.read_optional(&entries[i], &resolved),
            }
        }

        self.apply_tolerance_rules(&entries)?;

        self.codec.fixup_tags(&mut self.dir)?;

        if self.options.strip_chop
            && self.dir.planar_config == planar_config::CHUNKY
            && self.dir.nstrips == 1
            && self.dir.compression == compression::NONE
            && !tiled
        {
            self.dir.chop_up_single_uncompressed_strip()?;
        }

        self.dir.scanline_size()?;
        if tiled {
            if self.dir.tile_size()? == 0 {
                return Err(TiffError::GeometryError("Cannot handle zero tile size".to_string()));
            }
        } else if self.dir.strip_size()? == 0 {
            return Err(TiffError::GeometryError("Cannot handle zero strip size".to_string()));
        }

        self.dirty = false;
        debug!(
            "Read directory at {:#x}: {}x{}, {} {}",
            offset,
            self.dir.image_width,
            self.dir.image_length,
            self.dir.nstrips,
            if tiled { "tiles" } else { "strips" }
        );
        Ok(())
    }

    fn read_samples_per_pixel(&mut self, entries: &mut [RawEntry]) -> TiffResult<()> {
        let Some(entry) = entries.iter_mut().find(|e| e.tag == tags::SAMPLES_PER_PIXEL) else {
            return Ok(());
        };
        entry.handled = true;
        let entry = entry.clone();

        let mut cursor = 0;
        let Some(resolved) = resolve_entry(&self.options, &mut self.catalog, &mut cursor, &entry, None) else {
            return Ok(());
        };
        if let Some(value) = self.fetch_value(&entry, &resolved, 1)? {
            self.apply_read(resolved.info, value)?;
        }
        Ok(())
    }

    /// Reads Compression and selects the codec.
    ///
    /// Older writers stored one value per sample; all of them must agree.
    fn read_compression(&mut self, entries: &mut [RawEntry]) -> TiffResult<()> {
        let Some(entry) = entries.iter_mut().find(|e| e.tag == tags::COMPRESSION) else {
            return Ok(());
        };
        entry.handled = true;
        let entry = entry.clone();

        let mut cursor = 0;
        let Some(resolved) = resolve_entry(&self.options, &mut self.catalog, &mut cursor, &entry, None) else {
            return Ok(());
        };
        let name = resolved.info.name.clone();
        let values = self
            .decode_entry(&entry, &resolved, entry.count)?
            .to_u16_vec()
            .ok_or_else(|| TiffError::field(tags::COMPRESSION, &name, "expected integer values"))?;
        let Some(&scheme) = values.first() else {
            return Err(TiffError::field(tags::COMPRESSION, &name, "no values"));
        };
        let checked = values.len().min(usize::from(self.dir.samples_per_pixel)).max(1);
        if values[..checked].iter().any(|&v| v != scheme) {
            return Err(TiffError::field(tags::COMPRESSION, &name, "Cannot handle different values per sample"));
        }

        self.set_field(tags::COMPRESSION, TagValue::Short(scheme))?;

        if !self.options.registry.is_configured(scheme) {
            let codec_name = self
                .options
                .registry
                .find(scheme)
                .map(|info| info.name)
                .unwrap_or_else(|| compression_code_to_name(scheme).to_string());
            match self.options.codec_policy {
                CodecPolicy::Strict => {
                    return Err(TiffError::CodecNotConfigured { scheme, name: codec_name });
                }
                CodecPolicy::Lenient => warn(
                    &self.options,
                    &format!("{} compression support is not configured; pixel data will not be readable", codec_name),
                ),
            }
        }
        Ok(())
    }

    /// Computes strip or tile counts once the layout fields are known
    fn setup_strip_layout(&mut self) -> TiffResult<()> {
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
            nstrips / u32::from(self.dir.samples_per_pixel)
        } else {
            nstrips
        };
        Ok(())
    }

    /// Reads a strip offset or byte count array, padded or trimmed to `nstrips`
    fn fetch_strip_array(&mut self, entry: &RawEntry, resolved: &Resolved, nstrips: u32) -> TiffResult<Vec<u64>> {
        let name = resolved.info.name.clone();
        if !matches!(
            resolved.tag_type,
            TagType::Short | TagType::Long | TagType::Long8 | TagType::Ifd | TagType::Ifd8
        ) {
            return Err(TiffError::FormatError(format!(
                "Invalid data type {} for \"{}\"",
                resolved.tag_type, name
            )));
        }
        let mut values = self
            .decode_entry(entry, resolved, entry.count)?
            .to_u64_vec()
            .ok_or_else(|| TiffError::FormatError(format!("Cannot read \"{}\" array", name)))?;

        let nstrips = nstrips as usize;
        if values.len() < nstrips {
            warn(
                &self.options,
                &format!("\"{}\" has {} values for {} strips; padding with zeros", name, values.len(), nstrips),
            );
            values.resize(nstrips, 0);
        } else if values.len() > nstrips {
            warn(&self.options, &format!("Incorrect count for \"{}\"; tag trimmed", name));
            values.truncate(nstrips);
        }
        Ok(values)
    }

    /// ColorMap and TransferFunction, whose length depends on BitsPerSample
    fn read_curves(&mut self, entry: &RawEntry, resolved: &Resolved) {
        let name = resolved.info.name.clone();
        if !self.dir.is_set(Field::BitsPerSample) {
            warn(&self.options, &format!("Ignoring \"{}\" since BitsPerSample tag not found", name));
            return;
        }
        let bps = self.dir.bits_per_sample;
        if bps > 24 {
            warn(
                &self.options,
                &format!("Ignoring \"{}\" because BitsPerSample={}>24", name, bps),
            );
            return;
        }

        let per_channel = 1u64 << bps;
        let required = if entry.tag == tags::TRANSFER_FUNCTION && entry.count == per_channel {
            per_channel
        } else {
            3 * per_channel
        };
        if entry.count < required {
            warn(&self.options, &format!("Incorrect count for \"{}\"; tag ignored", name));
            return;
        }
        if entry.count > required {
            warn(&self.options, &format!("Incorrect count for \"{}\"; tag trimmed", name));
        }

        let result = self
            .decode_entry(entry, resolved, required)
            .and_then(|value| self.apply_read(Arc::clone(&resolved.info), value));
        if let Err(e) = result {
            warn(&self.options, &format!("Ignoring \"{}\": {}", name, e));
        }
    }

    /// Any other field: failures are warnings
    fn read_optional(&mut self, entry: &RawEntry, resolved: &Resolved) {
        let spp = self.dir.samples_per_pixel;
        let result = match self.fetch_value(entry, resolved, spp) {
            Ok(Some(value)) => self.apply_read(Arc::clone(&resolved.info), value),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn(&self.options, &format!("Ignoring \"{}\": {}", resolved.info.name, e));
        }
    }

    /// Repairs for known encoder mistakes, then derived defaults
    fn apply_tolerance_rules(&mut self, entries: &[RawEntry]) -> TiffResult<()> {
        if self.dir.compression == compression::JPEG_OLD {
            self.fix_old_jpeg_fields();
        }

        if self.dir.is_set(Field::Photometric) {
            let channels = max_color_channels(self.dir.photometric);
            let extra = self.dir.extra_samples.len() as u16;
            if channels > 0 && self.dir.samples_per_pixel.saturating_sub(extra) > channels {
                warn(
                    &self.options,
                    "Sum of Photometric type-related color channels and ExtraSamples doesn't match SamplesPerPixel. Defining non-color channels as ExtraSamples.",
                );
                let needed = usize::from(self.dir.samples_per_pixel - channels);
                self.dir.extra_samples.resize(needed, crate::tiff::constants::extra_samples::UNSPECIFIED);
                self.dir.mark(Field::ExtraSamples);
            }
        }

        if self.dir.photometric == photometric::PALETTE && !self.dir.is_set(Field::ColorMap) {
            if self.dir.bits_per_sample >= 8 && self.dir.samples_per_pixel == 3 {
                self.dir.photometric = photometric::RGB;
            } else if self.dir.bits_per_sample >= 8 {
                self.dir.photometric = photometric::BLACK_IS_ZERO;
            } else {
                return Err(TiffError::MissingRequired("Colormap".to_string()));
            }
        }

        self.check_strip_byte_counts(entries)?;

        if !self.dir.is_set(Field::MaxSampleValue) {
            let bps = self.dir.bits_per_sample;
            self.dir.max_sample_value = if bps >= 16 { u16::MAX } else { (1u16 << bps) - 1 };
        }

        self.dir.strip_bytecount_sorted = self.dir.nstrips <= 1
            || self.dir.strip_offsets.windows(2).all(|w| w[0] <= w[1]);
        Ok(())
    }

    fn fix_old_jpeg_fields(&mut self) {
        if !self.dir.is_set(Field::Photometric) {
            warn(&self.options, "Photometric tag is missing, assuming data is YCbCr");
            self.dir.photometric = photometric::YCBCR;
            self.dir.mark(Field::Photometric);
        } else if self.dir.photometric == photometric::RGB {
            warn(
                &self.options,
                "Photometric tag value assumed incorrect, assuming data is YCbCr instead of RGB",
            );
            self.dir.photometric = photometric::YCBCR;
        }

        if !self.dir.is_set(Field::BitsPerSample) {
            warn(&self.options, "BitsPerSample tag is missing, assuming 8 bits per sample");
            self.dir.bits_per_sample = 8;
            self.dir.mark(Field::BitsPerSample);
        }

        if !self.dir.is_set(Field::SamplesPerPixel) {
            let spp = match self.dir.photometric {
                photometric::RGB | photometric::YCBCR => Some(3),
                photometric::WHITE_IS_ZERO | photometric::BLACK_IS_ZERO => Some(1),
                _ => None,
            };
            if let Some(spp) = spp {
                warn(
                    &self.options,
                    &format!("SamplesPerPixel tag is missing, applying correct SamplesPerPixel value of {}", spp),
                );
                self.dir.samples_per_pixel = spp;
                self.dir.mark(Field::SamplesPerPixel);
            }
        }
    }

    /// Fills in missing byte counts and replaces implausible ones
    fn check_strip_byte_counts(&mut self, entries: &[RawEntry]) -> TiffResult<()> {
        let tiled = self.dir.is_tiled();
        let contig = self.dir.planar_config == planar_config::CHUNKY;
        let nstrips = self.dir.nstrips;

        if !self.dir.is_set(Field::StripByteCounts) {
            let spp = u32::from(self.dir.samples_per_pixel);
            if (contig && nstrips > 1) || (!contig && nstrips != spp) {
                let name = if tiled { "TileByteCounts" } else { "StripByteCounts" };
                return Err(TiffError::MissingRequired(name.to_string()));
            }
            warn(
                &self.options,
                "TIFF directory is missing required \"StripByteCounts\" field, calculating from imagelength",
            );
            return self.estimate_strip_byte_counts(entries);
        }

        if nstrips == 1 && !tiled && self.dir.strip_offsets[0] != 0 && self.byte_count_looks_bad()? {
            warn(
                &self.options,
                "Bogus \"StripByteCounts\" field, ignoring and calculating from imagelength",
            );
            return self.estimate_strip_byte_counts(entries);
        }

        let counts = &self.dir.strip_byte_counts;
        if contig
            && nstrips > 2
            && self.dir.compression == compression::NONE
            && counts[0] != counts[1]
            && counts[0] != 0
            && counts[1] != 0
        {
            warn(
                &self.options,
                "Wrong \"StripByteCounts\" field, ignoring and calculating from imagelength",
            );
            return self.estimate_strip_byte_counts(entries);
        }
        Ok(())
    }

    fn byte_count_looks_bad(&mut self) -> TiffResult<bool> {
        let count = self.dir.strip_byte_counts[0];
        let offset = self.dir.strip_offsets[0];
        if count == 0 && offset != 0 {
            return Ok(true);
        }
        if self.dir.compression != compression::NONE {
            return Ok(false);
        }
        let file_size = self.file_size()?;
        if offset > file_size || count > file_size - offset {
            return Ok(true);
        }
        if self.mode == crate::tiff::file::Mode::Read {
            let expected = self
                .dir
                .scanline_size()?
                .checked_mul(u64::from(self.dir.image_length))
                .ok_or(TiffError::Overflow("strip byte count check"))?;
            return Ok(count < expected);
        }
        Ok(false)
    }

    /// Guesses byte counts from the image layout or the file size
    fn estimate_strip_byte_counts(&mut self, entries: &[RawEntry]) -> TiffResult<()> {
        let nstrips = self.dir.nstrips as usize;
        let mut counts = vec![0u64; nstrips];

        if self.dir.compression != compression::NONE {
            let file_size = self.file_size()?;
            let (header, dir_overhead, entry_size) = if self.big_tiff { (16u64, 16u64, 20u64) } else { (8, 6, 12) };
            let slot = self.slot_size();
            let mut space = header + dir_overhead + entries.len() as u64 * entry_size;
            for entry in entries {
                let width = TagType::from_code(entry.type_code).map_or(0, |t| t.size() as u64);
                if width == 0 {
                    return Err(TiffError::FormatError(format!(
                        "Cannot determine size of unknown tag type {}",
                        entry.type_code
                    )));
                }
                let size = width.saturating_mul(entry.count);
                if size > slot {
                    space = space.saturating_add(size);
                }
            }
            let mut space = file_size.saturating_sub(space);
            if self.dir.planar_config == planar_config::PLANAR {
                space /= u64::from(self.dir.samples_per_pixel);
            }
            counts.iter_mut().for_each(|c| *c = space);

            // A strip cannot run past the end of the file
            if let (Some(last), Some(&offset)) = (counts.last_mut(), self.dir.strip_offsets.last()) {
                if offset > file_size.saturating_sub(*last) {
                    *last = file_size.saturating_sub(offset);
                }
            }
        } else if self.dir.is_tiled() {
            let tile = self.dir.tile_size()?;
            counts.iter_mut().for_each(|c| *c = tile);
        } else {
            let row = self.dir.scanline_size()?;
            let rows = u64::from(self.dir.image_length / self.dir.strips_per_image.max(1));
            let strip = row.checked_mul(rows).ok_or(TiffError::Overflow("estimate_strip_byte_counts"))?;
            counts.iter_mut().for_each(|c| *c = strip);
        }

        self.dir.strip_byte_counts = counts;
        self.dir.mark(Field::StripByteCounts);
        if !self.dir.is_set(Field::RowsPerStrip) {
            self.dir.rows_per_strip = self.dir.image_length;
        }
        Ok(())
    }

    /// Reads a private directory (EXIF and the like) with its own catalog.
    ///
    /// Only custom values are kept; no strip layout is derived.
    pub(crate) fn read_private_directory(&mut self, offset: u64, mut catalog: TagCatalog) -> TiffResult<Directory> {
        let (mut entries, _next) = self.fetch_raw_directory(offset)?;
        self.sort_entries(&mut entries);

        let mut dir = Directory::new();
        let mut cursor = 0;
        for entry in &entries {
            let Some(resolved) = resolve_entry(&self.options, &mut catalog, &mut cursor, entry, None) else {
                continue;
            };

            let value = if entry.tag == exif_tags::SUBJECT_DISTANCE
                && resolved.tag_type == TagType::Rational
                && entry.count == 1
            {
                match self.read_subject_distance(entry)? {
                    Some(value) => Ok(Some(value)),
                    None => continue,
                }
            } else {
                self.fetch_value(entry, &resolved, dir.samples_per_pixel)
            };

            let ctx = FieldContext {
                catalog: &catalog,
                sink: self.options.sink.as_ref(),
                file_name: &self.options.name,
                reading: true,
            };
            let result = value.and_then(|v| match v {
                Some(v) => dir.apply_field(&ctx, Arc::clone(&resolved.info), v),
                None => Ok(()),
            });
            if let Err(e) = result {
                warn(&self.options, &format!("Ignoring \"{}\": {}", resolved.info.name, e));
            }
        }
        Ok(dir)
    }

    /// SubjectDistance: an all-ones numerator means infinity (-1)
    fn read_subject_distance(&mut self, entry: &RawEntry) -> TiffResult<Option<TagValue>> {
        let bytes = self.entry_bytes(entry, TagType::Rational, 1)?;
        let numerator = self.handler.get_u32(&bytes[0..4]);
        let denominator = self.handler.get_u32(&bytes[4..8]);
        if numerator == u32::MAX {
            return Ok(Some(TagValue::Double(-1.0)));
        }
        if denominator == 0 {
            warn(&self.options, "Incorrect value for \"SubjectDistance\"; tag ignored");
            return Ok(None);
        }
        Ok(Some(TagValue::Double(f64::from(numerator) / f64::from(denominator))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_color_channels() {
        assert_eq!(max_color_channels(photometric::BLACK_IS_ZERO), 1);
        assert_eq!(max_color_channels(photometric::RGB), 3);
        assert_eq!(max_color_channels(photometric::CMYK), 4);
        assert_eq!(max_color_channels(12345), 0);
    }

    #[test]
    fn test_widen_bytes() {
        let widened = widen_bytes(TagValue::Bytes(vec![8, 8, 8]), TagType::Short);
        assert_eq!(widened, TagValue::Shorts(vec![8, 8, 8]));

        let kept = widen_bytes(TagValue::Bytes(vec![1, 2]), TagType::Undefined);
        assert_eq!(kept, TagValue::Bytes(vec![1, 2]));
    }
}
