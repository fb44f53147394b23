//! Directory model
//!
//! A [`Directory`] holds the fields of one image file directory. Fields the
//! engine interprets live in dedicated members whose presence is tracked by
//! a [`FieldSet`] bitmap; everything else is kept as a list of custom
//! values tagged with their catalog entry.

use std::fmt;
use std::sync::Arc;

use crate::tiff::catalog::{builtin_tag_name, FieldInfo, TagCatalog};
use crate::tiff::constants::{
    compression, data_type, extra_samples, fill_order, ink_set, new_subfile_type, old_subfile_type,
    orientation,
    photometric, planar_config, predictor, resolution_unit, sample_format, tags, threshholding,
    ycbcr_positioning,
};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::{Field, FieldBit, FieldSet, TagType};
use crate::tiff::value::TagValue;
use crate::utils::logger::DiagnosticSink;
use crate::utils::string_utils::{latin1_encode, split_nul_list};
use crate::utils::tiff_code_translators::compression_code_to_name;

/// A field without a dedicated member
#[derive(Debug, Clone, PartialEq)]
pub struct CustomValue {
    pub info: Arc<FieldInfo>,
    pub value: TagValue,
}

/// Everything `set_field` needs besides the directory itself
pub struct FieldContext<'a> {
    pub catalog: &'a TagCatalog,
    pub sink: &'a dyn DiagnosticSink,
    pub file_name: &'a str,
    /// Values come from a file being read rather than from a caller
    pub reading: bool,
}

impl FieldContext<'_> {
    fn warn(&self, message: &str) {
        self.sink.warning(Some(self.file_name), "set_field", message);
    }
}

/// One image file directory
#[derive(Debug, Clone, PartialEq)]
pub struct Directory {
    pub(crate) fields_set: FieldSet,
    pub subfile_type: u32,
    pub image_width: u32,
    pub image_length: u32,
    pub image_depth: u32,
    pub tile_width: u32,
    pub tile_length: u32,
    pub tile_depth: u32,
    pub bits_per_sample: u16,
    pub samples_per_pixel: u16,
    pub compression: u16,
    pub photometric: u16,
    pub threshholding: u16,
    pub fill_order: u16,
    pub orientation: u16,
    pub rows_per_strip: u32,
    pub min_sample_value: u16,
    pub max_sample_value: u16,
    pub smin_sample_value: f64,
    pub smax_sample_value: f64,
    pub x_resolution: f32,
    pub y_resolution: f32,
    pub resolution_unit: u16,
    pub planar_config: u16,
    pub x_position: f32,
    pub y_position: f32,
    pub page_number: [u16; 2],
    pub halftone_hints: [u16; 2],
    pub colormap: [Vec<u16>; 3],
    /// One curve, or three (one per colour channel)
    pub transfer_function: Vec<Vec<u16>>,
    pub extra_samples: Vec<u16>,
    pub sample_format: u16,
    pub ycbcr_subsampling: [u16; 2],
    pub ycbcr_positioning: u16,
    pub ref_black_white: [f32; 6],
    pub ink_names: Vec<String>,
    pub sub_ifds: Vec<u64>,
    /// Strips (or tiles) per sample plane
    pub strips_per_image: u32,
    /// Total strips (or tiles) across all planes
    pub nstrips: u32,
    pub strip_offsets: Vec<u64>,
    pub strip_byte_counts: Vec<u64>,
    /// Strip data appears in file order
    pub strip_bytecount_sorted: bool,
    /// Codec delivers full-resolution chroma, so subsampling is ignored in sizes
    pub upsampled: bool,
    pub custom_values: Vec<CustomValue>,
}

impl Default for Directory {
    fn default() -> Self {
        Directory {
            fields_set: FieldSet::new(),
            subfile_type: 0,
            image_width: 0,
            image_length: 0,
            image_depth: 1,
            tile_width: 0,
            tile_length: 0,
            tile_depth: 1,
            bits_per_sample: 1,
            samples_per_pixel: 1,
            compression: compression::NONE,
            photometric: photometric::WHITE_IS_ZERO,
            threshholding: threshholding::BILEVEL,
            fill_order: fill_order::MSB_TO_LSB,
            orientation: orientation::TOP_LEFT,
            rows_per_strip: u32::MAX,
            min_sample_value: 0,
            max_sample_value: 1,
            smin_sample_value: 0.0,
            smax_sample_value: 0.0,
            x_resolution: 0.0,
            y_resolution: 0.0,
            resolution_unit: resolution_unit::INCH,
            planar_config: planar_config::CHUNKY,
            x_position: 0.0,
            y_position: 0.0,
            page_number: [0, 0],
            halftone_hints: [0, 0],
            colormap: [Vec::new(), Vec::new(), Vec::new()],
            transfer_function: Vec::new(),
            extra_samples: Vec::new(),
            sample_format: sample_format::UNSIGNED,
            ycbcr_subsampling: [2, 2],
            ycbcr_positioning: ycbcr_positioning::CENTERED,
            ref_black_white: [0.0; 6],
            ink_names: Vec::new(),
            sub_ifds: Vec::new(),
            strips_per_image: 0,
            nstrips: 0,
            strip_offsets: Vec::new(),
            strip_byte_counts: Vec::new(),
            strip_bytecount_sorted: true,
            upsampled: false,
            custom_values: Vec::new(),
        }
    }
}

/// Dedicated field holding `tag`, if any
pub fn field_for_tag(tag: u16) -> Option<Field> {
    let field = match tag {
        tags::IMAGE_WIDTH | tags::IMAGE_LENGTH => Field::ImageDimensions,
        tags::TILE_WIDTH | tags::TILE_LENGTH => Field::TileDimensions,
        tags::X_RESOLUTION | tags::Y_RESOLUTION => Field::Resolution,
        tags::X_POSITION | tags::Y_POSITION => Field::Position,
        tags::NEW_SUBFILE_TYPE | tags::SUBFILE_TYPE => Field::SubfileType,
        tags::BITS_PER_SAMPLE => Field::BitsPerSample,
        tags::COMPRESSION => Field::Compression,
        tags::PHOTOMETRIC_INTERPRETATION => Field::Photometric,
        tags::THRESHHOLDING => Field::Threshholding,
        tags::FILL_ORDER => Field::FillOrder,
        tags::ORIENTATION => Field::Orientation,
        tags::SAMPLES_PER_PIXEL => Field::SamplesPerPixel,
        tags::ROWS_PER_STRIP => Field::RowsPerStrip,
        tags::MIN_SAMPLE_VALUE => Field::MinSampleValue,
        tags::MAX_SAMPLE_VALUE => Field::MaxSampleValue,
        tags::PLANAR_CONFIGURATION => Field::PlanarConfig,
        tags::RESOLUTION_UNIT => Field::ResolutionUnit,
        tags::PAGE_NUMBER => Field::PageNumber,
        tags::STRIP_BYTE_COUNTS | tags::TILE_BYTE_COUNTS => Field::StripByteCounts,
        tags::STRIP_OFFSETS | tags::TILE_OFFSETS => Field::StripOffsets,
        tags::COLOR_MAP => Field::ColorMap,
        tags::EXTRA_SAMPLES | tags::MATTEING => Field::ExtraSamples,
        tags::SAMPLE_FORMAT | tags::DATA_TYPE => Field::SampleFormat,
        tags::SMIN_SAMPLE_VALUE => Field::SMinSampleValue,
        tags::SMAX_SAMPLE_VALUE => Field::SMaxSampleValue,
        tags::IMAGE_DEPTH => Field::ImageDepth,
        tags::TILE_DEPTH => Field::TileDepth,
        tags::HALFTONE_HINTS => Field::HalftoneHints,
        tags::YCBCR_SUBSAMPLING => Field::YCbCrSubsampling,
        tags::YCBCR_POSITIONING => Field::YCbCrPositioning,
        tags::REFERENCE_BLACK_WHITE => Field::RefBlackWhite,
        tags::TRANSFER_FUNCTION => Field::TransferFunction,
        tags::INK_NAMES => Field::InkNames,
        tags::SUB_IFD => Field::SubIfd,
        _ => return None,
    };
    Some(field)
}

/// Tags written for a present field
pub fn field_tags(field: Field, tiled: bool) -> &'static [u16] {
    match field {
        Field::ImageDimensions => &[tags::IMAGE_WIDTH, tags::IMAGE_LENGTH],
        Field::TileDimensions => &[tags::TILE_WIDTH, tags::TILE_LENGTH],
        Field::Resolution => &[tags::X_RESOLUTION, tags::Y_RESOLUTION],
        Field::Position => &[tags::X_POSITION, tags::Y_POSITION],
        Field::SubfileType => &[tags::NEW_SUBFILE_TYPE],
        Field::BitsPerSample => &[tags::BITS_PER_SAMPLE],
        Field::Compression => &[tags::COMPRESSION],
        Field::Photometric => &[tags::PHOTOMETRIC_INTERPRETATION],
        Field::Threshholding => &[tags::THRESHHOLDING],
        Field::FillOrder => &[tags::FILL_ORDER],
        Field::Orientation => &[tags::ORIENTATION],
        Field::SamplesPerPixel => &[tags::SAMPLES_PER_PIXEL],
        Field::RowsPerStrip => &[tags::ROWS_PER_STRIP],
        Field::MinSampleValue => &[tags::MIN_SAMPLE_VALUE],
        Field::MaxSampleValue => &[tags::MAX_SAMPLE_VALUE],
        Field::PlanarConfig => &[tags::PLANAR_CONFIGURATION],
        Field::ResolutionUnit => &[tags::RESOLUTION_UNIT],
        Field::PageNumber => &[tags::PAGE_NUMBER],
        Field::StripByteCounts if tiled => &[tags::TILE_BYTE_COUNTS],
        Field::StripByteCounts => &[tags::STRIP_BYTE_COUNTS],
        Field::StripOffsets if tiled => &[tags::TILE_OFFSETS],
        Field::StripOffsets => &[tags::STRIP_OFFSETS],
        Field::ColorMap => &[tags::COLOR_MAP],
        Field::ExtraSamples => &[tags::EXTRA_SAMPLES],
        Field::SampleFormat => &[tags::SAMPLE_FORMAT],
        Field::SMinSampleValue => &[tags::SMIN_SAMPLE_VALUE],
        Field::SMaxSampleValue => &[tags::SMAX_SAMPLE_VALUE],
        Field::ImageDepth => &[tags::IMAGE_DEPTH],
        Field::TileDepth => &[tags::TILE_DEPTH],
        Field::HalftoneHints => &[tags::HALFTONE_HINTS],
        Field::YCbCrSubsampling => &[tags::YCBCR_SUBSAMPLING],
        Field::YCbCrPositioning => &[tags::YCBCR_POSITIONING],
        Field::RefBlackWhite => &[tags::REFERENCE_BLACK_WHITE],
        Field::TransferFunction => &[tags::TRANSFER_FUNCTION],
        Field::InkNames => &[tags::INK_NAMES],
        Field::SubIfd => &[tags::SUB_IFD],
    }
}

fn scalar_u16(value: &TagValue, tag: u16, name: &str) -> TiffResult<u16> {
    value
        .as_u16()
        .ok_or_else(|| TiffError::field(tag, name, format!("expected a single integer, got {}", value)))
}

fn scalar_u32(value: &TagValue, tag: u16, name: &str) -> TiffResult<u32> {
    value
        .as_u32()
        .ok_or_else(|| TiffError::field(tag, name, format!("expected a single integer, got {}", value)))
}

fn scalar_f32(value: &TagValue, tag: u16, name: &str) -> TiffResult<f32> {
    value
        .as_f32()
        .ok_or_else(|| TiffError::field(tag, name, format!("expected a single number, got {}", value)))
}

fn shorts(value: &TagValue, tag: u16, name: &str, len: Option<usize>) -> TiffResult<Vec<u16>> {
    let values = value
        .to_u16_vec()
        .ok_or_else(|| TiffError::field(tag, name, "expected integer values"))?;
    match len {
        Some(len) if values.len() != len => Err(TiffError::field(
            tag,
            name,
            format!("expected {} values, got {}", len, values.len()),
        )),
        _ => Ok(values),
    }
}

/// Single value shared by all samples
fn per_sample_u16(value: &TagValue, tag: u16, name: &str) -> TiffResult<u16> {
    let values = shorts(value, tag, name, None)?;
    match values.split_first() {
        None => Err(TiffError::field(tag, name, "no values")),
        Some((first, rest)) if rest.iter().any(|v| v != first) => {
            Err(TiffError::field(tag, name, "Cannot handle different values per sample"))
        }
        Some((first, _)) => Ok(*first),
    }
}

fn per_sample_f64(value: &TagValue, tag: u16, name: &str) -> TiffResult<f64> {
    let values = value
        .to_f64_vec()
        .ok_or_else(|| TiffError::field(tag, name, "expected numeric values"))?;
    match values.split_first() {
        None => Err(TiffError::field(tag, name, "no values")),
        Some((first, rest)) if rest.iter().any(|v| v != first) => {
            Err(TiffError::field(tag, name, "Cannot handle different values per sample"))
        }
        Some((first, _)) => Ok(*first),
    }
}

fn bad_value(tag: u16, name: &str, value: impl fmt::Display) -> TiffError {
    TiffError::field(tag, name, format!("Bad value {} for \"{}\" tag", value, name))
}

impl Directory {
    /// Creates a directory with every field at its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Presence bitmap
    pub fn fields_set(&self) -> FieldSet {
        self.fields_set
    }

    pub fn is_set(&self, field: Field) -> bool {
        self.fields_set.contains(field)
    }

    pub(crate) fn mark(&mut self, field: Field) {
        self.fields_set.set(field);
    }

    pub(crate) fn unmark(&mut self, field: Field) {
        self.fields_set.clear(field);
    }

    /// True when image data is organised in tiles
    pub fn is_tiled(&self) -> bool {
        self.is_set(Field::TileDimensions)
    }

    /// Stored custom value for `tag`
    pub fn custom_value(&self, tag: u16) -> Option<&CustomValue> {
        self.custom_values.iter().find(|c| c.info.tag == tag)
    }

    /// Sets a field from a caller-supplied or file-decoded value.
    ///
    /// Validation follows the field's catalog entry. Selecting the codec for
    /// a new Compression value is the session's job; this only records it.
    pub fn set_field(&mut self, ctx: &FieldContext<'_>, tag: u16, value: TagValue) -> TiffResult<()> {
        let info = ctx.catalog.find(tag, TagType::Any).ok_or(TiffError::UnknownTag(tag))?;
        self.apply_field(ctx, info, value)
    }

    /// Sets a field through an already resolved catalog entry
    pub(crate) fn apply_field(&mut self, ctx: &FieldContext<'_>, info: Arc<FieldInfo>, value: TagValue) -> TiffResult<()> {
        let tag = info.tag;
        match info.bit {
            FieldBit::Ignore => Ok(()),
            FieldBit::Custom => self.set_custom(info, value),
            FieldBit::Known(field) => {
                self.set_known(ctx, tag, &info.name, &value)?;
                self.fields_set.set(field);
                Ok(())
            }
        }
    }

    fn set_custom(&mut self, info: Arc<FieldInfo>, value: TagValue) -> TiffResult<()> {
        let converted = value.convert(info.field_type).ok_or_else(|| {
            TiffError::field(info.tag, &info.name, format!("cannot store {} as {}", value, info.field_type))
        })?;

        if info.field_type != TagType::Ascii {
            if let Some(expected) = info.write_count.expected(self.samples_per_pixel) {
                let count = converted.count() as u64;
                if count != expected {
                    return Err(TiffError::field(
                        info.tag,
                        &info.name,
                        format!("Incorrect count {}, expected {}", count, expected),
                    ));
                }
            }
        }

        match self.custom_values.iter_mut().find(|c| c.info.tag == info.tag) {
            Some(existing) => {
                existing.info = info;
                existing.value = converted;
            }
            None => self.custom_values.push(CustomValue { info, value: converted }),
        }
        Ok(())
    }

    fn set_known(&mut self, ctx: &FieldContext<'_>, tag: u16, name: &str, value: &TagValue) -> TiffResult<()> {
        match tag {
            tags::NEW_SUBFILE_TYPE => self.subfile_type = scalar_u32(value, tag, name)?,
            tags::SUBFILE_TYPE => {
                self.subfile_type = match scalar_u16(value, tag, name)? {
                    old_subfile_type::REDUCED_IMAGE => new_subfile_type::REDUCED_RESOLUTION,
                    old_subfile_type::PAGE => new_subfile_type::SINGLE_PAGE,
                    _ => 0,
                }
            }
            tags::IMAGE_WIDTH => self.image_width = scalar_u32(value, tag, name)?,
            tags::IMAGE_LENGTH => self.image_length = scalar_u32(value, tag, name)?,
            tags::IMAGE_DEPTH => self.image_depth = scalar_u32(value, tag, name)?,
            tags::BITS_PER_SAMPLE => self.bits_per_sample = per_sample_u16(value, tag, name)?,
            tags::COMPRESSION => self.compression = per_sample_u16(value, tag, name)?,
            tags::PHOTOMETRIC_INTERPRETATION => self.photometric = scalar_u16(value, tag, name)?,
            tags::THRESHHOLDING => self.threshholding = scalar_u16(value, tag, name)?,
            tags::FILL_ORDER => {
                let v = scalar_u16(value, tag, name)?;
                if v != fill_order::MSB_TO_LSB && v != fill_order::LSB_TO_MSB {
                    return Err(bad_value(tag, name, v));
                }
                self.fill_order = v;
            }
            tags::ORIENTATION => {
                let v = scalar_u16(value, tag, name)?;
                if !(orientation::TOP_LEFT..=orientation::LEFT_BOTTOM).contains(&v) {
                    return Err(bad_value(tag, name, v));
                }
                self.orientation = v;
            }
            tags::SAMPLES_PER_PIXEL => {
                let v = scalar_u16(value, tag, name)?;
                if v == 0 {
                    return Err(bad_value(tag, name, v));
                }
                self.samples_per_pixel = v;
            }
            tags::ROWS_PER_STRIP => {
                let v = scalar_u32(value, tag, name)?;
                if v == 0 {
                    return Err(bad_value(tag, name, v));
                }
                self.rows_per_strip = v;
            }
            tags::MIN_SAMPLE_VALUE => self.min_sample_value = per_sample_u16(value, tag, name)?,
            tags::MAX_SAMPLE_VALUE => self.max_sample_value = per_sample_u16(value, tag, name)?,
            tags::SMIN_SAMPLE_VALUE => self.smin_sample_value = per_sample_f64(value, tag, name)?,
            tags::SMAX_SAMPLE_VALUE => self.smax_sample_value = per_sample_f64(value, tag, name)?,
            tags::X_RESOLUTION | tags::Y_RESOLUTION => {
                let v = scalar_f32(value, tag, name)?;
                if v.is_nan() || v < 0.0 {
                    return Err(bad_value(tag, name, v));
                }
                if tag == tags::X_RESOLUTION {
                    self.x_resolution = v;
                } else {
                    self.y_resolution = v;
                }
            }
            tags::X_POSITION => self.x_position = scalar_f32(value, tag, name)?,
            tags::Y_POSITION => self.y_position = scalar_f32(value, tag, name)?,
            tags::PLANAR_CONFIGURATION => {
                let v = scalar_u16(value, tag, name)?;
                if v != planar_config::CHUNKY && v != planar_config::PLANAR {
                    return Err(bad_value(tag, name, v));
                }
                self.planar_config = v;
            }
            tags::RESOLUTION_UNIT => {
                let v = scalar_u16(value, tag, name)?;
                if !(resolution_unit::NONE..=resolution_unit::CENTIMETER).contains(&v) {
                    return Err(bad_value(tag, name, v));
                }
                self.resolution_unit = v;
            }
            tags::PAGE_NUMBER => {
                let v = shorts(value, tag, name, Some(2))?;
                self.page_number = [v[0], v[1]];
            }
            tags::HALFTONE_HINTS => {
                let v = shorts(value, tag, name, Some(2))?;
                self.halftone_hints = [v[0], v[1]];
            }
            tags::YCBCR_SUBSAMPLING => {
                let v = shorts(value, tag, name, Some(2))?;
                self.ycbcr_subsampling = [v[0], v[1]];
            }
            tags::YCBCR_POSITIONING => self.ycbcr_positioning = scalar_u16(value, tag, name)?,
            tags::COLOR_MAP => {
                let n = self.palette_entries(tag, name)?;
                let v = shorts(value, tag, name, Some(3 * n))?;
                self.colormap = [v[..n].to_vec(), v[n..2 * n].to_vec(), v[2 * n..].to_vec()];
            }
            tags::TRANSFER_FUNCTION => {
                let n = self.palette_entries(tag, name)?;
                let v = shorts(value, tag, name, None)?;
                self.transfer_function = if v.len() == n {
                    vec![v]
                } else if v.len() == 3 * n {
                    v.chunks_exact(n).map(<[u16]>::to_vec).collect()
                } else {
                    return Err(TiffError::field(
                        tag,
                        name,
                        format!("expected {} or {} values, got {}", n, 3 * n, v.len()),
                    ));
                };
            }
            tags::EXTRA_SAMPLES => {
                let v = shorts(value, tag, name, None)?;
                self.set_extra_samples(tag, name, v)?;
            }
            tags::MATTEING => {
                let v = scalar_u16(value, tag, name)?;
                self.extra_samples = if v != 0 { vec![extra_samples::ASSOCIATED_ALPHA] } else { Vec::new() };
            }
            tags::TILE_WIDTH | tags::TILE_LENGTH => {
                let v = scalar_u32(value, tag, name)?;
                if v % 16 != 0 {
                    if !ctx.reading {
                        return Err(bad_value(tag, name, v));
                    }
                    let which = if tag == tags::TILE_WIDTH { "width" } else { "length" };
                    ctx.warn(&format!("Nonstandard tile {} {}, convert file", which, v));
                }
                if tag == tags::TILE_WIDTH {
                    self.tile_width = v;
                } else {
                    self.tile_length = v;
                }
            }
            tags::TILE_DEPTH => {
                let v = scalar_u32(value, tag, name)?;
                if v == 0 {
                    return Err(bad_value(tag, name, v));
                }
                self.tile_depth = v;
            }
            tags::DATA_TYPE => {
                let v = per_sample_u16(value, tag, name)?;
                self.sample_format = match v {
                    data_type::VOID => sample_format::VOID,
                    data_type::INT => sample_format::SIGNED,
                    data_type::UINT => sample_format::UNSIGNED,
                    data_type::IEEEFP => sample_format::IEEEFP,
                    _ => return Err(bad_value(tag, name, v)),
                };
            }
            tags::SAMPLE_FORMAT => {
                let v = per_sample_u16(value, tag, name)?;
                if !(sample_format::UNSIGNED..=sample_format::COMPLEX_IEEEFP).contains(&v) {
                    return Err(bad_value(tag, name, v));
                }
                self.sample_format = v;
            }
            tags::REFERENCE_BLACK_WHITE => {
                let v = value
                    .to_f32_vec()
                    .filter(|v| v.len() == 6)
                    .ok_or_else(|| TiffError::field(tag, name, "expected 6 numbers"))?;
                self.ref_black_white.copy_from_slice(&v);
            }
            tags::INK_NAMES => {
                let bytes = match value {
                    TagValue::Text(s) => latin1_encode(s),
                    other => other
                        .to_u8_vec()
                        .ok_or_else(|| TiffError::field(tag, name, "expected text"))?,
                };
                let names = split_nul_list(&bytes);
                let inks = self.samples_per_pixel.saturating_sub(self.extra_samples.len() as u16) as usize;
                if names.len() < inks && inks > 1 {
                    return Err(TiffError::field(
                        tag,
                        name,
                        format!("Too few names, {} for {} inks", names.len(), inks),
                    ));
                }
                self.ink_names = names;
            }
            tags::SUB_IFD => {
                self.sub_ifds = value
                    .to_u64_vec()
                    .ok_or_else(|| TiffError::field(tag, name, "expected offsets"))?;
            }
            tags::STRIP_OFFSETS | tags::TILE_OFFSETS | tags::STRIP_BYTE_COUNTS | tags::TILE_BYTE_COUNTS => {
                return Err(TiffError::field(tag, name, "maintained by the library and cannot be set"));
            }
            _ => return Err(TiffError::field(tag, name, "no dedicated storage for this tag")),
        }
        Ok(())
    }

    /// Entries per colormap or transfer curve: `2^BitsPerSample`
    fn palette_entries(&self, tag: u16, name: &str) -> TiffResult<usize> {
        if self.bits_per_sample > 24 {
            return Err(TiffError::field(
                tag,
                name,
                format!("cannot handle BitsPerSample {}", self.bits_per_sample),
            ));
        }
        Ok(1usize << self.bits_per_sample)
    }

    fn set_extra_samples(&mut self, tag: u16, name: &str, mut values: Vec<u16>) -> TiffResult<()> {
        if values.len() > self.samples_per_pixel as usize {
            return Err(TiffError::field(
                tag,
                name,
                format!("{} extra samples for {} samples per pixel", values.len(), self.samples_per_pixel),
            ));
        }
        for v in values.iter_mut() {
            if *v > extra_samples::UNASSOCIATED_ALPHA {
                if *v == extra_samples::COREL_UNASSOCIATED_ALPHA {
                    *v = extra_samples::UNASSOCIATED_ALPHA;
                } else {
                    return Err(bad_value(tag, name, *v));
                }
            }
        }
        self.extra_samples = values;
        Ok(())
    }

    /// Current value of a field, `None` if it is not set
    pub fn get_field(&self, tag: u16) -> Option<TagValue> {
        let field = match field_for_tag(tag) {
            Some(field) => field,
            None => return self.custom_value(tag).map(|c| c.value.clone()),
        };
        if !self.is_set(field) {
            return None;
        }
        let tiled = self.is_tiled();

        let value = match tag {
            tags::NEW_SUBFILE_TYPE => TagValue::Long(self.subfile_type),
            tags::IMAGE_WIDTH => TagValue::Long(self.image_width),
            tags::IMAGE_LENGTH => TagValue::Long(self.image_length),
            tags::IMAGE_DEPTH => TagValue::Long(self.image_depth),
            tags::TILE_WIDTH => TagValue::Long(self.tile_width),
            tags::TILE_LENGTH => TagValue::Long(self.tile_length),
            tags::TILE_DEPTH => TagValue::Long(self.tile_depth),
            tags::BITS_PER_SAMPLE => TagValue::Short(self.bits_per_sample),
            tags::SAMPLES_PER_PIXEL => TagValue::Short(self.samples_per_pixel),
            tags::COMPRESSION => TagValue::Short(self.compression),
            tags::PHOTOMETRIC_INTERPRETATION => TagValue::Short(self.photometric),
            tags::THRESHHOLDING => TagValue::Short(self.threshholding),
            tags::FILL_ORDER => TagValue::Short(self.fill_order),
            tags::ORIENTATION => TagValue::Short(self.orientation),
            tags::ROWS_PER_STRIP => TagValue::Long(self.rows_per_strip),
            tags::MIN_SAMPLE_VALUE => TagValue::Short(self.min_sample_value),
            tags::MAX_SAMPLE_VALUE => TagValue::Short(self.max_sample_value),
            tags::SMIN_SAMPLE_VALUE => TagValue::Double(self.smin_sample_value),
            tags::SMAX_SAMPLE_VALUE => TagValue::Double(self.smax_sample_value),
            tags::X_RESOLUTION => TagValue::Float(self.x_resolution),
            tags::Y_RESOLUTION => TagValue::Float(self.y_resolution),
            tags::X_POSITION => TagValue::Float(self.x_position),
            tags::Y_POSITION => TagValue::Float(self.y_position),
            tags::PLANAR_CONFIGURATION => TagValue::Short(self.planar_config),
            tags::RESOLUTION_UNIT => TagValue::Short(self.resolution_unit),
            tags::PAGE_NUMBER => TagValue::Shorts(self.page_number.to_vec()),
            tags::HALFTONE_HINTS => TagValue::Shorts(self.halftone_hints.to_vec()),
            tags::YCBCR_SUBSAMPLING => TagValue::Shorts(self.ycbcr_subsampling.to_vec()),
            tags::YCBCR_POSITIONING => TagValue::Short(self.ycbcr_positioning),
            tags::COLOR_MAP => TagValue::Shorts(self.colormap.concat()),
            tags::TRANSFER_FUNCTION => TagValue::Shorts(self.transfer_function.concat()),
            tags::EXTRA_SAMPLES => TagValue::Shorts(self.extra_samples.clone()),
            tags::MATTEING => TagValue::Short(self.is_matteing() as u16),
            tags::SAMPLE_FORMAT => TagValue::Short(self.sample_format),
            tags::DATA_TYPE => TagValue::Short(self.sample_format.saturating_sub(1)),
            tags::REFERENCE_BLACK_WHITE => TagValue::Floats(self.ref_black_white.to_vec()),
            tags::INK_NAMES => TagValue::Text(self.ink_names.join("\0")),
            tags::SUB_IFD => TagValue::Long8s(self.sub_ifds.clone()),
            tags::STRIP_OFFSETS if !tiled => TagValue::Long8s(self.strip_offsets.clone()),
            tags::TILE_OFFSETS if tiled => TagValue::Long8s(self.strip_offsets.clone()),
            tags::STRIP_BYTE_COUNTS if !tiled => TagValue::Long8s(self.strip_byte_counts.clone()),
            tags::TILE_BYTE_COUNTS if tiled => TagValue::Long8s(self.strip_byte_counts.clone()),
            _ => return None,
        };
        Some(value)
    }

    fn is_matteing(&self) -> bool {
        self.extra_samples.len() == 1 && self.extra_samples[0] == extra_samples::ASSOCIATED_ALPHA
    }

    /// Like [`Directory::get_field`], falling back to the TIFF default for
    /// fields that have one
    pub fn get_field_defaulted(&self, tag: u16) -> Option<TagValue> {
        if let Some(value) = self.get_field(tag) {
            return Some(value);
        }

        let max_value = ((1u64 << self.bits_per_sample.min(16)) - 1) as u16;
        let value = match tag {
            tags::NEW_SUBFILE_TYPE => TagValue::Long(self.subfile_type),
            tags::BITS_PER_SAMPLE => TagValue::Short(self.bits_per_sample),
            tags::THRESHHOLDING => TagValue::Short(self.threshholding),
            tags::FILL_ORDER => TagValue::Short(self.fill_order),
            tags::ORIENTATION => TagValue::Short(self.orientation),
            tags::SAMPLES_PER_PIXEL => TagValue::Short(self.samples_per_pixel),
            tags::ROWS_PER_STRIP => TagValue::Long(self.rows_per_strip),
            tags::MIN_SAMPLE_VALUE => TagValue::Short(self.min_sample_value),
            tags::MAX_SAMPLE_VALUE => TagValue::Short(max_value),
            tags::PLANAR_CONFIGURATION => TagValue::Short(self.planar_config),
            tags::RESOLUTION_UNIT => TagValue::Short(self.resolution_unit),
            tags::PREDICTOR => TagValue::Short(predictor::NONE),
            tags::DOT_RANGE => TagValue::Shorts(vec![0, max_value]),
            tags::INK_SET => TagValue::Short(ink_set::CMYK),
            tags::NUMBER_OF_INKS => TagValue::Short(4),
            tags::EXTRA_SAMPLES => TagValue::Shorts(self.extra_samples.clone()),
            tags::MATTEING => TagValue::Short(self.is_matteing() as u16),
            tags::TILE_DEPTH => TagValue::Long(self.tile_depth),
            tags::DATA_TYPE => TagValue::Short(self.sample_format.saturating_sub(1)),
            tags::SAMPLE_FORMAT => TagValue::Short(self.sample_format),
            tags::IMAGE_DEPTH => TagValue::Long(self.image_depth),
            tags::YCBCR_COEFFICIENTS => TagValue::Doubles(vec![0.299, 0.587, 0.114]),
            tags::YCBCR_SUBSAMPLING => TagValue::Shorts(self.ycbcr_subsampling.to_vec()),
            tags::YCBCR_POSITIONING => TagValue::Short(self.ycbcr_positioning),
            tags::WHITE_POINT => TagValue::Doubles(vec![0.3457, 0.3585]),
            tags::TRANSFER_FUNCTION => {
                if self.bits_per_sample > 16 {
                    return None;
                }
                let n = 1usize << self.bits_per_sample;
                let curve: Vec<u16> = (0..n)
                    .map(|i| (65535.0 * i as f64 / (n.max(2) - 1) as f64 + 0.5).floor() as u16)
                    .collect();
                let channels = self.samples_per_pixel.saturating_sub(self.extra_samples.len() as u16);
                if channels > 1 {
                    TagValue::Shorts([curve.clone(), curve.clone(), curve].concat())
                } else {
                    TagValue::Shorts(curve)
                }
            }
            tags::REFERENCE_BLACK_WHITE => {
                let rbw = if self.photometric == photometric::YCBCR {
                    vec![0.0, 255.0, 128.0, 255.0, 128.0, 255.0]
                } else {
                    let top = ((1u64 << self.bits_per_sample.min(32)) - 1) as f32;
                    vec![0.0, top, 0.0, top, 0.0, top]
                };
                TagValue::Floats(rbw)
            }
            _ => return None,
        };
        Some(value)
    }

    /// Clears a field. Returns false if it was not set.
    pub fn unset_field(&mut self, tag: u16) -> bool {
        match field_for_tag(tag) {
            Some(field) => {
                let was_set = self.is_set(field);
                self.fields_set.clear(field);
                match field {
                    Field::ColorMap => self.colormap = [Vec::new(), Vec::new(), Vec::new()],
                    Field::TransferFunction => self.transfer_function.clear(),
                    Field::ExtraSamples => self.extra_samples.clear(),
                    Field::InkNames => self.ink_names.clear(),
                    Field::SubIfd => self.sub_ifds.clear(),
                    _ => {}
                }
                was_set
            }
            None => {
                let before = self.custom_values.len();
                self.custom_values.retain(|c| c.info.tag != tag);
                self.custom_values.len() != before
            }
        }
    }

    /// Tags of every present field, in ascending order
    pub fn set_tags(&self) -> Vec<u16> {
        let tiled = self.is_tiled();
        let mut result: Vec<u16> = self
            .fields_set
            .iter()
            .flat_map(|field| field_tags(field, tiled).iter().copied())
            .chain(self.custom_values.iter().map(|c| c.info.tag))
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Image: {} x {}, {} sample(s) of {} bit(s), {} ({})",
            self.image_width,
            self.image_length,
            self.samples_per_pixel,
            self.bits_per_sample,
            compression_code_to_name(self.compression),
            self.compression
        )?;
        if self.is_tiled() {
            writeln!(f, "Tiles: {} x {}, {} total", self.tile_width, self.tile_length, self.nstrips)?;
        } else {
            writeln!(f, "Strips: {} total, {} rows each", self.nstrips, self.rows_per_strip)?;
        }
        for tag in self.set_tags() {
            let name = match self.custom_value(tag) {
                Some(custom) => custom.info.name.to_string(),
                None => builtin_tag_name(tag).unwrap_or("Unknown").to_string(),
            };
            if let Some(value) = self.get_field(tag) {
                writeln!(f, "  {} ({}): {}", name, tag, value)?;
            }
        }
        Ok(())
    }
}
