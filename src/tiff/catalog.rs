//! Tag catalog
//!
//! The catalog maps a tag number (and data type) to everything the
//! directory engine needs to know about a field: accepted types, count
//! rules, where the value lives in the directory model and whether it may
//! change once image data has been written.
//!
//! Entries are kept sorted by `(tag, type)`. A session starts from the
//! built-in TIFF table and grows it at run time: codec-private fields are
//! merged when a compression scheme is selected, and unknown tags met while
//! reading get anonymous entries.

use std::borrow::Cow;
use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::debug;

use crate::tiff::constants::{exif_tags, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::{Field, FieldBit, FieldCount, TagType};

/// Description of a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub tag: u16,
    pub field_type: TagType,
    pub read_count: FieldCount,
    pub write_count: FieldCount,
    pub bit: FieldBit,
    /// May be set after image data has been written
    pub mutable_after_write: bool,
    /// Callers supply an explicit element count when setting the value
    pub pass_count: bool,
    pub name: Cow<'static, str>,
}

impl FieldInfo {
    /// Creates a custom (non-dedicated) field description
    pub fn custom(tag: u16, field_type: TagType, read_count: FieldCount, write_count: FieldCount, name: impl Into<String>) -> Self {
        FieldInfo {
            tag,
            field_type,
            read_count,
            write_count,
            bit: FieldBit::Custom,
            mutable_after_write: true,
            pass_count: read_count.is_variable(),
            name: Cow::Owned(name.into()),
        }
    }

    /// Entry synthesised for a tag found in a file but absent from the catalog
    pub fn anonymous(tag: u16, field_type: TagType) -> Self {
        FieldInfo {
            tag,
            field_type,
            read_count: FieldCount::Variable32,
            write_count: FieldCount::Variable32,
            bit: FieldBit::Custom,
            mutable_after_write: true,
            pass_count: true,
            name: Cow::Owned(anonymous_name(tag)),
        }
    }

    /// True for entries created by [`FieldInfo::anonymous`]
    pub fn is_anonymous(&self) -> bool {
        self.name == anonymous_name(self.tag)
    }
}

fn anonymous_name(tag: u16) -> String {
    format!("Tag {}", tag)
}

fn known(tag: u16, field_type: TagType, read_count: FieldCount, write_count: FieldCount, field: Field, mutable: bool, name: &'static str) -> FieldInfo {
    FieldInfo {
        tag,
        field_type,
        read_count,
        write_count,
        bit: FieldBit::Known(field),
        mutable_after_write: mutable,
        pass_count: false,
        name: Cow::Borrowed(name),
    }
}

fn custom(tag: u16, field_type: TagType, read_count: FieldCount, write_count: FieldCount, pass_count: bool, name: &'static str) -> FieldInfo {
    FieldInfo {
        tag,
        field_type,
        read_count,
        write_count,
        bit: FieldBit::Custom,
        mutable_after_write: true,
        pass_count,
        name: Cow::Borrowed(name),
    }
}

fn ignored(tag: u16, field_type: TagType, read_count: FieldCount, name: &'static str) -> FieldInfo {
    FieldInfo {
        tag,
        field_type,
        read_count,
        write_count: read_count,
        bit: FieldBit::Ignore,
        mutable_after_write: true,
        pass_count: false,
        name: Cow::Borrowed(name),
    }
}

fn with_pass_count(mut info: FieldInfo) -> FieldInfo {
    info.pass_count = true;
    info
}

fn tiff_field_table() -> Vec<FieldInfo> {
    use FieldCount::{Fixed, PerSample, Variable, Variable32};
    use TagType::*;

    let one = Fixed(1);
    let two = Fixed(2);

    vec![
        known(tags::NEW_SUBFILE_TYPE, Long, one, one, Field::SubfileType, true, "SubfileType"),
        known(tags::SUBFILE_TYPE, Short, one, one, Field::SubfileType, true, "OldSubfileType"),
        known(tags::IMAGE_WIDTH, Long, one, one, Field::ImageDimensions, true, "ImageWidth"),
        known(tags::IMAGE_WIDTH, Short, one, one, Field::ImageDimensions, true, "ImageWidth"),
        known(tags::IMAGE_LENGTH, Long, one, one, Field::ImageDimensions, true, "ImageLength"),
        known(tags::IMAGE_LENGTH, Short, one, one, Field::ImageDimensions, true, "ImageLength"),
        known(tags::BITS_PER_SAMPLE, Short, Variable, PerSample, Field::BitsPerSample, false, "BitsPerSample"),
        known(tags::BITS_PER_SAMPLE, Long, Variable, PerSample, Field::BitsPerSample, false, "BitsPerSample"),
        known(tags::COMPRESSION, Short, Variable, one, Field::Compression, false, "Compression"),
        known(tags::PHOTOMETRIC_INTERPRETATION, Short, one, one, Field::Photometric, false, "PhotometricInterpretation"),
        known(tags::THRESHHOLDING, Short, one, one, Field::Threshholding, true, "Threshholding"),
        ignored(tags::CELL_WIDTH, Short, one, "CellWidth"),
        ignored(tags::CELL_LENGTH, Short, one, "CellLength"),
        known(tags::FILL_ORDER, Short, one, one, Field::FillOrder, false, "FillOrder"),
        custom(tags::DOCUMENT_NAME, Ascii, Variable, Variable, false, "DocumentName"),
        custom(tags::IMAGE_DESCRIPTION, Ascii, Variable, Variable, false, "ImageDescription"),
        custom(tags::MAKE, Ascii, Variable, Variable, false, "Make"),
        custom(tags::MODEL, Ascii, Variable, Variable, false, "Model"),
        known(tags::STRIP_OFFSETS, Long, Variable32, Variable32, Field::StripOffsets, false, "StripOffsets"),
        known(tags::STRIP_OFFSETS, Short, Variable32, Variable32, Field::StripOffsets, false, "StripOffsets"),
        known(tags::STRIP_OFFSETS, Long8, Variable32, Variable32, Field::StripOffsets, false, "StripOffsets"),
        known(tags::ORIENTATION, Short, one, one, Field::Orientation, false, "Orientation"),
        known(tags::SAMPLES_PER_PIXEL, Short, one, one, Field::SamplesPerPixel, false, "SamplesPerPixel"),
        known(tags::SAMPLES_PER_PIXEL, Long, one, one, Field::SamplesPerPixel, false, "SamplesPerPixel"),
        known(tags::ROWS_PER_STRIP, Long, one, one, Field::RowsPerStrip, false, "RowsPerStrip"),
        known(tags::ROWS_PER_STRIP, Short, one, one, Field::RowsPerStrip, false, "RowsPerStrip"),
        known(tags::STRIP_BYTE_COUNTS, Long, Variable32, Variable32, Field::StripByteCounts, false, "StripByteCounts"),
        known(tags::STRIP_BYTE_COUNTS, Short, Variable32, Variable32, Field::StripByteCounts, false, "StripByteCounts"),
        known(tags::STRIP_BYTE_COUNTS, Long8, Variable32, Variable32, Field::StripByteCounts, false, "StripByteCounts"),
        known(tags::MIN_SAMPLE_VALUE, Short, Variable, PerSample, Field::MinSampleValue, true, "MinSampleValue"),
        known(tags::MAX_SAMPLE_VALUE, Short, Variable, PerSample, Field::MaxSampleValue, true, "MaxSampleValue"),
        known(tags::X_RESOLUTION, Rational, one, one, Field::Resolution, true, "XResolution"),
        known(tags::Y_RESOLUTION, Rational, one, one, Field::Resolution, true, "YResolution"),
        known(tags::PLANAR_CONFIGURATION, Short, one, one, Field::PlanarConfig, false, "PlanarConfiguration"),
        custom(tags::PAGE_NAME, Ascii, Variable, Variable, false, "PageName"),
        known(tags::X_POSITION, Rational, one, one, Field::Position, true, "XPosition"),
        known(tags::Y_POSITION, Rational, one, one, Field::Position, true, "YPosition"),
        ignored(tags::FREE_OFFSETS, Long, Variable, "FreeOffsets"),
        ignored(tags::FREE_BYTE_COUNTS, Long, Variable, "FreeByteCounts"),
        ignored(tags::GRAY_RESPONSE_UNIT, Short, one, "GrayResponseUnit"),
        ignored(tags::GRAY_RESPONSE_CURVE, Short, Variable, "GrayResponseCurve"),
        known(tags::RESOLUTION_UNIT, Short, one, one, Field::ResolutionUnit, true, "ResolutionUnit"),
        known(tags::PAGE_NUMBER, Short, two, two, Field::PageNumber, true, "PageNumber"),
        known(tags::TRANSFER_FUNCTION, Short, Variable, Variable, Field::TransferFunction, true, "TransferFunction"),
        custom(tags::SOFTWARE, Ascii, Variable, Variable, false, "Software"),
        custom(tags::DATE_TIME, Ascii, Variable, Variable, false, "DateTime"),
        custom(tags::ARTIST, Ascii, Variable, Variable, false, "Artist"),
        custom(tags::HOST_COMPUTER, Ascii, Variable, Variable, false, "HostComputer"),
        custom(tags::WHITE_POINT, Rational, two, two, false, "WhitePoint"),
        custom(tags::PRIMARY_CHROMATICITIES, Rational, Fixed(6), Fixed(6), false, "PrimaryChromaticities"),
        known(tags::COLOR_MAP, Short, Variable, Variable, Field::ColorMap, true, "ColorMap"),
        known(tags::HALFTONE_HINTS, Short, two, two, Field::HalftoneHints, true, "HalftoneHints"),
        known(tags::TILE_WIDTH, Long, one, one, Field::TileDimensions, false, "TileWidth"),
        known(tags::TILE_WIDTH, Short, one, one, Field::TileDimensions, false, "TileWidth"),
        known(tags::TILE_LENGTH, Long, one, one, Field::TileDimensions, false, "TileLength"),
        known(tags::TILE_LENGTH, Short, one, one, Field::TileDimensions, false, "TileLength"),
        known(tags::TILE_OFFSETS, Long, Variable32, Variable32, Field::StripOffsets, false, "TileOffsets"),
        known(tags::TILE_OFFSETS, Long8, Variable32, Variable32, Field::StripOffsets, false, "TileOffsets"),
        known(tags::TILE_BYTE_COUNTS, Long, Variable32, Variable32, Field::StripByteCounts, false, "TileByteCounts"),
        known(tags::TILE_BYTE_COUNTS, Short, Variable32, Variable32, Field::StripByteCounts, false, "TileByteCounts"),
        known(tags::TILE_BYTE_COUNTS, Long8, Variable32, Variable32, Field::StripByteCounts, false, "TileByteCounts"),
        with_pass_count(known(tags::SUB_IFD, Ifd, Variable, Variable, Field::SubIfd, true, "SubIFD")),
        with_pass_count(known(tags::SUB_IFD, Long, Variable, Variable, Field::SubIfd, true, "SubIFD")),
        with_pass_count(known(tags::SUB_IFD, Ifd8, Variable, Variable, Field::SubIfd, true, "SubIFD")),
        custom(tags::INK_SET, Short, one, one, false, "InkSet"),
        with_pass_count(known(tags::INK_NAMES, Ascii, Variable, Variable, Field::InkNames, true, "InkNames")),
        custom(tags::NUMBER_OF_INKS, Short, one, one, false, "NumberOfInks"),
        custom(tags::DOT_RANGE, Short, two, two, false, "DotRange"),
        custom(tags::DOT_RANGE, Byte, two, two, false, "DotRange"),
        custom(tags::TARGET_PRINTER, Ascii, Variable, Variable, false, "TargetPrinter"),
        with_pass_count(known(tags::EXTRA_SAMPLES, Short, Variable, Variable, Field::ExtraSamples, false, "ExtraSamples")),
        known(tags::SAMPLE_FORMAT, Short, Variable, PerSample, Field::SampleFormat, false, "SampleFormat"),
        known(tags::SMIN_SAMPLE_VALUE, Any, Variable, PerSample, Field::SMinSampleValue, true, "SMinSampleValue"),
        known(tags::SMAX_SAMPLE_VALUE, Any, Variable, PerSample, Field::SMaxSampleValue, true, "SMaxSampleValue"),
        custom(tags::YCBCR_COEFFICIENTS, Rational, Fixed(3), Fixed(3), false, "YCbCrCoefficients"),
        known(tags::YCBCR_SUBSAMPLING, Short, two, two, Field::YCbCrSubsampling, false, "YCbCrSubsampling"),
        known(tags::YCBCR_POSITIONING, Short, one, one, Field::YCbCrPositioning, false, "YCbCrPositioning"),
        known(tags::REFERENCE_BLACK_WHITE, Rational, Fixed(6), Fixed(6), Field::RefBlackWhite, true, "ReferenceBlackWhite"),
        known(tags::REFERENCE_BLACK_WHITE, Long, Fixed(6), Fixed(6), Field::RefBlackWhite, true, "ReferenceBlackWhite"),
        known(tags::MATTEING, Short, one, one, Field::ExtraSamples, false, "Matteing"),
        known(tags::DATA_TYPE, Short, Variable, PerSample, Field::SampleFormat, false, "DataType"),
        known(tags::IMAGE_DEPTH, Long, one, one, Field::ImageDepth, false, "ImageDepth"),
        known(tags::IMAGE_DEPTH, Short, one, one, Field::ImageDepth, false, "ImageDepth"),
        known(tags::TILE_DEPTH, Long, one, one, Field::TileDepth, false, "TileDepth"),
        known(tags::TILE_DEPTH, Short, one, one, Field::TileDepth, false, "TileDepth"),
        custom(tags::COPYRIGHT, Ascii, Variable, Variable, false, "Copyright"),
        custom(tags::EXIF_IFD, Ifd, one, one, false, "EXIFIFDOffset"),
        custom(tags::EXIF_IFD, Long, one, one, false, "EXIFIFDOffset"),
        custom(tags::GPS_IFD, Ifd, one, one, false, "GPSIFDOffset"),
        custom(tags::GPS_IFD, Long, one, one, false, "GPSIFDOffset"),
    ]
}

fn exif_field_table() -> Vec<FieldInfo> {
    use FieldCount::{Fixed, Variable};
    use TagType::*;

    let one = Fixed(1);

    vec![
        custom(exif_tags::EXPOSURE_TIME, Rational, one, one, false, "ExposureTime"),
        custom(exif_tags::F_NUMBER, Rational, one, one, false, "FNumber"),
        custom(exif_tags::EXPOSURE_PROGRAM, Short, one, one, false, "ExposureProgram"),
        custom(exif_tags::ISO_SPEED_RATINGS, Short, Variable, Variable, true, "ISOSpeedRatings"),
        custom(exif_tags::EXIF_VERSION, Undefined, Fixed(4), Fixed(4), false, "ExifVersion"),
        custom(exif_tags::DATE_TIME_ORIGINAL, Ascii, Fixed(20), Fixed(20), false, "DateTimeOriginal"),
        custom(exif_tags::DATE_TIME_DIGITIZED, Ascii, Fixed(20), Fixed(20), false, "DateTimeDigitized"),
        custom(exif_tags::SHUTTER_SPEED_VALUE, SRational, one, one, false, "ShutterSpeedValue"),
        custom(exif_tags::APERTURE_VALUE, Rational, one, one, false, "ApertureValue"),
        custom(exif_tags::BRIGHTNESS_VALUE, SRational, one, one, false, "BrightnessValue"),
        custom(exif_tags::EXPOSURE_BIAS_VALUE, SRational, one, one, false, "ExposureBiasValue"),
        custom(exif_tags::MAX_APERTURE_VALUE, Rational, one, one, false, "MaxApertureValue"),
        custom(exif_tags::SUBJECT_DISTANCE, Rational, one, one, false, "SubjectDistance"),
        custom(exif_tags::METERING_MODE, Short, one, one, false, "MeteringMode"),
        custom(exif_tags::LIGHT_SOURCE, Short, one, one, false, "LightSource"),
        custom(exif_tags::FLASH, Short, one, one, false, "Flash"),
        custom(exif_tags::FOCAL_LENGTH, Rational, one, one, false, "FocalLength"),
        custom(exif_tags::MAKER_NOTE, Undefined, Variable, Variable, true, "MakerNote"),
        custom(exif_tags::USER_COMMENT, Undefined, Variable, Variable, true, "UserComment"),
        custom(exif_tags::FLASHPIX_VERSION, Undefined, Fixed(4), Fixed(4), false, "FlashpixVersion"),
        custom(exif_tags::COLOR_SPACE, Short, one, one, false, "ColorSpace"),
        custom(exif_tags::PIXEL_X_DIMENSION, Long, one, one, false, "PixelXDimension"),
        custom(exif_tags::PIXEL_X_DIMENSION, Short, one, one, false, "PixelXDimension"),
        custom(exif_tags::PIXEL_Y_DIMENSION, Long, one, one, false, "PixelYDimension"),
        custom(exif_tags::PIXEL_Y_DIMENSION, Short, one, one, false, "PixelYDimension"),
        custom(exif_tags::FOCAL_PLANE_X_RESOLUTION, Rational, one, one, false, "FocalPlaneXResolution"),
        custom(exif_tags::FOCAL_PLANE_Y_RESOLUTION, Rational, one, one, false, "FocalPlaneYResolution"),
        custom(exif_tags::FOCAL_PLANE_RESOLUTION_UNIT, Short, one, one, false, "FocalPlaneResolutionUnit"),
        custom(exif_tags::EXPOSURE_MODE, Short, one, one, false, "ExposureMode"),
        custom(exif_tags::WHITE_BALANCE, Short, one, one, false, "WhiteBalance"),
        custom(exif_tags::FOCAL_LENGTH_IN_35MM_FILM, Short, one, one, false, "FocalLengthIn35mmFilm"),
        custom(exif_tags::IMAGE_UNIQUE_ID, Ascii, Fixed(33), Fixed(33), false, "ImageUniqueID"),
    ]
}

lazy_static! {
    static ref TIFF_FIELDS: Vec<Arc<FieldInfo>> = sorted(tiff_field_table());
    static ref EXIF_FIELDS: Vec<Arc<FieldInfo>> = sorted(exif_field_table());
    static ref GEOTIFF_FIELDS: Vec<FieldInfo> = {
        let content = include_str!("../../geotiff_fields.toml");
        TagCatalog::fields_from_toml(content).unwrap_or_else(|e| {
            log::warn!("Failed to parse GeoTIFF field definitions: {}", e);
            Vec::new()
        })
    };
}

fn sorted(fields: Vec<FieldInfo>) -> Vec<Arc<FieldInfo>> {
    let mut fields: Vec<Arc<FieldInfo>> = fields.into_iter().map(Arc::new).collect();
    fields.sort_by_key(|f| (f.tag, f.field_type));
    fields
}

/// Name of a built-in TIFF or EXIF tag, if it has one
pub fn builtin_tag_name(tag: u16) -> Option<&'static str> {
    TIFF_FIELDS
        .iter()
        .chain(EXIF_FIELDS.iter())
        .find(|f| f.tag == tag)
        .map(|f| f.name.as_ref())
}

/// Sorted, growable set of field descriptions
#[derive(Debug, Clone)]
pub struct TagCatalog {
    fields: Vec<Arc<FieldInfo>>,
    last_found: Cell<Option<usize>>,
}

impl TagCatalog {
    /// Creates a catalog from arbitrary entries
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        TagCatalog {
            fields: sorted(fields),
            last_found: Cell::new(None),
        }
    }

    /// The built-in TIFF field table
    pub fn tiff() -> Self {
        TagCatalog {
            fields: TIFF_FIELDS.clone(),
            last_found: Cell::new(None),
        }
    }

    /// The EXIF private directory table
    pub fn exif() -> Self {
        TagCatalog {
            fields: EXIF_FIELDS.clone(),
            last_found: Cell::new(None),
        }
    }

    /// GeoTIFF field definitions, for use as extra fields
    pub fn geotiff_fields() -> Vec<FieldInfo> {
        GEOTIFF_FIELDS.clone()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Entry at a sorted position
    pub fn get(&self, index: usize) -> Option<&Arc<FieldInfo>> {
        self.fields.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<FieldInfo>> {
        self.fields.iter()
    }

    /// Sorted position of the entry for `tag` accepting `field_type`.
    ///
    /// `TagType::Any` matches the first entry for the tag. The last hit is
    /// cached since lookups tend to repeat.
    pub fn find_index(&self, tag: u16, field_type: TagType) -> Option<usize> {
        if let Some(i) = self.last_found.get() {
            if let Some(f) = self.fields.get(i) {
                if f.tag == tag && (field_type == TagType::Any || f.field_type == field_type) {
                    return Some(i);
                }
            }
        }

        let start = self.fields.partition_point(|f| f.tag < tag);
        let found = self.fields[start..]
            .iter()
            .take_while(|f| f.tag == tag)
            .position(|f| f.field_type.matches(field_type))
            .map(|offset| start + offset);

        if found.is_some() {
            self.last_found.set(found);
        }
        found
    }

    /// Looks up the entry for `tag` accepting `field_type`
    pub fn find(&self, tag: u16, field_type: TagType) -> Option<Arc<FieldInfo>> {
        self.find_index(tag, field_type).map(|i| Arc::clone(&self.fields[i]))
    }

    /// Looks up an entry by its name
    pub fn find_by_name(&self, name: &str, field_type: TagType) -> Option<Arc<FieldInfo>> {
        self.fields
            .iter()
            .find(|f| f.name == name && f.field_type.matches(field_type))
            .cloned()
    }

    /// Advances a cursor to the first entry carrying `tag`.
    ///
    /// Directory entries are normally sorted, so the cursor only moves
    /// forward; a tag lying before the cursor restarts the scan from the top.
    pub fn seek_tag(&self, tag: u16, cursor: &mut usize) -> bool {
        if *cursor >= self.fields.len() || self.fields[*cursor].tag > tag {
            *cursor = 0;
        }
        while *cursor < self.fields.len() && self.fields[*cursor].tag < tag {
            *cursor += 1;
        }
        *cursor < self.fields.len() && self.fields[*cursor].tag == tag
    }

    /// Adds entries, skipping any `(tag, type)` pair already present.
    ///
    /// Returns the number of entries actually added.
    pub fn merge<I: IntoIterator<Item = FieldInfo>>(&mut self, infos: I) -> usize {
        let mut added = 0;
        for info in infos {
            let exists = self
                .fields
                .iter()
                .any(|f| f.tag == info.tag && f.field_type == info.field_type);
            if exists {
                debug!("Field {} ({}) already in catalog", info.name, info.tag);
                continue;
            }
            self.fields.push(Arc::new(info));
            added += 1;
        }
        if added > 0 {
            self.fields.sort_by_key(|f| (f.tag, f.field_type));
            self.last_found.set(None);
        }
        added
    }

    /// Adds (or returns the existing) anonymous entry for an unknown tag
    pub fn merge_anonymous(&mut self, tag: u16, field_type: TagType) -> Arc<FieldInfo> {
        if let Some(existing) = self.find(tag, field_type) {
            return existing;
        }
        self.merge(std::iter::once(FieldInfo::anonymous(tag, field_type)));
        match self.find(tag, field_type) {
            Some(info) => info,
            None => Arc::new(FieldInfo::anonymous(tag, field_type)),
        }
    }

    /// Parses field definitions from TOML.
    ///
    /// ```toml
    /// [[field]]
    /// tag = 33550
    /// name = "ModelPixelScaleTag"
    /// type = "DOUBLE"
    /// count = 3          # or "variable", "variable32", "per_sample"
    /// ```
    ///
    /// `write_count` defaults to `count`, `mutable` to true and
    /// `pass_count` to whether the count is variable.
    pub fn fields_from_toml(content: &str) -> TiffResult<Vec<FieldInfo>> {
        let toml_value: toml::Value = content
            .parse()
            .map_err(|e| TiffError::FormatError(format!("Failed to parse TOML: {}", e)))?;

        let entries = match toml_value.get("field").and_then(|v| v.as_array()) {
            Some(entries) => entries,
            None => return Ok(Vec::new()),
        };

        let mut fields = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let bad = |what: &str| TiffError::FormatError(format!("field definition {}: {}", index, what));

            let tag = entry
                .get("tag")
                .and_then(|v| v.as_integer())
                .and_then(|v| u16::try_from(v).ok())
                .ok_or_else(|| bad("missing or invalid tag"))?;
            let name = entry
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| bad("missing name"))?;
            let field_type = entry
                .get("type")
                .and_then(|v| v.as_str())
                .and_then(TagType::from_name)
                .ok_or_else(|| bad("missing or unknown type"))?;
            let read_count = parse_count(entry.get("count")).ok_or_else(|| bad("invalid count"))?;
            let write_count = match entry.get("write_count") {
                Some(v) => parse_count(Some(v)).ok_or_else(|| bad("invalid write_count"))?,
                None => read_count,
            };

            let mut info = FieldInfo::custom(tag, field_type, read_count, write_count, name);
            if let Some(mutable) = entry.get("mutable").and_then(|v| v.as_bool()) {
                info.mutable_after_write = mutable;
            }
            if let Some(pass_count) = entry.get("pass_count").and_then(|v| v.as_bool()) {
                info.pass_count = pass_count;
            }
            fields.push(info);
        }

        debug!("Loaded {} field definitions from TOML", fields.len());
        Ok(fields)
    }

    /// Reads field definitions from a TOML file
    pub fn load_toml_file<P: AsRef<Path>>(path: P) -> TiffResult<Vec<FieldInfo>> {
        let content = fs::read_to_string(path)?;
        Self::fields_from_toml(&content)
    }
}

impl Default for TagCatalog {
    fn default() -> Self {
        Self::tiff()
    }
}

fn parse_count(value: Option<&toml::Value>) -> Option<FieldCount> {
    match value {
        None => Some(FieldCount::Variable),
        Some(toml::Value::Integer(n)) => u32::try_from(*n).ok().map(FieldCount::Fixed),
        Some(toml::Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "variable" => Some(FieldCount::Variable),
            "variable32" => Some(FieldCount::Variable32),
            "per_sample" | "persample" => Some(FieldCount::PerSample),
            _ => None,
        },
        Some(_) => None,
    }
}
