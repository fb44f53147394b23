//! Compression conversion functionality
//!
//! Re-encodes every directory of a file with another compression scheme.
//! Fields are copied through the field API, pixel data is decoded strip by
//! strip (or tile by tile) and encoded again by the target codec.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::{debug, info};

use crate::io::seekable::TiffStream;
use crate::tiff::catalog::FieldInfo;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::file::TiffFile;
use crate::tiff::geometry::to_usize;
use crate::tiff::options::TiffOptions;
use crate::tiff::value::TagValue;
use crate::utils::progress::ProgressTracker;
use crate::utils::tiff_code_translators::compression_code_to_name;
use super::registry::is_field_valid_for_codec;

/// Fields that describe the source file's layout rather than the image
const LAYOUT_TAGS: &[u16] = &[
    tags::STRIP_OFFSETS,
    tags::STRIP_BYTE_COUNTS,
    tags::TILE_OFFSETS,
    tags::TILE_BYTE_COUNTS,
    tags::COMPRESSION,
    tags::SUB_IFD,
    tags::JPEG_TABLES,
    tags::EXIF_IFD,
    tags::GPS_IFD,
];

/// Converter for changing compression formats
pub struct CompressionConverter {
    options: TiffOptions,
    progress: bool,
}

impl CompressionConverter {
    /// Creates a converter writing with `options`.
    ///
    /// Byte order and BigTIFF-ness of the output follow the input file.
    pub fn new(options: TiffOptions) -> Self {
        CompressionConverter { options, progress: false }
    }

    /// Shows a progress bar per directory
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Converts `input_path` into `output_path` using `scheme`.
    ///
    /// Returns the number of directories written.
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        input_options: TiffOptions,
        output_path: Q,
        scheme: u16,
    ) -> TiffResult<u32> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        info!(
            "Converting {} to {} with {} compression",
            input_path.display(),
            output_path.display(),
            compression_code_to_name(scheme)
        );

        let source = File::open(input_path)?;
        let mut input = TiffFile::open(source, input_options)?;
        let target = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(output_path)?;
        let (_, count) = self.convert(&mut input, target, scheme)?;
        Ok(count)
    }

    /// Converts every directory of `input`, writing a new file to `output`.
    ///
    /// Returns the output stream and the number of directories written.
    pub fn convert<R: TiffStream, W: TiffStream>(
        &self,
        input: &mut TiffFile<R>,
        output: W,
        scheme: u16,
    ) -> TiffResult<(W, u32)> {
        if !self.options.registry.is_configured(scheme) {
            let name = self
                .options
                .registry
                .find(scheme)
                .map(|info| info.name)
                .unwrap_or_else(|| format!("scheme {}", scheme));
            return Err(TiffError::CodecNotConfigured { scheme, name });
        }

        let options = self
            .options
            .clone()
            .byte_order(input.byte_order())
            .big_tiff(input.is_big_tiff());
        let mut out = TiffFile::create(output, options)?;

        input.set_directory(0)?;
        let mut count = 0;
        loop {
            self.copy_fields(input, &mut out, scheme)?;
            self.copy_pixels(input, &mut out, count)?;
            out.write_directory()?;
            count += 1;
            if !input.read_directory()? {
                break;
            }
        }

        info!("Converted {} director{}", count, if count == 1 { "y" } else { "ies" });
        Ok((out.close()?, count))
    }

    fn copy_fields<R: TiffStream, W: TiffStream>(
        &self,
        input: &TiffFile<R>,
        out: &mut TiffFile<W>,
        scheme: u16,
    ) -> TiffResult<()> {
        let dir = input.directory();
        out.set_field(tags::COMPRESSION, TagValue::Short(scheme))?;

        // Custom fields of the source may be unknown to the output catalog
        let customs: Vec<FieldInfo> = dir
            .custom_values
            .iter()
            .filter(|c| is_field_valid_for_codec(c.info.tag, scheme))
            .map(|c| (*c.info).clone())
            .collect();
        out.merge_fields(customs);

        for tag in dir.set_tags() {
            if LAYOUT_TAGS.contains(&tag) || !is_field_valid_for_codec(tag, scheme) {
                continue;
            }
            if let Some(value) = dir.get_field(tag) {
                debug!("Copying field {}: {}", tag, value);
                out.set_field(tag, value)?;
            }
        }
        Ok(())
    }

    fn copy_pixels<R: TiffStream, W: TiffStream>(
        &self,
        input: &mut TiffFile<R>,
        out: &mut TiffFile<W>,
        index: u32,
    ) -> TiffResult<()> {
        let tiled = input.is_tiled();
        let blocks = input.directory().nstrips;
        let tracker = if self.progress {
            ProgressTracker::new(u64::from(blocks), &format!("Directory {}", index))
        } else {
            ProgressTracker::hidden()
        };

        if tiled {
            let mut buf = vec![0u8; to_usize(input.directory().tile_size()?, "copy_pixels")?];
            for tile in 0..blocks {
                let n = input.read_encoded_tile(tile, &mut buf)?;
                out.write_encoded_tile(tile, &buf[..n])?;
                tracker.increment(1);
            }
        } else {
            for strip in 0..blocks {
                let data = input.read_strip(strip)?;
                out.write_encoded_strip(strip, &data)?;
                tracker.increment(1);
            }
        }
        tracker.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::tiff::constants::{compression, photometric};

    fn gradient_file() -> Cursor<Vec<u8>> {
        let mut file = TiffFile::create(Cursor::new(Vec::new()), TiffOptions::new()).unwrap();
        file.set_field(tags::IMAGE_WIDTH, TagValue::Long(16)).unwrap();
        file.set_field(tags::IMAGE_LENGTH, TagValue::Long(8)).unwrap();
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(8)).unwrap();
        file.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(photometric::BLACK_IS_ZERO)).unwrap();
        file.set_field(tags::ROWS_PER_STRIP, TagValue::Long(4)).unwrap();
        let pixels: Vec<u8> = (0..128u32).map(|i| (i * 2) as u8).collect();
        file.write_encoded_strip(0, &pixels[..64]).unwrap();
        file.write_encoded_strip(1, &pixels[64..]).unwrap();
        file.close().unwrap()
    }

    #[test]
    fn test_convert_to_deflate_keeps_pixels() {
        let mut input = TiffFile::open(gradient_file(), TiffOptions::new()).unwrap();
        let converter = CompressionConverter::new(TiffOptions::new());
        let (output, count) = converter
            .convert(&mut input, Cursor::new(Vec::new()), compression::DEFLATE)
            .unwrap();
        assert_eq!(count, 1);

        let mut converted = TiffFile::open(output, TiffOptions::new()).unwrap();
        assert_eq!(converted.directory().compression, compression::DEFLATE);
        assert_eq!(converted.directory().image_width, 16);
        let strip = converted.read_strip(1).unwrap();
        assert_eq!(strip.len(), 64);
        assert_eq!(strip[0], 128);
    }

    #[test]
    fn test_convert_refuses_unconfigured_scheme() {
        let mut input = TiffFile::open(gradient_file(), TiffOptions::new()).unwrap();
        let converter = CompressionConverter::new(TiffOptions::new());
        let result = converter.convert(&mut input, Cursor::new(Vec::new()), compression::JPEG);
        assert!(matches!(result, Err(TiffError::CodecNotConfigured { .. })));
    }
}
