//! Strip and tile geometry
//!
//! Sizes and counts derived from directory fields. Every value here comes
//! from an untrusted file, so all arithmetic is checked and an overflow is
//! reported as [`TiffError::Overflow`] naming the computation.

use log::debug;

use crate::tiff::constants::{limits, photometric, planar_config};
use crate::tiff::directory::Directory;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::Field;

fn mul(a: u64, b: u64, op: &'static str) -> TiffResult<u64> {
    a.checked_mul(b).ok_or(TiffError::Overflow(op))
}

fn add(a: u64, b: u64, op: &'static str) -> TiffResult<u64> {
    a.checked_add(b).ok_or(TiffError::Overflow(op))
}

fn howmany(x: u64, y: u64) -> u64 {
    if y == 0 {
        0
    } else {
        x / y + u64::from(x % y != 0)
    }
}

/// Bytes needed for `bits` bits
fn howmany8(bits: u64) -> u64 {
    (bits >> 3) + u64::from(bits & 7 != 0)
}

/// Converts a computed size to `usize` for buffer allocation
pub fn to_usize(value: u64, op: &'static str) -> TiffResult<usize> {
    usize::try_from(value).map_err(|_| TiffError::Overflow(op))
}

impl Directory {
    fn is_contig(&self) -> bool {
        self.planar_config == planar_config::CHUNKY
    }

    /// Chroma-subsampled packing applies to this directory
    fn uses_ycbcr_packing(&self) -> bool {
        self.is_contig()
            && self.photometric == photometric::YCBCR
            && self.samples_per_pixel == 3
            && !self.upsampled
    }

    /// Validated (horizontal, vertical) subsampling factors
    fn ycbcr_factors(&self) -> TiffResult<(u64, u64)> {
        let [h, v] = self.ycbcr_subsampling;
        let valid = |f: u16| matches!(f, 1 | 2 | 4);
        if !valid(h) || !valid(v) {
            return Err(TiffError::GeometryError(format!(
                "Invalid YCbCr subsampling ({}, {})",
                h, v
            )));
        }
        Ok((h as u64, v as u64))
    }

    /// Samples in one block of subsampled YCbCr data
    fn ycbcr_block_samples(h: u64, v: u64) -> u64 {
        h * v + 2
    }

    /// Bytes of one decoded scanline
    pub fn scanline_size(&self) -> TiffResult<u64> {
        let bps = self.bits_per_sample as u64;
        let width = self.image_width as u64;

        let size = if self.uses_ycbcr_packing() {
            let (h, v) = self.ycbcr_factors()?;
            let blocks_hor = howmany(width, h);
            let row_samples = mul(blocks_hor, Self::ycbcr_block_samples(h, v), "scanline_size")?;
            let row_bits = mul(row_samples, bps, "scanline_size")?;
            howmany8(row_bits) / v
        } else {
            let samples = if self.is_contig() {
                mul(width, self.samples_per_pixel as u64, "scanline_size")?
            } else {
                width
            };
            howmany8(mul(samples, bps, "scanline_size")?)
        };

        if size == 0 {
            return Err(TiffError::GeometryError("Computed scanline size is zero".to_string()));
        }
        Ok(size)
    }

    /// Bytes of a strip holding `nrows` rows; `u32::MAX` means the whole image
    pub fn vstrip_size(&self, nrows: u32) -> TiffResult<u64> {
        let nrows = u64::from(if nrows == u32::MAX { self.image_length } else { nrows });

        if self.uses_ycbcr_packing() {
            let (h, v) = self.ycbcr_factors()?;
            let blocks_hor = howmany(self.image_width as u64, h);
            let blocks_ver = howmany(nrows, v);
            let line_samples = mul(blocks_hor, Self::ycbcr_block_samples(h, v), "vstrip_size")?;
            let line_size = howmany8(mul(line_samples, self.bits_per_sample as u64, "vstrip_size")?);
            return mul(blocks_ver, line_size, "vstrip_size");
        }

        mul(nrows, self.scanline_size()?, "vstrip_size")
    }

    /// Bytes of a full strip
    pub fn strip_size(&self) -> TiffResult<u64> {
        let rps = self.rows_per_strip.min(self.image_length);
        self.vstrip_size(rps)
    }

    /// Recorded byte count of `strip`
    pub fn raw_strip_size(&self, strip: u32) -> TiffResult<u64> {
        let count = self
            .strip_byte_counts
            .get(strip as usize)
            .copied()
            .ok_or_else(|| TiffError::GeometryError(format!("{}: Strip out of range, max {}", strip, self.nstrips)))?;
        if count == 0 {
            return Err(TiffError::GeometryError(format!("{}: Invalid strip byte count, strip {}", count, strip)));
        }
        Ok(count)
    }

    /// Strips per sample plane
    fn strips_per_plane(&self) -> u64 {
        if self.rows_per_strip == u32::MAX {
            1
        } else {
            howmany(self.image_length as u64, self.rows_per_strip as u64)
        }
    }

    /// Number of strips in the image
    pub fn number_of_strips(&self) -> TiffResult<u32> {
        let mut nstrips = self.strips_per_plane();
        if self.planar_config == planar_config::PLANAR {
            nstrips = mul(nstrips, self.samples_per_pixel as u64, "number_of_strips")?;
        }
        u32::try_from(nstrips).map_err(|_| TiffError::Overflow("number_of_strips"))
    }

    /// Strip holding `row` of plane `sample`
    pub fn compute_strip(&self, row: u32, sample: u16) -> TiffResult<u32> {
        let rps = self.rows_per_strip.max(1) as u64;
        let mut strip = row as u64 / rps;
        if self.planar_config == planar_config::PLANAR {
            if sample >= self.samples_per_pixel {
                return Err(TiffError::GeometryError(format!(
                    "{}: Sample out of range, max {}",
                    sample, self.samples_per_pixel
                )));
            }
            let per_plane = mul(sample as u64, self.strips_per_plane(), "compute_strip")?;
            strip = add(strip, per_plane, "compute_strip")?;
        }
        u32::try_from(strip).map_err(|_| TiffError::Overflow("compute_strip"))
    }

    /// Bytes of one row within a tile
    pub fn tile_row_size(&self) -> TiffResult<u64> {
        if self.tile_width == 0 || self.tile_length == 0 {
            return Err(TiffError::GeometryError("Tile width or length is zero".to_string()));
        }
        let mut bits = mul(self.bits_per_sample as u64, self.tile_width as u64, "tile_row_size")?;
        if self.is_contig() {
            bits = mul(bits, self.samples_per_pixel as u64, "tile_row_size")?;
        }
        let size = howmany8(bits);
        if size == 0 {
            return Err(TiffError::GeometryError("Computed tile row size is zero".to_string()));
        }
        Ok(size)
    }

    /// Bytes of a tile holding `nrows` rows
    pub fn vtile_size(&self, nrows: u32) -> TiffResult<u64> {
        if self.tile_width == 0 || self.tile_length == 0 || self.tile_depth == 0 {
            return Err(TiffError::GeometryError("Tile dimensions are zero".to_string()));
        }

        if self.uses_ycbcr_packing() {
            let (h, v) = self.ycbcr_factors()?;
            let blocks_hor = howmany(self.tile_width as u64, h);
            let blocks_ver = howmany(nrows as u64, v);
            let line_samples = mul(blocks_hor, Self::ycbcr_block_samples(h, v), "vtile_size")?;
            let line_size = howmany8(mul(line_samples, self.bits_per_sample as u64, "vtile_size")?);
            return mul(blocks_ver, line_size, "vtile_size");
        }

        let rows = mul(nrows as u64, self.tile_row_size()?, "vtile_size")?;
        mul(rows, self.tile_depth as u64, "vtile_size")
    }

    /// Bytes of a full tile
    pub fn tile_size(&self) -> TiffResult<u64> {
        self.vtile_size(self.tile_length)
    }

    /// Tile extents with `u32::MAX` meaning "the whole image"
    fn tile_extents(&self) -> (u64, u64, u64) {
        let pick = |tile: u32, image: u32| u64::from(if tile == u32::MAX { image } else { tile });
        (
            pick(self.tile_width, self.image_width),
            pick(self.tile_length, self.image_length),
            pick(self.tile_depth, self.image_depth),
        )
    }

    /// Tiles across, down and deep
    fn tiles_per_axis(&self) -> (u64, u64, u64) {
        let (dx, dy, dz) = self.tile_extents();
        (
            howmany(self.image_width as u64, dx),
            howmany(self.image_length as u64, dy),
            howmany(self.image_depth as u64, dz),
        )
    }

    /// Number of tiles in the image
    pub fn number_of_tiles(&self) -> TiffResult<u32> {
        let (dx, dy, dz) = self.tile_extents();
        let mut ntiles = if dx == 0 || dy == 0 || dz == 0 {
            0
        } else {
            let (across, down, deep) = self.tiles_per_axis();
            mul(mul(across, down, "number_of_tiles")?, deep, "number_of_tiles")?
        };
        if self.planar_config == planar_config::PLANAR {
            ntiles = mul(ntiles, self.samples_per_pixel as u64, "number_of_tiles")?;
        }
        u32::try_from(ntiles).map_err(|_| TiffError::Overflow("number_of_tiles"))
    }

    /// Tile holding pixel (x, y, z) of plane `sample`
    pub fn compute_tile(&self, x: u32, y: u32, z: u32, sample: u16) -> TiffResult<u32> {
        let (dx, dy, dz) = self.tile_extents();
        if dx == 0 || dy == 0 || dz == 0 {
            return Err(TiffError::GeometryError("Tile dimensions are zero".to_string()));
        }
        let (across, down, deep) = self.tiles_per_axis();
        let plane = mul(across, down, "compute_tile")?;

        let mut tile = add(
            mul(plane, z as u64 / dz, "compute_tile")?,
            add(mul(across, y as u64 / dy, "compute_tile")?, x as u64 / dx, "compute_tile")?,
            "compute_tile",
        )?;
        if self.planar_config == planar_config::PLANAR {
            let volume = mul(plane, deep, "compute_tile")?;
            tile = add(tile, mul(volume, sample as u64, "compute_tile")?, "compute_tile")?;
        }
        u32::try_from(tile).map_err(|_| TiffError::Overflow("compute_tile"))
    }

    /// Checks that (x, y, z, sample) lies inside the image
    pub fn check_tile(&self, x: u32, y: u32, z: u32, sample: u16) -> TiffResult<()> {
        if x >= self.image_width {
            return Err(TiffError::GeometryError(format!("{}: Col out of range, max {}", x, self.image_width.saturating_sub(1))));
        }
        if y >= self.image_length {
            return Err(TiffError::GeometryError(format!("{}: Row out of range, max {}", y, self.image_length.saturating_sub(1))));
        }
        if z >= self.image_depth {
            return Err(TiffError::GeometryError(format!("{}: Depth out of range, max {}", z, self.image_depth.saturating_sub(1))));
        }
        if self.planar_config == planar_config::PLANAR && sample >= self.samples_per_pixel {
            return Err(TiffError::GeometryError(format!("{}: Sample out of range, max {}", sample, self.samples_per_pixel.saturating_sub(1))));
        }
        Ok(())
    }

    /// Rows per strip for strips near the default strip size.
    ///
    /// A positive `request` is returned unchanged.
    pub fn default_strip_size(&self, request: u32) -> TiffResult<u32> {
        if request >= 1 && request != u32::MAX {
            return Ok(request);
        }
        let scanline = self.scanline_size()?;
        let rows = (limits::STRIP_SIZE_DEFAULT / scanline).max(1);
        Ok(u32::try_from(rows).unwrap_or(u32::MAX))
    }

    /// Tile dimensions with zero requests replaced by the default, rounded
    /// up to a multiple of 16
    pub fn default_tile_size(width: u32, length: u32) -> (u32, u32) {
        let round = |v: u32| {
            let v = if v < 1 { limits::TILE_SIZE_DEFAULT } else { v };
            if v & 0xf != 0 {
                v.saturating_add(0xf) & !0xf
            } else {
                v
            }
        };
        (round(width), round(length))
    }

    /// Splits one large uncompressed strip into strips of roughly the
    /// default strip size. Returns true if the layout changed.
    pub fn chop_up_single_uncompressed_strip(&mut self) -> TiffResult<bool> {
        let (Some(&total), Some(&first_offset)) = (self.strip_byte_counts.first(), self.strip_offsets.first()) else {
            return Ok(false);
        };
        if total == 0 {
            return Ok(false);
        }

        let rowblock = if self.uses_ycbcr_packing() {
            self.ycbcr_subsampling[1] as u32
        } else {
            1
        };
        let rowblock_bytes = self.vstrip_size(rowblock)?;
        let (rows_per_strip, strip_bytes) = if rowblock_bytes > limits::STRIP_SIZE_DEFAULT {
            (rowblock as u64, rowblock_bytes)
        } else if rowblock_bytes > 0 {
            let blocks = limits::STRIP_SIZE_DEFAULT / rowblock_bytes;
            (blocks * rowblock as u64, blocks * rowblock_bytes)
        } else {
            return Ok(false);
        };

        if rows_per_strip >= self.rows_per_strip as u64 {
            return Ok(false);
        }
        let nstrips = howmany(self.image_length as u64, rows_per_strip);
        if nstrips == 0 {
            return Ok(false);
        }
        let nstrips = u32::try_from(nstrips).map_err(|_| TiffError::Overflow("chop_up_single_uncompressed_strip"))?;

        let mut offsets = Vec::with_capacity(nstrips as usize);
        let mut counts = Vec::with_capacity(nstrips as usize);
        let mut remaining = total;
        let mut offset = first_offset;
        for _ in 0..nstrips {
            let bytes = strip_bytes.min(remaining);
            counts.push(bytes);
            offsets.push(if bytes > 0 { offset } else { 0 });
            offset = add(offset, bytes, "chop_up_single_uncompressed_strip")?;
            remaining -= bytes;
        }

        debug!(
            "Chopped single strip of {} bytes into {} strips of {} rows",
            total, nstrips, rows_per_strip
        );
        self.strip_offsets = offsets;
        self.strip_byte_counts = counts;
        self.nstrips = nstrips;
        self.strips_per_image = nstrips;
        self.rows_per_strip = rows_per_strip as u32;
        self.mark(Field::RowsPerStrip);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_image(width: u32, length: u32) -> Directory {
        let mut dir = Directory::new();
        dir.image_width = width;
        dir.image_length = length;
        dir.bits_per_sample = 8;
        dir.samples_per_pixel = 1;
        dir.rows_per_strip = length;
        dir.mark(Field::ImageDimensions);
        dir
    }

    #[test]
    fn test_basic_strip_geometry() {
        let dir = gray_image(4, 4);
        assert_eq!(dir.scanline_size().unwrap(), 4);
        assert_eq!(dir.number_of_strips().unwrap(), 1);
        assert_eq!(dir.strip_size().unwrap(), 16);
    }

    #[test]
    fn test_sub_byte_scanline_rounds_up() {
        let mut dir = gray_image(9, 1);
        dir.bits_per_sample = 1;
        assert_eq!(dir.scanline_size().unwrap(), 2);
    }

    #[test]
    fn test_planar_strip_count() {
        let mut dir = gray_image(10, 10);
        dir.samples_per_pixel = 3;
        dir.rows_per_strip = 3;
        assert_eq!(dir.number_of_strips().unwrap(), 4);
        dir.planar_config = planar_config::PLANAR;
        assert_eq!(dir.number_of_strips().unwrap(), 12);
        assert_eq!(dir.scanline_size().unwrap(), 10);
        assert_eq!(dir.compute_strip(4, 2).unwrap(), 9);
        assert!(dir.compute_strip(0, 3).is_err());
    }

    #[test]
    fn test_ycbcr_scanline() {
        let mut dir = gray_image(5, 4);
        dir.samples_per_pixel = 3;
        dir.photometric = photometric::YCBCR;
        dir.ycbcr_subsampling = [2, 2];
        // 3 blocks of 6 samples, spread over two rows
        assert_eq!(dir.scanline_size().unwrap(), 9);
        assert_eq!(dir.vstrip_size(4).unwrap(), 36);
        dir.ycbcr_subsampling = [3, 1];
        assert!(dir.scanline_size().is_err());
    }

    #[test]
    fn test_overflow_is_reported() {
        let mut dir = gray_image(u32::MAX, u32::MAX);
        dir.bits_per_sample = 64;
        dir.samples_per_pixel = u16::MAX;
        assert!(dir.scanline_size().is_ok());
        assert!(matches!(dir.strip_size(), Err(TiffError::Overflow(_))));
        assert!(matches!(dir.vstrip_size(u32::MAX), Err(TiffError::Overflow(_))));
    }

    #[test]
    fn test_zero_scanline_is_error() {
        let dir = gray_image(0, 4);
        assert!(matches!(dir.scanline_size(), Err(TiffError::GeometryError(_))));
    }

    #[test]
    fn test_tile_geometry() {
        let mut dir = gray_image(100, 50);
        dir.samples_per_pixel = 3;
        dir.tile_width = 32;
        dir.tile_length = 16;
        dir.mark(Field::TileDimensions);
        assert_eq!(dir.tile_row_size().unwrap(), 96);
        assert_eq!(dir.tile_size().unwrap(), 96 * 16);
        assert_eq!(dir.number_of_tiles().unwrap(), 4 * 4);
        assert_eq!(dir.compute_tile(33, 17, 0, 0).unwrap(), 5);
        assert!(dir.check_tile(100, 0, 0, 0).is_err());
        assert!(dir.check_tile(99, 49, 0, 0).is_ok());

        dir.planar_config = planar_config::PLANAR;
        assert_eq!(dir.number_of_tiles().unwrap(), 48);
        assert_eq!(dir.compute_tile(0, 0, 0, 2).unwrap(), 32);
    }

    #[test]
    fn test_default_sizes() {
        let dir = gray_image(1000, 100);
        assert_eq!(dir.default_strip_size(0).unwrap(), 8);
        assert_eq!(dir.default_strip_size(5).unwrap(), 5);
        assert_eq!(Directory::default_tile_size(0, 0), (256, 256));
        assert_eq!(Directory::default_tile_size(17, 32), (32, 32));
    }

    #[test]
    fn test_chop_single_strip() {
        let mut dir = gray_image(1000, 100);
        dir.nstrips = 1;
        dir.strips_per_image = 1;
        dir.strip_offsets = vec![200];
        dir.strip_byte_counts = vec![100_000];

        assert!(dir.chop_up_single_uncompressed_strip().unwrap());
        assert_eq!(dir.rows_per_strip, 8);
        assert_eq!(dir.nstrips, 13);
        assert_eq!(dir.strip_offsets[1], 8200);
        assert_eq!(dir.strip_byte_counts[12], 4000);
        assert_eq!(dir.strip_byte_counts.iter().sum::<u64>(), 100_000);
        assert!(dir.is_set(Field::RowsPerStrip));
    }

    #[test]
    fn test_chop_skips_small_strip() {
        let mut dir = gray_image(10, 10);
        dir.nstrips = 1;
        dir.strip_offsets = vec![8];
        dir.strip_byte_counts = vec![100];
        assert!(!dir.chop_up_single_uncompressed_strip().unwrap());
        assert_eq!(dir.nstrips, 1);
    }
}
