//! Horizontal differencing predictor (Predictor tag value 2)
//!
//! Works on rows still in file byte order: each element is read with the
//! file's byte order, differenced or accumulated with wrapping arithmetic,
//! and written back the same way.

use crate::io::byte_order::ByteOrderHandler;
use crate::tiff::constants::{planar_config, predictor, tags};
use crate::tiff::directory::Directory;
use crate::tiff::errors::{TiffError, TiffResult};

/// Predictor parameters resolved for one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorState {
    /// Bytes per element (1, 2, 4 or 8)
    width: usize,
    /// Elements per pixel in a row
    stride: usize,
    /// Bytes in one row
    row_size: usize,
}

impl PredictorState {
    /// Resolves the predictor configured in `dir`, or `None` when rows
    /// pass through unchanged
    pub fn from_directory(dir: &Directory, row_size: usize) -> TiffResult<Option<Self>> {
        let value = match dir.custom_value(tags::PREDICTOR) {
            Some(custom) => custom.value.as_u16().unwrap_or(predictor::NONE),
            None => predictor::NONE,
        };
        match value {
            predictor::NONE => Ok(None),
            predictor::HORIZONTAL_DIFFERENCING => {
                let width = match dir.bits_per_sample {
                    8 => 1,
                    16 => 2,
                    32 => 4,
                    64 => 8,
                    bps => {
                        return Err(TiffError::CodecError(format!(
                            "Horizontal differencing \"Predictor\" not supported with {}-bit samples",
                            bps
                        )))
                    }
                };
                let stride = if dir.planar_config == planar_config::CHUNKY {
                    dir.samples_per_pixel as usize
                } else {
                    1
                };
                Ok(Some(PredictorState { width, stride, row_size }))
            }
            predictor::FLOATING_POINT => Err(TiffError::CodecError(
                "Floating point \"Predictor\" is not supported".to_string(),
            )),
            other => Err(TiffError::CodecError(format!("\"Predictor\" value {} not supported", other))),
        }
    }

    /// Turns differences back into sample values, row by row
    pub fn accumulate(&self, buf: &mut [u8], handler: &dyn ByteOrderHandler) -> TiffResult<()> {
        self.check_length(buf.len())?;
        for row in buf.chunks_mut(self.row_size) {
            self.accumulate_row(row, handler);
        }
        Ok(())
    }

    /// Replaces sample values by differences, row by row
    pub fn difference(&self, buf: &mut [u8], handler: &dyn ByteOrderHandler) -> TiffResult<()> {
        self.check_length(buf.len())?;
        for row in buf.chunks_mut(self.row_size) {
            self.difference_row(row, handler);
        }
        Ok(())
    }

    fn check_length(&self, len: usize) -> TiffResult<()> {
        if self.row_size == 0 || len % (self.width * self.stride) != 0 {
            return Err(TiffError::CodecError(
                "Predictor: buffer is not a whole number of pixels".to_string(),
            ));
        }
        Ok(())
    }

    fn accumulate_row(&self, row: &mut [u8], handler: &dyn ByteOrderHandler) {
        let stride = self.stride;
        match self.width {
            1 => {
                for i in stride..row.len() {
                    row[i] = row[i].wrapping_add(row[i - stride]);
                }
            }
            2 => {
                let mut values = vec![0u16; row.len() / 2];
                handler.read_u16_into(row, &mut values);
                for i in stride..values.len() {
                    values[i] = values[i].wrapping_add(values[i - stride]);
                }
                handler.write_u16_into(&values, row);
            }
            4 => {
                let mut values = vec![0u32; row.len() / 4];
                handler.read_u32_into(row, &mut values);
                for i in stride..values.len() {
                    values[i] = values[i].wrapping_add(values[i - stride]);
                }
                handler.write_u32_into(&values, row);
            }
            _ => {
                let mut values = vec![0u64; row.len() / 8];
                handler.read_u64_into(row, &mut values);
                for i in stride..values.len() {
                    values[i] = values[i].wrapping_add(values[i - stride]);
                }
                handler.write_u64_into(&values, row);
            }
        }
    }

    fn difference_row(&self, row: &mut [u8], handler: &dyn ByteOrderHandler) {
        let stride = self.stride;
        match self.width {
            1 => {
                for i in (stride..row.len()).rev() {
                    row[i] = row[i].wrapping_sub(row[i - stride]);
                }
            }
            2 => {
                let mut values = vec![0u16; row.len() / 2];
                handler.read_u16_into(row, &mut values);
                for i in (stride..values.len()).rev() {
                    values[i] = values[i].wrapping_sub(values[i - stride]);
                }
                handler.write_u16_into(&values, row);
            }
            4 => {
                let mut values = vec![0u32; row.len() / 4];
                handler.read_u32_into(row, &mut values);
                for i in (stride..values.len()).rev() {
                    values[i] = values[i].wrapping_sub(values[i - stride]);
                }
                handler.write_u32_into(&values, row);
            }
            _ => {
                let mut values = vec![0u64; row.len() / 8];
                handler.read_u64_into(row, &mut values);
                for i in (stride..values.len()).rev() {
                    values[i] = values[i].wrapping_sub(values[i - stride]);
                }
                handler.write_u64_into(&values, row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::byte_order::{BigEndianHandler, LittleEndianHandler};

    #[test]
    fn test_byte_rows() {
        let state = PredictorState { width: 1, stride: 1, row_size: 4 };
        let mut buf = vec![10, 12, 15, 15, 1, 2, 3, 4];
        state.difference(&mut buf, &LittleEndianHandler).unwrap();
        assert_eq!(buf, vec![10, 2, 3, 0, 1, 1, 1, 1]);
        state.accumulate(&mut buf, &LittleEndianHandler).unwrap();
        assert_eq!(buf, vec![10, 12, 15, 15, 1, 2, 3, 4]);
    }

    #[test]
    fn test_short_rows_use_file_order() {
        let state = PredictorState { width: 2, stride: 1, row_size: 4 };
        // big-endian 0x0100, 0x0101
        let mut buf = vec![0x01, 0x00, 0x01, 0x01];
        state.difference(&mut buf, &BigEndianHandler).unwrap();
        assert_eq!(buf, vec![0x01, 0x00, 0x00, 0x01]);
        state.accumulate(&mut buf, &BigEndianHandler).unwrap();
        assert_eq!(buf, vec![0x01, 0x00, 0x01, 0x01]);
    }

    #[test]
    fn test_contiguous_stride() {
        let state = PredictorState { width: 1, stride: 3, row_size: 6 };
        let mut buf = vec![1, 2, 3, 4, 6, 8];
        state.difference(&mut buf, &LittleEndianHandler).unwrap();
        assert_eq!(buf, vec![1, 2, 3, 3, 4, 5]);
    }

    #[test]
    fn test_partial_pixel_rejected() {
        let state = PredictorState { width: 2, stride: 1, row_size: 4 };
        let mut buf = vec![0u8; 3];
        assert!(state.accumulate(&mut buf, &LittleEndianHandler).is_err());
    }
}
