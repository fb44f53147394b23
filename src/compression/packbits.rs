//! Macintosh PackBits run-length codec (compression code 32773)

use log::warn;

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::codec::{Codec, CodecSetup, DecodedBlock};

/// Longest literal or replicate run in one PackBits code
const MAX_RUN: usize = 128;

/// Expands PackBits data.
///
/// Truncated runs are cut short with a warning, matching what readers
/// have always done with damaged files.
pub fn unpack_bits(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut i = 0;
    while i < input.len() {
        let n = input[i] as i8;
        i += 1;
        if n >= 0 {
            let len = n as usize + 1;
            let end = (i + len).min(input.len());
            if end - i < len {
                warn!("PackBits: literal run short by {} bytes", len - (end - i));
            }
            out.extend_from_slice(&input[i..end]);
            i = end;
        } else if n != -128 {
            let len = 1 - n as isize;
            match input.get(i) {
                Some(&b) => out.extend(std::iter::repeat(b).take(len as usize)),
                None => warn!("PackBits: replicate run without data byte"),
            }
            i += 1;
        }
    }
    out
}

/// Compresses one row with PackBits, appending to `out`
pub fn pack_bits(row: &[u8], out: &mut Vec<u8>) {
    let mut i = 0;
    while i < row.len() {
        let mut run = 1;
        while i + run < row.len() && run < MAX_RUN && row[i + run] == row[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((1 - run as isize) as i8 as u8);
            out.push(row[i]);
            i += run;
            continue;
        }

        // Literal run up to the next repeat of three or more
        let start = i;
        while i < row.len() && i - start < MAX_RUN {
            if i + 2 < row.len() && row[i] == row[i + 1] && row[i] == row[i + 2] {
                break;
            }
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&row[start..i]);
    }
}

/// PackBits codec; rows are encoded independently
#[derive(Default)]
pub struct PackBitsCodec {
    row_size: usize,
    decoded: DecodedBlock,
}

impl PackBitsCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Codec for PackBitsCodec {
    fn scheme(&self) -> u16 {
        compression::PACKBITS
    }

    fn name(&self) -> &str {
        "PackBits"
    }

    fn setup_decode(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.row_size = setup.row_size()?;
        Ok(())
    }

    fn pre_decode(&mut self, raw: Vec<u8>, _sample: u16) -> TiffResult<()> {
        self.decoded.reset(unpack_bits(&raw));
        Ok(())
    }

    fn decode_row(&mut self, out: &mut [u8], _sample: u16) -> TiffResult<()> {
        self.decoded.take(out, "PackBits")
    }

    fn setup_encode(&mut self, setup: &CodecSetup<'_>) -> TiffResult<()> {
        self.row_size = setup.row_size()?;
        Ok(())
    }

    fn encode_row(&mut self, data: &[u8], out: &mut Vec<u8>, _sample: u16) -> TiffResult<()> {
        pack_bits(data, out);
        Ok(())
    }

    fn encode_strip(&mut self, data: &[u8], out: &mut Vec<u8>, sample: u16) -> TiffResult<()> {
        if self.row_size == 0 {
            return self.encode_row(data, out, sample);
        }
        for row in data.chunks(self.row_size) {
            self.encode_row(row, out, sample)?;
        }
        Ok(())
    }

    fn encode_tile(&mut self, data: &[u8], out: &mut Vec<u8>, sample: u16) -> TiffResult<()> {
        self.encode_strip(data, out, sample)
    }

    fn seek(&mut self, rows: u32) -> TiffResult<()> {
        let bytes = (rows as usize)
            .checked_mul(self.row_size)
            .ok_or(TiffError::Overflow("seek"))?;
        self.decoded.skip(bytes, "PackBits")
    }

    fn cleanup(&mut self) {
        self.decoded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_reference_sequence() {
        // Apple's sample from Technical Note TN1023
        let packed = [
            0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA,
        ];
        let expected = [
            0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22, 0xAA,
            0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
        ];
        assert_eq!(unpack_bits(&packed), expected.to_vec());
    }

    #[test]
    fn test_pack_then_unpack() {
        let mut row = vec![7u8; 300];
        row.extend((0..200u32).map(|i| i as u8));
        row.extend([1, 1, 2, 2, 2, 3]);
        let mut packed = Vec::new();
        pack_bits(&row, &mut packed);
        assert!(packed.len() < row.len());
        assert_eq!(unpack_bits(&packed), row);
    }

    #[test]
    fn test_noop_code_is_skipped() {
        assert_eq!(unpack_bits(&[0x80, 0x00, 0x05]), vec![0x05]);
    }

    #[test]
    fn test_truncated_literal_keeps_available_bytes() {
        assert_eq!(unpack_bits(&[0x04, 0x01, 0x02]), vec![0x01, 0x02]);
    }
}
