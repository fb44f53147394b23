//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading and writing TIFF data.
//! Handlers work both on streams and on in-memory slices, since directory
//! entries are fetched as raw bytes and decoded afterwards.

use byteorder::{BigEndian, ByteOrder as EndianOps, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Result, Write};

use crate::io::seekable::SeekableReader;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(reader: &mut dyn SeekableReader) -> TiffResult<Self> {
        let mut marker = [0u8; 2];
        reader
            .read_exact(&mut marker)
            .map_err(|_| TiffError::InvalidHeader("Cannot read TIFF header".to_string()))?;
        Self::from_marker(marker)
    }

    /// Maps the two header bytes to a byte order
    pub fn from_marker(marker: [u8; 2]) -> TiffResult<Self> {
        match marker {
            header::LITTLE_ENDIAN_MARKER => Ok(ByteOrder::LittleEndian),
            header::BIG_ENDIAN_MARKER => Ok(ByteOrder::BigEndian),
            _ => Err(TiffError::InvalidByteOrder(u16::from_le_bytes(marker))),
        }
    }

    /// The two header bytes for this byte order
    pub fn marker(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => header::LITTLE_ENDIAN_MARKER,
            ByteOrder::BigEndian => header::BIG_ENDIAN_MARKER,
        }
    }

    /// Byte order of the machine running this code
    pub fn host() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        }
    }

    /// True when values in this order must be swapped to be used natively
    pub fn needs_swap(&self) -> bool {
        *self != Self::host()
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
///
/// The `*_into` methods convert whole arrays. Source and destination must
/// agree in size (`src.len() == dst.len() * width`); callers slice
/// accordingly.
pub trait ByteOrderHandler: Send + Sync {
    /// The byte order this handler implements
    fn byte_order(&self) -> ByteOrder;

    /// Read a u16 value
    fn read_u16(&self, reader: &mut dyn Read) -> Result<u16>;

    /// Read a u32 value
    fn read_u32(&self, reader: &mut dyn Read) -> Result<u32>;

    /// Read a u64 value
    fn read_u64(&self, reader: &mut dyn Read) -> Result<u64>;

    /// Write a u16 value
    fn write_u16(&self, writer: &mut dyn Write, value: u16) -> Result<()>;

    /// Write a u32 value
    fn write_u32(&self, writer: &mut dyn Write, value: u32) -> Result<()>;

    /// Write a u64 value
    fn write_u64(&self, writer: &mut dyn Write, value: u64) -> Result<()>;

    /// Decode a u16 from the first two bytes of `buf`
    fn get_u16(&self, buf: &[u8]) -> u16;

    /// Decode a u32 from the first four bytes of `buf`
    fn get_u32(&self, buf: &[u8]) -> u32;

    /// Decode a u64 from the first eight bytes of `buf`
    fn get_u64(&self, buf: &[u8]) -> u64;

    /// Encode a u16 into the first two bytes of `buf`
    fn put_u16(&self, buf: &mut [u8], value: u16);

    /// Encode a u32 into the first four bytes of `buf`
    fn put_u32(&self, buf: &mut [u8], value: u32);

    /// Encode a u64 into the first eight bytes of `buf`
    fn put_u64(&self, buf: &mut [u8], value: u64);

    fn read_u16_into(&self, src: &[u8], dst: &mut [u16]);
    fn read_i16_into(&self, src: &[u8], dst: &mut [i16]);
    fn read_u32_into(&self, src: &[u8], dst: &mut [u32]);
    fn read_i32_into(&self, src: &[u8], dst: &mut [i32]);
    fn read_u64_into(&self, src: &[u8], dst: &mut [u64]);
    fn read_i64_into(&self, src: &[u8], dst: &mut [i64]);
    fn read_f32_into(&self, src: &[u8], dst: &mut [f32]);
    fn read_f64_into(&self, src: &[u8], dst: &mut [f64]);

    fn write_u16_into(&self, src: &[u16], dst: &mut [u8]);
    fn write_i16_into(&self, src: &[i16], dst: &mut [u8]);
    fn write_u32_into(&self, src: &[u32], dst: &mut [u8]);
    fn write_i32_into(&self, src: &[i32], dst: &mut [u8]);
    fn write_u64_into(&self, src: &[u64], dst: &mut [u8]);
    fn write_i64_into(&self, src: &[i64], dst: &mut [u8]);
    fn write_f32_into(&self, src: &[f32], dst: &mut [u8]);
    fn write_f64_into(&self, src: &[f64], dst: &mut [u8]);
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

/// Big-endian byte order handler
pub struct BigEndianHandler;

macro_rules! endian_handler {
    ($handler:ident, $endian:ty, $order:expr) => {
        impl ByteOrderHandler for $handler {
            fn byte_order(&self) -> ByteOrder {
                $order
            }

            fn read_u16(&self, reader: &mut dyn Read) -> Result<u16> {
                reader.read_u16::<$endian>()
            }

            fn read_u32(&self, reader: &mut dyn Read) -> Result<u32> {
                reader.read_u32::<$endian>()
            }

            fn read_u64(&self, reader: &mut dyn Read) -> Result<u64> {
                reader.read_u64::<$endian>()
            }

            fn write_u16(&self, writer: &mut dyn Write, value: u16) -> Result<()> {
                writer.write_u16::<$endian>(value)
            }

            fn write_u32(&self, writer: &mut dyn Write, value: u32) -> Result<()> {
                writer.write_u32::<$endian>(value)
            }

            fn write_u64(&self, writer: &mut dyn Write, value: u64) -> Result<()> {
                writer.write_u64::<$endian>(value)
            }

            fn get_u16(&self, buf: &[u8]) -> u16 {
                <$endian>::read_u16(buf)
            }

            fn get_u32(&self, buf: &[u8]) -> u32 {
                <$endian>::read_u32(buf)
            }

            fn get_u64(&self, buf: &[u8]) -> u64 {
                <$endian>::read_u64(buf)
            }

            fn put_u16(&self, buf: &mut [u8], value: u16) {
                <$endian>::write_u16(buf, value)
            }

            fn put_u32(&self, buf: &mut [u8], value: u32) {
                <$endian>::write_u32(buf, value)
            }

            fn put_u64(&self, buf: &mut [u8], value: u64) {
                <$endian>::write_u64(buf, value)
            }

            fn read_u16_into(&self, src: &[u8], dst: &mut [u16]) {
                <$endian>::read_u16_into(src, dst)
            }

            fn read_i16_into(&self, src: &[u8], dst: &mut [i16]) {
                <$endian>::read_i16_into(src, dst)
            }

            fn read_u32_into(&self, src: &[u8], dst: &mut [u32]) {
                <$endian>::read_u32_into(src, dst)
            }

            fn read_i32_into(&self, src: &[u8], dst: &mut [i32]) {
                <$endian>::read_i32_into(src, dst)
            }

            fn read_u64_into(&self, src: &[u8], dst: &mut [u64]) {
                <$endian>::read_u64_into(src, dst)
            }

            fn read_i64_into(&self, src: &[u8], dst: &mut [i64]) {
                <$endian>::read_i64_into(src, dst)
            }

            fn read_f32_into(&self, src: &[u8], dst: &mut [f32]) {
                <$endian>::read_f32_into(src, dst)
            }

            fn read_f64_into(&self, src: &[u8], dst: &mut [f64]) {
                <$endian>::read_f64_into(src, dst)
            }

            fn write_u16_into(&self, src: &[u16], dst: &mut [u8]) {
                <$endian>::write_u16_into(src, dst)
            }

            fn write_i16_into(&self, src: &[i16], dst: &mut [u8]) {
                <$endian>::write_i16_into(src, dst)
            }

            fn write_u32_into(&self, src: &[u32], dst: &mut [u8]) {
                <$endian>::write_u32_into(src, dst)
            }

            fn write_i32_into(&self, src: &[i32], dst: &mut [u8]) {
                <$endian>::write_i32_into(src, dst)
            }

            fn write_u64_into(&self, src: &[u64], dst: &mut [u8]) {
                <$endian>::write_u64_into(src, dst)
            }

            fn write_i64_into(&self, src: &[i64], dst: &mut [u8]) {
                <$endian>::write_i64_into(src, dst)
            }

            fn write_f32_into(&self, src: &[f32], dst: &mut [u8]) {
                <$endian>::write_f32_into(src, dst)
            }

            fn write_f64_into(&self, src: &[f64], dst: &mut [u8]) {
                <$endian>::write_f64_into(src, dst)
            }
        }
    };
}

endian_handler!(LittleEndianHandler, LittleEndian, ByteOrder::LittleEndian);
endian_handler!(BigEndianHandler, BigEndian, ByteOrder::BigEndian);
