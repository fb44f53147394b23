//! Tests for the byte order module

use std::io::Cursor;
use byteorder::{LittleEndian, BigEndian, WriteBytesExt};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler, LittleEndianHandler, BigEndianHandler};
use crate::tiff::errors::TiffError;

#[test]
fn test_byte_order_detection_little_endian() {
    let mut cursor = Cursor::new(b"II".to_vec());
    let result = ByteOrder::detect(&mut cursor);
    assert_eq!(result.unwrap(), ByteOrder::LittleEndian);
}

#[test]
fn test_byte_order_detection_big_endian() {
    let mut cursor = Cursor::new(b"MM".to_vec());
    let result = ByteOrder::detect(&mut cursor);
    assert_eq!(result.unwrap(), ByteOrder::BigEndian);
}

#[test]
fn test_byte_order_detection_invalid() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(0x1234).unwrap();
    let mut cursor = Cursor::new(buffer);

    let result = ByteOrder::detect(&mut cursor);
    assert!(matches!(result, Err(TiffError::InvalidByteOrder(0x1234))));
}

#[test]
fn test_marker_round_trip() {
    for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        assert_eq!(ByteOrder::from_marker(order.marker()).unwrap(), order);
    }
    assert!(!ByteOrder::host().needs_swap());
}

#[test]
fn test_little_endian_handler() {
    let mut buffer = Vec::new();
    buffer.write_u16::<LittleEndian>(0x1234).unwrap();
    buffer.write_u32::<LittleEndian>(0x12345678).unwrap();
    buffer.write_u64::<LittleEndian>(0x1234567890ABCDEF).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = LittleEndianHandler;

    assert_eq!(handler.read_u16(&mut cursor).unwrap(), 0x1234);
    assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x12345678);
    assert_eq!(handler.read_u64(&mut cursor).unwrap(), 0x1234567890ABCDEF);
}

#[test]
fn test_big_endian_handler() {
    let mut buffer = Vec::new();
    buffer.write_u16::<BigEndian>(0x1234).unwrap();
    buffer.write_u32::<BigEndian>(0x12345678).unwrap();
    buffer.write_u64::<BigEndian>(0x1234567890ABCDEF).unwrap();
    let mut cursor = Cursor::new(buffer);

    let handler = BigEndianHandler;

    assert_eq!(handler.read_u16(&mut cursor).unwrap(), 0x1234);
    assert_eq!(handler.read_u32(&mut cursor).unwrap(), 0x12345678);
    assert_eq!(handler.read_u64(&mut cursor).unwrap(), 0x1234567890ABCDEF);
}

#[test]
fn test_slice_access() {
    let handler = BigEndianHandler;
    let mut buf = [0u8; 8];
    handler.put_u32(&mut buf, 0xDEADBEEF);
    assert_eq!(&buf[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(handler.get_u32(&buf), 0xDEADBEEF);
    assert_eq!(LittleEndianHandler.get_u16(&buf), 0xADDE);
}

#[test]
fn test_array_conversion() {
    let handler = ByteOrder::BigEndian.create_handler();
    let mut bytes = [0u8; 6];
    handler.write_u16_into(&[1, 2, 0x0300], &mut bytes);
    assert_eq!(bytes, [0, 1, 0, 2, 3, 0]);

    let mut values = [0u16; 3];
    handler.read_u16_into(&bytes, &mut values);
    assert_eq!(values, [1, 2, 0x0300]);
}
