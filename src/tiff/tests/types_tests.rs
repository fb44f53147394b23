//! Tests for field types, count rules, the presence bitmap and values

use crate::io::byte_order::{BigEndianHandler, LittleEndianHandler};
use crate::tiff::types::{Field, FieldCount, FieldSet, TagType};
use crate::tiff::value::{double_to_rational, TagValue};

#[test]
fn test_tag_type_codes() {
    for code in 1..=18u16 {
        if let Some(tag_type) = TagType::from_code(code) {
            assert_eq!(tag_type.code(), code);
        }
    }
    assert_eq!(TagType::from_code(14), None);
    assert_eq!(TagType::from_code(99), None);
    assert_eq!(TagType::Rational.size(), 8);
    assert_eq!(TagType::Ifd8.size(), 8);
    assert_eq!(TagType::from_name("srational"), Some(TagType::SRational));
    assert!(TagType::Long8.is_big_only());
    assert!(TagType::Any.matches(TagType::Short));
    assert!(!TagType::Long.matches(TagType::Short));
}

#[test]
fn test_field_count_expected() {
    assert_eq!(FieldCount::Fixed(2).expected(3), Some(2));
    assert_eq!(FieldCount::PerSample.expected(3), Some(3));
    assert_eq!(FieldCount::Variable.expected(3), None);
    assert!(FieldCount::Variable32.is_variable());
}

#[test]
fn test_field_set() {
    let mut set = FieldSet::new();
    assert!(set.is_empty());
    set.set(Field::SubIfd);
    set.set(Field::ImageDimensions);
    assert!(set.contains(Field::SubIfd));
    assert!(!set.contains(Field::ColorMap));
    assert_eq!(set.iter().collect::<Vec<_>>(), vec![Field::ImageDimensions, Field::SubIfd]);
    assert_eq!(set.bits(), (1u128 << 1) | (1u128 << 49));

    set.clear(Field::SubIfd);
    assert_eq!(set.iter().count(), 1);
}

#[test]
fn test_value_getters() {
    assert_eq!(TagValue::Short(7).as_u32(), Some(7));
    assert_eq!(TagValue::Longs(vec![9]).as_u16(), Some(9));
    assert_eq!(TagValue::Longs(vec![1, 2]).as_u16(), None);
    assert_eq!(TagValue::Double(0.5).as_f32(), Some(0.5));
    assert_eq!(TagValue::Shorts(vec![1, 2]).to_u64_vec(), Some(vec![1, 2]));
    assert_eq!(TagValue::Floats(vec![1.5]).to_u16_vec(), None);
    assert_eq!(TagValue::Bytes(b"abc\0".to_vec()).as_text().as_deref(), Some("abc"));
    assert_eq!(TagValue::Text("abc".to_string()).count(), 4);
}

#[test]
fn test_value_convert() {
    assert_eq!(TagValue::Long(3).convert(TagType::Short), Some(TagValue::Short(3)));
    assert_eq!(
        TagValue::Shorts(vec![1, 2]).convert(TagType::Long),
        Some(TagValue::Longs(vec![1, 2]))
    );
    assert_eq!(TagValue::Float(0.25).convert(TagType::Rational), Some(TagValue::Double(0.25)));
    assert_eq!(TagValue::Float(1.0).convert(TagType::Ascii), None);
}

#[test]
fn test_value_codec_byte_orders() {
    let value = TagValue::Shorts(vec![1, 0x0203]);
    let (le, count) = value.encode(TagType::Short, &LittleEndianHandler).unwrap();
    assert_eq!(count, 2);
    assert_eq!(le, vec![1, 0, 3, 2]);
    let (be, _) = value.encode(TagType::Short, &BigEndianHandler).unwrap();
    assert_eq!(be, vec![0, 1, 2, 3]);

    let decoded = TagValue::decode(TagType::Short, 2, &be, &BigEndianHandler).unwrap();
    assert_eq!(decoded, value);
    assert!(TagValue::decode(TagType::Long, 2, &be, &BigEndianHandler).is_err());
}

#[test]
fn test_ascii_encoding_adds_terminator() {
    let (bytes, count) = TagValue::Text("hi".to_string())
        .encode(TagType::Ascii, &LittleEndianHandler)
        .unwrap();
    assert_eq!(bytes, b"hi\0".to_vec());
    assert_eq!(count, 3);
}

#[test]
fn test_rationals() {
    assert_eq!(double_to_rational(-1.0), (0, 1));
    let (num, den) = double_to_rational(72.0);
    assert_eq!(num as f64 / den as f64, 72.0);

    let (bytes, count) = TagValue::Double(0.5).encode(TagType::Rational, &LittleEndianHandler).unwrap();
    assert_eq!(count, 1);
    let decoded = TagValue::decode(TagType::Rational, 1, &bytes, &LittleEndianHandler).unwrap();
    assert_eq!(decoded, TagValue::Double(0.5));
}
