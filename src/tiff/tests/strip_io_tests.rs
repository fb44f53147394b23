//! Strip, tile and scanline reading and writing

use super::test_utils::*;
use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{compression, fill_order, photometric, planar_config, predictor, tags};
use crate::tiff::errors::{ErrorKind, TiffError};
use crate::tiff::options::TiffOptions;
use crate::tiff::value::TagValue;

fn gray_layout(file: &mut MemFile, width: u32, length: u32, rows_per_strip: u32) {
    file.set_field(tags::IMAGE_WIDTH, TagValue::Long(width)).unwrap();
    file.set_field(tags::IMAGE_LENGTH, TagValue::Long(length)).unwrap();
    file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(8)).unwrap();
    file.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(photometric::BLACK_IS_ZERO)).unwrap();
    file.set_field(tags::ROWS_PER_STRIP, TagValue::Long(rows_per_strip)).unwrap();
}

fn gradient(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i / 3) as u8).collect()
}

#[test]
fn test_codec_round_trips() {
    for scheme in [
        compression::NONE,
        compression::LZW,
        compression::DEFLATE,
        compression::DEFLATE_OLD,
        compression::PACKBITS,
        compression::ZSTD,
    ] {
        let mut file = new_file(TiffOptions::new());
        file.set_field(tags::COMPRESSION, TagValue::Short(scheme)).unwrap();
        gray_layout(&mut file, 16, 8, 4);
        let pixels = gradient(128);
        file.write_encoded_strip(0, &pixels[..64]).unwrap();
        file.write_encoded_strip(1, &pixels[64..]).unwrap();

        let mut back = reopen(file.close().unwrap());
        assert_eq!(back.codec().scheme(), scheme);
        let mut decoded = back.read_strip(0).unwrap();
        decoded.extend(back.read_strip(1).unwrap());
        assert_eq!(decoded, pixels, "scheme {}", scheme);
    }
}

#[test]
fn test_horizontal_predictor() {
    for scheme in [compression::LZW, compression::DEFLATE, compression::ZSTD] {
        let mut file = new_file(TiffOptions::new());
        file.set_field(tags::COMPRESSION, TagValue::Short(scheme)).unwrap();
        file.set_field(tags::PREDICTOR, TagValue::Short(predictor::HORIZONTAL_DIFFERENCING)).unwrap();
        gray_layout(&mut file, 8, 4, 4);
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(16)).unwrap();
        let samples: Vec<u8> = (0..32u16).flat_map(|v| (1000 + v * 3).to_ne_bytes()).collect();
        file.write_encoded_strip(0, &samples).unwrap();

        let mut back = reopen(file.close().unwrap());
        assert_eq!(back.get_field(tags::PREDICTOR), Some(TagValue::Short(predictor::HORIZONTAL_DIFFERENCING)));
        assert_eq!(back.read_strip(0).unwrap(), samples, "scheme {}", scheme);
    }
}

#[test]
fn test_floating_point_predictor_refused() {
    let mut file = new_file(TiffOptions::new());
    file.set_field(tags::COMPRESSION, TagValue::Short(compression::DEFLATE)).unwrap();
    file.set_field(tags::PREDICTOR, TagValue::Short(predictor::FLOATING_POINT)).unwrap();
    gray_layout(&mut file, 4, 1, 1);
    let err = file.write_encoded_strip(0, &[0; 4]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Codec);
}

#[test]
fn test_unconfigured_codec_cannot_encode() {
    let mut file = new_file(TiffOptions::new());
    file.set_field(tags::COMPRESSION, TagValue::Short(compression::JPEG)).unwrap();
    gray_layout(&mut file, 4, 1, 1);
    match file.write_encoded_strip(0, &[0; 4]) {
        Err(TiffError::CodecNotConfigured { scheme, name }) => {
            assert_eq!(scheme, compression::JPEG);
            assert_eq!(name, "JPEG");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_scanlines_sequential() {
    let mut file = new_file(TiffOptions::new());
    file.set_field(tags::COMPRESSION, TagValue::Short(compression::LZW)).unwrap();
    gray_layout(&mut file, 4, 4, 2);
    for row in 0..4u32 {
        file.write_scanline(&[row as u8; 4], row, 0).unwrap();
    }
    let mut back = reopen(file.close().unwrap());
    assert_eq!(back.directory().nstrips, 2);

    let mut buf = [0u8; 4];
    back.read_scanline(&mut buf, 3, 0).unwrap();
    assert_eq!(buf, [3; 4]);
    // backwards restarts the strip
    back.read_scanline(&mut buf, 0, 0).unwrap();
    assert_eq!(buf, [0; 4]);
    // forwards skips within it
    back.read_scanline(&mut buf, 1, 0).unwrap();
    assert_eq!(buf, [1; 4]);

    assert_eq!(back.read_scanline(&mut buf, 4, 0).unwrap_err().kind(), ErrorKind::Geometry);
    let mut short = [0u8; 2];
    assert_eq!(back.read_scanline(&mut short, 0, 0).unwrap_err().kind(), ErrorKind::Usage);
}

#[test]
fn test_scanline_out_of_order() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 4, 4, 4);
    file.write_scanline(&[0; 4], 0, 0).unwrap();
    match file.write_scanline(&[0; 4], 0, 0) {
        Err(TiffError::UsageError(message)) => assert_eq!(message, "Scanline 0 out of order, expected 1"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_scanline_grows_image() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 2, 1);
    for row in 0..3u32 {
        file.write_scanline(&[row as u8 + 1; 2], row, 0).unwrap();
    }
    assert_eq!(file.directory().image_length, 3);
    assert_eq!(file.directory().nstrips, 3);

    let mut back = reopen(file.close().unwrap());
    assert_eq!(back.directory().image_length, 3);
    assert_eq!(back.read_strip(2).unwrap(), vec![3, 3]);
}

#[test]
fn test_scanline_at_last_row_index_overflows() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 2, 1);
    match file.write_scanline(&[1, 1], u32::MAX, 0) {
        Err(TiffError::Overflow(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(file.directory().image_length, 2);
}

#[test]
fn test_raw_strip_grows_strip_arrays() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 2, 1);
    file.write_raw_strip(0, &[1, 1]).unwrap();
    file.write_raw_strip(3, &[4, 4]).unwrap();
    assert_eq!(file.directory().nstrips, 4);
    assert_eq!(file.directory().strip_byte_counts, vec![2, 0, 0, 2]);
}

#[test]
fn test_rewritten_strip_reuses_space() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 4, 1, 1);
    file.write_raw_strip(0, &[1; 4]).unwrap();
    let first = file.directory().strip_offsets[0];
    file.write_raw_strip(0, &[2; 4]).unwrap();
    assert_eq!(file.directory().strip_offsets[0], first);

    let mut back = reopen(file.close().unwrap());
    assert_eq!(back.read_raw_strip(0).unwrap(), vec![2; 4]);
}

fn planar_file() -> MemFile {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 2, 2);
    file.set_field(tags::SAMPLES_PER_PIXEL, TagValue::Short(2)).unwrap();
    file.set_field(tags::PLANAR_CONFIGURATION, TagValue::Short(planar_config::PLANAR)).unwrap();
    file
}

#[test]
fn test_planar_strips() {
    let mut file = planar_file();
    file.write_encoded_strip(0, &[1; 4]).unwrap();
    file.write_encoded_strip(1, &[2; 4]).unwrap();
    assert_eq!(file.directory().strips_per_image, 1);

    let mut back = reopen(file.close().unwrap());
    let mut buf = [0u8; 2];
    back.read_scanline(&mut buf, 1, 1).unwrap();
    assert_eq!(buf, [2, 2]);
}

#[test]
fn test_planar_refuses_growth() {
    let mut file = planar_file();
    match file.write_raw_strip(5, &[0]) {
        Err(TiffError::UsageError(message)) => {
            assert_eq!(message, "Can not grow image by strips when using separate planes")
        }
        other => panic!("unexpected result: {:?}", other),
    }
    match file.write_scanline(&[0; 2], 2, 0) {
        Err(TiffError::UsageError(message)) => {
            assert_eq!(message, "Can not change \"ImageLength\" when using separate planes")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_planar_configuration_required() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 2, 2);
    file.set_field(tags::SAMPLES_PER_PIXEL, TagValue::Short(3)).unwrap();
    match file.write_encoded_strip(0, &[0; 12]) {
        Err(TiffError::UsageError(message)) => {
            assert_eq!(message, "Must set \"PlanarConfiguration\" before writing data")
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_dimensions_required() {
    let mut file = new_file(TiffOptions::new());
    let err = file.write_encoded_strip(0, &[0]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
}

#[test]
fn test_tiles() {
    for big in [false, true] {
        let mut file = new_file(TiffOptions::new().big_tiff(big));
        file.set_field(tags::COMPRESSION, TagValue::Short(compression::DEFLATE)).unwrap();
        file.set_field(tags::IMAGE_WIDTH, TagValue::Long(20)).unwrap();
        file.set_field(tags::IMAGE_LENGTH, TagValue::Long(20)).unwrap();
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(8)).unwrap();
        file.set_field(tags::TILE_WIDTH, TagValue::Long(16)).unwrap();
        file.set_field(tags::TILE_LENGTH, TagValue::Long(16)).unwrap();
        assert!(file.is_tiled());
        assert_eq!(file.set_field(tags::TILE_WIDTH, TagValue::Long(20)).unwrap_err().kind(), ErrorKind::Field);

        for (i, (x, y)) in [(0, 0), (16, 0), (0, 16), (16, 16)].into_iter().enumerate() {
            file.write_tile(&[i as u8 + 1; 256], x, y, 0, 0).unwrap();
        }
        assert_eq!(file.directory().nstrips, 4);
        assert!(file.write_encoded_strip(0, &[0; 16]).is_err());

        let mut back = reopen(file.close().unwrap());
        assert!(back.is_tiled());
        assert_eq!(back.read_tile(17, 3, 0, 0).unwrap(), vec![2; 256]);
        assert_eq!(back.read_tile(19, 19, 0, 0).unwrap(), vec![4; 256]);
        assert_eq!(back.read_tile(20, 0, 0, 0).unwrap_err().kind(), ErrorKind::Geometry);
        assert!(!back.read_raw_tile(0).unwrap().is_empty());

        let mut buf = [0u8; 16];
        match back.read_scanline(&mut buf, 0, 0) {
            Err(TiffError::UsageError(message)) => {
                assert_eq!(message, "Can not read scanlines from a tiled image")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

#[test]
fn test_tiles_from_striped_image() {
    let bytes = gray8(4, 4, &[0; 16]).build();
    let (file, _) = open_bytes(bytes);
    let mut file = file.unwrap();
    match file.read_raw_tile(0) {
        Err(TiffError::UsageError(message)) => assert_eq!(message, "Can not read tiles from a striped image"),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(file.read_strip(1).unwrap_err().kind(), ErrorKind::Geometry);
}

#[test]
fn test_truncated_strip() {
    let tiff = ClassicTiff::new(&[0; 16])
        .tag(long(tags::IMAGE_WIDTH, 4))
        .tag(long(tags::IMAGE_LENGTH, 4))
        .tag(short(tags::BITS_PER_SAMPLE, 8))
        .tag(short(tags::PHOTOMETRIC_INTERPRETATION, 1))
        .tag(longs(tags::STRIP_OFFSETS, &[8, 16]))
        .tag(long(tags::ROWS_PER_STRIP, 2))
        .tag(longs(tags::STRIP_BYTE_COUNTS, &[8, 1000]));
    let (file, _) = open_bytes(tiff.build());
    let mut file = file.unwrap();
    assert_eq!(file.read_raw_strip(0).unwrap(), vec![0; 8]);
    let err = file.read_raw_strip(1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_sixteen_bit_samples_in_file_order() {
    let values: Vec<u16> = vec![0x0102, 0x0304, 0xA0B0, 0xFFFE];
    let native: Vec<u8> = values.iter().flat_map(|v| v.to_ne_bytes()).collect();

    for order in [ByteOrder::LittleEndian, ByteOrder::BigEndian] {
        let mut file = new_file(TiffOptions::new().byte_order(order));
        gray_layout(&mut file, 4, 1, 1);
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(16)).unwrap();
        file.write_encoded_strip(0, &native).unwrap();

        let mut back = reopen(file.close().unwrap());
        let stored: Vec<u8> = match order {
            ByteOrder::LittleEndian => values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ByteOrder::BigEndian => values.iter().flat_map(|v| v.to_be_bytes()).collect(),
        };
        assert_eq!(back.read_raw_strip(0).unwrap(), stored);
        assert_eq!(back.read_strip(0).unwrap(), native);
    }
}

#[test]
fn test_lsb_fill_order() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 2, 1, 1);
    file.set_field(tags::FILL_ORDER, TagValue::Short(fill_order::LSB_TO_MSB)).unwrap();
    file.write_encoded_strip(0, &[0x01, 0xC0]).unwrap();

    let mut back = reopen(file.close().unwrap());
    assert_eq!(back.read_raw_strip(0).unwrap(), vec![0x80, 0x03]);
    assert_eq!(back.read_strip(0).unwrap(), vec![0x01, 0xC0]);
}

#[test]
fn test_read_encoded_strip_into_short_buffer() {
    let pixels: Vec<u8> = (0..16).collect();
    let (file, _) = open_bytes(gray8(4, 4, &pixels).build());
    let mut file = file.unwrap();
    let mut buf = [0u8; 6];
    assert_eq!(file.read_encoded_strip(0, &mut buf).unwrap(), 6);
    assert_eq!(buf, [0, 1, 2, 3, 4, 5]);
}

#[test]
fn test_default_sizes() {
    let mut file = new_file(TiffOptions::new());
    gray_layout(&mut file, 16, 4, 4);
    assert_eq!(file.default_strip_size(0).unwrap(), 512);
    assert_eq!(file.default_strip_size(7).unwrap(), 7);
    assert_eq!(file.default_tile_size(0, 20), (256, 32));
}
