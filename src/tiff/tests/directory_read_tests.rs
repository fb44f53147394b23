//! Reading directories from hand-built files

use byteorder::{LittleEndian, WriteBytesExt};

use super::test_utils::*;
use crate::tiff::constants::{compression, exif_tags, extra_samples, field_types, photometric, tags};
use crate::tiff::errors::{ErrorKind, TiffError};
use crate::tiff::options::CodecPolicy;
use crate::tiff::types::{Field, TagType};
use crate::tiff::value::TagValue;

fn pixels(n: usize) -> Vec<u8> {
    (0..n).map(|i| i as u8).collect()
}

fn build(pixels: &[u8], entries: Vec<RawTag>) -> Vec<u8> {
    entries.into_iter().fold(ClassicTiff::new(pixels), ClassicTiff::tag).build()
}

#[test]
fn test_read_gray_single_strip() {
    let data = pixels(16);
    let (file, sink) = open_bytes(gray8(4, 4, &data).build());
    let mut file = file.unwrap();

    let dir = file.directory();
    assert_eq!(dir.image_width, 4);
    assert_eq!(dir.image_length, 4);
    assert_eq!(dir.bits_per_sample, 8);
    assert_eq!(dir.nstrips, 1);
    assert_eq!(dir.scanline_size().unwrap(), 4);
    assert_eq!(dir.strip_size().unwrap(), 16);
    assert_eq!(dir.strip_offsets, vec![8]);
    assert_eq!(file.current_directory(), Some(0));
    assert!(file.last_directory());
    assert!(sink.warnings().is_empty());

    assert_eq!(file.read_strip(0).unwrap(), data);
    let mut row = [0u8; 4];
    file.read_scanline(&mut row, 2, 0).unwrap();
    assert_eq!(row, [8, 9, 10, 11]);
    assert!(!file.read_directory().unwrap());
}

#[test]
fn test_compression_per_sample_values() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries[3] = shorts(tags::COMPRESSION, &[5, 5, 5]);
    let (file, _) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert_eq!(file.directory().compression, compression::LZW);
    assert!(file.directory().is_set(Field::Compression));
    assert_eq!(file.codec().scheme(), compression::LZW);
}

#[test]
fn test_compression_values_must_agree() {
    let mut entries = gray_tags(4, 4, 8, 48, 1);
    entries[3] = shorts(tags::COMPRESSION, &[5, 8, 5]);
    entries.push(short(tags::SAMPLES_PER_PIXEL, 3));
    let (file, _) = open_bytes(build(&pixels(48), entries));
    let err = file.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Field);
}

#[test]
fn test_missing_compression_means_none() {
    let entries: Vec<RawTag> = gray_tags(4, 4, 8, 16, 1)
        .into_iter()
        .filter(|e| e.tag != tags::COMPRESSION)
        .collect();
    let (file, _) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert_eq!(file.directory().compression, compression::NONE);
    assert!(!file.directory().is_set(Field::Compression));
    assert_eq!(file.get_field(tags::COMPRESSION), None);
    assert_eq!(file.get_field_defaulted(tags::PREDICTOR), Some(TagValue::Short(1)));
}

#[test]
fn test_missing_strip_byte_counts_estimated() {
    let entries: Vec<RawTag> = gray_tags(4, 4, 8, 16, 1)
        .into_iter()
        .filter(|e| e.tag != tags::STRIP_BYTE_COUNTS)
        .collect();
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let mut file = file.unwrap();
    assert!(sink.has_warning("missing required \"StripByteCounts\" field, calculating from imagelength"));
    assert_eq!(file.directory().strip_byte_counts, vec![16]);
    assert_eq!(file.read_strip(0).unwrap(), pixels(16));
}

#[test]
fn test_missing_strip_offsets_is_fatal() {
    let entries: Vec<RawTag> = gray_tags(4, 4, 8, 16, 1)
        .into_iter()
        .filter(|e| e.tag != tags::STRIP_OFFSETS)
        .collect();
    let (file, _) = open_bytes(build(&pixels(16), entries));
    assert!(matches!(file, Err(TiffError::MissingRequired(ref name)) if name == "StripOffsets"));
}

#[test]
fn test_missing_image_length_is_fatal() {
    let entries: Vec<RawTag> = gray_tags(4, 4, 8, 16, 1)
        .into_iter()
        .filter(|e| e.tag != tags::IMAGE_LENGTH && e.tag != tags::IMAGE_WIDTH)
        .collect();
    let (file, _) = open_bytes(build(&pixels(16), entries));
    assert!(matches!(file, Err(TiffError::MissingRequired(ref name)) if name == "ImageLength"));
}

#[test]
fn test_unsorted_and_duplicate_tags() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries.swap(0, 1);
    entries.push(long(tags::IMAGE_WIDTH, 9));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert!(sink.has_warning("tags are not sorted in ascending order"));
    assert!(sink.has_warning("Duplicate field tag 256 in directory; later entry ignored"));
    assert_eq!(file.directory().image_width, 4);
}

#[test]
fn test_unknown_tag_becomes_anonymous_field() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries.push(short(65000, 7));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert!(sink.has_warning("Unknown field with tag 65000 (0xfde8) encountered"));
    assert_eq!(file.get_field(65000), Some(TagValue::Short(7)));
    let info = file.catalog().find(65000, TagType::Any).unwrap();
    assert!(info.is_anonymous());
}

#[test]
fn test_ascii_field_and_wrong_type() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries.push(ascii(tags::IMAGE_DESCRIPTION, "a small test image"));
    entries.push(short(tags::SOFTWARE, 3));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert_eq!(
        file.get_field(tags::IMAGE_DESCRIPTION).and_then(|v| v.as_text()).as_deref(),
        Some("a small test image")
    );
    assert!(sink.has_warning("Wrong data type SHORT for \"Software\"; tag ignored"));
    assert_eq!(file.get_field(tags::SOFTWARE), None);
}

#[test]
fn test_unterminated_ascii_warns() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries.push(raw(tags::IMAGE_DESCRIPTION, field_types::ASCII, 6, b"abcdef".to_vec()));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();
    assert!(sink.has_warning("does not end in null byte"));
    assert_eq!(file.get_field(tags::IMAGE_DESCRIPTION), Some(TagValue::Text("abcdef".to_string())));
}

#[test]
fn test_self_referencing_chain_stops() {
    let builder = gray8(4, 4, &pixels(16));
    let own = builder.ifd_offset();
    let (file, sink) = open_bytes(builder.next_link(own).build());
    let mut file = file.unwrap();

    assert!(matches!(file.read_directory(), Err(TiffError::DirectoryLoop { .. })));
    assert_eq!(file.number_of_directories().unwrap(), 1);
    assert!(sink.has_warning("loops back"));
}

#[test]
fn test_bad_headers() {
    let (file, _) = open_bytes(b"XX*\0\x08\0\0\0".to_vec());
    assert!(matches!(file, Err(TiffError::InvalidByteOrder(_))));

    let (file, _) = open_bytes(b"II\x29\0\x08\0\0\0".to_vec());
    assert!(matches!(file, Err(TiffError::UnsupportedVersion(41))));

    let (file, _) = open_bytes(b"II".to_vec());
    assert!(matches!(file, Err(TiffError::InvalidHeader(_))));

    let (file, _) = open_bytes(b"II*\0\xe8\x03\0\0".to_vec());
    assert_eq!(file.err().unwrap().kind(), ErrorKind::Format);

    let (file, _) = open_bytes(b"II*\0\0\0\0\0".to_vec());
    assert!(matches!(file, Err(TiffError::FormatError(_))));
}

#[test]
fn test_directory_count_sanity_check() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"II");
    bytes.write_u16::<LittleEndian>(42).unwrap();
    bytes.write_u32::<LittleEndian>(8).unwrap();
    bytes.write_u16::<LittleEndian>(5000).unwrap();
    bytes.resize(64, 0);

    let (file, _) = open_bytes(bytes);
    match file {
        Err(TiffError::FormatError(message)) => assert!(message.contains("Sanity check on directory count failed")),
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn test_unconfigured_codec_policies() {
    let bytes = build(&pixels(16), gray_tags(4, 4, 8, 16, compression::JPEG));

    let (file, _) = open_bytes(bytes.clone());
    assert!(matches!(file, Err(TiffError::CodecNotConfigured { scheme: 7, .. })));

    let (options, sink) = collecting_options();
    let options = options.codec_policy(CodecPolicy::Lenient);
    let mut file = crate::tiff::file::TiffFile::open(std::io::Cursor::new(bytes), options).unwrap();
    assert!(sink.has_warning("compression support is not configured"));
    assert_eq!(file.directory().compression, compression::JPEG);
    assert!(matches!(file.read_strip(0), Err(TiffError::CodecNotConfigured { .. })));
    assert_eq!(file.read_raw_strip(0).unwrap(), pixels(16));
}

fn palette_tags(bits: u16, byte_count: u32) -> Vec<RawTag> {
    vec![
        long(tags::IMAGE_WIDTH, 4),
        long(tags::IMAGE_LENGTH, 4),
        short(tags::BITS_PER_SAMPLE, bits),
        short(tags::PHOTOMETRIC_INTERPRETATION, photometric::PALETTE),
        long(tags::STRIP_OFFSETS, 8),
        long(tags::ROWS_PER_STRIP, 4),
        long(tags::STRIP_BYTE_COUNTS, byte_count),
    ]
}

#[test]
fn test_palette_without_colormap() {
    let (file, _) = open_bytes(build(&pixels(8), palette_tags(4, 8)));
    assert!(matches!(file, Err(TiffError::MissingRequired(ref name)) if name == "Colormap"));

    let (file, _) = open_bytes(build(&pixels(16), palette_tags(8, 16)));
    assert_eq!(file.unwrap().directory().photometric, photometric::BLACK_IS_ZERO);
}

#[test]
fn test_palette_with_colormap() {
    let mut entries = palette_tags(2, 4);
    let map: Vec<u16> = (0..12).map(|i| i * 1000).collect();
    entries.push(shorts(tags::COLOR_MAP, &map));
    let (file, _) = open_bytes(build(&pixels(4), entries));
    let file = file.unwrap();
    let dir = file.directory();
    assert_eq!(dir.photometric, photometric::PALETTE);
    assert_eq!(dir.colormap[0], vec![0, 1000, 2000, 3000]);
    assert_eq!(dir.colormap[2], vec![8000, 9000, 10000, 11000]);
}

#[test]
fn test_extra_samples_fixups() {
    let mut entries = gray_tags(4, 4, 8, 32, 1);
    entries[2] = shorts(tags::BITS_PER_SAMPLE, &[8, 8]);
    entries.push(short(tags::SAMPLES_PER_PIXEL, 2));
    entries.push(short(tags::PLANAR_CONFIGURATION, 1));
    entries.push(short(tags::EXTRA_SAMPLES, extra_samples::COREL_UNASSOCIATED_ALPHA));
    let (file, _) = open_bytes(build(&pixels(32), entries));
    assert_eq!(file.unwrap().directory().extra_samples, vec![extra_samples::UNASSOCIATED_ALPHA]);

    let mut entries = gray_tags(4, 4, 8, 48, 1);
    entries[2] = shorts(tags::BITS_PER_SAMPLE, &[8, 8, 8]);
    entries.push(short(tags::SAMPLES_PER_PIXEL, 3));
    entries.push(short(tags::PLANAR_CONFIGURATION, 1));
    let (file, sink) = open_bytes(build(&pixels(48), entries));
    let file = file.unwrap();
    assert!(sink.has_warning("Defining non-color channels as ExtraSamples"));
    assert_eq!(file.directory().extra_samples, vec![extra_samples::UNSPECIFIED; 2]);
}

#[test]
fn test_different_bits_per_sample_is_fatal() {
    let mut entries = gray_tags(4, 4, 8, 48, 1);
    entries[2] = shorts(tags::BITS_PER_SAMPLE, &[8, 16, 8]);
    entries.push(short(tags::SAMPLES_PER_PIXEL, 3));
    let (file, _) = open_bytes(build(&pixels(48), entries));
    assert_eq!(file.err().unwrap().kind(), ErrorKind::Field);
}

#[test]
fn test_old_jpeg_fixups() {
    let entries = vec![
        long(tags::IMAGE_WIDTH, 4),
        long(tags::IMAGE_LENGTH, 4),
        short(tags::COMPRESSION, compression::JPEG_OLD),
        long(tags::STRIP_OFFSETS, 8),
        long(tags::ROWS_PER_STRIP, 4),
        long(tags::STRIP_BYTE_COUNTS, 24),
    ];
    let (options, sink) = collecting_options();
    let options = options.codec_policy(CodecPolicy::Lenient);
    let file = crate::tiff::file::TiffFile::open(std::io::Cursor::new(build(&pixels(24), entries)), options).unwrap();

    let dir = file.directory();
    assert!(sink.has_warning("Photometric tag is missing, assuming data is YCbCr"));
    assert!(sink.has_warning("BitsPerSample tag is missing, assuming 8 bits per sample"));
    assert_eq!(dir.photometric, photometric::YCBCR);
    assert_eq!(dir.bits_per_sample, 8);
    assert_eq!(dir.samples_per_pixel, 3);
}

#[test]
fn test_strip_array_padding() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries[6] = long(tags::ROWS_PER_STRIP, 1);
    entries[7] = longs(tags::STRIP_BYTE_COUNTS, &[4, 4]);
    entries[5] = longs(tags::STRIP_OFFSETS, &[8, 12, 16, 20, 24]);
    let (file, sink) = open_bytes(build(&pixels(20), entries));
    let dir_offsets = file.unwrap().directory().strip_offsets.clone();
    assert_eq!(dir_offsets, vec![8, 12, 16, 20]);
    assert!(sink.has_warning("Incorrect count for \"StripOffsets\"; tag trimmed"));
    assert!(sink.has_warning("padding with zeros"));
}

#[test]
fn test_exif_private_directory() {
    // EXIF directory stored ahead of the image data
    let mut exif = Vec::new();
    exif.write_u16::<LittleEndian>(1).unwrap();
    exif.write_u16::<LittleEndian>(exif_tags::EXIF_VERSION).unwrap();
    exif.write_u16::<LittleEndian>(field_types::UNDEFINED).unwrap();
    exif.write_u32::<LittleEndian>(4).unwrap();
    exif.extend_from_slice(b"0230");
    exif.write_u32::<LittleEndian>(0).unwrap();
    let exif_len = exif.len() as u32;

    let image = pixels(16);
    let mut data = exif;
    data.extend_from_slice(&image);
    let mut entries = gray_tags(4, 4, 8 + exif_len, 16, 1);
    entries.push(long(tags::EXIF_IFD, 8));
    let (file, _) = open_bytes(build(&data, entries));
    let mut file = file.unwrap();

    let offset = file.get_field(tags::EXIF_IFD).and_then(|v| v.as_u64()).unwrap();
    assert_eq!(offset, 8);
    let exif_dir = file.read_exif_directory(offset).unwrap();
    assert_eq!(
        exif_dir.get_field(exif_tags::EXIF_VERSION),
        Some(TagValue::Bytes(b"0230".to_vec()))
    );
    // the image directory is untouched
    assert_eq!(file.read_strip(0).unwrap(), image);
}

#[test]
fn test_numeric_wrong_type_is_ignored() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries[4] = long(tags::PHOTOMETRIC_INTERPRETATION, 1);
    entries.push(short(tags::X_RESOLUTION, 72));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();

    assert!(sink.has_warning("Wrong data type LONG for \"PhotometricInterpretation\"; tag ignored"));
    assert!(sink.has_warning("Wrong data type SHORT for \"XResolution\"; tag ignored"));
    assert!(!file.directory().is_set(Field::Photometric));
    assert_eq!(file.get_field(tags::PHOTOMETRIC_INTERPRETATION), None);
    assert_eq!(file.get_field(tags::X_RESOLUTION), None);
    // neither tag is turned into an anonymous field
    assert!(!sink.has_warning("Unknown field with tag"));
}

#[test]
fn test_listed_alternate_types_are_accepted() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries[2] = long(tags::BITS_PER_SAMPLE, 8);
    entries.push(long(tags::SAMPLES_PER_PIXEL, 1));
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let file = file.unwrap();

    assert!(!sink.has_warning("Wrong data type"));
    assert_eq!(file.directory().bits_per_sample, 8);
    assert_eq!(file.directory().samples_per_pixel, 1);
    assert!(file.directory().is_set(Field::BitsPerSample));
}

#[test]
fn test_rereading_directory_gives_same_result() {
    let mut entries = gray_tags(4, 4, 8, 16, 1);
    entries.push(ascii(tags::IMAGE_DESCRIPTION, "twice"));
    entries.push(short(65000, 7));
    let (file, _) = open_bytes(build(&pixels(16), entries));
    let mut file = file.unwrap();

    file.set_directory(0).unwrap();
    let first = file.directory().clone();
    file.set_directory(0).unwrap();
    assert_eq!(file.directory(), &first);
    assert_eq!(file.get_field(65000), Some(TagValue::Short(7)));
}

#[test]
fn test_nonstandard_tile_size_read_with_warning() {
    let entries = vec![
        long(tags::IMAGE_WIDTH, 20),
        long(tags::IMAGE_LENGTH, 16),
        short(tags::BITS_PER_SAMPLE, 8),
        short(tags::COMPRESSION, compression::NONE),
        short(tags::PHOTOMETRIC_INTERPRETATION, photometric::BLACK_IS_ZERO),
        short(tags::TILE_WIDTH, 20),
        short(tags::TILE_LENGTH, 16),
        long(tags::TILE_OFFSETS, 8),
        long(tags::TILE_BYTE_COUNTS, 320),
    ];
    let (file, sink) = open_bytes(build(&pixels(320), entries));
    let file = file.unwrap();

    assert!(sink.has_warning("Nonstandard tile width 20, convert file"));
    assert!(file.is_tiled());
    assert_eq!(file.directory().tile_width, 20);
    assert_eq!(file.directory().tile_length, 16);
}

#[test]
fn test_strip_offset_past_end_of_file_is_bogus() {
    let entries = gray_tags(4, 4, 5000, 16, 1);
    let (file, sink) = open_bytes(build(&pixels(16), entries));
    let mut file = file.unwrap();

    assert!(sink.has_warning("Bogus \"StripByteCounts\" field, ignoring and calculating from imagelength"));
    assert_eq!(file.directory().strip_byte_counts, vec![16]);
    assert!(file.read_raw_strip(0).is_err());
}

#[test]
fn test_different_max_sample_values_is_fatal() {
    let mut entries = gray_tags(4, 4, 8, 48, 1);
    entries[2] = shorts(tags::BITS_PER_SAMPLE, &[8, 8, 8]);
    entries.push(short(tags::SAMPLES_PER_PIXEL, 3));
    entries.push(shorts(tags::MAX_SAMPLE_VALUE, &[255, 100, 255]));
    let (file, _) = open_bytes(build(&pixels(48), entries));
    assert_eq!(file.err().unwrap().kind(), ErrorKind::Field);
}
