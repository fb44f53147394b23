//! Integration tests for tiffkit sessions

use std::fs::{File, OpenOptions};
use std::io::Cursor;
use std::sync::Arc;

use tiffkit::compression::{Codec, CodecRegistry, CompressionConverter};
use tiffkit::tiff::errors::{ErrorKind, TiffError, TiffResult};
use tiffkit::tiff::{compression, photometric, tags, ByteOrder, CodecPolicy, TagCatalog, TagValue, TiffFile, TiffOptions};
use tiffkit::utils::logger::CollectingSink;

const PRIVATE_SCHEME: u16 = 34000;

/// Stores every byte inverted
struct InvertCodec {
    scheme: u16,
    decoded: Vec<u8>,
    pos: usize,
}

fn invert_codec(scheme: u16) -> Box<dyn Codec> {
    Box::new(InvertCodec { scheme, decoded: Vec::new(), pos: 0 })
}

impl Codec for InvertCodec {
    fn scheme(&self) -> u16 {
        self.scheme
    }

    fn name(&self) -> &str {
        "Invert"
    }

    fn pre_decode(&mut self, raw: Vec<u8>, _sample: u16) -> TiffResult<()> {
        self.decoded = raw.into_iter().map(|b| !b).collect();
        self.pos = 0;
        Ok(())
    }

    fn decode_row(&mut self, out: &mut [u8], _sample: u16) -> TiffResult<()> {
        let end = self.pos + out.len();
        let src = self
            .decoded
            .get(self.pos..end)
            .ok_or_else(|| TiffError::CodecError("Invert: not enough data".to_string()))?;
        out.copy_from_slice(src);
        self.pos = end;
        Ok(())
    }

    fn encode_row(&mut self, data: &[u8], out: &mut Vec<u8>, _sample: u16) -> TiffResult<()> {
        out.extend(data.iter().map(|b| !b));
        Ok(())
    }
}

fn write_gray(options: TiffOptions, scheme: u16, pages: &[u8]) -> Vec<u8> {
    let mut file = TiffFile::create(Cursor::new(Vec::new()), options).unwrap();
    for &fill in pages {
        file.set_field(tags::COMPRESSION, TagValue::Short(scheme)).unwrap();
        file.set_field(tags::IMAGE_WIDTH, TagValue::Long(8)).unwrap();
        file.set_field(tags::IMAGE_LENGTH, TagValue::Long(8)).unwrap();
        file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(8)).unwrap();
        file.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(photometric::BLACK_IS_ZERO)).unwrap();
        file.set_field(tags::ROWS_PER_STRIP, TagValue::Long(4)).unwrap();
        let pixels: Vec<u8> = (0..64u8).map(|i| i.wrapping_add(fill)).collect();
        file.write_encoded_strip(0, &pixels[..32]).unwrap();
        file.write_encoded_strip(1, &pixels[32..]).unwrap();
        file.write_directory().unwrap();
    }
    file.close().unwrap().into_inner()
}

fn read_pixels<S: tiffkit::io::TiffStream>(file: &mut TiffFile<S>) -> Vec<u8> {
    let mut pixels = file.read_strip(0).unwrap();
    pixels.extend(file.read_strip(1).unwrap());
    pixels
}

#[test]
fn test_multi_page_round_trip() {
    for big in [false, true] {
        let options = TiffOptions::new().byte_order(ByteOrder::BigEndian).big_tiff(big);
        let bytes = write_gray(options, compression::LZW, &[0, 100, 200]);

        let mut file = TiffFile::open(Cursor::new(bytes), TiffOptions::new()).unwrap();
        assert_eq!(file.number_of_directories().unwrap(), 3);
        let mut page = 0u8;
        loop {
            let expected: Vec<u8> = (0..64u8).map(|i| i.wrapping_add(page * 100)).collect();
            assert_eq!(read_pixels(&mut file), expected);
            page += 1;
            if !file.read_directory().unwrap() {
                break;
            }
        }
        assert_eq!(page, 3);
        assert!(file.last_directory());
    }
}

#[test]
fn test_looping_chain_is_detected() {
    let bytes = write_gray(TiffOptions::new().byte_order(ByteOrder::LittleEndian), compression::NONE, &[0, 1]);

    // point the second directory back at the first
    let mut file = TiffFile::open(Cursor::new(bytes), TiffOptions::new()).unwrap();
    let first = file.current_dir_offset() as u32;
    file.set_directory(1).unwrap();
    let second = file.current_dir_offset() as usize;
    let mut bytes = file.into_inner().into_inner();
    let entries = u16::from_le_bytes([bytes[second], bytes[second + 1]]) as usize;
    let link = second + 2 + entries * 12;
    bytes[link..link + 4].copy_from_slice(&first.to_le_bytes());

    let sink = Arc::new(CollectingSink::new());
    let mut file = TiffFile::open(Cursor::new(bytes), TiffOptions::new().sink(sink.clone())).unwrap();
    assert_eq!(file.number_of_directories().unwrap(), 2);
    assert!(sink.has_warning("loops back"));

    assert!(file.read_directory().unwrap());
    match file.read_directory() {
        Err(TiffError::DirectoryLoop { offset, .. }) => assert_eq!(offset, u64::from(first)),
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_registered_codec() {
    let registry = Arc::new(CodecRegistry::new());
    registry
        .register(PRIVATE_SCHEME, "Invert", || invert_codec(PRIVATE_SCHEME))
        .unwrap();
    assert!(registry.is_configured(PRIVATE_SCHEME));
    assert_eq!(registry.configured()[0].name, "Invert");

    let options = TiffOptions::new().registry(registry.clone());
    let bytes = write_gray(options.clone(), PRIVATE_SCHEME, &[0]);

    let mut file = TiffFile::open(Cursor::new(bytes.clone()), options).unwrap();
    assert_eq!(file.codec().name(), "Invert");
    let raw = file.read_raw_strip(0).unwrap();
    assert_eq!(raw[0], !0u8);
    assert_eq!(read_pixels(&mut file), (0..64u8).collect::<Vec<_>>());

    assert!(registry.unregister(PRIVATE_SCHEME).unwrap());
    assert!(!registry.unregister(PRIVATE_SCHEME).unwrap());

    let strict = TiffOptions::new().registry(registry.clone());
    let err = TiffFile::open(Cursor::new(bytes.clone()), strict).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Codec);

    let sink = Arc::new(CollectingSink::new());
    let lenient = TiffOptions::new()
        .registry(registry)
        .codec_policy(CodecPolicy::Lenient)
        .sink(sink.clone());
    let mut file = TiffFile::open(Cursor::new(bytes), lenient).unwrap();
    assert!(!sink.warnings().is_empty());
    assert_eq!(file.read_raw_strip(0).unwrap().len(), 32);
    assert_eq!(file.read_strip(0).unwrap_err().kind(), ErrorKind::Codec);
}

#[test]
fn test_registered_codec_shadows_builtin() {
    let registry = Arc::new(CodecRegistry::new());
    registry
        .register(compression::PACKBITS, "Invert", || invert_codec(compression::PACKBITS))
        .unwrap();
    assert_eq!(registry.find(compression::PACKBITS).unwrap().name, "Invert");

    let options = TiffOptions::new().registry(registry.clone());
    let bytes = write_gray(options, compression::PACKBITS, &[0]);

    let mut file = TiffFile::open(Cursor::new(bytes.clone()), TiffOptions::new()).unwrap();
    assert_eq!(file.read_raw_strip(0).unwrap()[..4], [!0u8, !1, !2, !3]);

    registry.unregister(compression::PACKBITS).unwrap();
    assert_eq!(registry.find(compression::PACKBITS).unwrap().name, "PackBits");
    assert_eq!(file.codec().name(), "PackBits");
}

#[test]
fn test_geotiff_fields() {
    let geo = TagCatalog::geotiff_fields();
    let mut file = TiffFile::create(Cursor::new(Vec::new()), TiffOptions::new().extra_fields(geo.clone())).unwrap();
    file.set_field(tags::IMAGE_WIDTH, TagValue::Long(1)).unwrap();
    file.set_field(tags::IMAGE_LENGTH, TagValue::Long(1)).unwrap();
    file.set_field(33550, TagValue::Doubles(vec![0.5, 0.5, 0.0])).unwrap();
    file.write_encoded_strip(0, &[0]).unwrap();
    let bytes = file.close().unwrap().into_inner();

    let file = TiffFile::open(Cursor::new(bytes), TiffOptions::new().extra_fields(geo)).unwrap();
    assert_eq!(file.get_field(33550), Some(TagValue::Doubles(vec![0.5, 0.5, 0.0])));
    assert_eq!(file.catalog().find_by_name("ModelPixelScaleTag", tiffkit::tiff::TagType::Any).unwrap().tag, 33550);
}

#[test]
fn test_file_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.tif");
    let output = dir.path().join("output.tif");

    let target = OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&input).unwrap();
    let mut file = TiffFile::create(target, TiffOptions::new().name("input.tif")).unwrap();
    file.set_field(tags::IMAGE_WIDTH, TagValue::Long(32)).unwrap();
    file.set_field(tags::IMAGE_LENGTH, TagValue::Long(2)).unwrap();
    file.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(8)).unwrap();
    file.set_field(tags::IMAGE_DESCRIPTION, TagValue::Text("conversion".to_string())).unwrap();
    let pixels: Vec<u8> = (0..64u8).map(|i| i % 5).collect();
    file.write_encoded_strip(0, &pixels).unwrap();
    file.close().unwrap();

    let converter = CompressionConverter::new(TiffOptions::new());
    let count = converter
        .convert_file(&input, TiffOptions::new(), &output, compression::ZSTD)
        .unwrap();
    assert_eq!(count, 1);

    let mut file = TiffFile::open(File::open(&output).unwrap(), TiffOptions::new().name("output.tif")).unwrap();
    assert_eq!(file.directory().compression, compression::ZSTD);
    assert_eq!(file.get_field(tags::IMAGE_DESCRIPTION), Some(TagValue::Text("conversion".to_string())));
    assert_eq!(file.read_strip(0).unwrap(), pixels);
}
