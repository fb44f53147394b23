use std::io::Cursor;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::file::TiffFile;
use crate::tiff::options::TiffOptions;
use crate::utils::logger::CollectingSink;

pub type MemFile = TiffFile<Cursor<Vec<u8>>>;

/// One directory entry as it should appear in the file
#[derive(Debug, Clone)]
pub struct RawTag {
    pub tag: u16,
    pub type_code: u16,
    pub count: u32,
    pub data: Vec<u8>,
}

pub fn raw(tag: u16, type_code: u16, count: u32, data: Vec<u8>) -> RawTag {
    RawTag { tag, type_code, count, data }
}

pub fn short(tag: u16, value: u16) -> RawTag {
    shorts(tag, &[value])
}

pub fn shorts(tag: u16, values: &[u16]) -> RawTag {
    let mut data = Vec::new();
    for v in values {
        data.write_u16::<LittleEndian>(*v).unwrap();
    }
    raw(tag, field_types::SHORT, values.len() as u32, data)
}

pub fn long(tag: u16, value: u32) -> RawTag {
    longs(tag, &[value])
}

pub fn longs(tag: u16, values: &[u32]) -> RawTag {
    let mut data = Vec::new();
    for v in values {
        data.write_u32::<LittleEndian>(*v).unwrap();
    }
    raw(tag, field_types::LONG, values.len() as u32, data)
}

pub fn ascii(tag: u16, text: &str) -> RawTag {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    raw(tag, field_types::ASCII, data.len() as u32, data)
}

/// Builds a little-endian classic TIFF holding one directory.
///
/// Pixel data sits right after the header, at offset 8, followed by the
/// directory and then any values too large for an entry slot. Entries are
/// written in the order given.
pub struct ClassicTiff {
    pixels: Vec<u8>,
    entries: Vec<RawTag>,
    next: u32,
}

impl ClassicTiff {
    pub const PIXEL_OFFSET: u32 = 8;

    pub fn new(pixels: &[u8]) -> Self {
        ClassicTiff { pixels: pixels.to_vec(), entries: Vec::new(), next: 0 }
    }

    pub fn tag(mut self, entry: RawTag) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn next_link(mut self, next: u32) -> Self {
        self.next = next;
        self
    }

    /// Where the directory will be written
    pub fn ifd_offset(&self) -> u32 {
        let end = Self::PIXEL_OFFSET + self.pixels.len() as u32;
        end + (end & 1)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.write_u16::<LittleEndian>(42).unwrap();
        buf.write_u32::<LittleEndian>(self.ifd_offset()).unwrap();
        buf.extend_from_slice(&self.pixels);
        while buf.len() < self.ifd_offset() as usize {
            buf.push(0);
        }

        let n = self.entries.len() as u32;
        let mut extra_at = self.ifd_offset() + 2 + 12 * n + 4;
        let mut extra = Vec::new();

        buf.write_u16::<LittleEndian>(n as u16).unwrap();
        for entry in &self.entries {
            buf.write_u16::<LittleEndian>(entry.tag).unwrap();
            buf.write_u16::<LittleEndian>(entry.type_code).unwrap();
            buf.write_u32::<LittleEndian>(entry.count).unwrap();
            if entry.data.len() <= 4 {
                let mut slot = entry.data.clone();
                slot.resize(4, 0);
                buf.extend_from_slice(&slot);
            } else {
                buf.write_u32::<LittleEndian>(extra_at).unwrap();
                extra.extend_from_slice(&entry.data);
                if entry.data.len() % 2 == 1 {
                    extra.push(0);
                }
                extra_at = self.ifd_offset() + 2 + 12 * n + 4 + extra.len() as u32;
            }
        }
        buf.write_u32::<LittleEndian>(self.next).unwrap();
        buf.extend_from_slice(&extra);
        buf
    }
}

/// Tags of an 8-bit grayscale image stored as one strip
pub fn gray_tags(width: u32, length: u32, strip_offset: u32, byte_count: u32, compression: u16) -> Vec<RawTag> {
    vec![
        long(tags::IMAGE_WIDTH, width),
        long(tags::IMAGE_LENGTH, length),
        short(tags::BITS_PER_SAMPLE, 8),
        short(tags::COMPRESSION, compression),
        short(tags::PHOTOMETRIC_INTERPRETATION, 1),
        long(tags::STRIP_OFFSETS, strip_offset),
        long(tags::ROWS_PER_STRIP, length),
        long(tags::STRIP_BYTE_COUNTS, byte_count),
    ]
}

/// An uncompressed 8-bit grayscale image in one strip
pub fn gray8(width: u32, length: u32, pixels: &[u8]) -> ClassicTiff {
    gray_tags(width, length, ClassicTiff::PIXEL_OFFSET, pixels.len() as u32, 1)
        .into_iter()
        .fold(ClassicTiff::new(pixels), ClassicTiff::tag)
}

pub fn collecting_options() -> (TiffOptions, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let options = TiffOptions::new().name("test.tif").sink(sink.clone());
    (options, sink)
}

/// Opens `bytes` for reading with warnings collected
pub fn open_bytes(bytes: Vec<u8>) -> (TiffResult<MemFile>, Arc<CollectingSink>) {
    let (options, sink) = collecting_options();
    (TiffFile::open(Cursor::new(bytes), options), sink)
}

pub fn new_file(options: TiffOptions) -> MemFile {
    TiffFile::create(Cursor::new(Vec::new()), options).unwrap()
}

pub fn reopen(bytes: Cursor<Vec<u8>>) -> MemFile {
    TiffFile::open(Cursor::new(bytes.into_inner()), TiffOptions::new()).unwrap()
}
