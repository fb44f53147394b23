//! Open-file session
//!
//! A [`TiffFile`] owns a stream, the directory currently in memory and the
//! codec selected for it. Directory reading lives in `dir_read`, directory
//! writing in `dir_write` and pixel access in `strip_io`; this module holds
//! the session state, header handling, navigation and the field API.

use std::io::{Seek, SeekFrom, Write};

use log::{debug, info};

use crate::compression::{Codec, CodecRegistry};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::seekable::{stream_len, TiffStream};
use crate::tiff::catalog::{FieldInfo, TagCatalog};
use crate::tiff::chain::DirectoryChain;
use crate::tiff::constants::{compression, header, tags};
use crate::tiff::directory::{Directory, FieldContext};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::options::TiffOptions;
use crate::tiff::types::{Field, TagType};
use crate::tiff::value::TagValue;

/// How the session was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Existing file, read only
    Read,
    /// New file
    Write,
    /// Existing file, directories may be read, appended, rewritten or unlinked
    Update,
}

/// Which codec lifecycle the current codec was last set up for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CoderState {
    Idle,
    Decode,
    Encode,
}

/// Strip/tile cursor and pending encoder output
#[derive(Debug, Default)]
pub(crate) struct BlockCursor {
    /// Strip currently loaded into the decoder
    pub strip: Option<u32>,
    /// Tile currently loaded into the decoder
    pub tile: Option<u32>,
    /// Next row the decoder or scanline encoder will produce
    pub row: u32,
    /// Strip receiving scanline writes
    pub pending_strip: Option<u32>,
    /// Encoded bytes of `pending_strip` not yet written
    pub pending: Vec<u8>,
}

impl BlockCursor {
    pub fn reset(&mut self) {
        *self = BlockCursor::default();
    }
}

pub(crate) fn field_context<'a>(catalog: &'a TagCatalog, options: &'a TiffOptions, reading: bool) -> FieldContext<'a> {
    FieldContext {
        catalog,
        sink: options.sink.as_ref(),
        file_name: &options.name,
        reading,
    }
}

/// A TIFF or BigTIFF file opened for reading, writing or update
pub struct TiffFile<S: TiffStream> {
    pub(crate) stream: S,
    pub(crate) options: TiffOptions,
    pub(crate) mode: Mode,
    pub(crate) byte_order: ByteOrder,
    pub(crate) handler: Box<dyn ByteOrderHandler>,
    pub(crate) big_tiff: bool,
    /// Catalog of the current directory: built-ins, extra fields, codec
    /// fields and anything merged while reading
    pub(crate) catalog: TagCatalog,
    pub(crate) dir: Directory,
    pub(crate) codec: Box<dyn Codec>,
    pub(crate) coder: CoderState,
    /// First directory offset as recorded in the header
    pub(crate) first_dir_offset: u64,
    pub(crate) cur_dir: Option<u32>,
    /// On-disk location of the directory in memory, 0 if it has none
    pub(crate) cur_dir_offset: u64,
    pub(crate) next_dir_offset: u64,
    pub(crate) chain: DirectoryChain,
    /// Navigation is following a SubIFD chain rather than the main chain
    pub(crate) in_sub_chain: bool,
    pub(crate) sub_chain: DirectoryChain,
    /// Pixel data has been written for the current directory
    pub(crate) been_writing: bool,
    /// The directory in memory differs from what is on disk
    pub(crate) dirty: bool,
    pub(crate) cursor: BlockCursor,
}

impl<S: TiffStream> TiffFile<S> {
    fn with_stream(stream: S, options: TiffOptions, mode: Mode, byte_order: ByteOrder, big_tiff: bool, first_dir_offset: u64) -> Self {
        let catalog = base_catalog(&options);
        let codec = options.registry.create(compression::NONE);
        TiffFile {
            stream,
            options,
            mode,
            byte_order,
            handler: byte_order.create_handler(),
            big_tiff,
            catalog,
            dir: Directory::new(),
            codec,
            coder: CoderState::Idle,
            first_dir_offset,
            cur_dir: None,
            cur_dir_offset: 0,
            next_dir_offset: first_dir_offset,
            chain: DirectoryChain::new(),
            in_sub_chain: false,
            sub_chain: DirectoryChain::new(),
            been_writing: false,
            dirty: false,
            cursor: BlockCursor::default(),
        }
    }

    /// Opens an existing file and reads its first directory
    pub fn open(mut stream: S, options: TiffOptions) -> TiffResult<Self> {
        let (byte_order, big_tiff, first) = read_header(&mut stream)?;
        check_first_offset(&mut stream, first)?;
        if first == 0 {
            return Err(TiffError::FormatError("TIFF file has no directories".to_string()));
        }
        info!("Opened {} ({}, {})", options.name, byte_order.name(), if big_tiff { "BigTIFF" } else { "classic TIFF" });

        let mut file = Self::with_stream(stream, options, Mode::Read, byte_order, big_tiff, first);
        if !file.read_directory()? {
            return Err(TiffError::FormatError("Cannot read first TIFF directory".to_string()));
        }
        Ok(file)
    }

    /// Opens an existing file for update.
    ///
    /// The first directory is read if there is one; otherwise the session
    /// starts with an empty directory ready to be written.
    pub fn open_update(mut stream: S, options: TiffOptions) -> TiffResult<Self> {
        let (byte_order, big_tiff, first) = read_header(&mut stream)?;
        check_first_offset(&mut stream, first)?;

        let mut file = Self::with_stream(stream, options, Mode::Update, byte_order, big_tiff, first);
        if first == 0 {
            file.cur_dir = Some(0);
        } else {
            file.read_directory()?;
        }
        Ok(file)
    }

    /// Starts a new file, writing its header at the start of `stream`
    pub fn create(mut stream: S, options: TiffOptions) -> TiffResult<Self> {
        let byte_order = options.byte_order;
        let big_tiff = options.big_tiff;
        let handler = byte_order.create_handler();

        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&byte_order.marker())?;
        if big_tiff {
            handler.write_u16(&mut stream, header::BIG_TIFF_VERSION)?;
            handler.write_u16(&mut stream, header::BIGTIFF_OFFSET_SIZE)?;
            handler.write_u16(&mut stream, 0)?;
            handler.write_u64(&mut stream, 0)?;
        } else {
            handler.write_u16(&mut stream, header::TIFF_VERSION)?;
            handler.write_u32(&mut stream, 0)?;
        }
        debug!("Created {} ({})", options.name, byte_order.name());

        let mut file = Self::with_stream(stream, options, Mode::Write, byte_order, big_tiff, 0);
        file.cur_dir = Some(0);
        Ok(file)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.big_tiff
    }

    /// The current directory
    pub fn directory(&self) -> &Directory {
        &self.dir
    }

    /// The catalog in effect for the current directory
    pub fn catalog(&self) -> &TagCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.options.registry
    }

    /// The codec selected by the current Compression value
    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn is_tiled(&self) -> bool {
        self.dir.is_tiled()
    }

    /// Gives the stream back without writing anything
    pub fn into_inner(self) -> S {
        self.stream
    }

    pub(crate) fn warn(&self, module: &str, message: &str) {
        self.options.sink.warning(Some(&self.options.name), module, message);
    }

    pub(crate) fn error(&self, module: &str, message: &str) {
        self.options.sink.error(Some(&self.options.name), module, message);
    }

    pub(crate) fn file_size(&mut self) -> TiffResult<u64> {
        Ok(stream_len(&mut self.stream)?)
    }

    /// Switches to the codec for `scheme` and merges its private fields
    pub(crate) fn install_codec(&mut self, scheme: u16) {
        self.codec.cleanup();
        self.codec = self.options.registry.create(scheme);
        self.coder = CoderState::Idle;
        self.cursor.reset();
        let fields = self.codec.fields();
        if !fields.is_empty() {
            self.catalog.merge(fields);
        }
        debug!("Selected codec {} for scheme {}", self.codec.name(), scheme);
    }

    /// Replaces the directory in memory by an empty one
    pub(crate) fn reset_directory(&mut self) {
        self.codec.cleanup();
        self.dir = Directory::new();
        self.catalog = base_catalog(&self.options);
        self.install_codec(compression::NONE);
        self.been_writing = false;
        self.dirty = false;
    }

    // ---- field access ----

    /// Sets a field of the current directory.
    ///
    /// Setting Compression selects the matching codec. Once pixel data has
    /// been written only fields marked mutable may change.
    pub fn set_field(&mut self, tag: u16, value: TagValue) -> TiffResult<()> {
        let info = self.catalog.find(tag, TagType::Any).ok_or(TiffError::UnknownTag(tag))?;
        if self.been_writing && !info.mutable_after_write {
            return Err(TiffError::field(tag, &info.name, "Cannot modify tag while writing"));
        }

        if tag == tags::COMPRESSION {
            let scheme = value
                .as_u16()
                .ok_or_else(|| TiffError::field(tag, &info.name, format!("Bad value {}", value)))?;
            let unchanged = self.dir.is_set(Field::Compression) && self.dir.compression == scheme;
            if !unchanged {
                self.install_codec(scheme);
            }
        }

        let ctx = field_context(&self.catalog, &self.options, false);
        self.dir.apply_field(&ctx, info, value)?;
        self.dirty = true;
        Ok(())
    }

    /// Value of a field, if it is set
    pub fn get_field(&self, tag: u16) -> Option<TagValue> {
        self.dir.get_field(tag)
    }

    /// Value of a field, falling back to its TIFF default
    pub fn get_field_defaulted(&self, tag: u16) -> Option<TagValue> {
        self.dir.get_field_defaulted(tag)
    }

    /// Clears a field. Returns false if it was not set.
    pub fn unset_field(&mut self, tag: u16) -> bool {
        let removed = self.dir.unset_field(tag);
        if removed {
            self.dirty = true;
            if tag == tags::COMPRESSION {
                self.install_codec(compression::NONE);
            }
        }
        removed
    }

    /// Rows per strip the codec suggests; a positive request is kept
    pub fn default_strip_size(&self, request: u32) -> TiffResult<u32> {
        self.codec.default_strip_size(&self.dir, request)
    }

    /// Tile size the codec suggests for the requested size
    pub fn default_tile_size(&self, width: u32, length: u32) -> (u32, u32) {
        self.codec.default_tile_size(width, length)
    }

    /// Adds field descriptions to the current directory's catalog.
    ///
    /// The additions last until the session moves to another directory;
    /// use [`TiffOptions::extra_fields`] for fields every directory
    /// should know.
    pub fn merge_fields<I: IntoIterator<Item = FieldInfo>>(&mut self, infos: I) -> usize {
        self.catalog.merge(infos)
    }

    // ---- navigation ----

    /// Reads the next directory in the chain.
    ///
    /// Returns false at the end of the chain.
    pub fn read_directory(&mut self) -> TiffResult<bool> {
        if self.mode == Mode::Write {
            return Err(TiffError::UsageError("File not open for reading".to_string()));
        }
        let offset = self.next_dir_offset;
        if offset == 0 {
            return Ok(false);
        }

        let index = self.cur_dir.map_or(0, |i| i + 1);
        let chain = if self.in_sub_chain { &mut self.sub_chain } else { &mut self.chain };
        if !chain.check(index, offset) {
            self.error(
                "read_directory",
                &format!("Didn't read next directory due to IFD looping at offset {:#x}", offset),
            );
            return Err(TiffError::DirectoryLoop { offset, index });
        }

        self.cur_dir = Some(index);
        self.read_directory_at(offset)?;
        Ok(true)
    }

    /// Makes directory `n` (0-based) of the main chain current
    pub fn set_directory(&mut self, n: u32) -> TiffResult<()> {
        let mut offset = self.first_dir_offset;
        for index in 0..n {
            if offset == 0 {
                break;
            }
            if !self.chain.check(index, offset) {
                return Err(TiffError::DirectoryLoop { offset, index });
            }
            offset = self.read_next_link(offset)?;
        }
        if offset == 0 {
            return Err(TiffError::UsageError(format!("Directory {} does not exist", n)));
        }

        self.in_sub_chain = false;
        self.next_dir_offset = offset;
        self.cur_dir = n.checked_sub(1);
        if !self.read_directory()? {
            return Err(TiffError::UsageError(format!("Directory {} does not exist", n)));
        }
        Ok(())
    }

    /// Reads the directory at `offset`, typically a SubIFD.
    ///
    /// Further `read_directory` calls follow that directory's chain.
    pub fn set_sub_directory(&mut self, offset: u64) -> TiffResult<()> {
        self.in_sub_chain = true;
        self.sub_chain.clear();
        self.next_dir_offset = offset;
        self.cur_dir = None;
        if !self.read_directory()? {
            return Err(TiffError::UsageError("Sub-directory offset is zero".to_string()));
        }
        Ok(())
    }

    /// Counts the directories of the main chain.
    ///
    /// A looping chain stops the count with a warning.
    pub fn number_of_directories(&mut self) -> TiffResult<u32> {
        let mut offset = self.first_dir_offset;
        let mut count = 0u32;
        while offset != 0 {
            if !self.chain.check(count, offset) {
                self.warn(
                    "number_of_directories",
                    &format!("Directory chain loops back to offset {:#x}; counted {} directories", offset, count),
                );
                break;
            }
            count += 1;
            offset = self.read_next_link(offset)?;
        }
        Ok(count)
    }

    /// Index of the current directory within its chain
    pub fn current_directory(&self) -> Option<u32> {
        self.cur_dir
    }

    /// File offset of the current directory, 0 if not yet written
    pub fn current_dir_offset(&self) -> u64 {
        self.cur_dir_offset
    }

    /// True if the current directory is the last one in its chain
    pub fn last_directory(&self) -> bool {
        self.next_dir_offset == 0
    }

    /// Reads a private directory (EXIF, GPS, ...) described by `catalog`
    /// without disturbing the current directory
    pub fn read_custom_directory(&mut self, offset: u64, catalog: &TagCatalog) -> TiffResult<Directory> {
        let mut catalog = catalog.clone();
        catalog.merge(self.options.extra_fields.iter().cloned());
        self.read_private_directory(offset, catalog)
    }

    /// Reads an EXIF private directory
    pub fn read_exif_directory(&mut self, offset: u64) -> TiffResult<Directory> {
        self.read_custom_directory(offset, &TagCatalog::exif())
    }
}

/// Built-in TIFF catalog plus the caller's extra fields
pub(crate) fn base_catalog(options: &TiffOptions) -> TagCatalog {
    let mut catalog = TagCatalog::tiff();
    if !options.extra_fields.is_empty() {
        catalog.merge(options.extra_fields.iter().cloned());
    }
    catalog
}

/// Reads and validates the file header.
///
/// Returns the byte order, whether the file is BigTIFF, and the first
/// directory offset.
pub(crate) fn read_header<S: TiffStream>(stream: &mut S) -> TiffResult<(ByteOrder, bool, u64)> {
    let short = |_| TiffError::InvalidHeader("Cannot read TIFF header".to_string());

    stream.seek(SeekFrom::Start(0))?;
    let byte_order = ByteOrder::detect(stream)?;
    let handler = byte_order.create_handler();

    let version = handler.read_u16(stream).map_err(short)?;
    match version {
        header::TIFF_VERSION => {
            let first = handler.read_u32(stream).map_err(short)?;
            Ok((byte_order, false, u64::from(first)))
        }
        header::BIG_TIFF_VERSION => {
            let offset_size = handler.read_u16(stream).map_err(short)?;
            if offset_size != header::BIGTIFF_OFFSET_SIZE {
                return Err(TiffError::InvalidHeader(format!(
                    "Not a TIFF file, bad BigTIFF offsetsize {:#x}",
                    offset_size
                )));
            }
            let reserved = handler.read_u16(stream).map_err(short)?;
            if reserved != 0 {
                return Err(TiffError::InvalidHeader(format!(
                    "Not a TIFF file, bad BigTIFF unused {:#x}",
                    reserved
                )));
            }
            let first = handler.read_u64(stream).map_err(short)?;
            Ok((byte_order, true, first))
        }
        other => Err(TiffError::UnsupportedVersion(other)),
    }
}

fn check_first_offset<S: TiffStream>(stream: &mut S, first: u64) -> TiffResult<()> {
    let size = stream_len(stream)?;
    if first >= size && first != 0 {
        return Err(TiffError::FormatError(format!(
            "First directory offset {:#x} is beyond the end of the file ({} bytes)",
            first, size
        )));
    }
    Ok(())
}
