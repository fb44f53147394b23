//! TIFF directory engine
//!
//! This module provides the tag catalog, the in-memory directory model and
//! the [`TiffFile`] session that reads and writes classic TIFF and BigTIFF
//! directories along with their strip and tile data.

pub mod errors;
pub mod types;
pub mod constants;
pub mod value;
pub mod catalog;
pub mod directory;
pub mod geometry;
pub mod options;
pub mod chain;
pub mod file;
mod dir_read;
mod dir_write;
mod strip_io;
#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use catalog::{FieldInfo, TagCatalog};
pub use chain::DirectoryChain;
pub use constants::{compression, photometric, planar_config, tags};
pub use directory::{CustomValue, Directory};
pub use errors::{TiffError, TiffResult};
pub use file::{Mode, TiffFile};
pub use options::{CodecPolicy, TiffOptions};
pub use types::{Field, FieldCount, TagType};
pub use value::TagValue;
