pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod commands;

pub use tiff::{Directory, Mode, TagValue, TiffError, TiffFile, TiffOptions, TiffResult};
pub use compression::{Codec, CodecRegistry};
