//! Stream traits for TIFF sessions
//!
//! A session reads from and writes to a single random-access byte stream.
//! Anything that can read, write and seek qualifies: files, in-memory
//! cursors, or a caller's own adapter.

use std::io::{Read, Seek, SeekFrom, Write};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek> SeekableReader for T {}

/// Random-access byte stream backing a TIFF session
pub trait TiffStream: Read + Write + Seek {}

impl<T: Read + Write + Seek> TiffStream for T {}

/// Returns the total length of a seekable stream, restoring its position
pub fn stream_len<S: Seek + ?Sized>(stream: &mut S) -> std::io::Result<u64> {
    let current = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;
    if current != end {
        stream.seek(SeekFrom::Start(current))?;
    }
    Ok(end)
}
