//! I/O utilities for file handling
//!
//! This module provides the stream traits and the byte order strategies
//! used by the directory engine.

pub mod seekable;
pub mod byte_order;

pub use byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use seekable::{SeekableReader, TiffStream};
